use thiserror::Error;

use super::window::SampleWindow;

/// Scales ln(RMSSD) into roughly the same 0-100 range as heart rate,
/// so both fit on one chart. Not a clinical unit.
pub const HRV_SCALE: f64 = 10.0;

pub const DEFAULT_HRV_FLOOR: f64 = 1.0;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("No RR interval differences collected yet")]
pub struct NoSignal;

/// Running log-RMSSD estimate over the last `capacity` successive RR differences.
///
/// Differences are squared raw RR units (1/1024 s) and kept as integers, so the
/// running sum is exact no matter how long the session runs.
#[derive(Debug, Clone)]
pub struct HrvEstimator {
    differences: SampleWindow<u64>,
    sum: u64,
    previous_rr: Option<u16>,
    floor: f64,
}

impl HrvEstimator {
    /// `floor` is the smallest mean squared difference fed into `ln`, which keeps
    /// a perfectly steady rhythm from producing negative infinity.
    pub fn new(capacity: usize, floor: f64) -> Self {
        let floor = if floor.is_finite() && floor > 0.0 {
            floor
        } else {
            DEFAULT_HRV_FLOOR
        };
        Self {
            differences: SampleWindow::new(capacity),
            sum: 0,
            previous_rr: None,
            floor,
        }
    }

    /// Feeds the next RR interval of the stream.
    ///
    /// The first interval of a session only primes the estimator and yields `NoSignal`.
    pub fn observe(&mut self, rr: u16) -> Result<f64, NoSignal> {
        let previous = self.previous_rr.replace(rr);
        match previous {
            Some(previous) => Ok(self.update(rr, previous)),
            None => self.estimate(),
        }
    }

    /// Pushes `(rr - previous)²` into the difference buffer and returns the new estimate.
    pub fn update(&mut self, rr: u16, previous: u16) -> f64 {
        let diff = u64::from(rr.abs_diff(previous));
        let diff_sq = diff * diff;
        if let Some(evicted) = self.differences.push(diff_sq) {
            self.sum -= evicted;
        }
        self.sum += diff_sq;
        self.previous_rr = Some(rr);
        self.scaled(self.mean_squared())
    }

    /// The estimate for the current buffer contents.
    pub fn estimate(&self) -> Result<f64, NoSignal> {
        if self.differences.is_empty() {
            return Err(NoSignal);
        }
        Ok(self.scaled(self.mean_squared()))
    }

    pub fn differences(&self) -> &SampleWindow<u64> {
        &self.differences
    }

    fn mean_squared(&self) -> f64 {
        self.sum as f64 / self.differences.len() as f64
    }

    fn scaled(&self, mean_squared: f64) -> f64 {
        mean_squared.max(self.floor).sqrt().ln() * HRV_SCALE
    }
}
