pub mod display;
pub mod hrv;
pub mod window;

use tracing::{debug, warn};

use crate::heart_rate::measurement::{parse_hrm, DecodeError, HeartRateMeasurement};
use display::{select, DisplayConfig};
use hrv::HrvEstimator;
use window::SampleWindow;

pub const DEFAULT_WINDOW_CAPACITY: usize = 300;

/// Which of a notification's RR intervals feed the HRV estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RrMode {
    /// Only the first interval, even when the sensor batched several.
    #[default]
    FirstOnly,
    /// Every interval, in the order sent.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub capacity: usize,
    pub hrv_floor: f64,
    pub rr_mode: RrMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            hrv_floor: hrv::DEFAULT_HRV_FLOOR,
            rr_mode: RrMode::FirstOnly,
        }
    }
}

/// What a single notification did to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub measurement: HeartRateMeasurement,
    /// The HRV sample appended for this notification.
    pub hrv: f64,
    /// False when the notification carried no usable RR data and `hrv` was carried over.
    pub hrv_updated: bool,
}

/// Two equal-length chart series. x counts chart columns, so the newest sample
/// sits at `visible_samples - 1` even while the history is still filling up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayFrame {
    pub heart_rate: Vec<(f64, f64)>,
    pub hrv: Vec<(f64, f64)>,
}

impl DisplayFrame {
    pub fn len(&self) -> usize {
        self.heart_rate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_empty()
    }
}

/// Everything derived from one connected monitor's notification stream.
///
/// Each decoded notification appends exactly one heart rate sample and one HRV
/// sample, so both windows always have the same length.
#[derive(Debug, Clone)]
pub struct Session {
    heart_rate: SampleWindow<u16>,
    hrv: SampleWindow<f64>,
    estimator: HrvEstimator,
    rr_mode: RrMode,
    latest_hrv: f64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            heart_rate: SampleWindow::new(config.capacity),
            hrv: SampleWindow::new(config.capacity),
            estimator: HrvEstimator::new(config.capacity, config.hrv_floor),
            rr_mode: config.rr_mode,
            latest_hrv: 0.0,
        }
    }

    /// Runs one raw notification through decode, windows, and the estimator.
    ///
    /// On a decode failure nothing is modified.
    pub fn process(&mut self, data: &[u8]) -> Result<SessionUpdate, DecodeError> {
        let measurement = match parse_hrm(data) {
            Ok(measurement) => measurement,
            Err(e) => {
                warn!("Dropping notification {:02x?}: {}", data, e);
                return Err(e);
            }
        };

        let intervals: &[u16] = match self.rr_mode {
            RrMode::FirstOnly => measurement
                .rr_intervals
                .first()
                .map(std::slice::from_ref)
                .unwrap_or_default(),
            RrMode::All => &measurement.rr_intervals,
        };

        let mut hrv_updated = false;
        for &rr in intervals {
            // The estimator stays quiet until it has a difference to work with,
            // until then the HRV series reads zero
            if let Ok(hrv) = self.estimator.observe(rr) {
                self.latest_hrv = hrv;
                hrv_updated = true;
            }
        }

        self.heart_rate.push(measurement.bpm);
        self.hrv.push(self.latest_hrv);
        debug!(
            "HR {} | RR {:?} | HRV {:.2}",
            measurement.bpm, measurement.rr_intervals, self.latest_hrv
        );

        Ok(SessionUpdate {
            measurement,
            hrv: self.latest_hrv,
            hrv_updated,
        })
    }

    /// Selects the trailing samples that fit the current display.
    pub fn frame(&mut self, display: &DisplayConfig) -> DisplayFrame {
        let heart_rate = select(self.heart_rate.as_slice(), display.width, display.padding);
        let hrv = select(self.hrv.as_slice(), display.width, display.padding);
        let offset = display.visible_samples() - heart_rate.len();
        DisplayFrame {
            heart_rate: to_points(offset, heart_rate.iter().map(|&bpm| f64::from(bpm))),
            hrv: to_points(offset, hrv.iter().copied()),
        }
    }

    pub fn heart_rate(&self) -> &SampleWindow<u16> {
        &self.heart_rate
    }

    pub fn hrv(&self) -> &SampleWindow<f64> {
        &self.hrv
    }

    pub fn estimator(&self) -> &HrvEstimator {
        &self.estimator
    }
}

fn to_points(offset: usize, samples: impl Iterator<Item = f64>) -> Vec<(f64, f64)> {
    samples
        .enumerate()
        .map(|(x, y)| ((offset + x) as f64, y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(capacity: usize) -> Session {
        Session::new(SessionConfig {
            capacity,
            ..Default::default()
        })
    }

    #[test_log::test]
    fn heart_rate_only_notification() {
        let mut session = session(300);
        let update = session.process(&[0x00, 0x46]).unwrap();
        assert_eq!(update.measurement.bpm, 70);
        assert!(!update.hrv_updated);
        assert_eq!(session.heart_rate().to_vec(), vec![70]);
        assert!(session.estimator().differences().is_empty());
        assert_eq!(session.hrv().to_vec(), vec![0.0]);
    }

    #[test_log::test]
    fn successive_rr_intervals_produce_a_difference() {
        let mut session = session(300);
        let first = session.process(&[0x10, 0x3C, 0x00, 0x04]).unwrap();
        assert!(!first.hrv_updated);
        assert!(session.estimator().differences().is_empty());

        let second = session.process(&[0x10, 0x3C, 0x04, 0x04]).unwrap();
        assert!(second.hrv_updated);
        assert_eq!(session.estimator().differences().to_vec(), vec![16]);
        assert_eq!(session.heart_rate().to_vec(), vec![60, 60]);
        assert_eq!(session.hrv().len(), 2);
    }

    #[test_log::test]
    fn malformed_notification_changes_nothing() {
        let mut session = session(300);
        session.process(&[0x10, 0x3C, 0x00, 0x04]).unwrap();
        session.process(&[0x10, 0x3C, 0x04, 0x04]).unwrap();
        let before_hr = session.heart_rate().to_vec();
        let before_hrv = session.hrv().to_vec();

        assert!(session.process(&[0x09, 0x3C, 0x00]).is_err());
        assert!(session.process(&[]).is_err());
        assert!(session.process(&[0x01, 0x3C]).is_err());

        assert_eq!(session.heart_rate().to_vec(), before_hr);
        assert_eq!(session.hrv().to_vec(), before_hrv);
        assert_eq!(session.estimator().differences().to_vec(), vec![16]);

        // And the stream carries on from where it was
        session.process(&[0x10, 0x3C, 0x08, 0x04]).unwrap();
        assert_eq!(session.estimator().differences().to_vec(), vec![16, 16]);
    }

    #[test]
    fn hrv_carries_over_without_rr() {
        let mut session = session(300);
        session.process(&[0x10, 0x3C, 0x00, 0x04]).unwrap();
        let with_rr = session.process(&[0x10, 0x3C, 0x40, 0x04]).unwrap();
        let without_rr = session.process(&[0x00, 0x3D]).unwrap();
        assert!(!without_rr.hrv_updated);
        assert_eq!(without_rr.hrv, with_rr.hrv);
        assert_eq!(session.hrv().len(), session.heart_rate().len());
    }

    #[test_log::test]
    fn rr_flag_without_intervals_still_counts() {
        let mut session = session(300);
        session.process(&[0x10, 0x3C, 0x00, 0x04]).unwrap();
        let with_rr = session.process(&[0x10, 0x3C, 0x40, 0x04]).unwrap();
        let update = session.process(&[0x10, 70]).unwrap();
        assert_eq!(update.measurement.bpm, 70);
        assert!(!update.hrv_updated);
        assert_eq!(update.hrv, with_rr.hrv);
        assert_eq!(session.heart_rate().to_vec(), vec![60, 60, 70]);
        assert_eq!(session.hrv().len(), 3);
        assert_eq!(session.estimator().differences().len(), 1);
    }

    #[test]
    fn first_only_ignores_batched_intervals() {
        let mut session = session(300);
        // RR 1024, 1040 in one notification
        session
            .process(&[0x10, 0x3C, 0x00, 0x04, 0x10, 0x04])
            .unwrap();
        assert!(session.estimator().differences().is_empty());
    }

    #[test]
    fn all_mode_uses_batched_intervals() {
        let mut session = Session::new(SessionConfig {
            rr_mode: RrMode::All,
            ..Default::default()
        });
        let update = session
            .process(&[0x10, 0x3C, 0x00, 0x04, 0x10, 0x04])
            .unwrap();
        assert!(update.hrv_updated);
        assert_eq!(session.estimator().differences().to_vec(), vec![256]);
        // Still one sample per notification
        assert_eq!(session.heart_rate().len(), 1);
        assert_eq!(session.hrv().len(), 1);
    }

    #[test]
    fn windows_stay_bounded_and_aligned() {
        let capacity = 300;
        let mut session = session(capacity);
        for i in 0..capacity + 123 {
            let rr = 800 + (i % 7) as u16 * 5;
            let [lo, hi] = rr.to_le_bytes();
            session.process(&[0x10, (60 + i % 40) as u8, lo, hi]).unwrap();
        }
        assert_eq!(session.heart_rate().len(), capacity);
        assert_eq!(session.hrv().len(), capacity);
        assert_eq!(session.estimator().differences().len(), capacity);
        assert!(session.hrv().iter().all(|hrv| hrv.is_finite()));
    }

    #[test]
    fn frame_follows_resizes() {
        let mut session = session(600);
        for i in 0..500u16 {
            session.process(&[0x00, (i % 200) as u8]).unwrap();
        }
        let mut display = DisplayConfig::new(100, 30, 20);
        let frame = session.frame(&display);
        assert_eq!(frame.len(), 80);
        assert_eq!(frame.hrv.len(), 80);
        assert_eq!(frame.heart_rate.first(), Some(&(0.0, (420 % 200) as f64)));
        assert_eq!(frame.heart_rate.last(), Some(&(79.0, (499 % 200) as f64)));

        display.resize(60, 30);
        let frame = session.frame(&display);
        assert_eq!(frame.len(), 40);
        assert_eq!(frame.hrv.len(), 40);
        assert_eq!(frame.heart_rate.first(), Some(&(0.0, (460 % 200) as f64)));
    }

    #[test]
    fn frame_of_short_history_is_whole_and_right_aligned() {
        let mut session = session(300);
        for bpm in [60, 61, 62] {
            session.process(&[0x00, bpm]).unwrap();
        }
        let frame = session.frame(&DisplayConfig::new(100, 30, 20));
        assert_eq!(
            frame.heart_rate,
            vec![(77.0, 60.0), (78.0, 61.0), (79.0, 62.0)]
        );
        assert_eq!(frame.hrv.len(), 3);
        assert_eq!(frame.hrv.first().map(|&(x, _)| x), Some(77.0));
    }

    #[test]
    fn frame_matches_selection_after_wraparound() {
        // Small capacity so the ring wraps many times
        let mut session = session(50);
        for i in 0..137u8 {
            session.process(&[0x00, i]).unwrap();
        }
        let history: Vec<u16> = session.heart_rate().to_vec();
        let display = DisplayConfig::new(40, 30, 10);
        let frame = session.frame(&display);
        let expected: Vec<f64> = select(&history, display.width, display.padding)
            .iter()
            .map(|&bpm| f64::from(bpm))
            .collect();
        let actual: Vec<f64> = frame.heart_rate.iter().map(|&(_, y)| y).collect();
        assert_eq!(actual, expected);
        assert_eq!(actual.len(), 30);
        assert_eq!(actual.last(), Some(&136.0));
    }
}
