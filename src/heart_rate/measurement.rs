use std::time::Duration;

use bitflags::bitflags;
use thiserror::Error;

// https://www.bluetooth.com/specifications/specs/heart-rate-service-1-0/
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MeasurementFlags: u8 {
        const HR_U16 = 1 << 0;
        const SENSOR_CONTACT_DETECTED = 1 << 1;
        const SENSOR_CONTACT_SUPPORTED = 1 << 2;
        const ENERGY_EXPENDED = 1 << 3;
        const RR_INTERVALS = 1 << 4;
    }
}

/// RR intervals are reported in 1/1024ths of a second.
pub const RR_UNITS_PER_SEC: f64 = 1024.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty Heart Rate Measurement payload")]
    Empty,
    #[error("Heart Rate Measurement too short for its flags: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

/// One decoded notification from the Heart Rate Measurement characteristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartRateMeasurement {
    pub bpm: u16,
    /// `None` when the sensor doesn't support contact detection.
    pub sensor_contact: Option<bool>,
    /// Kilojoules, if reported.
    pub energy_expended: Option<u16>,
    /// Raw RR intervals (1/1024 s), oldest first.
    pub rr_intervals: Vec<u16>,
}

impl HeartRateMeasurement {
    /// The first RR interval in the notification, if any were sent.
    pub fn rr_interval(&self) -> Option<u16> {
        self.rr_intervals.first().copied()
    }
}

/// Decodes the raw bytes of a Heart Rate Measurement (0x2A37) notification.
///
/// The flags byte decides the layout: an 8 or 16 bit heart rate, an optional
/// energy expended field, then zero or more little-endian RR intervals.
/// Only the heart rate and energy fields count towards the minimum length, an
/// RR flag with nothing after it still yields a heart rate.
pub fn parse_hrm(data: &[u8]) -> Result<HeartRateMeasurement, DecodeError> {
    let (&flags, rest) = data.split_first().ok_or(DecodeError::Empty)?;
    let flags = MeasurementFlags::from_bits_truncate(flags);

    let hr_len = if flags.contains(MeasurementFlags::HR_U16) {
        2
    } else {
        1
    };
    let energy_len = if flags.contains(MeasurementFlags::ENERGY_EXPENDED) {
        2
    } else {
        0
    };
    let expected = 1 + hr_len + energy_len;
    if data.len() < expected {
        return Err(DecodeError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let (bpm, rest) = if hr_len == 2 {
        (u16::from_le_bytes([rest[0], rest[1]]), &rest[2..])
    } else {
        (u16::from(rest[0]), &rest[1..])
    };

    let sensor_contact = flags
        .contains(MeasurementFlags::SENSOR_CONTACT_SUPPORTED)
        .then(|| flags.contains(MeasurementFlags::SENSOR_CONTACT_DETECTED));

    let (energy_expended, rest) = if energy_len == 2 {
        (Some(u16::from_le_bytes([rest[0], rest[1]])), &rest[2..])
    } else {
        (None, rest)
    };

    // A dangling odd byte at the end isn't a full interval, drop it
    let rr_intervals = if flags.contains(MeasurementFlags::RR_INTERVALS) {
        rest.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    } else {
        Vec::new()
    };

    Ok(HeartRateMeasurement {
        bpm,
        sensor_contact,
        energy_expended,
        rr_intervals,
    })
}

/// Builds a Heart Rate Measurement payload, used by the dummy source so it
/// goes through the same decoding as a real monitor.
pub fn encode_hrm(measurement: &HeartRateMeasurement) -> Vec<u8> {
    let mut flags = MeasurementFlags::empty();
    let mut body = Vec::with_capacity(3 + measurement.rr_intervals.len() * 2);

    if let Ok(bpm) = u8::try_from(measurement.bpm) {
        body.push(bpm);
    } else {
        flags |= MeasurementFlags::HR_U16;
        body.extend_from_slice(&measurement.bpm.to_le_bytes());
    }
    if let Some(contact) = measurement.sensor_contact {
        flags |= MeasurementFlags::SENSOR_CONTACT_SUPPORTED;
        flags.set(MeasurementFlags::SENSOR_CONTACT_DETECTED, contact);
    }
    if let Some(energy) = measurement.energy_expended {
        flags |= MeasurementFlags::ENERGY_EXPENDED;
        body.extend_from_slice(&energy.to_le_bytes());
    }
    if !measurement.rr_intervals.is_empty() {
        flags |= MeasurementFlags::RR_INTERVALS;
        for rr in &measurement.rr_intervals {
            body.extend_from_slice(&rr.to_le_bytes());
        }
    }

    let mut data = Vec::with_capacity(body.len() + 1);
    data.push(flags.bits());
    data.extend(body);
    data
}

pub fn rr_to_duration(rr: u16) -> Duration {
    Duration::from_secs_f64(f64::from(rr) / RR_UNITS_PER_SEC)
}

pub fn duration_to_rr(duration: Duration) -> u16 {
    (duration.as_secs_f64() * RR_UNITS_PER_SEC)
        .round()
        .clamp(0.0, f64::from(u16::MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_heart_rate() {
        for bpm in [0u8, 1, 70, 128, 255] {
            let hrm = parse_hrm(&[0x00, bpm]).unwrap();
            assert_eq!(hrm.bpm, bpm as u16);
            assert_eq!(hrm.rr_interval(), None);
            assert!(hrm.rr_intervals.is_empty());
        }
    }

    #[test]
    fn sixteen_bit_heart_rate() {
        let hrm = parse_hrm(&[0x01, 0x2C, 0x01]).unwrap();
        assert_eq!(hrm.bpm, 300);
        assert_eq!(hrm.rr_interval(), None);
    }

    #[test]
    fn rr_interval_is_little_endian() {
        let hrm = parse_hrm(&[0x10, 0x3C, 0x00, 0x04]).unwrap();
        assert_eq!(hrm.bpm, 60);
        assert_eq!(hrm.rr_interval(), Some((0x04 << 8) | 0x00));
        assert_eq!(hrm.rr_interval(), Some(1024));

        let hrm = parse_hrm(&[0x10, 0x3C, 0x04, 0x04]).unwrap();
        assert_eq!(hrm.rr_interval(), Some(1028));
    }

    #[test]
    fn rr_follows_energy_expended() {
        // 16-bit HR, energy expended, two RR intervals
        let data = [0x19, 0x50, 0x00, 0xE8, 0x03, 0x20, 0x03, 0x40, 0x03];
        let hrm = parse_hrm(&data).unwrap();
        assert_eq!(hrm.bpm, 80);
        assert_eq!(hrm.energy_expended, Some(1000));
        assert_eq!(hrm.rr_intervals, vec![800, 832]);
        assert_eq!(hrm.rr_interval(), Some(800));
    }

    #[test]
    fn sensor_contact_bits() {
        assert_eq!(parse_hrm(&[0x00, 70]).unwrap().sensor_contact, None);
        assert_eq!(parse_hrm(&[0x04, 70]).unwrap().sensor_contact, Some(false));
        assert_eq!(parse_hrm(&[0x06, 70]).unwrap().sensor_contact, Some(true));
    }

    #[test]
    fn short_payloads_fail() {
        assert_eq!(parse_hrm(&[]), Err(DecodeError::Empty));
        assert_eq!(
            parse_hrm(&[0x00]),
            Err(DecodeError::Truncated {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            parse_hrm(&[0x01, 0x50]),
            Err(DecodeError::Truncated {
                expected: 3,
                actual: 2
            })
        );
        // Energy expended flagged but cut short
        assert_eq!(
            parse_hrm(&[0x18, 0x3C, 0x00]),
            Err(DecodeError::Truncated {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn rr_flag_without_intervals_keeps_heart_rate() {
        let hrm = parse_hrm(&[0x10, 70]).unwrap();
        assert_eq!(hrm.bpm, 70);
        assert_eq!(hrm.rr_interval(), None);

        // Half an interval isn't an interval
        let hrm = parse_hrm(&[0x10, 0x3C, 0x00]).unwrap();
        assert_eq!(hrm.bpm, 60);
        assert!(hrm.rr_intervals.is_empty());

        let hrm = parse_hrm(&[0x18, 0x3C, 0xE8, 0x03]).unwrap();
        assert_eq!(hrm.energy_expended, Some(1000));
        assert!(hrm.rr_intervals.is_empty());
    }

    #[test]
    fn trailing_odd_byte_ignored() {
        let hrm = parse_hrm(&[0x10, 0x3C, 0x00, 0x04, 0xFF]).unwrap();
        assert_eq!(hrm.rr_intervals, vec![1024]);
    }

    #[test]
    fn encoded_layout_matches_flags() {
        let hrm = HeartRateMeasurement {
            bpm: 70,
            rr_intervals: vec![1024, 1028],
            ..Default::default()
        };
        assert_eq!(encode_hrm(&hrm), vec![0x10, 70, 0x00, 0x04, 0x04, 0x04]);

        let hrm = HeartRateMeasurement {
            bpm: 300,
            sensor_contact: Some(true),
            ..Default::default()
        };
        let encoded = encode_hrm(&hrm);
        assert_eq!(encoded, vec![0x07, 0x2C, 0x01]);
        assert_eq!(parse_hrm(&encoded).unwrap(), hrm);
    }

    #[test]
    fn rr_duration_conversion() {
        assert_eq!(rr_to_duration(1024), Duration::from_secs(1));
        assert_eq!(rr_to_duration(512), Duration::from_millis(500));
        assert_eq!(duration_to_rr(Duration::from_millis(750)), 768);
    }
}
