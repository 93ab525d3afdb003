pub mod ble;
pub mod dummy;
pub mod measurement;

use std::time::Duration;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatteryLevel {
    #[default]
    Unknown,
    NotReported,
    Level(u8),
}

impl From<BatteryLevel> for u8 {
    fn from(level: BatteryLevel) -> Self {
        match level {
            BatteryLevel::Level(battery) => battery,
            _ => 0,
        }
    }
}

/// Messages from a heart rate source to the app, handled strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorUpdate {
    Scanning,
    Connected { name: String },
    /// Raw Heart Rate Measurement bytes, decoded by the app's session.
    Notification(Vec<u8>),
    Battery(BatteryLevel),
    Disconnected,
    Error(String),
}

impl From<BatteryLevel> for MonitorUpdate {
    fn from(level: BatteryLevel) -> Self {
        MonitorUpdate::Battery(level)
    }
}

/// Latest values, for the header table and banner.
#[derive(Debug, Clone, Default)]
pub struct HeartRateStatus {
    pub heart_rate_bpm: u16,
    pub rr_intervals: Vec<Duration>,
    pub hrv: f64,
    pub sensor_contact: Option<bool>,
    pub battery_level: BatteryLevel,
    pub timestamp: DateTime<Local>,
}

// Used when the dummy source mimics a monitor
pub fn rr_from_bpm(bpm: u16) -> Duration {
    // Make sure it's at least 1 to prevent a potential divide by zero
    let bpm = bpm.max(1);
    Duration::from_secs_f32(60.0 / bpm as f32)
}
