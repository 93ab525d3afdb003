use config::{Config, ConfigError, File as ConfigFile};
use ratatui::style::Color;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;

use crate::errors::AppError;
use crate::pipeline::{hrv::DEFAULT_HRV_FLOOR, RrMode, SessionConfig, DEFAULT_WINDOW_CAPACITY};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BLESettings {
    pub connect_timeout_secs: u64,
    pub device_connect_timeout_secs: u64,
    pub no_packet_timeout_secs: u64,
    pub battery_poll_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionSettings {
    pub window_capacity: usize,
    pub hrv_floor: f64,
    pub all_rr_intervals: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TUISettings {
    pub chart_padding: u16,
    // 0 fills whatever's left under the header
    pub chart_height: u16,
    pub heart_rate_color: String,
    pub hrv_color: String,
    pub tick_rate_ms: u64,
    // Parsed from the strings above when loading
    #[serde(skip)]
    resolved_heart_rate_color: Color,
    #[serde(skip)]
    resolved_hrv_color: Color,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DummySettings {
    pub low_bpm: u16,
    pub high_bpm: u16,
    pub bpm_speed: f32,
    // In 1/1024ths of a second
    pub rr_jitter: u16,
    pub loops_before_dc: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MiscSettings {
    log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    pub ble: BLESettings,
    pub session: SessionSettings,
    pub tui: TUISettings,
    pub dummy: DummySettings,
    pub misc: MiscSettings,
}

impl Settings {
    pub fn load(config_path: &Path, required: bool) -> Result<Self, ConfigError> {
        let default_log_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        let s = Config::builder()
            .add_source(ConfigFile::from(config_path).required(required))
            .set_default("ble.connect_timeout_secs", 60)?
            .set_default("ble.device_connect_timeout_secs", 10)?
            .set_default("ble.no_packet_timeout_secs", 30)?
            .set_default("ble.battery_poll_secs", 60 * 5)?
            .set_default("session.window_capacity", DEFAULT_WINDOW_CAPACITY as u64)?
            .set_default("session.hrv_floor", DEFAULT_HRV_FLOOR)?
            .set_default("session.all_rr_intervals", false)?
            .set_default("tui.chart_padding", 20)?
            .set_default("tui.chart_height", 0)?
            .set_default("tui.heart_rate_color", "red")?
            .set_default("tui.hrv_color", "cyan")?
            .set_default("tui.tick_rate_ms", 250)?
            .set_default("dummy.low_bpm", 55)?
            .set_default("dummy.high_bpm", 110)?
            .set_default("dummy.bpm_speed", 2.0)?
            .set_default("dummy.rr_jitter", 40)?
            .set_default("dummy.loops_before_dc", 0)?
            .set_default("misc.log_level", default_log_level)?
            .build()?;

        let mut settings: Settings = s.try_deserialize()?;
        settings.validate();
        Ok(settings)
    }

    pub fn save(&self, config_path: &Path) -> Result<(), AppError> {
        let toml_string = toml::to_string(self)?;
        std::fs::write(config_path, toml_string).map_err(|e| AppError::CreateFile {
            path: config_path.to_owned(),
            source: e,
        })?;
        Ok(())
    }

    /// Puts nonsense values back to something usable instead of refusing to start.
    fn validate(&mut self) {
        if self.session.window_capacity == 0 {
            warn!(
                "session.window_capacity can't be 0, using {}",
                DEFAULT_WINDOW_CAPACITY
            );
            self.session.window_capacity = DEFAULT_WINDOW_CAPACITY;
        }
        if !self.session.hrv_floor.is_finite() || self.session.hrv_floor <= 0.0 {
            warn!(
                "session.hrv_floor must be above 0, using {}",
                DEFAULT_HRV_FLOOR
            );
            self.session.hrv_floor = DEFAULT_HRV_FLOOR;
        }
        self.dummy.low_bpm = self.dummy.low_bpm.clamp(1, u16::MAX - 1);
        if self.dummy.high_bpm <= self.dummy.low_bpm {
            warn!("dummy.high_bpm must be above dummy.low_bpm");
            self.dummy.high_bpm = self.dummy.low_bpm.saturating_add(1);
        }
        if !self.dummy.bpm_speed.is_finite() || self.dummy.bpm_speed <= 0.0 {
            self.dummy.bpm_speed = 1.0;
        }
        if self.tui.tick_rate_ms == 0 {
            self.tui.tick_rate_ms = 250;
        }
        self.tui.resolved_heart_rate_color =
            parse_color("tui.heart_rate_color", &self.tui.heart_rate_color, Color::Red);
        self.tui.resolved_hrv_color = parse_color("tui.hrv_color", &self.tui.hrv_color, Color::Cyan);
    }

    pub fn session_config(&self, all_rr_override: bool) -> SessionConfig {
        let rr_mode = if all_rr_override || self.session.all_rr_intervals {
            RrMode::All
        } else {
            RrMode::FirstOnly
        };
        SessionConfig {
            capacity: self.session.window_capacity,
            hrv_floor: self.session.hrv_floor,
            rr_mode,
        }
    }

    pub fn connect_timeout(&self, override_secs: Option<u64>) -> Duration {
        Duration::from_secs(override_secs.unwrap_or(self.ble.connect_timeout_secs))
    }

    pub fn get_log_level(&self) -> LevelFilter {
        match self.misc.log_level.to_lowercase().as_str() {
            "off" => LevelFilter::OFF,
            "error" => LevelFilter::ERROR,
            "warn" => LevelFilter::WARN,
            "info" => LevelFilter::INFO,
            "debug" => LevelFilter::DEBUG,
            "trace" => LevelFilter::TRACE,
            _ => LevelFilter::INFO,
        }
    }
}

impl TUISettings {
    pub fn heart_rate_color(&self) -> Color {
        self.resolved_heart_rate_color
    }

    pub fn hrv_color(&self) -> Color {
        self.resolved_hrv_color
    }
}

fn parse_color(key: &str, name: &str, fallback: Color) -> Color {
    Color::from_str(name).unwrap_or_else(|_| {
        warn!("Unknown color \"{name}\" for {key}, using {fallback}");
        fallback
    })
}
