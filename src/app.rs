use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::args::{SubCommands, TopLevelCmd};
use crate::errors::AppError;
use crate::heart_rate::ble::ble_thread;
use crate::heart_rate::dummy::dummy_thread;
use crate::heart_rate::measurement::rr_to_duration;
use crate::heart_rate::{HeartRateStatus, MonitorUpdate};
use crate::pipeline::display::DisplayConfig;
use crate::pipeline::{DisplayFrame, Session, SessionConfig, SessionUpdate};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Scanning,
    Connected,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Ble,
    Dummy,
}

/// Owns the streaming session and everything needed to drive it.
pub struct App {
    pub settings: Settings,
    pub config_path: PathBuf,
    pub state: AppState,
    pub source: Source,
    pub session: Session,
    session_config: SessionConfig,
    pub display: DisplayConfig,
    pub heart_rate_status: HeartRateStatus,
    pub device_name: Option<String>,
    pub error_message: Option<String>,
    pub monitor_not_found: bool,
    pub frame_count: usize,
    pub cancel_app: CancellationToken,
    pub cancel_actors: CancellationToken,
    monitor_tx: UnboundedSender<MonitorUpdate>,
    monitor_rx: UnboundedReceiver<MonitorUpdate>,
    connect_timeout: Duration,
    started: Instant,
    ever_connected: bool,
    threads: Vec<JoinHandle<()>>,
}

impl App {
    pub fn build(
        arg_config: &TopLevelCmd,
        parent_token: Option<CancellationToken>,
    ) -> Result<Self, AppError> {
        let config_path = match &arg_config.config_override {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let settings = Settings::load(&config_path, arg_config.config_required)?;
        if !arg_config.no_save {
            settings.save(&config_path)?;
        }

        let cancel_app = match parent_token {
            Some(token) => token.child_token(),
            None => CancellationToken::new(),
        };
        let cancel_actors = cancel_app.child_token();

        let source = match arg_config.subcommands {
            Some(SubCommands::Dummy(_)) => Source::Dummy,
            Some(SubCommands::Ble(_)) | None => Source::Ble,
        };

        let session_config = settings.session_config(arg_config.all_rr);
        let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
        let display = DisplayConfig::new(width, height, settings.tui.chart_padding);
        let connect_timeout = settings.connect_timeout(arg_config.timeout);
        let (monitor_tx, monitor_rx) = mpsc::unbounded_channel();

        Ok(Self {
            settings,
            config_path,
            state: AppState::Scanning,
            source,
            session: Session::new(session_config),
            session_config,
            display,
            heart_rate_status: HeartRateStatus::default(),
            device_name: None,
            error_message: None,
            monitor_not_found: false,
            frame_count: 0,
            cancel_app,
            cancel_actors,
            monitor_tx,
            monitor_rx,
            connect_timeout,
            started: Instant::now(),
            ever_connected: false,
            threads: Vec::new(),
        })
    }

    /// Starts the heart rate source.
    pub fn init(&mut self) {
        info!("Starting {:?} heart rate source", self.source);
        let monitor_tx = self.monitor_tx.clone();
        let cancel_token = self.cancel_actors.clone();
        let handle = match self.source {
            Source::Ble => tokio::spawn(ble_thread(
                monitor_tx,
                self.settings.ble.clone(),
                cancel_token,
            )),
            Source::Dummy => tokio::spawn(dummy_thread(
                monitor_tx,
                self.settings.dummy.clone(),
                cancel_token,
            )),
        };
        self.threads.push(handle);
        self.started = Instant::now();
    }

    pub async fn monitor_update(&mut self) -> Option<MonitorUpdate> {
        self.monitor_rx.recv().await
    }

    /// Applies one message from the heart rate source.
    ///
    /// Returns what the session did if it was a notification that decoded.
    pub fn handle_monitor_update(&mut self, update: MonitorUpdate) -> Option<SessionUpdate> {
        match update {
            MonitorUpdate::Scanning => {
                self.state = if self.ever_connected {
                    AppState::Reconnecting
                } else {
                    AppState::Scanning
                };
            }
            MonitorUpdate::Connected { name } => {
                info!("Streaming from {name}");
                self.ever_connected = true;
                self.state = AppState::Connected;
                self.device_name = Some(name);
            }
            MonitorUpdate::Notification(data) => {
                // Bad packets are logged by the session and otherwise ignored
                let update = self.session.process(&data).ok()?;
                self.heart_rate_status = HeartRateStatus {
                    heart_rate_bpm: update.measurement.bpm,
                    rr_intervals: update
                        .measurement
                        .rr_intervals
                        .iter()
                        .map(|&rr| rr_to_duration(rr))
                        .collect(),
                    hrv: update.hrv,
                    sensor_contact: update.measurement.sensor_contact,
                    battery_level: self.heart_rate_status.battery_level,
                    timestamp: Local::now(),
                };
                return Some(update);
            }
            MonitorUpdate::Battery(level) => {
                self.heart_rate_status.battery_level = level;
            }
            MonitorUpdate::Disconnected => {
                warn!("Heart rate monitor disconnected, starting a new session");
                self.session = Session::new(self.session_config);
                self.heart_rate_status = HeartRateStatus::default();
                self.state = AppState::Reconnecting;
            }
            MonitorUpdate::Error(message) => {
                error!("{message}");
                self.error_message = Some(message);
            }
        }
        None
    }

    pub fn term_tick(&mut self) {
        self.frame_count = self.frame_count.wrapping_add(1);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.display.resize(width, height);
    }

    /// The trailing samples that fit the terminal as it is right now.
    pub fn frame(&mut self) -> DisplayFrame {
        self.session.frame(&self.display)
    }

    /// When to give up if no monitor has connected, `None` once one has.
    pub fn connect_deadline(&self) -> Option<Instant> {
        (!self.ever_connected).then(|| self.started + self.connect_timeout)
    }

    pub fn time_left_to_connect(&self) -> Option<Duration> {
        self.connect_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn connect_timed_out(&mut self) {
        info!(
            "No heart rate monitor connected within {} seconds",
            self.connect_timeout.as_secs()
        );
        self.monitor_not_found = true;
        self.cancel_app.cancel();
    }

    pub fn dismiss_error(&mut self) {
        self.error_message = None;
    }

    pub async fn join_threads(&mut self) {
        self.cancel_actors.cancel();
        for handle in self.threads.drain(..) {
            if let Err(e) = handle.await {
                error!("Heart rate source task failed: {e}");
            }
        }
    }
}

/// Resolves when `deadline` passes, never if there isn't one.
pub async fn connect_deadline_passed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn default_config_path() -> Result<PathBuf, AppError> {
    let exe_path = std::env::current_exe()?;
    exe_path
        .with_extension("toml")
        .file_name()
        .map(PathBuf::from)
        .ok_or(AppError::WorkDir)
}
