#![deny(unused_must_use)]

use args::TopLevelCmd;
use errors::AppError;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::PathBuf};
use tokio::fs::create_dir;
use tokio_util::sync::CancellationToken;

use crate::app::{connect_deadline_passed, App};
use event::{Event, EventHandler};
use handler::handle_key_events;
use heart_rate::MonitorUpdate;
use std::error;

use tui::Tui;

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing::{info, warn};
use tracing_subscriber::{filter, prelude::*};
use tracing_subscriber::{fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(not(any(debug_assertions, feature = "portable")))]
use directories::BaseDirs;

pub mod args;
pub mod errors;

pub mod heart_rate;
pub mod pipeline;
pub mod settings;

mod app;
mod banner;
mod macros;
mod panic_handler;
mod utils;
mod widgets;

mod event;
mod handler;
mod tui;
mod ui;

pub const NOT_FOUND_MESSAGE: &str = "Heart rate monitor either not in range or not ready-to-pair.";

/// Application result type.
pub type AppResult<T> = std::result::Result<T, Box<dyn error::Error>>;

pub async fn run_tui(mut arg_config: TopLevelCmd) -> AppResult<()> {
    let working_directory = determine_working_directory().ok_or(AppError::WorkDir)?;
    arg_config.config_override = arg_config
        .config_override
        .map(absolute_path)
        .transpose()?;
    if !working_directory.exists() {
        create_dir(&working_directory)
            .await
            .map_err(|e| AppError::CreateDir {
                path: working_directory.clone(),
                source: e,
            })?;
    }
    std::env::set_current_dir(&working_directory)?;
    let log_name = std::env::current_exe()?
        .with_extension("log")
        .file_name()
        .ok_or(AppError::WorkDir)?
        .to_owned();
    let file_appender = BasicRollingFileAppender::new(
        log_name,
        RollingConditionBasic::new().max_size(1024 * 1024 * 5),
        2,
    )?;
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let time_fmt = ChronoLocal::new("%Y-%m-%d %H:%M:%S%.6f".to_owned());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_file(false)
        .with_ansi(false)
        .with_target(true)
        .with_timer(time_fmt)
        .with_line_number(true)
        .with_filter(filter::LevelFilter::DEBUG);
    let (fmt_layer, reload_handle) = tracing_subscriber::reload::Layer::new(fmt_layer);
    // Allow everything through but limit btleplug to just info, it's chatty while scanning
    let env_filter = tracing_subscriber::EnvFilter::new("trace,btleplug=info");
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let mut app = App::build(&arg_config, None)?;

    // Initialize the terminal user interface.
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    let events = EventHandler::new(app.settings.tui.tick_rate_ms);
    let mut tui = Tui::new(terminal, events);
    tui.init()?;

    info!("Starting app... v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config from: {}", app.config_path.display());

    // Starting off at DEBUG, and setting to whatever user has defined
    reload_handle.modify(|layer| *layer.filter_mut() = app.settings.get_log_level())?;

    app.init();

    // Start the main loop.
    while !app.cancel_app.is_cancelled() {
        // Render the user interface.
        tui.draw(&mut app)?;
        let deadline = app.connect_deadline();
        tokio::select! {
            // Handle Crossterm events.
            val = tui.events.next() => {
                match val? {
                    Event::Tick => app.term_tick(),
                    Event::Key(key_event) => handle_key_events(&mut app, key_event)?,
                    Event::Resize(columns, rows) => {
                        tui.autoresize()?;
                        app.resize(columns, rows);
                    }
                }
            }
            // Handle heart rate source updates
            Some(update) = app.monitor_update() => {
                app.handle_monitor_update(update);
            }
            _ = connect_deadline_passed(deadline) => app.connect_timed_out(),
        }
    }
    // After while loop closes
    app.join_threads().await;

    info!("Shutting down gracefully...");

    // Reset the terminal.
    tui.exit()?;

    if app.monitor_not_found {
        println!("{NOT_FOUND_MESSAGE}");
    }
    Ok(())
}

/// Runs without a TUI, printing a text banner per reading to stdout.
///
/// Stops when `parent_token` is cancelled, the connect timeout passes, or the
/// source reports an error (there's no UI to dismiss it).
pub async fn run_headless(
    arg_config: TopLevelCmd,
    parent_token: CancellationToken,
) -> Result<(), AppError> {
    let mut app = App::build(&arg_config, Some(parent_token))?;

    info!("Loaded config from: {}", app.config_path.display());

    info!("Starting app... v{}", env!("CARGO_PKG_VERSION"));

    app.init();

    let cancel_app = app.cancel_app.clone();
    while !cancel_app.is_cancelled() {
        let deadline = app.connect_deadline();
        tokio::select! {
            Some(update) = app.monitor_update() => {
                match &update {
                    MonitorUpdate::Connected { name } => println!("Connected to {name}!"),
                    MonitorUpdate::Disconnected => {
                        warn!("Monitor disconnected");
                        println!("Monitor disconnected, reconnecting...");
                    }
                    _ => {}
                }
                if let Some(update) = app.handle_monitor_update(update) {
                    let width = app.display.visible_samples();
                    println!("{}", banner::banner_line(update.measurement.bpm, update.hrv, width));
                }
                if let Some(message) = app.error_message.take() {
                    eprintln!("{message}");
                    cancel_app.cancel();
                }
            }
            _ = connect_deadline_passed(deadline) => app.connect_timed_out(),
            _ = cancel_app.cancelled() => {}
        }
    }
    info!("Joining...");
    // After while loop closes
    app.join_threads().await;

    if app.monitor_not_found {
        println!("{NOT_FOUND_MESSAGE}");
    }

    info!("Shutting down gracefully...");

    Ok(())
}

// The config path is resolved before we move into the working directory.
// Override files don't have to exist yet, so canonicalize isn't enough.
fn absolute_path(path: PathBuf) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Returns the directory that logs, config, and other files should be placed in by default.
// The rules for how it determines the directory is as follows:
// If the app is built with the portable feature, it will just return it's parent directory.
// If there is a config file present adjacent to the executable, the executable's parent path is returned.
// Otherwise, it will return the `directories` `config_dir` output.
//
// Debug builds are always portable. Release builds can optionally have the "portable" feature enabled.
fn determine_working_directory() -> Option<PathBuf> {
    let portable = is_portable();
    let exe_path = std::env::current_exe().ok()?;
    let exe_parent = exe_path.parent()?.to_path_buf();
    let config_path = exe_path.with_extension("toml");

    if portable || config_path.exists() {
        Some(exe_parent)
    } else {
        get_user_dir()
    }
}

#[cfg(any(debug_assertions, feature = "portable"))]
fn is_portable() -> bool {
    true
}

#[cfg(not(any(debug_assertions, feature = "portable")))]
fn is_portable() -> bool {
    false
}

#[cfg(any(debug_assertions, feature = "portable"))]
fn get_user_dir() -> Option<PathBuf> {
    None
}

#[cfg(not(any(debug_assertions, feature = "portable")))]
fn get_user_dir() -> Option<PathBuf> {
    if let Some(base_dirs) = BaseDirs::new() {
        let mut config_dir = base_dirs.config_dir().to_owned();
        config_dir.push(env!("CARGO_PKG_NAME"));
        Some(config_dir)
    } else {
        None
    }
}
