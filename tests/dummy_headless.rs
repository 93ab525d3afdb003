use std::time::Duration;

use hrv_tui::args::{DummyCmd, SubCommands, TopLevelCmd};
use tokio_util::sync::CancellationToken;

use ntest::timeout;

use common::headless_thread;
mod common;

#[test]
#[timeout(10000)] // 10s timeout
fn dummy_source_runs_until_cancelled() {
    let parent_token = CancellationToken::new();

    let arg_config = TopLevelCmd {
        config_override: Some("tests/test_configs/dummy.toml".into()),
        config_required: true,
        no_save: true,
        all_rr: true,
        subcommands: Some(SubCommands::Dummy(DummyCmd {})),
        ..Default::default()
    };

    let parent_clone = parent_token.clone();
    let app_thread = std::thread::spawn(move || headless_thread(arg_config, parent_clone));

    std::thread::sleep(Duration::from_millis(1500));
    assert!(!app_thread.is_finished(), "app exited early");

    parent_token.cancel();
    let result = app_thread.join().expect("app thread panicked");
    assert!(result.is_ok(), "{result:?}");
}
