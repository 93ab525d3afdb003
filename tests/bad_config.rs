use hrv_tui::args::TopLevelCmd;
use hrv_tui::errors::AppError;

use tokio_util::sync::CancellationToken;

use ntest::timeout;

fn required_config(path: &str) -> TopLevelCmd {
    TopLevelCmd {
        config_override: Some(path.into()),
        config_required: true,
        no_save: true,
        ..Default::default()
    }
}

#[tokio::test]
#[timeout(3000)] // 3s timeout
async fn misspelled_bool() {
    let result = hrv_tui::run_headless(
        required_config("tests/test_configs/misspelled_bool.toml"),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Config(_))), "{result:?}");
}

#[tokio::test]
#[timeout(3000)] // 3s timeout
async fn missing_end_quote() {
    let result = hrv_tui::run_headless(
        required_config("tests/test_configs/missing_end_quote.toml"),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Config(_))), "{result:?}");
}

#[tokio::test]
#[timeout(3000)] // 3s timeout
async fn missing_required_config() {
    let result = hrv_tui::run_headless(
        required_config("tests/test_configs/does_not_exist.toml"),
        CancellationToken::new(),
    )
    .await;
    assert!(matches!(result, Err(AppError::Config(_))), "{result:?}");
}

#[test]
fn wrong_type() {
    let result = hrv_tui::settings::Settings::load(
        std::path::Path::new("tests/test_configs/wrong_type.toml"),
        true,
    );
    assert!(result.is_err());
}
