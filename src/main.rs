use hrv_tui::{args::TopLevelCmd, run_headless, run_tui, AppResult};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AppResult<()> {
    let arg_config: TopLevelCmd = argh::from_env();

    if arg_config.headless {
        // stdout carries the readings, so logs go to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .init();
        run_headless(arg_config, CancellationToken::new()).await?;
    } else {
        run_tui(arg_config).await?;
    }
    Ok(())
}
