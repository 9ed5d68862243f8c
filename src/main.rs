use anyhow::{Context, Result};
use std::process::ExitCode;

use skillpick::{
    app::App,
    cli::{print_error, Args, TerminalPicker},
    config::{Config, LaunchMode},
    launcher::Launcher,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse_from_env();

    // ログは標準エラーへ（デフォルトはWARN、RUST_LOGで上書き）
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 起動モードは起動時に一度だけ読む
    let mode = LaunchMode::from_env();

    match run(args, mode).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, mode: LaunchMode) -> Result<i32> {
    let config = Config::load_default().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config file: {:#}, using defaults", e);
        Config::default()
    });

    tracing::info!("skillpick v{} starting...", skillpick::VERSION);

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let launcher = Launcher::new(config.launcher.clone(), mode);
    let mut app = App::new(config, cwd, TerminalPicker::new(), launcher);

    app.run(&args).await
}
