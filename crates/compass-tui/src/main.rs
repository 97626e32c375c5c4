mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod mpv;
mod preview;
mod search;
mod theme;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use compass_proto::client::AnalyzeClient;
use compass_proto::config::Config;
use tokio::sync::mpsc;

/// Terminal client for the Sonic Compass recommendation backend.
#[derive(Parser, Debug)]
#[command(name = "sonic-compass", version, about)]
struct Args {
    /// Analyze endpoint, overrides `backend.analyze_url` from the config.
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Search for this right away (comma-separated artists or genres).
    #[arg(value_name = "QUERY")]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let data_dir = compass_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("sonic-compass.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("sonic-compass log: {}", log_path.display());

    tracing::info!("sonic-compass starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("config load failed, using defaults: {:#}", e);
        Config::default()
    });
    if let Some(endpoint) = args.endpoint {
        config.backend.analyze_url = endpoint;
    }
    compass_proto::platform::set_use_system_deps(config.preview.use_system_mpv);

    let client = AnalyzeClient::from_config(&config.backend)?;
    tracing::info!("analyze endpoint: {}", client.analyze_url());

    // ── Preview players report back through this channel ────────────────────
    let (preview_tx, preview_rx) = mpsc::unbounded_channel();
    let launcher = preview::MpvLauncher::new(config.preview.volume.min(100), preview_tx);

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(
        client,
        Box::new(launcher),
        preview_rx,
        app::AppOptions {
            mouse: config.ui.mouse,
            show_keys_bar: config.ui.show_keys_bar,
            health_check: config.backend.health_check,
            initial_query: args.query,
        },
    );
    app.run().await?;

    tracing::info!("sonic-compass exited");
    Ok(())
}
