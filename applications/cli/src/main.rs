/// Cadence - headless player for a queue backend
use cadence_cli::{config::CliConfig, shell, HeadlessDevice};
use cadence_client::{BackendClient, QueueClient, TrackResolver};
use cadence_playback::PlaybackController;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Play a backend-owned queue from the terminal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Backend API base URL (overrides the config file)
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Start playing as soon as the first track is ready
    #[arg(long)]
    autoplay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        config.backend.url = url;
    }
    config.autoplay |= cli.autoplay;
    config.validate()?;

    // stdout is for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Backend: {}", config.backend.url);

    let backend = BackendClient::new(config.backend.clone())?;
    let device = Arc::new(HeadlessDevice::new(backend.http().clone()));
    let queue = Arc::new(QueueClient::new(backend.clone()));
    let resolver = TrackResolver::new(backend);

    let controller = PlaybackController::new(
        config.playback.to_playback_config(),
        queue,
        resolver,
        device,
    );

    let printer = shell::spawn_event_printer(controller.subscribe());
    let signals = controller.spawn_signal_loop();

    let outcome = controller.start().await;
    info!(?outcome, "Initial load finished");
    if config.autoplay {
        controller.play().await;
    }

    println!("{}", cadence_cli::commands::HELP);
    shell::run(&controller, BufReader::new(tokio::io::stdin())).await?;

    controller.shutdown().await;
    signals.abort();
    printer.abort();

    info!("Goodbye");
    Ok(())
}
