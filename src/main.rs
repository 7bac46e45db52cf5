use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pulsewatch::{
    cmd::{ClassifyArgs, classify},
    config::AppConfig,
    providers::{JsonLinesSource, MessageSource},
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the monitoring supervisor over a stream of JSON-lines messages.
    Run {
        /// Directory holding `app.yaml` and `consent.yaml`. Defaults to `configs`.
        #[arg(short, long)]
        config_dir: Option<String>,
        /// File to read messages from. Reads standard input when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Classifies a single text and prints the verdict as JSON.
    Classify(ClassifyArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config_dir, input } => run_supervisor(config_dir, input).await?,
        Commands::Classify(args) => classify::execute(args).await?,
    }

    Ok(())
}

async fn run_supervisor(
    config_dir: Option<String>,
    input: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(config_dir.as_deref())?;
    tracing::debug!(
        mode = %config.harm.mode,
        min_severity = %config.harm.min_severity,
        require_consent = config.require_consent,
        azure = config.azure.is_some(),
        "Configuration loaded."
    );

    let source: Box<dyn MessageSource> = match input {
        Some(path) => {
            tracing::info!(path = %path.display(), "Reading messages from file.");
            Box::new(JsonLinesSource::open(&path).await?)
        }
        None => {
            tracing::info!("Reading messages from standard input.");
            Box::new(JsonLinesSource::stdin())
        }
    };

    let supervisor = Supervisor::builder().config(config).source(source).build().await?;

    tracing::info!("Supervisor initialized, starting monitoring...");
    let snapshot = supervisor.run().await?;
    tracing::info!(
        deliveries = snapshot.deliveries_succeeded,
        failures = snapshot.deliveries_failed,
        "Monitoring finished."
    );

    Ok(())
}
