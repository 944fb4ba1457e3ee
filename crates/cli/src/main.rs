//! `rankgraph` -- submit analysis jobs to the ranking backend.
//!
//! Each job subcommand submits one job, follows it to completion, and
//! prints the resulting jobs, rendered results and session counts as
//! JSON on stdout. Logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                     | Description                        |
//! |-------------------------|----------|-----------------------------|------------------------------------|
//! | `BACKEND_URL`           | no       | `http://localhost:8000/api` | Base URL of the REST backend       |
//! | `HEARTBEAT_INTERVAL_MS` | no       | `10000`                     | Liveness probe period              |
//! | `GRAPH_LOW_COLOR`       | no       | `#5b8ff9`                   | Colour of the lowest-scored node   |
//! | `GRAPH_HIGH_COLOR`      | no       | `#f4664a`                   | Colour of the highest-scored node  |
//! | `GRAPH_LABEL_CHARS`     | no       | `30`                        | Node label length                  |
//! | `RESULT_DELIMITER`      | no       | `\|`                        | Separator for the secondary stage  |
//! | `RUST_LOG`              | no       | `rankgraph=info`            | Log filter                         |

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rankgraph_cli::input;
use rankgraph_cli::report::Report;
use rankgraph_client::api::HttpTransport;
use rankgraph_client::config::ClientConfig;
use rankgraph_client::monitor::{self, ConnectionMonitor, ConnectionStatus};
use rankgraph_client::transport::Transport;
use rankgraph_client::{JobRequest, Orchestrator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "rankgraph",
    version,
    about = "Keyword, sentence and image ranking client"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Override the backend base URL
    #[arg(long, global = true)]
    backend_url: Option<String>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank keywords and keyphrases in a text
    TextRank {
        /// Text to analyse, or `-` to read stdin
        text: String,
    },
    /// Rank the sentences of a text
    Sentences {
        /// Text to analyse, or `-` to read stdin
        text: String,
    },
    /// Caption each image as its own job
    Transcribe {
        /// JPEG or PNG images
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Caption the images, then rank them by their captions
    ImageRank {
        /// JPEG or PNG images
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Probe the backend once and report whether it is reachable
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = ClientConfig::from_env().context("Invalid configuration")?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }

    tracing::info!(backend_url = %config.backend_url, "Starting rankgraph");
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config.backend_url.clone()));

    let request = match cli.command {
        Commands::Status => return status(transport.as_ref(), &config).await,
        Commands::TextRank { text } => JobRequest::TextRank(input::read_text(&text, std::io::stdin())?),
        Commands::Sentences { text } => {
            JobRequest::SentenceExtraction(input::read_text(&text, std::io::stdin())?)
        }
        Commands::Transcribe { images } => JobRequest::ImageTranscribe(input::load_images(&images)?),
        Commands::ImageRank { images } => JobRequest::ImageRank(input::load_images(&images)?),
    };

    run(transport, &config, request).await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rankgraph=info,rankgraph_cli=info,rankgraph_client=info".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

/// Submit one job, log its progress, and print the report.
async fn run(
    transport: Arc<dyn Transport>,
    config: &ClientConfig,
    request: JobRequest,
) -> anyhow::Result<()> {
    let monitor = ConnectionMonitor::start(Arc::clone(&transport), config.heartbeat_interval);
    let orchestrator = Arc::new(Orchestrator::from_config(transport, config));

    let mut events = orchestrator.subscribe();
    let logger = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => tracing::info!(event = %line, "Job event"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode job event"),
            }
        }
    });

    let outcome = orchestrator.spawn(request).await;
    let last_status = monitor.status();
    monitor.shutdown().await;
    logger.abort();

    let task_ids = match outcome? {
        Ok(ids) => ids,
        Err(e) => {
            if last_status == ConnectionStatus::Down {
                tracing::warn!("Backend was unreachable during the job");
            }
            return Err(e.into());
        }
    };

    let report = Report::collect(&orchestrator, &task_ids).await;
    println!("{}", report.to_json()?);
    Ok(())
}

/// Probe the backend once, waiting at most one heartbeat interval.
async fn status(transport: &dyn Transport, config: &ClientConfig) -> anyhow::Result<()> {
    let status = monitor::probe(transport, config.heartbeat_interval).await;
    println!("{}", serde_json::json!({ "status": status }));
    if status != ConnectionStatus::Up {
        anyhow::bail!("Backend is {status}");
    }
    Ok(())
}
