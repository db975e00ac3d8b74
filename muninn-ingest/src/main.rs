#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use muninn_ingest_lib::config::{load_from_path, Config, SinkConfig};
use muninn_ingest_lib::error::IngestError;
use muninn_ingest_lib::sink::{JsonlSink, MemorySink, RecordSink};
use muninn_ingest_lib::{tcp, telemetry};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Muninn GT06/Concox telemetry ingest server")]
struct Cli {
    /// Path to configuration YAML file
    #[arg(short, long, value_name = "FILE", default_value = "etc/server.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            telemetry::init_tracing("info");
            error!(%err, "failed to load configuration");
            std::process::exit(1);
        }
    };
    telemetry::init_tracing(&cfg.log_level);
    info!(listen = %cfg.tcp_listen, sink = ?cfg.sink, "configuration loaded");

    let sink = match build_sink(&cfg).await {
        Ok(sink) => sink,
        Err(err) => {
            error!(%err, "failed to initialise record sink");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(err) = tcp::run(Arc::new(cfg), sink, shutdown_rx).await {
        error!(%err, "server exited with error");
        std::process::exit(1);
    }
}

async fn build_sink(cfg: &Config) -> Result<Arc<dyn RecordSink>, IngestError> {
    match &cfg.sink {
        SinkConfig::Memory => {
            let sink: Arc<dyn RecordSink> = Arc::new(MemorySink::new());
            Ok(sink)
        }
        SinkConfig::Jsonl { path } => {
            let deadline = Duration::from_secs(cfg.timeout_seconds);
            let sink = tokio::time::timeout(deadline, JsonlSink::create(path.clone()))
                .await
                .map_err(|_| IngestError::SinkInitTimeout(cfg.timeout_seconds))??;
            let sink: Arc<dyn RecordSink> = Arc::new(sink);
            Ok(sink)
        }
    }
}
