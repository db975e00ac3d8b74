#![forbid(unsafe_code)]

pub mod connection;
pub mod handler;
pub mod session;

use std::sync::Arc;

use handler::IngestHandler;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::sink::RecordSink;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bind failed: {0}")]
    Bind(std::io::Error),
}

/// Binds the tracker-facing listener and serves until the shutdown signal
/// flips. Bind failure is the only startup error; everything after that is
/// handled per connection.
pub async fn run(
    config: Arc<Config>,
    sink: Arc<dyn RecordSink>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.tcp_listen).await.map_err(ServerError::Bind)?;
    info!(addr = %config.tcp_listen, "tcp listener bound");

    let handler = IngestHandler::new(config, sink);
    handler.run(listener, shutdown).await;
    Ok(())
}
