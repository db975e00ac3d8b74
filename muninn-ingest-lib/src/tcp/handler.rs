//! Accept loop, connection task spawning and the idle-session sweeper.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::sink::RecordSink;
use crate::tcp::connection;
use crate::tcp::session::{SessionGuard, SessionRegistry};

pub struct IngestHandler {
    config: Arc<Config>,
    sink: Arc<dyn RecordSink>,
    sessions: Arc<SessionRegistry>,
}

impl IngestHandler {
    pub fn new(config: Arc<Config>, sink: Arc<dyn RecordSink>) -> Self {
        Self { config, sink, sessions: Arc::new(SessionRegistry::new()) }
    }

    /// Registry handle, shared with the sweeper. Exposed so embedders and
    /// tests can observe live session counts.
    pub fn sessions(&self) -> Arc<SessionRegistry> {
        self.sessions.clone()
    }

    pub async fn run(&self, listener: TcpListener, shutdown: watch::Receiver<bool>) {
        info!("server booted");

        let sweeper = tokio::spawn(sweep_idle(
            self.sessions.clone(),
            Duration::from_secs(self.config.idle_seconds),
            Duration::from_secs(self.config.tick_seconds),
            shutdown.clone(),
        ));

        let mut accept_shutdown = shutdown.clone();
        loop {
            tokio::select! {
                res = listener.accept() => match res {
                    Ok((stream, addr)) => self.accept(stream, addr, &shutdown),
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                },
                res = accept_shutdown.changed() => {
                    if res.is_ok() {
                        info!("shutdown signal received, stopping accept loop");
                    }
                    break;
                }
            }
        }

        self.sessions.close_all();
        sweeper.abort();
        info!("server is shutting down");
    }

    fn accept(&self, stream: TcpStream, addr: SocketAddr, shutdown: &watch::Receiver<bool>) {
        let (id, session) = self.sessions.open(addr);
        info!(
            trace_id = %session.trace.trace_id,
            span_id = %session.trace.span_id,
            %addr,
            "new connection"
        );

        let registry = self.sessions.clone();
        let sink = self.sink.clone();
        let shutdown = shutdown.clone();
        // One task per connection: a panicking pipeline takes down only this
        // connection, and the guard still removes its session.
        tokio::spawn(async move {
            let _guard = SessionGuard::new(registry.clone(), id);
            connection::drive(stream, id, registry, sink, shutdown).await;
        });
    }
}

async fn sweep_idle(
    sessions: Arc<SessionRegistry>,
    idle: Duration,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(tick);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sessions.evict_idle(idle);
            }
            _ = shutdown.changed() => return,
        }
    }
}
