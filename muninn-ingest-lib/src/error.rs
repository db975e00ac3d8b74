use thiserror::Error;

/// Errors surfaced at crate boundaries: configuration loading and server
/// startup. Frame, decode and sink failures have their own module-level
/// types because the pipeline handles them per connection.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sink error: {0}")]
    Sink(#[from] crate::sink::SinkError),

    #[error("sink initialisation exceeded the {0}s startup deadline")]
    SinkInitTimeout(u64),
}

pub type Result<T> = std::result::Result<T, IngestError>;
