#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod sink;
pub mod tcp;
pub mod telemetry;

pub use config::{load_from_path, Config, SinkConfig};
pub use error::{IngestError, Result};
pub use sink::{JsonlSink, MemorySink, Record, RecordSink, SinkError, Value};
pub use tcp::{run, ServerError};
pub use telemetry::TraceContext;
