//! Protocol-kind handlers. Each takes one parsed frame plus the session
//! context, may persist a record, and returns the acknowledgment bytes.

mod alarm;
mod heartbeat;
mod location;
mod login;

use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::codec::{proto, DecodeError, Frame, ACK_LEN};
use crate::sink::{Record, RecordSink, SinkError};
use crate::tcp::session::Session;

/// Per-insert deadline; a sink slower than this closes the connection.
pub const SINK_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("payload decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("unknown protocol number: {0:#04X}")]
    UnknownProtocol(u8),
}

pub async fn dispatch(
    frame: &Frame,
    session: &Session,
    sink: &dyn RecordSink,
) -> Result<Option<[u8; ACK_LEN]>, HandlerError> {
    match frame.protocol {
        proto::LOGIN => login::handle(frame, session, sink).await.map(Some),
        proto::HEARTBEAT | proto::HEARTBEAT_ALT => heartbeat::handle(frame, session).map(Some),
        proto::LOCATION | proto::LOCATION_UTC => {
            location::handle(frame, session, sink).await.map(Some)
        }
        proto::ALARM => alarm::handle(frame, session, sink).await.map(Some),
        other => Err(HandlerError::UnknownProtocol(other)),
    }
}

async fn insert_with_deadline(
    sink: &dyn RecordSink,
    collection: &str,
    record: Record,
) -> Result<String, SinkError> {
    match timeout(SINK_DEADLINE, sink.insert(collection, record)).await {
        Ok(res) => res,
        Err(_) => Err(SinkError::Deadline {
            collection: collection.to_string(),
            seconds: SINK_DEADLINE.as_secs(),
        }),
    }
}
