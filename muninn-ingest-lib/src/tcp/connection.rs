//! Per-connection pipeline: peel complete frames off the inbound buffer,
//! dispatch each, write the acknowledgment, then discard exactly the consumed
//! bytes. One byte is dropped per failed probe or parse so the stream
//! re-synchronizes after noise.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::codec::{frame_probe, parse_frame, FrameError, FrameProbe};
use crate::handlers::{self, HandlerError};
use crate::sink::RecordSink;
use crate::tcp::session::{SessionId, SessionRegistry};

const READ_CHUNK: usize = 4096;

enum Flow {
    Continue,
    Close,
}

pub(crate) async fn drive(
    mut stream: TcpStream,
    id: SessionId,
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn RecordSink>,
    mut shutdown: watch::Receiver<bool>,
) {
    let Some(session) = registry.get(id) else {
        return;
    };
    let trace_id = session.trace.trace_id.clone();
    let span_id = session.trace.span_id.clone();

    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        match drain_frames(&mut buf, &mut stream, id, &registry, sink.as_ref()).await {
            Flow::Continue => {}
            Flow::Close => return,
        }

        tokio::select! {
            res = stream.read_buf(&mut buf) => match res {
                Ok(0) => {
                    debug!(%trace_id, %span_id, "peer closed connection");
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%trace_id, %span_id, error = %e, "read failed");
                    return;
                }
            },
            _ = session.closed() => {
                debug!(%trace_id, %span_id, "connection close requested");
                return;
            }
            _ = shutdown.changed() => {
                info!(%trace_id, %span_id, "closing connection for shutdown");
                return;
            }
        }
    }
}

/// Resolves zero or more complete frames from the buffer head. Returns
/// `Continue` when more bytes are needed, `Close` when the connection must
/// end.
async fn drain_frames(
    buf: &mut BytesMut,
    stream: &mut TcpStream,
    id: SessionId,
    registry: &Arc<SessionRegistry>,
    sink: &dyn RecordSink,
) -> Flow {
    loop {
        let total = match frame_probe(buf) {
            FrameProbe::Need(_) => return Flow::Continue,
            FrameProbe::Invalid => {
                debug!("discarding byte to recover frame sync");
                buf.advance(1);
                continue;
            }
            FrameProbe::Have(total) => total,
        };
        if buf.len() < total {
            return Flow::Continue;
        }

        let frame = match parse_frame(&buf[..total]) {
            Ok(frame) => frame,
            Err(FrameError::CrcMismatch { expected, got }) => {
                warn!(expected, got, "CRC mismatch, dropping one byte");
                buf.advance(1);
                continue;
            }
            Err(e) => {
                debug!(error = %e, "invalid frame, dropping one byte");
                buf.advance(1);
                continue;
            }
        };

        // The sweeper may have evicted us between frames; a stale lookup
        // means this connection must close.
        let Some(session) = registry.get(id) else {
            return Flow::Close;
        };
        session.touch();

        let ack = match handlers::dispatch(&frame, &session, sink).await {
            Ok(ack) => ack,
            Err(HandlerError::UnknownProtocol(protocol)) => {
                error!(
                    trace_id = %session.trace.trace_id,
                    span_id = %session.trace.span_id,
                    protocol,
                    "unknown protocol number"
                );
                return Flow::Close;
            }
            Err(HandlerError::Decode(e)) => {
                warn!(
                    trace_id = %session.trace.trace_id,
                    span_id = %session.trace.span_id,
                    error = %e,
                    "packet processing failed"
                );
                return Flow::Close;
            }
            Err(HandlerError::Sink(e)) => {
                error!(
                    trace_id = %session.trace.trace_id,
                    span_id = %session.trace.span_id,
                    error = %e,
                    "failed to persist record"
                );
                return Flow::Close;
            }
        };

        // The ack goes out before the next frame is taken from the buffer.
        if let Some(ack) = ack {
            if let Err(e) = stream.write_all(&ack).await {
                warn!(
                    trace_id = %session.trace.trace_id,
                    span_id = %session.trace.span_id,
                    error = %e,
                    "failed to send response"
                );
                return Flow::Close;
            }
        }

        buf.advance(total);
    }
}
