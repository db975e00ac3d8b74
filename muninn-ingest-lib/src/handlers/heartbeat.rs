use tracing::debug;

use super::HandlerError;
use crate::codec::{encode_ack, Frame, HeartbeatPayload, ACK_LEN};
use crate::tcp::session::Session;

/// Heartbeats are acknowledged but not persisted.
pub(super) fn handle(frame: &Frame, session: &Session) -> Result<[u8; ACK_LEN], HandlerError> {
    let heartbeat = HeartbeatPayload::decode(&frame.payload)?;

    debug!(
        trace_id = %session.trace.trace_id,
        span_id = %session.trace.span_id,
        external_voltage = heartbeat.external_voltage,
        battery_level = heartbeat.battery_level,
        gsm_signal = heartbeat.gsm_signal,
        "heartbeat received"
    );
    Ok(encode_ack(frame.protocol, frame.serial))
}
