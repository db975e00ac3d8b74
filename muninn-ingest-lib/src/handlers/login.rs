use chrono::Utc;
use tracing::info;

use super::{insert_with_deadline, HandlerError};
use crate::codec::{encode_ack, Frame, LoginPayload, TimeZoneLanguage, ACK_LEN};
use crate::sink::{collections, Record, RecordSink};
use crate::tcp::session::Session;

pub(super) async fn handle(
    frame: &Frame,
    session: &Session,
    sink: &dyn RecordSink,
) -> Result<[u8; ACK_LEN], HandlerError> {
    let login = LoginPayload::decode(&frame.payload)?;
    let tz = TimeZoneLanguage::decode(login.time_zone_language)?;

    let record = Record::new()
        .set("terminal_id", login.terminal_id_hex())
        .set("model_code", login.model_code_hex())
        .set("time_zone_language", login.time_zone_language.as_slice())
        .set("gmt", tz.gmt)
        .set("region", tz.region.as_str())
        .set("language", tz.language.as_str())
        .set("created_at", Utc::now());
    let inserted_id = insert_with_deadline(sink, collections::LOGIN, record).await?;

    info!(
        trace_id = %session.trace.trace_id,
        span_id = %session.trace.span_id,
        terminal_id = %login.terminal_id_hex(),
        %inserted_id,
        "device login recorded"
    );
    Ok(encode_ack(frame.protocol, frame.serial))
}
