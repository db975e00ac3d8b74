use chrono::Utc;
use tracing::info;

use super::{insert_with_deadline, HandlerError};
use crate::codec::{encode_ack, AlarmPayload, Frame, ACK_LEN};
use crate::sink::{collections, Record, RecordSink};
use crate::tcp::session::Session;

pub(super) async fn handle(
    frame: &Frame,
    session: &Session,
    sink: &dyn RecordSink,
) -> Result<[u8; ACK_LEN], HandlerError> {
    let alarm = AlarmPayload::decode(&frame.payload)?;
    let fix_time = alarm.fix_time()?;

    let record = Record::new()
        .set("date_time", fix_time)
        .set("gps_satellites", alarm.gps_sat)
        .set("latitude", alarm.latitude())
        .set("longitude", alarm.longitude())
        .set("speed", alarm.speed)
        .set("course_status", alarm.course_status)
        .set("lbs_length", alarm.lbs_length)
        .set("mcc", alarm.mcc)
        .set("mnc", alarm.mnc)
        .set("lac", alarm.lac)
        .set("cell_id", alarm.cell_id)
        .set("terminal_info", alarm.terminal_info)
        .set("voltage_level", alarm.voltage_level)
        .set("gsm_signal", alarm.gsm_signal)
        .set("alarm_language", alarm.alarm_language)
        .set("mileage", alarm.mileage)
        .set("created_at", Utc::now());
    insert_with_deadline(sink, collections::ALARM, record).await?;

    info!(
        trace_id = %session.trace.trace_id,
        span_id = %session.trace.span_id,
        latitude = alarm.latitude(),
        longitude = alarm.longitude(),
        alarm_language = alarm.alarm_language,
        "alarm recorded"
    );
    Ok(encode_ack(frame.protocol, frame.serial))
}
