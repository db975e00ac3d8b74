use chrono::Utc;
use tracing::info;

use super::{insert_with_deadline, HandlerError};
use crate::codec::{encode_ack, Frame, LocationPayload, ACK_LEN};
use crate::sink::{collections, Record, RecordSink};
use crate::tcp::session::Session;

pub(super) async fn handle(
    frame: &Frame,
    session: &Session,
    sink: &dyn RecordSink,
) -> Result<[u8; ACK_LEN], HandlerError> {
    let location = LocationPayload::decode(&frame.payload)?;
    let fix_time = location.fix_time()?;

    let record = Record::new()
        .set("date_time", fix_time)
        .set("gps_satellites", location.gps_sat)
        .set("latitude", location.latitude())
        .set("longitude", location.longitude())
        .set("speed", location.speed)
        .set("course_status", location.course_status)
        .set("mcc", location.mcc)
        .set("mnc", location.mnc)
        .set("lac", location.lac)
        .set("cell_id", location.cell_id)
        .set("acc_status", location.acc_status)
        .set("upload_mode", location.upload_mode)
        .set("gps_real_time_reupload", location.gps_real_time_reupload)
        .set("mileage", location.mileage)
        .set("created_at", Utc::now());
    insert_with_deadline(sink, collections::LOCATION, record).await?;

    info!(
        trace_id = %session.trace.trace_id,
        span_id = %session.trace.span_id,
        latitude = location.latitude(),
        longitude = location.longitude(),
        speed = location.speed,
        "location recorded"
    );
    Ok(encode_ack(frame.protocol, frame.serial))
}
