//! Pure wire codec for the GT06/Concox protocol. No I/O lives here: the
//! connection pipeline feeds buffered bytes in and gets frames and
//! acknowledgment bytes back.

mod crc;
mod frame;
mod payload;
mod timezone;

pub use crc::crc16;
pub use frame::{
    encode_ack, encode_frame, frame_probe, parse_frame, proto, Frame, FrameError, FrameProbe,
    ACK_LEN, MIN_PACKET_LEN, START_BIT, STOP_BIT_0, STOP_BIT_1,
};
pub use payload::{
    AlarmPayload, DecodeError, HeartbeatPayload, LocationPayload, LoginPayload,
};
pub use timezone::{Language, Region, TimeZoneLanguage};
