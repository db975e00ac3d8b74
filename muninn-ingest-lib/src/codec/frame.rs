//! Framing for the GT06 envelope:
//! `0x78 0x78 LEN PROTO PAYLOAD[LEN-5] SERIAL_HI SERIAL_LO CRC_HI CRC_LO 0x0D 0x0A`.
//!
//! `LEN` counts protocol byte, payload, serial and CRC, so a whole frame is
//! `LEN + 5` bytes. The CRC covers the length byte through the serial number.

use thiserror::Error;

use super::crc::crc16;

pub const START_BIT: u8 = 0x78;
pub const STOP_BIT_0: u8 = 0x0D;
pub const STOP_BIT_1: u8 = 0x0A;

/// Smallest legal value of the length byte: protocol(1) + serial(2) + crc(2).
pub const MIN_PACKET_LEN: u8 = 5;

/// Acknowledgments are always ten bytes.
pub const ACK_LEN: usize = 10;

/// Protocol numbers understood by the dispatcher.
pub mod proto {
    pub const LOGIN: u8 = 0x01;
    pub const LOCATION: u8 = 0x12;
    pub const HEARTBEAT: u8 = 0x13;
    pub const LOCATION_UTC: u8 = 0x22;
    pub const HEARTBEAT_ALT: u8 = 0x23;
    pub const ALARM: u8 = 0x26;
}

/// One parsed wire frame. The protocol number is kept raw because
/// acknowledgments must echo it verbatim, known or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub protocol: u8,
    pub payload: Vec<u8>,
    pub serial: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("buffer too small for frame: {0} bytes")]
    TooShort(usize),
    #[error("invalid start bits: {0:02X?}")]
    BadStart([u8; 2]),
    #[error("invalid packet length: {0}")]
    BadLength(u8),
    #[error("invalid stop bits: {0:02X?}")]
    BadStop([u8; 2]),
    #[error("CRC mismatch: expected {expected:#06X} got {got:#06X}")]
    CrcMismatch { expected: u16, got: u16 },
    #[error("payload of {0} bytes does not fit a single frame")]
    Oversize(usize),
}

/// Outcome of inspecting the head of a stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameProbe {
    /// Not enough bytes buffered to even read the header.
    Need(usize),
    /// A frame of this total size starts at offset zero.
    Have(usize),
    /// Offset zero does not start a plausible frame; drop a byte and retry.
    Invalid,
}

/// Inspects at most the first three buffered bytes and reports whether a
/// complete frame could start there. Never consumes input.
pub fn frame_probe(buf: &[u8]) -> FrameProbe {
    if buf.len() < 3 {
        return FrameProbe::Need(3);
    }
    if buf[0] != START_BIT || buf[1] != START_BIT {
        return FrameProbe::Invalid;
    }
    let length = buf[2];
    if length < MIN_PACKET_LEN {
        return FrameProbe::Invalid;
    }
    FrameProbe::Have(usize::from(length) + 5)
}

/// Parses a frame from the head of `buf`. Callers normally size `buf` via
/// [`frame_probe`], but every marker, the length range and the CRC are
/// re-validated here.
pub fn parse_frame(buf: &[u8]) -> Result<Frame, FrameError> {
    if buf.len() < ACK_LEN {
        return Err(FrameError::TooShort(buf.len()));
    }
    if buf[0] != START_BIT || buf[1] != START_BIT {
        return Err(FrameError::BadStart([buf[0], buf[1]]));
    }
    let length = usize::from(buf[2]);
    if length < usize::from(MIN_PACKET_LEN) {
        return Err(FrameError::BadLength(buf[2]));
    }
    let total = length + 5;
    if buf.len() < total {
        return Err(FrameError::TooShort(buf.len()));
    }

    let n = length - 5;
    let protocol = buf[3];
    let serial = u16::from_be_bytes([buf[4 + n], buf[5 + n]]);
    let expected = u16::from_be_bytes([buf[6 + n], buf[7 + n]]);
    if buf[8 + n] != STOP_BIT_0 || buf[9 + n] != STOP_BIT_1 {
        return Err(FrameError::BadStop([buf[8 + n], buf[9 + n]]));
    }

    // Length byte through the last serial byte, excluding the CRC itself.
    let got = crc16(&buf[2..2 + length - 1]);
    if got != expected {
        return Err(FrameError::CrcMismatch { expected, got });
    }

    Ok(Frame { protocol, payload: buf[4..4 + n].to_vec(), serial })
}

/// Builds the ten-byte acknowledgment. The protocol number mirrors the
/// received frame (0x22 acks as 0x22, not 0x12) and the serial is echoed.
pub fn encode_ack(protocol: u8, serial: u16) -> [u8; ACK_LEN] {
    let [ser_hi, ser_lo] = serial.to_be_bytes();
    let mut out = [
        START_BIT, START_BIT, 0x05, protocol, ser_hi, ser_lo, 0, 0, STOP_BIT_0, STOP_BIT_1,
    ];
    let [crc_hi, crc_lo] = crc16(&out[2..6]).to_be_bytes();
    out[6] = crc_hi;
    out[7] = crc_lo;
    out
}

/// Builds a complete device-side frame. Used by the test suite to fabricate
/// traffic with a correct checksum.
pub fn encode_frame(protocol: u8, payload: &[u8], serial: u16) -> Result<Vec<u8>, FrameError> {
    if payload.len() > usize::from(u8::MAX) - 5 {
        return Err(FrameError::Oversize(payload.len()));
    }
    let length = payload.len() as u8 + MIN_PACKET_LEN;
    let mut out = Vec::with_capacity(usize::from(length) + 5);
    out.extend_from_slice(&[START_BIT, START_BIT, length, protocol]);
    out.extend_from_slice(payload);
    out.extend_from_slice(&serial.to_be_bytes());
    let crc = crc16(&out[2..]);
    out.extend_from_slice(&crc.to_be_bytes());
    out.extend_from_slice(&[STOP_BIT_0, STOP_BIT_1]);
    Ok(out)
}
