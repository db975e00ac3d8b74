//! Field-level decoding of the four payload kinds. All multi-byte integers on
//! the wire are big-endian; coordinates are 1/1,800,000-degree fixed point.

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("payload too short for {kind}: {len} bytes")]
    Truncated { kind: &'static str, len: usize },
    #[error("invalid language bits: {0:#04b}")]
    LanguageBits(u8),
    #[error("invalid datetime field: {0:02X?}")]
    BadDateTime([u8; 6]),
    #[error("gmt offset {0} has no wire representation")]
    UnrepresentableZone(f64),
}

fn be_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

fn be_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// The wire carries three cell-id bytes; they are widened to u32 with a zero
/// top byte.
fn be_u24(buf: &[u8], at: usize) -> u32 {
    u32::from(buf[at]) << 16 | u32::from(buf[at + 1]) << 8 | u32::from(buf[at + 2])
}

fn fix_datetime(raw: [u8; 6]) -> Result<DateTime<Utc>, DecodeError> {
    let [yy, mm, dd, hh, mi, ss] = raw;
    Utc.with_ymd_and_hms(
        2000 + i32::from(yy),
        u32::from(mm),
        u32::from(dd),
        u32::from(hh),
        u32::from(mi),
        u32::from(ss),
    )
    .single()
    .ok_or(DecodeError::BadDateTime(raw))
}

/// Raw 1/1,800,000-degree fixed point to decimal degrees.
fn degrees(raw: u32) -> f64 {
    f64::from(raw) / 1_800_000.0
}

/// Login payload: terminal id, model code and the packed timezone/language
/// word, all kept raw here. Rendering and timezone decoding happen in the
/// handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPayload {
    pub terminal_id: [u8; 8],
    pub model_code: [u8; 2],
    pub time_zone_language: [u8; 2],
}

impl LoginPayload {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < 12 {
            return Err(DecodeError::Truncated { kind: "login", len: buf.len() });
        }
        let mut terminal_id = [0u8; 8];
        terminal_id.copy_from_slice(&buf[..8]);
        Ok(Self {
            terminal_id,
            model_code: [buf[8], buf[9]],
            time_zone_language: [buf[10], buf[11]],
        })
    }

    pub fn terminal_id_hex(&self) -> String {
        hex::encode(self.terminal_id)
    }

    pub fn model_code_hex(&self) -> String {
        hex::encode(self.model_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatPayload {
    pub terminal_info: u8,
    /// External supply voltage in 0.01 V units.
    pub external_voltage: u16,
    pub battery_level: u8,
    pub gsm_signal: u8,
    pub language_status: u16,
}

impl HeartbeatPayload {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < 7 {
            return Err(DecodeError::Truncated { kind: "heartbeat", len: buf.len() });
        }
        Ok(Self {
            terminal_info: buf[0],
            external_voltage: be_u16(buf, 1),
            battery_level: buf[3],
            gsm_signal: buf[4],
            language_status: be_u16(buf, 5),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationPayload {
    pub datetime: [u8; 6],
    pub gps_sat: u8,
    pub latitude_raw: u32,
    pub longitude_raw: u32,
    /// km/h.
    pub speed: u8,
    /// Course and status bits, preserved raw.
    pub course_status: u16,
    pub mcc: u16,
    pub mnc: u8,
    pub lac: u16,
    pub cell_id: u32,
    pub acc_status: u8,
    pub upload_mode: u8,
    pub gps_real_time_reupload: u8,
    pub mileage: u32,
}

impl LocationPayload {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < 33 {
            return Err(DecodeError::Truncated { kind: "location", len: buf.len() });
        }
        let mut datetime = [0u8; 6];
        datetime.copy_from_slice(&buf[..6]);
        Ok(Self {
            datetime,
            gps_sat: buf[6],
            latitude_raw: be_u32(buf, 7),
            longitude_raw: be_u32(buf, 11),
            speed: buf[15],
            course_status: be_u16(buf, 16),
            mcc: be_u16(buf, 18),
            mnc: buf[20],
            lac: be_u16(buf, 21),
            cell_id: be_u24(buf, 23),
            acc_status: buf[26],
            upload_mode: buf[27],
            gps_real_time_reupload: buf[28],
            mileage: be_u32(buf, 29),
        })
    }

    pub fn fix_time(&self) -> Result<DateTime<Utc>, DecodeError> {
        fix_datetime(self.datetime)
    }

    pub fn latitude(&self) -> f64 {
        degrees(self.latitude_raw)
    }

    pub fn longitude(&self) -> f64 {
        degrees(self.longitude_raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmPayload {
    pub datetime: [u8; 6],
    pub gps_sat: u8,
    pub latitude_raw: u32,
    pub longitude_raw: u32,
    pub speed: u8,
    pub course_status: u16,
    pub lbs_length: u8,
    pub mcc: u16,
    pub mnc: u8,
    pub lac: u16,
    pub cell_id: u32,
    pub terminal_info: u8,
    pub voltage_level: u8,
    pub gsm_signal: u8,
    pub alarm_language: u16,
    pub mileage: u32,
}

impl AlarmPayload {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < 36 {
            return Err(DecodeError::Truncated { kind: "alarm", len: buf.len() });
        }
        let mut datetime = [0u8; 6];
        datetime.copy_from_slice(&buf[..6]);
        Ok(Self {
            datetime,
            gps_sat: buf[6],
            latitude_raw: be_u32(buf, 7),
            longitude_raw: be_u32(buf, 11),
            speed: buf[15],
            course_status: be_u16(buf, 16),
            lbs_length: buf[18],
            mcc: be_u16(buf, 19),
            mnc: buf[21],
            lac: be_u16(buf, 22),
            cell_id: be_u24(buf, 24),
            terminal_info: buf[27],
            voltage_level: buf[28],
            gsm_signal: buf[29],
            alarm_language: be_u16(buf, 30),
            mileage: be_u32(buf, 32),
        })
    }

    pub fn fix_time(&self) -> Result<DateTime<Utc>, DecodeError> {
        fix_datetime(self.datetime)
    }

    pub fn latitude(&self) -> f64 {
        degrees(self.latitude_raw)
    }

    pub fn longitude(&self) -> f64 {
        degrees(self.longitude_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_decodes_and_renders_hex() {
        let payload = [
            0x03, 0x51, 0x60, 0x72, 0x70, 0x42, 0x10, 0x46, // terminal id
            0x50, 0x90, // model code
            0x32, 0x00, // timezone/language
        ];
        let info = LoginPayload::decode(&payload).expect("valid login payload");
        assert_eq!(info.terminal_id_hex(), "0351607270421046");
        assert_eq!(info.model_code_hex(), "5090");
        assert_eq!(info.time_zone_language, [0x32, 0x00]);
    }

    #[test]
    fn login_rejects_short_payload() {
        assert_eq!(
            LoginPayload::decode(&[0u8; 11]),
            Err(DecodeError::Truncated { kind: "login", len: 11 })
        );
    }

    #[test]
    fn heartbeat_decodes_fields() {
        let payload = [0x44, 0x04, 0x00, 0x04, 0x81, 0x00, 0x02];
        let info = HeartbeatPayload::decode(&payload).expect("valid heartbeat payload");
        assert_eq!(info.terminal_info, 0x44);
        assert_eq!(info.external_voltage, 0x0400);
        assert_eq!(info.battery_level, 0x04);
        assert_eq!(info.gsm_signal, 0x81);
        assert_eq!(info.language_status, 0x0002);
    }

    #[test]
    fn heartbeat_rejects_short_payload() {
        assert_eq!(
            HeartbeatPayload::decode(&[0u8; 6]),
            Err(DecodeError::Truncated { kind: "heartbeat", len: 6 })
        );
    }

    fn sample_location_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[24, 6, 15, 12, 30, 45]); // 2024-06-15 12:30:45 UTC
        buf.push(0xC9); // gps info / satellites
        buf.extend_from_slice(&40_642_038u32.to_be_bytes()); // ~22.57891 deg
        buf.extend_from_slice(&203_821_680u32.to_be_bytes()); // ~113.2342667 deg
        buf.push(60); // speed
        buf.extend_from_slice(&0x1546u16.to_be_bytes()); // course/status
        buf.extend_from_slice(&460u16.to_be_bytes()); // mcc
        buf.push(0); // mnc
        buf.extend_from_slice(&0x2795u16.to_be_bytes()); // lac
        buf.extend_from_slice(&[0x0E, 0xEA, 0x2E]); // cell id, 3 bytes
        buf.push(1); // acc
        buf.push(0); // upload mode
        buf.push(0); // gps real-time reupload
        buf.extend_from_slice(&123_456u32.to_be_bytes()); // mileage
        buf
    }

    #[test]
    fn location_decodes_fields() {
        let buf = sample_location_bytes();
        let info = LocationPayload::decode(&buf).expect("valid location payload");
        assert_eq!(info.gps_sat, 0xC9);
        assert!((info.latitude() - 22.578_91).abs() < 1e-6);
        assert!((info.longitude() - 113.234_266_7).abs() < 1e-6);
        assert_eq!(info.speed, 60);
        assert_eq!(info.course_status, 0x1546);
        assert_eq!(info.mcc, 460);
        assert_eq!(info.lac, 0x2795);
        assert_eq!(info.cell_id, 0x000E_EA2E);
        assert_eq!(info.mileage, 123_456);
        let at = info.fix_time().expect("valid datetime");
        assert_eq!(at.to_rfc3339(), "2024-06-15T12:30:45+00:00");
    }

    #[test]
    fn location_rejects_bad_calendar_date() {
        let mut buf = sample_location_bytes();
        buf[1] = 13; // month 13
        let info = LocationPayload::decode(&buf).expect("sizes still valid");
        assert!(matches!(info.fix_time(), Err(DecodeError::BadDateTime(_))));
    }

    #[test]
    fn alarm_decodes_superset_fields() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&[24, 1, 2, 3, 4, 5]);
        buf.push(0x4A); // satellites
        buf.extend_from_slice(&40_642_038u32.to_be_bytes());
        buf.extend_from_slice(&203_821_680u32.to_be_bytes());
        buf.push(0); // speed
        buf.extend_from_slice(&0x0000u16.to_be_bytes()); // course/status
        buf.push(9); // lbs length
        buf.extend_from_slice(&460u16.to_be_bytes()); // mcc
        buf.push(2); // mnc
        buf.extend_from_slice(&0x1234u16.to_be_bytes()); // lac
        buf.extend_from_slice(&[0x00, 0x00, 0x2A]); // cell id
        buf.push(0x44); // terminal info
        buf.push(0x05); // voltage level
        buf.push(0x60); // gsm signal
        buf.extend_from_slice(&0x0601u16.to_be_bytes()); // alarm/language
        buf.extend_from_slice(&9_999u32.to_be_bytes()); // mileage
        assert_eq!(buf.len(), 36);

        let info = AlarmPayload::decode(&buf).expect("valid alarm payload");
        assert_eq!(info.lbs_length, 9);
        assert_eq!(info.mnc, 2);
        assert_eq!(info.cell_id, 0x2A);
        assert_eq!(info.terminal_info, 0x44);
        assert_eq!(info.voltage_level, 0x05);
        assert_eq!(info.gsm_signal, 0x60);
        assert_eq!(info.alarm_language, 0x0601);
        assert_eq!(info.mileage, 9_999);
    }

    #[test]
    fn alarm_rejects_short_payload() {
        assert_eq!(
            AlarmPayload::decode(&[0u8; 35]),
            Err(DecodeError::Truncated { kind: "alarm", len: 35 })
        );
    }

    #[test]
    fn cell_id_top_byte_is_zero() {
        let mut buf = sample_location_bytes();
        buf[23] = 0xFF;
        buf[24] = 0xFF;
        buf[25] = 0xFF;
        let info = LocationPayload::decode(&buf).expect("valid location payload");
        assert_eq!(info.cell_id, 0x00FF_FFFF);
    }
}
