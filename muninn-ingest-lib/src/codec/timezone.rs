//! The packed timezone/language word carried in login payloads.
//!
//! Layout, big-endian 16 bits: bits 15..4 hold the GMT offset in hundredths
//! of an hour, bits 1..0 the language. The region flag shares the lowest bit
//! of the offset field: an odd offset value reads as Western and negates the
//! offset. Offsets whose parity disagrees with their sign therefore have no
//! wire form; the encoder reports them instead of silently bending the value.

use super::payload::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Eastern,
    Western,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Eastern => "Eastern",
            Region::Western => "Western",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    None,
    English,
    Chinese,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::None => "",
            Language::English => "English",
            Language::Chinese => "Chinese",
        }
    }

    fn bits(self) -> u16 {
        match self {
            Language::None => 0b00,
            Language::English => 0b01,
            Language::Chinese => 0b10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeZoneLanguage {
    /// Signed GMT offset in hours, e.g. 8.0 or -4.5.
    pub gmt: f64,
    pub region: Region,
    pub language: Language,
}

impl TimeZoneLanguage {
    pub fn decode(raw: [u8; 2]) -> Result<Self, DecodeError> {
        let r = u16::from_be_bytes(raw);

        let gmt_raw = (r >> 4) & 0xFFF;
        let mut gmt = f64::from(gmt_raw) / 100.0;
        let region = if (r >> 4) & 1 == 0 { Region::Eastern } else { Region::Western };
        if region == Region::Western {
            gmt = -gmt;
        }

        let language = match r & 0b11 {
            0b00 => Language::None,
            0b01 => Language::English,
            0b10 => Language::Chinese,
            bits => return Err(DecodeError::LanguageBits(bits as u8)),
        };

        Ok(Self { gmt, region, language })
    }

    pub fn encode(&self) -> Result<[u8; 2], DecodeError> {
        let raw = (self.gmt.abs() * 100.0).round() as u16;
        if raw > 0xFFF {
            return Err(DecodeError::UnrepresentableZone(self.gmt));
        }
        let western = self.region == Region::Western;
        if (raw & 1 == 1) != western {
            return Err(DecodeError::UnrepresentableZone(self.gmt));
        }
        let r = (raw << 4) | self.language.bits();
        Ok(r.to_be_bytes())
    }

    /// Region implied by the sign of an offset; zero reads as Eastern.
    pub fn from_gmt(gmt: f64, language: Language) -> Self {
        let region = if gmt < 0.0 { Region::Western } else { Region::Eastern };
        Self { gmt, region, language }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_gmt_plus_eight() {
        // 800 hundredths << 4 = 0x3200.
        let tz = TimeZoneLanguage::decode([0x32, 0x00]).expect("valid word");
        assert_eq!(tz.gmt, 8.0);
        assert_eq!(tz.region, Region::Eastern);
        assert_eq!(tz.language, Language::None);
    }

    #[test]
    fn odd_offset_reads_western() {
        // 445 hundredths is odd, so the shared bit flags Western.
        let raw = TimeZoneLanguage { gmt: -4.45, region: Region::Western, language: Language::English }
            .encode()
            .expect("representable");
        let tz = TimeZoneLanguage::decode(raw).expect("valid word");
        assert_eq!(tz.gmt, -4.45);
        assert_eq!(tz.region, Region::Western);
        assert_eq!(tz.language, Language::English);
    }

    #[test]
    fn rejects_reserved_language_bits() {
        assert_eq!(
            TimeZoneLanguage::decode([0x00, 0x03]),
            Err(DecodeError::LanguageBits(0b11))
        );
    }

    #[test]
    fn encode_rejects_parity_conflicts() {
        // +0.25 would need an odd offset value, which reads as Western.
        let tz = TimeZoneLanguage::from_gmt(0.25, Language::None);
        assert!(matches!(tz.encode(), Err(DecodeError::UnrepresentableZone(_))));
    }

    #[test]
    fn encode_rejects_out_of_range_offset() {
        let tz = TimeZoneLanguage::from_gmt(41.0, Language::None);
        assert!(matches!(tz.encode(), Err(DecodeError::UnrepresentableZone(_))));
    }

    #[test]
    fn round_trips_representable_quarter_hours() {
        // Quarter-hour grid from -12.00 to +12.00, every language. Values the
        // wire can express must survive decode(encode(x)) unchanged.
        let mut checked = 0;
        for step in -48i32..=48 {
            let gmt = f64::from(step) * 0.25;
            for language in [Language::None, Language::English, Language::Chinese] {
                let tz = TimeZoneLanguage::from_gmt(gmt, language);
                let Ok(raw) = tz.encode() else { continue };
                let back = TimeZoneLanguage::decode(raw).expect("encoded word decodes");
                assert_eq!(back.gmt, gmt);
                assert_eq!(back.region, tz.region);
                assert_eq!(back.language, language);
                checked += 1;
            }
        }
        // Whole and half hours are always even hundredths, so at least the
        // non-negative half-hour grid must have round-tripped.
        assert!(checked >= 49 * 3 / 2, "only {checked} representable values");
    }
}
