use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bcd::{bcd_to_int, to_bcd};
use crate::error::{CodecError, Result};

/// Size of the expiry field.
pub const EXPIRY_LEN: usize = 3;

/// Tag selecting an absolute `DD.MM.YY` date.
pub const TAG_DATE: u8 = 0;
/// Tag selecting a shelf life in days.
pub const TAG_DAYS: u8 = 1;

const MAX_DAYS: u16 = 9999;

/// Best-before of a PLU.
///
/// Wire layout (3 bytes, BCD):
/// ```text
/// absolute:  DD MM YY            (first byte never zero)
/// relative:  00 HH TU            days = HH * 100 + TU
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expiry {
    AbsoluteDate { day: u8, month: u8, year: u8 },
    RelativeDays { days: u16 },
}

impl Expiry {
    /// Build from the tagged form used by upstream command documents.
    ///
    /// Tag 0 takes `DD.MM.YY`, tag 1 a day count; any other tag fails.
    pub fn from_tagged(tag: u8, value: &str) -> Result<Self> {
        match tag {
            TAG_DATE => parse_date(value),
            TAG_DAYS => parse_days(value),
            other => Err(CodecError::UnsupportedExpiryTag(other)),
        }
    }

    /// Tag of this form (0 = date, 1 = days).
    pub fn tag(&self) -> u8 {
        match self {
            Expiry::AbsoluteDate { .. } => TAG_DATE,
            Expiry::RelativeDays { .. } => TAG_DAYS,
        }
    }

    /// Decode the 3-byte field. Total over all inputs.
    pub fn decode(bytes: [u8; EXPIRY_LEN]) -> Self {
        if bytes[0] == 0 {
            let hundreds = u16::from(bcd_to_int(bytes[1]));
            let tens_units = u16::from(bcd_to_int(bytes[2]));
            Expiry::RelativeDays {
                days: hundreds * 100 + tens_units,
            }
        } else {
            Expiry::AbsoluteDate {
                day: bcd_to_int(bytes[0]),
                month: bcd_to_int(bytes[1]),
                year: bcd_to_int(bytes[2]),
            }
        }
    }

    /// Encode into the 3-byte field.
    pub fn encode(&self) -> Result<[u8; EXPIRY_LEN]> {
        match *self {
            Expiry::AbsoluteDate { day, month, year } => {
                validate_date(day, month)?;
                Ok([to_bcd(day)?, to_bcd(month)?, to_bcd(year)?])
            }
            Expiry::RelativeDays { days } => {
                if days > MAX_DAYS {
                    return Err(CodecError::OutOfRange {
                        field: "expiry days",
                        value: days.into(),
                        max: MAX_DAYS.into(),
                    });
                }
                Ok([0x00, to_bcd((days / 100) as u8)?, to_bcd((days % 100) as u8)?])
            }
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::AbsoluteDate { day, month, year } => {
                write!(f, "{day:02}.{month:02}.{year:02}")
            }
            Expiry::RelativeDays { days } => write!(f, "{days}"),
        }
    }
}

fn parse_date(value: &str) -> Result<Expiry> {
    let invalid = |reason| CodecError::InvalidExpiry {
        value: value.to_string(),
        reason,
    };

    let parts: Vec<&str> = value.trim().split('.').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(invalid("expected DD.MM.YY"));
    };
    let field = |s: &str| s.parse::<u8>().map_err(|_| invalid("non-numeric date field"));
    let (day, month, year) = (field(*day)?, field(*month)?, field(*year)?);
    if year > 99 {
        return Err(invalid("year must be two digits"));
    }
    validate_date(day, month).map_err(|_| invalid("day or month out of range"))?;

    Ok(Expiry::AbsoluteDate { day, month, year })
}

fn parse_days(value: &str) -> Result<Expiry> {
    let days = value
        .trim()
        .parse::<u16>()
        .map_err(|_| CodecError::InvalidExpiry {
            value: value.to_string(),
            reason: "expected a day count",
        })?;
    if days > MAX_DAYS {
        return Err(CodecError::OutOfRange {
            field: "expiry days",
            value: days.into(),
            max: MAX_DAYS.into(),
        });
    }
    Ok(Expiry::RelativeDays { days })
}

// Day 0 would encode a leading zero byte and read back as a day count.
fn validate_date(day: u8, month: u8) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(CodecError::OutOfRange {
            field: "expiry day",
            value: day.into(),
            max: 31,
        });
    }
    if !(1..=12).contains(&month) {
        return Err(CodecError::OutOfRange {
            field: "expiry month",
            value: month.into(),
            max: 12,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_roundtrip() {
        let expiry = Expiry::from_tagged(TAG_DATE, "15.03.24").unwrap();
        let bytes = expiry.encode().unwrap();
        assert_eq!(bytes, [0x15, 0x03, 0x24]);
        assert_eq!(Expiry::decode(bytes).to_string(), "15.03.24");
    }

    #[test]
    fn days_roundtrip() {
        let expiry = Expiry::from_tagged(TAG_DAYS, "247").unwrap();
        let bytes = expiry.encode().unwrap();
        assert_eq!(bytes, [0x00, 0x02, 0x47]);
        assert_eq!(Expiry::decode(bytes).to_string(), "247");
    }

    #[test]
    fn short_date_fields_are_zero_padded_on_display() {
        let expiry = Expiry::from_tagged(TAG_DATE, "1.2.5").unwrap();
        assert_eq!(expiry.to_string(), "01.02.05");
    }

    #[test]
    fn unsupported_tag_is_rejected() {
        assert_eq!(
            Expiry::from_tagged(2, "10"),
            Err(CodecError::UnsupportedExpiryTag(2))
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(Expiry::from_tagged(TAG_DATE, "15-03-24").is_err());
        assert!(Expiry::from_tagged(TAG_DATE, "00.03.24").is_err());
        assert!(Expiry::from_tagged(TAG_DATE, "15.13.24").is_err());
        assert!(Expiry::from_tagged(TAG_DATE, "15.03.2024").is_err());
        assert!(Expiry::from_tagged(TAG_DAYS, "ten").is_err());
        assert!(Expiry::from_tagged(TAG_DAYS, "10000").is_err());
    }

    #[test]
    fn zero_days_is_valid() {
        let expiry = Expiry::from_tagged(TAG_DAYS, "0").unwrap();
        assert_eq!(expiry.encode().unwrap(), [0, 0, 0]);
        assert_eq!(Expiry::decode([0, 0, 0]), Expiry::RelativeDays { days: 0 });
    }

    #[test]
    fn tag_matches_form() {
        assert_eq!(Expiry::RelativeDays { days: 3 }.tag(), TAG_DAYS);
        assert_eq!(
            Expiry::AbsoluteDate {
                day: 1,
                month: 1,
                year: 25
            }
            .tag(),
            TAG_DATE
        );
    }

    #[test]
    fn serde_uses_tagged_layout() {
        let json = serde_json::to_string(&Expiry::RelativeDays { days: 5 }).unwrap();
        assert_eq!(json, r#"{"type":"relative_days","days":5}"#);
        let back: Expiry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Expiry::RelativeDays { days: 5 });
    }
}
