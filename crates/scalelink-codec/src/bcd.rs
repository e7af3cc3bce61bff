//! Packed BCD: two decimal digits per byte, tens in the high nibble.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{CodecError, Result};

/// Size of a BCD timestamp: second, minute, hour, day, month, year.
pub const TIMESTAMP_LEN: usize = 6;

/// Years are stored as an offset from 2000.
const YEAR_BASE: i32 = 2000;

/// Decode one BCD byte. Total: nibbles above 9 are taken at face value.
pub const fn bcd_to_int(byte: u8) -> u8 {
    (byte >> 4) * 10 + (byte & 0x0F)
}

/// Encode a value 0..=99 as one BCD byte.
pub fn to_bcd(value: u8) -> Result<u8> {
    if value > 99 {
        return Err(CodecError::OutOfRange {
            field: "bcd",
            value: value.into(),
            max: 99,
        });
    }
    Ok(((value / 10) << 4) | (value % 10))
}

/// Decode a 6-byte BCD timestamp.
///
/// Returns `None` for anything that is not a real calendar instant (never
/// reset counters read back as all zeroes, which is not a valid date).
pub fn decode_timestamp(bytes: &[u8]) -> Option<NaiveDateTime> {
    let [second, minute, hour, day, month, year] = <[u8; TIMESTAMP_LEN]>::try_from(bytes).ok()?;
    NaiveDate::from_ymd_opt(
        YEAR_BASE + i32::from(bcd_to_int(year)),
        u32::from(bcd_to_int(month)),
        u32::from(bcd_to_int(day)),
    )?
    .and_hms_opt(
        u32::from(bcd_to_int(hour)),
        u32::from(bcd_to_int(minute)),
        u32::from(bcd_to_int(second)),
    )
}

/// Encode a timestamp in the device's 6-byte BCD layout.
pub fn encode_timestamp(at: &NaiveDateTime) -> Result<[u8; TIMESTAMP_LEN]> {
    let year = at.year() - YEAR_BASE;
    if !(0..=99).contains(&year) {
        return Err(CodecError::OutOfRange {
            field: "timestamp year",
            value: at.year().max(0) as u64,
            max: (YEAR_BASE + 99) as u64,
        });
    }
    Ok([
        to_bcd(at.second() as u8)?,
        to_bcd(at.minute() as u8)?,
        to_bcd(at.hour() as u8)?,
        to_bcd(at.day() as u8)?,
        to_bcd(at.month() as u8)?,
        to_bcd(year as u8)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_identity_for_every_valid_byte() {
        for high in 0..=9u8 {
            for low in 0..=9u8 {
                let byte = (high << 4) | low;
                let value = bcd_to_int(byte);
                assert_eq!(value, (byte >> 4) * 10 + (byte & 0x0F));
                assert_eq!(to_bcd(value).unwrap(), byte);
            }
        }
    }

    #[test]
    fn to_bcd_rejects_three_digits() {
        assert!(matches!(
            to_bcd(100),
            Err(CodecError::OutOfRange { max: 99, .. })
        ));
    }

    #[test]
    fn bcd_to_int_is_total() {
        assert_eq!(bcd_to_int(0xFF), 165);
        assert_eq!(bcd_to_int(0x0A), 10);
    }

    #[test]
    fn decode_valid_timestamp() {
        // 2024-03-15 13:45:30
        let at = decode_timestamp(&[0x30, 0x45, 0x13, 0x15, 0x03, 0x24]).unwrap();
        assert_eq!(
            at,
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(13, 45, 30)
                .unwrap()
        );
    }

    #[test]
    fn decode_out_of_range_timestamp_is_none() {
        assert!(decode_timestamp(&[0; 6]).is_none());
        assert!(decode_timestamp(&[0x00, 0x00, 0x25, 0x01, 0x01, 0x24]).is_none());
        assert!(decode_timestamp(&[0x00, 0x00, 0x00, 0x31, 0x02, 0x24]).is_none());
    }

    #[test]
    fn decode_wrong_length_timestamp_is_none() {
        assert!(decode_timestamp(&[0x30, 0x45, 0x13]).is_none());
    }

    #[test]
    fn timestamp_roundtrip() {
        let at = NaiveDate::from_ymd_opt(2031, 12, 1)
            .unwrap()
            .and_hms_opt(23, 59, 7)
            .unwrap();
        let bytes = encode_timestamp(&at).unwrap();
        assert_eq!(bytes, [0x07, 0x59, 0x23, 0x01, 0x12, 0x31]);
        assert_eq!(decode_timestamp(&bytes), Some(at));
    }

    #[test]
    fn encode_rejects_years_outside_century() {
        let at = NaiveDate::from_ymd_opt(1999, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(encode_timestamp(&at).is_err());
    }
}
