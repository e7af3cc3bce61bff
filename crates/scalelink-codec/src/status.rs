use bytes::Buf;
use serde::{Deserialize, Serialize};

use crate::command::STATUS_LEN;
use crate::error::{CodecError, Result};

/// Decoded bits of the status byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub overload: bool,
    pub tare_mode: bool,
    pub zero_weight: bool,
    pub dual_range: bool,
    pub stable_weight: bool,
    pub minus_sign: bool,
}

impl StatusFlags {
    pub const OVERLOAD: u8 = 1 << 0;
    pub const TARE_MODE: u8 = 1 << 2;
    pub const ZERO_WEIGHT: u8 = 1 << 3;
    pub const DUAL_RANGE: u8 = 1 << 5;
    pub const STABLE_WEIGHT: u8 = 1 << 6;
    pub const MINUS_SIGN: u8 = 1 << 7;

    pub const fn from_byte(byte: u8) -> Self {
        Self {
            overload: byte & Self::OVERLOAD != 0,
            tare_mode: byte & Self::TARE_MODE != 0,
            zero_weight: byte & Self::ZERO_WEIGHT != 0,
            dual_range: byte & Self::DUAL_RANGE != 0,
            stable_weight: byte & Self::STABLE_WEIGHT != 0,
            minus_sign: byte & Self::MINUS_SIGN != 0,
        }
    }
}

/// What the scale is showing right now.
///
/// The weight magnitude is unsigned on the wire; the sign comes from bit 7
/// of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    pub status: u8,
    pub weight: i32,
    pub price: u32,
    pub sum: u32,
    pub plu_number: u32,
    pub flags: StatusFlags,
}

impl LiveStatus {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != STATUS_LEN {
            return Err(CodecError::Length {
                record: "status",
                expected: STATUS_LEN,
                actual: bytes.len(),
            });
        }

        let mut src = bytes;
        let status = src.get_u8();
        let magnitude = i32::from(src.get_u16_le());
        let price = src.get_u32_le();
        let sum = src.get_u32_le();
        let plu_number = src.get_u32_le();
        let flags = StatusFlags::from_byte(status);

        Ok(Self {
            status,
            weight: if flags.minus_sign { -magnitude } else { magnitude },
            price,
            sum,
            plu_number,
            flags,
        })
    }
}
