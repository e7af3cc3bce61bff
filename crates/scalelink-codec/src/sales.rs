use bytes::Buf;
use serde::{Deserialize, Serialize};

use crate::command::TOTAL_SALES_LEN;
use crate::error::{CodecError, Result};

/// Bytes 30..36 carry nothing the host needs.
const RESERVED_LEN: usize = 6;

/// Odometer-style counters kept by the scale since the last reset.
///
/// ```text
/// 0  mileage u32       4  labels u32        8  total sum u32
/// 12 sales u24         15 total weight u32  19 PLU sum u32
/// 23 PLU sales u24     26 PLU weight u32    30 reserved (6)
/// 36 free PLU u16      38 free messages u16
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalSales {
    pub mileage: u32,
    pub label_count: u32,
    pub total_sum: u32,
    pub sales_count: u32,
    pub total_weight: u32,
    pub plu_sum: u32,
    pub plu_sales_count: u32,
    pub plu_weight: u32,
    pub free_plu: u16,
    pub free_messages: u16,
}

impl TotalSales {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TOTAL_SALES_LEN {
            return Err(CodecError::Length {
                record: "total sales",
                expected: TOTAL_SALES_LEN,
                actual: bytes.len(),
            });
        }

        let mut src = bytes;
        let mileage = src.get_u32_le();
        let label_count = src.get_u32_le();
        let total_sum = src.get_u32_le();
        let sales_count = src.get_uint_le(3) as u32;
        let total_weight = src.get_u32_le();
        let plu_sum = src.get_u32_le();
        let plu_sales_count = src.get_uint_le(3) as u32;
        let plu_weight = src.get_u32_le();
        src.advance(RESERVED_LEN);
        let free_plu = src.get_u16_le();
        let free_messages = src.get_u16_le();

        Ok(Self {
            mileage,
            label_count,
            total_sum,
            sales_count,
            total_weight,
            plu_sum,
            plu_sales_count,
            plu_weight,
            free_plu,
            free_messages,
        })
    }
}
