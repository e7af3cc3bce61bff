//! Six-digit numeric codes (product code, group code).
//!
//! One decimal digit per byte, least significant digit first.

use crate::error::{CodecError, Result};

/// Size of a code field on the wire.
pub const CODE_LEN: usize = 6;

/// Encode `code` for the field `field`.
///
/// Short input is left-padded with zeros; long input keeps its first six
/// characters.
pub fn encode_code(field: &'static str, code: &str) -> Result<[u8; CODE_LEN]> {
    let code = code.trim();
    let padding = CODE_LEN.saturating_sub(code.chars().count());
    let digits = std::iter::repeat('0')
        .take(padding)
        .chain(code.chars())
        .take(CODE_LEN);

    let mut out = [0u8; CODE_LEN];
    for (slot, ch) in out.iter_mut().rev().zip(digits) {
        let digit = ch
            .to_digit(10)
            .ok_or(CodecError::InvalidDigit { field, found: ch })?;
        *slot = digit as u8;
    }
    Ok(out)
}

/// Decode a code field into its decimal string.
///
/// Total: a byte above 9 contributes its full decimal value.
pub fn decode_code(bytes: &[u8]) -> String {
    bytes.iter().rev().map(|b| b.to_string()).collect()
}
