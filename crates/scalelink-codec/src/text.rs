//! Fixed-width product names in the scale's CP866 codepage.
//!
//! A name line is 28 bytes. When the product carries a certification label
//! the text shrinks to 24 bytes and a 4-byte trailer follows:
//!
//! ```text
//! ┌─────────────────────┬──────┬───────────┬──────────────────┬──────────────────┐
//! │ text (24B, 0-pad)   │ 0x00 │ logo type │ cert[3 - line]   │ cert[1 + line]   │
//! └─────────────────────┴──────┴───────────┴──────────────────┴──────────────────┘
//! ```
//!
//! The certification index mapping matches what the scale firmware expects
//! for line 0 and line 1; it has not been confirmed against vendor
//! documentation, so it is kept exactly as observed.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Full name line.
pub const NAME_LEN: usize = 28;
/// Text part of a name line followed by a certification trailer.
pub const LABELLED_NAME_LEN: usize = 24;
/// Certification trailer size.
pub const TRAILER_LEN: usize = NAME_LEN - LABELLED_NAME_LEN;

/// Substitute for characters the codepage cannot represent.
const REPLACEMENT: u8 = b'?';

/// CP866 0xB0..=0xDF: shades and box drawing.
const BOX_DRAWING: [char; 48] = [
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
];

/// CP866 0xF0..=0xFF.
const TAIL: [char; 16] = [
    'Ё', 'ё', 'Є', 'є', 'Ї', 'ї', 'Ў', 'ў', '°', '∙', '·', '√', '№', '¤', '■', '\u{a0}',
];

/// Certification label printed next to the product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    /// Logo selector on the device. Must be non-zero.
    pub logo_type: u8,
    /// Certification mark code (up to four characters).
    #[serde(default)]
    pub code: String,
}

/// Which of the two name lines is being encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLine {
    First = 0,
    Second = 1,
}

/// Map one character to its CP866 byte, if it has one.
pub fn encode_char(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x00..=0x7F => Some(code as u8),
        // А..Я, а..п
        0x0410..=0x043F => Some((code - 0x0410 + 0x80) as u8),
        // р..я
        0x0440..=0x044F => Some((code - 0x0440 + 0xE0) as u8),
        _ => BOX_DRAWING
            .iter()
            .position(|&c| c == ch)
            .map(|i| 0xB0 + i as u8)
            .or_else(|| TAIL.iter().position(|&c| c == ch).map(|i| 0xF0 + i as u8)),
    }
}

/// Map one CP866 byte to its character.
pub fn decode_byte(byte: u8) -> char {
    match byte {
        0x00..=0x7F => byte as char,
        0x80..=0xAF => char::from_u32(0x0410 + u32::from(byte - 0x80)).unwrap_or('\u{fffd}'),
        0xB0..=0xDF => BOX_DRAWING[usize::from(byte - 0xB0)],
        0xE0..=0xEF => char::from_u32(0x0440 + u32::from(byte - 0xE0)).unwrap_or('\u{fffd}'),
        0xF0..=0xFF => TAIL[usize::from(byte - 0xF0)],
    }
}

/// Encode text to CP866, replacing unmappable characters with `?`.
pub fn encode_cp866(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| encode_char(ch).unwrap_or(REPLACEMENT))
        .collect()
}

/// Decode CP866 bytes. Every byte maps to a character.
pub fn decode_cp866(bytes: &[u8]) -> String {
    bytes.iter().copied().map(decode_byte).collect()
}

/// Encode one 28-byte name line.
pub fn encode_name(
    text: &str,
    certification: Option<&Certification>,
    line: NameLine,
) -> Result<[u8; NAME_LEN]> {
    let text_len = if certification.is_some() {
        LABELLED_NAME_LEN
    } else {
        NAME_LEN
    };

    let mut out = [0u8; NAME_LEN];
    let encoded = encode_cp866(text);
    let n = encoded.len().min(text_len);
    out[..n].copy_from_slice(&encoded[..n]);

    if let Some(cert) = certification {
        out[LABELLED_NAME_LEN..].copy_from_slice(&encode_trailer(cert, line)?);
    }
    Ok(out)
}

/// Decode a name line.
///
/// A zero at offset 24 means the text is at most 24 bytes; otherwise the
/// text runs the full 28. Text ends at the first zero byte.
pub fn decode_name(field: &[u8]) -> String {
    let text_len = match field.get(LABELLED_NAME_LEN) {
        Some(0) => LABELLED_NAME_LEN,
        _ => NAME_LEN,
    };
    let raw = &field[..text_len.min(field.len())];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    decode_cp866(&raw[..end])
}

fn encode_trailer(cert: &Certification, line: NameLine) -> Result<[u8; TRAILER_LEN]> {
    if cert.logo_type == 0 {
        return Err(CodecError::MissingLogoType);
    }
    let line = line as usize;
    let code: Vec<char> = cert.code.chars().collect();
    let code_byte = |index: usize| {
        code.get(index)
            .map(|&ch| encode_char(ch).unwrap_or(REPLACEMENT))
            .unwrap_or(0)
    };
    Ok([0, cert.logo_type, code_byte(3 - line), code_byte(1 + line)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyrillic_maps_to_cp866() {
        assert_eq!(encode_cp866("Хлеб"), vec![0x95, 0xAB, 0xA5, 0xA1]);
        assert_eq!(encode_cp866("ЁёЯя"), vec![0xF0, 0xF1, 0x9F, 0xEF]);
        assert_eq!(decode_cp866(&[0x95, 0xAB, 0xA5, 0xA1]), "Хлеб");
    }

    #[test]
    fn every_byte_roundtrips() {
        for byte in 0..=u8::MAX {
            assert_eq!(encode_char(decode_byte(byte)), Some(byte), "byte {byte:#04x}");
        }
    }

    #[test]
    fn unmappable_characters_are_replaced() {
        assert_eq!(encode_cp866("a€b"), b"a?b".to_vec());
    }

    #[test]
    fn plain_name_uses_full_width() {
        let text = "Молоко пастеризованное 3.2% жирн.";
        let field = encode_name(text, None, NameLine::First).unwrap();
        assert_eq!(field.len(), NAME_LEN);
        assert_ne!(field[LABELLED_NAME_LEN], 0);
        let decoded = decode_name(&field);
        assert_eq!(decoded.chars().count(), NAME_LEN);
        assert!(text.starts_with(&decoded));
    }

    #[test]
    fn short_name_is_zero_padded() {
        let field = encode_name("Сыр", None, NameLine::First).unwrap();
        assert_eq!(&field[3..], &[0u8; NAME_LEN - 3]);
        assert_eq!(decode_name(&field), "Сыр");
    }

    #[test]
    fn certification_trailer_layout() {
        let cert = Certification {
            logo_type: 2,
            code: "ABCD".to_string(),
        };
        let first = encode_name("Name", Some(&cert), NameLine::First).unwrap();
        assert_eq!(&first[LABELLED_NAME_LEN..], &[0, 2, b'D', b'B']);
        let second = encode_name("Name", Some(&cert), NameLine::Second).unwrap();
        assert_eq!(&second[LABELLED_NAME_LEN..], &[0, 2, b'C', b'C']);
    }

    #[test]
    fn labelled_name_truncates_to_24() {
        let cert = Certification {
            logo_type: 1,
            code: "AB".to_string(),
        };
        let field = encode_name(&"x".repeat(30), Some(&cert), NameLine::First).unwrap();
        assert_eq!(&field[..LABELLED_NAME_LEN], "x".repeat(24).as_bytes());
        assert_eq!(&field[LABELLED_NAME_LEN..], &[0, 1, 0, b'B']);
        assert_eq!(decode_name(&field), "x".repeat(24));
    }

    #[test]
    fn zero_logo_type_is_rejected() {
        let cert = Certification {
            logo_type: 0,
            code: "AB".to_string(),
        };
        assert_eq!(
            encode_name("x", Some(&cert), NameLine::First),
            Err(CodecError::MissingLogoType)
        );
    }
}
