/// Errors that can occur while encoding or decoding scale records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A record buffer has the wrong size.
    #[error("{record} must be {expected} bytes, got {actual}")]
    Length {
        record: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A numeric code field contains something other than 0-9.
    #[error("invalid digit {found:?} in {field}")]
    InvalidDigit { field: &'static str, found: char },

    /// Expiry tag other than 0 (date) or 1 (day count).
    #[error("unsupported expiry tag {0} (expected 0 = date, 1 = days)")]
    UnsupportedExpiryTag(u8),

    /// A PLU document carries no expiry in either form.
    #[error("expiry is required (expiry object or expiry_type/expiry_value)")]
    MissingExpiry,

    /// A PLU document carries both expiry forms.
    #[error("give either expiry or expiry_type/expiry_value, not both")]
    AmbiguousExpiry,

    /// The expiry value does not parse for its tag.
    #[error("invalid expiry value {value:?}: {reason}")]
    InvalidExpiry { value: String, reason: &'static str },

    /// A numeric field does not fit its wire encoding.
    #[error("{field} value {value} out of range (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// A certification label was supplied with logo type 0.
    #[error("certification label requires a non-zero logo type")]
    MissingLogoType,
}

pub type Result<T> = std::result::Result<T, CodecError>;
