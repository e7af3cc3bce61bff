use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::bcd::{decode_timestamp, TIMESTAMP_LEN};
use crate::command::{PLU_READ_LEN, PLU_WRITE_LEN};
use crate::digits::{decode_code, encode_code, CODE_LEN};
use crate::error::{CodecError, Result};
use crate::expiry::{Expiry, EXPIRY_LEN, TAG_DATE};
use crate::text::{decode_name, encode_name, Certification, NameLine, NAME_LEN};

/// A product as uploaded to the scale (83-byte write form).
///
/// Wire layout:
/// ```text
/// id u32 | code 6 | name1 28 | name2 28 | price u32 | expiry 3 | tare u16 | group 6 | message u16
/// ```
///
/// Documents give the expiry either as a typed object
/// (`"expiry": {"type": "relative_days", "days": 3}`) or in the tagged
/// form `"expiry_type": 1, "expiry_value": "3"` (see [`Expiry::from_tagged`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EntryDocument")]
pub struct PluEntry {
    pub id: u32,
    pub code: String,
    pub name1: String,
    pub name2: String,
    /// Price per unit in minor currency units.
    pub price: u32,
    pub expiry: Expiry,
    pub tare: u16,
    pub group_code: String,
    pub message_number: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<Certification>,
}

fn zero_code() -> String {
    "000000".to_string()
}

#[derive(Deserialize)]
struct EntryDocument {
    id: u32,
    #[serde(default = "zero_code")]
    code: String,
    name1: String,
    #[serde(default)]
    name2: String,
    price: u32,
    #[serde(default)]
    expiry: Option<Expiry>,
    #[serde(default)]
    expiry_type: Option<u8>,
    #[serde(default)]
    expiry_value: Option<ExpiryValue>,
    #[serde(default)]
    tare: u16,
    #[serde(default = "zero_code")]
    group_code: String,
    #[serde(default)]
    message_number: u16,
    #[serde(default)]
    certification: Option<Certification>,
}

/// `expiry_value` is a `DD.MM.YY` string or a day count, quoted or not.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiryValue {
    Days(u16),
    Text(String),
}

impl TryFrom<EntryDocument> for PluEntry {
    type Error = CodecError;

    fn try_from(doc: EntryDocument) -> Result<Self> {
        let expiry = match (doc.expiry, doc.expiry_type, doc.expiry_value) {
            (Some(expiry), None, None) => expiry,
            (Some(_), _, _) => return Err(CodecError::AmbiguousExpiry),
            (None, tag, Some(value)) => {
                let tag = tag.unwrap_or(TAG_DATE);
                match value {
                    ExpiryValue::Text(text) => Expiry::from_tagged(tag, &text)?,
                    ExpiryValue::Days(days) => Expiry::from_tagged(tag, &days.to_string())?,
                }
            }
            (None, _, None) => return Err(CodecError::MissingExpiry),
        };

        Ok(Self {
            id: doc.id,
            code: doc.code,
            name1: doc.name1,
            name2: doc.name2,
            price: doc.price,
            expiry,
            tare: doc.tare,
            group_code: doc.group_code,
            message_number: doc.message_number,
            certification: doc.certification,
        })
    }
}

impl PluEntry {
    /// Encode the write form.
    ///
    /// The result is always exactly [`PLU_WRITE_LEN`] bytes; a mismatch is
    /// reported as an error and must never be sent.
    pub fn encode(&self) -> Result<Bytes> {
        let cert = self.certification.as_ref();
        let mut dst = BytesMut::with_capacity(PLU_WRITE_LEN);
        dst.put_u32_le(self.id);
        dst.put_slice(&encode_code("code", &self.code)?);
        dst.put_slice(&encode_name(&self.name1, cert, NameLine::First)?);
        dst.put_slice(&encode_name(&self.name2, cert, NameLine::Second)?);
        dst.put_u32_le(self.price);
        dst.put_slice(&self.expiry.encode()?);
        dst.put_u16_le(self.tare);
        dst.put_slice(&encode_code("group_code", &self.group_code)?);
        dst.put_u16_le(self.message_number);

        if dst.len() != PLU_WRITE_LEN {
            return Err(CodecError::Length {
                record: "PLU write form",
                expected: PLU_WRITE_LEN,
                actual: dst.len(),
            });
        }
        Ok(dst.freeze())
    }
}

/// A product as read back from the scale (100-byte read form).
///
/// The read form is the write form followed by the sales statistics:
/// ```text
/// ... | last reset BCD 6 | total sum u32 | total weight u32 | sales count u24
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluRecord {
    pub id: u32,
    pub code: String,
    pub name1: String,
    pub name2: String,
    pub price: u32,
    pub expiry: Expiry,
    pub tare: u16,
    pub group_code: String,
    pub message_number: u16,
    /// When the counters were last reset; `None` if never or unparseable.
    pub last_reset: Option<NaiveDateTime>,
    pub total_sum: u32,
    pub total_weight: u32,
    pub sales_count: u32,
}

impl PluRecord {
    /// Decode the read form.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PLU_READ_LEN {
            return Err(CodecError::Length {
                record: "PLU record",
                expected: PLU_READ_LEN,
                actual: bytes.len(),
            });
        }

        let mut src = bytes;
        let id = src.get_u32_le();
        let code = decode_code(&src[..CODE_LEN]);
        src.advance(CODE_LEN);
        let name1 = decode_name(&src[..NAME_LEN]);
        src.advance(NAME_LEN);
        let name2 = decode_name(&src[..NAME_LEN]);
        src.advance(NAME_LEN);
        let price = src.get_u32_le();
        let expiry = Expiry::decode([src[0], src[1], src[2]]);
        src.advance(EXPIRY_LEN);
        let tare = src.get_u16_le();
        let group_code = decode_code(&src[..CODE_LEN]);
        src.advance(CODE_LEN);
        let message_number = src.get_u16_le();
        let last_reset = decode_timestamp(&src[..TIMESTAMP_LEN]);
        src.advance(TIMESTAMP_LEN);
        let total_sum = src.get_u32_le();
        let total_weight = src.get_u32_le();
        let sales_count = src.get_uint_le(3) as u32;

        Ok(Self {
            id,
            code,
            name1,
            name2,
            price,
            expiry,
            tare,
            group_code,
            message_number,
            last_reset,
            total_sum,
            total_weight,
            sales_count,
        })
    }

    /// True for an unused slot: no id, no code, no name.
    pub fn is_empty_slot(&self) -> bool {
        self.id == 0
            && self.code.bytes().all(|b| b == b'0')
            && self.name1.is_empty()
            && self.name2.is_empty()
    }

    /// The uploadable part of this record.
    ///
    /// Certification labels are not recoverable from the read form.
    pub fn to_entry(&self) -> PluEntry {
        PluEntry {
            id: self.id,
            code: self.code.clone(),
            name1: self.name1.clone(),
            name2: self.name2.clone(),
            price: self.price,
            expiry: self.expiry,
            tare: self.tare,
            group_code: self.group_code.clone(),
            message_number: self.message_number,
            certification: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::bcd::encode_timestamp;

    fn sample_entry() -> PluEntry {
        PluEntry {
            id: 42,
            code: "204017".to_string(),
            name1: "Колбаса докторская".to_string(),
            name2: "ГОСТ 23670".to_string(),
            price: 74_990,
            expiry: Expiry::from_tagged(1, "14").unwrap(),
            tare: 15,
            group_code: "000301".to_string(),
            message_number: 7,
            certification: None,
        }
    }

    fn read_form(entry: &PluEntry, tail: &[u8]) -> Vec<u8> {
        let mut raw = entry.encode().unwrap().to_vec();
        raw.extend_from_slice(tail);
        raw
    }

    fn stats_tail(at: &NaiveDateTime, sum: u32, weight: u32, count: u32) -> Vec<u8> {
        let mut tail = encode_timestamp(at).unwrap().to_vec();
        tail.extend_from_slice(&sum.to_le_bytes());
        tail.extend_from_slice(&weight.to_le_bytes());
        tail.extend_from_slice(&count.to_le_bytes()[..3]);
        tail
    }

    #[test]
    fn write_form_is_83_bytes() {
        let bytes = sample_entry().encode().unwrap();
        assert_eq!(bytes.len(), PLU_WRITE_LEN);
        assert_eq!(&bytes[..4], &[42, 0, 0, 0]);
        assert_eq!(&bytes[4..10], &[7, 1, 0, 4, 0, 2]);
        assert_eq!(&bytes[70..73], &[0x00, 0x00, 0x14]);
    }

    #[test]
    fn read_form_roundtrips_every_field() {
        let entry = sample_entry();
        let at = NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let raw = read_form(&entry, &stats_tail(&at, 1_234_567, 98_765, 0x01_02_03));
        assert_eq!(raw.len(), PLU_READ_LEN);

        let record = PluRecord::decode(&raw).unwrap();
        assert_eq!(record.id, entry.id);
        assert_eq!(record.code, entry.code);
        assert_eq!(record.name1, entry.name1);
        assert_eq!(record.name2, entry.name2);
        assert_eq!(record.price, entry.price);
        assert_eq!(record.expiry, entry.expiry);
        assert_eq!(record.tare, entry.tare);
        assert_eq!(record.group_code, entry.group_code);
        assert_eq!(record.message_number, entry.message_number);
        assert_eq!(record.last_reset, Some(at));
        assert_eq!(record.total_sum, 1_234_567);
        assert_eq!(record.total_weight, 98_765);
        assert_eq!(record.sales_count, 0x01_02_03);
        assert_eq!(record.to_entry(), entry);
    }

    #[test]
    fn absolute_expiry_and_labelled_names_roundtrip() {
        let entry = PluEntry {
            expiry: Expiry::from_tagged(0, "31.12.25").unwrap(),
            certification: Some(Certification {
                logo_type: 3,
                code: "PCT1".to_string(),
            }),
            ..sample_entry()
        };
        let raw = read_form(&entry, &[0u8; PLU_READ_LEN - PLU_WRITE_LEN]);
        let record = PluRecord::decode(&raw).unwrap();

        assert_eq!(record.expiry.to_string(), "31.12.25");
        assert_eq!(record.name1, "Колбаса докторская");
        assert_eq!(record.last_reset, None);
        assert_eq!(record.sales_count, 0);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = PluRecord::decode(&[0u8; 99]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Length {
                record: "PLU record",
                expected: 100,
                actual: 99
            }
        );
    }

    #[test]
    fn zeroed_record_is_empty_slot() {
        let record = PluRecord::decode(&[0u8; PLU_READ_LEN]).unwrap();
        assert!(record.is_empty_slot());
        assert_eq!(record.code, "000000");
        assert_eq!(record.expiry, Expiry::RelativeDays { days: 0 });
        assert!(!PluRecord::decode(&read_form(&sample_entry(), &[0; 17]))
            .unwrap()
            .is_empty_slot());
    }

    #[test]
    fn invalid_fields_fail_encoding() {
        let bad_code = PluEntry {
            code: "12-456".to_string(),
            ..sample_entry()
        };
        assert!(matches!(
            bad_code.encode(),
            Err(CodecError::InvalidDigit { field: "code", .. })
        ));

        let bad_cert = PluEntry {
            certification: Some(Certification {
                logo_type: 0,
                code: String::new(),
            }),
            ..sample_entry()
        };
        assert_eq!(bad_cert.encode(), Err(CodecError::MissingLogoType));
    }

    #[test]
    fn upload_document_defaults() {
        let entry: PluEntry = serde_json::from_str(
            r#"{"id": 5, "name1": "Tea", "price": 1000,
                "expiry": {"type": "absolute_date", "day": 1, "month": 1, "year": 25}}"#,
        )
        .unwrap();
        assert_eq!(entry.code, "000000");
        assert_eq!(entry.group_code, "000000");
        assert_eq!(entry.name2, "");
        assert!(entry.certification.is_none());
        assert_eq!(entry.encode().unwrap().len(), PLU_WRITE_LEN);
    }

    #[test]
    fn upload_document_tagged_expiry() {
        let days: PluEntry = serde_json::from_str(
            r#"{"id": 6, "name1": "Kefir", "price": 990, "expiry_type": 1, "expiry_value": "247"}"#,
        )
        .unwrap();
        assert_eq!(days.expiry, Expiry::RelativeDays { days: 247 });

        let bare_days: PluEntry = serde_json::from_str(
            r#"{"id": 6, "name1": "Kefir", "price": 990, "expiry_type": 1, "expiry_value": 12}"#,
        )
        .unwrap();
        assert_eq!(bare_days.expiry, Expiry::RelativeDays { days: 12 });

        // The tag defaults to an absolute date.
        let date: PluEntry = serde_json::from_str(
            r#"{"id": 7, "name1": "Bread", "price": 250, "expiry_value": "15.03.24"}"#,
        )
        .unwrap();
        assert_eq!(
            date.expiry,
            Expiry::AbsoluteDate {
                day: 15,
                month: 3,
                year: 24
            }
        );
    }

    #[test]
    fn upload_document_rejects_bad_expiry() {
        let unknown_tag = serde_json::from_str::<PluEntry>(
            r#"{"id": 1, "name1": "X", "price": 1, "expiry_type": 2, "expiry_value": "5"}"#,
        )
        .unwrap_err();
        assert!(unknown_tag.to_string().contains("unsupported expiry tag 2"));

        let missing =
            serde_json::from_str::<PluEntry>(r#"{"id": 1, "name1": "X", "price": 1}"#).unwrap_err();
        assert!(missing.to_string().contains("expiry is required"));

        let both = serde_json::from_str::<PluEntry>(
            r#"{"id": 1, "name1": "X", "price": 1, "expiry_value": "5",
                "expiry": {"type": "relative_days", "days": 5}}"#,
        )
        .unwrap_err();
        assert!(both.to_string().contains("not both"));
    }

    #[test]
    fn serialized_entry_reads_back() {
        let entry = sample_entry();
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(serde_json::from_str::<PluEntry>(&json).unwrap(), entry);
    }
}
