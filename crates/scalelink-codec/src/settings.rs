use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::command::{FACTORY_SETTINGS_LEN, USER_SETTINGS_LEN};
use crate::error::{CodecError, Result};

/// Which settings block a [`SettingsBlock`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsKind {
    User,
    Factory,
}

impl SettingsKind {
    pub const fn block_len(self) -> usize {
        match self {
            SettingsKind::User => USER_SETTINGS_LEN,
            SettingsKind::Factory => FACTORY_SETTINGS_LEN,
        }
    }

    const fn record(self) -> &'static str {
        match self {
            SettingsKind::User => "user settings",
            SettingsKind::Factory => "factory settings",
        }
    }
}

/// A settings block kept as raw bytes.
///
/// The field layout inside these blocks varies between firmware revisions,
/// so only the length is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsBlock {
    pub kind: SettingsKind,
    #[serde(with = "hex::serde")]
    pub raw: Vec<u8>,
}

impl SettingsBlock {
    pub fn decode(kind: SettingsKind, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != kind.block_len() {
            return Err(CodecError::Length {
                record: kind.record(),
                expected: kind.block_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            kind,
            raw: bytes.to_vec(),
        })
    }

    /// Payload for a write of this block.
    pub fn encode(&self) -> Result<Bytes> {
        Self::decode(self.kind, &self.raw).map(|block| Bytes::from(block.raw))
    }
}
