use std::fmt;

use serde::{Deserialize, Serialize};

/// How a save is laid out on disk.
///
/// `Source` is only meaningful as a save target: it resolves to whatever mode
/// the document was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageMode {
    #[default]
    Source,
    Uncompressed,
    Compressed,
    Mapped,
}

impl StorageMode {
    pub const SOURCE_RAW: u8 = 0;
    pub const UNCOMPRESSED_RAW: u8 = 1;
    pub const COMPRESSED_RAW: u8 = 2;
    pub const MAPPED_RAW: u8 = 3;

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            Self::SOURCE_RAW => Some(Self::Source),
            Self::UNCOMPRESSED_RAW => Some(Self::Uncompressed),
            Self::COMPRESSED_RAW => Some(Self::Compressed),
            Self::MAPPED_RAW => Some(Self::Mapped),
            _ => None,
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::Source => Self::SOURCE_RAW,
            Self::Uncompressed => Self::UNCOMPRESSED_RAW,
            Self::Compressed => Self::COMPRESSED_RAW,
            Self::Mapped => Self::MAPPED_RAW,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Source => "Source",
            Self::Uncompressed => "Uncompressed",
            Self::Compressed => "Compressed",
            Self::Mapped => "Mapped",
        }
    }

    /// Replaces `Source` with the mode a document was loaded from.
    pub fn resolve(self, source: StorageMode) -> StorageMode {
        match self {
            Self::Source => source,
            other => other,
        }
    }

    /// Whether object keys are written as 3-character codes in this mode.
    pub fn stores_codes(&self) -> bool {
        matches!(*self, Self::Compressed | Self::Mapped)
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
