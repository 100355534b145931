use std::fmt;
use std::io;
use std::str::Utf8Error;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Io,
    Parse,
    Integrity,
    CorruptedContainer,
    UnknownField,
    InvalidSlice,
    InvalidTimestamp,
    MappingSource,
}

/// A single reason a mapping table could not be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    EmptyName {
        code: String,
    },
    HashMismatch {
        code: String,
        name: String,
        computed: String,
    },
    CodeCollision {
        code: String,
        first: String,
        second: String,
    },
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName { code } => write!(f, "code {code} has an empty name"),
            Self::HashMismatch {
                code,
                name,
                computed,
            } => write!(f, "{name} has inconsistent hash: {code} vs {computed}"),
            Self::CodeCollision {
                code,
                first,
                second,
            } => write!(f, "code {code} claimed by both {first} and {second}"),
            Self::NameCollision {
                name,
                first,
                second,
            } => write!(f, "name {name} mapped to both {first} and {second}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("mapping table failed integrity check ({} issue(s)): {}", .0.len(), join_issues(.0))]
    Integrity(Vec<IntegrityIssue>),
    #[error("corrupted save file at byte {offset}: {reason}")]
    CorruptedContainer { offset: usize, reason: String },
    #[error("unknown key {name}: no code in the mapping table and not seen while decoding")]
    UnknownField { name: String },
    #[error("invalid compression slice size {0}, expected > 0")]
    InvalidSlice(usize),
    #[error("timestamp {value} under {field} does not exist in the local time zone")]
    InvalidTimestamp { field: String, value: String },
    #[error("invalid mapping source {source_name}: {reason}")]
    MappingSource { source_name: String, reason: String },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save payload is not valid UTF-8: {0}")]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Integrity(_) => ErrorCode::Integrity,
            Self::CorruptedContainer { .. } => ErrorCode::CorruptedContainer,
            Self::UnknownField { .. } => ErrorCode::UnknownField,
            Self::InvalidSlice(_) => ErrorCode::InvalidSlice,
            Self::InvalidTimestamp { .. } => ErrorCode::InvalidTimestamp,
            Self::MappingSource { .. } => ErrorCode::MappingSource,
            Self::Json(_) | Self::Utf8(_) => ErrorCode::Parse,
            Self::Io(_) => ErrorCode::Io,
        }
    }

    pub(crate) fn corrupted(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptedContainer {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn mapping_source(source_name: &str, reason: impl Into<String>) -> Self {
        Self::MappingSource {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_issues(issues: &[IntegrityIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
