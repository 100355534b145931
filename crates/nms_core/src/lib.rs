//! Save codec and key-remapping engine for No Man's Sky save files.
//!
//! Loading runs the container decoder, parses the JSON payload and converts it
//! into a [`TypedValue`] tree; saving reverses each step.

pub mod container;
pub mod document;
pub mod error;
pub mod hash;
pub mod layout;
pub mod mapping;
pub mod mode;
pub mod reader;
pub mod transform;
pub mod value;

pub use container::DEFAULT_SLICE;
pub use document::{SaveDocument, SaveOptions, backup};
pub use error::{Error, ErrorCode, IntegrityIssue, Result};
pub use hash::{hash, is_code};
pub use mapping::{MappingSource, MappingSourceInfo, MappingTable, UnmappedSet};
pub use mode::StorageMode;
pub use value::{Duration, Timestamp, TypedMap, TypedValue};
