//! Conversion between wire JSON and the typed save tree.
//!
//! Key translation goes through a [`MappingTable`]. Integer values are retyped
//! by the canonical name of the field holding them.

use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::error::{Error, Result};
use crate::mapping::{MappingTable, UnmappedSet};
use crate::value::{Duration, Timestamp, TypedMap, TypedValue};

/// Fields whose integer value is an epoch timestamp.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "Timestamp",
    "LastUpdateTimestamp",
    "LastBaseUpdateTimestamp",
    "LastEditedTimestamp",
    "CreationTimestamp",
    "SaveTimestamp",
    "StartTime",
    "EndTime",
];

/// Fields holding (possibly nested) arrays of epoch timestamps.
pub const TIMESTAMP_LIST_FIELDS: &[&str] = &["TimeStamps", "SeasonTimestamps", "VisitTimestamps"];

/// Fields whose integer value is an elapsed time in seconds.
pub const DURATION_FIELDS: &[&str] = &["TotalPlayTime", "TimeAlive", "SessionPlayTime"];

/// Seed-like fields that only hold a timestamp when the value is plausible as
/// one, see [`SPECIAL_LOWER_BOUND`] and [`SPECIAL_UPPER_BOUND`].
pub const SPECIAL_FIELDS: &[&str] = &["Seed", "GenerationSeed", "UniverseSeed"];

/// 2016-01-01T00:00:00Z
pub const SPECIAL_LOWER_BOUND: i64 = 1_451_606_400;
/// 2030-01-01T00:00:00Z
pub const SPECIAL_UPPER_BOUND: i64 = 1_893_456_000;

#[derive(Debug, Clone, Copy)]
enum Context<'a> {
    Bare,
    Field(&'a str),
    TimestampList,
}

struct Decoder<'t, 'u> {
    table: &'t MappingTable,
    coded_keys: bool,
    unmapped: &'u mut UnmappedSet,
}

struct Encoder<'t, 'u> {
    table: &'t MappingTable,
    code_keys: bool,
    unmapped: &'u UnmappedSet,
}

/// Turns a parsed payload into a typed tree. When `coded_keys` is set, object
/// keys are resolved through `table`; unknown codes land in `unmapped`.
pub fn decode(
    value: JsonValue,
    table: &MappingTable,
    coded_keys: bool,
    unmapped: &mut UnmappedSet,
) -> TypedValue {
    let mut decoder = Decoder {
        table,
        coded_keys,
        unmapped,
    };
    decoder.value(value, Context::Bare)
}

/// Turns a typed tree back into wire JSON. When `code_keys` is set, object keys
/// are replaced by their codes.
pub fn encode(
    value: &TypedValue,
    table: &MappingTable,
    code_keys: bool,
    unmapped: &UnmappedSet,
) -> Result<JsonValue> {
    let encoder = Encoder {
        table,
        code_keys,
        unmapped,
    };
    encoder.value(value, "")
}

impl Decoder<'_, '_> {
    fn value(&mut self, value: JsonValue, ctx: Context<'_>) -> TypedValue {
        match value {
            JsonValue::Null => TypedValue::Null,
            JsonValue::Bool(b) => TypedValue::Bool(b),
            JsonValue::Number(n) => number(&n, ctx),
            JsonValue::String(s) => TypedValue::String(s),
            JsonValue::Array(items) => {
                let item_ctx = match ctx {
                    Context::TimestampList => Context::TimestampList,
                    Context::Field(name) if TIMESTAMP_LIST_FIELDS.contains(&name) => {
                        Context::TimestampList
                    }
                    _ => Context::Bare,
                };
                TypedValue::Array(
                    items
                        .into_iter()
                        .map(|item| self.value(item, item_ctx))
                        .collect(),
                )
            }
            JsonValue::Object(map) => {
                let mut out = TypedMap::with_capacity(map.len());
                for (key, child) in map {
                    let name = if self.coded_keys {
                        self.table.decode_key(&key, self.unmapped).to_string()
                    } else {
                        key
                    };
                    let decoded = self.value(child, Context::Field(&name));
                    out.insert(name, decoded);
                }
                TypedValue::Object(out)
            }
        }
    }
}

fn number(n: &Number, ctx: Context<'_>) -> TypedValue {
    if let Some(i) = n.as_i64() {
        return integer(i, ctx);
    }
    if let Some(u) = n.as_u64() {
        return TypedValue::UInt(u);
    }
    TypedValue::Float(n.as_f64().unwrap_or(f64::NAN))
}

fn integer(i: i64, ctx: Context<'_>) -> TypedValue {
    let retyped = match ctx {
        Context::TimestampList => Timestamp::from_epoch_seconds(i).map(TypedValue::Timestamp),
        Context::Field(name) if TIMESTAMP_FIELDS.contains(&name) => {
            Timestamp::from_epoch_seconds(i).map(TypedValue::Timestamp)
        }
        Context::Field(name) if DURATION_FIELDS.contains(&name) => {
            Duration::from_seconds(i).map(TypedValue::Duration)
        }
        Context::Field(name)
            if SPECIAL_FIELDS.contains(&name)
                && SPECIAL_LOWER_BOUND < i
                && i < SPECIAL_UPPER_BOUND =>
        {
            Timestamp::from_epoch_seconds(i).map(TypedValue::Timestamp)
        }
        _ => None,
    };
    retyped.unwrap_or(TypedValue::Int(i))
}

impl Encoder<'_, '_> {
    fn value(&self, value: &TypedValue, field: &str) -> Result<JsonValue> {
        Ok(match value {
            TypedValue::Null => JsonValue::Null,
            TypedValue::Bool(b) => JsonValue::Bool(*b),
            TypedValue::Int(i) => JsonValue::from(*i),
            TypedValue::UInt(u) => JsonValue::from(*u),
            TypedValue::Float(f) => JsonValue::from(*f),
            TypedValue::String(s) => JsonValue::String(s.clone()),
            TypedValue::Timestamp(ts) => {
                let secs = ts.to_epoch_seconds().ok_or_else(|| Error::InvalidTimestamp {
                    field: field.to_string(),
                    value: ts.to_string(),
                })?;
                JsonValue::from(secs)
            }
            TypedValue::Duration(d) => JsonValue::from(d.to_seconds()),
            TypedValue::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.value(item, field))
                    .collect::<Result<Vec<_>>>()?,
            ),
            TypedValue::Object(map) => {
                let mut out = JsonMap::with_capacity(map.len());
                for (name, child) in map {
                    let key = if self.code_keys {
                        self.table.encode_key(name, self.unmapped)?
                    } else {
                        name.as_str()
                    };
                    out.insert(key.to_string(), self.value(child, name)?);
                }
                JsonValue::Object(out)
            }
        })
    }
}
