use std::fmt;

use chrono::{FixedOffset, Local, NaiveDateTime, Offset, TimeDelta, TimeZone};
use indexmap::IndexMap;

pub type TypedMap = IndexMap<String, TypedValue>;

/// A decoded save tree. Timestamps and durations only exist in memory; on the
/// wire they are plain integers.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`, kept so they re-encode unchanged.
    UInt(u64),
    Float(f64),
    String(String),
    Timestamp(Timestamp),
    Duration(Duration),
    Array(Vec<TypedValue>),
    Object(TypedMap),
}

impl TypedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Duration(_) => "duration",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn as_object(&self) -> Option<&TypedMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut TypedMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[TypedValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match *self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a field of an object value.
    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TypedValue> {
        self.as_object_mut().and_then(|map| map.get_mut(key))
    }
}

/// A wall-clock time in the local zone.
///
/// Saves store local calendar seconds: decoding reads the integer as an epoch
/// instant shown in local time, and encoding maps the local time back to an
/// epoch with any sub-second part dropped. External editors read the same
/// integers the same way, so this is not UTC.
///
/// A decoded value remembers the offset it was resolved with, so it encodes
/// back to the same integer even inside a repeated DST hour. A value built
/// with [`Timestamp::from_naive`] is resolved against the local zone when it
/// is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    local: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl Timestamp {
    pub fn from_naive(local: NaiveDateTime) -> Self {
        Self {
            local,
            offset: None,
        }
    }

    pub fn from_epoch_seconds(secs: i64) -> Option<Self> {
        Local.timestamp_opt(secs, 0).single().map(|dt| Self {
            local: dt.naive_local(),
            offset: Some(dt.offset().fix()),
        })
    }

    /// `None` when a naive wall-clock time falls in a local-zone gap. An
    /// ambiguous naive time resolves to the earlier instant.
    pub fn to_epoch_seconds(&self) -> Option<i64> {
        let resolved = match self.offset {
            Some(offset) => offset.from_local_datetime(&self.local).single(),
            None => Local
                .from_local_datetime(&self.local)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        };
        resolved.map(|dt| dt.timestamp())
    }

    pub fn naive_local(&self) -> NaiveDateTime {
        self.local
    }

    /// The UTC offset fixed at decode time, if any.
    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// An elapsed time stored on the wire as whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(TimeDelta);

impl Duration {
    pub fn from_delta(delta: TimeDelta) -> Self {
        Self(delta)
    }

    pub fn from_seconds(secs: i64) -> Option<Self> {
        TimeDelta::try_seconds(secs).map(Self)
    }

    /// Whole seconds, truncated toward zero.
    pub fn to_seconds(&self) -> i64 {
        self.0.num_seconds()
    }

    pub fn delta(&self) -> TimeDelta {
        self.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.to_seconds();
        let sign = if total < 0 { "-" } else { "" };
        let total = total.unsigned_abs();
        write!(
            f,
            "{sign}{}:{:02}:{:02}",
            total / 3600,
            (total / 60) % 60,
            total % 60
        )
    }
}
