//! Bidirectional code/name table for obfuscated save keys.

mod source;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::warn;

use crate::error::{Error, IntegrityIssue, Result};
use crate::hash::hash;

pub use source::{MappingSource, MappingSourceInfo};

/// Immutable code/name dictionary. Every pair satisfies `hash(name) == code`.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    by_code: IndexMap<String, String>,
    by_name: IndexMap<String, String>,
    info: MappingSourceInfo,
}

/// Codes seen while decoding one document that the table could not resolve.
/// They are written back untouched on encode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmappedSet {
    codes: BTreeSet<String>,
}

impl UnmappedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time a code is recorded.
    pub fn insert(&mut self, code: &str) -> bool {
        if self.codes.contains(code) {
            return false;
        }
        self.codes.insert(code.to_string())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl MappingTable {
    /// Builds a table from `(code, name)` pairs, rejecting it if any pair does
    /// not hash correctly or two pairs disagree. All problems are reported.
    pub fn build<I, C, N>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut by_code: IndexMap<String, String> = IndexMap::new();
        let mut by_name: IndexMap<String, String> = IndexMap::new();
        let mut issues = Vec::new();

        for (code, name) in entries {
            let code = code.into();
            let name = name.into();

            if name.is_empty() {
                issues.push(IntegrityIssue::EmptyName { code });
                continue;
            }

            let computed = hash(&name);
            if computed != code {
                issues.push(IntegrityIssue::HashMismatch {
                    code,
                    name,
                    computed,
                });
                continue;
            }

            if let Some(existing) = by_code.get(&code) {
                if *existing != name {
                    issues.push(IntegrityIssue::CodeCollision {
                        code,
                        first: existing.clone(),
                        second: name,
                    });
                }
                continue;
            }
            if let Some(existing) = by_name.get(&name) {
                issues.push(IntegrityIssue::NameCollision {
                    name,
                    first: existing.clone(),
                    second: code,
                });
                continue;
            }

            by_code.insert(code.clone(), name.clone());
            by_name.insert(name, code);
        }

        if !issues.is_empty() {
            return Err(Error::Integrity(issues));
        }

        Ok(Self {
            by_code,
            by_name,
            info: MappingSourceInfo::default(),
        })
    }

    /// Builds a table from a parsed mapping source, keeping its version info.
    pub fn from_source(source: MappingSource) -> Result<Self> {
        let MappingSource { info, entries } = source;
        let mut table = Self::build(entries)?;
        table.info = info;
        Ok(table)
    }

    pub fn info(&self) -> &MappingSourceInfo {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.by_code.get(code).map(String::as_str)
    }

    pub fn code_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// `(code, name)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_code.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }

    /// Resolves a code to its canonical name. Unknown codes pass through and
    /// are recorded in `unmapped`, with one warning per distinct code.
    pub fn decode_key<'a>(&'a self, code: &'a str, unmapped: &mut UnmappedSet) -> &'a str {
        if let Some(name) = self.name_of(code) {
            return name;
        }
        if unmapped.insert(code) {
            warn!("Cannot decode key {code}");
        }
        code
    }

    /// Resolves a canonical name to its code. A name the table does not know is
    /// only accepted if it was passed through unmapped while decoding.
    pub fn encode_key<'a>(&'a self, name: &'a str, unmapped: &UnmappedSet) -> Result<&'a str> {
        if let Some(code) = self.code_of(name) {
            return Ok(code);
        }
        if unmapped.contains(name) {
            return Ok(name);
        }
        Err(Error::UnknownField {
            name: name.to_string(),
        })
    }
}
