use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const LIBMBIN_SOURCE: &str = "libMBIN mapping.json";
const JSONMAP_SOURCE: &str = "jsonmap.txt";
const MAPPING_BIN_SOURCE: &str = "mapping.bin";

/// Version strings of the artifacts a table was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSourceInfo {
    pub libmbin_version: Option<String>,
    pub editor_version: Option<String>,
}

/// Raw `(code, name)` pairs read from already downloaded mapping artifacts.
///
/// Pairs are kept as listed, duplicates included, so a file that gives one
/// code two names fails [`MappingTable::build`](super::MappingTable::build).
/// Only [`MappingSource::merge`] lets a later source override a code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSource {
    pub info: MappingSourceInfo,
    pub entries: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct LibMbinMapping {
    #[serde(rename = "libMBIN_version")]
    version: String,
    #[serde(rename = "Mapping")]
    mapping: Vec<LibMbinEntry>,
}

#[derive(Debug, Deserialize)]
struct LibMbinEntry {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: String,
}

impl MappingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `mapping.json` published with libMBIN releases.
    pub fn from_libmbin_json(text: &str) -> Result<Self> {
        let parsed: LibMbinMapping = serde_json::from_str(text)
            .map_err(|e| Error::mapping_source(LIBMBIN_SOURCE, e.to_string()))?;

        Ok(Self {
            info: MappingSourceInfo {
                libmbin_version: Some(parsed.version),
                editor_version: None,
            },
            entries: parsed
                .mapping
                .into_iter()
                .map(|entry| (entry.key, entry.value))
                .collect(),
        })
    }

    /// Parses a `jsonmap.txt` table: one whitespace separated `code name` pair
    /// per non-empty line.
    pub fn from_jsonmap_txt(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [code, name] => entries.push(((*code).to_string(), (*name).to_string())),
                _ => {
                    return Err(Error::mapping_source(
                        JSONMAP_SOURCE,
                        format!(
                            "line {}: expected `code name`, got {} field(s)",
                            index + 1,
                            fields.len()
                        ),
                    ));
                }
            }
        }

        Ok(Self {
            info: MappingSourceInfo::default(),
            entries,
        })
    }

    /// Parses a pre-built `mapping.bin`: a size-prefixed LZ4 block holding
    /// `libmbin_version`, `editor_version` and `code,name|code,name|...`
    /// separated by whitespace.
    pub fn from_mapping_bin(bytes: &[u8]) -> Result<Self> {
        let raw = lz4_flex::block::decompress_size_prepended(bytes)
            .map_err(|e| Error::mapping_source(MAPPING_BIN_SOURCE, e.to_string()))?;
        let text = String::from_utf8(raw)
            .map_err(|e| Error::mapping_source(MAPPING_BIN_SOURCE, e.to_string()))?;

        let fields: Vec<&str> = text.split_whitespace().collect();
        let [libmbin_version, editor_version, data] = fields.as_slice() else {
            return Err(Error::mapping_source(
                MAPPING_BIN_SOURCE,
                format!("expected 3 whitespace separated fields, got {}", fields.len()),
            ));
        };

        let mut entries = Vec::new();
        for (index, pair) in data.split('|').enumerate() {
            let Some((code, name)) = pair.split_once(',') else {
                return Err(Error::mapping_source(
                    MAPPING_BIN_SOURCE,
                    format!("entry {index}: expected `code,name`, got {pair:?}"),
                ));
            };
            entries.push((code.to_string(), name.to_string()));
        }

        Ok(Self {
            info: MappingSourceInfo {
                libmbin_version: Some((*libmbin_version).to_string()),
                editor_version: Some((*editor_version).to_string()),
            },
            entries,
        })
    }

    /// Reads a mapping artifact, picking the parser from the file extension
    /// (`.json`, `.txt` or `.bin`).
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let source = match extension.as_deref() {
            Some("json") => Self::from_libmbin_json(&fs::read_to_string(path)?)?,
            Some("txt") => Self::from_jsonmap_txt(&fs::read_to_string(path)?)?,
            Some("bin") => Self::from_mapping_bin(&fs::read(path)?)?,
            _ => {
                return Err(Error::mapping_source(
                    &path.display().to_string(),
                    "unrecognised extension, expected .json, .txt or .bin",
                ));
            }
        };

        info!(
            "read {} mapping entries from {}",
            source.entries.len(),
            path.display()
        );
        Ok(source)
    }

    /// Folds `other` into `self`; its entries win for codes present in both.
    pub fn merge(&mut self, other: MappingSource) {
        if other.info.libmbin_version.is_some() {
            self.info.libmbin_version = other.info.libmbin_version;
        }
        if other.info.editor_version.is_some() {
            self.info.editor_version = other.info.editor_version;
        }
        let overridden: HashSet<&str> = other.entries.iter().map(|(c, _)| c.as_str()).collect();
        self.entries.retain(|(code, _)| !overridden.contains(code.as_str()));
        self.entries.extend(other.entries);
    }

    /// The last name listed for `code`.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(c, _)| c == code)
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
