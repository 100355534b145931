use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use crate::container::{self, DEFAULT_SLICE};
use crate::error::Result;
use crate::layout::ContainerLayout;
use crate::mapping::{MappingTable, UnmappedSet};
use crate::mode::StorageMode;
use crate::transform;
use crate::value::TypedValue;

const BACKUP_EXTENSION: &str = "bak";

/// Output settings for [`SaveDocument::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub mode: StorageMode,
    pub slice: usize,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            mode: StorageMode::Source,
            slice: DEFAULT_SLICE,
        }
    }
}

/// A loaded save: the typed tree plus everything needed to write it back.
#[derive(Debug, Clone)]
pub struct SaveDocument<'t> {
    table: &'t MappingTable,
    tree: TypedValue,
    source_mode: StorageMode,
    coded_keys: bool,
    unmapped: UnmappedSet,
    layout: ContainerLayout,
    path: Option<PathBuf>,
}

impl<'t> SaveDocument<'t> {
    pub fn load(path: impl AsRef<Path>, table: &'t MappingTable) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let mut doc = Self::from_bytes(&bytes, table)?;
        info!(
            "loaded {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            doc.source_mode
        );
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    pub fn from_bytes(bytes: &[u8], table: &'t MappingTable) -> Result<Self> {
        let parsed = container::parse(bytes)?;
        let mut unmapped = UnmappedSet::new();
        let tree = transform::decode(parsed.value, table, parsed.coded_keys, &mut unmapped);

        Ok(Self {
            table,
            tree,
            source_mode: parsed.mode,
            coded_keys: parsed.coded_keys,
            unmapped,
            layout: parsed.layout,
            path: None,
        })
    }

    pub fn tree(&self) -> &TypedValue {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TypedValue {
        &mut self.tree
    }

    pub fn into_tree(self) -> TypedValue {
        self.tree
    }

    pub fn table(&self) -> &'t MappingTable {
        self.table
    }

    /// The mode the file was stored in when loaded.
    pub fn source_mode(&self) -> StorageMode {
        self.source_mode
    }

    /// Whether the loaded payload used codes rather than canonical names.
    pub fn had_coded_keys(&self) -> bool {
        self.coded_keys
    }

    /// Codes the mapping table could not resolve, kept as-is.
    pub fn unmapped(&self) -> &UnmappedSet {
        &self.unmapped
    }

    pub fn layout(&self) -> &ContainerLayout {
        &self.layout
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Serializes the document as it would be written by [`Self::save`].
    pub fn to_bytes(&self, options: SaveOptions) -> Result<Vec<u8>> {
        let mode = options.mode.resolve(self.source_mode);
        let wire = transform::encode(&self.tree, self.table, mode.stores_codes(), &self.unmapped)?;
        let json = serde_json::to_vec(&wire)?;
        container::encode(&json, mode, options.slice)
    }

    /// Writes the document to `path`. The output is fully built and written to
    /// a temporary file next to `path` before replacing it, so a failure never
    /// leaves a partial save behind. Returns the mode that was written.
    pub fn save(&self, path: impl AsRef<Path>, options: SaveOptions) -> Result<StorageMode> {
        let path = path.as_ref();
        let mode = options.mode.resolve(self.source_mode);
        let bytes = self.to_bytes(options)?;
        write_atomic(path, &bytes)?;
        info!("saved {} ({} bytes, {mode})", path.display(), bytes.len());
        Ok(mode)
    }
}

/// Copies `path` to `path.bak`, replacing an older backup. Returns the backup
/// path.
pub fn backup(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let mut target = path.as_os_str().to_owned();
    target.push(".");
    target.push(BACKUP_EXTENSION);
    let target = PathBuf::from(target);
    fs::copy(path, &target)?;
    info!("backed up {} to {}", path.display(), target.display());
    Ok(target)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
