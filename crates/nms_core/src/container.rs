//! Binary framing of save files.
//!
//! A compressed save is a sequence of blocks, each `MAGIC`, a 12-byte header
//! and a headerless LZ4 block. Anything else is treated as raw JSON text,
//! optionally NUL terminated.

use std::io::Cursor;

use log::debug;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::hash::CODE_LEN;
use crate::layout::{ContainerLayout, SegmentId};
use crate::mode::StorageMode;
use crate::reader::LittleEndianReader;

pub const MAGIC: [u8; 4] = [0xE5, 0xA1, 0xED, 0xFE];
pub const RESERVED: [u8; 4] = [0; 4];
pub const BLOCK_HEADER_LEN: usize = MAGIC.len() + 4 + 4 + RESERVED.len();
pub const DEFAULT_SLICE: usize = 524_288;

/// More than this many 3-character top-level keys means the keys are codes.
const CODED_KEY_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl BlockHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&RESERVED);
    }
}

/// How the payload was stored, before key disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Raw,
    Blocks,
}

#[derive(Debug, Clone)]
pub struct DecodedPayload {
    /// JSON text with trailing NULs removed.
    pub json: Vec<u8>,
    pub framing: Framing,
    pub layout: ContainerLayout,
    /// Offset of the first byte a block-shaped prefix could not account for.
    pub trailing_at: Option<usize>,
}

/// A parsed save payload plus what was learned about its storage.
#[derive(Debug, Clone)]
pub struct ParsedContainer {
    pub value: JsonValue,
    pub mode: StorageMode,
    pub coded_keys: bool,
    pub layout: ContainerLayout,
}

/// Splits a save file into its JSON payload.
pub fn decode(bytes: &[u8]) -> Result<DecodedPayload> {
    let mut r = LittleEndianReader::new(Cursor::new(bytes));
    let mut scratch = Vec::new();
    let mut layout = ContainerLayout {
        file_len: bytes.len(),
        segments: Vec::new(),
    };

    let mut index = 0usize;
    while r.peek_array::<4>()? == Some(MAGIC) {
        let start = r.position()? as usize;
        match read_block(&mut r, start)? {
            Some((header, decompressed)) => {
                let payload_start = start + BLOCK_HEADER_LEN;
                let payload_end = payload_start + header.compressed_size as usize;
                layout.record(SegmentId::BlockHeader(index), start, payload_start);
                layout.record(SegmentId::BlockPayload(index), payload_start, payload_end);
                debug!(
                    "block {index} at {start}: {} -> {} bytes",
                    header.compressed_size, header.uncompressed_size
                );
                scratch.extend_from_slice(&decompressed);
                index += 1;
            }
            None => {
                r.seek_to(start as u64)?;
                break;
            }
        }
    }

    let consumed = r.position()? as usize;
    if index > 0 && consumed == bytes.len() {
        layout.validate()?;
        return Ok(DecodedPayload {
            json: strip_trailing_nuls(scratch),
            framing: Framing::Blocks,
            layout,
            trailing_at: None,
        });
    }

    Ok(DecodedPayload {
        json: strip_trailing_nuls(bytes.to_vec()),
        framing: Framing::Raw,
        layout: ContainerLayout::raw(bytes.len()),
        trailing_at: bytes.starts_with(&MAGIC).then_some(consumed),
    })
}

/// Decodes the container, parses the JSON and works out the storage mode.
pub fn parse(bytes: &[u8]) -> Result<ParsedContainer> {
    let payload = decode(bytes)?;
    let value = match parse_json(&payload.json) {
        Ok(value) => value,
        Err(e) => {
            return Err(match payload.trailing_at {
                Some(offset) => {
                    Error::corrupted(offset, format!("unknown trailing data after blocks ({e})"))
                }
                None => e,
            });
        }
    };

    let coded_keys = has_coded_keys(&value);
    let mode = match (payload.framing, coded_keys) {
        (Framing::Blocks, _) => StorageMode::Compressed,
        (Framing::Raw, true) => StorageMode::Mapped,
        (Framing::Raw, false) => StorageMode::Uncompressed,
    };

    Ok(ParsedContainer {
        value,
        mode,
        coded_keys,
        layout: payload.layout,
    })
}

/// Frames a serialized JSON payload for the given storage mode.
pub fn encode(json: &[u8], mode: StorageMode, slice: usize) -> Result<Vec<u8>> {
    match mode {
        StorageMode::Source | StorageMode::Uncompressed => {
            let mut out = Vec::with_capacity(json.len() + 1);
            out.extend_from_slice(json);
            out.push(0);
            Ok(out)
        }
        StorageMode::Mapped => Ok(json.to_vec()),
        StorageMode::Compressed => compress_blocks(json, slice),
    }
}

/// True when the top-level object has more than three 3-character keys.
pub fn has_coded_keys(value: &JsonValue) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    map.keys()
        .filter(|k| k.chars().count() == CODE_LEN)
        .count()
        > CODED_KEY_THRESHOLD
}

fn compress_blocks(json: &[u8], slice: usize) -> Result<Vec<u8>> {
    if slice == 0 || u32::try_from(slice).is_err() {
        return Err(Error::InvalidSlice(slice));
    }

    let mut out = Vec::new();
    for (index, chunk) in json.chunks(slice).enumerate() {
        let mut block = chunk.to_vec();
        if block.len() < slice && block.last() != Some(&0) {
            block.push(0);
        }

        let compressed = lz4_flex::block::compress(&block);
        let header = BlockHeader {
            compressed_size: u32::try_from(compressed.len())
                .map_err(|_| Error::InvalidSlice(slice))?,
            uncompressed_size: block.len() as u32,
        };
        debug!(
            "block {index}: {} -> {} bytes",
            header.uncompressed_size, header.compressed_size
        );
        header.write_to(&mut out);
        out.extend_from_slice(&compressed);
    }
    Ok(out)
}

/// Reads one block whose magic starts at `start`. `None` means the input ended
/// before the block did, so the file is not a block sequence.
fn read_block(
    r: &mut LittleEndianReader<Cursor<&[u8]>>,
    start: usize,
) -> Result<Option<(BlockHeader, Vec<u8>)>> {
    if r.remaining()? < BLOCK_HEADER_LEN as u64 {
        return Ok(None);
    }

    r.read_array::<4>()?;
    let header = BlockHeader {
        compressed_size: r.read_u32()?,
        uncompressed_size: r.read_u32()?,
    };
    let reserved = r.read_array::<4>()?;
    if reserved != RESERVED {
        return Err(Error::corrupted(
            start + BLOCK_HEADER_LEN - RESERVED.len(),
            format!("invalid separator {reserved:02X?}"),
        ));
    }

    if r.remaining()? < u64::from(header.compressed_size) {
        return Ok(None);
    }
    let payload = r.read_bytes(header.compressed_size as usize)?;
    let expected = header.uncompressed_size as usize;
    let decompressed = lz4_flex::block::decompress(&payload, expected).map_err(|e| {
        Error::corrupted(
            start + BLOCK_HEADER_LEN,
            format!("LZ4 block failed to decompress: {e}"),
        )
    })?;
    if decompressed.len() != expected {
        return Err(Error::corrupted(
            start + BLOCK_HEADER_LEN,
            format!(
                "block decompressed to {} bytes, header says {expected}",
                decompressed.len()
            ),
        ));
    }

    Ok(Some((header, decompressed)))
}

fn parse_json(json: &[u8]) -> Result<JsonValue> {
    let text = std::str::from_utf8(json)?;
    Ok(serde_json::from_str(text)?)
}

fn strip_trailing_nuls(mut bytes: Vec<u8>) -> Vec<u8> {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    bytes.truncate(end);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_only_trailing_nuls() {
        assert_eq!(strip_trailing_nuls(b"a\0b\0\0".to_vec()), b"a\0b".to_vec());
        assert_eq!(strip_trailing_nuls(vec![0, 0]), Vec::<u8>::new());
    }

    #[test]
    fn short_final_chunk_is_padded_once() {
        let out = compress_blocks(b"abcde", 4).expect("compress");
        let payload = decode(&out).expect("decode");
        assert_eq!(payload.framing, Framing::Blocks);
        assert_eq!(payload.layout.block_count(), 2);
        assert_eq!(payload.json, b"abcde".to_vec());
    }

    #[test]
    fn truncated_block_falls_back_to_raw() {
        let mut out = compress_blocks(b"{\"a\":1}", DEFAULT_SLICE).expect("compress");
        out.truncate(out.len() - 1);
        let payload = decode(&out).expect("decode");
        assert_eq!(payload.framing, Framing::Raw);
        assert_eq!(payload.trailing_at, Some(0));
    }
}
