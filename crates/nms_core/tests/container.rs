use nms_core::container::{self, BLOCK_HEADER_LEN, DEFAULT_SLICE, Framing, MAGIC};
use nms_core::layout::SegmentId;
use nms_core::{ErrorCode, StorageMode};
use serde_json::json;

/// `(compressed_size, uncompressed_size)` of every block header in `bytes`.
fn block_sizes(bytes: &[u8]) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        assert_eq!(bytes[pos..pos + 4], MAGIC, "magic at {pos}");
        let compressed = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap());
        let uncompressed = u32::from_le_bytes(bytes[pos + 8..pos + 12].try_into().unwrap());
        assert_eq!(bytes[pos + 12..pos + 16], [0, 0, 0, 0]);
        out.push((compressed, uncompressed));
        pos += BLOCK_HEADER_LEN + compressed as usize;
    }
    out
}

fn single_block(block: &[u8]) -> Vec<u8> {
    let c = lz4_flex::block::compress(block);
    let mut bytes = MAGIC.to_vec();
    bytes.extend_from_slice(&(c.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(block.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&c);
    bytes
}

#[test]
fn decodes_single_block_scenario() {
    let bytes = single_block(b"{\"a\":1}\x00");

    let parsed = container::parse(&bytes).expect("block file should parse");
    assert_eq!(parsed.value, json!({"a": 1}));
    assert_eq!(parsed.mode, StorageMode::Compressed);
    assert!(!parsed.coded_keys);
    assert_eq!(parsed.layout.block_count(), 1);
    assert_eq!(parsed.layout.segments[0].id, SegmentId::BlockHeader(0));
    parsed.layout.validate().expect("layout covers file");
}

#[test]
fn exact_multiple_of_slice_is_not_padded() {
    let slice = 64;
    let data = vec![b'x'; 3 * slice];
    let bytes = container::encode(&data, StorageMode::Compressed, slice).expect("encode");

    let sizes = block_sizes(&bytes);
    assert_eq!(sizes.len(), 3);
    assert!(sizes.iter().all(|&(_, u)| u as usize == slice));
}

#[test]
fn short_chunk_gets_one_nul_pad() {
    let slice = 64;
    let data = vec![b'x'; slice - 1];
    let bytes = container::encode(&data, StorageMode::Compressed, slice).expect("encode");
    let sizes = block_sizes(&bytes);
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].1 as usize, slice);

    let mut data = vec![b'x'; slice - 1];
    *data.last_mut().unwrap() = 0;
    let bytes = container::encode(&data, StorageMode::Compressed, slice).expect("encode");
    let sizes = block_sizes(&bytes);
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].1 as usize, slice - 1);
}

#[test]
fn compressed_payload_round_trips_across_blocks() {
    let value = json!({"list": (0..500).collect::<Vec<_>>(), "name": "Explorer"});
    let text = serde_json::to_vec(&value).unwrap();
    let bytes = container::encode(&text, StorageMode::Compressed, 128).expect("encode");
    assert!(block_sizes(&bytes).len() > 1);

    let decoded = container::decode(&bytes).expect("decode");
    assert_eq!(decoded.framing, Framing::Blocks);
    assert_eq!(decoded.json, text);
}

#[test]
fn rejects_zero_slice() {
    let err = container::encode(b"{}", StorageMode::Compressed, 0).expect_err("zero slice");
    assert_eq!(err.code(), ErrorCode::InvalidSlice);
}

#[test]
fn uncompressed_and_mapped_framing() {
    assert_eq!(
        container::encode(b"{}", StorageMode::Uncompressed, DEFAULT_SLICE).unwrap(),
        b"{}\x00".to_vec()
    );
    assert_eq!(
        container::encode(b"{}", StorageMode::Source, DEFAULT_SLICE).unwrap(),
        b"{}\x00".to_vec()
    );
    assert_eq!(
        container::encode(b"{}", StorageMode::Mapped, DEFAULT_SLICE).unwrap(),
        b"{}".to_vec()
    );
}

#[test]
fn raw_canonical_json_is_uncompressed() {
    let parsed = container::parse(b"{\"Version\":1,\"Platform\":\"PC\"}\x00\x00").expect("parse");
    assert_eq!(parsed.mode, StorageMode::Uncompressed);
    assert!(!parsed.coded_keys);
}

#[test]
fn raw_coded_json_is_mapped() {
    let parsed = container::parse(b"{\"F2P\":1,\"8>q\":\"PC\",\"6f=\":{},\"XTp\":\"Main\"}")
        .expect("parse");
    assert_eq!(parsed.mode, StorageMode::Mapped);
    assert!(parsed.coded_keys);
}

#[test]
fn three_short_keys_are_not_enough_to_be_coded() {
    let parsed = container::parse(b"{\"F2P\":1,\"8>q\":\"PC\",\"6f=\":{},\"Long\":1}").expect("parse");
    assert!(!parsed.coded_keys);
}

#[test]
fn coded_blocks_stay_compressed() {
    let bytes = single_block(b"{\"F2P\":1,\"8>q\":\"PC\",\"6f=\":{},\"XTp\":\"Main\"}\x00");
    let parsed = container::parse(&bytes).expect("parse");
    assert_eq!(parsed.mode, StorageMode::Compressed);
    assert!(parsed.coded_keys);
}

#[test]
fn nonzero_reserved_bytes_are_corruption() {
    let mut bytes = single_block(b"{\"a\":1}\x00");
    bytes[13] = 1;

    let err = container::parse(&bytes).expect_err("bad separator");
    assert_eq!(err.code(), ErrorCode::CorruptedContainer);
    assert!(err.to_string().contains("byte 12"), "{err}");
}

#[test]
fn size_mismatch_is_corruption() {
    let mut bytes = single_block(b"{\"a\":1}\x00");
    bytes[8..12].copy_from_slice(&100u32.to_le_bytes());

    let err = container::parse(&bytes).expect_err("size mismatch");
    assert_eq!(err.code(), ErrorCode::CorruptedContainer);
}

#[test]
fn trailing_garbage_after_blocks_is_corruption() {
    let mut bytes = single_block(b"{\"a\":1}\x00");
    bytes.extend_from_slice(b"junk");

    let decoded = container::decode(&bytes).expect("speculative decode");
    assert_eq!(decoded.framing, Framing::Raw);
    assert_eq!(decoded.trailing_at, Some(bytes.len() - 4));

    let err = container::parse(&bytes).expect_err("trailing data");
    assert_eq!(err.code(), ErrorCode::CorruptedContainer);
}

#[test]
fn empty_input_is_a_parse_error() {
    let err = container::parse(b"").expect_err("empty file");
    assert_eq!(err.code(), ErrorCode::Parse);
}

#[test]
fn invalid_json_is_a_parse_error() {
    let err = container::parse(b"{not json").expect_err("bad json");
    assert_eq!(err.code(), ErrorCode::Parse);
}
