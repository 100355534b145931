use nms_core::{MappingSource, MappingTable, SaveDocument, hash};
use nms_render::{ExportStyle, render_json_tree, render_summary_json, render_summary_text};
use serde_json::{Value, json};

const NAMES: &[&str] = &[
    "Version",
    "Platform",
    "ActiveContext",
    "PlayerStateData",
    "CommonStateData",
    "TotalPlayTime",
    "Timestamp",
];

fn table() -> MappingTable {
    let mut source = MappingSource::new();
    source.info.libmbin_version = Some("5.10.0.1".to_string());
    source
        .entries
        .extend(NAMES.iter().map(|name| (hash(name), name.to_string())));
    MappingTable::from_source(source).expect("generated table should be consistent")
}

fn coded_save() -> Vec<u8> {
    let text = format!(
        r#"{{"{}":4720,"{}":"PC","{}":"Main","{}":{{"{}":1704067200,"QQQ":1}},"{}":{{"{}":3725}}}}"#,
        hash("Version"),
        hash("Platform"),
        hash("ActiveContext"),
        hash("PlayerStateData"),
        hash("Timestamp"),
        hash("CommonStateData"),
        hash("TotalPlayTime"),
    );
    text.into_bytes()
}

#[test]
fn readable_export_formats_time_values() {
    let table = table();
    let doc = SaveDocument::from_bytes(&coded_save(), &table).expect("save should parse");
    let value = render_json_tree(doc.tree(), ExportStyle::Readable);

    let keys: Vec<&str> = value
        .as_object()
        .expect("json should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec![
            "Version",
            "Platform",
            "ActiveContext",
            "PlayerStateData",
            "CommonStateData"
        ]
    );
    assert_eq!(value["CommonStateData"]["TotalPlayTime"], json!("1:02:05"));

    let stamp = value["PlayerStateData"]["Timestamp"]
        .as_str()
        .expect("timestamp should render as text");
    assert_eq!(stamp.len(), "2024-01-01 00:00:00".len());
    assert_eq!(value["PlayerStateData"]["QQQ"], json!(1));
}

#[test]
fn epoch_export_keeps_integers() {
    let table = table();
    let doc = SaveDocument::from_bytes(&coded_save(), &table).expect("save should parse");
    let value = render_json_tree(doc.tree(), ExportStyle::Epoch);

    assert_eq!(value["PlayerStateData"]["Timestamp"], json!(1_704_067_200));
    assert_eq!(value["CommonStateData"]["TotalPlayTime"], json!(3725));
}

#[test]
fn summary_json_reports_storage_and_mapping() {
    let table = table();
    let doc = SaveDocument::from_bytes(&coded_save(), &table).expect("save should parse");
    let summary = render_summary_json(&doc);

    assert_eq!(summary["path"], Value::Null);
    assert_eq!(summary["mode"], json!("Mapped"));
    assert_eq!(summary["mode_raw"], json!(3));
    assert_eq!(summary["coded_keys"], json!(true));
    assert_eq!(summary["blocks"], json!(0));
    assert_eq!(summary["top_level_keys"], json!(5));
    assert_eq!(summary["version"], json!(4720));
    assert_eq!(summary["platform"], json!("PC"));
    assert_eq!(summary["total_play_time"], json!("1:02:05"));
    assert_eq!(summary["mapping"]["entries"], json!(NAMES.len()));
    assert_eq!(summary["mapping"]["libmbin_version"], json!("5.10.0.1"));
    assert_eq!(summary["unmapped"], json!(["QQQ"]));
}

#[test]
fn summary_text_lists_labelled_rows() {
    let table = table();
    let doc = SaveDocument::from_bytes(&coded_save(), &table).expect("save should parse");
    let text = render_summary_text(&doc);

    assert!(text.contains("Storage mode:   Mapped\n"), "{text}");
    assert!(text.contains("Keys:           coded\n"), "{text}");
    assert!(text.contains("Mapping:        7 entries (libMBIN 5.10.0.1)\n"), "{text}");
    assert!(text.contains("Version:        4720\n"), "{text}");
    assert!(text.contains("Play time:      1:02:05\n"), "{text}");
    assert!(text.contains("Unmapped keys:  1 (QQQ)\n"), "{text}");
    assert!(!text.contains("File:"));
}
