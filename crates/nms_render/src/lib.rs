use std::fmt::Write as _;

use nms_core::value::{TypedMap, TypedValue};
use nms_core::{SaveDocument, StorageMode};
use serde_json::{Map as JsonMap, Value as JsonValue};

const LABEL_WIDTH: usize = 16;
const UNMAPPED_PREVIEW: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStyle {
    /// Timestamps as `YYYY-MM-DD HH:MM:SS`, durations as `H:MM:SS`.
    #[default]
    Readable,
    /// Timestamps and durations as the integers the game stores.
    Epoch,
}

pub fn render_json_tree(tree: &TypedValue, style: ExportStyle) -> JsonValue {
    match tree {
        TypedValue::Null => JsonValue::Null,
        TypedValue::Bool(b) => JsonValue::Bool(*b),
        TypedValue::Int(i) => JsonValue::from(*i),
        TypedValue::UInt(u) => JsonValue::from(*u),
        TypedValue::Float(f) => JsonValue::from(*f),
        TypedValue::String(s) => JsonValue::String(s.clone()),
        TypedValue::Timestamp(ts) => match style {
            ExportStyle::Readable => JsonValue::String(ts.to_string()),
            ExportStyle::Epoch => ts
                .to_epoch_seconds()
                .map_or_else(|| JsonValue::String(ts.to_string()), JsonValue::from),
        },
        TypedValue::Duration(d) => match style {
            ExportStyle::Readable => JsonValue::String(d.to_string()),
            ExportStyle::Epoch => JsonValue::from(d.to_seconds()),
        },
        TypedValue::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| render_json_tree(item, style))
                .collect(),
        ),
        TypedValue::Object(map) => JsonValue::Object(object_to_json(map, style)),
    }
}

fn object_to_json(map: &TypedMap, style: ExportStyle) -> JsonMap<String, JsonValue> {
    map.iter()
        .map(|(key, value)| (key.clone(), render_json_tree(value, style)))
        .collect()
}

pub fn render_summary_json(doc: &SaveDocument<'_>) -> JsonValue {
    let mut out = JsonMap::new();
    let layout = doc.layout();
    let info = doc.table().info();

    out.insert(
        "path".to_string(),
        doc.path()
            .map_or(JsonValue::Null, |p| JsonValue::String(p.display().to_string())),
    );
    out.insert(
        "mode".to_string(),
        JsonValue::String(doc.source_mode().to_string()),
    );
    out.insert(
        "mode_raw".to_string(),
        JsonValue::from(doc.source_mode().raw()),
    );
    out.insert("coded_keys".to_string(), JsonValue::Bool(doc.had_coded_keys()));
    out.insert("file_size".to_string(), JsonValue::from(layout.file_len));
    out.insert("blocks".to_string(), JsonValue::from(layout.block_count()));

    let tree = doc.tree();
    out.insert(
        "top_level_keys".to_string(),
        JsonValue::from(tree.as_object().map_or(0, |m| m.len())),
    );
    out.insert("version".to_string(), scalar_json(tree.get("Version")));
    out.insert("platform".to_string(), scalar_json(tree.get("Platform")));
    out.insert(
        "active_context".to_string(),
        scalar_json(tree.get("ActiveContext")),
    );
    out.insert(
        "total_play_time".to_string(),
        scalar_json(find_first(tree, "TotalPlayTime")),
    );

    let mut mapping = JsonMap::new();
    mapping.insert("entries".to_string(), JsonValue::from(doc.table().len()));
    mapping.insert(
        "libmbin_version".to_string(),
        info.libmbin_version
            .clone()
            .map_or(JsonValue::Null, JsonValue::String),
    );
    mapping.insert(
        "editor_version".to_string(),
        info.editor_version
            .clone()
            .map_or(JsonValue::Null, JsonValue::String),
    );
    out.insert("mapping".to_string(), JsonValue::Object(mapping));

    out.insert(
        "unmapped".to_string(),
        JsonValue::Array(
            doc.unmapped()
                .iter()
                .map(|code| JsonValue::String(code.to_string()))
                .collect(),
        ),
    );

    JsonValue::Object(out)
}

pub fn render_summary_text(doc: &SaveDocument<'_>) -> String {
    let mut out = String::new();
    let layout = doc.layout();
    let tree = doc.tree();

    if let Some(path) = doc.path() {
        write_row(&mut out, "File", &path.display().to_string());
    }
    let mode = match doc.source_mode() {
        StorageMode::Compressed => format!(
            "{} ({} block{})",
            doc.source_mode(),
            layout.block_count(),
            if layout.block_count() == 1 { "" } else { "s" }
        ),
        other => other.to_string(),
    };
    write_row(&mut out, "Storage mode", &mode);
    write_row(
        &mut out,
        "Keys",
        if doc.had_coded_keys() {
            "coded"
        } else {
            "canonical"
        },
    );
    write_row(
        &mut out,
        "File size",
        &format!("{} bytes", format_number_with_commas(layout.file_len)),
    );
    write_row(&mut out, "Mapping", &mapping_label(doc));

    for (label, value) in [
        ("Version", tree.get("Version")),
        ("Platform", tree.get("Platform")),
        ("Context", tree.get("ActiveContext")),
        ("Play time", find_first(tree, "TotalPlayTime")),
    ] {
        if let Some(value) = value.and_then(scalar_text) {
            write_row(&mut out, label, &value);
        }
    }

    let unmapped = doc.unmapped();
    if unmapped.is_empty() {
        write_row(&mut out, "Unmapped keys", "none");
    } else {
        let mut preview = unmapped
            .iter()
            .take(UNMAPPED_PREVIEW)
            .collect::<Vec<_>>()
            .join(", ");
        if unmapped.len() > UNMAPPED_PREVIEW {
            preview.push_str(", ...");
        }
        write_row(
            &mut out,
            "Unmapped keys",
            &format!("{} ({preview})", unmapped.len()),
        );
    }

    out
}

fn mapping_label(doc: &SaveDocument<'_>) -> String {
    let table = doc.table();
    let info = table.info();
    let mut label = format!("{} entries", format_number_with_commas(table.len()));
    let versions: Vec<String> = [
        info.libmbin_version.as_ref().map(|v| format!("libMBIN {v}")),
        info.editor_version.as_ref().map(|v| format!("editor {v}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !versions.is_empty() {
        let _ = write!(label, " ({})", versions.join(", "));
    }
    label
}

fn write_row(out: &mut String, label: &str, value: &str) {
    writeln!(out, "{:<width$}{value}", format!("{label}:"), width = LABEL_WIDTH)
        .expect("writing to String cannot fail");
}

/// Depth-first search for the first field called `name`.
fn find_first<'a>(value: &'a TypedValue, name: &str) -> Option<&'a TypedValue> {
    match value {
        TypedValue::Object(map) => map
            .get(name)
            .or_else(|| map.values().find_map(|child| find_first(child, name))),
        TypedValue::Array(items) => items.iter().find_map(|item| find_first(item, name)),
        _ => None,
    }
}

fn scalar_json(value: Option<&TypedValue>) -> JsonValue {
    match value {
        Some(v @ (TypedValue::Array(_) | TypedValue::Object(_))) => {
            JsonValue::String(v.kind().to_string())
        }
        Some(v) => render_json_tree(v, ExportStyle::Readable),
        None => JsonValue::Null,
    }
}

fn scalar_text(value: &TypedValue) -> Option<String> {
    match value {
        TypedValue::Null | TypedValue::Array(_) | TypedValue::Object(_) => None,
        TypedValue::Bool(b) => Some(b.to_string()),
        TypedValue::Int(i) => Some(i.to_string()),
        TypedValue::UInt(u) => Some(u.to_string()),
        TypedValue::Float(f) => Some(f.to_string()),
        TypedValue::String(s) => Some(s.clone()),
        TypedValue::Timestamp(ts) => Some(ts.to_string()),
        TypedValue::Duration(d) => Some(d.to_string()),
    }
}

fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
