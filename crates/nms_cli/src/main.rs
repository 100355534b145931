use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};
use log::warn;
use nms_core::{
    DEFAULT_SLICE, MappingSource, MappingTable, SaveDocument, SaveOptions, StorageMode, backup,
};
use nms_render::{ExportStyle, render_json_tree, render_summary_json, render_summary_text};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Where to write the converted save. Defaults to rewriting INPUT.
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,
    #[arg(
        short,
        long,
        value_name = "0|1|2|3|source|uncompressed|compressed|mapped",
        value_parser = parse_mode,
        default_value = "0"
    )]
    mode: StorageMode,
    /// Uncompressed size of each LZ4 block when writing compressed saves.
    #[arg(short, long, value_name = "BYTES", default_value_t = DEFAULT_SLICE)]
    slice: usize,
    /// libMBIN mapping.json, jsonmap.txt or mapping.bin. Later files win.
    #[arg(long = "mapping", value_name = "PATH")]
    mappings: Vec<PathBuf>,
    /// Copy the destination to <DEST>.bak before overwriting it.
    #[arg(long)]
    backup: bool,
    /// Print a summary of the save instead of rewriting it.
    #[arg(long)]
    info: bool,
    #[arg(long, requires = "info")]
    json: bool,
    /// Write the decoded save as readable JSON.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.slice == 0 {
        eprintln!("--slice must be greater than 0");
        process::exit(2);
    }

    let table = load_mapping(&cli.mappings).unwrap_or_else(|msg| {
        eprintln!("{msg}");
        process::exit(1);
    });

    let doc = SaveDocument::load(&cli.input, &table).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", cli.input.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    if cli.info {
        if cli.json {
            let rendered =
                serde_json::to_string_pretty(&render_summary_json(&doc)).unwrap_or_else(|e| {
                    eprintln!("Error rendering JSON output: {e}");
                    process::exit(1);
                });
            println!("{rendered}");
        } else {
            print!("{}", render_summary_text(&doc));
        }
    }

    if let Some(export_path) = &cli.export {
        let tree = render_json_tree(doc.tree(), ExportStyle::Readable);
        let rendered = serde_json::to_string_pretty(&tree).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        fs::write(export_path, rendered).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", export_path.display());
            process::exit(1);
        });
        println!("Exported {} to {}", cli.input.display(), export_path.display());
    }

    let destination = match (&cli.output, cli.info || cli.export.is_some()) {
        (Some(output), _) => output.as_path(),
        (None, false) => cli.input.as_path(),
        (None, true) => return,
    };

    if cli.backup && destination.exists() {
        backup(destination).unwrap_or_else(|e| {
            eprintln!("Error backing up {}: {e}", destination.display());
            process::exit(1);
        });
    }

    let options = SaveOptions {
        mode: cli.mode,
        slice: cli.slice,
    };
    let written = doc.save(destination, options).unwrap_or_else(|e| {
        eprintln!("Error writing {}", destination.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    println!("Wrote {written} save to {}", destination.display());
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_mapping(paths: &[PathBuf]) -> Result<MappingTable, String> {
    if paths.is_empty() {
        warn!("no --mapping given, coded keys will be kept as stored");
    }

    let mut merged = MappingSource::new();
    for path in paths {
        let source = MappingSource::load(path).map_err(|e| mapping_error(path, &e))?;
        merged.merge(source);
    }
    MappingTable::from_source(merged).map_err(|e| format!("Error building mapping table\n  {e}"))
}

fn mapping_error(path: &Path, e: &nms_core::Error) -> String {
    format!("Error loading mapping {}\n  {e}", path.display())
}

fn parse_mode(value: &str) -> Result<StorageMode, String> {
    let by_name = match value.to_ascii_lowercase().as_str() {
        "source" => Some(StorageMode::Source),
        "uncompressed" => Some(StorageMode::Uncompressed),
        "compressed" => Some(StorageMode::Compressed),
        "mapped" => Some(StorageMode::Mapped),
        _ => None,
    };
    by_name
        .or_else(|| value.parse::<u8>().ok().and_then(StorageMode::from_raw))
        .ok_or_else(|| {
            format!(
                "invalid mode '{value}', expected one of: 0, 1, 2, 3, source, uncompressed, compressed, mapped"
            )
        })
}
