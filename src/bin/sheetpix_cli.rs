//! CLI tool for sheetpix - parses XLSX files and outputs JSON
//!
//! Usage:
//!   sheetpix_cli <input.xlsx>                       # Output JSON to stdout
//!   sheetpix_cli <input.xlsx> -o out.json           # Output JSON to file
//!   sheetpix_cli <input.xlsx> --images-dir images   # Compact JSON, image files in images/
//!
//! Flags: --include-empty-rows, --include-empty-columns, --no-images,
//! --options '{"includeEmptyRows": true}'. Set `RUST_LOG=debug` for skip
//! diagnostics as they happen.

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use sheetpix::export::{compact_result, write_image_files};
use sheetpix::{ParseOptions, SpreadsheetReader};

const USAGE: &str = "Usage: sheetpix_cli <input.xlsx> [-o output.json] [--images-dir DIR] \
[--include-empty-rows] [--include-empty-columns] [--no-images] [--options JSON]";

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    options: ParseOptions,
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn parse_args() -> Args {
    let mut args = env::args().skip(1);
    let mut input = None;
    let mut output = None;
    let mut images_dir = None;
    let mut options = ParseOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                output = Some(PathBuf::from(args.next().unwrap_or_else(|| fail(USAGE))));
            }
            "--images-dir" => {
                images_dir = Some(PathBuf::from(args.next().unwrap_or_else(|| fail(USAGE))));
            }
            "--options" => {
                let json = args.next().unwrap_or_else(|| fail(USAGE));
                // Flags already seen keep their effect over the JSON defaults
                let parsed = ParseOptions::from_json(&json)
                    .unwrap_or_else(|e| fail(&format!("Invalid --options: {e}")));
                options = ParseOptions {
                    include_images: parsed.include_images && options.include_images,
                    include_empty_rows: parsed.include_empty_rows || options.include_empty_rows,
                    include_empty_columns: parsed.include_empty_columns
                        || options.include_empty_columns,
                    image_quality: parsed.image_quality,
                };
            }
            "--include-empty-rows" => options = options.include_empty_rows(true),
            "--include-empty-columns" => options = options.include_empty_columns(true),
            "--no-images" => options = options.include_images(false),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') => fail(&format!("Unknown flag {other}\n{USAGE}")),
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    fail(USAGE);
                }
            }
        }
    }

    Args {
        input: input.unwrap_or_else(|| fail(USAGE)),
        output,
        images_dir,
        options,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = parse_args();

    let mut reader = SpreadsheetReader::new(args.options);
    let result = reader.parse_file(&args.input);

    for error in &result.errors {
        eprintln!("{error}");
    }

    // Serialize to JSON
    let json = match &args.images_dir {
        Some(dir) => {
            if let Err(e) = write_image_files(&result, dir) {
                fail(&format!("Error writing images to {}: {e}", dir.display()));
            }
            // Image paths are relative to the JSON file's directory
            let base = args
                .output
                .as_ref()
                .and_then(|o| o.parent())
                .filter(|p| !p.as_os_str().is_empty());
            let reference = match base.and_then(|b| dir.strip_prefix(b).ok()) {
                Some(relative) => relative.to_string_lossy().into_owned(),
                None => dir.to_string_lossy().into_owned(),
            };
            serde_json::to_string_pretty(&compact_result(&result, &reference))
        }
        None => serde_json::to_string_pretty(&result),
    }
    .unwrap_or_else(|e| fail(&format!("Error serializing JSON: {e}")));

    // Output
    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &json) {
                fail(&format!("Error writing {}: {e}", path.display()));
            }
            eprintln!("Written: {}", path.display());
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}
