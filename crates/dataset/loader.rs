use std::fs;
use std::io::Cursor;
use std::path::Path;

use encoding_rs::{Encoding, EUC_KR};
use log::{debug, info};
use polars::prelude::*;

use crate::error::{LoadError, Result};
use crate::table::MarriageTable;

/// Resolve an encoding label.
///
/// Accepts every WHATWG label plus the Windows names of the Korean code page
/// (`cp949`, `ms949`, `uhc`), which `encoding_rs` files under EUC-KR.
pub fn resolve_encoding(label: &str) -> std::result::Result<&'static Encoding, LoadError> {
    let normalized = label.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "cp949" | "ms949" | "uhc" => Ok(EUC_KR),
        other => Encoding::for_label(other.as_bytes())
            .ok_or_else(|| LoadError::UnknownEncoding(label.to_string())),
    }
}

/// Decode `bytes` strictly. Malformed input yields `None` rather than
/// replacement characters.
fn decode(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text.as_ref());
    Some(text.to_string())
}

/// Read a delimited file written in `encoding_label` into a validated table.
pub fn load<P: AsRef<Path>>(path: P, encoding_label: &str) -> Result<MarriageTable> {
    let path = path.as_ref();
    let encoding = resolve_encoding(encoding_label)?;
    info!("loading {} as {}", path.display(), encoding.name());

    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", bytes.len(), path.display());

    let text = decode(&bytes, encoding).ok_or_else(|| LoadError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name(),
    })?;

    // every cell is read as text; MarriageTable::from_frame owns the typing
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
        .finish()
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let table = MarriageTable::from_frame(df)?;
    info!("loaded {} registrations from {}", table.height(), path.display());
    Ok(table)
}
