//! Error types for loading and aggregating the dataset.

use std::io;
use std::path::PathBuf;

use polars::prelude::PolarsError;

/// The input file could not be turned into a table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown encoding label: {0:?}")]
    UnknownEncoding(String),

    #[error("{} is not valid {encoding} text", path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("cannot parse {} as CSV: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
}

/// The table does not have the declared shape.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column {column} holds a non-integer code: {source}")]
    NotInteger {
        column: String,
        #[source]
        source: PolarsError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("cannot convert frame rows: {0}")]
    Rows(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
