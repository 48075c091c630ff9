//! Typed errors for the two fatal failure classes.
//!
//! Everything the program can fail on is either reading the input
//! table or writing the chart images.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading the sales table.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to open input file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Required column '{0}' is missing from the input header")]
    MissingColumn(&'static str),

    #[error("Line {line}: cannot parse purchase_date '{value}'")]
    InvalidDate { line: u64, value: String },

    #[error("Line {line}: cannot parse {column} value '{value}'")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("Malformed CSV input: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure while writing chart images.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Output directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to render {chart} chart to {path}: {message}")]
    Render {
        chart: &'static str,
        path: PathBuf,
        message: String,
    },
}
