use crate::merge::MergeRegion;
use thiserror::Error;

/// Errors that can occur while reading, mapping or exporting sheets
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Header row {index} is missing or empty")]
    MissingHeaderRow { index: usize },

    #[error("Shape mismatch: row {row}, column {column} has no field to receive it (shape has {fields} fields)")]
    ShapeMismatch {
        row: usize,
        column: usize,
        fields: usize,
    },

    #[error("Field not found: {name}")]
    UnknownField { name: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid merge region {region}: {reason}")]
    InvalidMergeRegion { region: MergeRegion, reason: String },

    #[error("Sheet index out of bounds: {index} (workbook has {count} sheets)")]
    SheetIndexOutOfBounds { index: usize, count: usize },

    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    #[error("Sheet already exists: {name}")]
    SheetAlreadyExists { name: String },

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
