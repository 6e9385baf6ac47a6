use crate::error::Result;
use crate::grid::Grid;
use crate::merge::{apply_merge_regions, MergeRegion};
use crate::record::RecordShape;
use crate::transport::{send_workbook, DownloadSink, SpreadsheetFormat};
use crate::writer::{
    build_grid_workbook, build_record_workbook, ColumnSelection, DEFAULT_COLUMN_WIDTH,
    GRID_SHEET_NAME,
};
use serde::{Deserialize, Serialize};

/// Options for exporting records or grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: SpreadsheetFormat,
    /// Name of the record sheet; raw grids always use `sheet0`
    pub sheet_name: String,
    /// Width, in characters, of every record column
    pub column_width: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: SpreadsheetFormat::default(),
            sheet_name: GRID_SHEET_NAME.to_string(),
            column_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn with_format(mut self, format: SpreadsheetFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    #[must_use]
    pub fn with_column_width(mut self, width: f64) -> Self {
        self.column_width = width;
        self
    }
}

/// Write records to a sheet, overlay merged regions and send the result.
///
/// # Errors
///
/// Returns error if building, merging, encoding or writing fails.
#[allow(clippy::too_many_arguments)]
pub fn export_records<R, S: DownloadSink + ?Sized>(
    title: &str,
    headers: &[&str],
    records: &[R],
    shape: &RecordShape<R>,
    columns: ColumnSelection<'_>,
    merges: Vec<MergeRegion>,
    options: &ExportOptions,
    sink: &mut S,
) -> Result<u64> {
    let mut book = build_record_workbook(
        headers,
        records,
        shape,
        &options.sheet_name,
        columns,
        options.column_width,
    )?;
    apply_merge_regions(&mut book, 0, merges)?;
    send_workbook(title, &book, options.format, sink)
}

/// Write a grid verbatim to `sheet0` and send it
///
/// # Errors
///
/// Returns error if encoding or writing fails.
pub fn export_grid<S: DownloadSink + ?Sized>(
    title: &str,
    grid: &Grid,
    options: &ExportOptions,
    sink: &mut S,
) -> Result<u64> {
    let book = build_grid_workbook(grid)?;
    send_workbook(title, &book, options.format, sink)
}
