//! Spreadsheet import and export for typed records
//!
//! Reads the first sheet of an `.xls` or `.xlsx` workbook into a grid of
//! normalized cell text, maps grid rows onto records through an explicit
//! [`RecordShape`], and exports records (or raw grids) back to either
//! format with optional merged regions.
//!
//! # Examples
//!
//! ## Describing a record
//!
//! ```
//! use sheetmap_sheet::RecordShape;
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let shape = RecordShape::<Person>::new()
//!     .text("name", |p| (&p.name).into(), |p, v| {
//!         p.name = v.into_text();
//!         Ok(())
//!     })
//!     .number("age", |p| p.age.into(), |p, v| {
//!         p.age = v.to_i64()?;
//!         Ok(())
//!     });
//!
//! assert_eq!(shape.field_names(), vec!["name", "age"]);
//! ```
//!
//! ## Mapping a grid
//!
//! ```
//! use sheetmap_sheet::{map_records, RecordShape};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: String,
//! }
//!
//! let shape = RecordShape::<Person>::new()
//!     .text("name", |p| (&p.name).into(), |p, v| {
//!         p.name = v.into_text();
//!         Ok(())
//!     })
//!     .text("age", |p| (&p.age).into(), |p, v| {
//!         p.age = v.into_text();
//!         Ok(())
//!     });
//!
//! let grid = vec![
//!     vec!["Name".to_string(), "Age".to_string()],
//!     vec!["Alice".to_string(), "30".to_string()],
//! ];
//! let people = map_records(&grid, &shape, 1, &[]).unwrap();
//! assert_eq!(people[0].name, "Alice");
//! ```
//!
//! ## Exporting to memory
//!
//! ```
//! use sheetmap_sheet::{export_grid, read_grid, BufferedDownload, ExportOptions};
//!
//! let grid = vec![vec!["a".to_string(), "b".to_string()]];
//! let mut sink = BufferedDownload::new();
//! export_grid("report", &grid, &ExportOptions::default(), &mut sink).unwrap();
//!
//! let read_back = read_grid(sink.bytes(), 0).unwrap();
//! assert_eq!(read_back, grid);
//! ```

mod book;
mod cell;
mod error;
mod export;
mod grid;
mod mapper;
mod merge;
mod normalize;
mod record;
mod transport;
mod writer;
mod xls;
mod xlsx;

/// Re-export the in-memory workbook model.
pub use book::{Row, Workbook, Worksheet, MAX_SHEET_NAME_LEN};
/// Re-export cell types.
pub use cell::{Alignment, Cell, CellStyle, CellValue, NumberFormat};
/// Re-export error types.
pub use error::{Result, SheetError};
/// Re-export the export facade.
pub use export::{export_grid, export_records, ExportOptions};
/// Re-export the grid reader.
pub use grid::{read_grid, read_grid_from_bytes, read_grid_from_path, Grid, ReadOptions};
/// Re-export the record mapper.
pub use mapper::{import_records, map_records, parse_epoch_millis};
/// Re-export merge types.
pub use merge::{apply_merge_regions, MergeRegion, MergeStaging};
/// Re-export cell normalization.
pub use normalize::{normalize, FormulaResult, SourceCell};
/// Re-export record shape types.
pub use record::{FieldDescriptor, FieldKind, FieldValue, Getter, RecordShape, Setter};
/// Re-export transport types.
pub use transport::{
    content_disposition, encode_workbook, file_name, send_workbook, BufferedDownload,
    DownloadSink, FileDownload, SpreadsheetFormat, CONTENT_DISPOSITION,
};
/// Re-export the grid writer.
pub use writer::{
    build_grid_workbook, build_record_workbook, format_date, write_value, ColumnSelection,
    DEFAULT_COLUMN_WIDTH, GRID_SHEET_NAME,
};
/// Re-export legacy format limits.
pub use xls::{MAX_COLS, MAX_ROWS, MAX_STRING_CHARS};
