use crate::error::{Result, SheetError};
use crate::grid::{read_grid, Grid};
use crate::record::{FieldKind, FieldValue, RecordShape};
use chrono::{DateTime, NaiveDateTime};
use std::io::Read;

/// Map grid rows onto records of type `R`.
///
/// Rows before `start_row` are skipped. Columns are assigned to the
/// shape's fields in order; fields named in `exclude` are stepped over
/// without consuming a column, and empty columns leave the field at its
/// default.
///
/// # Errors
///
/// Returns error if a date column is not an epoch-millisecond integer, a
/// setter rejects its value, or a row has more non-empty columns than the
/// shape has fields.
pub fn map_records<R: Default>(
    grid: &Grid,
    shape: &RecordShape<R>,
    start_row: usize,
    exclude: &[&str],
) -> Result<Vec<R>> {
    let fields = shape.fields();
    let mut records = Vec::with_capacity(grid.len().saturating_sub(start_row));

    for (row_idx, row) in grid.iter().enumerate().skip(start_row) {
        let mut record = R::default();
        let mut cursor = 0;

        for (col_idx, text) in row.iter().enumerate() {
            while fields
                .get(cursor)
                .is_some_and(|f| exclude.contains(&f.name()))
            {
                cursor += 1;
            }
            let field = fields.get(cursor);
            cursor += 1;

            if text.is_empty() {
                continue;
            }
            let Some(field) = field else {
                return Err(SheetError::ShapeMismatch {
                    row: row_idx,
                    column: col_idx,
                    fields: fields.len(),
                });
            };

            let value = match field.kind() {
                FieldKind::Date => FieldValue::Date(parse_epoch_millis(text)?),
                _ => FieldValue::Text(text.clone()),
            };
            field.set(&mut record, value)?;
        }
        records.push(record);
    }

    Ok(records)
}

/// Read a workbook stream and map its rows onto records
///
/// # Errors
///
/// Returns error if reading or mapping fails.
pub fn import_records<R: Default, Rd: Read>(
    reader: Rd,
    header_row: usize,
    shape: &RecordShape<R>,
    start_row: usize,
    exclude: &[&str],
) -> Result<Vec<R>> {
    let grid = read_grid(reader, header_row)?;
    map_records(&grid, shape, start_row, exclude)
}

/// Parse epoch-millisecond text into a date-time
pub fn parse_epoch_millis(text: &str) -> Result<NaiveDateTime> {
    let millis: i64 = text
        .trim()
        .parse()
        .map_err(|_| SheetError::Parse(format!("'{text}' is not an epoch-millisecond value")))?;
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| SheetError::Parse(format!("{millis} ms is out of the supported date range")))
}
