use crate::error::{Result, SheetError};
use crate::normalize::{normalize, SourceCell};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Rows of cell text; the first sheet of a workbook as read
pub type Grid = Vec<Vec<String>>;

/// Options for reading a grid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Index of the header row; its width bounds every row read
    pub header_row: usize,
}

impl ReadOptions {
    /// Set the header row index
    #[must_use]
    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }
}

/// Read the first sheet of a workbook stream into a grid
///
/// # Errors
///
/// Returns error if the stream cannot be read, is not a workbook, or the
/// header row is missing.
pub fn read_grid<R: Read>(mut reader: R, header_row: usize) -> Result<Grid> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    read_grid_from_bytes(bytes, header_row)
}

/// Read the first sheet of a workbook file into a grid
///
/// # Errors
///
/// Returns error if the file cannot be opened or decoded.
pub fn read_grid_from_path<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Grid> {
    let file = File::open(path.as_ref())?;
    read_grid(BufReader::new(file), options.header_row)
}

/// Read the first sheet of an in-memory workbook into a grid
///
/// # Errors
///
/// Returns error if the bytes are not a workbook or the header row is missing.
pub fn read_grid_from_bytes(bytes: Vec<u8>, header_row: usize) -> Result<Grid> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| SheetError::Decode(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SheetError::Decode("workbook has no sheets".to_string()))?;

    let values = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SheetError::Decode(e.to_string()))?;

    let formulas = match workbook.worksheet_formula(&sheet_name) {
        Ok(formulas) => Some(formulas),
        Err(e) => {
            tracing::warn!("Formula metadata unavailable for '{}': {}", sheet_name, e);
            None
        }
    };

    SheetView {
        values: &values,
        formulas: formulas.as_ref(),
    }
    .to_grid(header_row)
}

/// Values and formulas of one sheet, addressed by absolute position
struct SheetView<'a> {
    values: &'a Range<Data>,
    formulas: Option<&'a Range<String>>,
}

impl SheetView<'_> {
    fn has_formula(&self, row: u32, col: u32) -> bool {
        self.formulas
            .and_then(|f| f.get_value((row, col)))
            .is_some_and(|f| !f.is_empty())
    }

    fn is_populated(&self, row: u32, col: u32) -> bool {
        self.has_formula(row, col)
            || self
                .values
                .get_value((row, col))
                .is_some_and(|data| !matches!(data, Data::Empty))
    }

    fn cell(&self, row: u32, col: u32) -> SourceCell {
        let has_formula = self.has_formula(row, col);
        match self.values.get_value((row, col)) {
            Some(data) => SourceCell::from_data(data, has_formula),
            None if has_formula => SourceCell::from_data(&Data::Empty, true),
            None => SourceCell::Blank,
        }
    }

    /// Last row/column holding a value or a formula
    fn end(&self) -> Option<(u32, u32)> {
        let value_end = self.values.end();
        let formula_end = self.formulas.and_then(Range::end);
        match (value_end, formula_end) {
            (Some((r1, c1)), Some((r2, c2))) => Some((r1.max(r2), c1.max(c2))),
            (end, None) | (None, end) => end,
        }
    }

    fn last_populated_col(&self, row: u32, last_col: u32) -> Option<u32> {
        (0..=last_col)
            .rev()
            .find(|&col| self.is_populated(row, col))
    }

    fn to_grid(&self, header_row: usize) -> Result<Grid> {
        let Some((last_row, last_col)) = self.end() else {
            return Err(SheetError::MissingHeaderRow { index: header_row });
        };
        tracing::info!("Sheet row count: {}", last_row + 1);

        let header_width = u32::try_from(header_row)
            .ok()
            .filter(|&row| row <= last_row)
            .and_then(|row| self.last_populated_col(row, last_col))
            .map(|col| col + 1)
            .ok_or(SheetError::MissingHeaderRow { index: header_row })?;

        let mut grid = Grid::new();
        for row in 0..=last_row {
            if self.last_populated_col(row, last_col).is_none() {
                tracing::debug!("Row {} is empty, skipping", row);
                continue;
            }
            let record: Vec<String> = (0..header_width)
                .map(|col| normalize(&self.cell(row, col)))
                .collect();
            grid.push(record);
        }

        tracing::info!("Finished reading {} rows", grid.len());
        Ok(grid)
    }
}
