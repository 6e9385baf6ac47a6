use crate::cell::{Cell, CellValue};
use crate::error::{Result, SheetError};
use crate::merge::MergeRegion;
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Longest sheet name spreadsheet applications accept
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// One row of a worksheet, cells keyed by column index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: BTreeMap<u16, Cell>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell by column index
    #[must_use]
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Get or create a cell by column index
    pub fn cell_mut(&mut self, col: u16) -> &mut Cell {
        self.cells.entry(col).or_default()
    }

    /// Iterate over `(column, cell)` in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter().map(|(col, cell)| (*col, cell))
    }

    /// Index of the last cell, if any
    #[must_use]
    pub fn last_col(&self) -> Option<u16> {
        self.cells.keys().next_back().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A worksheet: rows, column widths and merged regions
#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    column_widths: BTreeMap<u16, f64>,
    merged_regions: Vec<MergeRegion>,
}

impl Worksheet {
    fn with_name(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            rows: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            merged_regions: Vec::new(),
        }
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a row by index
    #[must_use]
    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    /// Get or create a row by index
    pub fn row_mut(&mut self, row: u32) -> &mut Row {
        self.rows.entry(row).or_default()
    }

    /// Iterate over `(row index, row)` in row order
    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(idx, row)| (*idx, row))
    }

    /// Number of rows that hold at least one cell
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.values().filter(|row| !row.is_empty()).count()
    }

    /// Get a cell by position
    #[must_use]
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|r| r.cell(col))
    }

    /// Get or create a cell by position
    pub fn cell_mut(&mut self, row: u32, col: u16) -> &mut Cell {
        self.row_mut(row).cell_mut(col)
    }

    /// Set a cell value, creating the cell if needed
    pub fn set_value<V: Into<CellValue>>(&mut self, row: u32, col: u16, value: V) {
        self.cell_mut(row, col).set_value(value);
    }

    /// Set a column width in character units
    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    #[must_use]
    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    /// Iterate over `(column, width)` in column order
    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.column_widths.iter().map(|(col, width)| (*col, *width))
    }

    /// Register a merged region
    ///
    /// # Errors
    ///
    /// Returns error if the region is malformed or overlaps an existing one.
    pub fn add_merged_region(&mut self, region: MergeRegion) -> Result<()> {
        region.validate()?;
        if let Some(existing) = self.merged_regions.iter().find(|r| r.overlaps(&region)) {
            return Err(SheetError::InvalidMergeRegion {
                region,
                reason: format!("overlaps {existing}"),
            });
        }
        self.merged_regions.push(region);
        Ok(())
    }

    #[must_use]
    pub fn merged_regions(&self) -> &[MergeRegion] {
        &self.merged_regions
    }

    /// Bounding box `(last_row, last_col)` over rows, cells and merges
    #[must_use]
    pub fn extent(&self) -> Option<(u32, u16)> {
        let cells = self
            .rows
            .iter()
            .filter_map(|(idx, row)| row.last_col().map(|col| (*idx, col)));
        let merges = self.merged_regions.iter().map(|r| (r.last_row, r.last_col));

        cells.chain(merges).fold(None, |acc, (row, col)| match acc {
            None => Some((row, col)),
            Some((r, c)) => Some((r.max(row), c.max(col))),
        })
    }
}

/// A workbook owning its sheets (preserves insertion order)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: IndexMap<String, Worksheet>,
}

impl Workbook {
    /// Create a new empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet and return it for writing
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or already taken.
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        validate_sheet_name(name)?;
        if self
            .sheets
            .keys()
            .any(|existing| existing.eq_ignore_ascii_case(name))
        {
            return Err(SheetError::SheetAlreadyExists {
                name: name.to_string(),
            });
        }
        let entry = self
            .sheets
            .entry(name.to_string())
            .or_insert_with(|| Worksheet::with_name(name));
        Ok(entry)
    }

    /// Get the number of sheets
    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get all sheet names in order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Get a sheet by position
    pub fn sheet(&self, index: usize) -> Result<&Worksheet> {
        let count = self.sheets.len();
        self.sheets
            .get_index(index)
            .map(|(_, sheet)| sheet)
            .ok_or(SheetError::SheetIndexOutOfBounds { index, count })
    }

    /// Get a mutable sheet by position
    pub fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let count = self.sheets.len();
        self.sheets
            .get_index_mut(index)
            .map(|(_, sheet)| sheet)
            .ok_or(SheetError::SheetIndexOutOfBounds { index, count })
    }

    /// Iterate over sheets in order
    pub fn sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.values()
    }
}

fn validate_sheet_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| SheetError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        return Err(invalid("name contains one of []:*?/\\"));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name starts or ends with an apostrophe"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sheet() {
        let mut book = Workbook::new();
        book.add_sheet("Data").unwrap();
        book.add_sheet("Summary").unwrap();

        assert_eq!(book.sheet_count(), 2);
        assert_eq!(book.sheet_names(), vec!["Data", "Summary"]);
        assert_eq!(book.sheet(1).unwrap().name(), "Summary");
    }

    #[test]
    fn test_duplicate_sheet_name() {
        let mut book = Workbook::new();
        book.add_sheet("Data").unwrap();
        let result = book.add_sheet("data");
        assert!(matches!(result, Err(SheetError::SheetAlreadyExists { .. })));
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut book = Workbook::new();
        assert!(matches!(
            book.add_sheet(""),
            Err(SheetError::InvalidSheetName { .. })
        ));
        assert!(matches!(
            book.add_sheet("a/b"),
            Err(SheetError::InvalidSheetName { .. })
        ));
        assert!(matches!(
            book.add_sheet(&"x".repeat(32)),
            Err(SheetError::InvalidSheetName { .. })
        ));
        assert!(book.add_sheet(&"x".repeat(31)).is_ok());
    }

    #[test]
    fn test_sheet_index_out_of_bounds() {
        let book = Workbook::new();
        assert!(matches!(
            book.sheet(0),
            Err(SheetError::SheetIndexOutOfBounds { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_cells_and_extent() {
        let mut book = Workbook::new();
        let sheet = book.add_sheet("S").unwrap();
        assert_eq!(sheet.extent(), None);

        sheet.set_value(0, 0, "a");
        sheet.set_value(3, 2, 1.5);
        sheet.set_column_width(2, 16.0);

        assert_eq!(sheet.cell(0, 0).unwrap().text(), "a");
        assert_eq!(sheet.cell(3, 2).unwrap().value().as_number(), Some(1.5));
        assert!(sheet.cell(1, 0).is_none());
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.column_width(2), Some(16.0));
        assert_eq!(sheet.extent(), Some((3, 2)));

        sheet
            .add_merged_region(MergeRegion::new(5, 6, 0, 4))
            .unwrap();
        assert_eq!(sheet.extent(), Some((6, 4)));
    }

    #[test]
    fn test_overlapping_merge_rejected() {
        let mut book = Workbook::new();
        let sheet = book.add_sheet("S").unwrap();
        sheet
            .add_merged_region(MergeRegion::new(0, 1, 0, 1))
            .unwrap();
        let result = sheet.add_merged_region(MergeRegion::new(1, 2, 1, 2));
        assert!(matches!(result, Err(SheetError::InvalidMergeRegion { .. })));
        assert_eq!(sheet.merged_regions().len(), 1);
    }
}
