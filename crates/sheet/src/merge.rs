//! Merged-cell overlay applied to freshly built workbooks.

use crate::book::Workbook;
use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Inclusive rectangular cell range merged into one centered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRegion {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl MergeRegion {
    #[must_use]
    pub fn new(first_row: u32, last_row: u32, first_col: u16, last_col: u16) -> Self {
        MergeRegion {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    /// Check that the region is well formed and spans more than one cell
    pub fn validate(&self) -> Result<()> {
        let reason = if self.first_row > self.last_row {
            "first row is after last row"
        } else if self.first_col > self.last_col {
            "first column is after last column"
        } else if self.first_row == self.last_row && self.first_col == self.last_col {
            "region covers a single cell"
        } else {
            return Ok(());
        };
        Err(SheetError::InvalidMergeRegion {
            region: *self,
            reason: reason.to_string(),
        })
    }

    /// Check if two regions share at least one cell
    #[must_use]
    pub fn overlaps(&self, other: &MergeRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    #[must_use]
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

impl fmt::Display for MergeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..={}, cols {}..={}",
            self.first_row, self.last_row, self.first_col, self.last_col
        )
    }
}

/// Merge `regions` on the sheet at `sheet_index` and center each anchor cell.
///
/// Returns the number of regions applied. An empty list is a no-op.
pub fn apply_merge_regions(
    workbook: &mut Workbook,
    sheet_index: usize,
    regions: Vec<MergeRegion>,
) -> Result<usize> {
    if regions.is_empty() {
        return Ok(0);
    }

    let sheet = workbook.sheet_mut(sheet_index)?;
    for region in &regions {
        sheet.add_merged_region(*region)?;
        let anchor = sheet.cell_mut(region.first_row, region.first_col);
        let style = anchor.style().centered();
        anchor.set_style(style);
    }
    Ok(regions.len())
}

/// Holder for merge regions declared ahead of an export call.
///
/// Staged regions are consumed by the next [`MergeStaging::apply`]; the
/// holder is empty afterwards so a later export does not reapply them.
#[derive(Debug, Default)]
pub struct MergeStaging {
    regions: Mutex<Vec<MergeRegion>>,
}

impl MergeStaging {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage regions, replacing anything staged before
    pub fn stage(&self, regions: Vec<MergeRegion>) {
        *self.regions.lock().unwrap_or_else(PoisonError::into_inner) = regions;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Take the staged regions and apply them to `workbook`.
    ///
    /// The holder is cleared even when applying fails.
    pub fn apply(&self, workbook: &mut Workbook, sheet_index: usize) -> Result<usize> {
        let mut staged = self.regions.lock().unwrap_or_else(PoisonError::into_inner);
        let regions = std::mem::take(&mut *staged);
        let current = std::thread::current();
        tracing::debug!(
            thread = current.name().unwrap_or("<unnamed>"),
            regions = regions.len(),
            "applying staged merge regions"
        );
        apply_merge_regions(workbook, sheet_index, regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Alignment, CellStyle, NumberFormat};

    fn workbook_with_sheet() -> Workbook {
        let mut book = Workbook::new();
        let sheet = book.add_sheet("S").unwrap();
        sheet.set_value(0, 0, "Title");
        let cell = sheet.cell_mut(2, 1);
        cell.set_value(1500.0);
        cell.set_style(CellStyle::thousands());
        book
    }

    #[test]
    fn test_validate() {
        assert!(MergeRegion::new(0, 0, 0, 3).validate().is_ok());
        assert!(MergeRegion::new(2, 1, 0, 3).validate().is_err());
        assert!(MergeRegion::new(0, 1, 3, 0).validate().is_err());
        assert!(MergeRegion::new(4, 4, 2, 2).validate().is_err());
    }

    #[test]
    fn test_overlaps_and_contains() {
        let a = MergeRegion::new(0, 2, 0, 2);
        assert!(a.overlaps(&MergeRegion::new(2, 3, 2, 3)));
        assert!(!a.overlaps(&MergeRegion::new(3, 4, 0, 2)));
        assert!(a.contains(1, 1));
        assert!(!a.contains(1, 3));
    }

    #[test]
    fn test_apply_centers_anchor() {
        let mut book = workbook_with_sheet();
        let applied = apply_merge_regions(
            &mut book,
            0,
            vec![MergeRegion::new(0, 0, 0, 3), MergeRegion::new(2, 3, 1, 1)],
        )
        .unwrap();
        assert_eq!(applied, 2);

        let sheet = book.sheet(0).unwrap();
        assert_eq!(sheet.merged_regions().len(), 2);
        assert_eq!(sheet.cell(0, 0).unwrap().style().alignment, Alignment::Center);
        // number format survives centering
        let numeric = sheet.cell(2, 1).unwrap().style();
        assert_eq!(numeric.alignment, Alignment::Center);
        assert_eq!(numeric.number_format, NumberFormat::Thousands);
    }

    #[test]
    fn test_apply_creates_missing_anchor() {
        let mut book = workbook_with_sheet();
        apply_merge_regions(&mut book, 0, vec![MergeRegion::new(7, 8, 0, 0)]).unwrap();
        let anchor = book.sheet(0).unwrap().cell(7, 0).unwrap();
        assert!(anchor.value().is_blank());
        assert_eq!(anchor.style().alignment, Alignment::Center);
    }

    #[test]
    fn test_apply_empty_is_noop() {
        let mut book = workbook_with_sheet();
        let before = book.clone();
        assert_eq!(apply_merge_regions(&mut book, 5, Vec::new()).unwrap(), 0);
        assert_eq!(book, before);
    }

    #[test]
    fn test_apply_bad_sheet_index() {
        let mut book = workbook_with_sheet();
        let result = apply_merge_regions(&mut book, 3, vec![MergeRegion::new(0, 1, 0, 0)]);
        assert!(matches!(
            result,
            Err(SheetError::SheetIndexOutOfBounds { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_staging_is_cleared_after_apply() {
        let staging = MergeStaging::new();
        staging.stage(vec![MergeRegion::new(0, 0, 0, 1)]);
        assert!(!staging.is_empty());

        let mut first = workbook_with_sheet();
        assert_eq!(staging.apply(&mut first, 0).unwrap(), 1);
        assert!(staging.is_empty());

        let mut second = workbook_with_sheet();
        assert_eq!(staging.apply(&mut second, 0).unwrap(), 0);
        assert!(second.sheet(0).unwrap().merged_regions().is_empty());
    }

    #[test]
    fn test_staging_cleared_on_failure() {
        let staging = MergeStaging::new();
        staging.stage(vec![MergeRegion::new(1, 0, 0, 0)]);
        let mut book = workbook_with_sheet();
        assert!(staging.apply(&mut book, 0).is_err());
        assert!(staging.is_empty());
    }
}
