//! Office Open XML (.xlsx) encoding of a [`Workbook`].

use crate::book::{Workbook, Worksheet};
use crate::cell::{Alignment, CellStyle, CellValue, NumberFormat};
use crate::error::{Result, SheetError};
use rust_xlsxwriter::{Format, FormatAlign, XlsxError};

fn serialize_err(e: XlsxError) -> SheetError {
    SheetError::Serialize(e.to_string())
}

fn format_for(style: CellStyle) -> Format {
    let mut format = Format::new();
    if style.number_format != NumberFormat::General {
        format = format.set_num_format(style.number_format.code());
    }
    if style.alignment == Alignment::Center {
        format = format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
    }
    format
}

/// Encode a workbook as .xlsx bytes
pub(crate) fn encode(book: &Workbook) -> Result<Vec<u8>> {
    let mut workbook = rust_xlsxwriter::Workbook::new();

    for sheet in book.sheets() {
        let worksheet = workbook.add_worksheet();
        write_sheet(sheet, worksheet)?;
    }

    workbook.save_to_buffer().map_err(serialize_err)
}

fn write_sheet(sheet: &Worksheet, worksheet: &mut rust_xlsxwriter::Worksheet) -> Result<()> {
    worksheet.set_name(sheet.name()).map_err(serialize_err)?;

    for (col, width) in sheet.column_widths() {
        worksheet.set_column_width(col, width).map_err(serialize_err)?;
    }

    // Merges go first: merge_range fills the region, the anchor value is written after
    for region in sheet.merged_regions() {
        let style = sheet
            .cell(region.first_row, region.first_col)
            .map(|c| c.style())
            .unwrap_or_default();
        worksheet
            .merge_range(
                region.first_row,
                region.first_col,
                region.last_row,
                region.last_col,
                "",
                &format_for(style),
            )
            .map_err(serialize_err)?;
    }

    for (row, cells) in sheet.rows() {
        for (col, cell) in cells.cells() {
            let format = format_for(cell.style());
            match cell.value() {
                CellValue::Number(n) => {
                    worksheet
                        .write_number_with_format(row, col, *n, &format)
                        .map_err(serialize_err)?;
                }
                CellValue::Text(s) if !s.is_empty() => {
                    worksheet
                        .write_string_with_format(row, col, s, &format)
                        .map_err(serialize_err)?;
                }
                _ if !cell.style().is_default() => {
                    worksheet
                        .write_blank(row, col, &format)
                        .map_err(serialize_err)?;
                }
                _ => {}
            }
        }
    }

    Ok(())
}
