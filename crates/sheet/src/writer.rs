use crate::book::{Workbook, Worksheet};
use crate::cell::{Cell, CellStyle, CellValue};
use crate::error::{Result, SheetError};
use crate::record::{FieldValue, RecordShape};
use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Column width, in characters, given to every written data column
pub const DEFAULT_COLUMN_WIDTH: f64 = 16.0;

/// Name of the sheet created for raw grids
pub const GRID_SHEET_NAME: &str = "sheet0";

const DAY_FORMAT: &str = "%Y-%m-%d";
const SECOND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which record fields become columns
#[derive(Debug, Clone, Copy)]
pub enum ColumnSelection<'a> {
    /// Every exported field in declaration order, minus these names
    Exclude(&'a [&'a str]),
    /// Exactly these fields, in this order
    Include(&'a [&'a str]),
}

impl Default for ColumnSelection<'_> {
    fn default() -> Self {
        ColumnSelection::Exclude(&[])
    }
}

/// Build a one-sheet workbook: headers in row 0, one row per record.
///
/// # Errors
///
/// Returns error if the sheet name is invalid, an included field does not
/// exist, or the data does not fit the sheet's index range.
pub fn build_record_workbook<R>(
    headers: &[&str],
    records: &[R],
    shape: &RecordShape<R>,
    sheet_name: &str,
    columns: ColumnSelection<'_>,
    column_width: f64,
) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_sheet(sheet_name)?;
    write_header(sheet, headers)?;

    let fields = match columns {
        ColumnSelection::Exclude(names) => shape
            .fields()
            .iter()
            .filter(|f| f.is_exported() && !names.contains(&f.name()))
            .collect::<Vec<_>>(),
        ColumnSelection::Include(names) => names
            .iter()
            .map(|name| {
                shape.get_field(name).ok_or_else(|| SheetError::UnknownField {
                    name: (*name).to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?,
    };

    for (idx, record) in records.iter().enumerate() {
        let row = row_index(idx + 1)?;
        for (col, field) in fields.iter().enumerate() {
            let col = col_index(col)?;
            sheet.set_column_width(col, column_width);
            write_value(sheet.cell_mut(row, col), &field.get(record));
        }
    }

    Ok(workbook)
}

/// Build a workbook holding `grid` as-is on a sheet named `sheet0`
///
/// # Errors
///
/// Returns error if the grid does not fit the sheet's index range.
pub fn build_grid_workbook(grid: &[Vec<String>]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_sheet(GRID_SHEET_NAME)?;

    for (r, row) in grid.iter().enumerate() {
        let r = row_index(r)?;
        for (c, text) in row.iter().enumerate() {
            let c = col_index(c)?;
            write_value(sheet.cell_mut(r, c), &FieldValue::Text(text.clone()));
        }
    }

    Ok(workbook)
}

/// Store a field value in a cell following the export formatting policy
pub fn write_value(cell: &mut Cell, value: &FieldValue) {
    match value {
        FieldValue::Date(date) => {
            cell.set_style(CellStyle::default());
            cell.set_value(format_date(date));
        }
        FieldValue::Int(i) => {
            cell.set_style(CellStyle::thousands());
            cell.set_value(CellValue::Number(*i as f64));
        }
        FieldValue::Float(f) => {
            cell.set_style(CellStyle::thousands());
            cell.set_value(CellValue::Number(*f));
        }
        FieldValue::Null => {
            cell.set_style(CellStyle::default());
            cell.set_value(CellValue::Text(String::new()));
        }
        other => {
            cell.set_style(CellStyle::default());
            cell.set_value(CellValue::Text(other.to_string()));
        }
    }
}

/// `yyyy-MM-dd` when the time reads `00:00:00`, `yyyy-MM-dd HH:mm:ss` otherwise
#[must_use]
pub fn format_date(date: &NaiveDateTime) -> String {
    // fractional seconds are not printed, so they do not count
    if date.time().with_nanosecond(0) == Some(NaiveTime::MIN) {
        date.format(DAY_FORMAT).to_string()
    } else {
        date.format(SECOND_FORMAT).to_string()
    }
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        sheet.set_value(0, col_index(col)?, *header);
    }
    Ok(())
}

fn row_index(idx: usize) -> Result<u32> {
    u32::try_from(idx).map_err(|_| SheetError::Serialize("Row index overflow".to_string()))
}

fn col_index(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| SheetError::Serialize("Column index overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::NumberFormat;
    use chrono::NaiveDate;

    #[derive(Debug, Default)]
    struct Account {
        id: i64,
        name: String,
        internal_flag: bool,
    }

    fn account_shape() -> RecordShape<Account> {
        RecordShape::<Account>::new()
            .number("id", |a| a.id.into(), |a, v| {
                a.id = v.to_i64()?;
                Ok(())
            })
            .text("name", |a| (&a.name).into(), |a, v| {
                a.name = v.into_text();
                Ok(())
            })
            .boolean("internalFlag", |a| a.internal_flag.into(), |a, v| {
                a.internal_flag = v.to_bool()?;
                Ok(())
            })
            .bookkeeping()
    }

    #[derive(Debug, Default)]
    struct Member {
        name: String,
        joined: Option<NaiveDateTime>,
    }

    fn member_shape() -> RecordShape<Member> {
        RecordShape::<Member>::new()
            .text("name", |m| (&m.name).into(), |m, v| {
                m.name = v.into_text();
                Ok(())
            })
            .date("joined", |m| m.joined.into(), |m, v| {
                m.joined = Some(v.to_date()?);
                Ok(())
            })
    }

    fn date(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_format_date_midnight_rule() {
        assert_eq!(format_date(&date(2020, 1, 1, 0, 0, 0)), "2020-01-01");
        assert_eq!(format_date(&date(2020, 1, 1, 0, 0, 1)), "2020-01-01 00:00:01");
        assert_eq!(format_date(&date(1999, 12, 31, 23, 59, 59)), "1999-12-31 23:59:59");

        let half_past_midnight = crate::mapper::parse_epoch_millis("1577836800500").unwrap();
        assert_eq!(format_date(&half_past_midnight), "2020-01-01");
        let millis_after_one = crate::mapper::parse_epoch_millis("1577836801250").unwrap();
        assert_eq!(format_date(&millis_after_one), "2020-01-01 00:00:01");
    }

    #[test]
    fn test_date_written_as_day_text() {
        let members = vec![Member {
            name: "Alice".to_string(),
            joined: Some(date(2020, 1, 1, 0, 0, 0)),
        }];
        let book = build_record_workbook(
            &["Name", "Joined"],
            &members,
            &member_shape(),
            "Members",
            ColumnSelection::default(),
            DEFAULT_COLUMN_WIDTH,
        )
        .unwrap();

        let sheet = book.sheet(0).unwrap();
        assert_eq!(sheet.name(), "Members");
        assert_eq!(sheet.cell(0, 0).unwrap().text(), "Name");
        assert_eq!(sheet.cell(0, 1).unwrap().text(), "Joined");
        assert_eq!(sheet.cell(1, 0).unwrap().text(), "Alice");
        assert_eq!(sheet.cell(1, 1).unwrap().text(), "2020-01-01");
    }

    #[test]
    fn test_exclusion_leaves_no_gap() {
        let accounts = vec![Account {
            id: 12345,
            name: "hidden".to_string(),
            internal_flag: true,
        }];
        let book = build_record_workbook(
            &["Id"],
            &accounts,
            &account_shape(),
            "Accounts",
            ColumnSelection::Exclude(&["name"]),
            DEFAULT_COLUMN_WIDTH,
        )
        .unwrap();

        let sheet = book.sheet(0).unwrap();
        let row = sheet.row(1).unwrap();
        assert_eq!(row.cells().count(), 1);
        let cell = row.cell(0).unwrap();
        assert_eq!(cell.value(), &CellValue::Number(12345.0));
        assert_eq!(cell.style().number_format, NumberFormat::Thousands);
        assert_eq!(sheet.column_width(0), Some(DEFAULT_COLUMN_WIDTH));
        assert_eq!(sheet.column_width(1), None);
    }

    #[test]
    fn test_inclusion_order() {
        let accounts = vec![Account {
            id: 1,
            name: "Zed".to_string(),
            internal_flag: false,
        }];
        let book = build_record_workbook(
            &["Flag", "Name"],
            &accounts,
            &account_shape(),
            "Accounts",
            ColumnSelection::Include(&["internalFlag", "name"]),
            20.0,
        )
        .unwrap();

        let sheet = book.sheet(0).unwrap();
        assert_eq!(sheet.cell(1, 0).unwrap().text(), "false");
        assert_eq!(sheet.cell(1, 1).unwrap().text(), "Zed");
        assert_eq!(sheet.column_width(1), Some(20.0));
    }

    #[test]
    fn test_inclusion_unknown_field() {
        let result = build_record_workbook(
            &["X"],
            &[Account::default()],
            &account_shape(),
            "Accounts",
            ColumnSelection::Include(&["missing"]),
            DEFAULT_COLUMN_WIDTH,
        );
        assert!(matches!(result, Err(SheetError::UnknownField { name }) if name == "missing"));
    }

    #[test]
    fn test_header_only_when_no_records() {
        let book = build_record_workbook(
            &["Id", "Name"],
            &[],
            &account_shape(),
            "Empty",
            ColumnSelection::default(),
            DEFAULT_COLUMN_WIDTH,
        )
        .unwrap();
        let sheet = book.sheet(0).unwrap();
        assert_eq!(sheet.row_count(), 1);
    }

    #[test]
    fn test_write_value_policy() {
        let mut cell = Cell::default();
        write_value(&mut cell, &FieldValue::Float(1234.567));
        assert_eq!(cell.value(), &CellValue::Number(1234.567));
        assert_eq!(cell.style(), CellStyle::thousands());

        write_value(&mut cell, &FieldValue::Null);
        assert_eq!(cell.value(), &CellValue::Text(String::new()));
        assert!(cell.style().is_default());

        write_value(&mut cell, &FieldValue::Bool(true));
        assert_eq!(cell.text(), "true");
    }

    #[test]
    fn test_grid_workbook() {
        let grid = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ];
        let book = build_grid_workbook(&grid).unwrap();
        let sheet = book.sheet(0).unwrap();
        assert_eq!(sheet.name(), GRID_SHEET_NAME);
        assert_eq!(sheet.cell(0, 1).unwrap().text(), "b");
        assert_eq!(sheet.cell(1, 0).unwrap().text(), "c");
        assert!(sheet.cell(1, 1).is_none());
        assert_eq!(sheet.column_width(0), None);
    }
}
