//! Canonical text for source cells.
//!
//! Date cells become epoch-millisecond strings here and are turned back
//! into human-readable text by the writer; record mapping relies on the
//! millisecond form.

use calamine::Data;
use chrono::NaiveDateTime;

/// Cached result of a formula cell
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaResult {
    Number(f64),
    Text(String),
    Other,
}

/// A source cell classified by kind
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCell {
    Blank,
    Text(String),
    Number(f64),
    Integer(i64),
    /// Numeric cell whose format marks it as a date
    Date(NaiveDateTime),
    Bool(bool),
    Error,
    Formula(FormulaResult),
}

impl SourceCell {
    /// Classify a calamine cell; `has_formula` marks cells backed by a formula
    #[must_use]
    pub fn from_data(data: &Data, has_formula: bool) -> Self {
        if has_formula {
            let cached = match data {
                Data::Float(f) => FormulaResult::Number(*f),
                Data::Int(i) => FormulaResult::Number(*i as f64),
                Data::DateTime(dt) => FormulaResult::Number(dt.as_f64()),
                Data::String(s) => FormulaResult::Text(s.clone()),
                _ => FormulaResult::Other,
            };
            return SourceCell::Formula(cached);
        }

        match data {
            Data::Empty => SourceCell::Blank,
            Data::String(s) => SourceCell::Text(s.clone()),
            Data::Float(f) => SourceCell::Number(*f),
            Data::Int(i) => SourceCell::Integer(*i),
            Data::Bool(b) => SourceCell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => SourceCell::Date(datetime),
                None => SourceCell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => parse_iso_datetime(s)
                .map_or_else(|| SourceCell::Text(s.clone()), SourceCell::Date),
            Data::DurationIso(s) => SourceCell::Text(s.clone()),
            Data::Error(_) => SourceCell::Error,
        }
    }

    /// Whether the cell counts as populated when scanning rows
    #[must_use]
    pub fn is_populated(&self) -> bool {
        !matches!(self, SourceCell::Blank)
    }
}

/// Map one cell to its canonical text
#[must_use]
pub fn normalize(cell: &SourceCell) -> String {
    match cell {
        SourceCell::Blank | SourceCell::Error => String::new(),
        SourceCell::Text(s) => s.clone(),
        SourceCell::Number(f) => number_text(*f),
        SourceCell::Integer(i) => i.to_string(),
        SourceCell::Date(datetime) => datetime.and_utc().timestamp_millis().to_string(),
        SourceCell::Bool(true) => "TRUE".to_string(),
        SourceCell::Bool(false) => "FALSE".to_string(),
        SourceCell::Formula(FormulaResult::Number(f)) => format!("{f:.2}"),
        SourceCell::Formula(FormulaResult::Text(s)) => s.clone(),
        SourceCell::Formula(FormulaResult::Other) => String::new(),
    }
}

/// Shortest text that reads back as the same number (`30`, `1234.5`)
fn number_text(f: f64) -> String {
    if f == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    f.to_string()
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_text_and_blank() {
        assert_eq!(normalize(&SourceCell::Text("abc".to_string())), "abc");
        assert_eq!(normalize(&SourceCell::Blank), "");
        assert_eq!(normalize(&SourceCell::Error), "");
    }

    #[test]
    fn test_numbers_keep_precision() {
        assert_eq!(normalize(&SourceCell::Number(30.0)), "30");
        assert_eq!(normalize(&SourceCell::Number(1234.5)), "1234.5");
        assert_eq!(normalize(&SourceCell::Number(0.1)), "0.1");
        assert_eq!(normalize(&SourceCell::Number(-0.0)), "0");
        assert_eq!(normalize(&SourceCell::Integer(-17)), "-17");
    }

    #[test]
    fn test_date_becomes_epoch_millis() {
        let cell = SourceCell::Date(datetime(2020, 1, 1, 0, 0, 0));
        assert_eq!(normalize(&cell), "1577836800000");

        let cell = SourceCell::Date(datetime(1970, 1, 1, 0, 0, 1));
        assert_eq!(normalize(&cell), "1000");
    }

    #[test]
    fn test_formula_results() {
        let cell = SourceCell::Formula(FormulaResult::Number(1.0 / 3.0));
        assert_eq!(normalize(&cell), "0.33");
        let cell = SourceCell::Formula(FormulaResult::Number(12.0));
        assert_eq!(normalize(&cell), "12.00");
        let cell = SourceCell::Formula(FormulaResult::Text("ok".to_string()));
        assert_eq!(normalize(&cell), "ok");
        assert_eq!(normalize(&SourceCell::Formula(FormulaResult::Other)), "");
    }

    #[test]
    fn test_bool() {
        assert_eq!(normalize(&SourceCell::Bool(true)), "TRUE");
        assert_eq!(normalize(&SourceCell::Bool(false)), "FALSE");
    }

    #[test]
    fn test_from_data() {
        assert_eq!(SourceCell::from_data(&Data::Empty, false), SourceCell::Blank);
        assert_eq!(
            SourceCell::from_data(&Data::Float(2.5), false),
            SourceCell::Number(2.5)
        );
        assert_eq!(
            SourceCell::from_data(&Data::Float(2.5), true),
            SourceCell::Formula(FormulaResult::Number(2.5))
        );
        assert_eq!(
            SourceCell::from_data(&Data::String("x".to_string()), true),
            SourceCell::Formula(FormulaResult::Text("x".to_string()))
        );
        assert_eq!(
            SourceCell::from_data(&Data::Bool(true), true),
            SourceCell::Formula(FormulaResult::Other)
        );
        assert_eq!(
            SourceCell::from_data(&Data::DateTimeIso("2021-03-04".to_string()), false),
            SourceCell::Date(datetime(2021, 3, 4, 0, 0, 0))
        );
        assert!(!SourceCell::Blank.is_populated());
        assert!(SourceCell::Formula(FormulaResult::Other).is_populated());
    }
}
