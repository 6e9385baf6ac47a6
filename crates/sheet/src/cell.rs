use serde::{Deserialize, Serialize};
use std::fmt;

/// Value stored in a workbook cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Blank,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Check if the cell carries nothing worth encoding
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Try to get the value as a number
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Blank
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => write!(f, ""),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Number(i as f64)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// Display format applied to numeric cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberFormat {
    #[default]
    General,
    /// Integer display with a thousands separator (`#,##0`)
    Thousands,
}

impl NumberFormat {
    /// Format code understood by spreadsheet applications
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::Thousands => "#,##0",
        }
    }

    /// Built-in format index shared by both binary formats
    #[must_use]
    pub fn builtin_id(self) -> u16 {
        match self {
            NumberFormat::General => 0,
            NumberFormat::Thousands => 3,
        }
    }
}

/// Cell alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    General,
    /// Horizontally and vertically centered
    Center,
}

/// Presentation attributes of a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellStyle {
    pub number_format: NumberFormat,
    pub alignment: Alignment,
}

impl CellStyle {
    /// Style for numbers shown with a thousands separator
    #[must_use]
    pub fn thousands() -> Self {
        CellStyle {
            number_format: NumberFormat::Thousands,
            alignment: Alignment::General,
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }

    /// Copy of this style with centered alignment
    #[must_use]
    pub fn centered(mut self) -> Self {
        self.alignment = Alignment::Center;
        self
    }
}

/// A single cell: value plus style
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    value: CellValue,
    style: CellStyle,
}

impl Cell {
    #[must_use]
    pub fn new(value: CellValue) -> Self {
        Cell {
            value,
            style: CellStyle::default(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn set_value<V: Into<CellValue>>(&mut self, value: V) {
        self.value = value.into();
    }

    #[must_use]
    pub fn style(&self) -> CellStyle {
        self.style
    }

    pub fn set_style(&mut self, style: CellStyle) {
        self.style = style;
    }

    /// Text shown for the cell when no number format applies
    #[must_use]
    pub fn text(&self) -> String {
        self.value.to_string()
    }
}
