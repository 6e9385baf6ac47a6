//! Record shapes: explicit, ordered field descriptors used to move typed
//! records in and out of grids.

use crate::error::{Result, SheetError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Bool,
}

/// A field value crossing the record/grid boundary
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Take the value as text, rendering non-text values
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Interpret the value as an integer
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            FieldValue::Int(i) => Ok(*i),
            FieldValue::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            FieldValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| SheetError::Parse(format!("'{s}' is not an integer"))),
            other => Err(SheetError::Parse(format!("{other:?} is not an integer"))),
        }
    }

    /// Interpret the value as a float
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            FieldValue::Int(i) => Ok(*i as f64),
            FieldValue::Float(f) => Ok(*f),
            FieldValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| SheetError::Parse(format!("'{s}' is not a number"))),
            other => Err(SheetError::Parse(format!("{other:?} is not a number"))),
        }
    }

    /// Interpret the value as a boolean (`true`/`false`, case-insensitive)
    pub fn to_bool(&self) -> Result<bool> {
        match self {
            FieldValue::Bool(b) => Ok(*b),
            FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(SheetError::Parse(format!("'{s}' is not a boolean"))),
            },
            other => Err(SheetError::Parse(format!("{other:?} is not a boolean"))),
        }
    }

    /// Interpret the value as a date
    pub fn to_date(&self) -> Result<NaiveDateTime> {
        match self {
            FieldValue::Date(d) => Ok(*d),
            other => Err(SheetError::Parse(format!("{other:?} is not a date"))),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, ""),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(fl) => write!(f, "{fl}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(d: NaiveDateTime) -> Self {
        FieldValue::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => FieldValue::Null,
        }
    }
}

/// Reads a field out of a record
pub type Getter<R> = fn(&R) -> FieldValue;

/// Stores a field into a record
pub type Setter<R> = fn(&mut R, FieldValue) -> Result<()>;

/// One field of a record shape
pub struct FieldDescriptor<R> {
    name: String,
    kind: FieldKind,
    exported: bool,
    get: Getter<R>,
    set: Setter<R>,
}

impl<R> FieldDescriptor<R> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether exports with an exclusion list write this field
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    #[must_use]
    pub fn get(&self, record: &R) -> FieldValue {
        (self.get)(record)
    }

    pub fn set(&self, record: &mut R, value: FieldValue) -> Result<()> {
        (self.set)(record, value)
    }
}

impl<R> Clone for FieldDescriptor<R> {
    fn clone(&self) -> Self {
        FieldDescriptor {
            name: self.name.clone(),
            kind: self.kind,
            exported: self.exported,
            get: self.get,
            set: self.set,
        }
    }
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("exported", &self.exported)
            .finish_non_exhaustive()
    }
}

/// Ordered field descriptors for records of type `R`.
///
/// Field order is the column order used by imports and by exports with an
/// exclusion list.
///
/// ```
/// use sheetmap_sheet::{FieldValue, RecordShape};
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// let shape = RecordShape::<Person>::new()
///     .text("name", |p| p.name.clone().into(), |p, v| {
///         p.name = v.into_text();
///         Ok(())
///     })
///     .number("age", |p| p.age.into(), |p, v| {
///         p.age = v.to_i64()?;
///         Ok(())
///     });
///
/// assert_eq!(shape.field_names(), vec!["name", "age"]);
/// ```
pub struct RecordShape<R> {
    fields: Vec<FieldDescriptor<R>>,
}

impl<R> RecordShape<R> {
    #[must_use]
    pub fn new() -> Self {
        RecordShape { fields: Vec::new() }
    }

    /// Append a field
    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        get: Getter<R>,
        set: Setter<R>,
    ) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
            exported: true,
            get,
            set,
        });
        self
    }

    #[must_use]
    pub fn text(self, name: impl Into<String>, get: Getter<R>, set: Setter<R>) -> Self {
        self.field(name, FieldKind::Text, get, set)
    }

    #[must_use]
    pub fn number(self, name: impl Into<String>, get: Getter<R>, set: Setter<R>) -> Self {
        self.field(name, FieldKind::Number, get, set)
    }

    #[must_use]
    pub fn date(self, name: impl Into<String>, get: Getter<R>, set: Setter<R>) -> Self {
        self.field(name, FieldKind::Date, get, set)
    }

    #[must_use]
    pub fn boolean(self, name: impl Into<String>, get: Getter<R>, set: Setter<R>) -> Self {
        self.field(name, FieldKind::Bool, get, set)
    }

    /// Mark the most recently added field as bookkeeping: it is still
    /// imported but never written by exclusion-list exports.
    #[must_use]
    pub fn bookkeeping(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.exported = false;
        }
        self
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor<R>] {
        &self.fields
    }

    /// Look a field up by name
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<R> Default for RecordShape<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for RecordShape<R> {
    fn clone(&self) -> Self {
        RecordShape {
            fields: self.fields.clone(),
        }
    }
}

impl<R> fmt::Debug for RecordShape<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}
