//! Definitions to help handling CSV data as a set of records.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};

/// The value of a single cell, inferred from its text.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Infers the type of a field: integer first, then floating-point, then
    /// text. Blank fields are `Missing`.
    #[must_use]
    pub fn infer(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            Self::Missing
        } else if let Ok(v) = trimmed.parse::<i64>() {
            Self::Int(v)
        } else {
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_finite() => Self::Float(v),
                _ => Self::Text(field.to_string()),
            }
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns the value as `f64` if it is numeric.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // 52-bit precision is good enough
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) | Self::Missing => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{}", x),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(x) => write!(f, "{}", x),
            Self::Missing => Ok(()),
        }
    }
}

/// A single field: the text as read from the file and the value inferred
/// from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    text: String,
    value: Value,
}

impl Cell {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let value = Value::infer(&text);
        Self { text, value }
    }

    /// Returns the field exactly as it appeared in the input.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// An ordered sequence of records sharing the same column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Creates a `Dataset` from a header and rows of cells.
    ///
    /// # Errors
    ///
    /// Returns an error if a column name is repeated, or a row does not have
    /// exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        check_header(&columns)?;
        if let Some(i) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(Error::schema(
                i + 1,
                format!(
                    "expected {} fields, found {}",
                    columns.len(),
                    rows[i].len()
                ),
            ));
        }
        Ok(Self { columns, rows })
    }

    /// Creates a `Dataset` without checking row widths.
    #[cfg(test)]
    pub(crate) fn new_unchecked(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn record(&self, i: usize) -> Option<Record<'_>> {
        self.rows.get(i).map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    /// Returns an `Iterator` over the records in file order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

/// A single row, viewed as a mapping from column name to value.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> Record<'a> {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.value(i))
    }

    #[inline]
    #[must_use]
    pub fn value(&self, i: usize) -> Option<&'a Value> {
        self.cells.get(i).map(Cell::value)
    }

    #[inline]
    #[must_use]
    pub fn cell(&self, i: usize) -> Option<&'a Cell> {
        self.cells.get(i)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Cell::value))
    }

    pub fn cells(&self) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells.iter()
    }
}

/// Fails if a column name appears more than once.
pub(crate) fn check_header(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(Error::schema(
                0,
                format!("duplicate column name `{}`", name),
            ));
        }
    }
    Ok(())
}
