use std::fmt;

use serde::{Serialize, Serializer};

pub const TEAM_COLUMN: &str = "Team";

/// Which naming vocabulary a table's team column uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Vocabulary {
    /// Stats-site spelling, already canonical.
    Ncaa,
    /// Ratings-site spelling, resolved through the alias table.
    Ratings,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Missing,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) | Self::Missing => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Equality that treats two NaN floats as equal.
    pub fn same_value(&self, other: &Cell) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_nan() => f.write_str("NaN"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Missing => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(v) => serializer.serialize_str(v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float(_) | Self::Missing => serializer.serialize_none(),
        }
    }
}

/// Header plus rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Serialize)]
pub struct StatTable {
    pub name: String,
    pub vocabulary: Vocabulary,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl StatTable {
    pub fn new(name: impl Into<String>, vocabulary: Vocabulary, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            vocabulary,
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table of raw text cells. Short rows are padded with empty
    /// text, long rows truncated, so the width invariant holds.
    pub fn from_raw(
        name: impl Into<String>,
        vocabulary: Vocabulary,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells: Vec<Cell> = row.into_iter().take(width).map(Cell::Text).collect();
                cells.resize(width, Cell::text(""));
                cells
            })
            .collect();
        Self {
            name: name.into(),
            vocabulary,
            columns,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn value(&self, team: &str, column: &str) -> Option<&Cell> {
        let key = self.column_index(TEAM_COLUMN)?;
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| row.get(key).and_then(Cell::as_str) == Some(team))
            .and_then(|row| row.get(idx))
    }

    pub fn teams(&self) -> Vec<String> {
        let Some(key) = self.column_index(TEAM_COLUMN) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| row.get(key).and_then(Cell::as_str).map(str::to_string))
            .collect()
    }

    /// Sets `column` from one value per row, appending the column if new.
    pub fn set_column(&mut self, column: &str, values: Vec<Cell>) {
        match self.column_index(column) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(column.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    pub fn drop_column(&mut self, column: &str) {
        if let Some(idx) = self.column_index(column) {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if self.has_column(to) {
            return;
        }
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }
}
