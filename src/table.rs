use std::io::Read;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::inference::{is_missing, parse_integer, parse_numeric, KindInferencer};
use crate::types::Result;

/// Declared value kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        }
    }
}

/// Homogeneous cell storage; `None` is a missing cell
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Integer(_) => ColumnKind::Integer,
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    /// Render one cell for flat-file export; missing cells are empty
    pub fn format_cell(&self, row: usize) -> String {
        match self {
            ColumnData::Integer(v) => v[row].map(|n| n.to_string()).unwrap_or_default(),
            ColumnData::Float(v) => v[row].map(|f| f.to_string()).unwrap_or_default(),
            ColumnData::Text(v) => v[row].clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Ordered, named, equal-length columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, data: ColumnData) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(Error::DuplicateColumn(name));
        }

        if self.columns.is_empty() {
            self.row_count = data.len();
        } else if data.len() != self.row_count {
            return Err(Error::ColumnLength {
                column: name,
                expected: self.row_count,
                actual: data.len(),
            });
        }

        self.columns.push(Column { name, data });
        Ok(())
    }

    /// Remove a column by name; an emptied table keeps its row count
    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn data_mut(&mut self, name: &str) -> Result<&mut ColumnData> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.data)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    fn data(&self, name: &str) -> Result<&ColumnData> {
        self.column(name)
            .map(|c| &c.data)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn integers(&self, name: &str) -> Result<&[Option<i64>]> {
        match self.data(name)? {
            ColumnData::Integer(v) => Ok(v),
            other => Err(kind_error(name, ColumnKind::Integer, other.kind())),
        }
    }

    pub fn integers_mut(&mut self, name: &str) -> Result<&mut [Option<i64>]> {
        match self.data_mut(name)? {
            ColumnData::Integer(v) => Ok(v),
            other => Err(kind_error(name, ColumnKind::Integer, other.kind())),
        }
    }

    #[cfg(test)]
    pub fn floats(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.data(name)? {
            ColumnData::Float(v) => Ok(v),
            other => Err(kind_error(name, ColumnKind::Float, other.kind())),
        }
    }

    pub fn floats_mut(&mut self, name: &str) -> Result<&mut [Option<f64>]> {
        match self.data_mut(name)? {
            ColumnData::Float(v) => Ok(v),
            other => Err(kind_error(name, ColumnKind::Float, other.kind())),
        }
    }

    /// Read a headed CSV table. Columns get the kind returned by `declared`,
    /// or an inferred kind when it returns `None`.
    pub fn read_csv<R, F>(reader: R, declared: F) -> Result<Self>
    where
        R: Read,
        F: Fn(&str) -> Option<ColumnKind>,
    {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for result in csv_reader.records() {
            let record = result?;
            for (col_idx, field) in record.iter().enumerate() {
                cells[col_idx].push(field.to_string());
            }
        }

        let mut table = ResultTable::new();
        for (header, raw) in headers.into_iter().zip(cells) {
            let kind = declared(&header).unwrap_or_else(|| {
                let mut inf = KindInferencer::new();
                raw.iter().for_each(|v| inf.observe(v));
                inf.inferred_kind()
            });
            let data = parse_column(&header, kind, &raw)?;
            table.push_column(header, data)?;
        }

        Ok(table)
    }
}

fn kind_error(column: &str, expected: ColumnKind, actual: ColumnKind) -> Error {
    Error::ColumnKind {
        column: column.to_string(),
        expected: expected.as_str(),
        actual: actual.as_str(),
    }
}

fn parse_column(name: &str, kind: ColumnKind, raw: &[String]) -> Result<ColumnData> {
    let bad_cell = |row: usize, value: &str| {
        Error::InvalidInput(format!(
            "column '{}' row {}: '{}' is not {}",
            name,
            row + 1,
            value,
            kind.as_str()
        ))
    };

    let data = match kind {
        ColumnKind::Integer => ColumnData::Integer(
            raw.iter()
                .enumerate()
                .map(|(row, v)| {
                    if is_missing(v) {
                        Ok(None)
                    } else {
                        parse_integer(v).map(Some).ok_or_else(|| bad_cell(row, v))
                    }
                })
                .collect::<Result<_>>()?,
        ),
        ColumnKind::Float => ColumnData::Float(
            raw.iter()
                .enumerate()
                .map(|(row, v)| {
                    if is_missing(v) {
                        Ok(None)
                    } else {
                        parse_numeric(v).map(Some).ok_or_else(|| bad_cell(row, v))
                    }
                })
                .collect::<Result<_>>()?,
        ),
        // Missing tokens only apply to numeric cells; text keeps values such as "NA"
        ColumnKind::Text => ColumnData::Text(
            raw.iter()
                .map(|v| if v.is_empty() { None } else { Some(v.clone()) })
                .collect(),
        ),
    };

    Ok(data)
}
