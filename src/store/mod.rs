//! Data Store interface and the record types that cross it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::summary::FileSummary;

pub mod excel;
pub mod local;

pub use local::LocalStore;

/// Opaque identifier of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    /// A fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Column kind as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Temporal,
    Text,
}

impl ColumnKind {
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_integer() {
            ColumnKind::Integer
        } else if dtype.is_float() {
            ColumnKind::Float
        } else if dtype.is_bool() {
            ColumnKind::Boolean
        } else if dtype.is_temporal() {
            ColumnKind::Temporal
        } else {
            ColumnKind::Text
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: FileId,
    pub display_name: String,
    pub size_bytes: u64,
    pub row_count: usize,
    pub columns: Vec<ColumnInfo>,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

/// One scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(v) => write!(f, "{v}"),
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(v) => f.write_str(v),
        }
    }
}

/// A request for one page of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub file_id: FileId,
    pub page_number: usize,
    pub page_size: usize,
}

/// One page of rows, plus the file's column list and total row count.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub page_number: usize,
    pub page_size: usize,
    pub total_row_count: usize,
    pub columns: Vec<ColumnInfo>,
    /// Row-major cells, ordered like `columns`.
    pub rows: Vec<Vec<CellValue>>,
}

impl PageResult {
    /// Cell at `row` for the column named `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Rows as (column name, value) records.
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &CellValue)>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(|c| c.name.as_str())
                .zip(row.iter())
                .collect()
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Backing store for uploaded files.
///
/// Implementations take `&self` so one store can be shared between the UI
/// thread and a fetch worker.
pub trait DataStore {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<FileRecord, StoreError>;

    /// All records, newest first.
    fn list(&self) -> Result<Vec<FileRecord>, StoreError>;

    fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, StoreError>;

    fn delete(&self, id: FileId) -> Result<(), StoreError>;

    fn summarize(&self, id: FileId) -> Result<FileSummary, StoreError>;
}

impl<T: DataStore + ?Sized> DataStore for std::sync::Arc<T> {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<FileRecord, StoreError> {
        (**self).upload(file_name, bytes)
    }

    fn list(&self) -> Result<Vec<FileRecord>, StoreError> {
        (**self).list()
    }

    fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, StoreError> {
        (**self).fetch_page(request)
    }

    fn delete(&self, id: FileId) -> Result<(), StoreError> {
        (**self).delete(id)
    }

    fn summarize(&self, id: FileId) -> Result<FileSummary, StoreError> {
        (**self).summarize(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_round_trips_through_string() {
        let id = FileId::random();
        let parsed: FileId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<FileId>().is_err());
    }

    #[test]
    fn column_kind_from_polars_dtype() {
        assert_eq!(ColumnKind::from_dtype(&DataType::Int64), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_dtype(&DataType::Float64), ColumnKind::Float);
        assert_eq!(ColumnKind::from_dtype(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(ColumnKind::from_dtype(&DataType::Date), ColumnKind::Temporal);
        assert_eq!(ColumnKind::from_dtype(&DataType::String), ColumnKind::Text);
    }

    #[test]
    fn page_result_value_lookup() {
        let page = PageResult {
            page_number: 1,
            page_size: 5,
            total_row_count: 1,
            columns: vec![
                ColumnInfo::new("region", ColumnKind::Text),
                ColumnInfo::new("sales", ColumnKind::Integer),
            ],
            rows: vec![vec![CellValue::Text("east".into()), CellValue::Int(10)]],
        };
        assert_eq!(page.value(0, "sales"), Some(&CellValue::Int(10)));
        assert_eq!(page.value(0, "missing"), None);
        assert_eq!(page.value(1, "sales"), None);
        let records: Vec<_> = page.records().collect();
        assert_eq!(records[0][0], ("region", &CellValue::Text("east".into())));
    }
}
