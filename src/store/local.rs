//! Filesystem-backed [`DataStore`].
//!
//! Layout under the data directory:
//!
//! ```text
//! catalog/<id>.json   one FileRecord per upload
//! files/<id>.csv      the uploaded data, normalized to CSV
//! ```

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use fs2::FileExt;
use polars::prelude::*;
use tracing::{debug, info, warn};

use super::excel;
use super::{CellValue, ColumnInfo, ColumnKind, DataStore, FileId, FileRecord, PageRequest, PageResult};
use crate::error::StoreError;
use crate::error_display::{user_message_from_io, user_message_from_polars};
use crate::summary::{summarize_frame, FileSummary};

const CATALOG_DIR: &str = "catalog";
const FILES_DIR: &str = "files";

#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    /// Directories are created lazily on first upload.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join(CATALOG_DIR)
    }

    fn files_dir(&self) -> PathBuf {
        self.data_dir.join(FILES_DIR)
    }

    fn record_path(&self, id: FileId) -> PathBuf {
        self.catalog_dir().join(format!("{id}.json"))
    }

    fn data_path(&self, id: FileId) -> PathBuf {
        self.files_dir().join(format!("{id}.csv"))
    }

    fn read_record(&self, id: FileId) -> Result<FileRecord, StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }
        let content =
            fs::read_to_string(&path).map_err(|e| StoreError::FetchFailed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StoreError::FetchFailed(e.to_string()))
    }

    fn write_record(&self, record: &FileRecord) -> std::io::Result<()> {
        fs::create_dir_all(self.catalog_dir())?;
        let json = serde_json::to_string_pretty(record)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.record_path(record.id))?;

        file.lock_exclusive()?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        file.unlock()?;
        Ok(())
    }

    fn scan(&self, id: FileId) -> PolarsResult<LazyFrame> {
        let path = self.data_path(id);
        let pl_path = PlPath::Local(Arc::from(path.as_path()));
        LazyCsvReader::new(pl_path)
            .with_has_header(true)
            .with_try_parse_dates(true)
            .finish()
    }
}

/// Parse CSV bytes eagerly so malformed uploads are rejected before anything is written.
fn parse_csv(bytes: &[u8]) -> PolarsResult<DataFrame> {
    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true));
    CsvReader::new(Cursor::new(bytes.to_vec()))
        .with_options(read_options)
        .finish()
}

fn columns_of(schema: &Schema) -> Vec<ColumnInfo> {
    schema
        .iter()
        .map(|(name, dtype)| ColumnInfo::new(name.to_string(), ColumnKind::from_dtype(dtype)))
        .collect()
}

fn row_count(lf: &LazyFrame) -> PolarsResult<usize> {
    let count_df = lf.clone().select([len()]).collect()?;
    let n = match count_df.get_columns().first().map(|c| c.get(0)) {
        Some(Ok(AnyValue::UInt32(n))) => n as usize,
        Some(Ok(AnyValue::UInt64(n))) => n as usize,
        _ => 0,
    };
    Ok(n)
}

/// Convert one polars value to a cell, using the column kind to pick the representation.
pub(crate) fn cell_from_any(value: AnyValue<'_>, kind: ColumnKind) -> CellValue {
    if value.is_null() {
        return CellValue::Null;
    }
    match kind {
        ColumnKind::Integer => value
            .extract::<i64>()
            .map(CellValue::Int)
            .unwrap_or_else(|| CellValue::Text(value.str_value().into_owned())),
        ColumnKind::Float => value
            .extract::<f64>()
            .map(CellValue::Float)
            .unwrap_or_else(|| CellValue::Text(value.str_value().into_owned())),
        ColumnKind::Boolean => match value {
            AnyValue::Boolean(b) => CellValue::Bool(b),
            other => CellValue::Text(other.str_value().into_owned()),
        },
        ColumnKind::Temporal | ColumnKind::Text => CellValue::Text(value.str_value().into_owned()),
    }
}

fn frame_rows(df: &DataFrame, columns: &[ColumnInfo]) -> PolarsResult<Vec<Vec<CellValue>>> {
    let series: Vec<&Series> = df
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series())
        .collect();
    let mut rows = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let mut row = Vec::with_capacity(series.len());
        for (s, info) in series.iter().zip(columns) {
            row.push(cell_from_any(s.get(row_idx)?, info.kind));
        }
        rows.push(row);
    }
    Ok(rows)
}

impl DataStore for LocalStore {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<FileRecord, StoreError> {
        let csv_bytes = if excel::is_spreadsheet(file_name) {
            excel::worksheet_to_csv(bytes)?
        } else {
            bytes.to_vec()
        };

        let df = parse_csv(&csv_bytes).map_err(|e| {
            warn!(file_name, error = %e, "upload rejected");
            StoreError::UploadRejected(user_message_from_polars(&e))
        })?;
        if df.width() == 0 {
            return Err(StoreError::UploadRejected(format!(
                "{file_name} has no columns"
            )));
        }

        let record = FileRecord {
            id: FileId::random(),
            display_name: file_name.to_string(),
            size_bytes: bytes.len() as u64,
            row_count: df.height(),
            columns: columns_of(df.schema()),
            created_at: Utc::now(),
        };

        fs::create_dir_all(self.files_dir())
            .and_then(|_| fs::write(self.data_path(record.id), &csv_bytes))
            .map_err(|e| StoreError::UploadRejected(user_message_from_io(&e, None)))?;
        if let Err(e) = self.write_record(&record) {
            let _ = fs::remove_file(self.data_path(record.id));
            return Err(StoreError::UploadRejected(user_message_from_io(&e, None)));
        }

        info!(id = %record.id, file_name, rows = record.row_count, "file uploaded");
        Ok(record)
    }

    fn list(&self) -> Result<Vec<FileRecord>, StoreError> {
        let dir = self.catalog_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::FetchFailed(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::FetchFailed(e.to_string()))?;
            let path = entry.path();
            if !(path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")) {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|content| {
                    serde_json::from_str::<FileRecord>(&content).map_err(|e| e.to_string())
                }) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable catalog entry"),
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, StoreError> {
        let record = self.read_record(request.file_id)?;
        if !self.data_path(request.file_id).exists() {
            return Err(StoreError::NotFound(request.file_id));
        }
        let fetch_failed = |e: PolarsError| StoreError::FetchFailed(user_message_from_polars(&e));

        let lf = self.scan(request.file_id).map_err(fetch_failed)?;
        let total_row_count = row_count(&lf).map_err(fetch_failed)?;
        let offset = request
            .page_number
            .saturating_sub(1)
            .saturating_mul(request.page_size);
        let len = u32::try_from(request.page_size).unwrap_or(u32::MAX);
        let df = lf
            .slice(offset.min(i64::MAX as usize) as i64, len)
            .collect()
            .map_err(fetch_failed)?;
        let rows = frame_rows(&df, &record.columns).map_err(fetch_failed)?;

        debug!(
            id = %request.file_id,
            page = request.page_number,
            size = request.page_size,
            rows = rows.len(),
            "page fetched"
        );
        Ok(PageResult {
            page_number: request.page_number,
            page_size: request.page_size,
            total_row_count,
            columns: record.columns,
            rows,
        })
    }

    fn delete(&self, id: FileId) -> Result<(), StoreError> {
        let record_path = self.record_path(id);
        if !record_path.exists() {
            return Err(StoreError::NotFound(id));
        }
        fs::remove_file(&record_path)
            .map_err(|e| StoreError::DeleteFailed(user_message_from_io(&e, None)))?;

        let data_path = self.data_path(id);
        if data_path.exists() {
            if let Err(e) = fs::remove_file(&data_path) {
                warn!(id = %id, error = %e, "could not remove data file");
            }
        }
        info!(id = %id, "file deleted");
        Ok(())
    }

    fn summarize(&self, id: FileId) -> Result<FileSummary, StoreError> {
        self.read_record(id)?;
        let fetch_failed = |e: PolarsError| StoreError::FetchFailed(user_message_from_polars(&e));
        let df = self
            .scan(id)
            .and_then(|lf| lf.collect())
            .map_err(fetch_failed)?;
        summarize_frame(id, &df).map_err(fetch_failed)
    }
}
