#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use csvdeck::error::StoreError;
use csvdeck::page_window::rows_on_page;
use csvdeck::summary::FileSummary;
use csvdeck::{
    CellValue, ColumnInfo, ColumnKind, DataStore, FileId, FileRecord, PageRequest, PageResult,
};

pub const SALES_CSV: &str = "\
region,units,price,active
north,10,2.5,true
south,4,3.25,false
east,7,,true
west,,1.0,true
north,3,2.5,false
";

/// `rows` rows of `id,label`, numbered from 1.
pub fn numbered_csv(rows: usize) -> String {
    let mut out = String::from("id,label\n");
    for i in 1..=rows {
        out.push_str(&format!("{},row {}\n", i, i));
    }
    out
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub upload: usize,
    pub list: usize,
    pub fetch: usize,
    pub delete: usize,
    pub summarize: usize,
}

/// In-memory store with call counters and switchable failures.
#[derive(Default)]
pub struct ScriptedStore {
    files: Mutex<Vec<(FileRecord, Vec<Vec<CellValue>>)>>,
    uploads: AtomicUsize,
    calls: Mutex<CallCounts>,
    pub fail_list: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_upload: AtomicBool,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with `row_count` rows of `id` (integer) and `label` (text).
    pub fn with_numbered_file(self, name: &str, row_count: usize) -> Self {
        self.insert(name, row_count);
        self
    }

    pub fn insert(&self, name: &str, row_count: usize) -> FileRecord {
        let rows = (1..=row_count)
            .map(|i| {
                vec![
                    CellValue::Int(i as i64),
                    CellValue::Text(format!("row {}", i)),
                ]
            })
            .collect();
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) as i64;
        let record = FileRecord {
            id: FileId::random(),
            display_name: name.to_string(),
            size_bytes: 100 * row_count as u64,
            row_count,
            columns: vec![
                ColumnInfo::new("id", ColumnKind::Integer),
                ColumnInfo::new("label", ColumnKind::Text),
            ],
            created_at: base_time() + Duration::minutes(n),
        };
        self.files.lock().unwrap().push((record.clone(), rows));
        record
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }
}

impl DataStore for ScriptedStore {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<FileRecord, StoreError> {
        self.calls.lock().unwrap().upload += 1;
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(StoreError::UploadRejected("store is read-only".to_string()));
        }
        let text = String::from_utf8_lossy(bytes);
        let rows = text.lines().count().saturating_sub(1);
        let mut record = self.insert(file_name, rows);
        record.size_bytes = bytes.len() as u64;
        if let Some(entry) = self
            .files
            .lock()
            .unwrap()
            .iter_mut()
            .find(|(r, _)| r.id == record.id)
        {
            entry.0.size_bytes = record.size_bytes;
        }
        Ok(record)
    }

    fn list(&self) -> Result<Vec<FileRecord>, StoreError> {
        self.calls.lock().unwrap().list += 1;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::FetchFailed("catalog unavailable".to_string()));
        }
        let mut files: Vec<FileRecord> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.clone())
            .collect();
        files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(files)
    }

    fn fetch_page(&self, request: &PageRequest) -> Result<PageResult, StoreError> {
        self.calls.lock().unwrap().fetch += 1;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::FetchFailed("connection reset".to_string()));
        }
        let files = self.files.lock().unwrap();
        let (record, rows) = files
            .iter()
            .find(|(r, _)| r.id == request.file_id)
            .ok_or(StoreError::NotFound(request.file_id))?;
        let offset = (request.page_number - 1) * request.page_size;
        let len = rows_on_page(request.page_number, request.page_size, rows.len());
        Ok(PageResult {
            page_number: request.page_number,
            page_size: request.page_size,
            total_row_count: rows.len(),
            columns: record.columns.clone(),
            rows: rows.iter().skip(offset).take(len).cloned().collect(),
        })
    }

    fn delete(&self, id: FileId) -> Result<(), StoreError> {
        self.calls.lock().unwrap().delete += 1;
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::DeleteFailed("permission denied".to_string()));
        }
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|(r, _)| r.id != id);
        if files.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn summarize(&self, id: FileId) -> Result<FileSummary, StoreError> {
        self.calls.lock().unwrap().summarize += 1;
        let files = self.files.lock().unwrap();
        let (record, rows) = files
            .iter()
            .find(|(r, _)| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(FileSummary {
            file_id: id,
            row_count: rows.len(),
            column_count: record.columns.len(),
            columns: Vec::new(),
        })
    }
}
