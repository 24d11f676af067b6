//! Typed errors for the presentation core.
//!
//! Each component has its own enum so callers can match on exactly the failures
//! that component can produce; [`Error`] wraps them for the controller and CLI.

use thiserror::Error;

use crate::store::FileId;

/// Pagination failures (the `RangeError` family).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("page number must be at least 1")]
    InvalidPageNumber,

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("page {page} is out of range (1-{total_pages})")]
    OutOfRange { page: usize, total_pages: usize },

    #[error("page size {size} is not one of the allowed sizes {allowed:?}")]
    UnsupportedPageSize { size: usize, allowed: Vec<usize> },

    #[error("no file is open")]
    NoFileOpen,
}

/// Client-side upload admission failures. These never reach the data store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("{file_name}: file type not allowed (allowed: {})", allowed.join(", "))]
    RejectedExtension {
        file_name: String,
        allowed: Vec<String>,
    },

    #[error("{file_name}: file too large ({size_bytes} bytes, maximum is {max_bytes} bytes)")]
    RejectedSize {
        file_name: String,
        size_bytes: u64,
        max_bytes: u64,
    },
}

/// Failures reported by a [`crate::store::DataStore`]. Surfaced verbatim to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("upload rejected: {0}")]
    UploadRejected(String),

    #[error("file not found: {0}")]
    NotFound(FileId),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),
}

/// Chart configuration failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("column '{column}' is not available in the active file")]
    InvalidColumn { column: String },

    #[error("chart type, x-axis and y-axis must all be selected")]
    IncompleteConfiguration,

    #[error("unknown chart type '{0}'")]
    UnknownChartType(String),
}

/// Crate-wide error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error("no file is selected")]
    NoActiveFile,

    #[error("no file matches '{0}'")]
    UnknownFile(String),
}

pub type Result<T> = std::result::Result<T, Error>;
