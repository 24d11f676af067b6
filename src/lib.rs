//! csvdeck: upload tabular files into a local store, page through them,
//! summarize their columns and validate chart selections.
//!
//! The data-facing pieces ([`TableSession`], [`ChartSpec`], [`UploadGate`],
//! [`FileCatalog`]) do no I/O of their own. They talk to a [`DataStore`] and
//! report through a [`Notifier`] and a [`Renderer`], so the same logic drives
//! both the command line and the terminal browser.

pub mod app;
pub mod cache;
pub mod catalog;
pub mod chart_spec;
pub mod config;
pub mod controller;
pub mod error;
pub mod error_display;
pub mod format;
pub mod logging;
pub mod notice;
pub mod page_window;
pub mod render;
pub mod store;
pub mod summary;
pub mod table_session;
pub mod upload_gate;
pub mod widgets;

pub use cache::CacheManager;
pub use catalog::FileCatalog;
pub use chart_spec::{ChartConfiguration, ChartSpec, ChartType};
pub use config::{AppConfig, ConfigManager};
pub use controller::SessionController;
pub use error::{AdmissionError, ChartError, Error, PageError, StoreError};
pub use notice::{ConsoleNotifier, Notice, NoticeKind, NoticeLog, Notifier};
pub use page_window::{compute_window, PageWindow};
pub use render::{RecordingRenderer, Rendered, Renderer};
pub use store::{
    CellValue, ColumnInfo, ColumnKind, DataStore, FileId, FileRecord, LocalStore, PageRequest,
    PageResult,
};
pub use summary::FileSummary;
pub use table_session::{FetchTicket, PageFetch, SessionState, TableSession};
pub use upload_gate::UploadGate;

/// Application name used for config, cache and data directories
pub const APP_NAME: &str = "csvdeck";
