//! Owns the catalog, the active file, the table session and the chart selection.
//!
//! Cross-component cascades live here: deleting the active file resets the table
//! session and the chart before any outstanding fetch can land.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::catalog::FileCatalog;
use crate::chart_spec::{ChartConfiguration, ChartSpec};
use crate::error::{ChartError, Error, PageError, StoreError};
use crate::notice::Notifier;
use crate::render::Renderer;
use crate::store::{DataStore, FileId, FileRecord, PageResult};
use crate::summary::FileSummary;
use crate::table_session::{FetchTicket, PageFetch, TableSession};
use crate::upload_gate::UploadGate;

/// Shown when a chart is generated before all three selections are made.
pub const CHART_NOT_POSSIBLE: &str =
    "This chart is not possible for the selected columns. Please select all options.";

pub struct SessionController<S, N, R> {
    store: S,
    notifier: N,
    renderer: R,
    gate: UploadGate,
    catalog: FileCatalog,
    active: Option<FileId>,
    session: TableSession,
    chart: ChartSpec,
}

impl<S, N, R> SessionController<S, N, R>
where
    S: DataStore,
    N: Notifier,
    R: Renderer,
{
    pub fn new(store: S, notifier: N, renderer: R, gate: UploadGate, session: TableSession) -> Self {
        Self {
            store,
            notifier,
            renderer,
            gate,
            catalog: FileCatalog::new(),
            active: None,
            session,
            chart: ChartSpec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn gate(&self) -> &UploadGate {
        &self.gate
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    pub fn session(&self) -> &TableSession {
        &self.session
    }

    pub fn chart(&self) -> &ChartSpec {
        &self.chart
    }

    /// Chart fields are edited directly; validation happens in [`Self::generate_chart`].
    pub fn chart_mut(&mut self) -> &mut ChartSpec {
        &mut self.chart
    }

    pub fn active_file(&self) -> Option<&FileRecord> {
        self.active.and_then(|id| self.catalog.get(id))
    }

    pub fn refresh(&mut self) -> Result<(), Error> {
        self.catalog.refresh(&self.store, &mut self.notifier)?;
        self.drop_vanished_active();
        Ok(())
    }

    fn drop_vanished_active(&mut self) {
        if let Some(id) = self.active {
            if self.catalog.get(id).is_none() {
                debug!(id = %id, "active file disappeared from the store");
                self.close_active();
            }
        }
    }

    /// Upload through the gate, then refresh the catalog. The gate's notice is the only
    /// one for the attempt; if the refresh fails the new record is added to the cache.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<FileRecord, Error> {
        let record = self
            .gate
            .upload(&self.store, file_name, bytes, &mut self.notifier)?;
        match self.catalog.sync(&self.store) {
            Ok(()) => self.drop_vanished_active(),
            Err(e) => {
                warn!(error = %e, id = %record.id, "catalog refresh after upload failed");
                self.catalog.insert(record.clone());
            }
        }
        Ok(record)
    }

    /// Upload a file from disk. Admission runs on the file's metadata before reading it.
    pub fn upload_path(&mut self, path: &Path) -> Result<FileRecord, Error> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => return Err(self.unreadable(path, e)),
        };
        if let Err(e) = self.gate.admit(&file_name, size) {
            self.notifier.error(&e.to_string());
            return Err(e.into());
        }
        match fs::read(path) {
            Ok(bytes) => self.upload(&file_name, &bytes),
            Err(e) => Err(self.unreadable(path, e)),
        }
    }

    fn unreadable(&mut self, path: &Path, err: std::io::Error) -> Error {
        let message = format!("Could not read {}: {}", path.display(), err);
        self.notifier.error(&message);
        StoreError::UploadRejected(message).into()
    }

    /// Make `id` the active file and load its first page.
    pub fn open(&mut self, id: FileId) -> Result<PageFetch, Error> {
        let record = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownFile(id.to_string()))?;
        if self.active != Some(id) {
            self.chart.reset();
        }
        self.active = Some(id);
        info!(id = %id, name = %record.display_name, "file opened");
        Ok(self.session.open(&record))
    }

    /// Open by id or display name.
    pub fn open_query(&mut self, query: &str) -> Result<PageFetch, Error> {
        let id = self
            .catalog
            .find(query)
            .map(|f| f.id)
            .ok_or_else(|| Error::UnknownFile(query.to_string()))?;
        self.open(id)
    }

    fn navigate(
        &mut self,
        step: impl FnOnce(&mut TableSession) -> Result<Option<PageFetch>, PageError>,
    ) -> Result<Option<PageFetch>, Error> {
        step(&mut self.session).map_err(|e| {
            self.notifier.error(&e.to_string());
            Error::from(e)
        })
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<Option<PageFetch>, Error> {
        self.navigate(|s| s.set_page_size(page_size))
    }

    pub fn go_to(&mut self, page_number: usize) -> Result<Option<PageFetch>, Error> {
        self.navigate(|s| s.go_to(page_number))
    }

    pub fn next_page(&mut self) -> Result<Option<PageFetch>, Error> {
        self.navigate(TableSession::next_page)
    }

    pub fn prev_page(&mut self) -> Result<Option<PageFetch>, Error> {
        self.navigate(TableSession::prev_page)
    }

    pub fn first_page(&mut self) -> Result<Option<PageFetch>, Error> {
        self.navigate(TableSession::first_page)
    }

    pub fn last_page(&mut self) -> Result<Option<PageFetch>, Error> {
        self.navigate(TableSession::last_page)
    }

    pub fn retry(&mut self) -> Option<PageFetch> {
        self.session.retry()
    }

    /// Hand a fetch outcome to the session. Returns false for stale tickets.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: Result<PageResult, StoreError>) -> bool {
        self.session
            .complete(ticket, outcome, &mut self.notifier, &mut self.renderer)
    }

    /// Run `fetch` against the store on the calling thread.
    pub fn execute(&mut self, fetch: PageFetch) -> bool {
        let outcome = self.store.fetch_page(&fetch.request);
        self.complete(fetch.ticket, outcome)
    }

    /// Run `fetch` if there is one. Convenience for synchronous callers.
    pub fn execute_opt(&mut self, fetch: Option<PageFetch>) -> bool {
        fetch.is_some_and(|f| self.execute(f))
    }

    /// Delete a file. If it is the active one, the table and chart are reset.
    pub fn delete_file(&mut self, id: FileId) -> Result<(), Error> {
        self.catalog
            .remove(&self.store, id, &mut self.notifier)?;
        if self.active == Some(id) {
            self.close_active();
        }
        Ok(())
    }

    fn close_active(&mut self) {
        self.active = None;
        self.session.reset();
        self.chart.reset();
        self.renderer.clear();
    }

    /// Validate the chart selection against the active file and render it.
    pub fn generate_chart(&mut self) -> Result<ChartConfiguration, Error> {
        let Some(columns) = self.active_file().map(FileRecord::column_names) else {
            self.notifier.error(&Error::NoActiveFile.to_string());
            return Err(Error::NoActiveFile);
        };
        match self.chart.generate(&columns, &mut self.renderer) {
            Ok(config) => Ok(config.clone()),
            Err(e) => {
                let message = match &e {
                    ChartError::IncompleteConfiguration => CHART_NOT_POSSIBLE.to_string(),
                    other => other.to_string(),
                };
                self.notifier.error(&message);
                Err(e.into())
            }
        }
    }

    pub fn summary(&mut self, id: FileId) -> Result<FileSummary, Error> {
        self.store.summarize(id).map_err(|e| {
            self.notifier.error(&e.to_string());
            Error::from(e)
        })
    }
}
