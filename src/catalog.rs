//! Cached list of uploaded files, synchronized from the store.

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::notice::Notifier;
use crate::store::{DataStore, FileId, FileRecord};

#[derive(Debug, Default, Clone)]
pub struct FileCatalog {
    files: Vec<FileRecord>,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list with the store's. On failure the cache is kept and the
    /// error is reported.
    pub fn refresh<S, N>(&mut self, store: &S, notifier: &mut N) -> Result<(), StoreError>
    where
        S: DataStore + ?Sized,
        N: Notifier + ?Sized,
    {
        self.sync(store).inspect_err(|e| {
            notifier.error(&format!("Could not load files: {e}"));
        })
    }

    /// Like [`Self::refresh`] but never notifies. Used inside flows that own their
    /// single notice.
    pub fn sync<S>(&mut self, store: &S) -> Result<(), StoreError>
    where
        S: DataStore + ?Sized,
    {
        match store.list() {
            Ok(mut files) => {
                files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                debug!(count = files.len(), "catalog refreshed");
                self.files = files;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "catalog refresh failed");
                Err(e)
            }
        }
    }

    /// Put `record` at the front of the cache, replacing any entry with the same id.
    pub fn insert(&mut self, record: FileRecord) {
        self.files.retain(|f| f.id != record.id);
        self.files.insert(0, record);
    }

    /// Delete `id` from the store, then from the cache. The cache only changes once
    /// the store confirms.
    pub fn remove<S, N>(&mut self, store: &S, id: FileId, notifier: &mut N) -> Result<(), StoreError>
    where
        S: DataStore + ?Sized,
        N: Notifier + ?Sized,
    {
        let name = self
            .get(id)
            .map(|f| f.display_name.clone())
            .unwrap_or_else(|| id.to_string());
        match store.delete(id) {
            Ok(()) => {
                self.files.retain(|f| f.id != id);
                notifier.success(&format!("Deleted {name}"));
                Ok(())
            }
            Err(e) => {
                notifier.error(&format!("Could not delete {name}: {e}"));
                Err(e)
            }
        }
    }

    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Look up by exact id or exact display name. Newest match wins.
    pub fn find(&self, query: &str) -> Option<&FileRecord> {
        if let Ok(id) = query.parse::<FileId>() {
            if let Some(file) = self.get(id) {
                return Some(file);
            }
        }
        self.files.iter().find(|f| f.display_name == query)
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter()
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn newest(&self) -> Option<&FileRecord> {
        self.files.first()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
