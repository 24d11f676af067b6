//! Client-side admission checks in front of the store.

use tracing::info;

use crate::error::{AdmissionError, Error};
use crate::notice::Notifier;
use crate::store::{DataStore, FileRecord};

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadGate {
    /// Lowercase, with the leading dot (".csv").
    accepted_extensions: Vec<String>,
    max_size_bytes: u64,
}

impl Default for UploadGate {
    fn default() -> Self {
        Self::new(vec![".csv".to_string()], DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024)
    }
}

impl UploadGate {
    /// Extensions are normalized to lowercase with a leading dot.
    pub fn new(accepted_extensions: Vec<String>, max_size_bytes: u64) -> Self {
        let accepted_extensions = accepted_extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self {
            accepted_extensions,
            max_size_bytes,
        }
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.accepted_extensions
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Extension first, then size.
    pub fn admit(&self, file_name: &str, size_bytes: u64) -> Result<(), AdmissionError> {
        let lower = file_name.to_lowercase();
        if !self
            .accepted_extensions
            .iter()
            .any(|ext| lower.ends_with(ext.as_str()))
        {
            return Err(AdmissionError::RejectedExtension {
                file_name: file_name.to_string(),
                allowed: self.accepted_extensions.clone(),
            });
        }
        if size_bytes > self.max_size_bytes {
            return Err(AdmissionError::RejectedSize {
                file_name: file_name.to_string(),
                size_bytes,
                max_bytes: self.max_size_bytes,
            });
        }
        Ok(())
    }

    /// Admit, then hand the bytes to the store. Emits exactly one notice per call.
    pub fn upload<S, N>(
        &self,
        store: &S,
        file_name: &str,
        bytes: &[u8],
        notifier: &mut N,
    ) -> Result<FileRecord, Error>
    where
        S: DataStore + ?Sized,
        N: Notifier + ?Sized,
    {
        if let Err(e) = self.admit(file_name, bytes.len() as u64) {
            info!(file_name, error = %e, "upload refused before reaching the store");
            notifier.error(&e.to_string());
            return Err(e.into());
        }
        match store.upload(file_name, bytes) {
            Ok(record) => {
                notifier.success(&format!("{} uploaded successfully", record.display_name));
                Ok(record)
            }
            Err(e) => {
                notifier.error(&e.to_string());
                Err(e.into())
            }
        }
    }
}
