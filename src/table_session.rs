//! Paginated cursor over one file.
//!
//! The session never performs I/O itself. Every navigation call that needs data
//! returns a [`PageFetch`]; the caller runs it against a store (synchronously or on
//! a worker) and hands the outcome back through [`TableSession::complete`]. Each
//! fetch carries a ticket and only the most recently issued ticket can change
//! state, so the last request always wins no matter in which order fetches finish.

use tracing::debug;

use crate::error::{PageError, StoreError};
use crate::notice::Notifier;
use crate::page_window::{self, advance, compute_window, Direction, PageWindow};
use crate::render::Renderer;
use crate::store::{FileId, FileRecord, PageRequest, PageResult};

pub const DEFAULT_PAGE_SIZES: [usize; 4] = [5, 10, 20, 50];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Monotonic fetch identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A fetch the caller must execute and report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFetch {
    pub ticket: FetchTicket,
    pub request: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    /// Last fetch failed; holds the reason shown to the user.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TableSession {
    allowed_page_sizes: Vec<usize>,
    page_size: usize,
    file_id: Option<FileId>,
    page_number: usize,
    total_rows: Option<usize>,
    state: SessionState,
    page: Option<PageResult>,
    next_ticket: u64,
    outstanding: Option<PageFetch>,
    last_request: Option<PageRequest>,
    failure_reported: bool,
}

impl Default for TableSession {
    fn default() -> Self {
        Self {
            allowed_page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            page_size: DEFAULT_PAGE_SIZE,
            file_id: None,
            page_number: 1,
            total_rows: None,
            state: SessionState::Idle,
            page: None,
            next_ticket: 0,
            outstanding: None,
            last_request: None,
            failure_reported: false,
        }
    }
}

impl TableSession {
    /// `default_page_size` must be one of `allowed_page_sizes`.
    pub fn new(allowed_page_sizes: Vec<usize>, default_page_size: usize) -> Result<Self, PageError> {
        if default_page_size < 1 {
            return Err(PageError::InvalidPageSize);
        }
        if !allowed_page_sizes.contains(&default_page_size) {
            return Err(PageError::UnsupportedPageSize {
                size: default_page_size,
                allowed: allowed_page_sizes,
            });
        }
        Ok(Self {
            allowed_page_sizes,
            page_size: default_page_size,
            ..Self::default()
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    pub fn file_id(&self) -> Option<FileId> {
        self.file_id
    }

    /// Page currently shown or being loaded.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn allowed_page_sizes(&self) -> &[usize] {
        &self.allowed_page_sizes
    }

    /// Last known total row count of the open file.
    pub fn total_rows(&self) -> Option<usize> {
        self.total_rows
    }

    pub fn total_pages(&self) -> usize {
        page_window::total_pages(self.total_rows.unwrap_or(0), self.page_size)
    }

    /// Last successfully loaded page. Kept while a newer fetch is loading or failed.
    pub fn page(&self) -> Option<&PageResult> {
        self.page.as_ref()
    }

    /// Window of the most recently loaded page.
    pub fn window(&self) -> Option<PageWindow> {
        let page = self.page.as_ref()?;
        compute_window(page.page_number, page.page_size, page.total_row_count).ok()
    }

    pub fn outstanding(&self) -> Option<&PageFetch> {
        self.outstanding.as_ref()
    }

    /// Start over on `file` at page 1, dropping any page data from a previous file.
    pub fn open(&mut self, file: &FileRecord) -> PageFetch {
        self.file_id = Some(file.id);
        self.total_rows = Some(file.row_count);
        self.page = None;
        self.page_number = 1;
        self.last_request = None;
        self.issue(file.id, 1, false)
    }

    /// Change the page size and go back to page 1. Same size is a no-op.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<Option<PageFetch>, PageError> {
        if !self.allowed_page_sizes.contains(&page_size) {
            return Err(PageError::UnsupportedPageSize {
                size: page_size,
                allowed: self.allowed_page_sizes.clone(),
            });
        }
        if page_size == self.page_size {
            return Ok(None);
        }
        self.page_size = page_size;
        self.page_number = 1;
        let Some(file_id) = self.file_id else {
            return Ok(None);
        };
        Ok(Some(self.issue(file_id, 1, false)))
    }

    /// Move to `page_number`. Out-of-range pages fail; the loaded or loading page is a no-op.
    pub fn go_to(&mut self, page_number: usize) -> Result<Option<PageFetch>, PageError> {
        let file_id = self.file_id.ok_or(PageError::NoFileOpen)?;
        compute_window(page_number, self.page_size, self.total_rows.unwrap_or(0))?;
        if page_number == self.page_number
            && matches!(self.state, SessionState::Ready | SessionState::Loading)
        {
            return Ok(None);
        }
        Ok(Some(self.issue(file_id, page_number, false)))
    }

    pub fn next_page(&mut self) -> Result<Option<PageFetch>, PageError> {
        let target = advance(Direction::Next, self.page_number, self.total_pages());
        self.go_to(target)
    }

    pub fn prev_page(&mut self) -> Result<Option<PageFetch>, PageError> {
        let target = advance(Direction::Prev, self.page_number, self.total_pages());
        self.go_to(target)
    }

    pub fn first_page(&mut self) -> Result<Option<PageFetch>, PageError> {
        self.go_to(1)
    }

    pub fn last_page(&mut self) -> Result<Option<PageFetch>, PageError> {
        self.go_to(self.total_pages().max(1))
    }

    /// Re-issue the failed request. Only valid from `Failed`.
    pub fn retry(&mut self) -> Option<PageFetch> {
        if !matches!(self.state, SessionState::Failed(_)) {
            return None;
        }
        let request = self.last_request?;
        Some(self.issue(request.file_id, request.page_number, true))
    }

    fn issue(&mut self, file_id: FileId, page_number: usize, retry: bool) -> PageFetch {
        self.next_ticket += 1;
        let fetch = PageFetch {
            ticket: FetchTicket(self.next_ticket),
            request: PageRequest {
                file_id,
                page_number,
                page_size: self.page_size,
            },
        };
        if !retry {
            self.failure_reported = false;
        }
        self.page_number = page_number;
        self.state = SessionState::Loading;
        self.outstanding = Some(fetch);
        self.last_request = Some(fetch.request);
        debug!(ticket = fetch.ticket.0, page = page_number, size = self.page_size, "page fetch issued");
        fetch
    }

    /// Apply a fetch outcome. Returns false if `ticket` is not the latest issued one.
    pub fn complete<N, R>(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<PageResult, StoreError>,
        notifier: &mut N,
        renderer: &mut R,
    ) -> bool
    where
        N: Notifier + ?Sized,
        R: Renderer + ?Sized,
    {
        let Some(fetch) = self.outstanding.filter(|f| f.ticket == ticket) else {
            debug!(ticket = ticket.0, "stale page result ignored");
            return false;
        };
        self.outstanding = None;

        match outcome.and_then(|result| check_result(&fetch.request, result)) {
            Ok(result) => {
                debug!(ticket = ticket.0, rows = result.rows.len(), "page ready");
                self.total_rows = Some(result.total_row_count);
                self.state = SessionState::Ready;
                self.failure_reported = false;
                renderer.render_table(&result.columns, &result.rows);
                self.page = Some(result);
            }
            Err(e) => {
                let reason = e.to_string();
                debug!(ticket = ticket.0, error = %reason, "page fetch failed");
                if !self.failure_reported {
                    notifier.error(&reason);
                    self.failure_reported = true;
                }
                self.state = SessionState::Failed(reason);
            }
        }
        true
    }

    /// Back to `Idle` with no file. The page size is kept.
    pub fn reset(&mut self) {
        self.file_id = None;
        self.page_number = 1;
        self.total_rows = None;
        self.state = SessionState::Idle;
        self.page = None;
        self.outstanding = None;
        self.last_request = None;
        self.failure_reported = false;
    }
}

/// A result must echo the request and hold exactly the rows that fall on the page.
fn check_result(request: &PageRequest, result: PageResult) -> Result<PageResult, StoreError> {
    if result.page_number != request.page_number || result.page_size != request.page_size {
        return Err(StoreError::FetchFailed(format!(
            "store answered page {} (size {}) for page {} (size {})",
            result.page_number, result.page_size, request.page_number, request.page_size
        )));
    }
    let expected = page_window::rows_on_page(
        request.page_number,
        request.page_size,
        result.total_row_count,
    );
    if result.rows.len() != expected {
        return Err(StoreError::FetchFailed(format!(
            "expected {expected} rows on page {}, got {}",
            request.page_number,
            result.rows.len()
        )));
    }
    if let Some(row) = result.rows.iter().find(|r| r.len() != result.columns.len()) {
        return Err(StoreError::FetchFailed(format!(
            "row has {} cells for {} columns",
            row.len(),
            result.columns.len()
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_default_outside_allowed_sizes() {
        let err = TableSession::new(vec![5, 10], 20).unwrap_err();
        assert!(matches!(err, PageError::UnsupportedPageSize { size: 20, .. }));
        assert!(TableSession::new(vec![5, 10], 10).is_ok());
    }

    #[test]
    fn go_to_without_file_fails() {
        let mut session = TableSession::default();
        assert_eq!(session.go_to(1), Err(PageError::NoFileOpen));
        assert_eq!(session.retry(), None);
    }

    #[test]
    fn set_page_size_without_file_only_records_size() {
        let mut session = TableSession::default();
        assert_eq!(session.set_page_size(20), Ok(None));
        assert_eq!(session.page_size(), 20);
        assert_eq!(session.state(), &SessionState::Idle);
    }
}
