mod common;

use common::ScriptedStore;
use csvdeck::error::PageError;
use csvdeck::{
    CellValue, DataStore, NoticeKind, NoticeLog, PageFetch, RecordingRenderer, Rendered,
    SessionState, TableSession,
};

struct Harness {
    store: ScriptedStore,
    session: TableSession,
    notices: NoticeLog,
    renderer: RecordingRenderer,
}

impl Harness {
    fn new(rows: usize, page_size: usize) -> Self {
        Self {
            store: ScriptedStore::new().with_numbered_file("numbers.csv", rows),
            session: TableSession::new(vec![5, 10, 20, 50], page_size).unwrap(),
            notices: NoticeLog::new(),
            renderer: RecordingRenderer::new(),
        }
    }

    fn open(&mut self) -> PageFetch {
        let file = self.store.list().unwrap().remove(0);
        self.session.open(&file)
    }

    fn run(&mut self, fetch: PageFetch) -> bool {
        let outcome = self.store.fetch_page(&fetch.request);
        self.session
            .complete(fetch.ticket, outcome, &mut self.notices, &mut self.renderer)
    }

    fn first_cell(&self) -> Option<CellValue> {
        self.session.page()?.rows.first()?.first().cloned()
    }
}

#[test]
fn test_open_loads_first_page() {
    let mut h = Harness::new(12, 5);
    let fetch = h.open();
    assert!(h.session.is_loading());
    assert_eq!(fetch.request.page_number, 1);
    assert_eq!(fetch.request.page_size, 5);

    assert!(h.run(fetch));
    assert_eq!(h.session.state(), &SessionState::Ready);
    assert_eq!(h.session.total_rows(), Some(12));
    assert_eq!(h.session.total_pages(), 3);
    assert_eq!(h.first_cell(), Some(CellValue::Int(1)));
    assert_eq!(h.renderer.table_renders(), 1);
}

#[test]
fn test_out_of_order_results_keep_latest_page() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    h.run(open);

    let second = h.session.go_to(2).unwrap().unwrap();
    let third = h.session.go_to(3).unwrap().unwrap();
    assert!(second.ticket < third.ticket);

    // page 3 lands first, then the superseded page 2 arrives
    assert!(h.run(third));
    assert!(!h.run(second));

    assert_eq!(h.session.page_number(), 3);
    assert_eq!(h.first_cell(), Some(CellValue::Int(11)));
    let window = h.session.window().unwrap();
    assert_eq!((window.start_index, window.end_index), (11, 12));
    assert_eq!(h.renderer.table_renders(), 2);
}

#[test]
fn test_stale_failure_is_not_reported() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    h.run(open);

    let second = h.session.go_to(2).unwrap().unwrap();
    let third = h.session.go_to(3).unwrap().unwrap();
    assert!(h.run(third));

    h.store.set(&h.store.fail_fetch, true);
    assert!(!h.run(second));
    assert!(h.notices.is_empty());
    assert_eq!(h.session.state(), &SessionState::Ready);
}

#[test]
fn test_navigation_helpers() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    h.run(open);

    let fetch = h.session.next_page().unwrap().unwrap();
    assert_eq!(fetch.request.page_number, 2);
    h.run(fetch);

    let fetch = h.session.last_page().unwrap().unwrap();
    assert_eq!(fetch.request.page_number, 3);
    h.run(fetch);

    // already on the last page
    assert_eq!(h.session.next_page().unwrap(), None);

    let fetch = h.session.prev_page().unwrap().unwrap();
    assert_eq!(fetch.request.page_number, 2);
    h.run(fetch);

    let fetch = h.session.first_page().unwrap().unwrap();
    assert_eq!(fetch.request.page_number, 1);
    h.run(fetch);
    assert_eq!(h.session.prev_page().unwrap(), None);
}

#[test]
fn test_out_of_range_page_leaves_state_alone() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    h.run(open);

    assert_eq!(
        h.session.go_to(4),
        Err(PageError::OutOfRange {
            page: 4,
            total_pages: 3
        })
    );
    assert_eq!(h.session.go_to(0), Err(PageError::InvalidPageNumber));
    assert_eq!(h.session.page_number(), 1);
    assert_eq!(h.session.state(), &SessionState::Ready);
    assert!(h.session.outstanding().is_none());
}

#[test]
fn test_page_size_change_returns_to_first_page() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    h.run(open);
    let fetch = h.session.go_to(2).unwrap().unwrap();
    h.run(fetch);

    let fetch = h.session.set_page_size(10).unwrap().unwrap();
    assert_eq!(fetch.request.page_number, 1);
    assert_eq!(fetch.request.page_size, 10);
    h.run(fetch);
    assert_eq!(h.session.page().unwrap().rows.len(), 10);
    assert_eq!(h.session.total_pages(), 2);

    assert_eq!(h.session.set_page_size(10).unwrap(), None);
    assert!(matches!(
        h.session.set_page_size(7),
        Err(PageError::UnsupportedPageSize { size: 7, .. })
    ));
    assert_eq!(h.session.page_size(), 10);
}

#[test]
fn test_failure_is_reported_once_until_success() {
    let mut h = Harness::new(12, 5);
    h.store.set(&h.store.fail_fetch, true);

    let open = h.open();
    h.run(open);
    assert!(matches!(h.session.state(), SessionState::Failed(_)));
    assert_eq!(h.notices.count(NoticeKind::Error), 1);

    let retry = h.session.retry().unwrap();
    assert_eq!(retry.request.page_number, 1);
    h.run(retry);
    assert_eq!(h.notices.count(NoticeKind::Error), 1);

    h.store.set(&h.store.fail_fetch, false);
    let retry = h.session.retry().unwrap();
    h.run(retry);
    assert_eq!(h.session.state(), &SessionState::Ready);
    assert_eq!(h.session.retry(), None);

    // a new lineage after success may report again
    h.store.set(&h.store.fail_fetch, true);
    let fetch = h.session.go_to(2).unwrap().unwrap();
    h.run(fetch);
    assert_eq!(h.notices.count(NoticeKind::Error), 2);
}

#[test]
fn test_malformed_result_is_a_failure() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    let mut result = h.store.fetch_page(&open.request).unwrap();
    result.rows.pop();

    assert!(h
        .session
        .complete(open.ticket, Ok(result), &mut h.notices, &mut h.renderer));
    assert!(matches!(h.session.state(), SessionState::Failed(_)));
    assert_eq!(h.renderer.table_renders(), 0);
    assert_eq!(h.notices.count(NoticeKind::Error), 1);
}

#[test]
fn test_reset_keeps_page_size_and_drops_outstanding() {
    let mut h = Harness::new(12, 5);
    let open = h.open();
    h.run(open);
    h.session.set_page_size(20).unwrap();
    let pending = h.session.outstanding().copied().unwrap();

    h.session.reset();
    assert_eq!(h.session.state(), &SessionState::Idle);
    assert_eq!(h.session.page_size(), 20);
    assert_eq!(h.session.file_id(), None);
    assert!(h.session.page().is_none());

    // the fetch issued before the reset can no longer land
    assert!(!h.run(pending));
    assert_eq!(h.renderer.table_renders(), 1);
    assert!(matches!(h.renderer.last(), Some(Rendered::Table { rows, .. }) if rows.len() == 5));
}

#[test]
fn test_empty_file_is_ready_with_no_rows() {
    let mut h = Harness::new(0, 10);
    let open = h.open();
    h.run(open);
    assert_eq!(h.session.state(), &SessionState::Ready);
    assert_eq!(h.session.total_pages(), 0);
    assert!(h.session.page().unwrap().rows.is_empty());
    assert_eq!(h.session.next_page().unwrap(), None);
}

#[test]
fn test_every_fetch_targets_the_open_file() {
    let mut h = Harness::new(12, 5);
    assert_eq!(h.session.go_to(1), Err(PageError::NoFileOpen));
    assert_eq!(h.session.set_page_size(10).unwrap(), None);

    let open = h.open();
    let id = h.session.file_id().unwrap();
    assert_eq!(open.request.file_id, id);

    h.store.set(&h.store.fail_fetch, true);
    h.run(open);
    let retry = h.session.retry().unwrap();
    assert_eq!(retry.request.file_id, id);

    h.store.set(&h.store.fail_fetch, false);
    h.run(retry);
    let fetch = h.session.go_to(2).unwrap().unwrap();
    assert_eq!(fetch.request.file_id, id);
}
