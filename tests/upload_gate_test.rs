mod common;

use common::{ScriptedStore, SALES_CSV};
use csvdeck::error::{AdmissionError, Error};
use csvdeck::{NoticeKind, NoticeLog, UploadGate};

#[test]
fn test_wrong_extension_never_reaches_store() {
    let store = ScriptedStore::new();
    let gate = UploadGate::default();
    let mut notices = NoticeLog::new();

    let err = gate
        .upload(&store, "report.txt", b"a,b\n1,2\n", &mut notices)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Admission(AdmissionError::RejectedExtension { .. })
    ));
    assert_eq!(store.calls().upload, 0);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices.count(NoticeKind::Error), 1);
}

#[test]
fn test_oversized_file_never_reaches_store() {
    let store = ScriptedStore::new();
    let gate = UploadGate::new(vec![".csv".to_string()], 16);
    let mut notices = NoticeLog::new();

    let err = gate
        .upload(&store, "sales.csv", SALES_CSV.as_bytes(), &mut notices)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Admission(AdmissionError::RejectedSize { max_bytes: 16, .. })
    ));
    assert_eq!(store.calls().upload, 0);
    assert_eq!(notices.len(), 1);
}

#[test]
fn test_admitted_upload_reports_success_once() {
    let store = ScriptedStore::new();
    let gate = UploadGate::default();
    let mut notices = NoticeLog::new();

    let record = gate
        .upload(&store, "sales.csv", SALES_CSV.as_bytes(), &mut notices)
        .unwrap();
    assert_eq!(record.display_name, "sales.csv");
    assert_eq!(record.row_count, 5);
    assert_eq!(store.calls().upload, 1);
    assert_eq!(notices.len(), 1);
    let notice = notices.last().unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, "sales.csv uploaded successfully");
}

#[test]
fn test_store_rejection_reports_one_error() {
    let store = ScriptedStore::new();
    store.set(&store.fail_upload, true);
    let gate = UploadGate::default();
    let mut notices = NoticeLog::new();

    let err = gate
        .upload(&store, "sales.csv", SALES_CSV.as_bytes(), &mut notices)
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(store.calls().upload, 1);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices.count(NoticeKind::Error), 1);
}

#[test]
fn test_extension_match_ignores_case() {
    let gate = UploadGate::default();
    assert!(gate.admit("SALES.CSV", 10).is_ok());
    assert!(gate.admit("sales.csv.bak", 10).is_err());
    assert!(gate.admit("csv", 10).is_err());
}
