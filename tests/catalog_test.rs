mod common;

use common::ScriptedStore;
use csvdeck::error::StoreError;
use csvdeck::{FileCatalog, NoticeKind, NoticeLog};

#[test]
fn test_refresh_lists_newest_first() {
    let store = ScriptedStore::new()
        .with_numbered_file("jan.csv", 3)
        .with_numbered_file("feb.csv", 4)
        .with_numbered_file("mar.csv", 5);
    let mut catalog = FileCatalog::new();
    let mut notices = NoticeLog::new();

    catalog.refresh(&store, &mut notices).unwrap();
    let names: Vec<&str> = catalog.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, ["mar.csv", "feb.csv", "jan.csv"]);
    assert_eq!(catalog.newest().unwrap().display_name, "mar.csv");
    assert!(notices.is_empty());
}

#[test]
fn test_failed_refresh_keeps_previous_list() {
    let store = ScriptedStore::new().with_numbered_file("jan.csv", 3);
    let mut catalog = FileCatalog::new();
    let mut notices = NoticeLog::new();
    catalog.refresh(&store, &mut notices).unwrap();

    store.set(&store.fail_list, true);
    assert!(catalog.refresh(&store, &mut notices).is_err());
    assert_eq!(catalog.len(), 1);
    let notice = notices.last().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(notice.message.starts_with("Could not load files:"));
}

#[test]
fn test_remove_only_after_store_confirms() {
    let store = ScriptedStore::new()
        .with_numbered_file("jan.csv", 3)
        .with_numbered_file("feb.csv", 4);
    let mut catalog = FileCatalog::new();
    let mut notices = NoticeLog::new();
    catalog.refresh(&store, &mut notices).unwrap();
    let jan = catalog.find("jan.csv").unwrap().id;

    store.set(&store.fail_delete, true);
    let err = catalog.remove(&store, jan, &mut notices).unwrap_err();
    assert!(matches!(err, StoreError::DeleteFailed(_)));
    assert_eq!(catalog.len(), 2);
    assert_eq!(
        notices.last().unwrap().message,
        "Could not delete jan.csv: delete failed: permission denied"
    );

    store.set(&store.fail_delete, false);
    catalog.remove(&store, jan, &mut notices).unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get(jan).is_none());
    assert_eq!(notices.last().unwrap().message, "Deleted jan.csv");
    assert_eq!(store.file_count(), 1);
}

#[test]
fn test_find_by_id_or_name() {
    let store = ScriptedStore::new().with_numbered_file("jan.csv", 3);
    let mut catalog = FileCatalog::new();
    catalog.refresh(&store, &mut NoticeLog::new()).unwrap();

    let id = catalog.newest().unwrap().id;
    assert_eq!(catalog.find(&id.to_string()).unwrap().id, id);
    assert_eq!(catalog.find("jan.csv").unwrap().id, id);
    assert!(catalog.find("feb.csv").is_none());
}
