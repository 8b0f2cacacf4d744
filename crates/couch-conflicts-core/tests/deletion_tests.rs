mod common;

use common::{read_csv, MemoryGateway};
use couch_conflicts_core::audit::DELETION_HEADERS;
use couch_conflicts_core::{
    AppConfig, ConflictRecord, DeletionTask, Gateway, ScanTask, Task,
};
use serde_json::json;
use tempfile::tempdir;

fn record(id: &str, name: &str, revisions: &[&str]) -> ConflictRecord {
    ConflictRecord::new(id, name, revisions.iter().map(|r| r.to_string()).collect()).unwrap()
}

#[test]
fn test_deletion_resolves_document() {
    let tmp = tempdir().unwrap();
    let csv_path = tmp.path().join("deletions.csv");
    let mut gateway = MemoryGateway::new(10).with_document(
        "agapic@ca.ibm.com",
        json!("Agapic"),
        &["263-b0a1", "164-aa9f"],
    );
    let records = vec![record("agapic@ca.ibm.com", "Agapic", &["263-b0a1", "164-aa9f"])];

    let report = DeletionTask::new(&mut gateway, records, &csv_path)
        .run()
        .unwrap();

    assert_eq!(report.total_conflicted_documents, 1);
    assert_eq!(report.total_conflicted_revisions, 2);
    assert_eq!(report.total_resolved_documents, 1);
    assert_eq!(report.total_deleted_revisions, 2);
    assert!(report.outcomes[0].resolved());
    assert!(gateway.conflicts_of("agapic@ca.ibm.com").is_empty());

    let rows = read_csv(&csv_path);
    assert_eq!(rows[0], DELETION_HEADERS);
    assert_eq!(
        rows[1],
        ["agapic@ca.ibm.com", "Agapic", "2", "2", "263-b0a1;164-aa9f"]
    );
}

#[test]
fn test_partial_failure_continues_with_remaining_revisions() {
    let tmp = tempdir().unwrap();
    let csv_path = tmp.path().join("deletions.csv");
    let mut gateway = MemoryGateway::new(10)
        .with_document("a", json!("Alpha"), &["3-a", "4-a", "5-a"])
        .with_document("b", json!("Beta"), &["2-b"])
        .fail_revision("a", "4-a");
    let records = vec![
        record("a", "Alpha", &["3-a", "4-a", "5-a"]),
        record("b", "Beta", &["2-b"]),
    ];

    let report = DeletionTask::new(&mut gateway, records, &csv_path)
        .run()
        .unwrap();

    // Every revision was attempted exactly once, in order.
    let calls: Vec<(&str, &str)> = gateway
        .delete_calls
        .iter()
        .map(|(d, r)| (d.as_str(), r.as_str()))
        .collect();
    assert_eq!(calls, [("a", "3-a"), ("a", "4-a"), ("a", "5-a"), ("b", "2-b")]);

    assert_eq!(report.total_conflicted_documents, 2);
    assert_eq!(report.total_conflicted_revisions, 4);
    assert_eq!(report.total_deleted_revisions, 3);
    assert_eq!(report.total_resolved_documents, 1);

    let partial = &report.outcomes[0];
    assert!(!partial.resolved());
    assert_eq!(partial.attempted_count, 3);
    assert_eq!(partial.deleted_revision_ids, ["3-a", "5-a"]);
    assert!(report.outcomes[1].resolved());

    let rows = read_csv(&csv_path);
    assert_eq!(rows[1], ["a", "Alpha", "3", "2", "3-a;5-a"]);
    assert_eq!(rows[2], ["b", "Beta", "1", "1", "2-b"]);
}

#[test]
fn test_deleted_revisions_are_subsequence_of_candidates() {
    let tmp = tempdir().unwrap();
    let csv_path = tmp.path().join("deletions.csv");
    // "9-z" is not on the server, so its delete fails.
    let mut gateway = MemoryGateway::new(10).with_document("a", json!("Alpha"), &["1-a", "2-a"]);
    let candidates = ["1-a", "9-z", "2-a"];
    let records = vec![record("a", "Alpha", &candidates)];

    let report = DeletionTask::new(&mut gateway, records, &csv_path)
        .run()
        .unwrap();

    let deleted = &report.outcomes[0].deleted_revision_ids;
    assert_eq!(deleted, &["1-a", "2-a"]);
    let mut remaining = candidates.iter();
    for revision in deleted {
        assert!(remaining.any(|candidate| candidate == revision));
    }
    assert!(!report.outcomes[0].resolved());
}

#[test]
fn test_empty_buffer_writes_header_only() {
    let tmp = tempdir().unwrap();
    let csv_path = tmp.path().join("deletions.csv");
    let mut gateway = MemoryGateway::new(10);

    let report = DeletionTask::new(&mut gateway, Vec::new(), &csv_path)
        .run()
        .unwrap();

    assert_eq!(report.total_conflicted_documents, 0);
    assert!(gateway.delete_calls.is_empty());
    assert_eq!(read_csv(&csv_path).len(), 1);
}

#[test]
fn test_rescan_after_partial_failure_reports_leftovers() {
    let tmp = tempdir().unwrap();
    let config = AppConfig::default();
    let mut gateway = MemoryGateway::new(10)
        .with_document("a", json!("Alpha"), &["3-a", "4-a", "5-a"])
        .fail_revision("a", "4-a");
    gateway.open_session().unwrap();

    let first = ScanTask::new(&mut gateway, &config, true, tmp.path().join("scan-1.csv"))
        .run()
        .unwrap();
    assert_eq!(first.total_conflicted_revisions, 3);

    DeletionTask::new(&mut gateway, first.buffer, tmp.path().join("deletions.csv"))
        .run()
        .unwrap();

    let second = ScanTask::new(&mut gateway, &config, true, tmp.path().join("scan-2.csv"))
        .run()
        .unwrap();
    assert_eq!(second.total_conflicted_documents, 1);
    assert_eq!(second.total_conflicted_revisions, 1);
    assert_eq!(second.buffer[0].document_id(), "a");
    assert_eq!(second.buffer[0].losing_revision_ids(), &["4-a"]);
}
