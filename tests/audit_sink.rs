//! Tests for the pluggable AuditSink / forward sink functionality.

mod common;

use std::sync::{Arc, Mutex};

use strongbox::audit::{AuditAction, AuditRecord, AuditSink};
use strongbox::payload::Note;
use strongbox::store::{ItemKind, RecordStore};
use strongbox::{codec, VaultConfig, VaultError, Vault};

/// A test sink that collects records into a shared Vec.
struct SharedVecSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl AuditSink for SharedVecSink {
    fn append(&mut self, record: AuditRecord) {
        self.records.lock().unwrap().push(record);
    }
}

fn note(content: &str) -> Note {
    Note {
        title: "t".into(),
        content: content.into(),
    }
}

#[test]
fn test_forward_sink_receives_records() {
    let (_root, vault) = common::vault();
    let records = Arc::new(Mutex::new(Vec::new()));
    vault
        .add_audit_sink(Box::new(SharedVecSink { records: Arc::clone(&records) }))
        .unwrap();

    let id = vault.store_note(7, &note("one")).unwrap();
    vault.get_note(7, id).unwrap();
    vault.update_note(7, id, &note("two")).unwrap();
    vault.delete_item(7, id).unwrap();

    let collected = records.lock().unwrap();
    let actions: Vec<AuditAction> = collected.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        [
            AuditAction::Sealed,
            AuditAction::Opened,
            AuditAction::Resealed,
            AuditAction::Deleted
        ]
    );
    assert!(collected.iter().all(|r| r.owner == 7 && r.item_id == id));
    assert!(collected.iter().all(|r| r.kind == ItemKind::Note));

    // Primary log matches the forwarded copy.
    assert_eq!(*collected, vault.audit_records().unwrap());
}

#[test]
fn test_integrity_failure_is_audited_with_fault_kind() {
    let (_root, vault) = common::vault();
    let records = Arc::new(Mutex::new(Vec::new()));
    vault
        .add_audit_sink(Box::new(SharedVecSink { records: Arc::clone(&records) }))
        .unwrap();

    let id = vault.store_note(1, &note("original")).unwrap();
    let item = vault.store().get(1, id).unwrap().unwrap();
    let mut sealed = item.sealed.clone();
    sealed.signature_b64 = codec::encode(&[0u8; 256]);
    assert!(vault.store().replace(1, id, item.name, sealed).unwrap());

    // The caller sees only the opaque failure.
    let err = vault.get_note(1, id).unwrap_err();
    assert!(matches!(err, VaultError::IntegrityCheckFailed));

    let collected = records.lock().unwrap();
    let last = collected.last().unwrap();
    assert_eq!(last.action, AuditAction::IntegrityFailure);
    assert_eq!(last.detail.as_deref(), Some("signature_invalid"));
}

#[test]
fn test_configured_audit_file_receives_json_lines() {
    let (root, config) = common::key_dir_with(common::primary());
    let audit_path = root.path().join("audit.jsonl");
    let config = VaultConfig {
        audit_log: Some(audit_path.clone()),
        ..config
    };
    let vault = Vault::from_config(&config).unwrap();

    let id = vault.upload_file(3, "doc", "doc.pdf", b"%PDF-1.7").unwrap();
    vault.download_file(3, id).unwrap();

    let contents = std::fs::read_to_string(&audit_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: AuditRecord = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first.action, AuditAction::Sealed);
    assert_eq!(first.kind, ItemKind::File);
    assert!(lines[1].contains("\"opened\""));
}
