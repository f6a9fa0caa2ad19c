//! End-to-end item lifecycle through the owner-facing service.

mod common;

use strongbox::password::HealthLevel;
use strongbox::payload::{Note, PasswordEntry};
use strongbox::store::{ItemKind, RecordStore};
use strongbox::VaultError;

fn entry(password: &str) -> PasswordEntry {
    PasswordEntry {
        website: None,
        username: "user".into(),
        password: password.into(),
    }
}

#[test]
fn test_password_update_replaces_every_sealed_field() {
    let (_root, vault) = common::vault();
    let id = vault.store_password(1, "mail", &entry("first-Pass1!")).unwrap();
    let before = vault.store().get(1, id).unwrap().unwrap().sealed;

    vault.update_password(1, id, "mail (work)", &entry("second-Pass2@")).unwrap();
    let after = vault.store().get(1, id).unwrap().unwrap();

    assert_ne!(before.ciphertext_b64, after.sealed.ciphertext_b64);
    assert_ne!(before.key_b64, after.sealed.key_b64);
    assert_ne!(before.nonce_b64, after.sealed.nonce_b64);
    assert_ne!(before.content_digest_hex, after.sealed.content_digest_hex);
    assert_ne!(before.signature_b64, after.sealed.signature_b64);

    let view = vault.get_password(1, id).unwrap();
    assert_eq!(view.name, "mail (work)");
    assert_eq!(view.password, "second-Pass2@");
}

#[test]
fn test_notes_roundtrip_and_list() {
    let (_root, vault) = common::vault();
    let first = vault
        .store_note(1, &Note { title: "a".into(), content: "alpha".into() })
        .unwrap();
    let second = vault
        .store_note(1, &Note { title: "b".into(), content: "".into() })
        .unwrap();

    let notes = vault.list_notes(1).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].id, first);
    assert_eq!(notes[0].content, "alpha");
    assert_eq!(notes[1].id, second);
    assert_eq!(notes[1].content, "");
}

#[test]
fn test_file_download_preview_and_verify() {
    let (_root, vault) = common::vault();
    let png = vault.upload_file(1, "logo", "logo.PNG", b"\x89PNG\r\n").unwrap();
    let txt = vault.upload_file(1, "readme", "readme.txt", b"plain").unwrap();

    let download = vault.download_file(1, png).unwrap();
    assert_eq!(download.file_name, "logo.PNG");
    assert_eq!(download.content_type, "image/png");
    assert_eq!(download.bytes, b"\x89PNG\r\n");

    assert_eq!(vault.preview_file(1, png).unwrap().bytes, b"\x89PNG\r\n");
    assert!(matches!(
        vault.preview_file(1, txt),
        Err(VaultError::PreviewUnsupported(ref t)) if t == "text/plain"
    ));

    let report = vault.verify_file(1, txt).unwrap();
    assert!(report.valid);

    let files = vault.list_files(1).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.kind == ItemKind::File));
}

#[test]
fn test_verify_file_reports_tampering_without_error() {
    let (_root, vault) = common::vault();
    let id = vault.upload_file(1, "doc", "doc.pdf", b"%PDF").unwrap();

    let item = vault.store().get(1, id).unwrap().unwrap();
    let mut sealed = item.sealed.clone();
    sealed.content_digest_hex = "0".repeat(64);
    vault.store().replace(1, id, item.name, sealed).unwrap();

    let report = vault.verify_file(1, id).unwrap();
    assert!(!report.valid);
    assert!(matches!(vault.download_file(1, id), Err(VaultError::IntegrityCheckFailed)));
}

#[test]
fn test_delete_is_terminal() {
    let (_root, vault) = common::vault();
    let id = vault.store_password(1, "gone", &entry("whatever")).unwrap();

    vault.delete_item(1, id).unwrap();
    assert!(matches!(vault.get_password(1, id), Err(VaultError::ItemNotFound(_))));
    assert!(matches!(vault.delete_item(1, id), Err(VaultError::ItemNotFound(_))));
    assert!(vault.list_items(1).unwrap().is_empty());

    // Ids are never handed out again.
    let next = vault.store_password(1, "new", &entry("whatever")).unwrap();
    assert!(next > id);
}

#[test]
fn test_password_health_flags_weak_and_reused() {
    let (_root, vault) = common::vault();
    vault.store_password(1, "a", &entry("password")).unwrap();
    vault.store_password(1, "b", &entry("password")).unwrap();
    vault.store_password(1, "c", &entry("Xk9#mP2$vL7@qR4!")).unwrap();

    let report = vault.password_health(1).unwrap();
    assert_eq!(report.total_passwords, 3);
    assert_eq!(report.weak_count, 2);
    assert_eq!(report.strong_count, 1);
    assert_eq!(report.reused_passwords.len(), 1);
    assert_eq!(report.reused_passwords[0].count, 2);
    assert_ne!(report.overall_level, HealthLevel::Excellent);
    assert!(!report.recommendations.is_empty());
}
