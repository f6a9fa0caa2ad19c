//! Owner-facing vault operations.
//!
//! [`Vault`] is the only caller of [`Pipeline::open`] outside tests. It
//! resolves items through the owner-scoped [`RecordStore`], audits every
//! action, and turns integrity faults into the opaque
//! [`VaultError::IntegrityCheckFailed`] after logging which check failed.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditAction, AuditLog, AuditRecord, AuditSink, FileAuditSink};
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::password::{self, HealthReport, PasswordSample};
use crate::payload::{self, Note, PasswordEntry};
use crate::pipeline::Pipeline;
use crate::store::{ItemId, ItemKind, MemoryStore, NewItem, OwnerId, RecordStore, VaultItem};

/// Content types that may be rendered inline.
const PREVIEWABLE: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
];

/// A decrypted password record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordView {
    pub id: ItemId,
    pub name: String,
    pub website: Option<String>,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

/// A decrypted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub id: ItemId,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

/// Item metadata without any decrypted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub kind: ItemKind,
    pub name: String,
    pub file_name: Option<String>,
    pub created_at: String,
}

/// A decrypted file with what a caller needs to serve it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of a verification-only pass over a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub message: String,
}

pub struct Vault<S: RecordStore = MemoryStore> {
    pipeline: Pipeline,
    store: S,
    audit: Mutex<AuditLog>,
}

impl<S: RecordStore + std::fmt::Debug> std::fmt::Debug for Vault<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("pipeline", &self.pipeline)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Vault<MemoryStore> {
    /// An in-memory vault using the keypair and audit file from `config`.
    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        let vault = Self::new(Pipeline::from_config(config)?, MemoryStore::new());
        if let Some(path) = &config.audit_log {
            let sink = FileAuditSink::new(path).map_err(|e| {
                VaultError::Config(format!("cannot open audit log {}: {e}", path.display()))
            })?;
            vault.add_audit_sink(Box::new(sink))?;
        }
        Ok(vault)
    }
}

impl<S: RecordStore> Vault<S> {
    pub fn new(pipeline: Pipeline, store: S) -> Self {
        Self {
            pipeline,
            store,
            audit: Mutex::new(AuditLog::new()),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add_audit_sink(&self, sink: Box<dyn AuditSink>) -> Result<(), VaultError> {
        self.audit_log_mut()?.add_forward_sink(sink);
        Ok(())
    }

    /// Snapshot of the in-memory audit trail.
    pub fn audit_records(&self) -> Result<Vec<AuditRecord>, VaultError> {
        Ok(self.audit_log_mut()?.snapshot())
    }

    // -- passwords ----------------------------------------------------------

    pub fn store_password(
        &self,
        owner: OwnerId,
        name: &str,
        entry: &PasswordEntry,
    ) -> Result<ItemId, VaultError> {
        self.seal_new(owner, ItemKind::Password, name, None, &payload::to_bytes(entry)?)
    }

    pub fn list_passwords(&self, owner: OwnerId) -> Result<Vec<PasswordView>, VaultError> {
        self.store
            .list(owner, Some(ItemKind::Password))?
            .iter()
            .map(|item| self.password_view(item))
            .collect()
    }

    pub fn get_password(&self, owner: OwnerId, id: ItemId) -> Result<PasswordView, VaultError> {
        let item = self.fetch(owner, id, ItemKind::Password)?;
        self.password_view(&item)
    }

    /// Reseal a password under a fresh key, nonce, digest and signature.
    pub fn update_password(
        &self,
        owner: OwnerId,
        id: ItemId,
        name: &str,
        entry: &PasswordEntry,
    ) -> Result<(), VaultError> {
        self.reseal(owner, id, ItemKind::Password, name, &payload::to_bytes(entry)?)
    }

    /// Strength and reuse analysis across all of `owner`'s passwords.
    pub fn password_health(&self, owner: OwnerId) -> Result<HealthReport, VaultError> {
        let samples = self
            .list_passwords(owner)?
            .into_iter()
            .map(|view| PasswordSample {
                id: view.id,
                name: view.name,
                password: view.password,
            })
            .collect::<Vec<_>>();
        Ok(password::analyze_health(&samples))
    }

    // -- notes --------------------------------------------------------------

    pub fn store_note(&self, owner: OwnerId, note: &Note) -> Result<ItemId, VaultError> {
        self.seal_new(owner, ItemKind::Note, &note.title, None, &payload::to_bytes(note)?)
    }

    pub fn list_notes(&self, owner: OwnerId) -> Result<Vec<NoteView>, VaultError> {
        self.store
            .list(owner, Some(ItemKind::Note))?
            .iter()
            .map(|item| self.note_view(item))
            .collect()
    }

    pub fn get_note(&self, owner: OwnerId, id: ItemId) -> Result<NoteView, VaultError> {
        let item = self.fetch(owner, id, ItemKind::Note)?;
        self.note_view(&item)
    }

    pub fn update_note(&self, owner: OwnerId, id: ItemId, note: &Note) -> Result<(), VaultError> {
        self.reseal(owner, id, ItemKind::Note, &note.title, &payload::to_bytes(note)?)
    }

    // -- files --------------------------------------------------------------

    pub fn upload_file(
        &self,
        owner: OwnerId,
        name: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ItemId, VaultError> {
        self.seal_new(owner, ItemKind::File, name, Some(file_name.to_string()), bytes)
    }

    pub fn list_files(&self, owner: OwnerId) -> Result<Vec<ItemSummary>, VaultError> {
        Ok(self
            .store
            .list(owner, Some(ItemKind::File))?
            .iter()
            .map(summary)
            .collect())
    }

    pub fn download_file(&self, owner: OwnerId, id: ItemId) -> Result<FileContent, VaultError> {
        let item = self.fetch(owner, id, ItemKind::File)?;
        let bytes = self.open_item(&item)?;
        let file_name = item.file_name.unwrap_or_default();
        Ok(FileContent {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            bytes,
        })
    }

    /// Like [`download_file`](Self::download_file) but only for content
    /// types that render inline. The type check runs before decryption.
    pub fn preview_file(&self, owner: OwnerId, id: ItemId) -> Result<FileContent, VaultError> {
        let item = self.fetch(owner, id, ItemKind::File)?;
        let file_name = item.file_name.clone().unwrap_or_default();
        let content_type = content_type_for(&file_name);
        if !PREVIEWABLE.contains(&content_type) {
            return Err(VaultError::PreviewUnsupported(content_type.to_string()));
        }
        let bytes = self.open_item(&item)?;
        Ok(FileContent {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    /// Run the full open-and-verify pass without returning content.
    pub fn verify_file(&self, owner: OwnerId, id: ItemId) -> Result<IntegrityReport, VaultError> {
        let item = self.fetch(owner, id, ItemKind::File)?;
        match self.open_item(&item) {
            Ok(_) => Ok(IntegrityReport {
                valid: true,
                message: "File integrity verified: hash and signature are valid".to_string(),
            }),
            Err(VaultError::IntegrityCheckFailed) => Ok(IntegrityReport {
                valid: false,
                message: VaultError::IntegrityCheckFailed.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    // -- any kind -----------------------------------------------------------

    pub fn list_items(&self, owner: OwnerId) -> Result<Vec<ItemSummary>, VaultError> {
        Ok(self.store.list(owner, None)?.iter().map(summary).collect())
    }

    pub fn delete_item(&self, owner: OwnerId, id: ItemId) -> Result<(), VaultError> {
        let item = self.store.get(owner, id)?.ok_or(VaultError::ItemNotFound(id))?;
        if !self.store.remove(owner, id)? {
            return Err(VaultError::ItemNotFound(id));
        }
        info!(owner, id, kind = item.kind.as_str(), "deleted vault item");
        self.audit(AuditRecord::now(owner, id, item.kind, AuditAction::Deleted))
    }

    // -- internals ----------------------------------------------------------

    fn seal_new(
        &self,
        owner: OwnerId,
        kind: ItemKind,
        name: &str,
        file_name: Option<String>,
        plaintext: &[u8],
    ) -> Result<ItemId, VaultError> {
        let sealed = self.pipeline.seal(plaintext)?;
        let id = self.store.insert(NewItem {
            owner,
            kind,
            name: name.to_string(),
            file_name,
            sealed,
        })?;
        info!(owner, id, kind = kind.as_str(), "sealed vault item");
        self.audit(AuditRecord::now(owner, id, kind, AuditAction::Sealed))?;
        Ok(id)
    }

    fn reseal(
        &self,
        owner: OwnerId,
        id: ItemId,
        kind: ItemKind,
        name: &str,
        plaintext: &[u8],
    ) -> Result<(), VaultError> {
        self.fetch(owner, id, kind)?;
        let sealed = self.pipeline.seal(plaintext)?;
        if !self.store.replace(owner, id, name.to_string(), sealed)? {
            return Err(VaultError::ItemNotFound(id));
        }
        info!(owner, id, kind = kind.as_str(), "resealed vault item");
        self.audit(AuditRecord::now(owner, id, kind, AuditAction::Resealed))
    }

    /// Owner- and kind-scoped lookup. Wrong owner and wrong kind both read
    /// as "not found".
    fn fetch(&self, owner: OwnerId, id: ItemId, kind: ItemKind) -> Result<VaultItem, VaultError> {
        self.store
            .get(owner, id)?
            .filter(|item| item.kind == kind)
            .ok_or(VaultError::ItemNotFound(id))
    }

    fn open_item(&self, item: &VaultItem) -> Result<Vec<u8>, VaultError> {
        match self.pipeline.open(&item.sealed) {
            Ok(plaintext) => {
                self.audit(AuditRecord::now(item.owner, item.id, item.kind, AuditAction::Opened))?;
                Ok(plaintext)
            }
            Err(e) if e.is_integrity_fault() => {
                warn!(
                    owner = item.owner,
                    id = item.id,
                    kind = item.kind.as_str(),
                    fault = e.kind(),
                    "vault item failed integrity verification"
                );
                self.audit(
                    AuditRecord::now(item.owner, item.id, item.kind, AuditAction::IntegrityFailure)
                        .with_detail(e.kind()),
                )?;
                Err(VaultError::IntegrityCheckFailed)
            }
            Err(e) => Err(e),
        }
    }

    fn password_view(&self, item: &VaultItem) -> Result<PasswordView, VaultError> {
        let entry: PasswordEntry = payload::from_bytes(&self.open_item(item)?)?;
        Ok(PasswordView {
            id: item.id,
            name: item.name.clone(),
            website: entry.website,
            username: entry.username,
            password: entry.password,
            created_at: item.created_at.to_rfc3339(),
        })
    }

    fn note_view(&self, item: &VaultItem) -> Result<NoteView, VaultError> {
        let note: Note = payload::from_bytes(&self.open_item(item)?)?;
        Ok(NoteView {
            id: item.id,
            title: note.title,
            content: note.content,
            created_at: item.created_at.to_rfc3339(),
        })
    }

    fn audit(&self, record: AuditRecord) -> Result<(), VaultError> {
        self.audit_log_mut()?.append(record);
        Ok(())
    }

    fn audit_log_mut(&self) -> Result<std::sync::MutexGuard<'_, AuditLog>, VaultError> {
        self.audit
            .lock()
            .map_err(|_| VaultError::LockPoisoned("audit log"))
    }
}

fn summary(item: &VaultItem) -> ItemSummary {
    ItemSummary {
        id: item.id,
        kind: item.kind,
        name: item.name.clone(),
        file_name: item.file_name.clone(),
        created_at: item.created_at.to_rfc3339(),
    }
}

/// Guess a MIME type from the file extension.
fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
