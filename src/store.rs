//! Owner-scoped persistence of sealed records.
//!
//! The store never sees plaintext. Every read and write is keyed by the
//! owner as well as the item id: an item belonging to someone else is
//! indistinguishable from one that does not exist.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::record::SealedRecord;

pub type OwnerId = u64;
pub type ItemId = u64;

/// What a sealed record holds. Opaque to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Password,
    Note,
    File,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Note => "note",
            Self::File => "file",
        }
    }
}

/// A record as handed to [`RecordStore::insert`].
#[derive(Debug, Clone)]
pub struct NewItem {
    pub owner: OwnerId,
    pub kind: ItemKind,
    pub name: String,
    pub file_name: Option<String>,
    pub sealed: SealedRecord,
}

/// A stored record with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItem {
    pub id: ItemId,
    pub owner: OwnerId,
    pub kind: ItemKind,
    pub name: String,
    pub file_name: Option<String>,
    pub sealed: SealedRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence backend for sealed records.
///
/// Implementations must scope every lookup by `owner`.
pub trait RecordStore: Send + Sync {
    /// Persist a new item and return its id.
    fn insert(&self, item: NewItem) -> Result<ItemId, VaultError>;

    /// Fetch one item if `owner` owns it.
    fn get(&self, owner: OwnerId, id: ItemId) -> Result<Option<VaultItem>, VaultError>;

    /// All of `owner`'s items, optionally restricted to one kind, by id.
    fn list(&self, owner: OwnerId, kind: Option<ItemKind>) -> Result<Vec<VaultItem>, VaultError>;

    /// Replace the name and all sealed fields of an item. Returns `false`
    /// if `owner` has no such item.
    fn replace(
        &self,
        owner: OwnerId,
        id: ItemId,
        name: String,
        sealed: SealedRecord,
    ) -> Result<bool, VaultError>;

    /// Delete an item. Returns `false` if `owner` has no such item.
    fn remove(&self, owner: OwnerId, id: ItemId) -> Result<bool, VaultError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: ItemId,
    items: BTreeMap<ItemId, VaultItem>,
}

/// In-process [`RecordStore`]. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, item: NewItem) -> Result<ItemId, VaultError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| VaultError::LockPoisoned("memory store"))?;
        inner.next_id += 1;
        let id = inner.next_id;
        let now = Utc::now();
        inner.items.insert(
            id,
            VaultItem {
                id,
                owner: item.owner,
                kind: item.kind,
                name: item.name,
                file_name: item.file_name,
                sealed: item.sealed,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn get(&self, owner: OwnerId, id: ItemId) -> Result<Option<VaultItem>, VaultError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| VaultError::LockPoisoned("memory store"))?;
        Ok(inner.items.get(&id).filter(|item| item.owner == owner).cloned())
    }

    fn list(&self, owner: OwnerId, kind: Option<ItemKind>) -> Result<Vec<VaultItem>, VaultError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| VaultError::LockPoisoned("memory store"))?;
        Ok(inner
            .items
            .values()
            .filter(|item| item.owner == owner)
            .filter(|item| kind.map_or(true, |k| item.kind == k))
            .cloned()
            .collect())
    }

    fn replace(
        &self,
        owner: OwnerId,
        id: ItemId,
        name: String,
        sealed: SealedRecord,
    ) -> Result<bool, VaultError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| VaultError::LockPoisoned("memory store"))?;
        match inner.items.get_mut(&id) {
            Some(item) if item.owner == owner => {
                item.name = name;
                item.sealed = sealed;
                item.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn remove(&self, owner: OwnerId, id: ItemId) -> Result<bool, VaultError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| VaultError::LockPoisoned("memory store"))?;
        if inner.items.get(&id).is_some_and(|item| item.owner == owner) {
            inner.items.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
