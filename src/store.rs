use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::grade::Grade;

const MIGRATION_SQL_0001: &str = include_str!("../migrations/0001_grade_blobs.sql");

fn now_iso() -> String {
  Utc::now().to_rfc3339()
}

/// Card id to grade string. A missing key means the card is unranked.
///
/// Keys are kept sorted so the JSON form is canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeStore {
  grades: BTreeMap<String, String>,
}

impl GradeStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Full replacement source for imports and persisted blobs. Values are kept
  /// verbatim, even ones that are not among the thirteen grades.
  pub fn from_map(grades: BTreeMap<String, String>) -> Self {
    Self { grades }
  }

  pub fn get(&self, card_id: &str) -> Option<&str> {
    self.grades.get(card_id).map(String::as_str)
  }

  pub fn contains(&self, card_id: &str) -> bool {
    self.grades.contains_key(card_id)
  }

  pub fn upsert(&mut self, card_id: impl Into<String>, grade: Grade) {
    self.grades.insert(card_id.into(), grade.as_str().to_string());
  }

  pub fn len(&self) -> usize {
    self.grades.len()
  }

  pub fn is_empty(&self) -> bool {
    self.grades.is_empty()
  }

  pub fn unranked_count(&self, catalog: &Catalog) -> usize {
    catalog
      .cards()
      .iter()
      .filter(|card| !self.contains(&card.id))
      .count()
  }

  pub fn orphan_count(&self, catalog: &Catalog) -> usize {
    self
      .grades
      .keys()
      .filter(|id| !catalog.contains(id))
      .count()
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(body)
  }

  /// Reads the persisted blob. An absent blob is an empty store.
  pub fn load_from(blobs: &dyn BlobStore, key: &str) -> Result<Self, StoreError> {
    match blobs.load(key)? {
      Some(payload) => Ok(Self::from_json(&payload)?),
      None => Ok(Self::new()),
    }
  }

  pub fn save_to(&self, blobs: &dyn BlobStore, key: &str) -> Result<(), StoreError> {
    let payload = self
      .to_json()
      .map_err(|e| StoreError::Persist(e.to_string()))?;
    blobs.save(key, &payload)
  }
}

/// Opaque key-value text storage for the persisted grade blob.
pub trait BlobStore {
  fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn save(&self, key: &str, payload: &str) -> Result<(), StoreError>;
}

/// In-process blob store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
  blobs: Rc<RefCell<HashMap<String, String>>>,
  fail_writes: Rc<RefCell<bool>>,
}

impl MemoryBlobStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_blob(key: &str, payload: &str) -> Self {
    let store = Self::new();
    store
      .blobs
      .borrow_mut()
      .insert(key.to_string(), payload.to_string());
    store
  }

  pub fn set_fail_writes(&self, fail: bool) {
    *self.fail_writes.borrow_mut() = fail;
  }

  pub fn raw(&self, key: &str) -> Option<String> {
    self.blobs.borrow().get(key).cloned()
  }
}

impl BlobStore for MemoryBlobStore {
  fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.raw(key))
  }

  fn save(&self, key: &str, payload: &str) -> Result<(), StoreError> {
    if *self.fail_writes.borrow() {
      return Err(StoreError::Persist("memory store is read-only".to_string()));
    }
    self
      .blobs
      .borrow_mut()
      .insert(key.to_string(), payload.to_string());
    Ok(())
  }
}

/// SQLite-backed blob store, one connection per call.
#[derive(Debug, Clone)]
pub struct SqliteBlobStore {
  db_path: PathBuf,
}

impl SqliteBlobStore {
  pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let db_path = db_path.into();
    init_database(&db_path)?;
    Ok(Self { db_path })
  }

  pub fn db_path(&self) -> &Path {
    &self.db_path
  }

  /// Records the catalog fingerprint for a set and returns the previous one.
  pub fn remember_catalog(
    &self,
    set_code: &str,
    fingerprint: &str,
    card_count: usize,
  ) -> Result<Option<String>, StoreError> {
    let connection = open_database(&self.db_path)?;
    let previous: Option<String> = connection
      .query_row(
        "SELECT fingerprint FROM catalog_state WHERE set_code = ?1 LIMIT 1",
        params![set_code],
        |row| row.get(0),
      )
      .optional()?;

    connection.execute(
      "INSERT INTO catalog_state (set_code, fingerprint, card_count, seen_at)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT(set_code) DO UPDATE SET
         fingerprint = excluded.fingerprint,
         card_count = excluded.card_count,
         seen_at = excluded.seen_at",
      params![set_code, fingerprint, card_count as i64, now_iso()],
    )?;

    Ok(previous)
  }
}

impl BlobStore for SqliteBlobStore {
  fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
    let connection = open_database(&self.db_path)?;
    let payload: Option<String> = connection
      .query_row(
        "SELECT payload FROM grade_blobs WHERE storage_key = ?1 LIMIT 1",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(payload)
  }

  fn save(&self, key: &str, payload: &str) -> Result<(), StoreError> {
    let connection = open_database(&self.db_path)?;
    connection.execute(
      "INSERT INTO grade_blobs (storage_key, payload, updated_at)
       VALUES (?1, ?2, ?3)
       ON CONFLICT(storage_key) DO UPDATE SET
         payload = excluded.payload,
         updated_at = excluded.updated_at",
      params![key, payload, now_iso()],
    )?;
    Ok(())
  }
}

fn init_database(db_path: &Path) -> Result<(), StoreError> {
  if let Some(parent) = db_path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }

  let connection = Connection::open(db_path)?;
  connection.execute_batch(MIGRATION_SQL_0001)?;
  Ok(())
}

fn open_database(db_path: &Path) -> Result<Connection, StoreError> {
  Ok(Connection::open(db_path)?)
}
