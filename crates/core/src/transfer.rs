//! Single-slot shot transfer between pipeline stages.
//!
//! A breakdown view hands its converted shots to post-production by writing
//! them into one slot; the consumer reads and clears the slot in one step.
//!
//! - A write overwrites whatever the slot held (last writer wins).
//! - A read consumes: the slot is empty afterwards, so a payload is
//!   delivered at most once.
//! - A payload that fails to parse is logged and discarded; the read
//!   reports "nothing to retrieve".
//!
//! Slots are namespaced by session, so two clients never see each other's
//! shots. There is no merging, retry or cross-session coordination.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::shot::PostProductionShot;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Base key of the transfer slot.
pub const TRANSFER_KEY: &str = "postProductionShots";

/// Maximum number of shots accepted in one transfer.
pub const MAX_TRANSFER_SHOTS: usize = 1_000;

/// Maximum length of a session identifier.
pub const MAX_SESSION_ID_LENGTH: usize = 128;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// What is written to the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEnvelope {
    pub shots: Vec<PostProductionShot>,
    pub source: String,
    pub transferred_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Key-value backend for transfer slots.
///
/// `take` must read and delete in one step so concurrent readers cannot
/// both receive the same payload.
pub trait TransferStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: String) -> Result<(), CoreError>;

    /// Remove and return the value under `key`.
    fn take(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Whether a value exists under `key`, without consuming it.
    fn contains(&self, key: &str) -> Result<bool, CoreError>;

    /// Drop the value under `key`, if any.
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

/// In-process store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, CoreError> {
        self.slots
            .lock()
            .map_err(|_| CoreError::Storage("transfer store lock poisoned".to_string()))
    }
}

impl TransferStore for MemoryStore {
    fn put(&self, key: &str, value: String) -> Result<(), CoreError> {
        self.slots()?.insert(key.to_string(), value);
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.slots()?.remove(key))
    }

    fn contains(&self, key: &str) -> Result<bool, CoreError> {
        Ok(self.slots()?.contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.slots()?.remove(key);
        Ok(())
    }
}

/// Directory-backed store: one JSON file per key.
///
/// Writes go through a temporary file and a rename; reads rename the file
/// away before reading it, so only one reader can win a payload even across
/// processes sharing the directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    counter: AtomicU64,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            CoreError::Storage(format!("cannot create transfer dir {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            counter: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    fn scratch_path(&self, path: &Path, kind: &str) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("{kind}-{}-{n}", std::process::id()))
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Storage(format!("cannot {action} {}: {err}", path.display()))
}

impl TransferStore for FileStore {
    fn put(&self, key: &str, value: String) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let tmp = self.scratch_path(&path, "tmp");
        fs::write(&tmp, value).map_err(|e| io_error("write", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error("replace", &path, e))
    }

    fn take(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.path_for(key);
        let claimed = self.scratch_path(&path, "taken");
        match fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("claim", &path, e)),
        }
        let contents = fs::read_to_string(&claimed).map_err(|e| io_error("read", &claimed, e));
        let _ = fs::remove_file(&claimed);
        contents.map(Some)
    }

    fn contains(&self, key: &str) -> Result<bool, CoreError> {
        Ok(self.path_for(key).is_file())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// Slot key for a session. An empty session maps to the bare base key.
pub fn transfer_key(session: &str) -> String {
    if session.is_empty() {
        TRANSFER_KEY.to_string()
    } else {
        format!("{TRANSFER_KEY}:{session}")
    }
}

/// Validate a client-supplied session identifier.
pub fn validate_session_id(session: &str) -> Result<(), CoreError> {
    if session.len() > MAX_SESSION_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "Session id exceeds maximum length of {MAX_SESSION_ID_LENGTH} characters (got {})",
            session.len()
        )));
    }
    if !session
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CoreError::Validation(
            "Session id may only contain ASCII letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

/// Moves converted shots through a [`TransferStore`].
#[derive(Clone)]
pub struct TransferBridge {
    store: Arc<dyn TransferStore>,
}

impl TransferBridge {
    pub fn new(store: impl TransferStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Write `shots` into the session's slot, replacing any pending payload.
    pub fn store_shots_for_transfer(
        &self,
        session: &str,
        shots: Vec<PostProductionShot>,
        source: &str,
        transferred_at: Timestamp,
    ) -> Result<usize, CoreError> {
        if shots.len() > MAX_TRANSFER_SHOTS {
            return Err(CoreError::Validation(format!(
                "Transfer exceeds maximum of {MAX_TRANSFER_SHOTS} shots (got {})",
                shots.len()
            )));
        }

        let count = shots.len();
        let envelope = TransferEnvelope {
            shots,
            source: source.to_string(),
            transferred_at,
        };
        let payload = serde_json::to_string(&envelope)?;
        self.store.put(&transfer_key(session), payload)?;

        tracing::info!(session, count, source, "Stored shots for transfer");
        Ok(count)
    }

    /// Consume the session's pending payload.
    ///
    /// Returns `Ok(None)` when the slot is empty or its payload is corrupt;
    /// either way the slot is empty afterwards.
    pub fn retrieve_transferred_shots(
        &self,
        session: &str,
    ) -> Result<Option<TransferEnvelope>, CoreError> {
        let Some(payload) = self.store.take(&transfer_key(session))? else {
            return Ok(None);
        };

        match serde_json::from_str::<TransferEnvelope>(&payload) {
            Ok(envelope) => {
                tracing::info!(
                    session,
                    count = envelope.shots.len(),
                    source = %envelope.source,
                    "Retrieved transferred shots"
                );
                Ok(Some(envelope))
            }
            Err(e) => {
                tracing::warn!(session, error = %e, "Discarding unreadable transfer payload");
                Ok(None)
            }
        }
    }

    /// Whether the session has a pending payload. Does not consume it.
    pub fn has_transferred_shots(&self, session: &str) -> Result<bool, CoreError> {
        self.store.contains(&transfer_key(session))
    }

    /// Drop the session's pending payload, if any.
    pub fn clear_transferred_shots(&self, session: &str) -> Result<(), CoreError> {
        self.store.remove(&transfer_key(session))
    }

    /// Write a raw payload into the session's slot, bypassing validation.
    #[cfg(test)]
    fn put_raw(&self, session: &str, payload: &str) -> Result<(), CoreError> {
        self.store.put(&transfer_key(session), payload.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
