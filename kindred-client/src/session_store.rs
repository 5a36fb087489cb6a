//! Durable backup of the demo session.
//!
//! One named slot holding the serialized session JSON; absence means "no
//! demo backup available". Session-creation flows write it, the recovery
//! orchestrator reads it and is the only deleter.

use async_trait::async_trait;
use kindred_core::StoredSession;
use std::path::PathBuf;

use crate::error::ClientError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when no backup exists; `Err(Storage)` when a backup
    /// exists but cannot be read or parsed.
    async fn load(&self) -> Result<Option<StoredSession>, ClientError>;
    async fn save(&self, session: &StoredSession) -> Result<(), ClientError>;
    async fn clear(&self) -> Result<(), ClientError>;
}

/// File-backed store: a single JSON document on disk.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ClientError::Storage(format!(
                    "failed to read session backup: {}",
                    err
                )))
            }
        };

        let session: StoredSession = serde_json::from_str(&raw).map_err(|e| {
            ClientError::Storage(format!("session backup is malformed: {}", e))
        })?;

        Ok(Some(session))
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        let serialized = serde_json::to_string(session).map_err(|e| {
            ClientError::Storage(format!("failed to serialize session: {}", e))
        })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ClientError::Storage(format!("failed to create session directory: {}", e))
            })?;
        }

        tokio::fs::write(&self.path, serialized)
            .await
            .map_err(|e| ClientError::Storage(format!("failed to write session backup: {}", e)))
    }

    async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ClientError::Storage(format!(
                "failed to delete session backup: {}",
                err
            ))),
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: std::sync::Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: std::sync::Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, ClientError> {
        let slot = self
            .slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        Ok(slot.clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), ClientError> {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        *slot = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ClientError> {
        let mut slot = self
            .slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        *slot = None;
        Ok(())
    }
}
