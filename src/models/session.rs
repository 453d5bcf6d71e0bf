use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::Display;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HistoryStatus {
    Done,
    Failed,
}

/// One analysed image in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub status: HistoryStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Input image of the last successful detection, kept so follow-up
/// questions can be asked without uploading it again.
#[derive(Debug, Clone)]
pub struct CachedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

/// Per-user interactive session. History is append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    history: Vec<HistoryEntry>,
    #[serde(skip)]
    image: Option<CachedImage>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            history: Vec::new(),
            image: None,
        }
    }

    /// Replace the cached image.
    pub fn cache_image(&mut self, image: CachedImage) {
        self.image = Some(image);
    }

    pub fn cached_image(&self) -> Option<&CachedImage> {
        self.image.as_ref()
    }

    pub fn record(&mut self, filename: impl Into<String>, status: HistoryStatus) {
        self.history.push(HistoryEntry {
            filename: filename.into(),
            status,
            recorded_at: Utc::now(),
        });
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory sessions, discarded on process exit.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Session {
        let session = Session::new();
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Append to a session's history. Returns false if the session is gone.
    pub async fn record(&self, id: Uuid, filename: impl Into<String>, status: HistoryStatus) -> bool {
        match self.sessions.write().await.get_mut(&id) {
            Some(session) => {
                session.record(filename, status);
                true
            }
            None => false,
        }
    }

    /// Cache the session's current image. Returns false if the session is gone.
    pub async fn cache_image(&self, id: Uuid, image: CachedImage) -> bool {
        match self.sessions.write().await.get_mut(&id) {
            Some(session) => {
                session.cache_image(image);
                true
            }
            None => false,
        }
    }

    pub async fn cached_image(&self, id: Uuid) -> Option<CachedImage> {
        self.sessions
            .read()
            .await
            .get(&id)
            .and_then(|s| s.cached_image().cloned())
    }

    pub async fn history(&self, id: Uuid) -> Option<Vec<HistoryEntry>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|s| s.history().to_vec())
    }

    /// End a session, dropping its history and cached image.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
