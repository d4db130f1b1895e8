use std::collections::{BTreeMap, HashMap, VecDeque};

use parking_lot::RwLock;
use serde::Serialize;

use crate::core::dialogue::{ConversationEntry, DialogueState};

/// Sessions kept when no capacity is configured.
pub const DEFAULT_ARCHIVE_CAPACITY: usize = 256;

/// Read-only copy of a session's dialogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub active: bool,
    pub form_fields: BTreeMap<String, Option<String>>,
    pub conversation: Vec<ConversationEntry>,
}

impl SessionSnapshot {
    pub fn new(session_id: &str, dialogue: &DialogueState, active: bool) -> Self {
        Self {
            session_id: session_id.to_string(),
            active,
            form_fields: dialogue.form_fields().clone(),
            conversation: dialogue.history().to_vec(),
        }
    }
}

#[derive(Default)]
struct ArchiveInner {
    sessions: HashMap<String, SessionSnapshot>,
    order: VecDeque<String>,
}

/// In-memory registry of recent session snapshots, oldest evicted first.
pub struct SessionArchive {
    inner: RwLock<ArchiveInner>,
    capacity: usize,
}

impl SessionArchive {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(ArchiveInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Insert or replace the snapshot for its session.
    pub fn publish(&self, snapshot: SessionSnapshot) {
        let mut inner = self.inner.write();
        let id = snapshot.session_id.clone();
        if inner.sessions.insert(id.clone(), snapshot).is_none() {
            inner.order.push_back(id);
        }

        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.sessions.remove(&oldest);
            }
        }
    }

    pub fn get(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.inner.read().sessions.get(session_id).cloned()
    }

    /// Archived session ids, oldest first.
    pub fn session_ids(&self) -> Vec<String> {
        self.inner.read().order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionArchive {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_CAPACITY)
    }
}
