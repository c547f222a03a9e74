use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::wizard::Wizard;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub wizard: Wizard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory sessions. Every access is a short synchronous closure; the lock
/// is never held across an await.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn create(&self) -> Session {
        let now = Utc::now();
        let session = Session { id: Uuid::new_v4(), wizard: Wizard::new(), created_at: now, updated_at: now };
        self.inner.write().insert(session.id, session.clone());
        session
    }

    pub fn read<R>(&self, id: Uuid, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.inner.read().get(&id).map(f)
    }

    pub fn update<R>(&self, id: Uuid, f: impl FnOnce(&mut Wizard) -> R) -> Option<R> {
        let mut guard = self.inner.write();
        let session = guard.get_mut(&id)?;
        let out = f(&mut session.wizard);
        session.updated_at = Utc::now();
        Some(out)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.inner.write().remove(&id).is_some()
    }

    /// Drops sessions with no update for longer than `ttl`. Returns how many went.
    pub fn evict_idle(&self, ttl: TimeDelta) -> usize {
        Utc::now().checked_sub_signed(ttl).map_or(0, |cutoff| self.evict_before(cutoff))
    }

    fn evict_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut guard = self.inner.write();
        let before = guard.len();
        guard.retain(|_, s| s.updated_at >= cutoff);
        before - guard.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
