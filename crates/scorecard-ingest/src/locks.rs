//! Keyed per-project locks.
//!
//! Two uploads for the same project run one after the other; uploads for
//! different projects never wait on each other.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct ProjectLocks {
  inner: Arc<Mutex<HashMap<Uuid, Weak<AsyncMutex<()>>>>>,
}

impl ProjectLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `project_id`. Released when the guard drops.
  pub async fn acquire(&self, project_id: Uuid) -> OwnedMutexGuard<()> {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries for projects nobody holds any more.
      map.retain(|_, lock| lock.strong_count() > 0);
      match map.get(&project_id).and_then(Weak::upgrade) {
        Some(lock) => lock,
        None => {
          let lock = Arc::new(AsyncMutex::new(()));
          map.insert(project_id, Arc::downgrade(&lock));
          lock
        }
      }
    };
    lock.lock_owned().await
  }

  /// Number of projects with a live lock.
  pub fn active(&self) -> usize {
    let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
    map.values().filter(|lock| lock.strong_count() > 0).count()
  }
}
