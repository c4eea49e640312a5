//! Shared lives counter, persisted across sessions.
//!
//! The counter lives outside the quiz engine so menus and other screens can
//! read and modify it between runs. Every change is written through to the
//! store; a failed write keeps the in-memory count and logs a warning, so
//! play continues with stale persistence rather than stopping.

use std::fmt;
use std::sync::Arc;

use quiz_core::model::UserId;
use storage::repository::LivesStore;
use tracing::warn;

/// Result of a lives decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivesUpdate {
    pub remaining: u32,
    pub exhausted: bool,
}

/// Per-user lives counter backed by a [`LivesStore`].
pub struct LivesService {
    user_id: UserId,
    initial: u32,
    remaining: u32,
    store: Arc<dyn LivesStore>,
}

impl LivesService {
    /// Loads the persisted count for the user, falling back to `initial`
    /// when no state is saved or the load fails.
    pub async fn load(user_id: UserId, initial: u32, store: Arc<dyn LivesStore>) -> Self {
        let remaining = match store.load_lives(user_id).await {
            Ok(Some(saved)) => saved,
            Ok(None) => initial,
            Err(err) => {
                warn!(user = %user_id, error = %err, "lives load failed, using initial count");
                initial
            }
        };
        Self {
            user_id,
            initial,
            remaining,
            store,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Removes one life, saturating at zero, and persists the new count.
    pub async fn decrement(&mut self) -> LivesUpdate {
        self.remaining = self.remaining.saturating_sub(1);
        self.persist().await;
        LivesUpdate {
            remaining: self.remaining,
            exhausted: self.remaining == 0,
        }
    }

    /// Grants one life, capped at the initial count.
    pub async fn increment(&mut self) -> u32 {
        if self.remaining < self.initial {
            self.remaining += 1;
            self.persist().await;
        }
        self.remaining
    }

    /// Restores the full initial count.
    pub async fn reset(&mut self) -> u32 {
        self.remaining = self.initial;
        self.persist().await;
        self.remaining
    }

    async fn persist(&self) {
        if let Err(err) = self.store.save_lives(self.user_id, self.remaining).await {
            warn!(user = %self.user_id, error = %err, "failed to persist lives count");
        }
    }
}

impl fmt::Debug for LivesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivesService")
            .field("user_id", &self.user_id)
            .field("initial", &self.initial)
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::repository::{InMemoryRepository, StorageError};

    async fn service_with(initial: u32) -> (LivesService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let store: Arc<dyn LivesStore> = Arc::new(repo.clone());
        let service = LivesService::load(UserId::new(1), initial, store).await;
        (service, repo)
    }

    #[tokio::test]
    async fn starts_at_initial_without_saved_state() {
        let (service, _repo) = service_with(3).await;
        assert_eq!(service.remaining(), 3);
        assert!(!service.is_exhausted());
    }

    #[tokio::test]
    async fn resumes_from_persisted_count() {
        let repo = InMemoryRepository::new();
        repo.save_lives(UserId::new(1), 1).await.unwrap();

        let store: Arc<dyn LivesStore> = Arc::new(repo);
        let service = LivesService::load(UserId::new(1), 3, store).await;
        assert_eq!(service.remaining(), 1);
    }

    #[tokio::test]
    async fn decrement_persists_and_signals_exhaustion() {
        let (mut service, repo) = service_with(2).await;

        let first = service.decrement().await;
        assert_eq!(first.remaining, 1);
        assert!(!first.exhausted);
        assert_eq!(repo.load_lives(UserId::new(1)).await.unwrap(), Some(1));

        let second = service.decrement().await;
        assert!(second.exhausted);

        // Saturates at zero.
        let third = service.decrement().await;
        assert_eq!(third.remaining, 0);
        assert!(third.exhausted);
    }

    #[tokio::test]
    async fn increment_caps_at_initial() {
        let (mut service, _repo) = service_with(3).await;
        service.decrement().await;

        assert_eq!(service.increment().await, 3);
        assert_eq!(service.increment().await, 3);
    }

    #[tokio::test]
    async fn reset_restores_full_count() {
        let (mut service, repo) = service_with(3).await;
        service.decrement().await;
        service.decrement().await;

        assert_eq!(service.reset().await, 3);
        assert_eq!(repo.load_lives(UserId::new(1)).await.unwrap(), Some(3));
    }

    struct FailingStore;

    #[async_trait]
    impl LivesStore for FailingStore {
        async fn load_lives(&self, _user: UserId) -> Result<Option<u32>, StorageError> {
            Err(StorageError::Connection("down".into()))
        }

        async fn save_lives(&self, _user: UserId, _lives: u32) -> Result<(), StorageError> {
            Err(StorageError::Connection("down".into()))
        }
    }

    #[tokio::test]
    async fn storage_failures_keep_the_counter_usable() {
        let mut service = LivesService::load(UserId::new(1), 3, Arc::new(FailingStore)).await;
        assert_eq!(service.remaining(), 3);

        let update = service.decrement().await;
        assert_eq!(update.remaining, 2);
    }
}
