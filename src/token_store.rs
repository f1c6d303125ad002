use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Revocation set for logged-out access tokens plus the single-slot refresh
/// token map (one live refresh token per user).
///
/// The trait is the seam for a durable backing (e.g. a key-value store); the
/// shipped implementation is in-memory, so every entry is lost on process
/// restart and revoked tokens are honored again until their natural expiry.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Blacklist an access token. Revoking the same token twice is a no-op.
    async fn revoke(&self, token: &str);

    async fn is_revoked(&self, token: &str) -> bool;

    /// Store a user's refresh token, replacing whatever was there.
    async fn store_refresh(&self, user_id: Uuid, token: String);

    async fn current_refresh(&self, user_id: Uuid) -> Option<String>;

    /// Swap the stored refresh token for `new` only if `old` still matches.
    /// Returns false when another rotation already won the slot.
    async fn rotate_refresh(&self, user_id: Uuid, old: &str, new: String) -> bool;
}

#[derive(Default)]
pub struct InMemoryTokenStore {
    revoked: RwLock<HashSet<String>>,
    refresh: RwLock<HashMap<Uuid, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn revoke(&self, token: &str) {
        self.revoked.write().await.insert(token.to_string());
    }

    async fn is_revoked(&self, token: &str) -> bool {
        self.revoked.read().await.contains(token)
    }

    async fn store_refresh(&self, user_id: Uuid, token: String) {
        self.refresh.write().await.insert(user_id, token);
    }

    async fn current_refresh(&self, user_id: Uuid) -> Option<String> {
        self.refresh.read().await.get(&user_id).cloned()
    }

    async fn rotate_refresh(&self, user_id: Uuid, old: &str, new: String) -> bool {
        let mut slots = self.refresh.write().await;
        match slots.get(&user_id) {
            Some(current) if current == old => {
                slots.insert(user_id, new);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = InMemoryTokenStore::new();
        assert!(!store.is_revoked("tok").await);
        store.revoke("tok").await;
        store.revoke("tok").await;
        assert!(store.is_revoked("tok").await);
        assert!(!store.is_revoked("other").await);
    }

    #[tokio::test]
    async fn store_refresh_overwrites_previous_slot() {
        let store = InMemoryTokenStore::new();
        let user = Uuid::new_v4();
        store.store_refresh(user, "first".into()).await;
        store.store_refresh(user, "second".into()).await;
        assert_eq!(store.current_refresh(user).await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn rotate_requires_exact_match() {
        let store = InMemoryTokenStore::new();
        let user = Uuid::new_v4();
        store.store_refresh(user, "current".into()).await;

        assert!(!store.rotate_refresh(user, "stale", "next".into()).await);
        assert_eq!(
            store.current_refresh(user).await.as_deref(),
            Some("current")
        );

        assert!(store.rotate_refresh(user, "current", "next".into()).await);
        assert_eq!(store.current_refresh(user).await.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn only_one_concurrent_rotation_wins() {
        let store = InMemoryTokenStore::new();
        let user = Uuid::new_v4();
        store.store_refresh(user, "shared".into()).await;

        let winner = store.rotate_refresh(user, "shared", "a".into()).await;
        let loser = store.rotate_refresh(user, "shared", "b".into()).await;

        assert!(winner);
        assert!(!loser);
        assert_eq!(store.current_refresh(user).await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn rotate_fails_for_unknown_user() {
        let store = InMemoryTokenStore::new();
        assert!(
            !store
                .rotate_refresh(Uuid::new_v4(), "anything", "next".into())
                .await
        );
    }
}
