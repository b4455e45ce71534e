use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::auth::OAuthError;
use crate::core::ShopDomain;

#[derive(Debug, Clone)]
struct PendingAuthorization {
    shop: ShopDomain,
    created_at: Instant,
}

/// State tokens handed out by `/auth` and not yet seen on a callback.
/// In memory, so a restart invalidates authorizations in flight.
#[derive(Clone, Default)]
pub struct OAuthStateStore {
    pending: Arc<RwLock<HashMap<String, PendingAuthorization>>>,
}

impl OAuthStateStore {
    pub async fn remember(&self, state: &str, shop: &ShopDomain, timeout: Duration) {
        let mut pending = self.pending.write().await;
        pending.retain(|_, p| p.created_at.elapsed() <= timeout);
        pending.insert(
            state.to_string(),
            PendingAuthorization {
                shop: shop.clone(),
                created_at: Instant::now(),
            },
        );
    }

    /// Single use: the state is removed whether or not it validates.
    pub async fn consume(&self, state: Option<&str>, shop: &ShopDomain, timeout: Duration) -> Result<(), OAuthError> {
        let state = state.filter(|s| !s.is_empty()).ok_or(OAuthError::InvalidState)?;
        let pending = self.pending.write().await.remove(state).ok_or(OAuthError::InvalidState)?;

        if pending.created_at.elapsed() > timeout {
            tracing::warn!(shop = %shop, "OAuth state expired");
            return Err(OAuthError::StateExpired);
        }
        if &pending.shop != shop {
            tracing::warn!(expected = %pending.shop, received = %shop, "OAuth state issued for another shop");
            return Err(OAuthError::InvalidState);
        }
        Ok(())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.pending.read().await.len()
    }
}

#[must_use]
pub fn state_timeout(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(name: &str) -> ShopDomain {
        ShopDomain::normalize(name).unwrap()
    }

    #[tokio::test]
    async fn state_is_single_use() {
        let store = OAuthStateStore::default();
        let timeout = state_timeout(10);
        store.remember("s1", &shop("acme"), timeout).await;

        assert!(store.consume(Some("s1"), &shop("acme"), timeout).await.is_ok());
        assert!(matches!(store.consume(Some("s1"), &shop("acme"), timeout).await, Err(OAuthError::InvalidState)));
    }

    #[tokio::test]
    async fn state_must_match_the_shop() {
        let store = OAuthStateStore::default();
        let timeout = state_timeout(10);
        store.remember("s1", &shop("acme"), timeout).await;

        assert!(matches!(store.consume(Some("s1"), &shop("other"), timeout).await, Err(OAuthError::InvalidState)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn missing_or_expired_state_is_rejected() {
        let store = OAuthStateStore::default();
        assert!(matches!(store.consume(None, &shop("acme"), state_timeout(10)).await, Err(OAuthError::InvalidState)));

        store.remember("s1", &shop("acme"), state_timeout(10)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(matches!(store.consume(Some("s1"), &shop("acme"), Duration::ZERO).await, Err(OAuthError::StateExpired)));
    }
}
