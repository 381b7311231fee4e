//! Process-local cache of external connection resources.
//!
//! One [`DataSource`] per connection descriptor, built lazily on first use
//! and torn down on invalidation. Construction is single-flight: concurrent
//! `resolve` calls for the same descriptor share one pool build, while
//! different descriptors proceed independently. The map guard only covers
//! slot bookkeeping; decryption and the blocking connect happen outside it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

use tablegate_config::SecretCipher;
use tablegate_core::DbConnectionDescriptor;

use crate::error::{DbError, Result};
use crate::pool::{DataSource, connect_url, create_pool, mask_password};

/// Cache of live connection resources keyed by descriptor identity.
pub struct ConnectionHub {
    cipher: SecretCipher,
    slots: DashMap<Uuid, Arc<OnceCell<DataSource>>>,
}

impl ConnectionHub {
    pub fn new(cipher: SecretCipher) -> Self {
        Self {
            cipher,
            slots: DashMap::new(),
        }
    }

    /// Returns the cached handle for this descriptor, constructing it at
    /// most once under concurrent callers.
    ///
    /// A failed construction leaves the slot empty, so the next caller
    /// retries instead of caching the failure.
    pub async fn resolve(&self, descriptor: &DbConnectionDescriptor) -> Result<DataSource> {
        let slot = self
            .slots
            .entry(descriptor.id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let source = slot
            .get_or_try_init(|| self.build(descriptor))
            .await?
            .clone();

        Ok(source)
    }

    async fn build(&self, descriptor: &DbConnectionDescriptor) -> Result<DataSource> {
        let password = if descriptor.password.is_empty() {
            String::new()
        } else {
            self.cipher
                .decrypt(&descriptor.password)
                .map_err(DbError::credential)?
        };

        let url = connect_url(descriptor, &password)?;
        info!(
            connection_id = %descriptor.id,
            url = %mask_password(&url),
            "Building connection resource"
        );

        let pool = create_pool(&url).await?;
        Ok(DataSource {
            pool,
            driver: descriptor.driver,
        })
    }

    /// Removes and releases the cached handle for a descriptor.
    ///
    /// A subsequent `resolve` rebuilds from the (possibly updated)
    /// descriptor. Callers already holding the handle keep a pool that is
    /// draining; their in-flight statements complete, new acquires fail and
    /// surface as upstream errors.
    pub async fn invalidate(&self, id: Uuid) {
        if let Some((_, slot)) = self.slots.remove(&id) {
            if let Some(source) = slot.get() {
                source.pool.close().await;
                info!(connection_id = %id, "Connection resource released");
            } else {
                warn!(connection_id = %id, "Invalidated a connection resource that never finished building");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for ConnectionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHub")
            .field("cached", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablegate_core::DriverKind;

    fn sqlite_descriptor(path: &std::path::Path) -> DbConnectionDescriptor {
        DbConnectionDescriptor {
            id: Uuid::new_v4(),
            name: "sqlite-test".to_string(),
            url: format!("sqlite:{}?mode=rwc", path.display()),
            username: String::new(),
            password: String::new(),
            driver: DriverKind::Sqlite,
        }
    }

    #[tokio::test]
    async fn test_resolve_caches_one_resource() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = sqlite_descriptor(&dir.path().join("hub.db"));
        let hub = ConnectionHub::new(SecretCipher::new("test"));

        let a = hub.resolve(&descriptor).await.unwrap();
        let b = hub.resolve(&descriptor).await.unwrap();
        assert_eq!(hub.len(), 1);

        // Both handles are usable.
        sqlx::query("SELECT 1").execute(&a.pool).await.unwrap();
        sqlx::query("SELECT 1").execute(&b.pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_resolves_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = sqlite_descriptor(&dir.path().join("hub.db"));
        let hub = Arc::new(ConnectionHub::new(SecretCipher::new("test")));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let hub = Arc::clone(&hub);
            let descriptor = descriptor.clone();
            handles.push(tokio::spawn(
                async move { hub.resolve(&descriptor).await },
            ));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(hub.len(), 1, "all callers must share one cached resource");
    }

    #[tokio::test]
    async fn test_invalidate_releases_and_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = sqlite_descriptor(&dir.path().join("hub.db"));
        let hub = ConnectionHub::new(SecretCipher::new("test"));

        let first = hub.resolve(&descriptor).await.unwrap();
        hub.invalidate(descriptor.id).await;
        assert!(hub.is_empty());
        assert!(first.pool.is_closed());

        let rebuilt = hub.resolve(&descriptor).await.unwrap();
        sqlx::query("SELECT 1").execute(&rebuilt.pool).await.unwrap();
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let hub = ConnectionHub::new(SecretCipher::new("test"));
        let descriptor = DbConnectionDescriptor {
            id: Uuid::new_v4(),
            name: "broken".to_string(),
            url: "postgres://127.0.0.1:1/unreachable".to_string(),
            username: "user".to_string(),
            password: String::new(),
            driver: DriverKind::Postgres,
        };

        assert!(hub.resolve(&descriptor).await.is_err());
        // The slot must not cache the failure.
        assert!(hub.resolve(&descriptor).await.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_unknown_id_is_noop() {
        let hub = ConnectionHub::new(SecretCipher::new("test"));
        hub.invalidate(Uuid::new_v4()).await;
        assert!(hub.is_empty());
    }
}
