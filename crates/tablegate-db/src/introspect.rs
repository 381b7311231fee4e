//! Best-effort schema introspection of external databases.
//!
//! Introspection is exploratory: it opens a fresh short-lived connection
//! (never the cached pool), queries the driver's standard metadata, and
//! closes on all paths. Any failure collapses to an empty result so the
//! admin flows that call it keep working.

use sqlx::AnyConnection;
use sqlx::{Connection, Row};
use tracing::{debug, warn};

use tablegate_config::SecretCipher;
use tablegate_core::{DbConnectionDescriptor, DriverKind};

use crate::error::{DbError, Result};
use crate::pool::{connect_url, install_drivers};

/// Lists tables and columns of external databases via metadata queries.
#[derive(Clone)]
pub struct SchemaIntrospector {
    cipher: SecretCipher,
}

impl SchemaIntrospector {
    pub fn new(cipher: SecretCipher) -> Self {
        Self { cipher }
    }

    /// Table (and view) names reachable through the descriptor, or an empty
    /// list if anything goes wrong.
    pub async fn list_tables(&self, descriptor: &DbConnectionDescriptor) -> Vec<String> {
        match self.tables(descriptor).await {
            Ok(tables) => tables,
            Err(e) => {
                warn!(
                    connection = %descriptor.name,
                    error = %e,
                    "Table introspection failed"
                );
                Vec::new()
            }
        }
    }

    /// Column names of one table in ordinal order, or an empty list if
    /// anything goes wrong.
    pub async fn list_columns(
        &self,
        descriptor: &DbConnectionDescriptor,
        table_name: &str,
    ) -> Vec<String> {
        match self.columns(descriptor, table_name).await {
            Ok(columns) => columns,
            Err(e) => {
                warn!(
                    connection = %descriptor.name,
                    table = %table_name,
                    error = %e,
                    "Column introspection failed"
                );
                Vec::new()
            }
        }
    }

    async fn tables(&self, descriptor: &DbConnectionDescriptor) -> Result<Vec<String>> {
        let sql = match descriptor.driver {
            DriverKind::Postgres => {
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY table_name"
            }
            DriverKind::MySql => {
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() \
                 ORDER BY table_name"
            }
            DriverKind::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name"
            }
        };

        let mut conn = self.open(descriptor).await?;
        let result = sqlx::query(sql).fetch_all(&mut conn).await;
        let _ = conn.close().await;

        let names = result?
            .iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(connection = %descriptor.name, count = names.len(), "Listed tables");
        Ok(names)
    }

    async fn columns(
        &self,
        descriptor: &DbConnectionDescriptor,
        table_name: &str,
    ) -> Result<Vec<String>> {
        let sql = match descriptor.driver {
            DriverKind::Postgres => {
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = $1 \
                 ORDER BY ordinal_position"
            }
            DriverKind::MySql => {
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ? \
                 ORDER BY ordinal_position"
            }
            // pragma_table_info returns rows in column (cid) order.
            DriverKind::Sqlite => "SELECT name FROM pragma_table_info(?)",
        };

        let mut conn = self.open(descriptor).await?;
        let result = sqlx::query(sql)
            .bind(table_name)
            .fetch_all(&mut conn)
            .await;
        let _ = conn.close().await;

        let names = result?
            .iter()
            .map(|row| row.try_get::<String, _>(0))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            connection = %descriptor.name,
            table = %table_name,
            count = names.len(),
            "Listed columns"
        );
        Ok(names)
    }

    async fn open(&self, descriptor: &DbConnectionDescriptor) -> Result<AnyConnection> {
        install_drivers();

        let password = if descriptor.password.is_empty() {
            String::new()
        } else {
            self.cipher
                .decrypt(&descriptor.password)
                .map_err(DbError::credential)?
        };

        let url = connect_url(descriptor, &password)?;
        Ok(AnyConnection::connect(&url).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sqlite_descriptor(path: &std::path::Path) -> DbConnectionDescriptor {
        DbConnectionDescriptor {
            id: Uuid::new_v4(),
            name: "introspect-test".to_string(),
            url: format!("sqlite:{}?mode=rwc", path.display()),
            username: String::new(),
            password: String::new(),
            driver: DriverKind::Sqlite,
        }
    }

    async fn seed(path: &std::path::Path) {
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = crate::pool::create_pool(&url).await.unwrap();
        sqlx::query("CREATE TABLE orders (id INTEGER, customer TEXT, total REAL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE customers (id INTEGER, name TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;
    }

    #[tokio::test]
    async fn test_list_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.db");
        seed(&path).await;

        let introspector = SchemaIntrospector::new(SecretCipher::new("test"));
        let tables = introspector.list_tables(&sqlite_descriptor(&path)).await;
        assert_eq!(tables, ["customers", "orders"]);
    }

    #[tokio::test]
    async fn test_list_columns_in_ordinal_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.db");
        seed(&path).await;

        let introspector = SchemaIntrospector::new(SecretCipher::new("test"));
        let columns = introspector
            .list_columns(&sqlite_descriptor(&path), "orders")
            .await;
        assert_eq!(columns, ["id", "customer", "total"]);
    }

    #[tokio::test]
    async fn test_unknown_table_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.db");
        seed(&path).await;

        let introspector = SchemaIntrospector::new(SecretCipher::new("test"));
        let columns = introspector
            .list_columns(&sqlite_descriptor(&path), "nothing_here")
            .await;
        assert!(columns.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_database_yields_empty() {
        let descriptor = DbConnectionDescriptor {
            id: Uuid::new_v4(),
            name: "unreachable".to_string(),
            url: "postgres://127.0.0.1:1/nope".to_string(),
            username: "user".to_string(),
            password: String::new(),
            driver: DriverKind::Postgres,
        };

        let introspector = SchemaIntrospector::new(SecretCipher::new("test"));
        assert!(introspector.list_tables(&descriptor).await.is_empty());
        assert!(
            introspector
                .list_columns(&descriptor, "orders")
                .await
                .is_empty()
        );
    }
}
