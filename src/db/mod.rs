mod revoked;
mod user;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::auth::{CredentialRecord, Principal, PrincipalStore, RevocationList, StoreError};

pub use revoked::RevokedTokenStore;
pub use user::{NewUser, User, UserStore};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        if version < 2 {
            self.migrate_v2().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_email ON users(email)",
            ],
        )
        .await
    }

    async fn migrate_v2(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            2,
            &[
                // Refresh token ids that can no longer be exchanged.
                // expires_at is the token's own expiry in Unix seconds.
                "CREATE TABLE revoked_tokens (
                    jti TEXT PRIMARY KEY NOT NULL,
                    expires_at INTEGER NOT NULL,
                    revoked_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_revoked_tokens_expires_at ON revoked_tokens(expires_at)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the revoked token store.
    pub fn revoked_tokens(&self) -> RevokedTokenStore {
        RevokedTokenStore::new(self.pool.clone())
    }
}

#[async_trait]
impl PrincipalStore for Database {
    async fn lookup_by_credential(
        &self,
        identifier: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let user = self.users().get_by_email(identifier).await?;
        Ok(user.map(|user| CredentialRecord {
            principal: Principal::new(user.id, &user.first_name, &user.last_name),
            password_hash: user.password_hash,
        }))
    }

    async fn lookup_by_id(&self, id: i64) -> Result<Option<Principal>, StoreError> {
        let user = self.users().get_by_id(id).await?;
        Ok(user.map(|user| Principal::new(user.id, &user.first_name, &user.last_name)))
    }
}

#[async_trait]
impl RevocationList for Database {
    async fn is_revoked(&self, token_id: &str) -> Result<bool, StoreError> {
        Ok(self.revoked_tokens().contains(token_id).await?)
    }

    async fn revoke(&self, token_id: &str, expires_at: u64) -> Result<bool, StoreError> {
        Ok(self.revoked_tokens().insert(token_id, expires_at).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> NewUser<'static> {
        NewUser {
            email: "ada@example.com",
            first_name: "Ada",
            last_name: "Lovelace",
            password_hash: "$argon2id$placeholder",
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db.users().create(&ada()).await.unwrap();

        let user = db
            .users()
            .get_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.password_hash, "$argon2id$placeholder");

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_email_is_case_insensitive() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db.users().create(&ada()).await.unwrap();

        let user = db
            .users()
            .get_by_email("ADA@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_email_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users().create(&ada()).await.unwrap();
        let result = db
            .users()
            .create(&NewUser {
                email: "Ada@example.com",
                ..ada()
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db.users().create(&ada()).await.unwrap();
        assert!(db.users().delete(id).await.unwrap());

        assert!(db.users().get_by_id(id).await.unwrap().is_none());
        assert!(!db.users().delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_principal_store() {
        let db = Database::open(":memory:").await.unwrap();
        let id = db.users().create(&ada()).await.unwrap();

        let record = db
            .lookup_by_credential("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.principal, Principal::new(id, "Ada", "Lovelace"));
        assert_eq!(record.password_hash, "$argon2id$placeholder");

        let principal = db.lookup_by_id(id).await.unwrap().unwrap();
        assert_eq!(principal.display_name, "Ada Lovelace");

        assert!(db.lookup_by_credential("grace@example.com").await.unwrap().is_none());
        assert!(db.lookup_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revocation_list() {
        let db = Database::open(":memory:").await.unwrap();

        assert!(!db.is_revoked("jti-1").await.unwrap());
        assert!(db.revoke("jti-1", 1_700_000_000).await.unwrap());
        assert!(db.is_revoked("jti-1").await.unwrap());
        assert!(!db.revoke("jti-1", 1_700_000_000).await.unwrap());
        assert!(!db.is_revoked("jti-2").await.unwrap());
    }
}
