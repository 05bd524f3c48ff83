//! Display profile storage
//!
//! The profile lives in a small key-value table, stored as a JSON document
//! under a fixed key. Nothing in here is a security boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use tokio::sync::RwLock;

/// Key the profile document is stored under
pub const PROFILE_KEY: &str = "userProfile";

/// The user's display profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub role: String,
    pub location: String,
    pub website: String,
    pub phone: String,
    pub avatar: String,
    pub skills: Vec<String>,
}

impl Profile {
    /// Name to greet the user with, if there is one
    pub fn display_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Malformed profile: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Read/write access to the stored profile
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self) -> Result<Option<Profile>, ProfileError>;

    async fn set(&self, profile: &Profile) -> Result<(), ProfileError>;

    async fn remove(&self) -> Result<(), ProfileError>;
}

/// Process-local profile storage
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profile: RwLock<Option<Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_profile(profile: Profile) -> Self {
        Self {
            profile: RwLock::new(Some(profile)),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get(&self) -> Result<Option<Profile>, ProfileError> {
        Ok(self.profile.read().await.clone())
    }

    async fn set(&self, profile: &Profile) -> Result<(), ProfileError> {
        *self.profile.write().await = Some(profile.clone());
        Ok(())
    }

    async fn remove(&self) -> Result<(), ProfileError> {
        *self.profile.write().await = None;
        Ok(())
    }
}

/// Key-value store backed by SQLite
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    /// Wrap a pool, creating the key-value table if needed
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Raw value stored under `key`
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM local_storage WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn get(&self) -> Result<Option<Profile>, ProfileError> {
        match self.get_item(PROFILE_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, profile: &Profile) -> Result<(), ProfileError> {
        let raw = serde_json::to_string(profile)?;
        self.set_item(PROFILE_KEY, &raw).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), ProfileError> {
        self.remove_item(PROFILE_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db;

    async fn sqlite_repo() -> SqliteProfileRepository {
        let pool = db::connect_in_memory().await.unwrap();
        SqliteProfileRepository::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_profile_round_trip() {
        let repo = sqlite_repo().await;
        assert!(repo.get().await.unwrap().is_none());

        let profile = Profile {
            name: "Ana Souza".to_string(),
            role: "Usuário Aegis".to_string(),
            skills: vec!["Segurança Digital".to_string()],
            ..Default::default()
        };
        repo.set(&profile).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), Some(profile.clone()));

        let renamed = Profile {
            name: "Ana S.".to_string(),
            ..profile
        };
        repo.set(&renamed).await.unwrap();
        assert_eq!(repo.get().await.unwrap().unwrap().name, "Ana S.");
    }

    #[tokio::test]
    async fn test_malformed_profile_is_an_error() {
        let repo = sqlite_repo().await;
        repo.set_item(PROFILE_KEY, "{not json").await.unwrap();

        let err = repo.get().await.unwrap_err();
        assert!(matches!(err, ProfileError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_partial_profile_fills_defaults() {
        let repo = sqlite_repo().await;
        repo.set_item(PROFILE_KEY, r#"{"name":"Bruno"}"#).await.unwrap();

        let profile = repo.get().await.unwrap().unwrap();
        assert_eq!(profile.name, "Bruno");
        assert!(profile.skills.is_empty());

        repo.remove().await.unwrap();
        assert!(repo.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_repository() {
        let repo = InMemoryProfileRepository::new();
        assert!(repo.get().await.unwrap().is_none());

        repo.set(&Profile {
            name: "Carla".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(repo.get().await.unwrap().unwrap().display_name(), Some("Carla"));
    }

    #[test]
    fn test_blank_name_has_no_display_name() {
        let profile = Profile {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(profile.display_name(), None);
    }
}
