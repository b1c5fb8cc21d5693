//! Storage contract shared by the Postgres and in-memory backends

use async_trait::async_trait;

use crate::models::{Entity, ManagerTeam, Match, Player, Reference};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}

impl DbError {
    pub fn not_found<E: Entity>(id: i64) -> Self {
        Self::NotFound {
            resource: E::LABEL,
            id: id.to_string(),
        }
    }
}

/// Result of an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated<R> {
    /// The row as it is after the update
    pub record: R,
    /// Image file name the update overwrote; only set when a new image
    /// was written
    pub replaced_image: Option<String>,
}

/// CRUD over one entity's table.
///
/// Each method issues exactly one statement.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// All rows, ordered by id.
    async fn list(&self) -> Result<Vec<E::Record>, DbError>;

    async fn get(&self, id: i64) -> Result<E::Record, DbError>;

    /// Insert a row; returns the new id.
    async fn insert(&self, fields: &E::Fields, image: Option<&str>) -> Result<i64, DbError>;

    /// Replace text fields, and the image when `image` is `Some`.
    async fn update(
        &self,
        id: i64,
        fields: &E::Fields,
        image: Option<&str>,
    ) -> Result<Updated<E::Record>, DbError>;

    /// Delete a row; returns the image it referenced.
    async fn delete(&self, id: i64) -> Result<Option<String>, DbError>;
}

/// Existence checks for by-value references between tables
#[async_trait]
pub trait ReferenceCheck: Send + Sync {
    async fn reference_exists(&self, reference: &Reference<'_>) -> Result<bool, DbError>;
}

/// Everything the HTTP layer needs from storage
pub trait Store:
    Repository<Match> + Repository<ManagerTeam> + Repository<Player> + ReferenceCheck
{
    /// Short backend name reported by the health check
    fn backend(&self) -> &'static str;
}
