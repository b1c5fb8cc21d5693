//! Postgres repository
//!
//! SQL is assembled from each entity's table and column constants, so the
//! three tables share one implementation. Only constants are interpolated;
//! every value is a bound parameter.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use super::repository::{DbError, ReferenceCheck, Repository, Store, Updated};
use crate::models::{Entity, Reference};

/// Repository backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `id, <columns>, <image column>`
fn select_list<E: Entity>() -> String {
    format!("id, {}, {}", E::COLUMNS.join(", "), E::IMAGE_COLUMN)
}

/// `$from, $from+1, ... $to`
fn placeholders(from: usize, to: usize) -> String {
    (from..=to)
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_sql<E: Entity>() -> String {
    format!("SELECT {} FROM {} ORDER BY id", select_list::<E>(), E::TABLE)
}

fn get_sql<E: Entity>() -> String {
    format!("SELECT {} FROM {} WHERE id = $1", select_list::<E>(), E::TABLE)
}

fn insert_sql<E: Entity>() -> String {
    format!(
        "INSERT INTO {} ({}, {}) VALUES ({}) RETURNING id",
        E::TABLE,
        E::COLUMNS.join(", "),
        E::IMAGE_COLUMN,
        placeholders(1, E::COLUMNS.len() + 1)
    )
}

/// Single-statement update that also reports the image being replaced.
///
/// Parameters: text columns, then the image when `with_image`, then id.
fn update_sql<E: Entity>(with_image: bool) -> String {
    let mut assignments: Vec<String> = E::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();
    if with_image {
        assignments.push(format!("{} = ${}", E::IMAGE_COLUMN, E::COLUMNS.len() + 1));
    }
    let id_param = assignments.len() + 1;

    let returning = std::iter::once("id")
        .chain(E::COLUMNS.iter().copied())
        .chain(std::iter::once(E::IMAGE_COLUMN))
        .map(|column| format!("t.{}", column))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
        WITH previous AS (
            SELECT {image} AS previous_image FROM {table} WHERE id = ${id}
        )
        UPDATE {table} AS t SET {assignments}
        FROM previous
        WHERE t.id = ${id}
        RETURNING {returning}, previous.previous_image
        "#,
        image = E::IMAGE_COLUMN,
        table = E::TABLE,
        id = id_param,
        assignments = assignments.join(", "),
        returning = returning,
    )
}

fn delete_sql<E: Entity>() -> String {
    format!(
        "DELETE FROM {} WHERE id = $1 RETURNING {}",
        E::TABLE,
        E::IMAGE_COLUMN
    )
}

#[async_trait]
impl<E> Repository<E> for PgStore
where
    E: Entity,
    E::Record: for<'r> FromRow<'r, PgRow>,
{
    async fn list(&self) -> Result<Vec<E::Record>, DbError> {
        let sql = list_sql::<E>();
        let rows = sqlx::query_as::<_, E::Record>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<E::Record, DbError> {
        let sql = get_sql::<E>();
        sqlx::query_as::<_, E::Record>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found::<E>(id))
    }

    async fn insert(&self, fields: &E::Fields, image: Option<&str>) -> Result<i64, DbError> {
        let sql = insert_sql::<E>();
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in E::values(fields) {
            query = query.bind(value);
        }

        let id = query.bind(image).fetch_one(&self.pool).await?;
        Ok(id)
    }

    async fn update(
        &self,
        id: i64,
        fields: &E::Fields,
        image: Option<&str>,
    ) -> Result<Updated<E::Record>, DbError> {
        let sql = update_sql::<E>(image.is_some());
        let mut query = sqlx::query(&sql);
        for value in E::values(fields) {
            query = query.bind(value);
        }
        if let Some(image) = image {
            query = query.bind(image);
        }

        let row = query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found::<E>(id))?;

        let record = <E::Record as FromRow<'_, PgRow>>::from_row(&row)?;
        let previous: Option<String> = row.try_get("previous_image")?;

        Ok(Updated {
            record,
            replaced_image: if image.is_some() { previous } else { None },
        })
    }

    async fn delete(&self, id: i64) -> Result<Option<String>, DbError> {
        let sql = delete_sql::<E>();
        sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found::<E>(id))
    }
}

#[async_trait]
impl ReferenceCheck for PgStore {
    async fn reference_exists(&self, reference: &Reference<'_>) -> Result<bool, DbError> {
        let exists = match *reference {
            Reference::Match { name } => {
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM matches WHERE name = $1)")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?
            }
            Reference::Team {
                team_name,
                match_name,
            } => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM manageteam WHERE team_name = $1 AND match_name = $2)",
                )
                .bind(team_name)
                .bind(match_name)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(exists)
    }
}

impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ManagerTeam, Match, MatchFields, Player};

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn insert_binds_columns_then_image() {
        assert_eq!(
            insert_sql::<Player>(),
            "INSERT INTO players (team_name, match_name, player_name, player_shortname, player_image) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id"
        );
    }

    #[test]
    fn update_without_image_leaves_column_alone() {
        let sql = squash(&update_sql::<Match>(false));
        assert!(sql.contains("SET name = $1, shortname = $2 FROM previous"));
        assert!(sql.contains("WHERE t.id = $3"));
        assert!(!sql.contains("image = $"));
    }

    #[test]
    fn update_with_image_sets_it_before_id() {
        let sql = squash(&update_sql::<ManagerTeam>(true));
        assert!(sql.contains(
            "SET match_name = $1, team_name = $2, shortname = $3, image = $4 FROM previous"
        ));
        assert!(sql.contains("WHERE t.id = $5"));
        assert!(sql.contains(
            "RETURNING t.id, t.match_name, t.team_name, t.shortname, t.image, previous.previous_image"
        ));
    }

    #[test]
    fn selects_in_record_order() {
        assert_eq!(
            list_sql::<Match>(),
            "SELECT id, name, shortname, image FROM matches ORDER BY id"
        );
        assert_eq!(
            delete_sql::<Player>(),
            "DELETE FROM players WHERE id = $1 RETURNING player_image"
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn match_round_trip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        let store = PgStore::new(pool);

        let fields = MatchFields {
            name: "Cup2024".to_string(),
            shortname: "C24".to_string(),
        };
        let id = Repository::<Match>::insert(&store, &fields, Some("a.png"))
            .await
            .unwrap();

        let updated = Repository::<Match>::update(&store, id, &fields, Some("b.png"))
            .await
            .unwrap();
        assert_eq!(updated.record.image.as_deref(), Some("b.png"));
        assert_eq!(updated.replaced_image.as_deref(), Some("a.png"));

        let removed = Repository::<Match>::delete(&store, id).await.unwrap();
        assert_eq!(removed.as_deref(), Some("b.png"));

        let err = Repository::<Match>::get(&store, id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
