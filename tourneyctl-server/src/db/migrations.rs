//! Schema for the three administered tables

use sqlx::PgPool;

/// Create tables and lookup indexes if they don't exist yet.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            shortname VARCHAR(255) NOT NULL,
            image VARCHAR(255)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manageteam (
            id BIGSERIAL PRIMARY KEY,
            match_name VARCHAR(255) NOT NULL,
            team_name VARCHAR(255) NOT NULL,
            shortname VARCHAR(255) NOT NULL,
            image VARCHAR(255)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id BIGSERIAL PRIMARY KEY,
            team_name VARCHAR(255) NOT NULL,
            match_name VARCHAR(255) NOT NULL,
            player_name VARCHAR(255) NOT NULL,
            player_shortname VARCHAR(255) NOT NULL,
            player_image VARCHAR(255)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Referential checks look rows up by value
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_name ON matches (name)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_manageteam_team_match ON manageteam (team_name, match_name)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Migrations complete");
    Ok(())
}
