use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::SyncError;
use crate::types::{NewFixture, ScoreUpdate};

/// Where fixtures end up. Rows are matched on (kickoff day, home team, away
/// team); no API game id is stored.
#[async_trait]
pub trait FixtureStore: Send + Sync {
    /// Returns the number of rows touched. Zero is not an error.
    async fn update_scores(&self, update: &ScoreUpdate) -> Result<u64, SyncError>;

    async fn insert_fixture(&self, fixture: &NewFixture) -> Result<(), SyncError>;

    async fn fixture_exists(&self, fixture: &NewFixture) -> Result<bool, SyncError>;
}

pub struct MySqlFixtureStore {
    pool: MySqlPool,
}

impl MySqlFixtureStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, SyncError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl FixtureStore for MySqlFixtureStore {
    async fn update_scores(&self, update: &ScoreUpdate) -> Result<u64, SyncError> {
        let result = sqlx::query(
            r#"
            UPDATE game
            SET away_goal = ?, home_goal = ?, modified_at = NOW()
            WHERE DATE_FORMAT(date, '%Y-%m-%d') = ?
            AND home_team_name = ?
            AND away_team_name = ?
            "#,
        )
        .bind(update.away_goal)
        .bind(update.home_goal)
        .bind(&update.date)
        .bind(&update.home_team_name)
        .bind(&update.away_team_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_fixture(&self, fixture: &NewFixture) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO game (
                away_goal, home_goal, sports_type, created_at, date, modified_at,
                away_team_logo, away_team_name, home_team_logo, home_team_name,
                league_logo, venue_name
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fixture.away_goal)
        .bind(fixture.home_goal)
        .bind(fixture.sports_type.code())
        .bind(fixture.created_at)
        .bind(fixture.kickoff)
        .bind(fixture.modified_at)
        .bind(&fixture.away_team_logo)
        .bind(&fixture.away_team_name)
        .bind(&fixture.home_team_logo)
        .bind(&fixture.home_team_name)
        .bind(&fixture.league_logo)
        .bind(&fixture.venue_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fixture_exists(&self, fixture: &NewFixture) -> Result<bool, SyncError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM game
            WHERE DATE_FORMAT(date, '%Y-%m-%d') = ?
            AND home_team_name = ?
            AND away_team_name = ?
            AND sports_type = ?
            "#,
        )
        .bind(fixture.kickoff.date().format("%Y-%m-%d").to_string())
        .bind(&fixture.home_team_name)
        .bind(&fixture.away_team_name)
        .bind(fixture.sports_type.code())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}
