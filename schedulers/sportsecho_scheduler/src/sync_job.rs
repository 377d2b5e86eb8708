use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api_client::{
    parse_scores, parse_upcoming, FixtureBatch, FixtureRequest, FixtureWindow, FixturesFetcher,
    UpcomingGame,
};
use crate::config::{seoul_offset, SyncConfig};
use crate::error::SyncError;
use crate::fixture_store::FixtureStore;
use crate::metrics::MetricsCollector;
use crate::season::season_for;
use crate::types::{CycleSummary, NewFixture, ScoreUpdate, Sport, UpcomingWindow};
use crate::watermark::{WatermarkRead, WatermarkStore};

/// Current wall-clock time in Asia/Seoul.
pub fn now_in_seoul() -> NaiveDateTime {
    Utc::now().with_timezone(&seoul_offset()).naive_local()
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date);
    let next_month_first = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let last = next_month_first
        .and_then(|d| d.pred_opt())
        .unwrap_or(date);
    (first, last)
}

/// Collaborators shared by every job in the process.
pub struct SyncDeps<F, S> {
    pub fetcher: Arc<F>,
    pub store: Arc<S>,
    pub watermarks: WatermarkStore,
    pub metrics: MetricsCollector,
    pub config: SyncConfig,
}

impl<F, S> Clone for SyncDeps<F, S> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            watermarks: self.watermarks.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
        }
    }
}

/// Fetch, parse and persist fixtures for one sport.
///
/// Two operations run on their own schedules: refreshing the scores of
/// today's games, and inserting upcoming games. They share everything except
/// the date window, which the sport decides (see [`UpcomingWindow`]).
pub struct FixtureSyncJob<F, S> {
    sport: Sport,
    deps: SyncDeps<F, S>,
}

impl<F: FixturesFetcher, S: FixtureStore> FixtureSyncJob<F, S> {
    pub fn new(sport: Sport, deps: SyncDeps<F, S>) -> Self {
        Self { sport, deps }
    }

    pub fn sport(&self) -> Sport {
        self.sport
    }

    pub async fn update_today_scores(&self) -> Result<CycleSummary, SyncError> {
        self.update_scores_on(now_in_seoul().date()).await
    }

    /// Copies the current scores of every game on `day` onto the matching
    /// rows. Rows are matched by day and team names; games with no row are
    /// silently ignored.
    pub async fn update_scores_on(&self, day: NaiveDate) -> Result<CycleSummary, SyncError> {
        let league = self.sport.league();
        let season = season_for(league, day);
        let request = FixtureRequest::new(season, FixtureWindow::Day(day));

        let body = self.deps.fetcher.fetch_fixtures(self.sport, &request).await?;
        let batch = parse_scores(self.sport, &body)?;

        let mut summary = CycleSummary::default();
        if batch.results == 0 {
            info!("No {} games scheduled on {}", league, day);
            return Ok(summary);
        }

        info!("=== {} score update for {} ({} games) ===", league, day, batch.games.len());
        debug!("{}", body);

        let day_str = day.format("%Y-%m-%d").to_string();
        for game in batch.games {
            summary.fixtures_seen += 1;
            let update = ScoreUpdate {
                date: day_str.clone(),
                home_team_name: game.home_team_name,
                away_team_name: game.away_team_name,
                home_goal: game.home_score,
                away_goal: game.away_score,
            };
            let rows = self.deps.store.update_scores(&update).await?;
            if rows == 0 {
                debug!(
                    "No stored game for {} vs {} on {}",
                    update.home_team_name, update.away_team_name, update.date
                );
            }
            summary.rows_updated += rows;
        }

        self.deps.metrics.record_rows_updated(summary.rows_updated);
        info!(
            "Updated {} rows from {} {} games",
            summary.rows_updated, summary.fixtures_seen, league
        );
        Ok(summary)
    }

    pub async fn fetch_upcoming(&self) -> Result<CycleSummary, SyncError> {
        self.fetch_upcoming_at(now_in_seoul()).await
    }

    /// Inserts upcoming games. `now` picks the month for month-window sports
    /// and is stamped on every inserted row as both created and modified time.
    pub async fn fetch_upcoming_at(&self, now: NaiveDateTime) -> Result<CycleSummary, SyncError> {
        match self.sport.upcoming_window() {
            UpcomingWindow::Watermark { key } => self.fetch_watermarked_day(key, now).await,
            UpcomingWindow::CurrentMonth => self.fetch_current_month(now).await,
        }
    }

    async fn fetch_watermarked_day(
        &self,
        key: &str,
        now: NaiveDateTime,
    ) -> Result<CycleSummary, SyncError> {
        let raw = match self.deps.watermarks.read(key).await {
            WatermarkRead::Value(value) => value,
            WatermarkRead::Missing => {
                warn!(
                    "No watermark at {}/{}, skipping {} fetch",
                    self.deps.watermarks.bucket(),
                    key,
                    self.sport
                );
                return Ok(CycleSummary::default());
            }
            WatermarkRead::Failed(e) => {
                error!("Failed to read watermark {}: {}", key, e);
                return Ok(CycleSummary::default());
            }
        };

        let day = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|source| {
            SyncError::InvalidWatermark {
                value: raw.clone(),
                source,
            }
        })?;
        info!("Fetching {} games for {}", self.sport.league(), day);

        let season = season_for(self.sport.league(), day);
        let batch = self
            .fetch_upcoming_batch(FixtureRequest::new(season, FixtureWindow::Day(day)))
            .await?;

        let next_day = day + Duration::days(1);
        let mut summary = CycleSummary::default();
        for game in batch.games {
            summary.fixtures_seen += 1;
            if self.insert_game(game, now).await? {
                summary.rows_inserted += 1;
            } else {
                summary.rows_skipped += 1;
            }
            self.advance_watermark(key, next_day).await;
        }

        self.deps.metrics.record_rows_inserted(summary.rows_inserted);
        info!(
            "Inserted {} {} games for {} ({} skipped)",
            summary.rows_inserted,
            self.sport.league(),
            day,
            summary.rows_skipped
        );
        Ok(summary)
    }

    async fn fetch_current_month(&self, now: NaiveDateTime) -> Result<CycleSummary, SyncError> {
        let today = now.date();
        let (from, to) = month_bounds(today);
        info!("Fetching {} games from {} to {}", self.sport.league(), from, to);

        let season = season_for(self.sport.league(), today);
        let batch = self
            .fetch_upcoming_batch(FixtureRequest::new(season, FixtureWindow::Range { from, to }))
            .await?;

        let mut summary = CycleSummary::default();
        for game in batch.games {
            summary.fixtures_seen += 1;
            if self.insert_game(game, now).await? {
                summary.rows_inserted += 1;
            } else {
                summary.rows_skipped += 1;
            }
        }

        self.deps.metrics.record_rows_inserted(summary.rows_inserted);
        info!(
            "Inserted {} {} games for {} to {} ({} skipped)",
            summary.rows_inserted,
            self.sport.league(),
            from,
            to,
            summary.rows_skipped
        );
        Ok(summary)
    }

    async fn fetch_upcoming_batch(
        &self,
        request: FixtureRequest,
    ) -> Result<FixtureBatch<UpcomingGame>, SyncError> {
        let body = self.deps.fetcher.fetch_fixtures(self.sport, &request).await?;
        let batch = parse_upcoming(self.sport, &body)?;
        info!("=== {} fixtures to add: {} ===", self.sport.league(), batch.games.len());
        debug!("{}", body);
        Ok(batch)
    }

    /// Returns false when the row already exists and the existence check is
    /// enabled. Without the check every call inserts, so re-running a window
    /// duplicates its rows.
    async fn insert_game(&self, game: UpcomingGame, now: NaiveDateTime) -> Result<bool, SyncError> {
        let fixture = NewFixture {
            sports_type: self.sport.sports_type(),
            kickoff: game.kickoff,
            home_team_name: game.home_team_name,
            away_team_name: game.away_team_name,
            home_team_logo: game.home_team_logo,
            away_team_logo: game.away_team_logo,
            league_logo: game.league_logo,
            venue_name: game.venue_name,
            home_goal: game.home_score,
            away_goal: game.away_score,
            created_at: now,
            modified_at: now,
        };

        if self.deps.config.skip_existing_fixtures && self.deps.store.fixture_exists(&fixture).await? {
            debug!(
                "Skipping existing fixture: {} vs {} on {}",
                fixture.home_team_name, fixture.away_team_name, fixture.kickoff
            );
            return Ok(false);
        }

        self.deps.store.insert_fixture(&fixture).await?;
        debug!(
            "Inserted fixture: {} vs {} on {}",
            fixture.home_team_name, fixture.away_team_name, fixture.kickoff
        );
        Ok(true)
    }

    // Blob failures are logged and swallowed. A failed upload after a
    // successful delete leaves no watermark, and later cycles skip until an
    // operator restores it.
    async fn advance_watermark(&self, key: &str, next_day: NaiveDate) {
        if let Err(e) = self.deps.watermarks.delete(key).await {
            error!("Failed to delete watermark {}: {}", key, e);
        }
        let content = next_day.format("%Y-%m-%d").to_string();
        if let Err(e) = self.deps.watermarks.upload(key, &content).await {
            error!("Failed to upload watermark {} = {}: {}", key, content, e);
        }
    }
}
