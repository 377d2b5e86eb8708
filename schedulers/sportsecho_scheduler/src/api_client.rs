//! Client for the API-Sports fixtures endpoints (basketball `/games`,
//! football `/fixtures`) and the typed shapes of their responses.
//!
//! Both sports answer with the same envelope, `{ "results": n, "response": [..] }`,
//! but nest teams, scores and venue differently. Everything is normalised to
//! [`GameScore`] and [`UpcomingGame`] before it leaves this module.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::config::{ApiConfig, TIMEZONE_NAME};
use crate::error::SyncError;
use crate::metrics::MetricsCollector;
use crate::types::Sport;

const API_KEY_HEADER: &str = "X-RapidAPI-Key";
const API_HOST_HEADER: &str = "X-RapidAPI-Host";

/// Dates covered by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureWindow {
    Day(NaiveDate),
    Range { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRequest {
    pub season: String,
    pub window: FixtureWindow,
}

impl FixtureRequest {
    pub fn new(season: impl Into<String>, window: FixtureWindow) -> Self {
        Self {
            season: season.into(),
            window,
        }
    }

    pub fn query_params(&self, sport: Sport) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("timezone", TIMEZONE_NAME.to_string()),
            ("season", self.season.clone()),
            ("league", sport.league_id().to_string()),
        ];
        match self.window {
            FixtureWindow::Day(date) => params.push(("date", date.format("%Y-%m-%d").to_string())),
            FixtureWindow::Range { from, to } => {
                params.push(("from", from.format("%Y-%m-%d").to_string()));
                params.push(("to", to.format("%Y-%m-%d").to_string()));
            }
        }
        params
    }
}

/// Source of raw fixture JSON for a sport.
#[async_trait]
pub trait FixturesFetcher: Send + Sync {
    async fn fetch_fixtures(&self, sport: Sport, request: &FixtureRequest) -> Result<String, SyncError>;
}

/// Fetches from the real API over HTTPS.
///
/// No client-side timeout is set: a hung request holds its job's guard until
/// the connection drops.
pub struct HttpFixturesFetcher {
    client: reqwest::Client,
    api: ApiConfig,
    metrics: MetricsCollector,
}

impl HttpFixturesFetcher {
    pub fn new(api: ApiConfig, metrics: MetricsCollector) -> Self {
        Self {
            client: reqwest::Client::new(),
            api,
            metrics,
        }
    }

    fn endpoint(&self, sport: Sport) -> String {
        format!(
            "{}{}",
            self.api.base_url(sport).trim_end_matches('/'),
            sport.endpoint_path()
        )
    }
}

#[async_trait]
impl FixturesFetcher for HttpFixturesFetcher {
    async fn fetch_fixtures(&self, sport: Sport, request: &FixtureRequest) -> Result<String, SyncError> {
        let url = self.endpoint(sport);
        let params = request.query_params(sport);
        debug!("GET {} {:?}", url, params);

        let tracker = self.metrics.record_request_start();
        let result = async {
            let response = self
                .client
                .get(&url)
                .query(&params)
                .header(API_KEY_HEADER, &self.api.api_key)
                .header(API_HOST_HEADER, sport.api_host())
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, reqwest::Error>(response.text().await?)
        }
        .await;
        tracker.finish(result.is_ok());

        Ok(result?)
    }
}

/// A decoded response with its declared result count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureBatch<T> {
    pub results: u32,
    pub games: Vec<T>,
}

/// Team names and current score. Unstarted games report null scores, which
/// become 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameScore {
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_score: i32,
    pub away_score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingGame {
    pub kickoff: NaiveDateTime,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_team_logo: String,
    pub away_team_logo: String,
    pub league_logo: String,
    pub venue_name: String,
    pub home_score: i32,
    pub away_score: i32,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    results: u32,
    response: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Teams<T> {
    home: T,
    away: T,
}

#[derive(Debug, Deserialize)]
struct TeamName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TeamDetail {
    name: String,
    logo: String,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LeagueLogo {
    logo: String,
}

#[derive(Debug, Deserialize)]
struct QuarterTotal {
    total: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Goals {
    home: Option<i32>,
    away: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BasketballScoreLine {
    teams: Teams<TeamName>,
    scores: Teams<QuarterTotal>,
}

#[derive(Debug, Deserialize)]
struct FootballScoreLine {
    teams: Teams<TeamName>,
    goals: Goals,
}

#[derive(Debug, Deserialize)]
struct BasketballGame {
    date: String,
    teams: Teams<TeamDetail>,
    scores: Teams<QuarterTotal>,
    league: LeagueLogo,
    country: Named,
}

#[derive(Debug, Deserialize)]
struct FootballFixtureInfo {
    date: String,
    venue: Named,
}

#[derive(Debug, Deserialize)]
struct FootballGame {
    fixture: FootballFixtureInfo,
    teams: Teams<TeamDetail>,
    goals: Goals,
    league: LeagueLogo,
}

/// Kickoff times arrive as `yyyy-MM-ddTHH:mm:ss+09:00`. The offset is dropped
/// and the wall-clock time kept, matching the `timezone` we asked for.
pub fn parse_kickoff(value: &str) -> Result<NaiveDateTime, SyncError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_local())
        .map_err(|source| SyncError::InvalidKickoff {
            value: value.to_string(),
            source,
        })
}

pub fn parse_scores(sport: Sport, body: &str) -> Result<FixtureBatch<GameScore>, SyncError> {
    match sport {
        Sport::Basketball => {
            let envelope: Envelope<BasketballScoreLine> = serde_json::from_str(body)?;
            Ok(FixtureBatch {
                results: envelope.results,
                games: envelope
                    .response
                    .into_iter()
                    .map(|g| GameScore {
                        home_team_name: g.teams.home.name,
                        away_team_name: g.teams.away.name,
                        home_score: g.scores.home.total.unwrap_or(0),
                        away_score: g.scores.away.total.unwrap_or(0),
                    })
                    .collect(),
            })
        }
        Sport::Football => {
            let envelope: Envelope<FootballScoreLine> = serde_json::from_str(body)?;
            Ok(FixtureBatch {
                results: envelope.results,
                games: envelope
                    .response
                    .into_iter()
                    .map(|g| GameScore {
                        home_team_name: g.teams.home.name,
                        away_team_name: g.teams.away.name,
                        home_score: g.goals.home.unwrap_or(0),
                        away_score: g.goals.away.unwrap_or(0),
                    })
                    .collect(),
            })
        }
    }
}

pub fn parse_upcoming(sport: Sport, body: &str) -> Result<FixtureBatch<UpcomingGame>, SyncError> {
    match sport {
        Sport::Basketball => {
            let envelope: Envelope<BasketballGame> = serde_json::from_str(body)?;
            let games = envelope
                .response
                .into_iter()
                .map(|g| {
                    Ok(UpcomingGame {
                        kickoff: parse_kickoff(&g.date)?,
                        home_team_name: g.teams.home.name,
                        away_team_name: g.teams.away.name,
                        home_team_logo: g.teams.home.logo,
                        away_team_logo: g.teams.away.logo,
                        league_logo: g.league.logo,
                        venue_name: g.country.name,
                        home_score: g.scores.home.total.unwrap_or(0),
                        away_score: g.scores.away.total.unwrap_or(0),
                    })
                })
                .collect::<Result<Vec<_>, SyncError>>()?;
            Ok(FixtureBatch {
                results: envelope.results,
                games,
            })
        }
        Sport::Football => {
            let envelope: Envelope<FootballGame> = serde_json::from_str(body)?;
            let games = envelope
                .response
                .into_iter()
                .map(|g| {
                    Ok(UpcomingGame {
                        kickoff: parse_kickoff(&g.fixture.date)?,
                        home_team_name: g.teams.home.name,
                        away_team_name: g.teams.away.name,
                        home_team_logo: g.teams.home.logo,
                        away_team_logo: g.teams.away.logo,
                        league_logo: g.league.logo,
                        venue_name: g.fixture.venue.name,
                        home_score: g.goals.home.unwrap_or(0),
                        away_score: g.goals.away.unwrap_or(0),
                    })
                })
                .collect::<Result<Vec<_>, SyncError>>()?;
            Ok(FixtureBatch {
                results: envelope.results,
                games,
            })
        }
    }
}
