use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::SeasonError;

/// League identifiers understood by the season calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum League {
    /// NBA, seasons span two calendar years.
    Nba,
    /// English Premier League, seasons start in August.
    Epl,
    /// MLB, one season per calendar year.
    Mlb,
}

impl League {
    pub fn code(&self) -> &'static str {
        match self {
            League::Nba => "NBA",
            League::Epl => "EPL",
            League::Mlb => "MLB",
        }
    }
}

impl FromStr for League {
    type Err = SeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NBA" => Ok(League::Nba),
            "EPL" => Ok(League::Epl),
            "MLB" => Ok(League::Mlb),
            other => Err(SeasonError::InvalidArgument(other.to_string())),
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Value stored in `game.sports_type`. This is the only thing that tells the
/// two sports apart at the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SportsType {
    Football = 0,
    Basketball = 1,
}

impl SportsType {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Which dates the "fetch upcoming" operation asks the API for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpcomingWindow {
    /// A single date read from the sport's watermark object.
    Watermark { key: &'static str },
    /// Every day of the current calendar month, in one range request.
    CurrentMonth,
}

/// Sports that have a sync job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Basketball,
    Football,
}

impl Sport {
    pub const ALL: [Sport; 2] = [Sport::Basketball, Sport::Football];

    pub fn league(self) -> League {
        match self {
            Sport::Basketball => League::Nba,
            Sport::Football => League::Epl,
        }
    }

    /// League id used by the remote API.
    pub fn league_id(self) -> u32 {
        match self {
            Sport::Basketball => 12,
            Sport::Football => 39,
        }
    }

    pub fn sports_type(self) -> SportsType {
        match self {
            Sport::Basketball => SportsType::Basketball,
            Sport::Football => SportsType::Football,
        }
    }

    /// Path appended to the configured API base URL.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Sport::Basketball => "/games",
            Sport::Football => "/fixtures",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Sport::Basketball => "https://api-basketball.p.rapidapi.com",
            Sport::Football => "https://api-football-v1.p.rapidapi.com/v3",
        }
    }

    /// Value of the `X-RapidAPI-Host` header.
    pub fn api_host(self) -> &'static str {
        match self {
            Sport::Basketball => "api-basketball.p.rapidapi.com",
            Sport::Football => "api-football-v1.p.rapidapi.com",
        }
    }

    pub fn upcoming_window(self) -> UpcomingWindow {
        match self {
            Sport::Basketball => UpcomingWindow::Watermark {
                key: "basketball.txt",
            },
            Sport::Football => UpcomingWindow::CurrentMonth,
        }
    }

    /// Cron expression (with seconds) for the score refresh.
    pub fn update_scores_cron(self) -> &'static str {
        "0 12,24,36,48 * * * *"
    }

    /// Cron expression (with seconds) for fetching upcoming fixtures.
    pub fn fetch_upcoming_cron(self) -> &'static str {
        match self {
            Sport::Basketball => "0 0 0,6,12,18 * * *",
            Sport::Football => "0 0 0 1 * *",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sport::Basketball => f.write_str("basketball"),
            Sport::Football => f.write_str("football"),
        }
    }
}

/// Score refresh for one fixture of the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    /// `yyyy-MM-dd`, compared against the row's kickoff truncated to day.
    pub date: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_goal: i32,
    pub away_goal: i32,
}

/// Row inserted into `game` for an upcoming fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFixture {
    pub sports_type: SportsType,
    pub kickoff: NaiveDateTime,
    pub home_team_name: String,
    pub away_team_name: String,
    pub home_team_logo: String,
    pub away_team_logo: String,
    pub league_logo: String,
    pub venue_name: String,
    pub home_goal: i32,
    pub away_goal: i32,
    pub created_at: NaiveDateTime,
    pub modified_at: NaiveDateTime,
}

/// What a single sync cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub fixtures_seen: usize,
    pub rows_updated: u64,
    pub rows_inserted: u64,
    pub rows_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_league_from_str() {
        assert_eq!("NBA".parse::<League>().unwrap(), League::Nba);
        assert_eq!("EPL".parse::<League>().unwrap(), League::Epl);
        assert_eq!("MLB".parse::<League>().unwrap(), League::Mlb);
        assert!("nba".parse::<League>().is_err());
    }

    #[test]
    fn test_sports_type_codes() {
        assert_eq!(Sport::Football.sports_type().code(), 0);
        assert_eq!(Sport::Basketball.sports_type().code(), 1);
    }

    #[test]
    fn test_only_basketball_uses_watermark() {
        assert_eq!(
            Sport::Basketball.upcoming_window(),
            UpcomingWindow::Watermark {
                key: "basketball.txt"
            }
        );
        assert_eq!(Sport::Football.upcoming_window(), UpcomingWindow::CurrentMonth);
    }
}
