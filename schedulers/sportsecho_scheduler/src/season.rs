//! League season labels as the fixtures API expects them in `season=`.

use chrono::{Datelike, NaiveDate};

use crate::error::SeasonError;
use crate::types::League;

const EPL_SEASON_START_MONTH: u32 = 8;
const NBA_LAST_MONTH_OF_SEASON: u32 = 4;

/// Season label for a sport code (`NBA`, `EPL`, `MLB`) on a given date.
pub fn calculate_season(sport: &str, date: NaiveDate) -> Result<String, SeasonError> {
    let league: League = sport.parse()?;
    Ok(season_for(league, date))
}

pub fn season_for(league: League, date: NaiveDate) -> String {
    let year = date.year();
    match league {
        League::Epl => {
            if date.month() < EPL_SEASON_START_MONTH {
                (year - 1).to_string()
            } else {
                year.to_string()
            }
        }
        // January through April belong to the season that started last
        // October. From May on, the label points at the season starting this
        // October.
        League::Nba => {
            if date.month() <= NBA_LAST_MONTH_OF_SEASON {
                format!("{}-{}", year - 1, year)
            } else {
                format!("{}-{}", year, year + 1)
            }
        }
        League::Mlb => year.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epl_season_boundary() {
        assert_eq!(calculate_season("EPL", date(2024, 1, 1)).unwrap(), "2023");
        assert_eq!(calculate_season("EPL", date(2024, 7, 31)).unwrap(), "2023");
        assert_eq!(calculate_season("EPL", date(2024, 8, 1)).unwrap(), "2024");
        assert_eq!(calculate_season("EPL", date(2024, 12, 31)).unwrap(), "2024");
    }

    #[test]
    fn test_nba_season_spans_two_years() {
        for month in 1..=4 {
            assert_eq!(
                calculate_season("NBA", date(2024, month, 15)).unwrap(),
                "2023-2024",
                "month {}",
                month
            );
        }
        for month in 5..=12 {
            assert_eq!(
                calculate_season("NBA", date(2024, month, 15)).unwrap(),
                "2024-2025",
                "month {}",
                month
            );
        }
    }

    #[test]
    fn test_nba_april_last_day_is_previous_season() {
        assert_eq!(calculate_season("NBA", date(2024, 4, 30)).unwrap(), "2023-2024");
        assert_eq!(calculate_season("NBA", date(2024, 5, 1)).unwrap(), "2024-2025");
    }

    #[test]
    fn test_mlb_season_is_calendar_year() {
        assert_eq!(calculate_season("MLB", date(2024, 1, 1)).unwrap(), "2024");
        assert_eq!(calculate_season("MLB", date(2024, 12, 31)).unwrap(), "2024");
    }

    #[test]
    fn test_unknown_sport_is_rejected() {
        let err = calculate_season("unknown-sport", date(2024, 3, 5)).unwrap_err();
        assert!(matches!(err, SeasonError::InvalidArgument(ref s) if s == "unknown-sport"));
    }
}
