use chrono::FixedOffset;
use std::env;
use std::fmt;

use crate::error::ConfigError;
use crate::types::Sport;

/// IANA name sent to the API as `timezone=`.
pub const TIMEZONE_NAME: &str = "Asia/Seoul";

const SEOUL_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// Korea has no daylight saving, so a fixed offset is exact.
pub fn seoul_offset() -> FixedOffset {
    FixedOffset::east_opt(SEOUL_UTC_OFFSET_SECS).expect("+09:00 is a valid offset")
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_key: String,
    pub basketball_base_url: String,
    pub football_base_url: String,
}

impl ApiConfig {
    pub fn base_url(&self, sport: Sport) -> &str {
        match sport {
            Sport::Basketball => &self.basketball_base_url,
            Sport::Football => &self.football_base_url,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("basketball_base_url", &self.basketball_base_url)
            .field("football_base_url", &self.football_base_url)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Check for an existing (day, home, away) row before inserting.
    pub skip_existing_fixtures: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
}

impl SchedulerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    name: "DB_MAX_CONNECTIONS",
                    value,
                })?,
            None => 5,
        };

        let skip_existing_fixtures = match lookup("SKIP_EXISTING_FIXTURES") {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SKIP_EXISTING_FIXTURES",
                        value,
                    })
                }
            },
            None => false,
        };

        Ok(Self {
            api: ApiConfig {
                api_key: required("API_KEY")?,
                basketball_base_url: lookup("BASKETBALL_API_BASE_URL")
                    .unwrap_or_else(|| Sport::Basketball.default_base_url().to_string()),
                football_base_url: lookup("FOOTBALL_API_BASE_URL")
                    .unwrap_or_else(|| Sport::Football.default_base_url().to_string()),
            },
            storage: StorageConfig {
                bucket: required("S3_BUCKET")?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections,
            },
            sync: SyncConfig {
                skip_existing_fixtures,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("API_KEY", "secret"),
        ("S3_BUCKET", "sportsecho"),
        ("DATABASE_URL", "mysql://localhost/sportsecho"),
    ];

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.api.api_key, "secret");
        assert_eq!(config.storage.bucket, "sportsecho");
        assert_eq!(config.database.max_connections, 5);
        assert!(!config.sync.skip_existing_fixtures);
        assert_eq!(
            config.api.base_url(Sport::Basketball),
            "https://api-basketball.p.rapidapi.com"
        );
        assert_eq!(
            config.api.base_url(Sport::Football),
            "https://api-football-v1.p.rapidapi.com/v3"
        );
    }

    #[test]
    fn test_missing_api_key() {
        let err = SchedulerConfig::from_lookup(lookup_from(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("API_KEY")));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_MAX_CONNECTIONS", "12"));
        pairs.push(("SKIP_EXISTING_FIXTURES", "true"));
        pairs.push(("FOOTBALL_API_BASE_URL", "http://localhost:9999"));
        let config = SchedulerConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.database.max_connections, 12);
        assert!(config.sync.skip_existing_fixtures);
        assert_eq!(config.api.base_url(Sport::Football), "http://localhost:9999");
    }

    #[test]
    fn test_invalid_max_connections() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_MAX_CONNECTIONS", "lots"));
        let err = SchedulerConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = SchedulerConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("mysql://"));
    }
}
