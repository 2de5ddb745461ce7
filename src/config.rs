use std::env;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";
const DIKI_BASE: &str = "https://www.diki.pl";
const PROZ_BASE: &str = "https://www.proz.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Endpoints and timings for every remote source.
///
/// Environment overrides (empty values fall back to the default):
/// - `EN2PL_WIKIPEDIA_API`, `EN2PL_WIKIDATA_API`: Action API endpoints
/// - `EN2PL_DIKI_URL`, `EN2PL_PROZ_URL`: scraped site origins
/// - `EN2PL_HTTP_TIMEOUT_SECS`: per-request timeout
/// - `EN2PL_CACHE_TTL_SECS`: memo store time-to-live
/// - `EN2PL_RETRY_DELAY_MS`: pause before the Diki re-fetch
#[derive(Debug, Clone)]
pub struct Config {
    pub wikipedia_api: String,
    pub wikidata_api: String,
    pub diki_base: String,
    pub proz_base: String,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    pub retry_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wikipedia_api: WIKIPEDIA_API.to_string(),
            wikidata_api: WIKIDATA_API.to_string(),
            diki_base: DIKI_BASE.to_string(),
            proz_base: PROZ_BASE.to_string(),
            http_timeout: HTTP_TIMEOUT,
            cache_ttl: DEFAULT_TTL,
            retry_delay: RETRY_DELAY,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &'static str| -> Result<Option<u64>, ConfigError> {
            get(key)
                .map(|value| {
                    value
                        .parse::<u64>()
                        .map_err(|_| ConfigError::InvalidNumber { var: key, value })
                })
                .transpose()
        };

        let defaults = Self::default();
        Ok(Self {
            wikipedia_api: get("EN2PL_WIKIPEDIA_API").unwrap_or(defaults.wikipedia_api),
            wikidata_api: get("EN2PL_WIKIDATA_API").unwrap_or(defaults.wikidata_api),
            diki_base: get("EN2PL_DIKI_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.diki_base),
            proz_base: get("EN2PL_PROZ_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.proz_base),
            http_timeout: number("EN2PL_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            cache_ttl: number("EN2PL_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            retry_delay: number("EN2PL_RETRY_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        })
    }

    /// Point every remote source at one mock server.
    #[cfg(test)]
    pub(crate) fn for_mock_server(uri: &str) -> Self {
        Self {
            wikipedia_api: format!("{uri}/w/api.php"),
            wikidata_api: format!("{uri}/wikidata/api.php"),
            diki_base: uri.to_string(),
            proz_base: uri.to_string(),
            retry_delay: Duration::from_millis(1),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.wikipedia_api, WIKIPEDIA_API);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.cache_ttl, Duration::from_secs(6 * 60 * 60));
        assert_eq!(config.retry_delay, Duration::from_millis(200));
    }

    #[test]
    fn overrides_are_applied_and_trimmed() {
        let config = from_map(&[
            ("EN2PL_DIKI_URL", " http://localhost:9000/ "),
            ("EN2PL_CACHE_TTL_SECS", "60"),
            ("EN2PL_RETRY_DELAY_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.diki_base, "http://localhost:9000");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.retry_delay, Duration::ZERO);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = from_map(&[("EN2PL_PROZ_URL", "  "), ("EN2PL_HTTP_TIMEOUT_SECS", "")]).unwrap();
        assert_eq!(config.proz_base, PROZ_BASE);
        assert_eq!(config.http_timeout, HTTP_TIMEOUT);
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let err = from_map(&[("EN2PL_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("EN2PL_HTTP_TIMEOUT_SECS"));
        assert!(err.to_string().contains("soon"));
    }
}
