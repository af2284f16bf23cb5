use crate::api::endpoints;
use crate::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_REGION: &str = "la2";
pub const DEFAULT_PER_10SEC: u32 = 500;
pub const DEFAULT_PER_10MIN: u32 = 30_000;
pub const DEFAULT_PER_SECOND: u32 = 20;
pub const DEFAULT_MATCH_BUDGET: usize = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub region: String,
    pub per_10sec: u32,
    pub per_10min: u32,
    /// Client-side pacing; 0 disables it.
    pub per_second: u32,
    pub match_budget: usize,
    pub include_timelines: bool,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("RIOT_API_KEY").map_err(|_| {
            AppError::Config("RIOT_API_KEY not found in environment or .env file".to_string())
        })?;

        let region = match env::var("RIOT_REGION") {
            Ok(raw) => parse_region(&raw)?,
            Err(_) => DEFAULT_REGION.to_string(),
        };

        Ok(Config {
            api_key,
            region,
            per_10sec: parse_var("RIOT_PER_10SEC", DEFAULT_PER_10SEC)?,
            per_10min: parse_var("RIOT_PER_10MIN", DEFAULT_PER_10MIN)?,
            per_second: parse_var("RIOT_PER_SECOND", DEFAULT_PER_SECOND)?,
            match_budget: parse_var("MATCH_BUDGET", DEFAULT_MATCH_BUDGET)?,
            include_timelines: parse_var("INCLUDE_TIMELINES", false)?,
            data_dir: data_dir_from_env(),
        })
    }
}

/// Where worker results are stored. Needs no API key, so `show` can use it alone.
pub fn data_dir_from_env() -> PathBuf {
    dotenvy::dotenv().ok();
    match env::var("LEAGUE_STATS_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".league_stats"),
    }
}

/// Platform region from the environment or a CLI flag.
pub fn parse_region(raw: &str) -> Result<String, AppError> {
    endpoints::platform_region(raw)
        .map(str::to_string)
        .map_err(|e| AppError::Config(e.to_string()))
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_falls_back_to_default() {
        let value: u32 = parse_var("LEAGUE_STATS_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn set_variable_is_parsed_and_trimmed() {
        env::set_var("LEAGUE_STATS_TEST_BUDGET", " 250 ");
        let value: usize = parse_var("LEAGUE_STATS_TEST_BUDGET", 500).unwrap();
        assert_eq!(value, 250);
    }

    #[test]
    fn invalid_value_is_a_config_error() {
        env::set_var("LEAGUE_STATS_TEST_TIMELINES", "sometimes");
        let err = parse_var("LEAGUE_STATS_TEST_TIMELINES", false).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("LEAGUE_STATS_TEST_TIMELINES"));
    }

    #[test]
    fn region_must_be_a_known_platform() {
        assert_eq!(parse_region("EUW1").unwrap(), "euw1");
        let err = parse_region("evil.example/x#").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
