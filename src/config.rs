use std::env;
use std::path::PathBuf;

const DEFAULT_SEASON: u16 = 2025;
const DEFAULT_FETCH_PARALLELISM: usize = 10;
const DEFAULT_SCHEDULE_PARALLELISM: usize = 12;
const DEFAULT_MAX_PAGES: usize = 50;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PYTHAG_EXPONENT: f64 = 1.83;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";
pub const NCAA_BASE_URL: &str = "https://www.ncaa.com";
pub const RATINGS_BASE_URL: &str = "https://www.warrennolan.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    #[default]
    Inner,
    Outer,
}

impl JoinPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inner" => Some(Self::Inner),
            "outer" | "full" => Some(Self::Outer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub season: u16,
    pub fetch_parallelism: usize,
    pub schedule_parallelism: usize,
    pub max_pages: usize,
    pub pythag_exponent: f64,
    pub join_policy: JoinPolicy,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub ncaa_base_url: String,
    pub ratings_base_url: String,
    pub team_aliases_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            season: DEFAULT_SEASON,
            fetch_parallelism: DEFAULT_FETCH_PARALLELISM,
            schedule_parallelism: DEFAULT_SCHEDULE_PARALLELISM,
            max_pages: DEFAULT_MAX_PAGES,
            pythag_exponent: DEFAULT_PYTHAG_EXPONENT,
            join_policy: JoinPolicy::Inner,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ncaa_base_url: NCAA_BASE_URL.to_string(),
            ratings_base_url: RATINGS_BASE_URL.to_string(),
            team_aliases_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset, blank, or unparsable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let string = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let season = parse_value(string("CBB_SEASON")).unwrap_or(d.season);
        let fetch_parallelism = parse_value::<usize>(string("CBB_FETCH_PARALLELISM"))
            .unwrap_or(d.fetch_parallelism)
            .clamp(1, 32);
        let schedule_parallelism = parse_value::<usize>(string("CBB_SCHEDULE_PARALLELISM"))
            .unwrap_or(d.schedule_parallelism)
            .clamp(1, 32);
        let max_pages = parse_value::<usize>(string("CBB_MAX_PAGES"))
            .unwrap_or(d.max_pages)
            .clamp(1, 500);
        let pythag_exponent = parse_value::<f64>(string("CBB_PYTHAG_EXPONENT"))
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(d.pythag_exponent);
        let join_policy = string("CBB_JOIN_POLICY")
            .and_then(|raw| JoinPolicy::parse(&raw))
            .unwrap_or(d.join_policy);
        let timeout_secs = parse_value::<u64>(string("CBB_TIMEOUT_SECS"))
            .unwrap_or(d.timeout_secs)
            .clamp(1, 120);
        let user_agent = string("CBB_USER_AGENT").unwrap_or(d.user_agent);
        let ncaa_base_url = string("CBB_NCAA_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(d.ncaa_base_url);
        let ratings_base_url = string("CBB_RATINGS_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(d.ratings_base_url);
        let team_aliases_path = string("CBB_TEAM_ALIASES").map(PathBuf::from);

        Self {
            season,
            fetch_parallelism,
            schedule_parallelism,
            max_pages,
            pythag_exponent,
            join_policy,
            timeout_secs,
            user_agent,
            ncaa_base_url,
            ratings_base_url,
            team_aliases_path,
        }
    }

    pub fn ncaa_stats_url(&self) -> String {
        format!("{}/stats/baseball/d1", self.ncaa_base_url)
    }

    pub fn ncaa_rpi_url(&self) -> String {
        format!("{}/rankings/baseball/d1/rpi", self.ncaa_base_url)
    }

    pub fn ratings_url(&self, page: &str) -> String {
        format!("{}/baseball/{}/{page}", self.ratings_base_url, self.season)
    }
}

fn parse_value<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{JoinPolicy, PipelineConfig};

    fn config_from(vars: &[(&str, &str)]) -> PipelineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_values_use_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.season, 2025);
        assert_eq!(config.fetch_parallelism, 10);
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.pythag_exponent, 1.83);
        assert_eq!(config.join_policy, JoinPolicy::Inner);
        assert_eq!(config.ncaa_rpi_url(), "https://www.ncaa.com/rankings/baseball/d1/rpi");
        assert!(config.team_aliases_path.is_none());
    }

    #[test]
    fn numeric_values_are_clamped() {
        let config = config_from(&[
            ("CBB_FETCH_PARALLELISM", "0"),
            ("CBB_SCHEDULE_PARALLELISM", "100"),
            ("CBB_MAX_PAGES", "9000"),
            ("CBB_TIMEOUT_SECS", "0"),
        ]);
        assert_eq!(config.fetch_parallelism, 1);
        assert_eq!(config.schedule_parallelism, 32);
        assert_eq!(config.max_pages, 500);
        assert_eq!(config.timeout_secs, 1);
    }

    #[test]
    fn bad_exponent_and_blank_values_fall_back() {
        for raw in ["-2", "0", "NaN", "abc", "  "] {
            let config = config_from(&[("CBB_PYTHAG_EXPONENT", raw)]);
            assert_eq!(config.pythag_exponent, 1.83, "{raw:?}");
        }
        let config = config_from(&[("CBB_PYTHAG_EXPONENT", " 2 "), ("CBB_SEASON", "2024")]);
        assert_eq!(config.pythag_exponent, 2.0);
        assert_eq!(config.season, 2024);
    }

    #[test]
    fn base_urls_lose_trailing_slash() {
        let config = config_from(&[
            ("CBB_NCAA_BASE_URL", "https://ncaa.test/"),
            ("CBB_RATINGS_BASE_URL", "https://ratings.test//"),
            ("CBB_JOIN_POLICY", "OUTER"),
        ]);
        assert_eq!(config.ncaa_stats_url(), "https://ncaa.test/stats/baseball/d1");
        assert_eq!(config.ratings_url("elo"), "https://ratings.test/baseball/2025/elo");
        assert_eq!(config.join_policy, JoinPolicy::Outer);
    }

    #[test]
    fn join_policy_names() {
        assert_eq!(JoinPolicy::parse("inner"), Some(JoinPolicy::Inner));
        assert_eq!(JoinPolicy::parse(" Full "), Some(JoinPolicy::Outer));
        assert_eq!(JoinPolicy::parse("left"), None);
    }
}
