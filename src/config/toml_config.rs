use crate::adapters::http::HttpSourceSettings;
use crate::adapters::prompt::OnCut;
use crate::core::address::infer_root;
use crate::core::rate_limiter::RateLimitSettings;
use crate::domain::model::ArtifactKind;
use crate::utils::error::{Result, UpdateError};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    pub source: Option<SourceConfig>,
    /// Team name -> short code, e.g. "Atlanta Hawks" = "ATL".
    pub teams: HashMap<String, String>,
    pub update: UpdateConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Inferred from the target path when unset.
    pub root: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
    pub max_requests: u64,
    pub cooldown_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let defaults = RateLimitSettings::default();
        Self {
            window_seconds: defaults.window.as_secs(),
            max_requests: defaults.max_requests as u64,
            cooldown_seconds: defaults.cooldown.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    /// Artifact kind -> URL template.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub skip_fresh_seconds: u64,
    pub on_cut: OnCut,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UpdateError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UpdateError::ConfigError {
            message: format!("env pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(root) = &self.database.root {
            validate_path("database.root", root)?;
        }

        validate_positive_number("rate_limit.window_seconds", self.rate_limit.window_seconds, 1)?;
        validate_positive_number("rate_limit.max_requests", self.rate_limit.max_requests, 1)?;

        if let Some(source) = &self.source {
            validate_url("source.base_url", &source.base_url)?;
            if let Some(timeout) = source.timeout_seconds {
                validate_range("source.timeout_seconds", timeout, 1, 600)?;
            }
            for kind in source.endpoints.keys() {
                kind.parse::<ArtifactKind>()
                    .map_err(|reason| UpdateError::InvalidConfigValueError {
                        field: "source.endpoints".to_string(),
                        value: kind.clone(),
                        reason,
                    })?;
            }
        }

        Ok(())
    }

    pub fn rate_limit_settings(&self) -> RateLimitSettings {
        RateLimitSettings {
            window: Duration::from_secs(self.rate_limit.window_seconds),
            max_requests: self.rate_limit.max_requests as usize,
            cooldown: Duration::from_secs(self.rate_limit.cooldown_seconds),
        }
    }

    pub fn skip_fresh(&self) -> Option<Duration> {
        match self.update.skip_fresh_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Configured root, else the one implied by `target`. A relative root is
    /// taken from the working directory, like the target path itself.
    pub fn database_root(&self, target: &Path) -> Result<PathBuf> {
        let root = match &self.database.root {
            Some(root) => PathBuf::from(root),
            None => infer_root(target).ok_or_else(|| {
                UpdateError::malformed_address(
                    target.display().to_string(),
                    "no '<start>-<end> Season' folder in path and no database.root configured",
                )
            })?,
        };

        if root.is_absolute() {
            Ok(root)
        } else {
            Ok(std::env::current_dir()?.join(root))
        }
    }

    pub fn http_settings(&self) -> Result<HttpSourceSettings> {
        let source = self.source.as_ref().ok_or_else(|| UpdateError::ConfigError {
            message: "a [source] section is required to fetch artifacts".to_string(),
        })?;

        let mut endpoints = BTreeMap::new();
        for (kind, template) in &source.endpoints {
            let kind = kind
                .parse::<ArtifactKind>()
                .map_err(|message| UpdateError::ConfigError { message })?;
            endpoints.insert(kind, template.clone());
        }

        Ok(HttpSourceSettings {
            base_url: source.base_url.clone(),
            timeout: Duration::from_secs(source.timeout_seconds.unwrap_or(30)),
            user_agent: source
                .user_agent
                .clone()
                .unwrap_or_else(|| format!("nba-db-updater/{}", env!("CARGO_PKG_VERSION"))),
            endpoints,
            team_codes: self.teams.clone(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::{AddressResolver, PathKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
[database]
root = "/data/NBA Database"

[rate_limit]
window_seconds = 30
max_requests = 10
cooldown_seconds = 90

[source]
base_url = "https://stats.example.com"
timeout_seconds = 15

[source.endpoints]
roster = "{base_url}/teams/{team_code}/{season_end}.csv"
totals = "{base_url}/players/{player}/totals.csv"

[teams]
"Atlanta Hawks" = "ATL"

[update]
skip_fresh_seconds = 3600
on_cut = "keep"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(FULL).unwrap();
        assert!(config.validate().is_ok());

        let limits = config.rate_limit_settings();
        assert_eq!(limits.window, Duration::from_secs(30));
        assert_eq!(limits.max_requests, 10);
        assert_eq!(limits.cooldown, Duration::from_secs(90));
        assert_eq!(config.skip_fresh(), Some(Duration::from_secs(3600)));
        assert_eq!(config.update.on_cut, OnCut::Keep);

        let http = config.http_settings().unwrap();
        assert_eq!(http.endpoints.len(), 2);
        assert!(http.endpoints.contains_key(&ArtifactKind::Roster));
        assert_eq!(http.team_codes.get("Atlanta Hawks").map(String::as_str), Some("ATL"));
        assert_eq!(http.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit_settings(), RateLimitSettings::default());
        assert_eq!(config.skip_fresh(), None);
        assert_eq!(config.update.on_cut, OnCut::Prompt);
        assert!(config.http_settings().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("NBA_DB_TEST_BASE_URL", "https://mirror.example.com");

        let config = TomlConfig::from_toml_str(
            r#"
[source]
base_url = "${NBA_DB_TEST_BASE_URL}"
"#,
        )
        .unwrap();
        assert_eq!(
            config.source.unwrap().base_url,
            "https://mirror.example.com"
        );

        std::env::remove_var("NBA_DB_TEST_BASE_URL");
    }

    #[test]
    fn test_unknown_endpoint_kind_fails_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[source]
base_url = "https://stats.example.com"

[source.endpoints]
box_score = "{base_url}/box.csv"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(UpdateError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_zero_max_requests_is_invalid() {
        let config = TomlConfig::from_toml_str("[rate_limit]\nmax_requests = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_root_falls_back_to_path() {
        let config = TomlConfig::default();
        let root = config
            .database_root(Path::new("/srv/NBA Database/2024-2025 Season/Atlanta Hawks"))
            .unwrap();
        assert_eq!(root, PathBuf::from("/srv/NBA Database"));
        assert!(config.database_root(Path::new("/srv/elsewhere")).is_err());
    }

    #[test]
    fn test_relative_root_matches_absolute_target() {
        let config = TomlConfig::from_toml_str("[database]\nroot = \"data\"\n").unwrap();
        let cwd = std::env::current_dir().unwrap();
        let target = cwd
            .join("data")
            .join("2024-2025 Season")
            .join("Atlanta Hawks")
            .join("Jane Doe");

        let root = config.database_root(&target).unwrap();
        assert_eq!(root, cwd.join("data"));

        let location = AddressResolver::new(root)
            .resolve(&target, PathKind::Directory)
            .unwrap();
        assert_eq!(location.team_name(), Some("Atlanta Hawks"));
        assert_eq!(location.player_name(), Some("Jane Doe"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.database.root.as_deref(), Some("/data/NBA Database"));
    }
}
