use crate::domain::model::{ArtifactKind, Location, Table};
use crate::domain::ports::FetchAdapter;
use crate::utils::error::{Result, UpdateError};
use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpSourceSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// URL template per artifact kind.
    pub endpoints: BTreeMap<ArtifactKind, String>,
    /// Team name -> short code used by `{team_code}`.
    pub team_codes: HashMap<String, String>,
}

/// Fetches artifact tables published as CSV over HTTP.
///
/// Templates may use `{base_url}`, `{season_start}`, `{season_end}`,
/// `{team}`, `{team_code}`, `{player}` and `{kind}`; unknown placeholders are
/// left untouched.
pub struct HttpSource {
    client: Client,
    settings: HttpSourceSettings,
    placeholder: Regex,
}

impl HttpSource {
    pub fn new(settings: HttpSourceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        let placeholder = Regex::new(r"\{([a-z_]+)\}").map_err(|e| UpdateError::ConfigError {
            message: format!("placeholder pattern: {}", e),
        })?;

        Ok(Self {
            client,
            settings,
            placeholder,
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.settings.endpoints.keys().copied()
    }

    pub fn endpoint_for(&self, location: &Location, kind: ArtifactKind) -> Result<Url> {
        let template = self.settings.endpoints.get(&kind).ok_or_else(|| {
            UpdateError::source_unavailable(kind.as_str(), "no endpoint configured")
        })?;

        let season = location.season_info();
        let team = location.team_name();
        let mut values: HashMap<&str, String> = HashMap::new();
        values.insert("base_url", self.settings.base_url.trim_end_matches('/').to_string());
        values.insert("season_start", season.start.to_string());
        values.insert("season_end", season.end.to_string());
        values.insert("kind", kind.as_str().to_string());
        if let Some(team) = team {
            values.insert("team", team.to_string());
            values.insert(
                "team_code",
                self.settings
                    .team_codes
                    .get(team)
                    .cloned()
                    .unwrap_or_else(|| team.to_string()),
            );
        }
        if let Some(player) = location.player_name() {
            values.insert("player", player.to_string());
        }

        let mut missing = Vec::new();
        let filled = self
            .placeholder
            .replace_all(template, |caps: &Captures| {
                let key = &caps[1];
                match values.get(key) {
                    Some(value) => value.clone(),
                    None => {
                        if matches!(key, "team" | "team_code" | "player") {
                            missing.push(key.to_string());
                        }
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();

        if !missing.is_empty() {
            return Err(UpdateError::source_unavailable(
                kind.as_str(),
                format!("{} has no value for {}", location, missing.join(", ")),
            ));
        }

        Url::parse(&filled).map_err(|e| UpdateError::ConfigError {
            message: format!("endpoint for {} is not a URL ('{}'): {}", kind, filled, e),
        })
    }
}

#[async_trait]
impl FetchAdapter for HttpSource {
    async fn fetch(&self, location: &Location, kind: ArtifactKind) -> Result<Table> {
        let url = self.endpoint_for(location, kind)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| UpdateError::source_unavailable(kind.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::source_unavailable(
                kind.as_str(),
                format!("HTTP {} from {}", status, url),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpdateError::source_unavailable(kind.as_str(), e.to_string()))?;
        parse_csv_table(kind, &body)
    }
}

pub fn parse_csv_table(kind: ArtifactKind, body: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| UpdateError::malformed_response(kind.as_str(), e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if rows.is_empty() {
        return Err(UpdateError::malformed_response(kind.as_str(), "empty body"));
    }
    Ok(Table::new(rows))
}
