use httpmock::prelude::*;
use nba_db_updater::adapters::http::HttpSource;
use nba_db_updater::adapters::prompt::KeepHistory;
use nba_db_updater::core::dispatcher::{ArtifactStatus, RosterDecision};
use nba_db_updater::utils::validation::Validate;
use nba_db_updater::{
    AdapterTable, Dispatcher, FreshnessLedger, GatedFetcher, RateLimiter, TomlConfig,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const ROSTER_CSV: &str = "\
Player,Team,Pos,Ht,Wt,Birth Date,Country,Exp,Link
Trae Young,Atlanta Hawks,PG,6-1,164,\"September 19, 1998\",US,6,/players/y/youngtr01.html
Jane Doe,Atlanta Hawks,F,6-8,220,\"March 3, 1999\",US,4,/players/d/doeja01.html
";

const TOTALS_CSV: &str = "Season,G,PTS\n2024-25,74,1320\n";

fn config_for(server: &MockServer, root: &std::path::Path) -> TomlConfig {
    let toml = format!(
        r#"
[database]
root = "{root}"

[source]
base_url = "{base}"
timeout_seconds = 5

[source.endpoints]
roster = "{{base_url}}/teams/{{team_code}}/{{season_end}}/roster.csv"
totals = "{{base_url}}/teams/{{team_code}}/{{season_end}}/{{kind}}.csv"
advanced = "{{base_url}}/teams/{{team_code}}/{{season_end}}/{{kind}}.csv"

[teams]
"Atlanta Hawks" = "ATL"

[update]
on_cut = "keep"
"#,
        root = root.display(),
        base = server.base_url(),
    );
    TomlConfig::from_toml_str(&toml).unwrap()
}

fn build_dispatcher(config: &TomlConfig) -> Dispatcher {
    let source = Arc::new(HttpSource::new(config.http_settings().unwrap()).unwrap());
    let mut adapters = AdapterTable::new();
    for kind in source.kinds() {
        adapters.register(kind, source.clone());
    }
    let fetcher = GatedFetcher::new(RateLimiter::new(config.rate_limit_settings()), adapters);
    Dispatcher::new(
        config.database.root.clone().unwrap(),
        fetcher,
        Box::new(KeepHistory),
    )
}

#[tokio::test]
async fn test_player_directory_update_over_http() {
    let server = MockServer::start();
    let roster = server.mock(|when, then| {
        when.method(GET).path("/teams/ATL/2025/roster.csv");
        then.status(200).body(ROSTER_CSV);
    });
    let totals = server.mock(|when, then| {
        when.method(GET).path("/teams/ATL/2025/totals.csv");
        then.status(200).body(TOTALS_CSV);
    });
    let advanced = server.mock(|when, then| {
        when.method(GET).path("/teams/ATL/2025/advanced.csv");
        then.status(500);
    });

    let temp = TempDir::new().unwrap();
    let dir = temp
        .path()
        .join("2024-2025 Season")
        .join("Atlanta Hawks")
        .join("Jane Doe");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("totals.csv"), "stale\n").unwrap();
    fs::write(dir.join("advanced stats.csv"), "stale\n").unwrap();

    let config = config_for(&server, temp.path());
    assert!(config.validate().is_ok());
    let mut dispatcher = build_dispatcher(&config);

    let report = dispatcher.dispatch(&dir).await.unwrap();

    roster.assert();
    totals.assert();
    advanced.assert();

    assert_eq!(report.roster, Some(RosterDecision::OnRoster));
    assert_eq!(report.updated().count(), 1);
    assert_eq!(report.failed().count(), 1);

    let totals_outcome = report
        .outcomes
        .iter()
        .find(|o| o.artifact == "totals.csv")
        .unwrap();
    assert_eq!(totals_outcome.status, ArtifactStatus::Updated { rows: 1 });
    assert_eq!(fs::read_to_string(dir.join("totals.csv")).unwrap(), TOTALS_CSV);
    assert_eq!(
        fs::read_to_string(dir.join("advanced stats.csv")).unwrap(),
        "stale\n"
    );

    let recorded: Vec<String> = FreshnessLedger::new(&dir)
        .read_all()
        .unwrap()
        .map(|e| e.unwrap().artifact_name)
        .collect();
    assert_eq!(recorded, vec!["totals.csv"]);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["roster"], "on_roster");
}

#[tokio::test]
async fn test_roster_outage_aborts_player_update() {
    let server = MockServer::start();
    let roster = server.mock(|when, then| {
        when.method(GET).path("/teams/ATL/2025/roster.csv");
        then.status(503);
    });
    let totals = server.mock(|when, then| {
        when.method(GET).path("/teams/ATL/2025/totals.csv");
        then.status(200).body(TOTALS_CSV);
    });

    let temp = TempDir::new().unwrap();
    let dir = temp
        .path()
        .join("2024-2025 Season")
        .join("Atlanta Hawks")
        .join("Jane Doe");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("totals.csv"), "stale\n").unwrap();

    let config = config_for(&server, temp.path());
    let mut dispatcher = build_dispatcher(&config);

    let result = dispatcher.dispatch(&dir.join("totals.csv")).await;

    assert!(result.is_err());
    roster.assert();
    totals.assert_hits(0);
    assert_eq!(fs::read_to_string(dir.join("totals.csv")).unwrap(), "stale\n");
}
