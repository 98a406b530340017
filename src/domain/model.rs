use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const LEDGER_FILE_NAME: &str = "log information.csv";
pub const LEDGER_HEADERS: [&str; 3] = ["File", "Date Last Updated", "Time Last Updated"];
pub const LEDGER_DATE_FORMAT: &str = "%Y-%m-%d";
pub const LEDGER_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Season {
    pub start: i32,
    pub end: i32,
}

impl Season {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Season whose final year is `end`, e.g. 2025 -> 2024-2025.
    pub fn ending(end: i32) -> Self {
        Self::new(end - 1, end)
    }

    pub fn folder_name(&self) -> String {
        format!("{}-{} Season", self.start, self.end)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Season,
    Team,
    Player,
}

/// A resolved point in the season/team/player hierarchy.
///
/// Only the constructors can build one, so `scope` always agrees with which
/// of `team`/`player` are present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    scope: Scope,
    season: Season,
    team: Option<String>,
    player: Option<String>,
}

impl Location {
    pub fn season(season: Season) -> Self {
        Self {
            scope: Scope::Season,
            season,
            team: None,
            player: None,
        }
    }

    pub fn team(season: Season, team: impl Into<String>) -> Self {
        Self {
            scope: Scope::Team,
            season,
            team: Some(team.into()),
            player: None,
        }
    }

    pub fn player(season: Season, team: impl Into<String>, player: impl Into<String>) -> Self {
        Self {
            scope: Scope::Player,
            season,
            team: Some(team.into()),
            player: Some(player.into()),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn season_info(&self) -> Season {
        self.season
    }

    pub fn team_name(&self) -> Option<&str> {
        self.team.as_deref()
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn team_and_player(&self) -> Option<(&str, &str)> {
        self.team_name().zip(self.player_name())
    }

    /// The enclosing team location of a player, or the team itself.
    pub fn team_location(&self) -> Option<Location> {
        self.team.as_ref().map(|t| Location::team(self.season, t.clone()))
    }

    /// Directory of this location relative to the database root.
    pub fn relative_dir(&self) -> PathBuf {
        let mut dir = PathBuf::from(self.season.folder_name());
        if let Some(team) = &self.team {
            dir.push(team);
        }
        if let Some(player) = &self.player {
            dir.push(player);
        }
        dir
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_dir().display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    pub location: Location,
    pub target_artifact: Option<String>,
    pub is_whole_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub artifact_name: String,
    pub last_updated_date: NaiveDate,
    pub last_updated_time: NaiveTime,
}

impl LedgerEntry {
    pub fn new(artifact_name: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            last_updated_date: at.date(),
            last_updated_time: at.time(),
        }
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        self.last_updated_date.and_time(self.last_updated_time)
    }

    pub fn to_record(&self) -> [String; 3] {
        [
            self.artifact_name.clone(),
            self.last_updated_date.format(LEDGER_DATE_FORMAT).to_string(),
            self.last_updated_time.format(LEDGER_TIME_FORMAT).to_string(),
        ]
    }
}

/// Opaque tabular payload; the first row holds column headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn records(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    pub player_name: String,
    pub team: String,
    pub position: String,
    pub height: String,
    pub weight: String,
    pub dob: String,
    pub nationality: String,
    pub experience_years: String,
    pub profile_ref: String,
}

impl RosterRow {
    pub const HEADERS: [&'static str; 9] = [
        "Player",
        "Team",
        "Position",
        "Height",
        "Weight",
        "DOB",
        "Nationality",
        "Experience (Yrs)",
        "Website",
    ];

    pub fn from_record(record: &[String]) -> Option<Self> {
        match record {
            [player_name, team, position, height, weight, dob, nationality, experience_years, profile_ref, ..] => {
                Some(Self {
                    player_name: player_name.clone(),
                    team: team.clone(),
                    position: position.clone(),
                    height: height.clone(),
                    weight: weight.clone(),
                    dob: dob.clone(),
                    nationality: nationality.clone(),
                    experience_years: experience_years.clone(),
                    profile_ref: profile_ref.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.player_name.clone(),
            self.team.clone(),
            self.position.clone(),
            self.height.clone(),
            self.weight.clone(),
            self.dob.clone(),
            self.nationality.clone(),
            self.experience_years.clone(),
            self.profile_ref.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Characteristics,
    SeasonProjections,
    Totals,
    Per36Minutes,
    Advanced,
    Roster,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Characteristics,
        ArtifactKind::SeasonProjections,
        ArtifactKind::Totals,
        ArtifactKind::Per36Minutes,
        ArtifactKind::Advanced,
        ArtifactKind::Roster,
    ];

    /// Keyword looked for in a file name. Checked in `ALL` order, so a name
    /// carrying several keywords maps to the first kind listed.
    fn keyword(self) -> &'static str {
        match self {
            ArtifactKind::Characteristics => "characteristics",
            ArtifactKind::SeasonProjections => "season projection",
            ArtifactKind::Totals => "totals",
            ArtifactKind::Per36Minutes => "36-min",
            ArtifactKind::Advanced => "advanced",
            ArtifactKind::Roster => "roster",
        }
    }

    /// Maps an artifact file name to its kind. Unknown names are `None`, and
    /// the ledger itself never classifies.
    pub fn classify(file_name: &str) -> Option<ArtifactKind> {
        if file_name.eq_ignore_ascii_case(LEDGER_FILE_NAME) {
            return None;
        }
        let lowered = file_name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| lowered.contains(kind.keyword()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Characteristics => "characteristics",
            ArtifactKind::SeasonProjections => "season_projections",
            ArtifactKind::Totals => "totals",
            ArtifactKind::Per36Minutes => "per_36_minutes",
            ArtifactKind::Advanced => "advanced",
            ArtifactKind::Roster => "roster",
        }
    }

    pub fn is_player_level(self) -> bool {
        !matches!(self, ArtifactKind::Roster)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown artifact kind '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_names() {
        assert_eq!(
            ArtifactKind::classify("player characteristics.csv"),
            Some(ArtifactKind::Characteristics)
        );
        assert_eq!(
            ArtifactKind::classify("Season Projections.csv"),
            Some(ArtifactKind::SeasonProjections)
        );
        assert_eq!(ArtifactKind::classify("totals.csv"), Some(ArtifactKind::Totals));
        assert_eq!(
            ArtifactKind::classify("36-min stats.csv"),
            Some(ArtifactKind::Per36Minutes)
        );
        assert_eq!(
            ArtifactKind::classify("advanced stats.csv"),
            Some(ArtifactKind::Advanced)
        );
        assert_eq!(
            ArtifactKind::classify("roster overview.csv"),
            Some(ArtifactKind::Roster)
        );
    }

    #[test]
    fn test_classify_unknown_and_ledger() {
        assert_eq!(ArtifactKind::classify("notes.txt"), None);
        assert_eq!(ArtifactKind::classify(LEDGER_FILE_NAME), None);
    }

    #[test]
    fn test_kind_round_trips_through_config_key() {
        for kind in ArtifactKind::ALL {
            assert_eq!(kind.as_str().parse::<ArtifactKind>().unwrap(), kind);
        }
        assert!("box_score".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_location_relative_dir() {
        let loc = Location::player(Season::new(2024, 2025), "Atlanta Hawks", "Jane Doe");
        assert_eq!(
            loc.relative_dir(),
            PathBuf::from("2024-2025 Season/Atlanta Hawks/Jane Doe")
        );
        assert_eq!(
            loc.team_location(),
            Some(Location::team(Season::new(2024, 2025), "Atlanta Hawks"))
        );
    }

    #[test]
    fn test_roster_row_requires_all_columns() {
        let short = vec!["Jane Doe".to_string(), "Atlanta Hawks".to_string()];
        assert!(RosterRow::from_record(&short).is_none());

        let full: Vec<String> = RosterRow::HEADERS.iter().map(|s| s.to_string()).collect();
        let row = RosterRow::from_record(&full).unwrap();
        assert_eq!(row.player_name, "Player");
        assert_eq!(row.profile_ref, "Website");
    }
}
