use crate::core::fetch::GatedFetcher;
use crate::domain::model::{ArtifactKind, Location, RosterRow, Season, Table};
use crate::utils::error::{Result, UpdateError};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutCheck {
    pub cut: bool,
    pub current_roster: Vec<RosterRow>,
}

/// Decides whether a player is still on their team's current roster.
///
/// Names must match exactly; trades and name changes look like cuts.
#[derive(Debug, Clone, Default)]
pub struct RosterReconciler;

impl RosterReconciler {
    pub fn new() -> Self {
        Self
    }

    pub async fn check_cut(
        &self,
        fetcher: &mut GatedFetcher,
        player: &str,
        team: &str,
        season_end: i32,
    ) -> Result<CutCheck> {
        let location = Location::team(Season::ending(season_end), team);
        let table = fetcher.fetch(&location, ArtifactKind::Roster).await?;
        let current_roster = parse_roster(&table)?;
        let cut = is_cut(player, &current_roster);

        if cut {
            tracing::warn!("{} is not on the current {} roster", player, team);
        } else {
            tracing::debug!("{} found on {} roster ({} players)", player, team, current_roster.len());
        }

        Ok(CutCheck {
            cut,
            current_roster,
        })
    }
}

pub fn is_cut(player: &str, roster: &[RosterRow]) -> bool {
    !roster.iter().any(|row| row.player_name == player)
}

pub fn parse_roster(table: &Table) -> Result<Vec<RosterRow>> {
    table
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            RosterRow::from_record(record).ok_or_else(|| {
                UpdateError::malformed_response(
                    ArtifactKind::Roster.as_str(),
                    format!(
                        "row {} has {} columns, expected {}",
                        i + 2,
                        record.len(),
                        RosterRow::HEADERS.len()
                    ),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str) -> RosterRow {
        RosterRow {
            player_name: name.to_string(),
            team: "Atlanta Hawks".to_string(),
            position: "G".to_string(),
            height: "6-3".to_string(),
            weight: "180".to_string(),
            dob: "January 1, 2000".to_string(),
            nationality: "US".to_string(),
            experience_years: "3".to_string(),
            profile_ref: "/players/d/doeja01.html".to_string(),
        }
    }

    #[test]
    fn test_exact_name_match_only() {
        let roster = vec![row("Jane Doe"), row("Trae Young")];
        assert!(!is_cut("Jane Doe", &roster));
        assert!(is_cut("jane doe", &roster));
        assert!(is_cut("Jane  Doe", &roster));
        assert!(is_cut("Jane Doe", &[]));
    }

    #[test]
    fn test_parse_roster_rejects_short_rows() {
        let mut rows = vec![RosterRow::HEADERS.iter().map(|s| s.to_string()).collect()];
        rows.push(row("Jane Doe").to_record());
        rows.push(vec!["Trae Young".to_string()]);

        let err = parse_roster(&Table::new(rows)).unwrap_err();
        assert!(matches!(err, UpdateError::MalformedResponse { .. }));
    }
}
