use crate::domain::model::{Location, Season, UpdateRequest};
use crate::utils::error::{Result, UpdateError};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

/// Maps storage paths to locations. Directory depth below the root is the
/// whole schema: 1 = season, 2 = team, 3 = player.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    root: PathBuf,
}

impl AddressResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &Path, kind: PathKind) -> Result<Location> {
        self.resolve_request(path, kind).map(|request| request.location)
    }

    /// Like [`resolve`](Self::resolve), but keeps a trailing file name as the
    /// request's target artifact.
    pub fn resolve_request(&self, path: &Path, kind: PathKind) -> Result<UpdateRequest> {
        let display = path.display().to_string();
        let mut segments = self.segments(path, &display)?;

        let target_artifact = match kind {
            PathKind::File => Some(
                segments
                    .pop()
                    .ok_or_else(|| UpdateError::malformed_address(&display, "no file name"))?,
            ),
            PathKind::Directory => None,
        };

        let location = match segments.as_slice() {
            [season] => Location::season(parse_season(season, &display)?),
            [season, team] => Location::team(parse_season(season, &display)?, team.clone()),
            [season, team, player] => Location::player(
                parse_season(season, &display)?,
                team.clone(),
                player.clone(),
            ),
            other => {
                return Err(UpdateError::malformed_address(
                    &display,
                    format!("directory depth {} is not 1, 2 or 3", other.len()),
                ))
            }
        };

        Ok(UpdateRequest {
            location,
            is_whole_directory: target_artifact.is_none(),
            target_artifact,
        })
    }

    fn segments(&self, path: &Path, display: &str) -> Result<Vec<String>> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).map_err(|_| {
                UpdateError::malformed_address(display, "path is outside the database root")
            })?
        } else {
            path
        };

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        UpdateError::malformed_address(display, "path is not valid UTF-8")
                    })?;
                    segments.push(part.to_string());
                }
                Component::CurDir => {}
                _ => {
                    return Err(UpdateError::malformed_address(
                        display,
                        "path must be a plain descendant of the database root",
                    ))
                }
            }
        }
        Ok(segments)
    }
}

/// Parses `"<startYear>-<endYear> Season"` exactly: digit-only years, one
/// space before the suffix. Only the suffix's case is free.
pub fn parse_season(segment: &str, display: &str) -> Result<Season> {
    let malformed = || {
        UpdateError::malformed_address(
            display,
            format!("'{}' is not '<startYear>-<endYear> Season'", segment),
        )
    };
    let year = |digits: &str| {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        digits.parse::<i32>().map_err(|_| malformed())
    };

    let lowered = segment.to_ascii_lowercase();
    let years = lowered.strip_suffix(" season").ok_or_else(malformed)?;
    let (start, end) = years.split_once('-').ok_or_else(malformed)?;

    Ok(Season::new(year(start)?, year(end)?))
}

/// The database root of an absolute path: the parent of its last
/// `"<start>-<end> Season"` segment.
pub fn infer_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .filter(|ancestor| {
            ancestor
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| parse_season(name, name).is_ok())
                .unwrap_or(false)
        })
        .find_map(|season_dir| season_dir.parent().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Scope;

    fn resolver() -> AddressResolver {
        AddressResolver::new("/data/NBA Database")
    }

    #[test]
    fn test_depth_one_is_season() {
        let loc = resolver()
            .resolve(
                Path::new("/data/NBA Database/2024-2025 Season"),
                PathKind::Directory,
            )
            .unwrap();
        assert_eq!(loc.scope(), Scope::Season);
        assert_eq!(loc.season_info(), Season::new(2024, 2025));
        assert_eq!(loc.team_name(), None);
        assert_eq!(loc.player_name(), None);
    }

    #[test]
    fn test_depth_two_is_team() {
        let loc = resolver()
            .resolve(
                Path::new("2024-2025 Season/Atlanta Hawks"),
                PathKind::Directory,
            )
            .unwrap();
        assert_eq!(loc.scope(), Scope::Team);
        assert_eq!(loc.team_name(), Some("Atlanta Hawks"));
    }

    #[test]
    fn test_depth_three_is_player_with_names_verbatim() {
        let loc = resolver()
            .resolve(
                Path::new("/data/NBA Database/2024-2025 Season/Atlanta Hawks/P.J. Washington Jr."),
                PathKind::Directory,
            )
            .unwrap();
        assert_eq!(loc.scope(), Scope::Player);
        assert_eq!(loc.team_name(), Some("Atlanta Hawks"));
        assert_eq!(loc.player_name(), Some("P.J. Washington Jr."));
    }

    #[test]
    fn test_file_segment_is_excluded_from_depth() {
        let request = resolver()
            .resolve_request(
                Path::new("2024-2025 Season/Atlanta Hawks/Jane Doe/totals.csv"),
                PathKind::File,
            )
            .unwrap();
        assert_eq!(request.location.scope(), Scope::Player);
        assert_eq!(request.target_artifact.as_deref(), Some("totals.csv"));
        assert!(!request.is_whole_directory);
    }

    #[test]
    fn test_invalid_depths_are_rejected() {
        let r = resolver();
        let too_deep = r.resolve(
            Path::new("2024-2025 Season/Atlanta Hawks/Jane Doe/extra"),
            PathKind::Directory,
        );
        assert!(matches!(too_deep, Err(UpdateError::MalformedAddress { .. })));

        let root = r.resolve(Path::new("/data/NBA Database"), PathKind::Directory);
        assert!(matches!(root, Err(UpdateError::MalformedAddress { .. })));

        let file_at_root = r.resolve(Path::new("schedule.csv"), PathKind::File);
        assert!(matches!(file_at_root, Err(UpdateError::MalformedAddress { .. })));
    }

    #[test]
    fn test_bad_season_segment() {
        let r = resolver();
        for bad in [
            "2024 Season",
            "Season 2024-2025",
            "twenty-five Season",
            "2024-2025",
            "2024-2025Season",
            "2024-2025  Season",
            "+2024-2025 Season",
            "2024 - 2025 Season",
            "2024--2025 Season",
            " 2024-2025 Season",
        ] {
            let result = r.resolve(Path::new(bad), PathKind::Directory);
            assert!(
                matches!(result, Err(UpdateError::MalformedAddress { .. })),
                "{} should be rejected",
                bad
            );
        }
        assert!(r
            .resolve(Path::new("2024-2025 season"), PathKind::Directory)
            .is_ok());
    }

    #[test]
    fn test_infer_root_from_any_depth() {
        let expected = Some(PathBuf::from("/data/NBA Database"));
        assert_eq!(
            infer_root(Path::new("/data/NBA Database/2024-2025 Season")),
            expected
        );
        assert_eq!(
            infer_root(Path::new(
                "/data/NBA Database/2024-2025 Season/Atlanta Hawks/Jane Doe/totals.csv"
            )),
            expected
        );
        assert_eq!(infer_root(Path::new("/data/NBA Database")), None);
    }

    #[test]
    fn test_paths_outside_root_are_rejected() {
        let r = resolver();
        let outside = r.resolve(Path::new("/tmp/2024-2025 Season"), PathKind::Directory);
        assert!(matches!(outside, Err(UpdateError::MalformedAddress { .. })));

        let escaping = r.resolve(
            Path::new("2024-2025 Season/../2023-2024 Season"),
            PathKind::Directory,
        );
        assert!(matches!(escaping, Err(UpdateError::MalformedAddress { .. })));
    }
}
