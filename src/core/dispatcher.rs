use crate::core::address::{AddressResolver, PathKind};
use crate::core::fetch::GatedFetcher;
use crate::core::ledger::FreshnessLedger;
use crate::core::roster::RosterReconciler;
use crate::core::store::ArtifactStore;
use crate::domain::model::{ArtifactKind, Location, Scope, UpdateRequest, LEDGER_FILE_NAME};
use crate::domain::ports::{CutNotice, RemovalPolicy};
use crate::utils::error::{Result, UpdateError};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Step of a single artifact's refresh at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetching,
    Persisting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Updated { rows: usize },
    Fresh { last_updated: NaiveDateTime },
    Skipped { reason: String },
    Failed { stage: Stage, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactOutcome {
    pub artifact: String,
    pub kind: Option<ArtifactKind>,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterDecision {
    OnRoster,
    CutKept,
    CutRemoved,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub request: UpdateRequest,
    pub roster: Option<RosterDecision>,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl UpdateReport {
    fn new(request: UpdateRequest) -> Self {
        Self {
            request,
            roster: None,
            outcomes: Vec::new(),
        }
    }

    pub fn updated(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ArtifactStatus::Updated { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ArtifactStatus::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

impl fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Update of {}", self.request.location)?;
        match self.roster {
            Some(RosterDecision::CutKept) => writeln!(f, "  player is off the roster; data kept")?,
            Some(RosterDecision::CutRemoved) => {
                writeln!(f, "  player is off the roster; data removed")?
            }
            _ => {}
        }
        for outcome in &self.outcomes {
            match &outcome.status {
                ArtifactStatus::Updated { rows } => {
                    writeln!(f, "  [ok]    {} ({} rows)", outcome.artifact, rows)?
                }
                ArtifactStatus::Fresh { last_updated } => writeln!(
                    f,
                    "  [fresh] {} (updated {})",
                    outcome.artifact, last_updated
                )?,
                ArtifactStatus::Skipped { reason } => {
                    writeln!(f, "  [skip]  {} ({})", outcome.artifact, reason)?
                }
                ArtifactStatus::Failed { stage, error } => writeln!(
                    f,
                    "  [fail]  {} while {:?}: {}",
                    outcome.artifact, stage, error
                )?,
            }
        }
        write!(
            f,
            "{} updated, {} failed",
            self.updated().count(),
            self.failed().count()
        )
    }
}

/// Runs one update request to completion: resolve, gate on the roster,
/// then fetch, persist and record each artifact in turn.
pub struct Dispatcher {
    resolver: AddressResolver,
    fetcher: GatedFetcher,
    reconciler: RosterReconciler,
    policy: Box<dyn RemovalPolicy>,
    skip_fresh: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        root: impl Into<PathBuf>,
        fetcher: GatedFetcher,
        policy: Box<dyn RemovalPolicy>,
    ) -> Self {
        Self {
            resolver: AddressResolver::new(root),
            fetcher,
            reconciler: RosterReconciler::new(),
            policy,
            skip_fresh: None,
        }
    }

    /// Artifacts recorded more recently than `max_age` are left alone.
    pub fn skip_fresh(mut self, max_age: Option<Duration>) -> Self {
        self.skip_fresh = max_age.filter(|d| !d.is_zero());
        self
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn fetcher(&self) -> &GatedFetcher {
        &self.fetcher
    }

    pub async fn dispatch(&mut self, path: &Path) -> Result<UpdateReport> {
        reject_ledger_target(path.file_name().and_then(|n| n.to_str()))?;

        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        };
        let request = self.resolver.resolve_request(path, path_kind(&full))?;
        self.run(request).await
    }

    pub async fn run(&mut self, request: UpdateRequest) -> Result<UpdateReport> {
        reject_ledger_target(request.target_artifact.as_deref())?;
        tracing::info!(
            "🏀 Updating {} ({})",
            request.location,
            request.target_artifact.as_deref().unwrap_or("whole directory")
        );

        let mut report = UpdateReport::new(request);
        match report.request.location.scope() {
            Scope::Season | Scope::Team => {
                tracing::info!(
                    "Nothing to refresh at {:?} scope",
                    report.request.location.scope()
                );
            }
            Scope::Player => self.run_player(&mut report).await?,
        }
        Ok(report)
    }

    async fn run_player(&mut self, report: &mut UpdateReport) -> Result<()> {
        let location = report.request.location.clone();
        let dir = self.root().join(location.relative_dir());
        let (team, player) = location.team_and_player().ok_or_else(|| {
            UpdateError::malformed_address(location.to_string(), "not a player location")
        })?;

        let check = self
            .reconciler
            .check_cut(&mut self.fetcher, player, team, location.season_info().end)
            .await?;
        if check.cut {
            let notice = CutNotice {
                location: &location,
                current_roster: &check.current_roster,
            };
            if self.policy.confirm_removal(&notice) {
                std::fs::remove_dir_all(&dir)?;
                tracing::warn!("🗑️ Removed {}", dir.display());
                report.roster = Some(RosterDecision::CutRemoved);
            } else {
                tracing::warn!("{} kept; no artifacts refreshed", location);
                report.roster = Some(RosterDecision::CutKept);
            }
            return Ok(());
        }
        report.roster = Some(RosterDecision::OnRoster);

        let store = ArtifactStore::new(&dir);
        let ledger = FreshnessLedger::new(&dir);
        let last_updated = ledger.last_updated()?;

        let targets = match &report.request.target_artifact {
            Some(name) => vec![name.clone()],
            None => stalest_first(
                store
                    .file_names()?
                    .into_iter()
                    .filter(|n| !n.eq_ignore_ascii_case(LEDGER_FILE_NAME))
                    .collect(),
                &last_updated,
            ),
        };

        for name in targets {
            let outcome = self
                .refresh_artifact(&location, &store, &ledger, &last_updated, name)
                .await?;
            report.outcomes.push(outcome);
        }

        tracing::info!(
            "✅ {}: {} updated, {} failed",
            location,
            report.updated().count(),
            report.failed().count()
        );
        Ok(())
    }

    async fn refresh_artifact(
        &mut self,
        location: &Location,
        store: &ArtifactStore,
        ledger: &FreshnessLedger,
        last_updated: &HashMap<String, NaiveDateTime>,
        artifact: String,
    ) -> Result<ArtifactOutcome> {
        let kind = ArtifactKind::classify(&artifact);
        let outcome = |status| ArtifactOutcome {
            artifact: artifact.clone(),
            kind,
            status,
        };

        let kind = match kind {
            Some(kind) if kind.is_player_level() => kind,
            Some(kind) => {
                return Ok(outcome(ArtifactStatus::Skipped {
                    reason: format!("{} is a team-level artifact", kind),
                }))
            }
            None => {
                tracing::debug!("Skipping unrecognized artifact {}", artifact);
                return Ok(outcome(ArtifactStatus::Skipped {
                    reason: "unrecognized artifact name".to_string(),
                }));
            }
        };
        if !self.fetcher.adapters().supports(kind) {
            return Ok(outcome(ArtifactStatus::Skipped {
                reason: format!("no adapter registered for {}", kind),
            }));
        }

        if let (Some(max_age), Some(at)) = (self.skip_fresh, last_updated.get(&artifact)) {
            let age = Local::now().naive_local().signed_duration_since(*at);
            if age.to_std().map(|age| age < max_age).unwrap_or(true) {
                tracing::info!("{} is fresh (updated {})", artifact, at);
                return Ok(outcome(ArtifactStatus::Fresh { last_updated: *at }));
            }
        }

        let table = match self.fetcher.fetch(location, kind).await {
            Ok(table) => table,
            Err(e) if !e.is_fatal() => {
                tracing::error!("❌ {}: {}", artifact, e);
                return Ok(outcome(ArtifactStatus::Failed {
                    stage: Stage::Fetching,
                    error: e.to_string(),
                }));
            }
            Err(e) => return Err(e),
        };

        // A file held open elsewhere fails only this artifact; its ledger
        // entry stays as it was.
        if let Err(e) = store.write(&artifact, &table) {
            tracing::error!("❌ {}: {}", artifact, e);
            return Ok(outcome(ArtifactStatus::Failed {
                stage: Stage::Persisting,
                error: e.to_string(),
            }));
        }
        ledger.record_update(&artifact)?;
        tracing::info!("📄 {} updated ({} rows)", artifact, table.records().len());

        Ok(outcome(ArtifactStatus::Updated {
            rows: table.records().len(),
        }))
    }
}

fn reject_ledger_target(name: Option<&str>) -> Result<()> {
    match name {
        Some(name) if name.eq_ignore_ascii_case(LEDGER_FILE_NAME) => {
            Err(UpdateError::IllegalTarget {
                target: name.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Existing entries decide; a path that does not exist yet is a file when it
/// carries a `.csv` extension.
fn path_kind(path: &Path) -> PathKind {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => PathKind::File,
        Ok(_) => PathKind::Directory,
        Err(_) => match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => PathKind::File,
            _ => PathKind::Directory,
        },
    }
}

/// Never-recorded artifacts first, then oldest update first.
fn stalest_first(
    mut names: Vec<String>,
    last_updated: &HashMap<String, NaiveDateTime>,
) -> Vec<String> {
    names.sort_by(|a, b| {
        last_updated
            .get(a)
            .cmp(&last_updated.get(b))
            .then_with(|| a.cmp(b))
    });
    names
}
