use crate::domain::model::{ArtifactKind, Location, RosterRow, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Source of raw tables for one artifact kind at one location.
///
/// Implementations fail with `SourceUnavailable` or `MalformedResponse`; the
/// caller is responsible for rate limiting.
#[async_trait]
pub trait FetchAdapter: Send + Sync {
    async fn fetch(&self, location: &Location, kind: ArtifactKind) -> Result<Table>;
}

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// A player missing from their team's current roster.
#[derive(Debug, Clone)]
pub struct CutNotice<'a> {
    pub location: &'a Location,
    pub current_roster: &'a [RosterRow],
}

/// Owns the confirm/deny decision before a cut player's history is deleted.
pub trait RemovalPolicy: Send + Sync {
    fn confirm_removal(&self, notice: &CutNotice<'_>) -> bool;
}
