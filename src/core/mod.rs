pub mod address;
pub mod dispatcher;
pub mod fetch;
pub mod ledger;
pub mod rate_limiter;
pub mod roster;
pub mod store;

pub use crate::domain::model::{ArtifactKind, Location, Scope, Season, Table, UpdateRequest};
pub use crate::domain::ports::{Clock, FetchAdapter, RemovalPolicy};
pub use crate::utils::error::Result;
