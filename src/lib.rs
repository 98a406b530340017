pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use crate::core::{
    address::AddressResolver,
    dispatcher::{Dispatcher, UpdateReport},
    fetch::{AdapterTable, GatedFetcher},
    ledger::FreshnessLedger,
    rate_limiter::RateLimiter,
    roster::RosterReconciler,
};
pub use utils::error::{Result, UpdateError};
