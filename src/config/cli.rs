use super::TomlConfig;
use crate::adapters::prompt::OnCut;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "nba-db-updater")]
#[command(about = "Refresh a season, team or player folder of the NBA database")]
pub struct CliConfig {
    /// File or folder to update, e.g. ".../2024-2025 Season/Atlanta Hawks/Jane Doe"
    pub path: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Database root (the folder holding the season folders)
    #[arg(long)]
    pub root: Option<String>,

    /// Remove a cut player's data without asking
    #[arg(long, conflicts_with = "no_prompt")]
    pub yes: bool,

    /// Never ask; keep a cut player's data
    #[arg(long)]
    pub no_prompt: bool,

    /// Leave artifacts updated less than this many seconds ago alone
    #[arg(long)]
    pub skip_fresh_secs: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliConfig {
    /// The config file (or defaults) with command-line overrides applied.
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(root) = &self.root {
            config.database.root = Some(root.clone());
        }
        if let Some(secs) = self.skip_fresh_secs {
            config.update.skip_fresh_seconds = secs;
        }
        if self.yes {
            config.update.on_cut = OnCut::Remove;
        } else if self.no_prompt {
            config.update.on_cut = OnCut::Keep;
        }

        Ok(config)
    }
}
