use crate::domain::model::RosterRow;
use crate::domain::ports::{CutNotice, RemovalPolicy};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// What to do with a cut player's stored history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnCut {
    #[default]
    Prompt,
    Keep,
    Remove,
}

impl OnCut {
    pub fn policy(self) -> Box<dyn RemovalPolicy> {
        match self {
            OnCut::Prompt => Box::new(PromptPolicy::stdio()),
            OnCut::Keep => Box::new(KeepHistory),
            OnCut::Remove => Box::new(RemoveHistory),
        }
    }
}

/// Batch mode: never deletes.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepHistory;

impl RemovalPolicy for KeepHistory {
    fn confirm_removal(&self, notice: &CutNotice<'_>) -> bool {
        tracing::warn!("{} is off the roster; keeping its data", notice.location);
        false
    }
}

/// Deletes without asking; the caller opted in up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveHistory;

impl RemovalPolicy for RemoveHistory {
    fn confirm_removal(&self, notice: &CutNotice<'_>) -> bool {
        tracing::warn!("{} is off the roster; removing its data", notice.location);
        true
    }
}

/// Asks on a terminal, re-asking until the answer is y/yes/n/no.
/// End of input counts as "no".
pub struct PromptPolicy {
    input: Mutex<Box<dyn BufRead + Send>>,
    output: Mutex<Box<dyn Write + Send>>,
}

impl PromptPolicy {
    pub fn new(input: Box<dyn BufRead + Send>, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    fn ask(&self, notice: &CutNotice<'_>) -> io::Result<bool> {
        let mut input = self.input.lock().unwrap_or_else(|e| e.into_inner());
        let mut output = self.output.lock().unwrap_or_else(|e| e.into_inner());

        let (team, player) = notice.location.team_and_player().unwrap_or(("?", "?"));
        let banner = format!(">> {} was cut from {} <<", player, team);
        writeln!(output, "{}", banner)?;
        write!(output, "{}", format_roster(notice.current_roster))?;
        writeln!(output, "{}", banner)?;

        let question = format!(
            "Remove player data from '{}'? (y/n) ",
            notice.location.season_info().folder_name()
        );
        loop {
            write!(output, "{}", question)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(false);
            }
            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(output, "Input not valid. Please type 'y' or 'n'.")?,
            }
        }
    }
}

impl RemovalPolicy for PromptPolicy {
    fn confirm_removal(&self, notice: &CutNotice<'_>) -> bool {
        match self.ask(notice) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Could not read removal confirmation: {}", e);
                false
            }
        }
    }
}

/// Plain-text table of the roster, columns padded to their widest cell.
pub fn format_roster(roster: &[RosterRow]) -> String {
    let header: Vec<String> = RosterRow::HEADERS.iter().map(|h| h.to_string()).collect();
    let rows: Vec<Vec<String>> = std::iter::once(header)
        .chain(roster.iter().map(RosterRow::to_record))
        .collect();

    let mut widths = vec![0; RosterRow::HEADERS.len()];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
