use crate::core::store::write_rows_atomic;
use crate::domain::model::{
    LedgerEntry, LEDGER_DATE_FORMAT, LEDGER_FILE_NAME, LEDGER_HEADERS, LEDGER_TIME_FORMAT,
};
use crate::utils::error::{Result, UpdateError};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Per-directory record of when each artifact was last written.
///
/// The file is a flat snapshot: every write reads all entries, replaces or
/// appends one, and rewrites the whole file with the header first.
#[derive(Debug, Clone)]
pub struct FreshnessLedger {
    path: PathBuf,
}

impl FreshnessLedger {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LEDGER_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a header-only ledger unless one already exists.
    pub fn initialize(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        write_rows_atomic(&self.path, [LEDGER_HEADERS])
    }

    pub fn record_update(&self, artifact_name: &str) -> Result<LedgerEntry> {
        self.record_update_at(artifact_name, Local::now().naive_local())
    }

    pub fn record_update_at(&self, artifact_name: &str, at: NaiveDateTime) -> Result<LedgerEntry> {
        let entry = LedgerEntry::new(artifact_name, at);

        let mut entries = Vec::new();
        let mut replaced = false;
        for existing in self.read_all()? {
            let existing = existing?;
            if existing.artifact_name != artifact_name {
                entries.push(existing);
            } else if !replaced {
                entries.push(entry.clone());
                replaced = true;
            }
        }
        if !replaced {
            entries.push(entry.clone());
        }

        let header = LEDGER_HEADERS.map(str::to_string);
        let rows = std::iter::once(header).chain(entries.iter().map(LedgerEntry::to_record));
        write_rows_atomic(&self.path, rows)?;

        tracing::debug!(
            "Ledger {} now holds {} entries ({} {})",
            self.path.display(),
            entries.len(),
            artifact_name,
            if replaced { "replaced" } else { "appended" }
        );
        Ok(entry)
    }

    /// Lazily reads the entries. A missing or empty file yields nothing; each
    /// call starts again from the top of the file.
    pub fn read_all(&self) -> Result<LedgerEntries> {
        let file = match File::open(&self.path) {
            Ok(file) => Some(file),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let records = file.map(|file| {
            csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(file)
                .into_records()
        });

        Ok(LedgerEntries {
            records,
            path: self.path.display().to_string(),
            row: 0,
        })
    }

    /// Last update time per artifact name.
    pub fn last_updated(&self) -> Result<HashMap<String, NaiveDateTime>> {
        self.read_all()?
            .map(|entry| entry.map(|e| (e.artifact_name.clone(), e.updated_at())))
            .collect()
    }
}

pub struct LedgerEntries {
    records: Option<csv::StringRecordsIntoIter<File>>,
    path: String,
    row: usize,
}

impl LedgerEntries {
    fn corrupt(&mut self, message: impl Into<String>) -> UpdateError {
        // Stop after the first bad row.
        self.records = None;
        UpdateError::LedgerCorrupt {
            path: self.path.clone(),
            row: self.row,
            message: message.into(),
        }
    }
}

impl Iterator for LedgerEntries {
    type Item = Result<LedgerEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.records.as_mut()?.next()?;
            self.row += 1;

            let record = match next {
                Ok(record) => record,
                Err(e) => return Some(Err(self.corrupt(e.to_string()))),
            };

            if self.row == 1 {
                let is_header = record.len() == LEDGER_HEADERS.len()
                    && record
                        .iter()
                        .zip(LEDGER_HEADERS)
                        .all(|(found, expected)| found.trim() == expected);
                if is_header {
                    continue;
                }
                return Some(Err(self.corrupt("missing header row")));
            }

            return Some(match parse_entry(&record) {
                Ok(entry) => Ok(entry),
                Err(message) => Err(self.corrupt(message)),
            });
        }
    }
}

fn parse_entry(record: &csv::StringRecord) -> std::result::Result<LedgerEntry, String> {
    let (name, date, time) = match (record.get(0), record.get(1), record.get(2), record.len()) {
        (Some(name), Some(date), Some(time), 3) => (name.trim(), date.trim(), time.trim()),
        _ => return Err(format!("expected 3 fields, found {}", record.len())),
    };
    if name.is_empty() {
        return Err("empty file name".to_string());
    }
    let last_updated_date = NaiveDate::parse_from_str(date, LEDGER_DATE_FORMAT)
        .map_err(|e| format!("bad date '{}': {}", date, e))?;
    let last_updated_time = NaiveTime::parse_from_str(time, LEDGER_TIME_FORMAT)
        .map_err(|e| format!("bad time '{}': {}", time, e))?;

    Ok(LedgerEntry {
        artifact_name: name.to_string(),
        last_updated_date,
        last_updated_time,
    })
}
