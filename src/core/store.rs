use crate::domain::model::Table;
use crate::utils::error::{Result, UpdateError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes `rows` to a temporary file beside `path`, then renames it over
/// `path`. Readers see either the old file or the new one, never a torn write.
pub fn write_rows_atomic<I, R, F>(path: &Path, rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let dir = path.parent().ok_or_else(|| UpdateError::ConfigError {
        message: format!("'{}' has no parent directory", path.display()),
    })?;

    let mut tmp = temp_file_in(dir)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(tmp.as_file_mut());
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    // The rename replaces the target's mode with the temp file's.
    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| UpdateError::IoError(e.error))?;
    Ok(())
}

/// Temp file whose mode matches what `File::create` would give under the
/// process umask, rather than the owner-only default.
fn temp_file_in(dir: &Path) -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".nba-db-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    Ok(builder.tempfile_in(dir)?)
}

/// Artifact files of one location directory. Every write replaces the file
/// whole; nothing is merged.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, artifact_name: &str, table: &Table) -> Result<PathBuf> {
        let path = self.dir.join(artifact_name);
        write_rows_atomic(&path, &table.rows)?;
        tracing::debug!(
            "Wrote {} rows to {}",
            table.rows.len(),
            path.display()
        );
        Ok(path)
    }

    pub fn read(&self, artifact_name: &str) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(self.dir.join(artifact_name))?;
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(Table::new(rows))
    }

    /// File names in the directory, sorted, excluding subdirectories.
    pub fn file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
