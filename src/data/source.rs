use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Source file discovery
// ---------------------------------------------------------------------------

/// The spreadsheet currently backing the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// How old the source file is, in whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Today,
    Yesterday,
    DaysAgo(u64),
}

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

impl SourceFile {
    /// Stat `path` and capture its modification time.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| SourceError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            modified,
        })
    }

    /// Bare file name, for captions.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn freshness(&self, now: SystemTime) -> Freshness {
        // A timestamp in the future counts as fresh.
        let age = now.duration_since(self.modified).unwrap_or_default();
        match age.as_secs() / DAY.as_secs() {
            0 => Freshness::Today,
            1 => Freshness::Yesterday,
            n => Freshness::DaysAgo(n),
        }
    }
}

/// Whether `path` carries one of the accepted extensions (case-insensitive).
pub fn is_accepted(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// All accepted files directly inside `dir`.
pub fn list_sources(dir: &Path, extensions: &[String]) -> Result<Vec<SourceFile>, SourceError> {
    let entries = fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() || !is_accepted(&path, extensions) {
            continue;
        }
        found.push(SourceFile::from_path(&path)?);
    }
    Ok(found)
}

/// The most recently modified accepted file in `dir`.
/// Ties on modification time go to the lexicographically last path.
pub fn find_latest(dir: &Path, extensions: &[String]) -> Result<SourceFile, SourceError> {
    list_sources(dir, extensions)?
        .into_iter()
        .max_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.path.cmp(&b.path))
        })
        .ok_or_else(|| SourceError::NoSpreadsheet {
            dir: dir.to_path_buf(),
            extensions: extensions.join(", "),
        })
}

// ---------------------------------------------------------------------------
// Replacement
// ---------------------------------------------------------------------------

/// Delete every accepted file in `dir`, then write `bytes` as `file_name`.
///
/// Not atomic: a reader scanning the directory in between sees no file.
pub fn replace_source(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
    extensions: &[String],
) -> Result<PathBuf, SourceError> {
    let name = Path::new(file_name);
    let plain_name = name.file_name().is_some_and(|n| n == name.as_os_str());
    if !plain_name || !is_accepted(name, extensions) {
        return Err(SourceError::RejectedName(file_name.to_string()));
    }

    for old in list_sources(dir, extensions)? {
        log::info!("removing previous source {}", old.path.display());
        fs::remove_file(&old.path).map_err(|e| SourceError::io(&old.path, e))?;
    }

    let dest = dir.join(name);
    fs::write(&dest, bytes).map_err(|e| SourceError::io(&dest, e))?;
    log::info!("wrote new source {} ({} bytes)", dest.display(), bytes.len());
    Ok(dest)
}
