use std::fs;
use std::io::{self, BufRead, Write};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use serde::Serialize;
use tempfile::Builder;
use tracing::debug;

use crate::domain::{ContentKind, Doi};
use crate::error::PangaeaError;

/// Flat directory of downloaded datasets, one `<sanitized doi>.<ext>` file each.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: Utf8PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheFile {
    pub path: String,
    pub size: u64,
    pub modified: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearResult {
    pub removed: Vec<String>,
    pub cancelled: bool,
}

/// Asks the user before a destructive operation.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool, PangaeaError>;
}

/// Accepts every prompt (`--yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, PangaeaError> {
        Ok(true)
    }
}

/// Reads a `y/N` answer from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, PangaeaError> {
        let mut stderr = io::stderr();
        write!(stderr, "{prompt} [y/N] ")
            .and_then(|_| stderr.flush())
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes"))
    }
}

impl CacheStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), PangaeaError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))
    }

    pub fn path_for(&self, doi: &Doi, ext: &str) -> Utf8PathBuf {
        self.root.join(format!("{}.{ext}", doi.sanitized()))
    }

    pub fn contains(&self, doi: &Doi) -> Result<bool, PangaeaError> {
        Ok(!self.entries_for(doi)?.is_empty())
    }

    /// Cache files whose stem equals the DOI's sanitized form.
    pub fn entries_for(&self, doi: &Doi) -> Result<Vec<Utf8PathBuf>, PangaeaError> {
        let stem = doi.sanitized();
        Ok(self
            .files()?
            .into_iter()
            .filter(|path| file_stem(path) == Some(stem.as_str()))
            .collect())
    }

    pub fn list(&self) -> Result<Vec<CacheFile>, PangaeaError> {
        self.files()?
            .into_iter()
            .map(|path| {
                let meta = fs::metadata(path.as_std_path())
                    .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
                let modified = meta
                    .modified()
                    .ok()
                    .map(|time| DateTime::<Local>::from(time).to_rfc3339());
                Ok(CacheFile {
                    path: path.to_string(),
                    size: meta.len(),
                    modified,
                })
            })
            .collect()
    }

    /// Removes every file when `dois` is `None` (after confirmation), or only
    /// the files belonging to the given DOIs.
    pub fn clear(
        &self,
        dois: Option<&[Doi]>,
        confirm: &dyn Confirm,
    ) -> Result<ClearResult, PangaeaError> {
        let targets = match dois {
            Some(dois) => {
                let mut targets = Vec::new();
                for doi in dois {
                    targets.extend(self.entries_for(doi)?);
                }
                targets.sort();
                targets.dedup();
                targets
            }
            None => {
                let files = self.files()?;
                if files.is_empty() {
                    return Ok(ClearResult::default());
                }
                let prompt = format!(
                    "Remove all {} cached file(s) from {}?",
                    files.len(),
                    self.root
                );
                if !confirm.confirm(&prompt)? {
                    return Ok(ClearResult {
                        removed: Vec::new(),
                        cancelled: true,
                    });
                }
                files
            }
        };

        let mut removed = Vec::with_capacity(targets.len());
        for path in targets {
            debug!(%path, "removing cache entry");
            fs::remove_file(path.as_std_path())
                .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
            removed.push(path.to_string());
        }
        Ok(ClearResult {
            removed,
            cancelled: false,
        })
    }

    /// Writes `content` as the cache entry for `doi`, replacing any previous
    /// file of the same kind.
    pub fn write(
        &self,
        doi: &Doi,
        kind: ContentKind,
        content: &[u8],
    ) -> Result<Utf8PathBuf, PangaeaError> {
        let ext = kind.extension().ok_or_else(|| {
            PangaeaError::Filesystem(format!("content kind {kind} is not cacheable"))
        })?;
        self.ensure_root()?;
        let dest = self.path_for(doi, ext);
        let mut temp = Builder::new()
            .prefix(".pangaea-download")
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        temp.persist(dest.as_std_path())
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        Ok(dest)
    }

    fn files(&self) -> Result<Vec<Utf8PathBuf>, PangaeaError> {
        if !self.root.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(self.root.as_std_path())
            .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
                continue;
            };
            // in-flight temp files
            if path.file_name().is_some_and(|name| name.starts_with('.')) {
                continue;
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }
}

fn file_stem(path: &Utf8Path) -> Option<&str> {
    path.file_name()
        .map(|name| name.split_once('.').map(|(stem, _)| stem).unwrap_or(name))
}
