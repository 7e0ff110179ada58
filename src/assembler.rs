use std::fmt;
use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::debug;

use crate::archive::{ArchiveMember, list_zip};
use crate::domain::{ContentKind, Doi};
use crate::error::PangaeaError;
use crate::resolver::ResolvedSet;
use crate::store::CacheStore;
use crate::table::Table;

/// One resolved dataset with whatever could be loaded from the cache.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRecord {
    pub parent_doi: Doi,
    pub doi: Doi,
    pub citation: String,
    pub url: String,
    pub local_path: Option<Utf8PathBuf>,
    pub data: DatasetData,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DatasetData {
    Table(Table),
    Archive(Vec<ArchiveMember>),
    /// Image bytes stay on disk; decode `local_path` separately.
    Image,
    Absent,
}

impl DatasetData {
    pub fn is_absent(&self) -> bool {
        matches!(self, DatasetData::Absent)
    }
}

pub fn assemble(
    store: &CacheStore,
    resolved: &ResolvedSet,
    parent_doi: &Doi,
) -> Result<Vec<DatasetRecord>, PangaeaError> {
    resolved
        .dois
        .iter()
        .map(|doi| assemble_one(store, doi, parent_doi, &resolved.citation))
        .collect()
}

fn assemble_one(
    store: &CacheStore,
    doi: &Doi,
    parent_doi: &Doi,
    citation: &str,
) -> Result<DatasetRecord, PangaeaError> {
    let entry = store.entries_for(doi)?.into_iter().next();
    let (local_path, data) = match entry {
        Some(path) => {
            let data = load(&path)?;
            (Some(path), data)
        }
        None => {
            debug!(%doi, "no cached file; metadata only");
            (None, DatasetData::Absent)
        }
    };

    Ok(DatasetRecord {
        parent_doi: parent_doi.clone(),
        doi: doi.clone(),
        citation: citation.to_string(),
        url: doi.doi_org_url(),
        local_path,
        data,
    })
}

fn load(path: &Utf8PathBuf) -> Result<DatasetData, PangaeaError> {
    let kind = path
        .extension()
        .map(ContentKind::from_extension)
        .unwrap_or(ContentKind::Unknown);
    match kind {
        ContentKind::Archive => Ok(DatasetData::Archive(list_zip(path.as_std_path())?)),
        ContentKind::TabularText => {
            let content = fs::read_to_string(path.as_std_path())
                .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
            let table = Table::parse_tsv(&content).map_err(|err| PangaeaError::Table {
                path: path.to_string(),
                message: err.to_string(),
            })?;
            Ok(DatasetData::Table(table))
        }
        ContentKind::Image => Ok(DatasetData::Image),
        ContentKind::HtmlGate | ContentKind::Unknown => Ok(DatasetData::Absent),
    }
}

impl fmt::Display for DatasetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DOI:        {}", self.doi)?;
        writeln!(f, "Parent DOI: {}", self.parent_doi)?;
        writeln!(f, "URL:        {}", self.url)?;
        writeln!(f, "Citation:   {}", self.citation)?;
        match &self.local_path {
            Some(path) => writeln!(f, "Local path: {path}")?,
            None => writeln!(f, "Local path: -")?,
        }
        write!(f, "Data:       {}", self.data)
    }
}

impl fmt::Display for DatasetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetData::Table(table) => write!(f, "{table}"),
            DatasetData::Archive(members) => {
                write!(f, "zip archive with {} member(s)", members.len())?;
                for member in members {
                    write!(f, "\n  {} ({} bytes)", member.name, member.size)?;
                }
                Ok(())
            }
            DatasetData::Image => write!(f, "PNG image; decode the local file to view it"),
            DatasetData::Absent => write!(f, "none"),
        }
    }
}
