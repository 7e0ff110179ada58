use std::fs;
use std::path::Path;

use serde::Serialize;
use zip::ZipArchive;

use crate::error::PangaeaError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveMember {
    pub name: String,
    pub size: u64,
}

/// Lists the members of a zip archive without extracting anything.
pub fn list_zip(zip_path: &Path) -> Result<Vec<ArchiveMember>, PangaeaError> {
    let archive_err = |message: String| PangaeaError::Archive {
        path: zip_path.display().to_string(),
        message,
    };
    let file = fs::File::open(zip_path).map_err(|err| archive_err(err.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|err| archive_err(err.to_string()))?;

    let mut members = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|err| archive_err(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        members.push(ArchiveMember {
            name: entry.name().to_string(),
            size: entry.size(),
        });
    }
    Ok(members)
}
