use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{ContentKind, Doi};
use crate::error::PangaeaError;
use crate::http::{RepositoryClient, RequestOptions};
use crate::metadata::MetadataPage;
use crate::store::CacheStore;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// What [`Fetcher::ensure_downloaded`] did for one DOI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    Cached,
    Downloaded { path: Utf8PathBuf, kind: ContentKind },
    /// The repository answered with a login page; only metadata is available.
    LoginRequired,
    UnsupportedMedia { media_type: String },
}

pub struct Fetcher<'a, C: RepositoryClient> {
    client: &'a C,
    store: &'a CacheStore,
    base_url: &'a str,
}

impl<'a, C: RepositoryClient> Fetcher<'a, C> {
    pub fn new(client: &'a C, store: &'a CacheStore, base_url: &'a str) -> Self {
        Self {
            client,
            store,
            base_url,
        }
    }

    /// Downloads `doi` into the cache unless it is already there.
    /// With `overwrite`, the dataset is fetched again and replaces the
    /// cached entry only once the new download succeeded.
    pub fn ensure_downloaded(
        &self,
        doi: &Doi,
        overwrite: bool,
        options: &RequestOptions,
    ) -> Result<FetchOutcome, PangaeaError> {
        let existing = self.store.entries_for(doi)?;
        if !existing.is_empty() && !overwrite {
            debug!(%doi, "already cached");
            return Ok(FetchOutcome::Cached);
        }

        let url = doi.file_url(self.base_url);
        info!(%doi, %url, "downloading");
        let response = self.client.get(&url, options)?.error_for_status()?;
        let media_type = response.content_type.clone().unwrap_or_default();
        let kind = ContentKind::from_media_type(&media_type);

        let content = match kind {
            ContentKind::HtmlGate => {
                let page = MetadataPage::parse(&response.text());
                if page.requires_login() {
                    warn!(%doi, "dataset requires login; returning metadata only");
                    return Ok(FetchOutcome::LoginRequired);
                }
                debug!(%doi, "html response without login gate");
                return Ok(FetchOutcome::UnsupportedMedia { media_type });
            }
            ContentKind::Unknown => {
                debug!(%doi, %media_type, "unsupported media type");
                return Ok(FetchOutcome::UnsupportedMedia { media_type });
            }
            ContentKind::TabularText => normalize_lines(&response.text()).into_bytes(),
            ContentKind::Image => {
                if !response.body.starts_with(&PNG_SIGNATURE) {
                    return Err(PangaeaError::InvalidImage(doi.to_string()));
                }
                response.body
            }
            ContentKind::Archive => response.body,
        };

        // The old entry stays until its replacement is on disk.
        let path = self.store.write(doi, kind, &content)?;
        for stale in existing.iter().filter(|stale| **stale != path) {
            debug!(%doi, path = %stale, "removing superseded entry");
            std::fs::remove_file(stale.as_std_path())
                .map_err(|err| PangaeaError::Filesystem(err.to_string()))?;
        }
        info!(%doi, %path, %kind, "saved");
        Ok(FetchOutcome::Downloaded { path, kind })
    }
}

fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(line);
        out.push('\n');
    }
    out
}
