use std::time::{Duration, Instant};

use serde::Serialize;

use crate::assembler::{DatasetRecord, assemble};
use crate::domain::Doi;
use crate::error::PangaeaError;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::http::{RepositoryClient, RequestOptions};
use crate::resolver::{ResolutionKind, Resolver};
use crate::store::{CacheFile, CacheStore, ClearResult, Confirm};

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub overwrite: bool,
    pub request: RequestOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub doi: Doi,
    pub kind: ResolutionKind,
    pub outcomes: Vec<FetchItemResult>,
    pub records: Vec<DatasetRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub doi: Doi,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub cache_dir: String,
    pub files: Vec<CacheFile>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: RepositoryClient> {
    store: CacheStore,
    client: C,
    base_url: String,
}

impl<C: RepositoryClient> App<C> {
    pub fn new(store: CacheStore, client: C, base_url: impl Into<String>) -> Self {
        Self {
            store,
            client,
            base_url: base_url.into(),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Resolves `doi`, downloads every dataset it stands for and returns one
    /// record per dataset. Any fatal error aborts the whole batch.
    pub fn fetch(
        &self,
        doi: &Doi,
        options: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, PangaeaError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {doi}"),
            elapsed: None,
        });
        let resolver = Resolver::new(&self.client, &self.base_url);
        let resolved = resolver.resolve(doi, &options.request)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Resolve; {:?} with {} dataset(s)",
                resolved.kind,
                resolved.dois.len()
            ),
            elapsed: Some(started.elapsed()),
        });

        let fetcher = Fetcher::new(&self.client, &self.store, &self.base_url);
        let mut outcomes = Vec::with_capacity(resolved.dois.len());
        for (index, child) in resolved.dois.iter().enumerate() {
            sink.event(ProgressEvent {
                message: format!(
                    "phase=Download; {child} ({}/{})",
                    index + 1,
                    resolved.dois.len()
                ),
                elapsed: Some(started.elapsed()),
            });
            let outcome = fetcher.ensure_downloaded(child, options.overwrite, &options.request)?;
            outcomes.push(FetchItemResult {
                doi: child.clone(),
                outcome,
            });
        }

        sink.event(ProgressEvent {
            message: "phase=Assemble; reading cached files".to_string(),
            elapsed: Some(started.elapsed()),
        });
        let records = assemble(&self.store, &resolved, doi)?;

        Ok(FetchResult {
            doi: doi.clone(),
            kind: resolved.kind,
            outcomes,
            records,
        })
    }

    pub fn list(&self) -> Result<ListResult, PangaeaError> {
        Ok(ListResult {
            cache_dir: self.store.root().to_string(),
            files: self.store.list()?,
        })
    }

    pub fn clear(
        &self,
        dois: Option<&[Doi]>,
        confirm: &dyn Confirm,
        sink: &dyn ProgressSink,
    ) -> Result<ClearResult, PangaeaError> {
        sink.event(ProgressEvent {
            message: match dois {
                Some(dois) => format!("phase=Store; clearing {} DOI(s)", dois.len()),
                None => "phase=Store; clearing cache".to_string(),
            },
            elapsed: None,
        });
        self.store.clear(dois, confirm)
    }
}
