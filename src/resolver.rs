use serde::Serialize;
use tracing::debug;

use crate::domain::{Doi, strip_resolver_host};
use crate::error::PangaeaError;
use crate::http::{RepositoryClient, RequestOptions};
use crate::metadata::MetadataPage;

/// Concrete dataset DOIs produced from one input DOI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSet {
    pub dois: Vec<Doi>,
    pub citation: String,
    pub kind: ResolutionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// The DOI points at a single downloadable archive.
    DirectFile,
    SingleDataset,
    Collection,
}

pub struct Resolver<'a, C: RepositoryClient> {
    client: &'a C,
    base_url: &'a str,
}

impl<'a, C: RepositoryClient> Resolver<'a, C> {
    pub fn new(client: &'a C, base_url: &'a str) -> Self {
        Self { client, base_url }
    }

    pub fn resolve(&self, doi: &Doi, options: &RequestOptions) -> Result<ResolvedSet, PangaeaError> {
        let url = doi.landing_url(self.base_url);
        debug!(%doi, %url, "fetching metadata page");
        let response = self.client.get(&url, options)?.error_for_status()?;
        let page = MetadataPage::parse(&response.text());
        let resolved = classify(doi, &page);
        debug!(%doi, kind = ?resolved.kind, count = resolved.dois.len(), "classified");
        Ok(resolved)
    }

    /// Parses `input` before resolving, failing on malformed identifiers.
    pub fn resolve_str(
        &self,
        input: &str,
        options: &RequestOptions,
    ) -> Result<ResolvedSet, PangaeaError> {
        let doi: Doi = input.parse()?;
        self.resolve(&doi, options)
    }
}

/// Classifies a landing page. An archive that is not a multi-dataset
/// collection is a direct file; otherwise follow links in the child listing
/// decide between single dataset and collection.
pub fn classify(doi: &Doi, page: &MetadataPage) -> ResolvedSet {
    let citation = page.citation().unwrap_or_default();
    let format = page
        .declared_format()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if format.contains("zip") && !format.contains("datasets") {
        return ResolvedSet {
            dois: vec![doi.clone()],
            citation,
            kind: ResolutionKind::DirectFile,
        };
    }

    let links = page.follow_links();
    if links.is_empty() {
        return ResolvedSet {
            dois: vec![doi.clone()],
            citation,
            kind: ResolutionKind::SingleDataset,
        };
    }

    let mut dois: Vec<Doi> = Vec::with_capacity(links.len());
    for link in &links {
        match child_doi(link) {
            Some(child) if !dois.contains(&child) => dois.push(child),
            Some(_) => {}
            None => debug!(%link, "ignoring unrecognised child link"),
        }
    }

    if dois.is_empty() {
        debug!(%doi, "no usable child links; treating as single dataset");
        return ResolvedSet {
            dois: vec![doi.clone()],
            citation,
            kind: ResolutionKind::SingleDataset,
        };
    }

    ResolvedSet {
        dois,
        citation,
        kind: ResolutionKind::Collection,
    }
}

/// Accepts resolver URLs, site-relative paths (`/10.1594/...`) and bare
/// DOIs; query strings and fragments are dropped.
fn child_doi(link: &str) -> Option<Doi> {
    let path = strip_resolver_host(link)
        .or_else(|| link.strip_prefix('/'))
        .unwrap_or(link);
    if !path.starts_with("10.") {
        return link.parse().ok();
    }
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].parse().ok()
}
