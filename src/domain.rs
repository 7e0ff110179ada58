use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PangaeaError;

pub const DOI_PREFIX: &str = "10.1594/PANGAEA.";
pub const DOI_ORG: &str = "https://doi.org/";

/// Hosts whose URLs carry a bare DOI as their path.
pub const RESOLVER_HOSTS: [&str; 4] = [
    "https://doi.pangaea.de/",
    "http://doi.pangaea.de/",
    "https://doi.org/",
    "http://doi.org/",
];

static BARE_DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.1594/PANGAEA\.[^\s/?#]+$").unwrap());

/// A dataset identifier: either a bare PANGAEA DOI or a full repository URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Doi(String);

impl Doi {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_url(&self) -> bool {
        self.0.starts_with("https://") || self.0.starts_with("http://")
    }

    /// Filename stem used for cache entries. Never contains `.`, so the
    /// stem of a cache file is everything before its first dot.
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn landing_url(&self, base_url: &str) -> String {
        if self.is_url() {
            return self.0.clone();
        }
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn file_url(&self, base_url: &str) -> String {
        let landing = self.landing_url(base_url);
        let separator = if landing.contains('?') { '&' } else { '?' };
        format!("{landing}{separator}format=textfile")
    }

    pub fn doi_org_url(&self) -> String {
        format!("{DOI_ORG}{}", self.0)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Doi {
    type Err = PangaeaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(bare) = strip_resolver_host(trimmed)
            && BARE_DOI.is_match(bare)
        {
            return Ok(Self(bare.to_string()));
        }
        if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
            return Ok(Self(trimmed.to_string()));
        }
        if BARE_DOI.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Err(PangaeaError::MalformedIdentifier(value.to_string()))
    }
}

impl TryFrom<String> for Doi {
    type Error = PangaeaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Doi> for String {
    fn from(value: Doi) -> Self {
        value.0
    }
}

/// Strips a known resolver host, returning the remaining path.
pub fn strip_resolver_host(value: &str) -> Option<&str> {
    RESOLVER_HOSTS
        .iter()
        .find_map(|host| value.strip_prefix(host))
}

/// What a downloaded response contains, keyed on its declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    TabularText,
    Image,
    Archive,
    HtmlGate,
    Unknown,
}

impl ContentKind {
    pub fn from_media_type(media_type: &str) -> Self {
        let mime = media_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "text/tab-separated-values" => ContentKind::TabularText,
            "image/png" => ContentKind::Image,
            "application/zip" | "application/x-zip-compressed" => ContentKind::Archive,
            "text/html" | "application/xhtml+xml" => ContentKind::HtmlGate,
            _ => ContentKind::Unknown,
        }
    }

    /// Cache file extension, for the kinds that are persisted.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            ContentKind::TabularText => Some("txt"),
            ContentKind::Image => Some("png"),
            ContentKind::Archive => Some("zip"),
            ContentKind::HtmlGate | ContentKind::Unknown => None,
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => ContentKind::TabularText,
            "png" => ContentKind::Image,
            "zip" => ContentKind::Archive,
            _ => ContentKind::Unknown,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::TabularText => write!(f, "tabular-text"),
            ContentKind::Image => write!(f, "image"),
            ContentKind::Archive => write!(f, "archive"),
            ContentKind::HtmlGate => write!(f, "html-gate"),
            ContentKind::Unknown => write!(f, "unknown"),
        }
    }
}
