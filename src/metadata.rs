//! Queries against a PANGAEA landing page.
//!
//! Every markup lookup the resolver and fetcher rely on lives here, so the
//! classification logic can run against fixture HTML.

use std::sync::LazyLock;

use scraper::{Html, Selector};

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(TITLE_SELECTOR, "title");
selector!(FORMAT_SELECTOR, "meta[name='DC.format']");
selector!(CITATION_SELECTOR, "meta[name='DC.citation']");
selector!(CHILD_LINK_SELECTOR, "#childDatasets a[rel~='follow']");

pub struct MetadataPage {
    document: Html,
}

impl MetadataPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    pub fn title(&self) -> Option<String> {
        self.document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Declared media format, e.g. `application/zip, 12 datasets`.
    pub fn declared_format(&self) -> Option<String> {
        self.meta_content(&FORMAT_SELECTOR)
    }

    pub fn citation(&self) -> Option<String> {
        self.meta_content(&CITATION_SELECTOR)
    }

    /// `href` values of the follow links in the child dataset listing.
    pub fn follow_links(&self) -> Vec<String> {
        self.document
            .select(&CHILD_LINK_SELECTOR)
            .filter_map(|el| el.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect()
    }

    /// Whether the page is a login gate rather than content.
    pub fn requires_login(&self) -> bool {
        self.title()
            .map(|title| title.to_ascii_lowercase().contains("log in"))
            .unwrap_or(false)
    }

    fn meta_content(&self, selector: &Selector) -> Option<String> {
        self.document
            .select(selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
    }
}
