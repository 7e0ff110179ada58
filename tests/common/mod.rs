#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use pangaea_datasets::error::PangaeaError;
use pangaea_datasets::http::{HttpResponse, RepositoryClient, RequestOptions};
use pangaea_datasets::store::CacheStore;

pub const BASE_URL: &str = "https://doi.pangaea.de/";

/// Serves canned responses by URL and records every request.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, HttpResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn with(mut self, url: &str, status: u16, content_type: &str, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                url: url.to_string(),
                status,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            },
        );
        self
    }

    pub fn landing(self, doi: &str, html: &str) -> Self {
        self.with(
            &format!("{BASE_URL}{doi}"),
            200,
            "text/html;charset=UTF-8",
            html.as_bytes(),
        )
    }

    pub fn file(self, doi: &str, content_type: &str, body: &[u8]) -> Self {
        self.with(
            &format!("{BASE_URL}{doi}?format=textfile"),
            200,
            content_type,
            body,
        )
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RepositoryClient for MockClient {
    fn get(&self, url: &str, _options: &RequestOptions) -> Result<HttpResponse, PangaeaError> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self.responses.get(url).cloned().unwrap_or(HttpResponse {
            url: url.to_string(),
            status: 404,
            content_type: Some("text/html".to_string()),
            body: b"<html><title>Not found</title></html>".to_vec(),
        }))
    }
}

pub fn temp_store() -> (TempDir, CacheStore) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().join("cache")).unwrap();
    (dir, CacheStore::new(root))
}

pub fn landing_page(format: &str, citation: &str, children: &[&str]) -> String {
    let anchors = children
        .iter()
        .map(|doi| format!(r#"<a rel="follow" href="https://doi.pangaea.de/{doi}">{doi}</a>"#))
        .collect::<String>();
    format!(
        r#"<!DOCTYPE html><html><head><title>PANGAEA</title>
        <meta name="DC.format" content="{format}">
        <meta name="DC.citation" content="{citation}">
        </head><body><div id="childDatasets">{anchors}</div></body></html>"#
    )
}

pub const LOGIN_PAGE: &str =
    "<html><head><title>Log in - PANGAEA</title></head><body>login</body></html>";

pub const TSV: &str =
    "/* DATA DESCRIPTION:\nCitation:\tExample\n*/\nDepth water [m]\tTemp [°C]\n5\t3.2\n10\t2.9\n";

pub fn zip_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        for (name, content) in members {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

pub const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 0x0d, b'I', b'H', b'D', b'R',
];
