use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PangaeaError {
    #[error("malformed identifier: {0} (expected a URL or a DOI starting with 10.1594/PANGAEA.)")]
    #[diagnostic(code(pangaea::malformed_identifier))]
    MalformedIdentifier(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    #[diagnostic(code(pangaea::http_status))]
    HttpStatus { status: u16, url: String },

    #[error("invalid request header: {0}")]
    InvalidHeader(String),

    #[error("response for {0} is not a valid PNG image")]
    InvalidImage(String),

    #[error("failed to parse table {path}: {message}")]
    Table { path: String, message: String },

    #[error("failed to read archive {path}: {message}")]
    Archive { path: String, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
