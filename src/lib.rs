//! Fetch PANGAEA datasets by DOI, cache them locally and parse them by
//! content type.

pub mod app;
pub mod archive;
pub mod assembler;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod metadata;
pub mod output;
pub mod resolver;
pub mod store;
pub mod table;
