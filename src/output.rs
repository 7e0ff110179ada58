use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{FetchResult, ListResult, ProgressEvent, ProgressSink};
use crate::fetcher::FetchOutcome;
use crate::store::ClearResult;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_fetch(result: &FetchResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for item in &result.outcomes {
            let note = match &item.outcome {
                FetchOutcome::Cached => "cached".to_string(),
                FetchOutcome::Downloaded { kind, .. } => format!("downloaded ({kind})"),
                FetchOutcome::LoginRequired => "login required, metadata only".to_string(),
                FetchOutcome::UnsupportedMedia { media_type } => {
                    format!("unsupported media type {media_type:?}")
                }
            };
            writeln!(stdout, "# {}: {note}", item.doi)?;
        }
        let absent = result
            .records
            .iter()
            .filter(|record| record.data.is_absent())
            .count();
        if absent > 0 {
            writeln!(stdout, "# {absent} record(s) without local data")?;
        }
        for record in &result.records {
            writeln!(stdout)?;
            writeln!(stdout, "{record}")?;
        }
        Ok(())
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        if result.files.is_empty() {
            writeln!(stdout, "cache at {} is empty", result.cache_dir)?;
            return Ok(());
        }
        for file in &result.files {
            writeln!(
                stdout,
                "{}\t{}\t{}",
                file.path,
                file.size,
                file.modified.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }

    pub fn print_clear(result: &ClearResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        if result.cancelled {
            writeln!(stdout, "cancelled; nothing removed")?;
            return Ok(());
        }
        for path in &result.removed {
            writeln!(stdout, "removed {path}")?;
        }
        writeln!(stdout, "{} file(s) removed", result.removed.len())
    }
}

/// Forwards progress to the log when verbose output is requested.
pub struct LogSink {
    pub verbose: bool,
}

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        if !self.verbose {
            return;
        }
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}
