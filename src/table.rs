use std::fmt;

use csv::ReaderBuilder;
use serde::Serialize;

/// A tab-delimited dataset: a header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Parses PANGAEA textfile content. A leading `/* ... */` metadata block
    /// is skipped; the first remaining line is the header.
    pub fn parse_tsv(content: &str) -> Result<Self, csv::Error> {
        let body = skip_metadata_block(content);
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .quoting(false)
            .has_headers(true)
            .from_reader(body.as_bytes());

        let columns = reader
            .headers()?
            .iter()
            .map(|value| value.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|value| value.to_string()).collect());
        }
        Ok(Self { columns, rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn skip_metadata_block(content: &str) -> &str {
    let trimmed = content.trim_start_matches('\u{feff}');
    if !trimmed.trim_start().starts_with("/*") {
        return trimmed;
    }
    match trimmed.find("*/") {
        Some(end) => trimmed[end + 2..].trim_start_matches(['\r', '\n']),
        None => "",
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW_ROWS: usize = 5;
        writeln!(
            f,
            "table with {} rows x {} columns",
            self.rows.len(),
            self.columns.len()
        )?;
        if self.is_empty() {
            return write!(f, "{}", self.columns.join("\t"));
        }
        writeln!(f, "{}", self.columns.join("\t"))?;
        for row in self.rows.iter().take(PREVIEW_ROWS) {
            writeln!(f, "{}", row.join("\t"))?;
        }
        if self.rows.len() > PREVIEW_ROWS {
            write!(f, "... ({} more rows)", self.rows.len() - PREVIEW_ROWS)?;
        }
        Ok(())
    }
}
