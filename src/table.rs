use std::path::Path;

use anyhow::{anyhow, Context};
use csv::{ReaderBuilder, WriterBuilder};

pub const KEY_COLUMN: &str = "key";
pub const SOURCE_LANG: &str = "en";

/// Language columns of a generated table, source language first.
pub const DEFAULT_LANGUAGES: [&str; 11] =
    ["en", "de", "es", "fr", "it", "ja", "ko", "pt", "ru", "tr", "zh"];

pub fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect()
}

/// One table row; cells line up with the table header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizationRow {
    cells: Vec<String>,
}

impl LocalizationRow {
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn cell(&self, column: usize) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set_cell(&mut self, column: usize, value: impl Into<String>) {
        if column >= self.cells.len() {
            self.cells.resize(column + 1, String::new());
        }
        self.cells[column] = value.into();
    }
}

/// A CSV localization table held in memory.
///
/// Tables read from disk keep their header exactly as found; generated tables use
/// `key` followed by the configured languages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalizationTable {
    headers: Vec<String>,
    rows: Vec<LocalizationRow>,
}

impl LocalizationTable {
    pub fn new(languages: &[String]) -> Self {
        let mut headers = Vec::with_capacity(languages.len() + 1);
        headers.push(KEY_COLUMN.to_string());
        headers.extend(languages.iter().cloned());
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[LocalizationRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [LocalizationRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Appends a row with `key` and `source_text` in the source-language column; every other
    /// cell starts empty.
    pub fn push_source_row(&mut self, key: &str, source_text: &str) -> anyhow::Result<()> {
        let key_col = self
            .column(KEY_COLUMN)
            .ok_or_else(|| anyhow!("table has no {KEY_COLUMN:?} column"))?;
        let src_col = self
            .column(SOURCE_LANG)
            .ok_or_else(|| anyhow!("table has no {SOURCE_LANG:?} column"))?;
        let mut row = LocalizationRow {
            cells: vec![String::new(); self.headers.len()],
        };
        row.set_cell(key_col, key);
        row.set_cell(src_col, source_text);
        self.rows.push(row);
        Ok(())
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("open csv: {}", path.display()))?;
        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("read csv header: {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("read csv row {}: {}", idx + 1, path.display()))?;
            if record.len() > headers.len() {
                return Err(anyhow!(
                    "{}: row {} has {} fields, header has {}",
                    path.display(),
                    idx + 1,
                    record.len(),
                    headers.len()
                ));
            }
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(headers.len(), String::new());
            rows.push(LocalizationRow { cells });
        }
        Ok(Self { headers, rows })
    }

    /// Rewrites the whole file: header first, then every row.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = WriterBuilder::new()
            .from_path(path)
            .with_context(|| format!("create csv: {}", path.display()))?;
        writer
            .write_record(&self.headers)
            .with_context(|| format!("write csv header: {}", path.display()))?;
        for row in &self.rows {
            writer
                .write_record(&row.cells)
                .with_context(|| format!("write csv row: {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("flush csv: {}", path.display()))?;
        Ok(())
    }
}
