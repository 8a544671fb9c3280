use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::models::ChatBackend;
use crate::progress::FillProgress;
use crate::table::{LocalizationTable, KEY_COLUMN, SOURCE_LANG};
use crate::textutil::is_blank;

use super::translator::Translator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FillOptions {
    /// Overwrite every target cell instead of only the empty ones.
    pub force_retranslate: bool,
    /// When false the backend is shut down once the file is done (or failed).
    pub keep_backend_alive: bool,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            force_retranslate: false,
            keep_backend_alive: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FillSummary {
    pub rows: usize,
    pub rows_skipped: usize,
    pub translated: usize,
    pub failed: usize,
    pub already_present: usize,
}

/// Shuts the backend down when dropped, including during unwinding.
struct ShutdownGuard<'a, B: ChatBackend> {
    translator: &'a Translator<B>,
}

impl<B: ChatBackend> Drop for ShutdownGuard<'_, B> {
    fn drop(&mut self) {
        self.translator.shutdown();
    }
}

/// Fills empty target cells of an in-memory table.
///
/// Returns `None` when the table has no source-language column.
pub fn fill_table<B: ChatBackend>(
    table: &mut LocalizationTable,
    translator: &Translator<B>,
    force_retranslate: bool,
    label: &str,
) -> Option<FillSummary> {
    let Some(src_col) = table.column(SOURCE_LANG) else {
        warn!("{label}: no {SOURCE_LANG:?} column, nothing to translate");
        return None;
    };
    let targets: Vec<(usize, String)> = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| h.as_str() != KEY_COLUMN && h.as_str() != SOURCE_LANG)
        .map(|(i, h)| (i, h.clone()))
        .collect();

    let mut summary = FillSummary {
        rows: table.len(),
        ..FillSummary::default()
    };
    let progress = FillProgress::new(label, table.len());

    for (idx, row) in table.rows_mut().iter_mut().enumerate() {
        let english = row.cell(src_col).to_string();
        if is_blank(&english) {
            progress.skipped(idx + 1);
            summary.rows_skipped += 1;
            continue;
        }
        progress.entry(idx + 1, &english);

        for (col, lang) in &targets {
            if !force_retranslate && !is_blank(row.cell(*col)) {
                debug!("  {lang}: translation already exists");
                summary.already_present += 1;
                continue;
            }
            match translator.translate(&english, lang) {
                Some(translation) => {
                    debug!("  {lang}: {translation}");
                    row.set_cell(*col, translation);
                    summary.translated += 1;
                }
                None => {
                    warn!("  {lang}: translation failed for {:?}", english);
                    summary.failed += 1;
                }
            }
        }
    }

    info!(
        "{label}: {} translated, {} failed, {} kept, {} rows skipped in {}",
        summary.translated,
        summary.failed,
        summary.already_present,
        summary.rows_skipped,
        progress.elapsed()
    );
    Some(summary)
}

/// Fills one CSV file in place.
///
/// A missing file is a no-op (`Ok(None)`). With `keep_backend_alive == false` the backend is
/// shut down afterwards whatever the outcome.
pub fn fill_table_file<B: ChatBackend>(
    path: &Path,
    translator: &Translator<B>,
    opts: FillOptions,
) -> anyhow::Result<Option<FillSummary>> {
    let _guard = (!opts.keep_backend_alive).then(|| ShutdownGuard { translator });

    if !path.exists() {
        warn!("File {} does not exist", path.display());
        return Ok(None);
    }

    let mut table = LocalizationTable::read(path)?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let Some(summary) = fill_table(&mut table, translator, opts.force_retranslate, &label) else {
        return Ok(None);
    };
    table
        .write(path)
        .with_context(|| format!("save translations: {}", path.display()))?;
    info!("Translations saved to {}", path.display());
    Ok(Some(summary))
}

/// `*.csv` files directly inside `dir`, sorted by name.
pub fn discover_tables(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read dir: {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("read dir entry: {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|e| e == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Fills every CSV table in `dir`, keeping the backend up for the whole batch.
///
/// A file that fails is logged and the batch moves on. The backend is shut down exactly once
/// after the batch, even if this function returns early or panics.
pub fn fill_directory<B: ChatBackend>(
    dir: &Path,
    translator: &Translator<B>,
    force_retranslate: bool,
) -> anyhow::Result<Vec<(PathBuf, FillSummary)>> {
    if !dir.is_dir() {
        warn!("Output directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }
    let files = discover_tables(dir)?;
    if files.is_empty() {
        warn!("No CSV files found in {}", dir.display());
        return Ok(Vec::new());
    }
    info!("Found {} CSV files to process", files.len());

    let _guard = ShutdownGuard { translator };
    let opts = FillOptions {
        force_retranslate,
        keep_backend_alive: true,
    };
    let mut done = Vec::with_capacity(files.len());
    for path in files {
        info!("Processing {}", path.display());
        match fill_table_file(&path, translator, opts) {
            Ok(Some(summary)) => done.push((path, summary)),
            Ok(None) => {}
            Err(err) => error!("Error processing {}: {err:#}", path.display()),
        }
    }
    Ok(done)
}
