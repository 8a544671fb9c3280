use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::records::{load_terminology, load_tiers, RecordFile, TermField, TierField};
use crate::table::LocalizationTable;
use crate::textutil::normalize_key;

/// The six generated tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    BaseTheory,
    TheoryDescription,
    TheoryAbility,
    TheoryLore,
    TerminologyTerm,
    TerminologyDescription,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecordSource {
    Tiers,
    Terminology,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::BaseTheory,
        TableKind::TheoryDescription,
        TableKind::TheoryAbility,
        TableKind::TheoryLore,
        TableKind::TerminologyTerm,
        TableKind::TerminologyDescription,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::BaseTheory => "base_theory.csv",
            TableKind::TheoryDescription => "theory_description.csv",
            TableKind::TheoryAbility => "theory_ability.csv",
            TableKind::TheoryLore => "theory_lore.csv",
            TableKind::TerminologyTerm => "terminology_term.csv",
            TableKind::TerminologyDescription => "terminology_description.csv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TableKind::BaseTheory => "theory",
            TableKind::TheoryDescription => "theory description",
            TableKind::TheoryAbility => "theory ability",
            TableKind::TheoryLore => "theory lore",
            TableKind::TerminologyTerm => "term",
            TableKind::TerminologyDescription => "term description",
        }
    }

    fn source(self) -> RecordSource {
        match self {
            TableKind::TerminologyTerm | TableKind::TerminologyDescription => {
                RecordSource::Terminology
            }
            _ => RecordSource::Tiers,
        }
    }

    /// Row keys and the record field each one reads, for a record whose key normalizes to `base`.
    fn entries_for(self, base: &str) -> Vec<(String, &'static str)> {
        match self {
            TableKind::BaseTheory => vec![(base.to_string(), TierField::Base.as_str())],
            TableKind::TheoryDescription => vec![(
                format!("{base}_DESCRIPTION"),
                TierField::Description.as_str(),
            )],
            TableKind::TheoryAbility => {
                vec![(format!("{base}_ABILITY"), TierField::Ability.as_str())]
            }
            TableKind::TheoryLore => TierField::LORE
                .iter()
                .enumerate()
                .map(|(i, f)| (format!("{base}_LORE_{}", i + 1), f.as_str()))
                .collect(),
            TableKind::TerminologyTerm => vec![(base.to_string(), TermField::Term.as_str())],
            TableKind::TerminologyDescription => vec![(
                format!("{base}_DESCRIPTION"),
                TermField::Explanation.as_str(),
            )],
        }
    }
}

/// Builds one table from already-loaded record files.
///
/// Files are visited in the order given; the first record to produce a key wins and later
/// duplicates are never read. Rows come out sorted by key.
pub fn build_table(
    kind: TableKind,
    tiers: &[RecordFile],
    terminology: Option<&RecordFile>,
    languages: &[String],
) -> anyhow::Result<LocalizationTable> {
    let files: Vec<&RecordFile> = match kind.source() {
        RecordSource::Tiers => tiers.iter().collect(),
        RecordSource::Terminology => terminology.into_iter().collect(),
    };

    let mut entries: BTreeMap<String, String> = BTreeMap::new();
    for file in files {
        debug!(
            "Processing {} with {} records for {}",
            file.path.display(),
            file.len(),
            kind.label()
        );
        for record in &file.records {
            let base = normalize_key(&record.key);
            for (key, field) in kind.entries_for(&base) {
                if let Entry::Vacant(slot) = entries.entry(key) {
                    slot.insert(file.field(record, field)?.to_string());
                }
            }
        }
    }

    let mut table = LocalizationTable::new(languages);
    for (key, text) in &entries {
        table.push_source_row(key, text)?;
    }
    Ok(table)
}

#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub languages: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedTable {
    pub kind: TableKind,
    pub path: PathBuf,
    pub rows: usize,
}

/// Reads every tier and the terminology file once, then writes all six tables.
///
/// Stops at the first table whose records violate the schema; tables written before it stay.
pub fn generate_tables(opts: &GenerateOptions) -> anyhow::Result<Vec<GeneratedTable>> {
    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("create output dir: {}", opts.output_dir.display()))?;

    let tiers = load_tiers(&opts.config_dir);
    let terminology = load_terminology(&opts.config_dir);

    let mut written = Vec::with_capacity(TableKind::ALL.len());
    for kind in TableKind::ALL {
        let table = build_table(kind, &tiers, terminology.as_ref(), &opts.languages)
            .with_context(|| format!("build {}", kind.file_name()))?;
        let path = opts.output_dir.join(kind.file_name());
        write_table(&table, &path, kind)?;
        written.push(GeneratedTable {
            kind,
            path,
            rows: table.len(),
        });
    }
    Ok(written)
}

fn write_table(table: &LocalizationTable, path: &Path, kind: TableKind) -> anyhow::Result<()> {
    for row in table.rows() {
        debug!("Writing {}: {}", kind.label(), row.cell(0));
    }
    table.write(path)?;
    info!(
        "Generated {} ({} {} rows)",
        path.display(),
        table.len(),
        kind.label()
    );
    Ok(())
}
