use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::RecordError;

pub const TIER_COUNT: u32 = 10;
pub const TERMINOLOGY_FILE: &str = "terminology.json";

pub fn tier_file_name(tier: u32) -> String {
    format!("tier_{tier}.json")
}

/// Fields of a theory record in a tier file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierField {
    Base,
    Ability,
    Description,
    Lore1,
    Lore2,
    Lore3,
}

impl TierField {
    pub const ALL: [TierField; 6] = [
        TierField::Base,
        TierField::Ability,
        TierField::Description,
        TierField::Lore1,
        TierField::Lore2,
        TierField::Lore3,
    ];

    pub const LORE: [TierField; 3] = [TierField::Lore1, TierField::Lore2, TierField::Lore3];

    pub fn as_str(self) -> &'static str {
        match self {
            TierField::Base => "base",
            TierField::Ability => "ability",
            TierField::Description => "description",
            TierField::Lore1 => "lore_1",
            TierField::Lore2 => "lore_2",
            TierField::Lore3 => "lore_3",
        }
    }
}

/// Fields of a terminology record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermField {
    Term,
    Explanation,
}

impl TermField {
    pub fn as_str(self) -> &'static str {
        match self {
            TermField::Term => "term",
            TermField::Explanation => "explanation",
        }
    }
}

/// One raw record: the key as written in the source file plus its JSON body.
#[derive(Clone, Debug)]
pub struct SourceRecord {
    pub key: String,
    pub body: Value,
}

/// A tier or terminology file, records kept in file order.
#[derive(Clone, Debug)]
pub struct RecordFile {
    pub path: PathBuf,
    pub records: Vec<SourceRecord>,
}

impl RecordFile {
    pub fn from_map(path: PathBuf, map: Map<String, Value>) -> Self {
        let records = map
            .into_iter()
            .map(|(key, body)| SourceRecord { key, body })
            .collect();
        Self { path, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a string field on one of this file's records.
    pub fn field<'a>(
        &self,
        record: &'a SourceRecord,
        field: &'static str,
    ) -> Result<&'a str, RecordError> {
        let obj = record.body.as_object().ok_or_else(|| RecordError::NotAnObject {
            file: self.path.clone(),
            key: record.key.clone(),
        })?;
        match obj.get(field) {
            None => Err(RecordError::MissingField {
                file: self.path.clone(),
                key: record.key.clone(),
                field,
            }),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(RecordError::InvalidField {
                file: self.path.clone(),
                key: record.key.clone(),
                field,
            }),
        }
    }
}

/// Reads a JSON object file.
///
/// `Ok(None)` when the file does not exist; an error when it cannot be read or is not a JSON
/// object.
pub fn read_record_map(path: &Path) -> anyhow::Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read record file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("parse record file: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        other => Err(anyhow!(
            "{}: expected a JSON object at top level, found {}",
            path.display(),
            json_kind(&other)
        )),
    }
}

fn load_optional(path: &Path, label: &str) -> Option<RecordFile> {
    match read_record_map(path) {
        Ok(Some(map)) => {
            let file = RecordFile::from_map(path.to_path_buf(), map);
            info!("Loaded {label} with {} records", file.len());
            Some(file)
        }
        Ok(None) => {
            warn!("{} not found", path.display());
            None
        }
        Err(err) => {
            warn!("Skipping {label}: {err:#}");
            None
        }
    }
}

/// Loads `tier_1.json` .. `tier_10.json` in ascending order, skipping missing or malformed files.
pub fn load_tiers(config_dir: &Path) -> Vec<RecordFile> {
    (1..=TIER_COUNT)
        .filter_map(|tier| {
            let path = config_dir.join(tier_file_name(tier));
            load_optional(&path, &format!("tier {tier}"))
        })
        .collect()
}

pub fn load_terminology(config_dir: &Path) -> Option<RecordFile> {
    load_optional(&config_dir.join(TERMINOLOGY_FILE), "terminology")
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tiers_load_in_order_and_skip_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tier_3.json"), r#"{"C": {"base": "c"}}"#).unwrap();
        std::fs::write(dir.path().join("tier_1.json"), r#"{"A": {"base": "a"}, "B": {"base": "b"}}"#).unwrap();
        std::fs::write(dir.path().join("tier_2.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("tier_4.json"), "[1, 2]").unwrap();

        let tiers = load_tiers(dir.path());
        assert_eq!(tiers.len(), 2);
        assert!(tiers[0].path.ends_with("tier_1.json"));
        assert!(tiers[1].path.ends_with("tier_3.json"));
        let keys: Vec<&str> = tiers[0].records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["A", "B"]);
    }

    #[test]
    fn records_keep_file_order() {
        let map = json!({"zeta": {}, "alpha": {}, "mid": {}});
        let Value::Object(map) = map else { unreachable!() };
        let file = RecordFile::from_map(PathBuf::from("t.json"), map);
        let keys: Vec<&str> = file.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn field_errors_are_descriptive() {
        let map = json!({"Echo": {"base": "Echo", "lore_1": 3}, "Bare": "text"});
        let Value::Object(map) = map else { unreachable!() };
        let file = RecordFile::from_map(PathBuf::from("tier_1.json"), map);
        let echo = &file.records[0];
        let bare = &file.records[1];

        assert_eq!(file.field(echo, "base").unwrap(), "Echo");

        let err = file.field(echo, "lore_2").unwrap_err();
        assert!(matches!(err, RecordError::MissingField { field: "lore_2", .. }));
        let msg = err.to_string();
        assert!(msg.contains("tier_1.json") && msg.contains("Echo") && msg.contains("lore_2"));

        assert!(matches!(
            file.field(echo, "lore_1"),
            Err(RecordError::InvalidField { field: "lore_1", .. })
        ));
        assert!(matches!(
            file.field(bare, "base"),
            Err(RecordError::NotAnObject { .. })
        ));
    }

    #[test]
    fn missing_terminology_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_terminology(dir.path()).is_none());
    }
}
