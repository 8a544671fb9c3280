use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::records::{read_record_map, tier_file_name, TierField, TIER_COUNT};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackfillReport {
    pub path: PathBuf,
    pub records: usize,
    pub changed: usize,
}

/// Brings one record up to the full six-field shape. Returns whether anything changed.
///
/// A non-object record is the legacy form: its value becomes every field. Object records keep
/// what they have and get `fill_value` (or their own `base`, or "") for anything missing.
pub fn backfill_record(record: &mut Value, fill_value: Option<&str>) -> bool {
    if !record.is_object() {
        let legacy = record.take();
        let mut obj = Map::new();
        for field in TierField::ALL {
            obj.insert(field.as_str().to_string(), legacy.clone());
        }
        *record = Value::Object(obj);
        return true;
    }
    let Some(obj) = record.as_object_mut() else {
        return false;
    };

    let default = fill_value
        .map(str::to_string)
        .or_else(|| {
            obj.get(TierField::Base.as_str())
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let mut changed = false;
    for field in TierField::ALL {
        if !obj.contains_key(field.as_str()) {
            obj.insert(field.as_str().to_string(), Value::String(default.clone()));
            changed = true;
        }
    }
    changed
}

/// Rewrites every tier file in `config_dir` whose records are missing fields.
///
/// Missing and malformed files are reported and left alone. Files that need no change are not
/// rewritten.
pub fn backfill_tier_files(
    config_dir: &Path,
    fill_value: Option<&str>,
) -> anyhow::Result<Vec<BackfillReport>> {
    let mut reports = Vec::new();
    for tier in 1..=TIER_COUNT {
        let path = config_dir.join(tier_file_name(tier));
        let mut map = match read_record_map(&path) {
            Ok(Some(map)) => map,
            Ok(None) => {
                warn!("{} not found", path.display());
                continue;
            }
            Err(err) => {
                warn!("Leaving {} untouched: {err:#}", path.display());
                continue;
            }
        };

        let mut changed = 0;
        for record in map.values_mut() {
            if backfill_record(record, fill_value) {
                changed += 1;
            }
        }
        if changed > 0 {
            write_pretty(&path, &Value::Object(map.clone()))?;
            info!("Updated {} ({changed} of {} records)", path.display(), map.len());
        } else {
            info!("{} already complete", path.display());
        }
        reports.push(BackfillReport {
            path,
            records: map.len(),
            changed,
        });
    }
    Ok(reports)
}

fn write_pretty(path: &Path, value: &Value) -> anyhow::Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .with_context(|| format!("serialize {}", path.display()))?;
    buf.push(b'\n');
    std::fs::write(path, buf).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_string_record_fans_out() {
        let mut v = json!("Telepathy");
        assert!(backfill_record(&mut v, Some("ignored")));
        for field in TierField::ALL {
            assert_eq!(v[field.as_str()], "Telepathy");
        }
    }

    #[test]
    fn missing_fields_use_one_shared_default() {
        let mut v = json!({"base": "Echo", "lore_1": "old"});
        assert!(backfill_record(&mut v, None));
        assert_eq!(v["lore_1"], "old");
        assert_eq!(v["lore_2"], "Echo");
        assert_eq!(v["ability"], "Echo");

        let mut v = json!({"lore_1": "old"});
        backfill_record(&mut v, Some("TBD"));
        assert_eq!(v["base"], "TBD");
        assert_eq!(v["lore_3"], "TBD");

        let mut v = json!({});
        backfill_record(&mut v, None);
        assert_eq!(v["description"], "");
    }

    #[test]
    fn complete_record_is_unchanged() {
        let mut v = json!({"base": "b", "ability": "a", "description": "d",
                           "lore_1": "1", "lore_2": "2", "lore_3": "3"});
        let before = v.clone();
        assert!(!backfill_record(&mut v, None));
        assert_eq!(v, before);
    }

    #[test]
    fn tier_files_are_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tier_1.json"),
            r#"{"Zeta": "Zeta", "Alpha": {"base": "Alpha"}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("tier_2.json"), "{broken").unwrap();

        let reports = backfill_tier_files(dir.path(), None).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].changed, 2);
        assert_eq!(reports[0].records, 2);

        let text = std::fs::read_to_string(dir.path().join("tier_1.json")).unwrap();
        assert!(text.starts_with("{\n    \"Zeta\": {\n        \"base\": \"Zeta\""));
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["Alpha"]["lore_3"], "Alpha");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("tier_2.json")).unwrap(),
            "{broken"
        );

        let again = backfill_tier_files(dir.path(), None).unwrap();
        assert_eq!(again[0].changed, 0);
    }
}
