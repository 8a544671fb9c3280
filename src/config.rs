use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "theory-localizer.toml";
pub const CONFIG_ENV_VAR: &str = "THEORY_LOCALIZER_CONFIG";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub table: TableSection,
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub prompts: PromptsSection,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PathsSection {
    /// Directory holding `tier_N.json` and `terminology.json`. Relative to the config file.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
    /// Directory the CSV tables are written to and translated in. Relative to the config file.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct TableSection {
    /// Language columns for generated tables; must contain "en".
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BackendSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub translate_temperature: Option<f32>,
    #[serde(default)]
    pub chat_temperature: Option<f32>,
    /// Unset means requests wait as long as the backend takes.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Program + args run on shutdown. An empty list disables shutdown.
    #[serde(default)]
    pub shutdown_command: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning_start: Option<String>,
    #[serde(default)]
    pub reasoning_end: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsSection {
    #[serde(default)]
    pub translate: Option<String>,
}

pub fn find_default_config(workdir: &Path, filename: &str) -> Option<PathBuf> {
    if let Some(p) = find_file_upwards(workdir, filename, 8) {
        return Some(p);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            if let Some(p) = find_file_upwards(dir, filename, 10) {
                return Some(p);
            }
        }
    }
    None
}

pub fn find_file_upwards(start_dir: &Path, filename: &str, max_levels: usize) -> Option<PathBuf> {
    let mut dir = start_dir;
    for _ in 0..=max_levels {
        let candidate = dir.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
    None
}

pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&text)
        .with_context(|| format!("parse config toml: {}", path.display()))?;
    Ok(cfg)
}
