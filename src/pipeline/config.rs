use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::config::{
    find_default_config, load_config, AppConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME,
};
use crate::generate::GenerateOptions;
use crate::models::ollama::{default_shutdown_command, DEFAULT_HOST, DEFAULT_MODEL};
use crate::models::{OllamaBackend, OllamaConfig};
use crate::table::{default_languages, KEY_COLUMN, SOURCE_LANG};
use crate::textutil::{ReasoningFilter, DEFAULT_REASONING_END, DEFAULT_REASONING_START};

use super::prompts::{default_prompt_files, load_translate_prompt, DEFAULT_PROMPTS_DIR};
use super::translator::{Translator, DEFAULT_TRANSLATE_TEMPERATURE};

pub const DEFAULT_CHAT_TEMPERATURE: f32 = 0.5;

/// Command-line values that take precedence over the config file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub model: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Clone, Debug)]
pub struct LocalizerConfig {
    pub config_path: Option<PathBuf>,
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub languages: Vec<String>,
    pub ollama: OllamaConfig,
    pub translate_temperature: f32,
    pub chat_temperature: f32,
    pub reasoning_start: String,
    pub reasoning_end: String,
    pub translate_prompt: String,
}

impl LocalizerConfig {
    pub fn resolve(workdir: &Path, overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let explicit = overrides
            .config
            .clone()
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));
        let cfg_file = match explicit {
            Some(p) if !p.exists() => {
                return Err(anyhow!("config file not found: {}", p.display()));
            }
            Some(p) => Some(p),
            None => find_default_config(workdir, CONFIG_FILE_NAME),
        };

        let file_cfg = match cfg_file.as_ref() {
            Some(p) => load_config(p)?,
            None => AppConfig::default(),
        };
        let base_dir = cfg_file
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| workdir.to_path_buf());

        let under_base = |p: PathBuf| if p.is_relative() { base_dir.join(p) } else { p };
        let config_dir = overrides
            .config_dir
            .or_else(|| file_cfg.paths.config_dir.clone().map(under_base))
            .unwrap_or_else(|| base_dir.join("config"));
        let output_dir = overrides
            .output_dir
            .or_else(|| file_cfg.paths.output_dir.clone().map(under_base))
            .unwrap_or_else(|| base_dir.join("output"));

        let languages = file_cfg
            .table
            .languages
            .clone()
            .unwrap_or_else(default_languages);
        validate_languages(&languages)?;

        let b = &file_cfg.backend;
        let ollama = OllamaConfig {
            host: overrides
                .host
                .or_else(|| b.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            model: overrides
                .model
                .or_else(|| b.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: b.request_timeout_secs.map(Duration::from_secs),
            shutdown_command: b
                .shutdown_command
                .clone()
                .unwrap_or_else(default_shutdown_command),
        };

        let translate_prompt =
            load_translate_prompt(&base_dir, &file_cfg.prompts).context("load prompts")?;

        Ok(Self {
            config_path: cfg_file,
            config_dir,
            output_dir,
            languages,
            ollama,
            translate_temperature: b
                .translate_temperature
                .unwrap_or(DEFAULT_TRANSLATE_TEMPERATURE),
            chat_temperature: b.chat_temperature.unwrap_or(DEFAULT_CHAT_TEMPERATURE),
            reasoning_start: b
                .reasoning_start
                .clone()
                .unwrap_or_else(|| DEFAULT_REASONING_START.to_string()),
            reasoning_end: b
                .reasoning_end
                .clone()
                .unwrap_or_else(|| DEFAULT_REASONING_END.to_string()),
            translate_prompt,
        })
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            config_dir: self.config_dir.clone(),
            output_dir: self.output_dir.clone(),
            languages: self.languages.clone(),
        }
    }

    pub fn reasoning_filter(&self) -> anyhow::Result<ReasoningFilter> {
        ReasoningFilter::new(&self.reasoning_start, &self.reasoning_end)
    }

    pub fn build_translator(&self) -> anyhow::Result<Translator<OllamaBackend>> {
        let backend = OllamaBackend::new(self.ollama.clone())?;
        Ok(Translator::new(
            backend,
            self.translate_prompt.clone(),
            self.translate_temperature,
            self.reasoning_filter()?,
        ))
    }
}

fn validate_languages(languages: &[String]) -> anyhow::Result<()> {
    if !languages.iter().any(|l| l == SOURCE_LANG) {
        return Err(anyhow!(
            "table.languages must include the source language {SOURCE_LANG:?}"
        ));
    }
    if languages.iter().any(|l| l == KEY_COLUMN) {
        return Err(anyhow!("table.languages must not include {KEY_COLUMN:?}"));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = languages.iter().find(|l| !seen.insert(l.as_str())) {
        return Err(anyhow!("table.languages lists {dup:?} twice"));
    }
    Ok(())
}

pub fn init_default_config(dir: &Path, force: bool) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create config dir: {}", dir.display()))?;
    let cfg_path = dir.join(CONFIG_FILE_NAME);

    let prompts_dir = dir.join(DEFAULT_PROMPTS_DIR);
    std::fs::create_dir_all(&prompts_dir)
        .with_context(|| format!("create prompts dir: {}", prompts_dir.display()))?;

    for (fname, body) in default_prompt_files() {
        let p = prompts_dir.join(fname);
        if p.exists() && !force {
            continue;
        }
        std::fs::write(&p, body).with_context(|| format!("write prompt: {}", p.display()))?;
    }

    if cfg_path.exists() && !force {
        return Ok(cfg_path);
    }
    std::fs::write(&cfg_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("write config: {}", cfg_path.display()))?;
    Ok(cfg_path)
}

const DEFAULT_CONFIG_TOML: &str = r#"[paths]
# Tier and terminology JSON files (relative to this file).
config_dir = "config"
# Generated CSV tables (relative to this file).
output_dir = "output"

[table]
languages = ["en", "de", "es", "fr", "it", "ja", "ko", "pt", "ru", "tr", "zh"]

[backend]
host = "http://localhost:11434"
model = "deepseek-r1:32b"
translate_temperature = 0.3
chat_temperature = 0.5
# request_timeout_secs = 600
shutdown_command = ["pkill", "ollama"]
reasoning_start = "<think>"
reasoning_end = "</think>"

[prompts]
translate = "prompts/translate.txt"
"#;
