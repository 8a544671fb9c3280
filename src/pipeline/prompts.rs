use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use crate::config::PromptsSection;

pub const DEFAULT_PROMPTS_DIR: &str = "prompts";
pub const DEFAULT_TRANSLATE: &str = "translate.txt";

/// Loads the translation prompt: the configured file if set, else the built-in template.
pub fn load_translate_prompt(config_dir: &Path, p: &PromptsSection) -> anyhow::Result<String> {
    let Some(rel) = p.translate.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_TRANSLATE_TEXT.to_string());
    };
    let mut path = PathBuf::from(rel);
    if path.is_relative() {
        path = config_dir.join(&path);
    }
    if !path.exists() {
        return Err(anyhow!(
            "translate prompt not found: {} (run: theory-localizer --init-config)",
            path.display()
        ));
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("read prompt: {}", path.display()))?;
    Ok(text)
}

pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        let pat = format!("{{{{{k}}}}}");
        out = out.replace(&pat, v);
    }
    out
}

pub fn default_prompt_files() -> Vec<(&'static str, &'static str)> {
    vec![(DEFAULT_TRANSLATE, DEFAULT_TRANSLATE_TEXT)]
}

pub const DEFAULT_TRANSLATE_TEXT: &str = r#"You are a translation engine. Translate the following text to {{target_lang}}.

Rules:
1. DO NOT modify any '%s' characters as they are formatting placeholders
2. Output ONLY the final translation, no explanations or thinking process
3. Do not include quotes around the translation
4. Do not include any other text or formatting in your response, simply output the translation as its own string. I.e. do not include "Translation: " or anything else.

Text to translate: {{text}}

Translation:"#;
