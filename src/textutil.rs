use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z0-9 ]").expect("key strip"));
static THINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("think"));

pub const DEFAULT_REASONING_START: &str = "<think>";
pub const DEFAULT_REASONING_END: &str = "</think>";

/// Uppercases `raw`, drops everything outside `[A-Z0-9 ]`, then turns spaces into underscores.
///
/// Underscores in the input are stripped like any other punctuation, so
/// `normalize_key("Mind_Control")` is `"MINDCONTROL"`.
pub fn normalize_key(raw: &str) -> String {
    let upper = raw.to_uppercase();
    KEY_STRIP_RE.replace_all(&upper, "").replace(' ', "_")
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Removes delimited reasoning segments (e.g. `<think>...</think>`) from a model reply.
#[derive(Clone, Debug)]
pub struct ReasoningFilter {
    re: Option<Regex>,
}

impl ReasoningFilter {
    /// An empty start or end marker disables stripping.
    pub fn new(start: &str, end: &str) -> anyhow::Result<Self> {
        if start.is_empty() || end.is_empty() {
            return Ok(Self { re: None });
        }
        let pattern = format!("(?s){}.*?{}", regex::escape(start), regex::escape(end));
        let re = Regex::new(&pattern)
            .with_context(|| format!("build reasoning filter: {start} .. {end}"))?;
        Ok(Self { re: Some(re) })
    }

    pub fn strip(&self, text: &str) -> String {
        match self.re.as_ref() {
            Some(re) => re.replace_all(text, "").trim().to_string(),
            None => text.trim().to_string(),
        }
    }
}

impl Default for ReasoningFilter {
    fn default() -> Self {
        Self {
            re: Some(THINK_RE.clone()),
        }
    }
}
