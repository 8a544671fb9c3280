use std::process::Command;
use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatBackend, ChatMessage};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "deepseek-r1:32b";

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub request_timeout: Option<Duration>,
    pub shutdown_command: Vec<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: None,
            shutdown_command: default_shutdown_command(),
        }
    }
}

pub fn default_shutdown_command() -> Vec<String> {
    vec!["pkill".to_string(), "ollama".to_string()]
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Blocking client for an Ollama `/api/chat` endpoint.
pub struct OllamaBackend {
    cfg: OllamaConfig,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl OllamaBackend {
    pub fn new(cfg: OllamaConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .context("build http client")?;
        let endpoint = chat_endpoint(&cfg.host);
        Ok(Self {
            cfg,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.cfg.model
    }

    fn chat(&self, messages: &[ChatMessage], temperature: f32) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.cfg.model,
            messages,
            stream: false,
            options: ChatOptions { temperature },
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!(
                "{} returned {status}: {}",
                self.endpoint,
                text.trim()
            ));
        }
        let text = resp.text().context("read chat response")?;
        parse_chat_response(&text)
    }

    fn shutdown(&self) -> anyhow::Result<()> {
        let Some((program, args)) = self.cfg.shutdown_command.split_first() else {
            debug!("No shutdown command configured");
            return Ok(());
        };
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("run shutdown command: {program}"))?;
        // pkill exits non-zero when nothing matched; the backend is down either way.
        debug!("Shutdown command {program} exited with {status}");
        Ok(())
    }
}

fn chat_endpoint(host: &str) -> String {
    format!("{}/api/chat", host.trim().trim_end_matches('/'))
}

fn parse_chat_response(text: &str) -> anyhow::Result<String> {
    let parsed: ChatResponse = serde_json::from_str(text).context("decode chat response")?;
    parsed
        .message
        .map(|m| m.content)
        .ok_or_else(|| anyhow!("chat response has no message"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_joins_host_and_path() {
        assert_eq!(chat_endpoint("http://localhost:11434"), "http://localhost:11434/api/chat");
        assert_eq!(chat_endpoint("http://gpu-box:11434/ "), "http://gpu-box:11434/api/chat");
    }

    #[test]
    fn request_body_matches_chat_api() {
        let messages = vec![ChatMessage::user("hi")];
        let body = ChatRequest {
            model: "deepseek-r1:32b",
            messages: &messages,
            stream: false,
            options: ChatOptions { temperature: 0.5 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "deepseek-r1:32b",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false,
                "options": {"temperature": 0.5}
            })
        );
    }

    #[test]
    fn response_content_is_extracted() {
        let text = r#"{"model":"m","message":{"role":"assistant","content":"Pain"},"done":true}"#;
        assert_eq!(parse_chat_response(text).unwrap(), "Pain");
        assert!(parse_chat_response(r#"{"done":true}"#).is_err());
        assert!(parse_chat_response("not json").is_err());
    }

    #[test]
    fn shutdown_with_empty_command_is_noop() {
        let backend = OllamaBackend::new(OllamaConfig {
            shutdown_command: Vec::new(),
            ..OllamaConfig::default()
        })
        .unwrap();
        backend.shutdown().unwrap();
    }

    #[test]
    fn shutdown_reports_missing_program() {
        let backend = OllamaBackend::new(OllamaConfig {
            shutdown_command: vec!["definitely-not-a-real-program-42".to_string()],
            ..OllamaConfig::default()
        })
        .unwrap();
        assert!(backend.shutdown().is_err());
    }
}
