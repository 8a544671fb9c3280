use tracing::{error, info, warn};

use crate::models::{ChatBackend, ChatMessage};
use crate::textutil::ReasoningFilter;

use super::prompts::{render_template, DEFAULT_TRANSLATE_TEXT};

pub const DEFAULT_TRANSLATE_TEMPERATURE: f32 = 0.3;

/// Turns one source string into one target-language string through a chat backend.
///
/// Each call is its own single-message conversation; nothing carries over between calls.
pub struct Translator<B> {
    backend: B,
    prompt: String,
    temperature: f32,
    reasoning: ReasoningFilter,
}

impl<B: ChatBackend> Translator<B> {
    pub fn new(backend: B, prompt: String, temperature: f32, reasoning: ReasoningFilter) -> Self {
        Self {
            backend,
            prompt,
            temperature,
            reasoning,
        }
    }

    /// Built-in prompt, default temperature, `<think>` stripping.
    pub fn with_defaults(backend: B) -> Self {
        Self::new(
            backend,
            DEFAULT_TRANSLATE_TEXT.to_string(),
            DEFAULT_TRANSLATE_TEMPERATURE,
            ReasoningFilter::default(),
        )
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn build_prompt(&self, text: &str, language_code: &str) -> String {
        render_template(
            &self.prompt,
            &[("target_lang", language_code), ("text", text)],
        )
    }

    /// Returns `None` when the request fails or the cleaned reply is empty.
    pub fn translate(&self, text: &str, language_code: &str) -> Option<String> {
        let messages = [ChatMessage::user(self.build_prompt(text, language_code))];
        match self.backend.chat(&messages, self.temperature) {
            Ok(reply) => {
                let cleaned = self.reasoning.strip(&reply);
                if cleaned.is_empty() {
                    warn!("Empty translation to {language_code} from {}", self.backend.name());
                    None
                } else {
                    Some(cleaned)
                }
            }
            Err(err) => {
                warn!("Translation to {language_code} failed: {err:#}");
                None
            }
        }
    }

    /// Best-effort; failures are logged and swallowed.
    pub fn shutdown(&self) {
        match self.backend.shutdown() {
            Ok(()) => info!("Backend {} has been stopped", self.backend.name()),
            Err(err) => error!("Error stopping backend {}: {err:#}", self.backend.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mock::MockBackend;

    #[test]
    fn translate_sends_one_fresh_user_message() {
        let t = Translator::with_defaults(MockBackend::echo());
        assert_eq!(t.translate("bread", "fr").as_deref(), Some("fr:bread"));
        assert_eq!(t.translate("water", "de").as_deref(), Some("de:water"));

        let requests = t.backend().requests.borrow();
        assert_eq!(requests.len(), 2);
        for req in requests.iter() {
            assert_eq!(req.len(), 1);
            assert_eq!(req[0].role, "user");
        }
        assert!(requests[1][0].content.contains("Text to translate: water"));
        assert_eq!(*t.backend().temperatures.borrow(), [0.3, 0.3]);
    }

    #[test]
    fn reasoning_segment_is_removed() {
        let t = Translator::with_defaults(MockBackend::new(|_| {
            Ok("<think>\nFrench for bread is pain.\n</think>\n\n  pain \n".to_string())
        }));
        assert_eq!(t.translate("bread", "fr").as_deref(), Some("pain"));
    }

    #[test]
    fn failures_and_empty_replies_are_none() {
        let t = Translator::with_defaults(MockBackend::failing());
        assert_eq!(t.translate("bread", "fr"), None);

        let t = Translator::with_defaults(MockBackend::new(|_| Ok("<think>hmm</think>  ".to_string())));
        assert_eq!(t.translate("bread", "fr"), None);
    }

    #[test]
    fn shutdown_failure_is_swallowed() {
        let t = Translator::with_defaults(MockBackend::echo().with_failing_shutdown());
        t.shutdown();
        assert_eq!(t.backend().shutdowns.get(), 1);
    }

    #[test]
    fn custom_prompt_and_temperature_are_used() {
        let t = Translator::new(
            MockBackend::new(|m| Ok(m[0].content.clone())),
            "[{{target_lang}}] {{text}}".to_string(),
            0.0,
            ReasoningFilter::default(),
        );
        assert_eq!(t.translate("Keep %s", "ko").as_deref(), Some("[ko] Keep %s"));
        assert_eq!(*t.backend().temperatures.borrow(), [0.0]);
    }
}
