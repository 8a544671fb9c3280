use std::cell::{Cell, RefCell};

use anyhow::anyhow;

use super::{ChatBackend, ChatMessage};

type Reply = Box<dyn Fn(&[ChatMessage]) -> anyhow::Result<String>>;

/// In-memory backend that records every conversation it receives.
pub(crate) struct MockBackend {
    reply: Reply,
    pub(crate) requests: RefCell<Vec<Vec<ChatMessage>>>,
    pub(crate) temperatures: RefCell<Vec<f32>>,
    pub(crate) shutdowns: Cell<usize>,
    fail_shutdown: bool,
}

impl MockBackend {
    pub(crate) fn new(reply: impl Fn(&[ChatMessage]) -> anyhow::Result<String> + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            requests: RefCell::new(Vec::new()),
            temperatures: RefCell::new(Vec::new()),
            shutdowns: Cell::new(0),
            fail_shutdown: false,
        }
    }

    /// Replies `"<lang>:<text>"`, reading both back out of the rendered translation prompt.
    pub(crate) fn echo() -> Self {
        Self::new(|messages| {
            let prompt = &messages[messages.len() - 1].content;
            let lang = between(prompt, "to ", ".\n").unwrap_or("?");
            let text = between(prompt, "Text to translate: ", "\n").unwrap_or("?");
            Ok(format!("{lang}:{text}"))
        })
    }

    pub(crate) fn failing() -> Self {
        Self::new(|_| Err(anyhow!("connection refused")))
    }

    pub(crate) fn with_failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

fn between<'a>(s: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = s.find(start)? + start.len();
    let len = s[from..].find(end)?;
    Some(&s[from..from + len])
}

impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn chat(&self, messages: &[ChatMessage], temperature: f32) -> anyhow::Result<String> {
        self.requests.borrow_mut().push(messages.to_vec());
        self.temperatures.borrow_mut().push(temperature);
        (self.reply)(messages)
    }

    fn shutdown(&self) -> anyhow::Result<()> {
        self.shutdowns.set(self.shutdowns.get() + 1);
        if self.fail_shutdown {
            return Err(anyhow!("pkill: permission denied"));
        }
        Ok(())
    }
}
