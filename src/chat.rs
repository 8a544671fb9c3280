use std::io::{BufRead, Write};

use anyhow::Context;

use crate::models::{ChatBackend, ChatMessage};
use crate::pipeline::Translator;

const PROMPT: &str = "Enter your message (or 'quit' to exit and stop the backend, 'reset' to clear history, 'test' to run translation test): ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Quit,
    Reset,
    Test,
    Message(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" => None,
            "quit" => Some(Self::Quit),
            "reset" => Some(Self::Reset),
            "test" => Some(Self::Test),
            _ => Some(Self::Message(line.to_string())),
        }
    }
}

/// How a console session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    EndOfInput,
}

/// A multi-turn conversation. The history is resent in full on every message.
#[derive(Clone, Debug)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    temperature: f32,
}

impl ChatSession {
    pub fn new(temperature: f32) -> Self {
        Self {
            history: Vec::new(),
            temperature,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// On failure the unanswered user turn is dropped from the history.
    pub fn send<B: ChatBackend>(&mut self, backend: &B, message: &str) -> anyhow::Result<String> {
        self.history.push(ChatMessage::user(message));
        match backend.chat(&self.history, self.temperature) {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(err) => {
                self.history.pop();
                Err(err)
            }
        }
    }
}

/// Line-oriented console: free text goes to the model, `quit`/`reset`/`test` are commands.
pub fn run_console<B, R, W>(
    translator: &Translator<B>,
    temperature: f32,
    input: R,
    mut out: W,
) -> anyhow::Result<ConsoleExit>
where
    B: ChatBackend,
    R: BufRead,
    W: Write,
{
    let mut session = ChatSession::new(temperature);
    let mut lines = input.lines();
    loop {
        write!(out, "\n{PROMPT}").context("write prompt")?;
        out.flush().context("flush console")?;
        let Some(line) = lines.next() else {
            return Ok(ConsoleExit::EndOfInput);
        };
        let line = line.context("read console input")?;
        let Some(cmd) = ConsoleCommand::parse(&line) else {
            continue;
        };
        match cmd {
            ConsoleCommand::Quit => {
                translator.shutdown();
                return Ok(ConsoleExit::Quit);
            }
            ConsoleCommand::Reset => {
                session.reset();
                writeln!(out, "Conversation history cleared!")?;
            }
            ConsoleCommand::Test => {
                let (word, lang) = ("bread", "fr");
                writeln!(out, "\nTesting translation of '{word}' to {lang}...")?;
                match translator.translate(word, lang) {
                    Some(result) => writeln!(out, "Translation result: {result}")?,
                    None => writeln!(out, "Translation failed!")?,
                }
            }
            ConsoleCommand::Message(msg) => {
                writeln!(out, "\nThinking...")?;
                match session.send(translator.backend(), &msg) {
                    Ok(reply) => writeln!(out, "\nAssistant: {reply}")?,
                    Err(err) => writeln!(out, "\nError: failed to get response ({err:#})")?,
                }
            }
        }
    }
}
