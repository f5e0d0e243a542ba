//! Non-interactive operator consoles.
//!
//! `ScriptedConsole` answers confirmations from a queue and records every
//! message, for unattended runs and tests.

use atc_common::machine::driver::OperatorConsole;
use atc_common::machine::types::OperatorResponse;
use std::collections::VecDeque;
use tracing::info;

/// One message shown on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEntry {
    /// Fire-and-forget notice.
    Notice(String),
    /// Confirmation prompt and the answer given.
    Prompt(String, OperatorResponse),
}

impl ConsoleEntry {
    /// Message text of the entry.
    pub fn text(&self) -> &str {
        match self {
            Self::Notice(text) | Self::Prompt(text, _) => text,
        }
    }
}

/// Console answering from a script.
#[derive(Debug, Clone)]
pub struct ScriptedConsole {
    answers: VecDeque<OperatorResponse>,
    fallback: OperatorResponse,
    transcript: Vec<ConsoleEntry>,
}

impl ScriptedConsole {
    /// Console that proceeds at every prompt.
    pub fn proceeding() -> Self {
        Self::with_answers(std::iter::empty())
    }

    /// Console that answers in order, then proceeds.
    pub fn with_answers<I: IntoIterator<Item = OperatorResponse>>(answers: I) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallback: OperatorResponse::Proceed,
            transcript: Vec::new(),
        }
    }

    /// Answer once the script is exhausted.
    pub fn fallback(mut self, response: OperatorResponse) -> Self {
        self.fallback = response;
        self
    }

    /// Every message shown so far.
    pub fn transcript(&self) -> &[ConsoleEntry] {
        &self.transcript
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().filter_map(|entry| match entry {
            ConsoleEntry::Prompt(text, _) => Some(text.as_str()),
            ConsoleEntry::Notice(_) => None,
        })
    }

    /// Notices shown so far.
    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.transcript.iter().filter_map(|entry| match entry {
            ConsoleEntry::Notice(text) => Some(text.as_str()),
            ConsoleEntry::Prompt(..) => None,
        })
    }
}

impl OperatorConsole for ScriptedConsole {
    fn notify(&mut self, message: &str) {
        info!(target: "operator", "{message}");
        self.transcript.push(ConsoleEntry::Notice(message.to_string()));
    }

    fn confirm(&mut self, message: &str) -> OperatorResponse {
        let response = self.answers.pop_front().unwrap_or(self.fallback);
        info!(target: "operator", ?response, "{message}");
        self.transcript
            .push(ConsoleEntry::Prompt(message.to_string(), response));
        response
    }
}
