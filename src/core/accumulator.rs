//! Folding of streamed fragments into the running text and persona.

use crate::core::chat_stream::{FailureKind, TransportError};
use crate::core::persona::{next_persona, PersonaTag};

pub const GENERIC_FAILURE_TEXT: &str =
    "**System Error**: Unable to reach banking core. Please try again later.";

/// User-facing text for a failed turn.
pub fn failure_text(err: &TransportError) -> String {
    match err.kind() {
        FailureKind::Configuration => format!("**Configuration Error**: {}", err.message()),
        FailureKind::Transport => GENERIC_FAILURE_TEXT.to_string(),
    }
}

/// Render-ready state after a fragment has been folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: String,
    pub persona: PersonaTag,
}

#[derive(Debug)]
pub struct StreamAccumulator {
    buffer: String,
    persona: PersonaTag,
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            persona: PersonaTag::Dispatcher,
        }
    }

    /// Appends `fragment` and re-detects the persona over the whole buffer.
    /// Empty fragments change nothing and yield `None`.
    pub fn push(&mut self, fragment: &str) -> Option<Snapshot> {
        if fragment.is_empty() {
            return None;
        }
        self.buffer.push_str(fragment);
        self.persona = next_persona(self.persona, &self.buffer);
        Some(self.snapshot())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            content: self.buffer.clone(),
            persona: self.persona,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn persona(&self) -> PersonaTag {
        self.persona
    }
}
