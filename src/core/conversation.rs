//! Ordered, append-only message log for one chat session.

use std::error::Error;
use std::fmt;

use chrono::Utc;
use tracing::debug;

use crate::core::message::{HistoryEntry, Message, MessageId, MessagePatch, NewMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A second streaming message was appended while one is still open.
    StreamingInFlight { open: MessageId },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::StreamingInFlight { open } => {
                write!(f, "message {open} is still streaming")
            }
        }
    }
}

impl Error for ConversationError {}

#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    next_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: NewMessage) -> Result<MessageId, ConversationError> {
        if message.is_streaming {
            if let Some(open) = self.streaming_message() {
                return Err(ConversationError::StreamingInFlight { open: open.id });
            }
        }

        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(Message {
            id,
            role: message.role,
            content: message.content,
            created_at: Utc::now(),
            active_persona: message.active_persona,
            is_streaming: message.is_streaming,
        });
        Ok(id)
    }

    /// Applies `patch` to the message with `id`. Returns false when the id is
    /// unknown or the message is already sealed; neither case is an error.
    pub fn update_by_id(&mut self, id: MessageId, patch: MessagePatch) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            debug!(%id, "update for unknown message ignored");
            return false;
        };

        if !message.is_streaming {
            debug!(%id, "update for sealed message ignored");
            return false;
        }

        if let Some(content) = patch.content {
            message.content = content;
        }
        if let Some(persona) = patch.active_persona {
            message.active_persona = Some(persona);
        }
        if let Some(is_streaming) = patch.is_streaming {
            message.is_streaming = is_streaming;
        }
        true
    }

    pub fn list(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_streaming)
    }

    /// Sealed messages in order. The open placeholder is left out.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages
            .iter()
            .filter(|m| !m.is_streaming)
            .map(|m| HistoryEntry {
                role: m.role,
                text: m.content.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
