use std::fmt;

use chrono::{DateTime, Utc};

use crate::core::persona::PersonaTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name on the wire. Gemini uses `model` for assistant turns.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }
}

/// Session-unique message identifier, allocated by the conversation store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub active_persona: Option<PersonaTag>,
    pub is_streaming: bool,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    /// True for model messages that carry app-authored failure text.
    pub fn is_error(&self) -> bool {
        self.active_persona == Some(PersonaTag::SystemError)
    }
}

/// A message before the store has assigned it an id.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub active_persona: Option<PersonaTag>,
    pub is_streaming: bool,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            active_persona: None,
            is_streaming: false,
        }
    }

    /// Open model message that a turn streams into.
    pub fn model_placeholder() -> Self {
        Self {
            role: Role::Model,
            content: String::new(),
            active_persona: Some(PersonaTag::Dispatcher),
            is_streaming: true,
        }
    }
}

/// Partial update applied by
/// [`ConversationStore::update_by_id`](crate::core::conversation::ConversationStore::update_by_id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub content: Option<String>,
    pub active_persona: Option<PersonaTag>,
    pub is_streaming: Option<bool>,
}

impl MessagePatch {
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn persona(mut self, persona: PersonaTag) -> Self {
        self.active_persona = Some(persona);
        self
    }

    pub fn sealed(mut self) -> Self {
        self.is_streaming = Some(false);
        self
    }
}

/// Role and text of a sealed message, as sent upstream for context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}
