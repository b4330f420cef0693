//! Turn lifecycle for one conversation.
//!
//! A turn appends the user message and an open model placeholder, then folds
//! stream updates into the placeholder until the stream ends or fails. Only
//! one turn may be in flight; sends attempted meanwhile are dropped.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::accumulator::{failure_text, StreamAccumulator};
use crate::core::chat_stream::{ChatTransport, StreamMessage, TurnRequest};
use crate::core::conversation::ConversationStore;
use crate::core::message::{Message, MessageId, MessagePatch, NewMessage};
use crate::core::persona::PersonaTag;
use crate::utils::logging::TranscriptLog;

/// Everything needed to drive the stream for a freshly started turn.
#[derive(Debug)]
pub struct TurnStart {
    pub request: TurnRequest,
    pub stream_id: u64,
    pub cancel_token: CancellationToken,
    pub placeholder: MessageId,
}

struct InFlight {
    placeholder: MessageId,
    stream_id: u64,
    accumulator: StreamAccumulator,
    cancel_token: CancellationToken,
}

#[derive(Default)]
pub struct ChatSession {
    store: ConversationStore,
    in_flight: Option<InFlight>,
    next_stream_id: u64,
    transcript: Option<TranscriptLog>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(mut self, transcript: TranscriptLog) -> Self {
        self.transcript = Some(transcript);
        self
    }

    pub fn messages(&self) -> &[Message] {
        self.store.list()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn is_streaming(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current_stream_id(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|turn| turn.stream_id)
    }

    /// Starts a turn for `text`. Returns `None` when the text is blank or a
    /// turn is already in flight.
    pub fn begin_turn(&mut self, text: &str) -> Option<TurnStart> {
        if text.trim().is_empty() {
            return None;
        }
        if self.in_flight.is_some() || self.store.streaming_message().is_some() {
            debug!("send ignored while a response is streaming");
            return None;
        }

        let history = self.store.history();

        let user_id = match self.store.append(NewMessage::user(text)) {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, "failed to append user message");
                return None;
            }
        };
        self.log_to_transcript(user_id);

        let placeholder = match self.store.append(NewMessage::model_placeholder()) {
            Ok(id) => id,
            Err(err) => {
                warn!(%err, "failed to open model placeholder");
                return None;
            }
        };

        self.next_stream_id += 1;
        let stream_id = self.next_stream_id;
        let cancel_token = CancellationToken::new();
        self.in_flight = Some(InFlight {
            placeholder,
            stream_id,
            accumulator: StreamAccumulator::new(),
            cancel_token: cancel_token.clone(),
        });

        info!(stream_id, history = history.len(), "turn started");

        Some(TurnStart {
            request: TurnRequest {
                user_text: text.to_string(),
                history,
            },
            stream_id,
            cancel_token,
            placeholder,
        })
    }

    /// Applies one stream update. Returns true if the store changed. Updates
    /// for a stream other than the current one are ignored.
    pub fn apply_stream_message(&mut self, stream_id: u64, message: StreamMessage) -> bool {
        let Some(turn) = self.in_flight.as_mut() else {
            debug!(stream_id, "stream update with no turn in flight ignored");
            return false;
        };
        if turn.stream_id != stream_id {
            debug!(
                stream_id,
                current = turn.stream_id,
                "stale stream update ignored"
            );
            return false;
        }

        match message {
            StreamMessage::Chunk(fragment) => match turn.accumulator.push(&fragment) {
                Some(snapshot) => self.store.update_by_id(
                    turn.placeholder,
                    MessagePatch::default()
                        .content(snapshot.content)
                        .persona(snapshot.persona),
                ),
                None => false,
            },
            StreamMessage::End => {
                let Some(turn) = self.in_flight.take() else {
                    return false;
                };
                info!(stream_id, persona = turn.accumulator.persona().code(), "turn complete");
                self.seal(turn.placeholder, MessagePatch::default().sealed())
            }
            StreamMessage::Error(err) => {
                let Some(turn) = self.in_flight.take() else {
                    return false;
                };
                warn!(stream_id, error = %err, "turn failed");
                self.seal(
                    turn.placeholder,
                    MessagePatch::default()
                        .content(failure_text(&err))
                        .persona(PersonaTag::SystemError)
                        .sealed(),
                )
            }
        }
    }

    /// Runs a whole turn inline, calling `observer` with the placeholder
    /// after every store update. Returns the placeholder id, or `None` when
    /// the send was a no-op.
    pub async fn send<T, F>(
        &mut self,
        transport: &T,
        text: &str,
        mut observer: F,
    ) -> Option<MessageId>
    where
        T: ChatTransport + ?Sized,
        F: FnMut(&Message),
    {
        let turn = self.begin_turn(text)?;
        let TurnStart {
            request,
            stream_id,
            cancel_token,
            placeholder,
        } = turn;

        let mut fragments = match transport.open_stream(request).await {
            Ok(fragments) => fragments,
            Err(err) => {
                self.apply_stream_message(stream_id, StreamMessage::Error(err));
                self.notify(placeholder, &mut observer);
                return Some(placeholder);
            }
        };

        while let Some(item) = fragments.next().await {
            if cancel_token.is_cancelled() {
                break;
            }
            let update = match item {
                Ok(fragment) => StreamMessage::Chunk(fragment),
                Err(err) => StreamMessage::Error(err),
            };
            let terminal = matches!(update, StreamMessage::Error(_));
            if self.apply_stream_message(stream_id, update) {
                self.notify(placeholder, &mut observer);
            }
            if terminal {
                return Some(placeholder);
            }
        }

        if self.apply_stream_message(stream_id, StreamMessage::End) {
            self.notify(placeholder, &mut observer);
        }
        Some(placeholder)
    }

    /// Cancels the in-flight stream, if any, and seals its placeholder with
    /// whatever text has arrived.
    pub fn shutdown(&mut self) {
        if let Some(turn) = self.in_flight.take() {
            turn.cancel_token.cancel();
            debug!(stream_id = turn.stream_id, "in-flight turn cancelled");
            self.seal(turn.placeholder, MessagePatch::default().sealed());
        }
    }

    fn seal(&mut self, id: MessageId, patch: MessagePatch) -> bool {
        let changed = self.store.update_by_id(id, patch);
        self.log_to_transcript(id);
        changed
    }

    fn notify<F: FnMut(&Message)>(&self, id: MessageId, observer: &mut F) {
        if let Some(message) = self.store.get(id) {
            observer(message);
        }
    }

    fn log_to_transcript(&self, id: MessageId) {
        let (Some(transcript), Some(message)) = (&self.transcript, self.store.get(id)) else {
            return;
        };
        if let Err(e) = transcript.log_message(message) {
            warn!(path = %transcript.path().display(), "failed to write transcript: {e}");
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        if let Some(turn) = &self.in_flight {
            turn.cancel_token.cancel();
        }
    }
}
