//! Interactive chat loop.
//!
//! Terminal input is read on a background task and forwarded over a channel.
//! Model streams run on tasks spawned by [`ChatStreamService`] and report back
//! over another channel tagged with their stream id. The loop below is the
//! only writer of [`ChatUi`]; it drains both channels, applies the updates and
//! redraws at a capped frame rate.

pub mod keybindings;
pub mod lifecycle;

use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::chat_stream::{ChatStreamService, ChatTransport, StreamMessage, StreamParams};
use crate::core::constants::QUICK_ACTIONS;
use crate::core::session::{ChatSession, TurnStart};
use crate::ui::renderer::ui;

use keybindings::{map_key, KeyAction};
use lifecycle::{restore_terminal, setup_terminal};

const SCROLL_PAGE: u16 = 10;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// View state for the chat screen, wrapped around the session it displays.
pub struct ChatUi {
    pub session: ChatSession,
    pub model_label: String,
    pub markdown: bool,
    pub input: String,
    /// Cursor position in chars within `input`.
    pub cursor: usize,
    /// Lines scrolled up from the bottom; zero follows new output.
    pub scroll_from_bottom: u16,
    pub pulse_start: Instant,
    pub exit_requested: bool,
}

impl ChatUi {
    pub fn new(session: ChatSession, model_label: impl Into<String>, markdown: bool) -> Self {
        Self {
            session,
            model_label: model_label.into(),
            markdown,
            input: String::new(),
            cursor: 0,
            scroll_from_bottom: 0,
            pulse_start: Instant::now(),
            exit_requested: false,
        }
    }

    /// Quick actions are offered until the first exchange has started.
    pub fn quick_actions_visible(&self) -> bool {
        !self.session.is_streaming() && self.session.messages().len() < 2
    }

    /// Applies a key action. Returns a turn to spawn when one was started.
    pub fn handle_action(&mut self, action: KeyAction) -> Option<TurnStart> {
        match action {
            KeyAction::Submit => return self.submit_input(),
            KeyAction::QuickAction(index) => {
                if !self.quick_actions_visible() {
                    return None;
                }
                let action = QUICK_ACTIONS.get(index)?;
                return self.start_turn(action.prompt);
            }
            KeyAction::Quit => self.exit_requested = true,
            KeyAction::Insert(c) => self.insert_char(c),
            KeyAction::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_char_at(self.cursor);
                }
            }
            KeyAction::Delete => self.remove_char_at(self.cursor),
            KeyAction::CursorLeft => self.cursor = self.cursor.saturating_sub(1),
            KeyAction::CursorRight => {
                self.cursor = (self.cursor + 1).min(self.input.chars().count())
            }
            KeyAction::CursorHome => self.cursor = 0,
            KeyAction::CursorEnd => self.cursor = self.input.chars().count(),
            KeyAction::ScrollUp => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(1)
            }
            KeyAction::ScrollDown => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(1)
            }
            KeyAction::PageUp => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(SCROLL_PAGE)
            }
            KeyAction::PageDown => {
                self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(SCROLL_PAGE)
            }
            KeyAction::Ignore => {}
        }
        None
    }

    fn submit_input(&mut self) -> Option<TurnStart> {
        if self.session.is_streaming() {
            return None;
        }
        let text = self.input.clone();
        let turn = self.start_turn(&text)?;
        self.input.clear();
        self.cursor = 0;
        Some(turn)
    }

    fn start_turn(&mut self, text: &str) -> Option<TurnStart> {
        let turn = self.session.begin_turn(text)?;
        self.scroll_from_bottom = 0;
        self.pulse_start = Instant::now();
        Some(turn)
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    fn remove_char_at(&mut self, char_index: usize) {
        if char_index < self.input.chars().count() {
            let at = self.byte_index(char_index);
            self.input.remove(at);
        }
    }
}

/// Applies every pending stream update. Returns true if anything arrived.
pub fn process_stream_updates(
    chat: &mut ChatUi,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> bool {
    let mut received_any = false;
    while let Ok((message, stream_id)) = rx.try_recv() {
        chat.session.apply_stream_message(stream_id, message);
        received_any = true;
    }
    received_any
}

fn spawn_turn(
    stream_service: &ChatStreamService,
    transport: &Arc<dyn ChatTransport>,
    turn: TurnStart,
) {
    debug!(stream_id = turn.stream_id, "spawning model stream");
    stream_service.spawn_stream(StreamParams {
        transport: Arc::clone(transport),
        request: turn.request,
        cancel_token: turn.cancel_token,
        stream_id: turn.stream_id,
    });
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub async fn run_chat(
    mut chat: ChatUi,
    transport: Arc<dyn ChatTransport>,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = setup_terminal()?;

    let (stream_service, mut rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    const MAX_FPS: u64 = 30;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    info!(model = %chat.model_label, "chat session started");

    let result = loop {
        if request_redraw && last_draw.elapsed() >= frame_duration {
            if let Err(e) = terminal.draw(|f| ui(f, &chat)) {
                break Err(e.into());
            }
            last_draw = Instant::now();
            request_redraw = false;
        }

        let mut events_processed = false;
        while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
            events_processed = true;
            match ev {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(turn) = chat.handle_action(map_key(key)) {
                        spawn_turn(&stream_service, &transport, turn);
                    }
                }
                _ => {}
            }
            if chat.exit_requested {
                break;
            }
        }

        if chat.exit_requested {
            break Ok(());
        }

        let received_any = process_stream_updates(&mut chat, &mut rx);

        // The streaming cursor pulses, so keep redrawing while a turn is open.
        request_redraw |= events_processed || received_any || chat.session.is_streaming();

        if !events_processed && !received_any {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    chat.session.shutdown();
    event_reader_handle.abort();
    restore_terminal(&mut terminal)?;
    info!("chat session ended");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::persona::PersonaTag;

    fn chat() -> ChatUi {
        ChatUi::new(ChatSession::new(), "gemini-test", true)
    }

    fn type_text(chat: &mut ChatUi, text: &str) {
        for c in text.chars() {
            chat.handle_action(KeyAction::Insert(c));
        }
    }

    #[test]
    fn submit_starts_turn_and_clears_input() {
        let mut chat = chat();
        type_text(&mut chat, "Cek saldo");

        let turn = chat.handle_action(KeyAction::Submit).expect("turn");
        assert_eq!(turn.request.user_text, "Cek saldo");
        assert!(chat.input.is_empty());
        assert_eq!(chat.cursor, 0);
        assert!(chat.session.is_streaming());
    }

    #[test]
    fn submit_while_streaming_keeps_draft() {
        let mut chat = chat();
        type_text(&mut chat, "one");
        chat.handle_action(KeyAction::Submit).expect("turn");

        type_text(&mut chat, "two");
        assert!(chat.handle_action(KeyAction::Submit).is_none());
        assert_eq!(chat.input, "two");
        assert_eq!(chat.session.messages().len(), 2);
    }

    #[test]
    fn blank_submit_is_ignored() {
        let mut chat = chat();
        type_text(&mut chat, "   ");
        assert!(chat.handle_action(KeyAction::Submit).is_none());
        assert!(chat.session.messages().is_empty());
    }

    #[test]
    fn quick_actions_only_before_first_exchange() {
        let mut chat = chat();
        assert!(chat.quick_actions_visible());

        let turn = chat.handle_action(KeyAction::QuickAction(0)).expect("turn");
        assert_eq!(turn.request.user_text, QUICK_ACTIONS[0].prompt);
        chat.session
            .apply_stream_message(turn.stream_id, StreamMessage::End);

        assert!(!chat.quick_actions_visible());
        assert!(chat.handle_action(KeyAction::QuickAction(1)).is_none());
        assert!(chat.handle_action(KeyAction::QuickAction(9)).is_none());
    }

    #[test]
    fn editing_respects_multibyte_cursor() {
        let mut chat = chat();
        type_text(&mut chat, "héllo");
        chat.handle_action(KeyAction::CursorHome);
        chat.handle_action(KeyAction::CursorRight);
        chat.handle_action(KeyAction::Delete);
        assert_eq!(chat.input, "hllo");
        chat.handle_action(KeyAction::CursorEnd);
        chat.handle_action(KeyAction::Backspace);
        assert_eq!(chat.input, "hll");
        chat.handle_action(KeyAction::Insert('ö'));
        assert_eq!(chat.input, "hllö");
    }

    #[test]
    fn scrolling_saturates_at_bottom() {
        let mut chat = chat();
        chat.handle_action(KeyAction::ScrollDown);
        assert_eq!(chat.scroll_from_bottom, 0);
        chat.handle_action(KeyAction::PageUp);
        chat.handle_action(KeyAction::ScrollUp);
        assert_eq!(chat.scroll_from_bottom, SCROLL_PAGE + 1);
        chat.handle_action(KeyAction::PageDown);
        assert_eq!(chat.scroll_from_bottom, 1);
    }

    #[test]
    fn quit_sets_exit_flag() {
        let mut chat = chat();
        chat.handle_action(KeyAction::Quit);
        assert!(chat.exit_requested);
    }

    #[test]
    fn stream_updates_drain_into_session() {
        let mut chat = chat();
        type_text(&mut chat, "Transfer 100 to account 555");
        let turn = chat.handle_action(KeyAction::Submit).unwrap();

        let (service, mut rx) = ChatStreamService::new();
        service.send_for_test(StreamMessage::Chunk("CALL: TPA\n".into()), turn.stream_id);
        service.send_for_test(StreamMessage::Chunk("ignored".into()), turn.stream_id + 5);
        service.send_for_test(StreamMessage::End, turn.stream_id);

        assert!(process_stream_updates(&mut chat, &mut rx));
        let reply = chat.session.store().get(turn.placeholder).unwrap();
        assert_eq!(reply.content, "CALL: TPA\n");
        assert_eq!(reply.active_persona, Some(PersonaTag::TransactionProcessing));
        assert!(!reply.is_streaming);
        assert!(!process_stream_updates(&mut chat, &mut rx));
    }
}
