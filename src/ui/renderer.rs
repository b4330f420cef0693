use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::constants::QUICK_ACTIONS;
use crate::core::message::Message;
use crate::ui::badge::badge_for;
use crate::ui::chat_loop::ChatUi;
use crate::ui::markdown;

const INPUT_PLACEHOLDER: &str = "Type your banking request (e.g., Transfer, Check Balance)...";
const EMPTY_STATE: &str = "Awaiting Banking Instruction";
const STREAMING_CURSOR: &str = "▌";

pub fn ui(f: &mut Frame, app: &ChatUi) {
    let quick_actions_height = if app.quick_actions_visible() { 1 } else { 0 };
    let input_lines = app.input.split('\n').count().clamp(1, 5) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(quick_actions_height),
            Constraint::Length(input_lines + 2),
        ])
        .split(f.area());

    f.render_widget(Paragraph::new(header_lines(&app.model_label)), chunks[0]);

    let transcript_area = chunks[1];
    let lines = build_display_lines(app.session.messages(), app.markdown);
    if app.session.messages().is_empty() {
        let top_pad = transcript_area.height / 2;
        let mut centered = vec![Line::default(); top_pad as usize];
        centered.extend(lines);
        f.render_widget(
            Paragraph::new(centered).alignment(Alignment::Center),
            transcript_area,
        );
    } else {
        let lines = prewrap_lines(&lines, transcript_area.width);
        let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        let max_offset = total.saturating_sub(transcript_area.height);
        let scroll_offset = max_offset.saturating_sub(app.scroll_from_bottom);
        f.render_widget(
            Paragraph::new(lines).scroll((scroll_offset, 0)),
            transcript_area,
        );
    }

    if quick_actions_height > 0 {
        f.render_widget(Paragraph::new(quick_actions_line()), chunks[2]);
    }

    render_input(f, app, chunks[3]);
}

fn header_lines(model_label: &str) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    vec![
        Line::from(vec![
            Span::styled(
                "Vertex Banking AI",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Secure Agentic Architecture", dim),
        ]),
        Line::from(vec![
            Span::styled("● ", Style::default().fg(Color::Green)),
            Span::styled("System Online  ", dim),
            Span::styled("● ", Style::default().fg(Color::Blue)),
            Span::styled(model_label.to_string(), dim),
        ]),
    ]
}

fn quick_actions_line() -> Line<'static> {
    let mut spans = Vec::new();
    for (i, action) in QUICK_ACTIONS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("F{}", i + 1),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!(" {}", action.label),
            Style::default().fg(Color::Gray),
        ));
    }
    Line::from(spans)
}

fn meta_line(message: &Message) -> Line<'static> {
    let who = if message.is_user() {
        "CUSTOMER"
    } else {
        "BANKING AGENT"
    };
    let time = message.created_at.with_timezone(&Local).format("%H:%M");
    let line = Line::from(vec![
        Span::styled(
            who,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" • {time}"), Style::default().fg(Color::DarkGray)),
    ]);
    if message.is_user() {
        line.alignment(Alignment::Right)
    } else {
        line
    }
}

/// Transcript lines for `messages`; the empty-state banner when there are none.
pub fn build_display_lines(messages: &[Message], markdown_enabled: bool) -> Vec<Line<'static>> {
    if messages.is_empty() {
        return vec![Line::from(Span::styled(
            EMPTY_STATE,
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines = Vec::new();
    for message in messages {
        lines.push(meta_line(message));

        if message.is_user() {
            let style = Style::default().fg(Color::Cyan);
            for text in message.content.split('\n') {
                let line = Line::from(Span::styled(text.to_string(), style));
                lines.push(line.alignment(Alignment::Right));
            }
        } else {
            if let Some(persona) = message.active_persona {
                lines.push(badge_for(persona).to_line());
            }

            let mut body = if markdown_enabled {
                markdown::render(&message.content, Style::default())
            } else if message.content.is_empty() {
                Vec::new()
            } else {
                message
                    .content
                    .split('\n')
                    .map(|text| Line::from(text.to_string()))
                    .collect()
            };

            if message.is_streaming {
                let cursor = Span::styled(STREAMING_CURSOR, Style::default().fg(Color::Blue));
                match body.last_mut() {
                    Some(last) => last.spans.push(cursor),
                    None => body.push(Line::from(cursor)),
                }
            }
            lines.extend(body);
        }

        lines.push(Line::default());
    }
    lines
}

/// Wraps `lines` at word boundaries to `width` display columns, breaking
/// words longer than a row. Styles and alignment carry over to every row, so
/// the result renders without ratatui wrapping and its length is the row count.
pub fn prewrap_lines(lines: &[Line], width: u16) -> Vec<Line<'static>> {
    let width = usize::from(width);
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let mut rows = RowBuilder::new(line, width);
        if width == 0 {
            for span in &line.spans {
                rows.push_str(&span.content, span.style);
            }
            out.extend(rows.finish());
            continue;
        }

        let mut word: Vec<(char, Style)> = Vec::new();
        for span in &line.spans {
            for ch in span.content.chars() {
                if ch == ' ' {
                    rows.place_word(&mut word);
                    rows.place_space(span.style);
                } else {
                    word.push((ch, span.style));
                }
            }
        }
        rows.place_word(&mut word);
        out.extend(rows.finish());
    }
    out
}

struct RowBuilder {
    width: usize,
    alignment: Option<Alignment>,
    style: Style,
    rows: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    current_width: usize,
}

impl RowBuilder {
    fn new(line: &Line, width: usize) -> Self {
        Self {
            width,
            alignment: line.alignment,
            style: line.style,
            rows: Vec::new(),
            current: Vec::new(),
            current_width: 0,
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        self.current_width += ch.width().unwrap_or(0);
        if let Some(last) = self.current.last_mut() {
            if last.style == style {
                last.content.to_mut().push(ch);
                return;
            }
        }
        self.current.push(Span::styled(ch.to_string(), style));
    }

    fn push_str(&mut self, text: &str, style: Style) {
        for ch in text.chars() {
            self.push_char(ch, style);
        }
    }

    fn place_word(&mut self, word: &mut Vec<(char, Style)>) {
        if word.is_empty() {
            return;
        }
        let word_width: usize = word.iter().map(|(ch, _)| ch.width().unwrap_or(0)).sum();
        if self.current_width > 0 && self.current_width + word_width > self.width {
            self.break_row();
        }
        for (ch, style) in word.drain(..) {
            let ch_width = ch.width().unwrap_or(0);
            if self.current_width > 0 && self.current_width + ch_width > self.width {
                self.break_row();
            }
            self.push_char(ch, style);
        }
    }

    fn place_space(&mut self, style: Style) {
        if self.current_width < self.width {
            self.push_char(' ', style);
        } else {
            self.break_row();
        }
    }

    fn break_row(&mut self) {
        let mut row = Line::from(std::mem::take(&mut self.current)).style(self.style);
        row.alignment = self.alignment;
        self.rows.push(row);
        self.current_width = 0;
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.rows.is_empty() {
            self.break_row();
        }
        self.rows
    }
}

fn render_input(f: &mut Frame, app: &ChatUi, area: ratatui::layout::Rect) {
    let streaming = app.session.is_streaming();
    let title = if streaming {
        format!("Processing {} (Ctrl+C to quit)", pulse_symbol(app))
    } else {
        "Message (Enter to send, Alt+Enter for new line, Ctrl+C to quit)".to_string()
    };

    let (text, style) = if app.input.is_empty() {
        (
            INPUT_PLACEHOLDER.to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else {
        (app.input.clone(), Style::default())
    };

    let visible_rows = area.height.saturating_sub(2);
    let (cursor_row, cursor_col) = cursor_position(&app.input, app.cursor);
    let input_scroll = cursor_row.saturating_sub(visible_rows.saturating_sub(1));

    let input = Paragraph::new(text).style(style).scroll((input_scroll, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if streaming {
                Color::DarkGray
            } else {
                Color::Cyan
            }))
            .title(title)
            .title_bottom(
                Line::from("Powered by Google Gemini • Banking Compliance Mode Active")
                    .alignment(Alignment::Right),
            ),
    );
    f.render_widget(input, area);

    let max_x = area.width.saturating_sub(2);
    let x = area.x + 1 + cursor_col.min(max_x.saturating_sub(1));
    let y = area.y + 1 + cursor_row.saturating_sub(input_scroll);
    f.set_cursor_position((x, y));
}

fn pulse_symbol(app: &ChatUi) -> &'static str {
    let elapsed = app.pulse_start.elapsed().as_millis() as f32 / 1000.0;
    let phase = (elapsed * 2.0) % 2.0;
    let intensity = if phase < 1.0 { phase } else { 2.0 - phase };
    if intensity < 0.33 {
        "○"
    } else if intensity < 0.66 {
        "◐"
    } else {
        "●"
    }
}

/// Row and display column of the char-indexed `cursor` within `input`.
pub fn cursor_position(input: &str, cursor: usize) -> (u16, u16) {
    let before: String = input.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let current_line = before.rsplit('\n').next().unwrap_or("");
    (
        u16::try_from(row).unwrap_or(u16::MAX),
        u16::try_from(current_line.width()).unwrap_or(u16::MAX),
    )
}
