use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::persona::PersonaTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub description: &'static str,
    pub color: Color,
}

pub fn badge_for(persona: PersonaTag) -> Badge {
    let (description, color) = match persona {
        PersonaTag::Dispatcher => ("Analyzing Intent...", Color::White),
        PersonaTag::AccountManagement => ("Account Management", Color::Magenta),
        PersonaTag::TransactionProcessing => ("Transaction Processing", Color::Green),
        PersonaTag::CustomerSupport => ("Customer Support", Color::Blue),
        PersonaTag::FinancialReporting => ("Financial Reporting", Color::Yellow),
        PersonaTag::SystemError => ("Banking System Core", Color::Gray),
    };
    Badge {
        label: persona.code(),
        description,
        color,
    }
}

impl Badge {
    /// `[LABEL | description]` styled in the badge colour.
    pub fn to_line(self) -> Line<'static> {
        let style = Style::default().fg(self.color);
        Line::from(vec![
            Span::styled("[", style),
            Span::styled(self.label, style.add_modifier(Modifier::BOLD)),
            Span::styled(" | ", style.add_modifier(Modifier::DIM)),
            Span::styled(self.description, style),
            Span::styled("]", style),
        ])
    }

    pub fn plain(self) -> String {
        format!("[{} | {}]", self.label, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_shows_routing() {
        let badge = badge_for(PersonaTag::Dispatcher);
        assert_eq!(badge.plain(), "[ROUTING | Analyzing Intent...]");
    }

    #[test]
    fn error_badge_names_system_core() {
        let badge = badge_for(PersonaTag::SystemError);
        assert_eq!(badge.label, "SYSTEM");
        assert_eq!(badge.description, "Banking System Core");
    }

    #[test]
    fn specialists_have_distinct_colours() {
        let colours: Vec<_> = crate::core::persona::SPECIALISTS
            .iter()
            .map(|tag| badge_for(*tag).color)
            .collect();
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn line_contains_label_and_description() {
        let line = badge_for(PersonaTag::TransactionProcessing).to_line();
        let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(rendered, "[TPA | Transaction Processing]");
    }
}
