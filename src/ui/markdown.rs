//! Line-oriented markdown subset used for model replies.
//!
//! Each line is classified on its own: `### ` and `#### ` headings, `* `/`- `
//! bullets, `1. ` numbered items, blank separators and paragraphs. Bullet,
//! numbered and paragraph text may contain `**bold**` spans. Nothing else is
//! interpreted.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading3(String),
    Heading4(String),
    Bullet(Vec<Inline>),
    Numbered { number: String, spans: Vec<Inline> },
    Blank,
    Paragraph(Vec<Inline>),
}

pub fn parse(content: &str) -> Vec<Block> {
    if content.is_empty() {
        return Vec::new();
    }
    content.split('\n').map(classify_line).collect()
}

fn classify_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("### ") {
        return Block::Heading3(rest.to_string());
    }
    if let Some(rest) = line.strip_prefix("#### ") {
        return Block::Heading4(rest.to_string());
    }

    let trimmed = line.trim();
    if trimmed.starts_with("* ") || trimmed.starts_with("- ") {
        return Block::Bullet(split_bold(&trimmed[2..]));
    }

    if is_numbered(trimmed) {
        if let Some((number, rest)) = trimmed.split_once('.') {
            return Block::Numbered {
                number: number.to_string(),
                spans: split_bold(rest.trim()),
            };
        }
    }

    if trimmed.is_empty() {
        return Block::Blank;
    }

    Block::Paragraph(split_bold(line))
}

/// One or more ASCII digits, a dot, then whitespace.
fn is_numbered(trimmed: &str) -> bool {
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let mut rest = trimmed[digits..].chars();
    rest.next() == Some('.') && rest.next().is_some_and(char::is_whitespace)
}

/// Splits `text` on `**...**` spans, matching the shortest closing marker.
/// Empty pieces are dropped.
pub fn split_bold(text: &str) -> Vec<Inline> {
    let mut parts = Vec::new();
    let mut plain_start = 0;
    let mut search_from = 0;

    while let Some(open_rel) = text[search_from..].find("**") {
        let open = search_from + open_rel;
        let Some(close_rel) = text[open + 2..].find("**") else {
            break;
        };
        let close = open + 2 + close_rel;
        push_part(&mut parts, &text[plain_start..open]);
        push_part(&mut parts, &text[open..close + 2]);
        plain_start = close + 2;
        search_from = plain_start;
    }
    push_part(&mut parts, &text[plain_start..]);
    parts
}

fn push_part(parts: &mut Vec<Inline>, part: &str) {
    let inline = if part.starts_with("**") && part.ends_with("**") {
        // A lone `**` or `***` has no inner text.
        let inner = if part.len() >= 4 {
            &part[2..part.len() - 2]
        } else {
            ""
        };
        Inline::Bold(inner.to_string())
    } else {
        Inline::Text(part.to_string())
    };

    match &inline {
        Inline::Text(s) | Inline::Bold(s) if s.is_empty() => {}
        _ => parts.push(inline),
    }
}

fn inline_spans(spans: &[Inline], base: Style) -> Vec<Span<'static>> {
    spans
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => Span::styled(text.clone(), base),
            Inline::Bold(text) => Span::styled(text.clone(), base.add_modifier(Modifier::BOLD)),
        })
        .collect()
}

/// Converts parsed blocks to terminal lines styled on top of `base`.
pub fn to_lines(blocks: &[Block], base: Style) -> Vec<Line<'static>> {
    let marker = Style::default().fg(Color::DarkGray);
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading3(text) => Line::from(Span::styled(
                text.clone(),
                base.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )),
            Block::Heading4(text) => {
                Line::from(Span::styled(text.clone(), base.add_modifier(Modifier::BOLD)))
            }
            Block::Bullet(spans) => {
                let mut line = vec![Span::styled("  • ", marker)];
                line.extend(inline_spans(spans, base));
                Line::from(line)
            }
            Block::Numbered { number, spans } => {
                let mut line = vec![Span::styled(format!("  {number}. "), marker)];
                line.extend(inline_spans(spans, base));
                Line::from(line)
            }
            Block::Blank => Line::default(),
            Block::Paragraph(spans) => Line::from(inline_spans(spans, base)),
        })
        .collect()
}

pub fn render(content: &str, base: Style) -> Vec<Line<'static>> {
    to_lines(&parse(content), base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn bold(s: &str) -> Inline {
        Inline::Bold(s.to_string())
    }

    #[test]
    fn empty_content_renders_nothing() {
        assert!(parse("").is_empty());
        assert!(render("", Style::default()).is_empty());
    }

    #[test]
    fn headings_strip_their_prefix() {
        assert_eq!(
            parse("### Ringkasan\n#### Detail"),
            vec![
                Block::Heading3("Ringkasan".into()),
                Block::Heading4("Detail".into()),
            ]
        );
    }

    #[test]
    fn indented_heading_is_a_paragraph() {
        assert_eq!(
            parse("  ### not a heading"),
            vec![Block::Paragraph(vec![text("  ### not a heading")])]
        );
    }

    #[test]
    fn bullets_use_trimmed_line() {
        assert_eq!(
            parse("   * Saldo: **Rp 1.000**\n- kedua"),
            vec![
                Block::Bullet(vec![text("Saldo: "), bold("Rp 1.000")]),
                Block::Bullet(vec![text("kedua")]),
            ]
        );
    }

    #[test]
    fn numbered_items_split_on_first_dot_and_rejoin_rest() {
        assert_eq!(
            parse("2. Transfer Rp 1.500.000 selesai"),
            vec![Block::Numbered {
                number: "2".into(),
                spans: vec![text("Transfer Rp 1.500.000 selesai")],
            }]
        );
    }

    #[test]
    fn number_without_space_is_a_paragraph() {
        assert_eq!(parse("3.14"), vec![Block::Paragraph(vec![text("3.14")])]);
    }

    #[test]
    fn blank_lines_become_separators() {
        assert_eq!(
            parse("a\n   \nb"),
            vec![
                Block::Paragraph(vec![text("a")]),
                Block::Blank,
                Block::Paragraph(vec![text("b")]),
            ]
        );
    }

    #[test]
    fn paragraphs_keep_leading_whitespace() {
        assert_eq!(
            parse("  indented **bold** tail"),
            vec![Block::Paragraph(vec![
                text("  indented "),
                bold("bold"),
                text(" tail"),
            ])]
        );
    }

    #[test]
    fn bold_matches_shortest_closing_marker() {
        assert_eq!(
            split_bold("**a** and **b**"),
            vec![bold("a"), text(" and "), bold("b")]
        );
        assert_eq!(split_bold("***x**"), vec![bold("*x")]);
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(split_bold("**open only"), vec![text("**open only")]);
        assert_eq!(split_bold("a ** b"), vec![text("a ** b")]);
    }

    #[test]
    fn bare_marker_pieces_render_as_empty_bold() {
        assert!(split_bold("**").is_empty());
        assert!(split_bold("****").is_empty());
        assert_eq!(split_bold("x **** y"), vec![text("x "), text(" y")]);
    }

    #[test]
    fn to_lines_styles_bold_spans() {
        let lines = render("Hasil: **OK**", Style::default());
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, "Hasil: ");
        assert_eq!(spans[1].content, "OK");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn list_lines_get_markers() {
        let lines = render("* satu\n1. dua", Style::default());
        assert_eq!(lines[0].spans[0].content, "  • ");
        assert_eq!(lines[1].spans[0].content, "  1. ");
        assert_eq!(lines[1].spans[1].content, "dua");
    }
}
