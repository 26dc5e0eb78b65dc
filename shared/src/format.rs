//! Lightweight formatting for completed assistant messages.
//!
//! Applied once to the final text, never to partial stream output. Each line
//! is matched in a fixed order: bullet marker, numbered-list marker, then
//! inline `**bold**` spans and `(ID: 123)` annotations. The patterns operate
//! on disjoint token shapes (`* ` versus `**`), so an earlier rule never
//! consumes text a later one needs.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*]\s+").unwrap());
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.\s").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(ID:\s*\d+\)").unwrap());

/// Glyph that replaces `-`/`*` bullet markers.
pub const BULLET_GLYPH: &str = "• ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Plain,
    Bold,
    /// De-emphasized annotation such as a product id
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// A formatted message: one entry per source line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormattedMessage {
    pub lines: Vec<Vec<Segment>>,
}

impl FormattedMessage {
    /// HTML rendering: `<strong>`, a muted `<span>`, and `<br>` between lines.
    pub fn to_html(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|segment| {
                        let text = escape_html(&segment.text);
                        match segment.style {
                            Style::Plain => text,
                            Style::Bold => format!("<strong>{}</strong>", text),
                            Style::Muted => format!("<span class=\"product-id\">{}</span>", text),
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("<br>")
    }

    /// Text with all markers resolved and no styling.
    pub fn to_plain(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn format_message(text: &str) -> FormattedMessage {
    FormattedMessage {
        lines: text
            .split('\n')
            .map(|line| format_line(line.trim_end_matches('\r')))
            .collect(),
    }
}

fn format_line(line: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = line;

    if let Some(marker) = BULLET.find(line) {
        segments.push(Segment::new(BULLET_GLYPH, Style::Plain));
        rest = &line[marker.end()..];
    } else if let Some(caps) = NUMBERED.captures(line) {
        segments.push(Segment::new(format!("{}.", &caps[1]), Style::Bold));
        segments.push(Segment::new(" ", Style::Plain));
        rest = &line[caps[0].len()..];
    }

    let mut last = 0;
    for caps in BOLD.captures_iter(rest) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_annotated(&mut segments, &rest[last..whole.start()]);
        segments.push(Segment::new(&caps[1], Style::Bold));
        last = whole.end();
    }
    push_annotated(&mut segments, &rest[last..]);

    segments
}

/// Plain text with `(ID: n)` annotations split out as muted segments.
fn push_annotated(segments: &mut Vec<Segment>, text: &str) {
    let mut last = 0;
    for id in PRODUCT_ID.find_iter(text) {
        if id.start() > last {
            segments.push(Segment::new(&text[last..id.start()], Style::Plain));
        }
        segments.push(Segment::new(id.as_str(), Style::Muted));
        last = id.end();
    }
    if last < text.len() {
        segments.push(Segment::new(&text[last..], Style::Plain));
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
