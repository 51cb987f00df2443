use md_jinja_engine::highlight::{Category, Span as Highlight};
use md_jinja_engine::panel::{PanelBody, PanelPosition, PanelView};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Drawn in place of newlines inside a block so char offsets still line up.
const NEWLINE_GLYPH: char = '↵';

pub const PANEL_WIDTH: u16 = 48;

fn style_for(category: &Category) -> Style {
    match category {
        Category::FootnoteRef => Style::default().fg(Color::Magenta),
        Category::Html => Style::default().fg(Color::Blue),
        Category::Link { .. } => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED),
        Category::JinjaVariable => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Category::JinjaTag => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Category::JinjaComment => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        Category::CodeFenceMarker => Style::default().fg(Color::DarkGray),
        Category::TableRowMarker => Style::default().bg(Color::Rgb(30, 30, 40)),
        Category::Host { .. } => Style::default().bg(Color::Yellow).fg(Color::Black),
    }
}

/// Later layers are patched over earlier ones where spans overlap.
fn layer(category: &Category) -> u8 {
    match category {
        Category::CodeFenceMarker | Category::TableRowMarker => 0,
        Category::FootnoteRef | Category::Html | Category::Link { .. } => 1,
        Category::JinjaVariable | Category::JinjaTag | Category::JinjaComment => 2,
        Category::Host { .. } => 3,
    }
}

/// One block as a styled line. Only spans on the block's first run apply,
/// which is every span for blocks loaded from plain lines.
pub fn styled_line(text: &str, highlights: &[Highlight], base: Style) -> Line<'static> {
    let chars: Vec<char> = text
        .chars()
        .map(|c| if c == '\n' { NEWLINE_GLYPH } else { c })
        .collect();
    let mut styles = vec![base; chars.len()];

    let mut ordered: Vec<&Highlight> = highlights
        .iter()
        .filter(|h| h.child_index == 0)
        .collect();
    ordered.sort_by_key(|h| layer(&h.category));
    for highlight in ordered {
        let style = style_for(&highlight.category);
        let end = highlight.end.min(chars.len());
        for slot in styles.iter_mut().take(end).skip(highlight.start) {
            *slot = slot.patch(style);
        }
    }

    let mut spans = Vec::new();
    let mut start = 0;
    for i in 1..=chars.len() {
        if i == chars.len() || styles[i] != styles[start] {
            let segment: String = chars[start..i].iter().collect();
            spans.push(Span::styled(segment, styles[start]));
            start = i;
        }
    }
    Line::from(spans)
}

/// Rows the panel needs for `view`, borders included.
pub fn panel_height(view: &PanelView) -> u16 {
    let rows = match &view.body {
        PanelBody::Options(options) => options.len().max(1),
        PanelBody::Loading(_) | PanelBody::Empty(_) => 1,
    };
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2)
}

/// Screen area for the panel, clamped into `frame`.
pub fn panel_area(position: PanelPosition, height: u16, frame: Rect) -> Rect {
    let width = PANEL_WIDTH.min(frame.width);
    let height = height.min(frame.height);
    let x = (position.left.max(0.0) as u16).min(frame.right().saturating_sub(width));
    let y = match (position.top, position.bottom) {
        (Some(top), _) => top.max(0.0) as u16,
        (None, Some(bottom)) => frame
            .bottom()
            .saturating_sub(bottom.max(0.0) as u16)
            .saturating_sub(height),
        (None, None) => 0,
    };
    let y = y.min(frame.bottom().saturating_sub(height));
    Rect::new(x, y, width, height)
}

pub fn option_line(title: &str, description: Option<&str>, selected: bool) -> Line<'static> {
    let marker = if selected { "> " } else { "  " };
    let mut spans = vec![Span::raw(marker), Span::raw(title.to_string())];
    if let Some(description) = description {
        spans.push(Span::styled(
            format!("  {}", description.replace('\n', " ")),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    let line = Line::from(spans);
    if selected {
        line.style(Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        line
    }
}
