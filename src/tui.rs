use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::fmt::yen;
use crate::reports::StackedBar;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const FOCUS_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

const PALETTE: &[Color] = &[
    Color::Rgb(99, 110, 250),
    Color::Rgb(239, 85, 59),
    Color::Rgb(0, 204, 150),
    Color::Rgb(171, 99, 250),
    Color::Rgb(255, 161, 90),
    Color::Rgb(25, 211, 243),
    Color::Rgb(255, 102, 146),
    Color::Rgb(182, 232, 128),
    Color::Rgb(255, 151, 255),
    Color::Rgb(254, 203, 82),
];

/// Color for the `index`-th series of a chart legend.
pub fn series_color(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}

pub fn yen_span(amount: i64) -> Span<'static> {
    Span::styled(yen(amount), AMOUNT_STYLE)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Truncate to `width` display columns, marking the cut with an ellipsis.
pub fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('\u{2026}');
    out
}

/// Cell widths for each segment of a stacked bar scaled so that `max_total`
/// fills `width` cells. Rounding is done on running sums so the segments add
/// up to the rounded bar length.
pub fn segment_widths(values: &[i64], max_total: i64, width: u16) -> Vec<u16> {
    if max_total <= 0 || width == 0 {
        return vec![0; values.len()];
    }
    let scale = width as f64 / max_total as f64;
    let mut running = 0i64;
    let mut prev_end = 0u16;
    values
        .iter()
        .map(|v| {
            running += (*v).max(0);
            let end = ((running as f64 * scale).round() as u16).min(width);
            let w = end.saturating_sub(prev_end);
            prev_end = end;
            w
        })
        .collect()
}

/// Render one horizontal stacked bar: label column, colored segments, total.
/// `color_of` maps a segment key to its legend color.
pub fn stacked_bar_line(
    bar: &StackedBar,
    label_width: usize,
    max_total: i64,
    bar_width: u16,
    color_of: &dyn Fn(&str) -> Color,
) -> Line<'static> {
    let label = fit(&bar.label, label_width);
    let mut spans = vec![Span::raw(format!(" {:<label_width$} ", label))];
    let values: Vec<i64> = bar.segments.iter().map(|(_, v)| *v).collect();
    for ((key, _), w) in bar.segments.iter().zip(segment_widths(&values, max_total, bar_width)) {
        if w > 0 {
            spans.push(Span::styled(
                "\u{2588}".repeat(w as usize),
                Style::default().fg(color_of(key)),
            ));
        }
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled(yen(bar.total), FOOTER_STYLE));
    Line::from(spans)
}

/// A one-line legend: "■ key" per series in its color.
pub fn legend_line(prefix: &str, keys: &[String], color_of: &dyn Fn(&str) -> Color) -> Line<'static> {
    let mut spans = vec![Span::styled(format!(" {prefix} "), FOOTER_STYLE)];
    for key in keys {
        spans.push(Span::styled("\u{25a0} ", Style::default().fg(color_of(key))));
        spans.push(Span::raw(format!("{key}  ")));
    }
    Line::from(spans)
}
