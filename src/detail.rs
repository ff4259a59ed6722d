use chrono::{Days, Months, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::filter::FilterState;
use crate::fmt::{number, yen};
use crate::ledger::RowStore;
use crate::reports::{stack_by_primary, Views};
use crate::tui::{
    self, series_color, FOCUS_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE, TITLE_STYLE,
};

const PAGE_SIZE: usize = 20;
const MAX_DEPT_ROWS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Start,
    End,
    Departments,
    Table,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Departments,
            Self::Departments => Self::Table,
            Self::Table => Self::Start,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Start => Self::Table,
            Self::End => Self::Start,
            Self::Departments => Self::End,
            Self::Table => Self::Departments,
        }
    }
}

pub enum DetailAction {
    Continue,
    Close,
    /// A control changed; the caller replaces its filter and recomputes views.
    Filter(FilterState),
}

/// The drill-down screen: date-range and department controls, the product
/// breakdown for the current window, and the matching line items.
pub struct DetailPanel {
    focus: Focus,
    dept_cursor: usize,
    selected: usize,
    table_state: TableState,
}

impl Default for DetailPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailPanel {
    pub fn new() -> Self {
        Self {
            focus: Focus::Start,
            dept_cursor: 0,
            selected: 0,
            table_state: TableState::default(),
        }
    }

    #[cfg(test)]
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Keep cursors in range after the row set or department list changed.
    pub fn reset_cursors(&mut self, detail_len: usize, dept_count: usize) {
        self.selected = self.selected.min(detail_len.saturating_sub(1));
        self.dept_cursor = self.dept_cursor.min(dept_count.saturating_sub(1));
    }

    pub fn handle_key(&mut self, code: KeyCode, filter: &FilterState, store: &RowStore) -> DetailAction {
        match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('d') => return DetailAction::Close,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return DetailAction::Continue;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return DetailAction::Continue;
            }
            _ => {}
        }

        match self.focus {
            Focus::Start | Focus::End => self.handle_date_key(code, filter, store),
            Focus::Departments => self.handle_department_key(code, filter, store),
            Focus::Table => {
                self.handle_table_key(code);
                DetailAction::Continue
            }
        }
    }

    fn handle_date_key(&mut self, code: KeyCode, filter: &FilterState, store: &RowStore) -> DetailAction {
        let Some((min, max)) = store.date_extent() else {
            return DetailAction::Continue;
        };
        let current = if self.focus == Focus::Start { filter.start } else { filter.end };
        let moved = match code {
            KeyCode::Left => current.checked_sub_days(Days::new(1)),
            KeyCode::Right => current.checked_add_days(Days::new(1)),
            KeyCode::Down => current.checked_sub_months(Months::new(1)),
            KeyCode::Up => current.checked_add_months(Months::new(1)),
            KeyCode::Home => Some(min),
            KeyCode::End => Some(max),
            _ => None,
        };
        let Some(date) = moved.map(|d| d.clamp(min, max)) else {
            return DetailAction::Continue;
        };
        if date == current {
            return DetailAction::Continue;
        }
        let next = if self.focus == Focus::Start {
            filter.with_start(date)
        } else {
            filter.with_end(date)
        };
        self.selected = 0;
        DetailAction::Filter(next)
    }

    fn handle_department_key(&mut self, code: KeyCode, filter: &FilterState, store: &RowStore) -> DetailAction {
        let departments = store.departments();
        match code {
            KeyCode::Up => {
                self.dept_cursor = self.dept_cursor.saturating_sub(1);
                DetailAction::Continue
            }
            KeyCode::Down => {
                if self.dept_cursor + 1 < departments.len() {
                    self.dept_cursor += 1;
                }
                DetailAction::Continue
            }
            KeyCode::Char(' ') | KeyCode::Enter => match departments.get(self.dept_cursor) {
                Some(dept) => {
                    self.selected = 0;
                    DetailAction::Filter(filter.toggled(dept))
                }
                None => DetailAction::Continue,
            },
            KeyCode::Char('a') => {
                self.selected = 0;
                DetailAction::Filter(filter.with_all_departments(store))
            }
            KeyCode::Char('n') => {
                self.selected = 0;
                DetailAction::Filter(filter.with_departments(Vec::<String>::new()))
            }
            _ => DetailAction::Continue,
        }
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected += 1,
            KeyCode::PageUp => self.selected = self.selected.saturating_sub(PAGE_SIZE),
            KeyCode::PageDown => self.selected += PAGE_SIZE,
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = usize::MAX,
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn draw(
        &mut self,
        frame: &mut Frame,
        store: &RowStore,
        filter: &FilterState,
        views: &Views,
        status: Option<&str>,
    ) {
        let area = frame.area();
        let departments = store.departments();
        self.reset_cursors(views.detail.len(), departments.len());

        let dept_rows = departments.len().clamp(1, MAX_DEPT_ROWS) as u16;
        let [title_area, sep, range_area, body_area, status_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(" Detail").style(HEADER_STYLE), title_area);
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep,
        );

        self.draw_range(frame, range_area, filter, store);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(body_area);
        let [dept_area, chart_area] = Layout::vertical([
            Constraint::Length(dept_rows + 1),
            Constraint::Fill(1),
        ])
        .areas(left);

        self.draw_departments(frame, dept_area, filter, &departments);
        draw_product_chart(frame, chart_area, views, &departments);
        self.draw_table(frame, right, views);

        let summary = format!(
            " {} rows | {} | {}",
            number(views.detail.len() as i64),
            yen(views.detail_amount_total),
            filter.describe(departments.len())
        );
        let status_line = match status {
            Some(msg) => format!("{summary} | {msg}"),
            None => summary,
        };
        frame.render_widget(Paragraph::new(status_line).style(FOOTER_STYLE), status_area);

        let hints = match self.focus {
            Focus::Start | Focus::End => {
                " Tab=next control  \u{2190}/\u{2192}=\u{00b1}day  \u{2191}/\u{2193}=\u{00b1}month  Home/End=extent  Esc=back"
            }
            Focus::Departments => {
                " Tab=next control  \u{2191}/\u{2193}=move  Space=toggle  a=all  n=none  Esc=back"
            }
            Focus::Table => " Tab=next control  \u{2191}/\u{2193}=scroll  PgUp/PgDn=page  Esc=back",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), keys_area);
    }

    fn draw_range(&self, frame: &mut Frame, area: Rect, filter: &FilterState, store: &RowStore) {
        let style_for = |f: Focus| {
            if self.focus == f {
                FOCUS_STYLE
            } else {
                Style::default()
            }
        };
        let extent = match store.date_extent() {
            Some((min, max)) => format!("   (data: {} to {})", fmt_date(min), fmt_date(max)),
            None => "   (no data)".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(" Period  ", TITLE_STYLE),
            Span::styled(format!(" {} ", fmt_date(filter.start)), style_for(Focus::Start)),
            Span::raw(" \u{2192} "),
            Span::styled(format!(" {} ", fmt_date(filter.end)), style_for(Focus::End)),
            Span::styled(extent, FOOTER_STYLE),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_departments(
        &self,
        frame: &mut Frame,
        area: Rect,
        filter: &FilterState,
        departments: &[String],
    ) {
        let title_style = if self.focus == Focus::Departments { FOCUS_STYLE } else { TITLE_STYLE };
        let mut lines = vec![Line::from(Span::styled(" Departments ", title_style))];
        let visible = area.height.saturating_sub(1) as usize;
        let first = (self.dept_cursor + 1).saturating_sub(visible.max(1));
        for (i, dept) in departments.iter().enumerate().skip(first).take(visible) {
            let checked = if filter.departments.contains(dept) { "[x]" } else { "[ ]" };
            let marker = if self.focus == Focus::Departments && i == self.dept_cursor {
                ">"
            } else {
                " "
            };
            let style = if i == self.dept_cursor && self.focus == Focus::Departments {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} {checked} "), style),
                Span::styled("\u{25a0} ", Style::default().fg(series_color(i))),
                Span::styled(dept.clone(), style),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_table(&mut self, frame: &mut Frame, area: Rect, views: &Views) {
        let [title_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        let title_style = if self.focus == Focus::Table { FOCUS_STYLE } else { TITLE_STYLE };
        frame.render_widget(
            Paragraph::new(Span::styled(" Line items ", title_style)),
            title_area,
        );

        if views.detail.is_empty() {
            frame.render_widget(Paragraph::new(" (no data)").style(FOOTER_STYLE), table_area);
            return;
        }

        let item_width = table_area.width.saturating_sub(10 + 12 + 9 + 5 + 10 + 5).max(8) as usize;
        let rows: Vec<Row> = views
            .detail
            .iter()
            .map(|r| {
                let (item, height) = tui::wrap_text(&r.item_name, item_width);
                Row::new(vec![
                    Cell::from(fmt_date(r.purchase_date)),
                    Cell::from(r.department.clone()),
                    Cell::from(item),
                    Cell::from(yen(r.unit_price)),
                    Cell::from(number(r.quantity)),
                    Cell::from(tui::yen_span(r.amount)),
                ])
                .height(height)
            })
            .collect();

        let widths = vec![
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Fill(1),
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Length(10),
        ];

        self.selected = self.selected.min(views.detail.len() - 1);
        self.table_state.select(if self.focus == Focus::Table {
            Some(self.selected)
        } else {
            None
        });
        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["Date", "Department", "Item", "Price", "Qty", "Amount"])
                    .style(HEADER_STYLE)
                    .bottom_margin(1),
            )
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);
    }
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Horizontal product bars stacked by department, largest total first.
fn draw_product_chart(frame: &mut Frame, area: Rect, views: &Views, departments: &[String]) {
    let mut lines = vec![Line::from(Span::styled(" Spend by item", TITLE_STYLE))];
    let mut bars = stack_by_primary(&views.product_by_dept);
    if bars.is_empty() {
        lines.push(Line::from(Span::styled(" (no data)", FOOTER_STYLE)));
        frame.render_widget(Paragraph::new(lines), area);
        return;
    }
    bars.sort_by(|a, b| b.total.cmp(&a.total));

    let label_width = bars
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(8)
        .min(20);
    let bar_width = area.width.saturating_sub(label_width as u16 + 14);
    let max_total = bars.iter().map(|b| b.total).max().unwrap_or(0);
    let color_of = |dept: &str| -> Color {
        departments
            .iter()
            .position(|d| d == dept)
            .map(series_color)
            .unwrap_or(Color::Gray)
    };

    let capacity = area.height.saturating_sub(1) as usize;
    let hidden = bars.len().saturating_sub(capacity);
    let shown = if hidden > 0 { capacity.saturating_sub(1) } else { bars.len() };
    for bar in bars.iter().take(shown) {
        lines.push(tui::stacked_bar_line(bar, label_width, max_total, bar_width, &color_of));
    }
    if hidden > 0 {
        lines.push(Line::from(Span::styled(
            format!(" +{} more", bars.len() - shown),
            FOOTER_STYLE,
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;

    fn store() -> RowStore {
        let raw = [
            ("2022-07-01", "A"),
            ("2022-08-15", "B"),
            ("2022-09-30", "A"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (date, dept))| RawRow {
            line: i as u64 + 2,
            id: Some(i.to_string()),
            purchase_date: Some(date.to_string()),
            department: Some(dept.to_string()),
            item_name: Some("Pen".into()),
            unit_price: Some("100".into()),
            quantity: Some("1".into()),
            amount: Some("100".into()),
        })
        .collect();
        RowStore::build(raw).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn expect_filter(action: DetailAction) -> FilterState {
        match action {
            DetailAction::Filter(f) => f,
            _ => panic!("expected a filter change"),
        }
    }

    #[test]
    fn test_start_moves_by_day_and_month() {
        let s = store();
        let f = FilterState::default_for(&s);
        let mut panel = DetailPanel::new();

        let next = expect_filter(panel.handle_key(KeyCode::Right, &f, &s));
        assert_eq!(next.start, d(2022, 7, 2));
        assert_eq!(next.end, f.end);

        let next = expect_filter(panel.handle_key(KeyCode::Up, &next, &s));
        assert_eq!(next.start, d(2022, 8, 2));
    }

    #[test]
    fn test_dates_clamp_to_extent() {
        let s = store();
        let f = FilterState::default_for(&s);
        let mut panel = DetailPanel::new();
        // Already at the minimum; moving earlier is a no-op.
        assert!(matches!(panel.handle_key(KeyCode::Left, &f, &s), DetailAction::Continue));

        panel.handle_key(KeyCode::Tab, &f, &s);
        assert_eq!(panel.focus(), Focus::End);
        let next = expect_filter(panel.handle_key(KeyCode::Down, &f, &s));
        assert_eq!(next.end, d(2022, 8, 30));
        let back = expect_filter(panel.handle_key(KeyCode::End, &next, &s));
        assert_eq!(back.end, d(2022, 9, 30));
    }

    #[test]
    fn test_end_before_start_pulls_start() {
        let s = store();
        let f = FilterState::default_for(&s).with_range(d(2022, 8, 1), d(2022, 8, 1));
        let mut panel = DetailPanel::new();
        panel.handle_key(KeyCode::Tab, &f, &s);
        let next = expect_filter(panel.handle_key(KeyCode::Left, &f, &s));
        assert_eq!(next.start, d(2022, 7, 31));
        assert_eq!(next.end, d(2022, 7, 31));
    }

    #[test]
    fn test_department_toggle_and_bulk() {
        let s = store();
        let f = FilterState::default_for(&s);
        let mut panel = DetailPanel::new();
        panel.handle_key(KeyCode::BackTab, &f, &s);
        panel.handle_key(KeyCode::BackTab, &f, &s);
        assert_eq!(panel.focus(), Focus::Departments);

        panel.handle_key(KeyCode::Down, &f, &s);
        let without_b = expect_filter(panel.handle_key(KeyCode::Char(' '), &f, &s));
        assert!(!without_b.departments.contains("B"));
        assert!(without_b.departments.contains("A"));

        let none = expect_filter(panel.handle_key(KeyCode::Char('n'), &without_b, &s));
        assert!(none.departments.is_empty());
        let all = expect_filter(panel.handle_key(KeyCode::Char('a'), &none, &s));
        assert_eq!(all, f);
    }

    #[test]
    fn test_close_keys() {
        let s = store();
        let f = FilterState::default_for(&s);
        let mut panel = DetailPanel::new();
        assert!(matches!(panel.handle_key(KeyCode::Esc, &f, &s), DetailAction::Close));
        assert!(matches!(panel.handle_key(KeyCode::Char('d'), &f, &s), DetailAction::Close));
    }

    #[test]
    fn test_table_scroll_and_reset() {
        let s = store();
        let f = FilterState::default_for(&s);
        let mut panel = DetailPanel::new();
        for _ in 0..3 {
            panel.handle_key(KeyCode::Tab, &f, &s);
        }
        assert_eq!(panel.focus(), Focus::Table);
        panel.handle_key(KeyCode::PageDown, &f, &s);
        assert_eq!(panel.selected, PAGE_SIZE);
        panel.reset_cursors(3, 2);
        assert_eq!(panel.selected, 2);
    }
}
