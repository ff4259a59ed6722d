use std::path::PathBuf;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::detail::{DetailAction, DetailPanel};
use crate::error::Result;
use crate::filter::FilterState;
use crate::fmt::{month_name, number, occasions, yen, yen_compact};
use crate::ledger::{self, RowStore};
use crate::reports::{
    compute_views, secondary_keys, stack_by_primary, Dimension, Period, ViewOptions, Views,
};
use crate::tui::{
    self, fit, legend_line, series_color, FOOTER_STYLE, HEADER_STYLE, TITLE_STYLE,
};

use super::{load_ledger, resolve_source, SourceArgs};

enum Screen {
    Home,
    Detail,
}

pub struct Dashboard {
    source: PathBuf,
    store: RowStore,
    filter: FilterState,
    period: Period,
    options: ViewOptions,
    views: Views,
    screen: Screen,
    detail: DetailPanel,
    status_message: Option<String>,
}

impl Dashboard {
    pub fn new(source: PathBuf, store: RowStore, period: Period, options: ViewOptions) -> Self {
        let filter = FilterState::default_for(&store);
        let views = compute_views(&store, &filter, period, &options);
        let status_message = dropped_notice(&store);
        Self {
            source,
            store,
            filter,
            period,
            options,
            views,
            screen: Screen::Home,
            detail: DetailPanel::new(),
            status_message,
        }
    }

    #[cfg(test)]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[cfg(test)]
    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Replace the filter wholesale and recompute every view.
    pub fn apply_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.views = compute_views(&self.store, &self.filter, self.period, &self.options);
    }

    /// Re-read the source file. On failure the current data is kept and the
    /// error goes to the status line.
    pub fn reload(&mut self) {
        match ledger::load(&self.source) {
            Ok(store) => {
                let filter = self.filter.refit(&self.store, &store);
                let reset = filter != self.filter;
                self.store = store;
                self.apply_filter(filter);
                let mut message = dropped_notice(&self.store)
                    .unwrap_or_else(|| format!("Reloaded {} rows", number(self.store.len() as i64)));
                if reset {
                    message.push_str("; filters reset to the new data");
                }
                self.status_message = Some(message);
            }
            Err(e) => {
                self.status_message = Some(format!("Reload failed: {e}"));
            }
        }
    }

    /// Returns true when the dashboard should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match self.screen {
            Screen::Home => {
                self.status_message = None;
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => return true,
                    KeyCode::Char('d') | KeyCode::Tab | KeyCode::Enter => {
                        self.screen = Screen::Detail;
                    }
                    KeyCode::Char('r') => self.reload(),
                    _ => {}
                }
            }
            Screen::Detail => {
                if code == KeyCode::Char('r') {
                    self.reload();
                    return false;
                }
                match self.detail.handle_key(code, &self.filter, &self.store) {
                    DetailAction::Continue => {}
                    DetailAction::Close => self.screen = Screen::Home,
                    DetailAction::Filter(next) => {
                        self.status_message = None;
                        self.apply_filter(next);
                    }
                }
            }
        }
        false
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Home => self.draw_home(frame),
            Screen::Detail => self.detail.draw(
                frame,
                &self.store,
                &self.filter,
                &self.views,
                self.status_message.as_deref(),
            ),
        }
    }

    fn draw_home(&self, frame: &mut Frame) {
        let area = frame.area();

        let [header_area, sep1, metrics_area, sep2, middle_area, sep3, month_area, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Fill(3),
                Constraint::Length(1),
                Constraint::Fill(2),
                Constraint::Length(1),
            ])
            .areas(area);

        let file_name = self
            .source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(
                    format!(" {} {}", month_name(self.period.month), self.period.year),
                    HEADER_STYLE,
                ),
                Span::styled(format!("   {file_name}"), FOOTER_STYLE),
            ])),
            header_area,
        );

        let sep_widget =
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget.clone(), sep2);
        frame.render_widget(sep_widget, sep3);

        self.draw_metrics(frame, metrics_area);

        let [top_area, dept_area, recent_area] = Layout::horizontal([
            Constraint::Ratio(1, 5),
            Constraint::Ratio(2, 5),
            Constraint::Ratio(2, 5),
        ])
        .areas(middle_area);
        self.draw_top_items(frame, top_area);
        self.draw_department_chart(frame, dept_area);
        self.draw_recent(frame, recent_area);
        self.draw_month_chart(frame, month_area);

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                hints_area,
            );
        } else {
            frame.render_widget(
                Paragraph::new(" d/Tab=detail  r=reload  q=quit").style(FOOTER_STYLE),
                hints_area,
            );
        }
    }

    fn draw_metrics(&self, frame: &mut Frame, area: Rect) {
        let m = &self.views.metrics;
        let month = month_name(self.period.month);
        let cells = [
            (format!("Purchases in {}", self.period.year), occasions(m.year_occasion_count)),
            (format!("Spend in {}", self.period.year), yen(m.year_amount_total)),
            (format!("Purchases in {month}"), occasions(m.month_occasion_count)),
            (format!("Spend in {month}"), yen(m.month_amount_total)),
        ];
        let areas = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
        for ((label, value), cell_area) in cells.into_iter().zip(areas.iter()) {
            let lines = vec![
                Line::from(Span::styled(format!(" {label}"), FOOTER_STYLE)),
                Line::from(Span::styled(format!(" {value}"), TITLE_STYLE)),
            ];
            frame.render_widget(Paragraph::new(lines), *cell_area);
        }
    }

    fn draw_top_items(&self, frame: &mut Frame, area: Rect) {
        let [title_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" Top {} by quantity", self.options.top_n), TITLE_STYLE)),
            title_area,
        );
        if self.views.top_items.is_empty() {
            frame.render_widget(Paragraph::new(" (no data)").style(FOOTER_STYLE), table_area);
            return;
        }
        let rows: Vec<Row> = self
            .views
            .top_items
            .iter()
            .map(|i| {
                Row::new(vec![
                    Cell::from(format!(" {}", i.item_name)),
                    Cell::from(yen(i.unit_price)),
                    Cell::from(number(i.quantity)),
                    Cell::from(tui::yen_span(i.amount)),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Fill(1),
                Constraint::Length(11),
                Constraint::Length(5),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec![" Item", "Price (sum)", "Qty", "Amount"]).style(HEADER_STYLE))
        .column_spacing(1);
        frame.render_widget(table, table_area);
    }

    fn draw_department_chart(&self, frame: &mut Frame, area: Rect) {
        let months = secondary_keys(&self.views.dept_by_month, Dimension::Month);
        let mut lines = vec![
            Line::from(Span::styled(" Spend by department", TITLE_STYLE)),
            legend_line("month", &months, &month_color),
        ];
        let bars = stack_by_primary(&self.views.dept_by_month);
        if bars.is_empty() {
            lines.push(Line::from(Span::styled(" (no data)", FOOTER_STYLE)));
        } else {
            let label_width = bars
                .iter()
                .map(|b| b.label.chars().count())
                .max()
                .unwrap_or(8)
                .min(16);
            let bar_width = area.width.saturating_sub(label_width as u16 + 14);
            let max_total = bars.iter().map(|b| b.total).max().unwrap_or(0);
            for bar in &bars {
                lines.push(tui::stacked_bar_line(bar, label_width, max_total, bar_width, &month_color));
            }
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_recent(&self, frame: &mut Frame, area: Rect) {
        let [title_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" Latest {} purchases", self.options.recent_count),
                TITLE_STYLE,
            )),
            title_area,
        );
        if self.views.recent.is_empty() {
            frame.render_widget(Paragraph::new(" (no data)").style(FOOTER_STYLE), table_area);
            return;
        }
        let item_width = area.width.saturating_sub(10 + 10 + 8 + 4 + 9 + 6) as usize;
        let rows: Vec<Row> = self
            .views
            .recent
            .iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.purchase_date.format("%Y-%m-%d").to_string()),
                    Cell::from(fit(&r.department, 10)),
                    Cell::from(fit(&r.item_name, item_width.max(4))),
                    Cell::from(yen(r.unit_price)),
                    Cell::from(number(r.quantity)),
                    Cell::from(tui::yen_span(r.amount)),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Fill(1),
                Constraint::Length(8),
                Constraint::Length(4),
                Constraint::Length(9),
            ],
        )
        .header(Row::new(vec!["Date", "Department", "Item", "Price", "Qty", "Amount"]).style(HEADER_STYLE))
        .column_spacing(1);
        frame.render_widget(table, table_area);
    }

    fn draw_month_chart(&self, frame: &mut Frame, area: Rect) {
        let departments = self.store.departments();
        let dept_color = |d: &str| {
            departments
                .iter()
                .position(|x| x == d)
                .map(series_color)
                .unwrap_or(Color::Gray)
        };
        let [legend_area, chart_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(legend_line("Monthly spend by department:", &departments, &dept_color)),
            legend_area,
        );

        let months = stack_by_primary(&self.views.month_by_dept);
        if months.is_empty() {
            frame.render_widget(Paragraph::new(" (no data)").style(FOOTER_STYLE), chart_area);
            return;
        }

        let bars_per_group = departments.len().max(1) as u16;
        let groups_n = months.len() as u16;
        let usable = chart_area.width.saturating_sub(groups_n);
        let bar_width = (usable / (groups_n * bars_per_group).max(1)).clamp(1, 4);

        let groups: Vec<BarGroup> = months
            .iter()
            .map(|m| {
                let bars: Vec<Bar> = departments
                    .iter()
                    .map(|dept| {
                        let value = m
                            .segments
                            .iter()
                            .find(|(k, _)| k == dept)
                            .map(|(_, v)| (*v).max(0) as u64)
                            .unwrap_or(0);
                        Bar::default()
                            .value(value)
                            .text_value(String::new())
                            .style(Style::default().fg(dept_color(dept.as_str())))
                    })
                    .collect();
                BarGroup::default()
                    .label(Line::from(format!("{} ({})", m.label, yen_compact(m.total))))
                    .bars(&bars)
            })
            .collect();

        let mut chart = BarChart::default()
            .block(Block::default().borders(Borders::NONE))
            .bar_width(bar_width)
            .bar_gap(0)
            .group_gap(1);
        for group in &groups {
            chart = chart.data(group.clone());
        }
        frame.render_widget(chart, chart_area);
    }
}

fn month_color(month: &str) -> Color {
    month
        .parse::<usize>()
        .map(|m| series_color(m.saturating_sub(1)))
        .unwrap_or(Color::Gray)
}

fn dropped_notice(store: &RowStore) -> Option<String> {
    if store.dropped() == 0 {
        None
    } else {
        Some(format!(
            "{} rows with blank fields were skipped",
            number(store.dropped() as i64)
        ))
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

pub fn run(args: SourceArgs) -> Result<()> {
    let source = resolve_source(args);
    let store = load_ledger(&source.path)?;
    let mut dashboard = Dashboard::new(source.path, store, source.period, source.options);

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                if dashboard.handle_key(key.code) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LEDGER: &str = "No.,購入日,部署,品名,単価,数量,金額\n\
        1,2022/09/01,Sales,Pen,100,2,200\n\
        2,2022/09/01,Sales,Pen,100,1,100\n\
        3,2022/08/15,Admin,Pad,500,1,500\n\
        4,2022/07/20,Admin,Tape,80,3,240\n\
        5,,Admin,Tape,80,3,240\n";

    fn dashboard() -> (tempfile::TempDir, Dashboard) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, LEDGER).unwrap();
        let store = ledger::load(&path).unwrap();
        let dash = Dashboard::new(
            path,
            store,
            Period { year: 2022, month: 9 },
            ViewOptions::default(),
        );
        (dir, dash)
    }

    #[test]
    fn test_initial_views() {
        let (_dir, dash) = dashboard();
        let m = dash.views().metrics;
        assert_eq!(m.year_occasion_count, 3);
        assert_eq!(m.year_amount_total, 1040);
        assert_eq!(m.month_amount_total, 300);
        assert_eq!(dash.views().detail.len(), 4);
        assert!(dash.status_message.as_deref().unwrap().contains("1 rows"));
    }

    #[test]
    fn test_quit_from_home() {
        let (_dir, mut dash) = dashboard();
        assert!(!dash.handle_key(KeyCode::Char('x')));
        assert!(dash.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_detail_control_recomputes_views() {
        let (_dir, mut dash) = dashboard();
        dash.handle_key(KeyCode::Char('d'));
        assert!(matches!(dash.screen, Screen::Detail));

        // Start bound: 2022-07-20 -> 2022-08-20 drops the July row.
        assert!(!dash.handle_key(KeyCode::Up));
        assert_eq!(dash.filter().start, NaiveDate::from_ymd_opt(2022, 8, 20).unwrap());
        assert_eq!(dash.views().detail.len(), 2);
        assert_eq!(dash.views().detail_amount_total, 300);
        // Overview views are unaffected by the filter.
        assert_eq!(dash.views().top_items.len(), 3);

        // Esc returns home without quitting.
        assert!(!dash.handle_key(KeyCode::Esc));
        assert!(matches!(dash.screen, Screen::Home));
    }

    #[test]
    fn test_apply_filter_replaces_state() {
        let (_dir, mut dash) = dashboard();
        let next = dash.filter().with_departments(["Admin"]);
        dash.apply_filter(next.clone());
        assert_eq!(dash.filter(), &next);
        assert!(dash.views().detail.iter().all(|r| r.department == "Admin"));
        assert!(dash
            .views()
            .product_by_dept
            .iter()
            .all(|g| g.secondary == "Admin"));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let (_dir, mut dash) = dashboard();
        let extra = format!("{LEDGER}6,2022/09/02,Sales,Clip,10,5,50\n");
        std::fs::write(&dash.source, extra).unwrap();
        dash.handle_key(KeyCode::Char('r'));
        assert_eq!(dash.views().top_items[0].item_name, "Clip");
        // The extent grew, so the filter follows it and the new row is shown.
        assert_eq!(dash.filter().end, NaiveDate::from_ymd_opt(2022, 9, 2).unwrap());
        assert_eq!(dash.views().detail.len(), 5);
        assert!(dash.views().product_by_dept.iter().any(|g| g.primary == "Clip"));
        assert!(dash.status_message.as_deref().unwrap().contains("filters reset"));
    }

    #[test]
    fn test_reload_shows_new_department() {
        let (_dir, mut dash) = dashboard();
        let narrowed = dash.filter().with_departments(["Sales"]);
        dash.apply_filter(narrowed);
        let extra = format!("{LEDGER}6,2022/09/01,Legal,Stamp,300,1,300\n");
        std::fs::write(&dash.source, extra).unwrap();
        dash.reload();
        assert!(dash.filter().departments.contains("Legal"));
        assert!(dash.views().detail.iter().any(|r| r.department == "Legal"));
    }

    #[test]
    fn test_reload_keeps_filter_when_data_shape_is_unchanged() {
        let (_dir, mut dash) = dashboard();
        let narrowed = dash.filter().with_departments(["Admin"]);
        dash.apply_filter(narrowed.clone());
        let extra = format!("{LEDGER}6,2022/08/15,Admin,Pad,500,2,1000\n");
        std::fs::write(&dash.source, extra).unwrap();
        dash.reload();
        assert_eq!(dash.filter(), &narrowed);
        assert_eq!(dash.views().detail.len(), 3);
        assert!(!dash.status_message.as_deref().unwrap().contains("filters reset"));
    }

    #[test]
    fn test_reload_failure_keeps_data() {
        let (_dir, mut dash) = dashboard();
        std::fs::write(&dash.source, "No.,購入日,部署,品名,単価,数量,金額\n1,2022/09/01,A,Pen,x,1,1\n")
            .unwrap();
        dash.reload();
        assert_eq!(dash.views().detail.len(), 4);
        assert!(dash
            .status_message
            .as_deref()
            .unwrap()
            .starts_with("Reload failed"));
    }

    #[test]
    fn test_home_top_items_show_price_sum() {
        let (_dir, mut dash) = dashboard();
        let backend = ratatui::backend::TestBackend::new(200, 40);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| dash.draw(frame)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Price (sum)"));
        assert!(text.contains("Top 10 by quantity"));
    }

    #[test]
    fn test_month_color() {
        assert_eq!(month_color("1"), series_color(0));
        assert_eq!(month_color("x"), Color::Gray);
    }
}
