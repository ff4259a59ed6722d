use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::filter::FilterState;
use crate::fmt::{month_name, number, occasions, yen};
use crate::ledger::RowStore;
use crate::models::TransactionRow;
use crate::reports::{compute_views, Dimension, GroupTotal, ItemTotal, Period, PeriodMetrics, Views};

use super::{load_ledger, resolve_source, SourceArgs};

pub fn run(
    source: SourceArgs,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    departments: Vec<String>,
) -> Result<()> {
    let source = resolve_source(source);
    let store = load_ledger(&source.path)?;
    if store.dropped() > 0 {
        eprintln!(
            "{}",
            format!(
                "Skipped {} rows with blank fields.",
                number(store.dropped() as i64)
            )
            .yellow()
        );
    }

    let filter = detail_filter(&store, from_date, to_date, &departments);
    let views = compute_views(&store, &filter, source.period, &source.options);
    println!("{}", format_summary(&views, source.period, &filter, store.departments().len()));
    Ok(())
}

/// The default full-extent filter with any flag overrides applied.
pub fn detail_filter(
    store: &RowStore,
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    departments: &[String],
) -> FilterState {
    let mut filter = FilterState::default_for(store);
    if from_date.is_some() || to_date.is_some() {
        filter = filter.with_range(
            from_date.unwrap_or(filter.start),
            to_date.unwrap_or(filter.end),
        );
    }
    if !departments.is_empty() {
        filter = filter.with_departments(departments.iter().cloned());
    }
    filter
}

// ---------------------------------------------------------------------------
// Pure formatting functions (view data → String)
// ---------------------------------------------------------------------------

fn section(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn amount_cell(val: i64) -> Cell {
    Cell::new(yen(val)).set_alignment(CellAlignment::Right)
}

fn count_cell(val: i64) -> Cell {
    Cell::new(number(val)).set_alignment(CellAlignment::Right)
}

pub fn format_summary(
    views: &Views,
    period: Period,
    filter: &FilterState,
    total_departments: usize,
) -> String {
    let top_title = format!("Top {} items by quantity", views.top_items.len());
    let parts = [
        section(&format!("{} {}", month_name(period.month), period.year)),
        format_metrics(&views.metrics, period),
        section(&top_title),
        format_top_items(&views.top_items),
        section("Spend by department and month"),
        format_grouped(&views.dept_by_month, Dimension::Department, Dimension::Month),
        section("Latest purchases"),
        format_rows(&views.recent),
        section("Spend by month and department"),
        format_grouped(&views.month_by_dept, Dimension::Month, Dimension::Department),
        section(&format!("Detail: {}", filter.describe(total_departments))),
        format_grouped(&views.product_by_dept, Dimension::Item, Dimension::Department),
        format_rows(&views.detail),
        format!(
            "{} rows, {}",
            number(views.detail.len() as i64),
            yen(views.detail_amount_total)
        ),
    ];
    parts.join("\n\n")
}

pub fn format_metrics(m: &PeriodMetrics, period: Period) -> String {
    let month = month_name(period.month);
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![
        Cell::new(format!("Purchases in {}", period.year)),
        Cell::new(occasions(m.year_occasion_count)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new(format!("Spend in {}", period.year)), amount_cell(m.year_amount_total)]);
    table.add_row(vec![
        Cell::new(format!("Purchases in {month}")),
        Cell::new(occasions(m.month_occasion_count)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new(format!("Spend in {month}")), amount_cell(m.month_amount_total)]);
    table.to_string()
}

pub fn format_top_items(items: &[ItemTotal]) -> String {
    if items.is_empty() {
        return "(no data)".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Item", "Unit price (sum)", "Quantity", "Amount"]);
    for i in items {
        table.add_row(vec![
            Cell::new(&i.item_name),
            amount_cell(i.unit_price),
            count_cell(i.quantity),
            amount_cell(i.amount),
        ]);
    }
    table.to_string()
}

pub fn format_grouped(groups: &[GroupTotal], primary: Dimension, secondary: Dimension) -> String {
    if groups.is_empty() {
        return "(no data)".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec![
        primary.label(),
        secondary.label(),
        "Unit price (sum)",
        "Quantity",
        "Amount",
    ]);
    for g in groups {
        table.add_row(vec![
            Cell::new(&g.primary),
            Cell::new(&g.secondary),
            amount_cell(g.unit_price_sum),
            count_cell(g.quantity_sum),
            amount_cell(g.amount_sum),
        ]);
    }
    table.to_string()
}

pub fn format_rows(rows: &[TransactionRow]) -> String {
    if rows.is_empty() {
        return "(no data)".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "Department", "Item", "Unit price", "Quantity", "Amount"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(r.purchase_date.format("%Y-%m-%d")),
            Cell::new(&r.department),
            Cell::new(&r.item_name),
            amount_cell(r.unit_price),
            count_cell(r.quantity),
            amount_cell(r.amount),
        ]);
    }
    table.to_string()
}
