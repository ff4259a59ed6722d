use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Datelike, Local};

use crate::filter::FilterState;
use crate::ledger::RowStore;
use crate::models::TransactionRow;

// ---------------------------------------------------------------------------
// Period metrics
// ---------------------------------------------------------------------------

/// The year/month the headline metrics are reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodMetrics {
    pub year_occasion_count: usize,
    pub year_amount_total: i64,
    pub month_occasion_count: usize,
    pub month_amount_total: i64,
}

/// Occasion counts and spend for `year`, and for `month`.
///
/// The month figures match on month number across every year in the data,
/// not only `year`.
pub fn period_metrics(rows: &[TransactionRow], year: i32, month: u32) -> PeriodMetrics {
    let (year_occasion_count, year_amount_total) =
        occasions_and_total(rows.iter().filter(|r| r.purchase_date.year() == year));
    let (month_occasion_count, month_amount_total) =
        occasions_and_total(rows.iter().filter(|r| r.purchase_date.month() == month));
    PeriodMetrics {
        year_occasion_count,
        year_amount_total,
        month_occasion_count,
        month_amount_total,
    }
}

fn occasions_and_total<'a>(rows: impl Iterator<Item = &'a TransactionRow>) -> (usize, i64) {
    let mut keys = HashSet::new();
    let mut total = 0i64;
    for row in rows {
        keys.insert(row.day_dept_key.as_str());
        total += row.amount;
    }
    (keys.len(), total)
}

// ---------------------------------------------------------------------------
// Top items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTotal {
    pub item_name: String,
    /// Sum of line-item unit prices, not a per-unit price.
    pub unit_price: i64,
    pub quantity: i64,
    pub amount: i64,
}

/// Items ranked by total quantity, largest first. Ties keep the order in
/// which items first appear.
pub fn top_items(rows: &[TransactionRow], n: usize) -> Vec<ItemTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut items: Vec<ItemTotal> = Vec::new();
    for row in rows {
        let i = *index.entry(row.item_name.as_str()).or_insert_with(|| {
            items.push(ItemTotal {
                item_name: row.item_name.clone(),
                unit_price: 0,
                quantity: 0,
                amount: 0,
            });
            items.len() - 1
        });
        let item = &mut items[i];
        item.unit_price += row.unit_price;
        item.quantity += row.quantity;
        item.amount += row.amount;
    }
    // sort_by is stable
    items.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    items.truncate(n);
    items
}

// ---------------------------------------------------------------------------
// Grouped totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Department,
    Month,
    Item,
}

impl Dimension {
    pub fn key<'a>(&self, row: &'a TransactionRow) -> &'a str {
        match self {
            Self::Department => &row.department,
            Self::Month => &row.month,
            Self::Item => &row.item_name,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Department => "Department",
            Self::Month => "Month",
            Self::Item => "Item",
        }
    }

    /// Month labels compare numerically; everything else as text.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Month => match (a.parse::<u32>(), b.parse::<u32>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.cmp(b),
            },
            _ => a.cmp(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTotal {
    pub primary: String,
    pub secondary: String,
    pub unit_price_sum: i64,
    pub quantity_sum: i64,
    pub amount_sum: i64,
}

/// Sums per distinct (primary, secondary) pair present in `rows`, ordered by
/// primary then secondary key. Pairs with no rows are not emitted.
pub fn grouped_totals(
    rows: &[TransactionRow],
    primary: Dimension,
    secondary: Dimension,
) -> Vec<GroupTotal> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<GroupTotal> = Vec::new();
    for row in rows {
        let key = (primary.key(row), secondary.key(row));
        let i = *index.entry(key).or_insert_with(|| {
            groups.push(GroupTotal {
                primary: key.0.to_string(),
                secondary: key.1.to_string(),
                unit_price_sum: 0,
                quantity_sum: 0,
                amount_sum: 0,
            });
            groups.len() - 1
        });
        let g = &mut groups[i];
        g.unit_price_sum += row.unit_price;
        g.quantity_sum += row.quantity;
        g.amount_sum += row.amount;
    }
    groups.sort_by(|a, b| {
        primary
            .compare(&a.primary, &b.primary)
            .then_with(|| secondary.compare(&a.secondary, &b.secondary))
    });
    groups
}

/// One bar per primary key, split into segments per secondary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedBar {
    pub label: String,
    pub segments: Vec<(String, i64)>,
    pub total: i64,
}

/// Fold grouped totals (by amount) into stacked bars, keeping the input order
/// of primaries and of segments within each bar.
pub fn stack_by_primary(groups: &[GroupTotal]) -> Vec<StackedBar> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut bars: Vec<StackedBar> = Vec::new();
    for g in groups {
        let i = *index.entry(g.primary.as_str()).or_insert_with(|| {
            bars.push(StackedBar {
                label: g.primary.clone(),
                segments: Vec::new(),
                total: 0,
            });
            bars.len() - 1
        });
        bars[i].segments.push((g.secondary.clone(), g.amount_sum));
        bars[i].total += g.amount_sum;
    }
    bars
}

/// Distinct secondary keys in `groups`, sorted with the dimension's ordering.
pub fn secondary_keys(groups: &[GroupTotal], secondary: Dimension) -> Vec<String> {
    let mut keys: Vec<String> = groups
        .iter()
        .map(|g| g.secondary.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    keys.sort_by(|a, b| secondary.compare(a, b));
    keys
}

// ---------------------------------------------------------------------------
// Recent occasions
// ---------------------------------------------------------------------------

/// Every row belonging to the `k` greatest `date|department` keys, in source
/// order.
pub fn recent_occasions(rows: &[TransactionRow], k: usize) -> Vec<TransactionRow> {
    let keys: BTreeSet<&str> = rows.iter().map(|r| r.day_dept_key.as_str()).collect();
    let latest: HashSet<&str> = keys.into_iter().rev().take(k).collect();
    rows.iter()
        .filter(|r| latest.contains(r.day_dept_key.as_str()))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

pub fn filter_rows(rows: &[TransactionRow], filter: &FilterState) -> Vec<TransactionRow> {
    rows.iter().filter(|r| filter.contains(r)).cloned().collect()
}

// ---------------------------------------------------------------------------
// Full view recompute
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub top_n: usize,
    pub recent_count: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            recent_count: 3,
        }
    }
}

/// Everything the renderers display for one filter state.
#[derive(Debug, Clone, Default)]
pub struct Views {
    pub metrics: PeriodMetrics,
    pub top_items: Vec<ItemTotal>,
    pub dept_by_month: Vec<GroupTotal>,
    pub recent: Vec<TransactionRow>,
    pub month_by_dept: Vec<GroupTotal>,
    pub product_by_dept: Vec<GroupTotal>,
    pub detail: Vec<TransactionRow>,
    pub detail_amount_total: i64,
}

/// Recompute every view from scratch. The overview views use the whole
/// store; the product breakdown and detail table use only filtered rows.
pub fn compute_views(
    store: &RowStore,
    filter: &FilterState,
    period: Period,
    options: &ViewOptions,
) -> Views {
    let rows = store.rows();
    let detail = filter_rows(rows, filter);
    let detail_amount_total = detail.iter().map(|r| r.amount).sum();
    Views {
        metrics: period_metrics(rows, period.year, period.month),
        top_items: top_items(rows, options.top_n),
        dept_by_month: grouped_totals(rows, Dimension::Department, Dimension::Month),
        recent: recent_occasions(rows, options.recent_count),
        month_by_dept: grouped_totals(rows, Dimension::Month, Dimension::Department),
        product_by_dept: grouped_totals(&detail, Dimension::Item, Dimension::Department),
        detail,
        detail_amount_total,
    }
}
