use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{BihinError, Result};
use crate::importer;
use crate::models::{RawRow, TransactionRow};

/// Upper bound for any price, quantity or amount cell. Keeps every sum over a
/// ledger far inside i64.
pub const MAX_COUNT: i64 = 1_000_000_000_000;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// The validated, immutable transaction table built once at startup.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    rows: Vec<TransactionRow>,
    dropped: usize,
}

impl RowStore {
    /// Validate raw rows: drop incomplete ones, coerce numerics and dates,
    /// derive the month and occasion key. Source order is kept.
    pub fn build(raw_rows: Vec<RawRow>) -> Result<Self> {
        let mut rows = Vec::with_capacity(raw_rows.len());
        let mut dropped = 0usize;

        for raw in raw_rows {
            let line = raw.line;
            let (
                Some(id),
                Some(date),
                Some(department),
                Some(item_name),
                Some(unit_price),
                Some(quantity),
                Some(amount),
            ) = (
                raw.id,
                raw.purchase_date,
                raw.department,
                raw.item_name,
                raw.unit_price,
                raw.quantity,
                raw.amount,
            )
            else {
                dropped += 1;
                continue;
            };

            let unit_price = parse_count(&unit_price, line, "unit_price")?;
            let quantity = parse_count(&quantity, line, "quantity")?;
            let amount = parse_count(&amount, line, "amount")?;
            let purchase_date = parse_purchase_date(&date, line)?;

            rows.push(TransactionRow::new(
                id,
                purchase_date,
                department,
                item_name,
                unit_price,
                quantity,
                amount,
            ));
        }

        Ok(Self { rows, dropped })
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows excluded during build because a required field was blank.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn date_extent(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.purchase_date).min()?;
        let max = self.rows.iter().map(|r| r.purchase_date).max()?;
        Some((min, max))
    }

    /// Distinct departments in first-encountered order.
    pub fn departments(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.department.as_str()))
            .map(|r| r.department.clone())
            .collect()
    }
}

pub fn load(file_path: &Path) -> Result<RowStore> {
    let raw = importer::read_csv(file_path)?;
    RowStore::build(raw)
}

// ---------------------------------------------------------------------------
// Coercion helpers
// ---------------------------------------------------------------------------

fn format_error(line: u64, column: &str, value: &str, reason: &str) -> BihinError {
    BihinError::DataFormat {
        line,
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a non-negative integer. A fractional part is truncated toward zero,
/// so "120.0" (how a spreadsheet export often writes integers) is accepted.
pub fn parse_count(raw: &str, line: u64, column: &str) -> Result<i64> {
    let s = raw.trim();
    let unsigned = s.strip_prefix('+').unwrap_or(s);
    if unsigned.starts_with('-') {
        return Err(format_error(line, column, raw, "negative value"));
    }
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    let digits_ok = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !digits_ok(int_part) || !digits_ok(frac_part) {
        return Err(format_error(line, column, raw, "not an integer"));
    }
    if int_part.is_empty() {
        return Ok(0);
    }
    let value = int_part
        .parse::<i64>()
        .map_err(|_| format_error(line, column, raw, "integer out of range"))?;
    if value > MAX_COUNT {
        return Err(format_error(line, column, raw, "integer out of range"));
    }
    Ok(value)
}

pub fn parse_purchase_date(raw: &str, line: u64) -> Result<NaiveDate> {
    let s = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format_error(line, "purchase_date", raw, "unrecognized date"))
}
