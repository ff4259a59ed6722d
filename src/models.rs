use chrono::{Datelike, NaiveDate};

/// One validated purchase line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    pub id: String,
    pub purchase_date: NaiveDate,
    pub department: String,
    pub item_name: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub amount: i64,
    /// Month number without zero padding ("1".."12").
    pub month: String,
    /// `YYYY-MM-DD|department`; one value per purchase occasion.
    pub day_dept_key: String,
}

impl TransactionRow {
    pub fn new(
        id: String,
        purchase_date: NaiveDate,
        department: String,
        item_name: String,
        unit_price: i64,
        quantity: i64,
        amount: i64,
    ) -> Self {
        let month = purchase_date.month().to_string();
        let day_dept_key = occasion_key(purchase_date, &department);
        Self {
            id,
            purchase_date,
            department,
            item_name,
            unit_price,
            quantity,
            amount,
            month,
            day_dept_key,
        }
    }
}

pub const OCCASION_SEPARATOR: char = '|';

pub fn occasion_key(date: NaiveDate, department: &str) -> String {
    format!("{}{OCCASION_SEPARATOR}{department}", date.format("%Y-%m-%d"))
}

/// Intermediate representation from the CSV reader before validation.
/// A blank cell is `None`.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based line in the source file (header is line 1).
    pub line: u64,
    pub id: Option<String>,
    pub purchase_date: Option<String>,
    pub department: Option<String>,
    pub item_name: Option<String>,
    pub unit_price: Option<String>,
    pub quantity: Option<String>,
    pub amount: Option<String>,
}
