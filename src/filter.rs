use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};

use crate::ledger::RowStore;
use crate::models::TransactionRow;

/// The user-controlled window over the ledger: an inclusive date range and a
/// department selection. Never mutated in place; every control change builds a
/// new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub departments: BTreeSet<String>,
}

impl FilterState {
    /// Full extent of the store with every department selected.
    pub fn default_for(store: &RowStore) -> Self {
        let (start, end) = store.date_extent().unwrap_or_else(|| {
            let today = Local::now().date_naive();
            (today, today)
        });
        Self {
            start,
            end,
            departments: store.departments().into_iter().collect(),
        }
    }

    pub fn contains(&self, row: &TransactionRow) -> bool {
        self.start <= row.purchase_date
            && row.purchase_date <= self.end
            && self.departments.contains(&row.department)
    }

    /// Replace both bounds. Reversed bounds are swapped.
    pub fn with_range(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start,
            end,
            departments: self.departments.clone(),
        }
    }

    /// Move the start bound; the end follows if it would fall behind.
    pub fn with_start(&self, start: NaiveDate) -> Self {
        Self {
            start,
            end: self.end.max(start),
            departments: self.departments.clone(),
        }
    }

    /// Move the end bound; the start follows if it would pass it.
    pub fn with_end(&self, end: NaiveDate) -> Self {
        Self {
            start: self.start.min(end),
            end,
            departments: self.departments.clone(),
        }
    }

    pub fn with_departments<I, S>(&self, departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            start: self.start,
            end: self.end,
            departments: departments.into_iter().map(Into::into).collect(),
        }
    }

    /// Flip membership of a single department.
    pub fn toggled(&self, department: &str) -> Self {
        let mut departments = self.departments.clone();
        if !departments.remove(department) {
            departments.insert(department.to_string());
        }
        Self {
            start: self.start,
            end: self.end,
            departments,
        }
    }

    pub fn with_all_departments(&self, store: &RowStore) -> Self {
        self.with_departments(store.departments())
    }

    /// The filter to use after `old` was replaced by `new`. The state is kept
    /// when the extent and department list are unchanged; otherwise it resets
    /// to the full default so new rows are not hidden.
    pub fn refit(&self, old: &RowStore, new: &RowStore) -> Self {
        let same_departments = old.departments().into_iter().collect::<BTreeSet<_>>()
            == new.departments().into_iter().collect::<BTreeSet<_>>();
        if old.date_extent() == new.date_extent() && same_departments {
            self.clone()
        } else {
            Self::default_for(new)
        }
    }

    pub fn describe(&self, total_departments: usize) -> String {
        format!(
            "{} to {}, {}/{} departments",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d"),
            self.departments.len(),
            total_departments
        )
    }
}
