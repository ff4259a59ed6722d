use std::path::Path;

use chrono::{Datelike, Local, Months, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;

const DEPARTMENTS: &[&str] = &["General Affairs", "Sales", "Engineering", "Accounting"];

struct DemoItem {
    name: &'static str,
    unit_price: i64,
    max_quantity: i64,
}

const ITEMS: &[DemoItem] = &[
    DemoItem { name: "Ballpoint pen (black)", unit_price: 110, max_quantity: 20 },
    DemoItem { name: "A4 copy paper (500 sheets)", unit_price: 480, max_quantity: 10 },
    DemoItem { name: "Sticky notes", unit_price: 250, max_quantity: 12 },
    DemoItem { name: "Clear file folder", unit_price: 30, max_quantity: 50 },
    DemoItem { name: "Stapler", unit_price: 890, max_quantity: 2 },
    DemoItem { name: "Staples No.10", unit_price: 95, max_quantity: 10 },
    DemoItem { name: "Packing tape", unit_price: 320, max_quantity: 6 },
    DemoItem { name: "USB-C cable", unit_price: 1280, max_quantity: 3 },
    DemoItem { name: "Toner cartridge", unit_price: 8800, max_quantity: 1 },
    DemoItem { name: "Whiteboard marker", unit_price: 160, max_quantity: 8 },
    DemoItem { name: "Envelopes (100)", unit_price: 650, max_quantity: 3 },
    DemoItem { name: "Hand soap refill", unit_price: 540, max_quantity: 4 },
];

/// One generated ledger line (before writing).
#[derive(Debug, Clone, PartialEq)]
pub struct DemoRow {
    pub date: NaiveDate,
    pub department: &'static str,
    pub item: &'static str,
    pub unit_price: i64,
    pub quantity: i64,
}

impl DemoRow {
    pub fn amount(&self) -> i64 {
        self.unit_price * self.quantity
    }
}

/// Generate `months` months of purchases ending in the month of `end`.
/// Each month every department places zero to two orders of one to four
/// line items. Output is sorted by date.
pub fn generate_rows(end: NaiveDate, months: u32, seed: u64) -> Vec<DemoRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let first_of_end = end.with_day(1).unwrap_or(end);
    let mut rows = Vec::new();

    for back in (0..months).rev() {
        let Some(month_start) = first_of_end.checked_sub_months(Months::new(back)) else {
            continue;
        };
        let last_day = if back == 0 {
            end.day()
        } else {
            days_in_month(month_start)
        };
        for dept in DEPARTMENTS {
            let orders = rng.gen_range(0..=2);
            for _ in 0..orders {
                let day = rng.gen_range(1..=last_day);
                let date = month_start.with_day(day).unwrap_or(month_start);
                let lines = rng.gen_range(1..=4);
                for _ in 0..lines {
                    let item = &ITEMS[rng.gen_range(0..ITEMS.len())];
                    rows.push(DemoRow {
                        date,
                        department: *dept,
                        item: item.name,
                        unit_price: item.unit_price,
                        quantity: rng.gen_range(1..=item.max_quantity),
                    });
                }
            }
        }
    }
    rows.sort_by_key(|r| r.date);
    rows
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Write rows using the ledger's native (Japanese) header.
pub fn write_csv(path: &Path, rows: &[DemoRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["No.", "購入日", "部署", "品名", "単価", "数量", "金額"])?;
    for (i, r) in rows.iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            r.date.format("%Y/%m/%d").to_string(),
            r.department.to_string(),
            r.item.to_string(),
            r.unit_price.to_string(),
            r.quantity.to_string(),
            r.amount().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(output: &str, seed: u64) -> Result<()> {
    let path = Path::new(output);
    let rows = generate_rows(Local::now().date_naive(), 12, seed);
    write_csv(path, &rows)?;
    println!("Wrote {} purchases to {}", rows.len(), path.display());
    println!("Open it with: bihin dash --file {}", path.display());
    Ok(())
}
