use crate::error::Result;
use crate::fmt::{month_name, number, yen};
use crate::ledger;
use crate::settings::{settings_file_exists, settings_path};

use super::{resolve_source, SourceArgs};

pub fn run(args: SourceArgs) -> Result<()> {
    let source = resolve_source(args);

    let settings_note = if settings_file_exists() { "" } else { " (not saved, using defaults)" };
    println!("Settings:     {}{settings_note}", settings_path().display());
    println!("Ledger:       {}", source.path.display());
    println!(
        "Period:       {} {}",
        month_name(source.period.month),
        source.period.year
    );
    println!(
        "Views:        top {} items, latest {} purchases",
        source.options.top_n, source.options.recent_count
    );

    if !source.path.exists() {
        println!();
        println!("Ledger file not found. Run `bihin init --file <path>` or `bihin demo`.");
        return Ok(());
    }

    let store = ledger::load(&source.path)?;
    let total: i64 = store.rows().iter().map(|r| r.amount).sum();
    println!();
    println!("Rows:         {}", number(store.len() as i64));
    println!("Skipped:      {}", number(store.dropped() as i64));
    println!("Total spend:  {}", yen(total));
    match store.date_extent() {
        Some((min, max)) => println!("Dates:        {} to {}", min.format("%Y-%m-%d"), max.format("%Y-%m-%d")),
        None => println!("Dates:        (none)"),
    }
    if store.is_empty() {
        println!("Departments:  (none)");
    } else {
        println!("Departments:  {}", store.departments().join(", "));
    }
    Ok(())
}
