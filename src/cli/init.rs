use std::path::Path;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(
    file: &str,
    year: Option<i32>,
    month: Option<u32>,
    top: Option<usize>,
    recent: Option<usize>,
) -> Result<()> {
    let mut settings = load_settings();
    settings.csv_path = shellexpand_path(file);
    settings.period_year = year;
    settings.period_month = month;
    if let Some(n) = top {
        settings.top_n = n;
    }
    if let Some(k) = recent {
        settings.recent_count = k;
    }
    save_settings(&settings)?;

    println!("Saved settings to {}", settings_path().display());
    println!("Ledger: {}", settings.csv_path);
    if !Path::new(&settings.csv_path).exists() {
        println!("Note: that file does not exist yet.");
    }
    Ok(())
}
