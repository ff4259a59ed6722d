pub mod dashboard;
pub mod demo;
pub mod init;
pub mod status;
pub mod summary;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::error::{BihinError, Result};
use crate::ledger::{self, RowStore};
use crate::reports::{Period, ViewOptions};
use crate::settings::{load_settings, shellexpand_path};

#[derive(Parser)]
#[command(name = "bihin", about = "Dashboard for office supply purchase history.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the ledger comes from and which period the headline metrics cover.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Ledger CSV (default: the path saved by `bihin init`)
    #[arg(long, short = 'f')]
    pub file: Option<String>,
    /// Year for the yearly metrics (default: current year)
    #[arg(long)]
    pub year: Option<i32>,
    /// Month number for the monthly metrics (default: current month)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (the default).
    Dash {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print every dashboard view as plain tables.
    Summary {
        #[command(flatten)]
        source: SourceArgs,
        /// Detail window start: YYYY-MM-DD (default: first purchase)
        #[arg(long = "from", value_parser = parse_date_arg)]
        from_date: Option<NaiveDate>,
        /// Detail window end: YYYY-MM-DD (default: last purchase)
        #[arg(long = "to", value_parser = parse_date_arg)]
        to_date: Option<NaiveDate>,
        /// Department to include in the detail window (repeatable; default: all)
        #[arg(long = "dept")]
        departments: Vec<String>,
    },
    /// Remember a ledger file and default period.
    Init {
        /// Path to the ledger CSV
        #[arg(long, short = 'f')]
        file: String,
        /// Pin the metrics year instead of following the calendar
        #[arg(long)]
        year: Option<i32>,
        /// Pin the metrics month instead of following the calendar
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
        /// Rows in the top-items table
        #[arg(long)]
        top: Option<usize>,
        /// Purchase occasions in the recent table
        #[arg(long)]
        recent: Option<usize>,
    },
    /// Write a sample ledger to explore the dashboard with.
    Demo {
        /// Output path
        #[arg(long, short = 'o', default_value = "purchases-demo.csv")]
        output: String,
        /// Random seed for the generated purchases
        #[arg(long, default_value = "42")]
        seed: u64,
    },
    /// Show settings and a summary of the ledger.
    Status {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// A fully resolved ledger source: flags first, then settings, then defaults.
pub(crate) struct Source {
    pub path: PathBuf,
    pub period: Period,
    pub options: ViewOptions,
}

pub(crate) fn resolve_source(args: SourceArgs) -> Source {
    let settings = load_settings();
    let current = Period::current();
    let file = args.file.unwrap_or(settings.csv_path);
    Source {
        path: PathBuf::from(shellexpand_path(&file)),
        period: Period {
            year: args.year.or(settings.period_year).unwrap_or(current.year),
            month: args
                .month
                .or(settings.period_month)
                .filter(|m| (1..=12).contains(m))
                .unwrap_or(current.month),
        },
        options: ViewOptions {
            top_n: settings.top_n,
            recent_count: settings.recent_count,
        },
    }
}

pub(crate) fn load_ledger(path: &Path) -> Result<RowStore> {
    if !path.exists() {
        return Err(BihinError::Other(format!(
            "Ledger file not found: {} (pass --file, run `bihin init --file <path>`, or try `bihin demo`)",
            path.display()
        )));
    }
    ledger::load(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(
            parse_date_arg("2022-09-01").unwrap(),
            NaiveDate::from_ymd_opt(2022, 9, 1).unwrap()
        );
        assert!(parse_date_arg("09/01/2022").is_err());
    }

    #[test]
    fn test_cli_parses_summary_flags() {
        let cli = Cli::try_parse_from([
            "bihin", "summary", "--file", "x.csv", "--year", "2022", "--month", "9",
            "--from", "2022-08-01", "--dept", "Sales", "--dept", "Admin",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Summary { source, from_date, to_date, departments }) => {
                assert_eq!(source.file.as_deref(), Some("x.csv"));
                assert_eq!(source.month, Some(9));
                assert_eq!(from_date, NaiveDate::from_ymd_opt(2022, 8, 1));
                assert!(to_date.is_none());
                assert_eq!(departments, vec!["Sales", "Admin"]);
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_month() {
        assert!(Cli::try_parse_from(["bihin", "dash", "--month", "13"]).is_err());
    }

    #[test]
    fn test_load_ledger_missing_file_explains() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_ledger(&dir.path().join("nope.csv")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Ledger file not found"));
        assert!(msg.contains("bihin demo"));
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["bihin"]).unwrap();
        assert!(cli.command.is_none());
    }
}
