mod cli;
mod detail;
mod error;
mod filter;
mod fmt;
mod importer;
mod ledger;
mod models;
mod reports;
mod settings;
mod tui;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::dashboard::run(cli::SourceArgs::default()),
        Some(Commands::Dash { source }) => cli::dashboard::run(source),
        Some(Commands::Summary {
            source,
            from_date,
            to_date,
            departments,
        }) => cli::summary::run(source, from_date, to_date, departments),
        Some(Commands::Init {
            file,
            year,
            month,
            top,
            recent,
        }) => cli::init::run(&file, year, month, top, recent),
        Some(Commands::Demo { output, seed }) => cli::demo::run(&output, seed),
        Some(Commands::Status { source }) => cli::status::run(source),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
