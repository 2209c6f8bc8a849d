use clap::{Parser, Subcommand};

mod cmd;
mod core;
mod ledger;

/// Build calendar-year Bitcoin tax report data from a ledger export
#[derive(Parser, Debug)]
#[command(name = "btctax", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full report dataset as JSON (or one section as CSV)
    Report(cmd::report::ReportCommand),
    /// Year totals and holdings as tables
    Summary(cmd::summary::SummaryCommand),
    /// JSON Schema of the ledger export
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(report) => report.exec(),
        Command::Summary(summary) => summary.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
