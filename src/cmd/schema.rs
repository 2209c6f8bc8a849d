//! Schema command - print the expected ledger export format

use crate::ledger::LedgerSnapshot;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = schema_for!(LedgerSnapshot);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
