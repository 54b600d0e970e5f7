//! Formats command implementation

use crate::cli::EXIT_OK;
use crate::core::exporters::{Capabilities, ExporterSet};
use crate::domain::ExportFormat;
use clap::Args;

/// Arguments for the formats command
#[derive(Args, Debug)]
pub struct FormatsArgs {
    /// Print the formats as a JSON array
    #[arg(long)]
    pub json: bool,
}

impl FormatsArgs {
    /// Execute the formats command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let formats = ExporterSet::new(Capabilities::detect()).supported_formats();

        if self.json {
            println!("{}", serde_json::to_string(&formats)?);
            return Ok(EXIT_OK);
        }

        println!("Supported export formats:");
        for format in ExportFormat::ALL {
            let marker = if formats.contains(&format) { "✅" } else { "❌" };
            println!("  {marker} {format} (.{})", format.extension());
        }
        Ok(EXIT_OK)
    }
}
