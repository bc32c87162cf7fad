use anyhow::Result;
use std::path::Path;

use crate::runner::state::RunReport;

/// Pretty-print the run report as JSON, to a file or stdout.
pub async fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output {
        std::fs::write(path, json)?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}
