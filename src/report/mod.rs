pub mod json;
pub mod junit;

use anyhow::Result;
use std::path::Path;

use crate::runner::state::RunReport;

/// Re-render a saved results file in the requested format.
pub async fn generate_report(
    results_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let raw = std::fs::read_to_string(results_path)?;
    let report: RunReport = serde_json::from_str(&raw)?;

    match format {
        "json" => json::generate(&report, output).await,
        "junit" => junit::generate(&report, output).await,
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}
