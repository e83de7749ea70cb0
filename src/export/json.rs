use std::path::Path;

use serde::Serialize;

use crate::models::match_result::MatchResult;
use crate::models::scan_result::ScanResult;

#[derive(Serialize)]
struct Report<'a> {
    scan: &'a ScanResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<&'a [Vec<MatchResult>]>,
}

/// Writes the scan result, and the per-game matches when given (indexed like
/// `result.games`), as pretty JSON.
pub fn export_json(
    result: &ScanResult,
    matches: Option<&[Vec<MatchResult>]>,
    output_path: &Path,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&Report {
        scan: result,
        matches,
    })?;
    std::fs::write(output_path, json)?;
    Ok(())
}
