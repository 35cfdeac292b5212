//! Safety checks for report output paths.
//!
//! The report is written next to the source tables more often than not;
//! these checks stop a typo from overwriting an input CSV.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that a report output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.json` extension
/// - Output cannot be the same file as any of the provided source paths
pub fn validate_output_path(output: &Path, source_paths: &[&Path]) -> Result<()> {
    let is_json = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: report output '{}' must have a .json extension",
            output.display()
        );
    }

    for source in source_paths {
        if same_file(output, source) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as source '{}'",
                output.display(),
                source.display()
            );
        }
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
