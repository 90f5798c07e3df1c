//! Golden-output comparison
//!
//! Output and reference are handled as raw bytes end to end. Nothing
//! normalizes line endings, so `"3\n"` and `"3\r\n"` are different results on
//! every platform.

use std::fs;
use std::path::Path;

use super::error::{HarnessError, HarnessResult};

/// Persist `actual` to `output_path` (replacing any previous run's file) and
/// report whether it is byte-identical to the contents of `reference_path`.
///
/// The output artifact is written before the reference is read, so it exists
/// for inspection even when the reference is missing.
pub fn write_and_compare(actual: &[u8], output_path: &Path, reference_path: &Path) -> HarnessResult<bool> {
    fs::write(output_path, actual).map_err(|e| HarnessError::artifact(output_path, e))?;
    let expected = fs::read(reference_path).map_err(|e| HarnessError::artifact(reference_path, e))?;
    Ok(outputs_match(actual, &expected))
}

/// Exact byte equality. No trimming, no tolerance.
pub fn outputs_match(actual: &[u8], expected: &[u8]) -> bool {
    actual == expected
}
