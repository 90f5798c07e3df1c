//! Case discovery
//!
//! A case exists for every regular file in the case directory whose name ends
//! with the source suffix. The case name is the file name with that suffix
//! stripped once from the end; everything before it, dots included, is kept.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;

use super::error::{HarnessError, HarnessResult};

/// Base name shared by every artifact of one case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseName(String);

impl CaseName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive a case name from a file name by removing one trailing `suffix`.
///
/// Returns `None` when the file does not end with the suffix, or when nothing
/// would be left of it (a file named exactly `.mat`). Dots inside the base
/// name survive: `"v1.2.mat"` becomes `"v1.2"`.
pub fn case_name(file_name: &str, suffix: &str) -> Option<CaseName> {
    let base = file_name.strip_suffix(suffix)?;
    if base.is_empty() {
        return None;
    }
    Some(CaseName(base.to_string()))
}

/// Find every case in `dir`, sorted ascending and without duplicates.
///
/// Subdirectories are not descended into. Entries whose names are not valid
/// UTF-8 are skipped.
pub fn discover_cases(dir: &Path, source_suffix: &str) -> HarnessResult<Vec<CaseName>> {
    if !dir.is_dir() {
        return Err(HarnessError::MissingCaseDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| HarnessError::artifact(dir, e))?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::artifact(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::debug!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        if let Some(name) = case_name(file_name, source_suffix) {
            names.insert(name);
        }
    }

    Ok(names.into_iter().collect())
}
