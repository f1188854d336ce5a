//! Discovery of saved model names from checkpoint metadata files.

use crate::error::TrialkitError;
use globset::GlobBuilder;
use std::path::Path;

/// Suffix of the metadata file written next to every checkpoint.
pub const CHECKPOINT_META_SUFFIX: &str = ".ckpt.meta";

/// List save names in `data_dir` whose `<name>.ckpt.meta` file matches
/// `pattern` (shell glob syntax). Names come back sorted.
pub fn valid_save_names(data_dir: &Path, pattern: &str) -> Result<Vec<String>, TrialkitError> {
    let matcher = GlobBuilder::new(&format!("{pattern}{CHECKPOINT_META_SUFFIX}"))
        .build()
        .map_err(|e| TrialkitError::pattern(e.to_string()))?
        .compile_matcher();

    let mut names = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !matcher.is_match(file_name) {
            continue;
        }
        if let Some(name) = file_name.strip_suffix(CHECKPOINT_META_SUFFIX) {
            names.push(name.to_string());
        }
    }
    names.sort();

    tracing::debug!(
        dir = %data_dir.display(),
        pattern,
        matches = names.len(),
        "listed save names"
    );
    Ok(names)
}
