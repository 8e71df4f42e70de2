use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Descriptions of the nearest directory, walking up from `start`, that
/// directly contains at least one description file. Empty when no ancestor
/// does.
pub fn nearest_descriptions(
    dir_descriptions: &HashMap<PathBuf, Vec<PathBuf>>,
    start: &Path,
) -> Vec<PathBuf> {
    start
        .ancestors()
        .find_map(|dir| dir_descriptions.get(dir).filter(|paths| !paths.is_empty()))
        .cloned()
        .unwrap_or_default()
}
