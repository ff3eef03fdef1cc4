use std::path::Path;

use walkdir::WalkDir;

use crate::config::{FileFilter, SymGraphConfig};
use crate::errors::Result;

/// Scans the project root for files to export.
///
/// Hidden directories are skipped, the include/exclude patterns and the
/// maximum file size are applied, and the result is sorted so every run
/// visits files in the same order.
pub fn discover_files(
    project_root: &Path,
    config: &SymGraphConfig,
    filter: &FileFilter,
) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(project_root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
        })
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(project_root) else {
            continue;
        };
        let file_id = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");
        if !filter.is_included(&file_id) {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) if metadata.len() <= config.max_file_size => files.push(file_id),
            Ok(metadata) => {
                tracing::debug!(file = %file_id, size = metadata.len(), "skipping oversized file")
            }
            Err(e) => tracing::debug!(file = %file_id, error = %e, "skipping file without metadata"),
        }
    }
    files.sort();
    Ok(files)
}
