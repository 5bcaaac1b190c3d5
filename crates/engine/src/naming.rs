//! Destination names and archive paths

use retention_core::RuleError;
use std::iter;
use std::path::Path;

/// Upper bound on candidate names tried for one move
pub const MAX_NAME_ATTEMPTS: usize = 1000;

/// Split a file name into base name and extension (without the dot)
///
/// Only the last extension is split off: `report.tar.gz` is `("report.tar", "gz")`.
/// Dot files have no extension.
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    let path = Path::new(name);
    let base = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .filter(|ext| !ext.is_empty());
    (base, ext)
}

fn dotted(ext: Option<&str>) -> String {
    ext.map(|e| format!(".{}", e)).unwrap_or_default()
}

/// Names tried inside `.trash`: `base.<stamp>.ext`, then `base.<stamp>.<n>.ext`
pub fn trash_candidates(name: &str, stamp: i64) -> impl Iterator<Item = String> {
    let (base, ext) = split_name(name);
    let base = base.to_string();
    let ext = dotted(ext);

    let first = format!("{}.{}{}", base, stamp, ext);
    iter::once(first).chain((1u64..).map(move |n| format!("{}.{}.{}{}", base, stamp, n, ext)))
}

/// Names tried in an archive folder: `name`, then `base (n).ext`
pub fn copy_candidates(name: &str) -> impl Iterator<Item = String> {
    let (base, ext) = split_name(name);
    let base = base.to_string();
    let ext = dotted(ext);

    iter::once(name.to_string()).chain((1u64..).map(move |n| format!("{} ({}){}", base, n, ext)))
}

/// Folder segments of a configured archive path, first segment hidden
///
/// Leading, trailing and repeated slashes are ignored. The first segment gets
/// a `.` prefix unless it already has one, so sync clients and mobile apps do
/// not show the archive. `.` and `..` segments are rejected.
pub fn hidden_destination(raw: &str) -> Result<Vec<String>, RuleError> {
    let mut segments = Vec::new();

    for part in raw.split('/').filter(|p| !p.is_empty()) {
        if part == "." || part == ".." {
            return Err(RuleError::InvalidDestination(raw.to_string()));
        }

        if segments.is_empty() && !part.starts_with('.') {
            segments.push(format!(".{}", part));
        } else {
            segments.push(part.to_string());
        }
    }

    Ok(segments)
}
