// Artifacts - Naming for screenshots and other files a test run leaves behind

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Screenshot file name: `<test>_<YYYYMMDD-HHMMSS>[_<step>].png`.
///
/// Test and step names are sanitized so the result is a single portable path
/// component.
pub fn screenshot_file_name(test: &str, step: Option<&str>, at: DateTime<Local>) -> String {
    let stamp = at.format("%Y%m%d-%H%M%S");
    match step.filter(|s| !s.trim().is_empty()).map(sanitize) {
        Some(step) => format!("{}_{stamp}_{step}.png", sanitize(test)),
        None => format!("{}_{stamp}.png", sanitize(test)),
    }
}

/// Path for a screenshot taken now, under `dir`.
pub fn screenshot_path(dir: &Path, test: &str, step: Option<&str>) -> PathBuf {
    dir.join(screenshot_file_name(test, step, Local::now()))
}

/// Replaces anything outside `[A-Za-z0-9._-]` with `_` and collapses runs.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let keep = c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_');
        if keep {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() { "unnamed".to_string() } else { out }
}
