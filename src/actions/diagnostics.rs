use crate::core::BrowserDriver;
use chrono::Local;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static pattern"))
}

/// Reduce a label to characters safe in a file name.
pub fn sanitize_label(label: &str) -> String {
    let cleaned = unsafe_chars().replace_all(label.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "diagnostic".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes failure screenshots as `{label}_{YYYYMMDD_HHMMSS}.png`.
///
/// Capturing is best effort. A failed capture is logged and yields `None`;
/// it never replaces the failure being reported.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn capture<D: BrowserDriver>(&self, driver: &D, label: &str) -> Option<PathBuf> {
        let png = match driver.screenshot_png() {
            Ok(png) => png,
            Err(e) => {
                tracing::error!(label = %label, error = %e, "Failed to capture screenshot");
                return None;
            }
        };

        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::error!(dir = %self.dir.display(), error = %e, "Failed to create screenshot directory");
            return None;
        }

        let path = self.next_path(label);
        match fs::write(&path, png) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to write screenshot");
                None
            }
        }
    }

    // Two failures within the same second get `_2`, `_3`, ... suffixes.
    fn next_path(&self, label: &str) -> PathBuf {
        let stem = format!(
            "{}_{}",
            sanitize_label(label),
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let mut path = self.dir.join(format!("{}.png", stem));
        let mut n = 2;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.png", stem, n));
            n += 1;
        }
        path
    }
}
