//! Build output routes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix a route's output path must end with to be processed.
pub const HTML_SUFFIX: &str = ".html";

/// One artifact emitted by a static-site build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    output_path: Option<PathBuf>,
}

impl Route {
    /// Route whose output was written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: Some(path.into()),
        }
    }

    /// Route that did not emit a file (redirects, API endpoints, ...).
    pub fn without_output() -> Self {
        Self { output_path: None }
    }

    /// Where the build wrote this route, if anywhere.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Output path, only when it names an HTML page.
    pub fn html_path(&self) -> Option<&Path> {
        self.output_path().filter(|path| is_html_path(path))
    }
}

impl From<PathBuf> for Route {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Whether `path` ends with [`HTML_SUFFIX`]. The comparison is on raw bytes
/// and case-sensitive.
pub fn is_html_path(path: &Path) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .ends_with(HTML_SUFFIX.as_bytes())
}

/// Every regular file under `root`, recursively, as a route, sorted by path.
///
/// Non-HTML files are included; the driver skips them.
pub fn discover_routes(root: &Path) -> io::Result<Vec<Route>> {
    let mut files = Vec::with_capacity(64);
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files.into_iter().map(Route::new).collect())
}
