use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const FONT_HREF: &str =
    "https://fonts.googleapis.com/css2?family=Noto+Sans+JP:wght@400;700&amp;display=swap";

/// A page shaped like static-site output, with a Google Fonts link in `<head>`.
pub fn page_with_font_link(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Fixture</title>\n\
         <link rel=\"preconnect\" href=\"https://fonts.gstatic.com\" crossorigin>\n\
         <link href=\"{FONT_HREF}\" rel=\"stylesheet\">\n\
         <script type=\"module\" src=\"/_astro/page.js\"></script>\n\
         </head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

/// Same page without any web-font link.
pub fn page_without_font_link(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <link rel=\"stylesheet\" href=\"/_astro/site.css\">\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

/// `count` distinct CJK ideographs.
pub fn distinct_chars(count: usize) -> String {
    (0..count)
        .map(|offset| char::from_u32(0x4E00 + offset as u32).expect("CJK ideograph"))
        .collect()
}

/// Temporary build output directory.
pub struct Site {
    dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp site"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write fixture page");
        path
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("read page")
    }
}
