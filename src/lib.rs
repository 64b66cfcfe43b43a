//! Trim web-font requests in built HTML pages to the glyphs each page uses.
//!
//! After a static-site build, every emitted HTML page is scanned for the
//! characters of its visible body text. The page's web-font stylesheet link
//! (Google Fonts `css2` by default) is then rewritten to carry a `text=`
//! filter so the font host serves only those glyphs.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use webfont_trim::{discover_routes, process_routes, TrimOptions};
//!
//! # fn example() -> std::io::Result<()> {
//! let routes = discover_routes(Path::new("dist"))?;
//! let report = process_routes(&routes, &TrimOptions::default());
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod driver;
pub mod error;
pub mod extract;
pub mod markup;
pub mod options;
pub mod rewrite;
pub mod routes;

#[cfg(feature = "async")]
pub use driver::{process_route_async, process_routes_async};
pub use driver::{
    process_route, process_routes, transform_page, PageOutcome, PageTransform, RouteReport,
    TrimReport,
};
pub use error::{ErrorPhase, TrimError};
pub use extract::{
    body_text, body_text_with, encode_uri_component, extract, is_stripped_whitespace,
    CharacterSet, ExtractedText,
};
pub use markup::{HtmlDocument, StartTag};
pub use options::{
    TrimOptions, DEFAULT_FONT_HREF_PATTERN, DEFAULT_MAX_UNIQUE_CHARS, DEFAULT_TEXT_PARAM,
};
pub use rewrite::{apply_text_filter, find_font_link, rewrite_font_link};
pub use routes::{discover_routes, is_html_path, Route, HTML_SUFFIX};
