//! Per-route orchestration: read, extract, rewrite, write back.
//!
//! Routes are processed one after another. A failure on one page is logged
//! with its path and recorded in the [`TrimReport`]; it never stops the run.

use core::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TrimError;
use crate::extract::extract;
use crate::markup::HtmlDocument;
use crate::options::TrimOptions;
use crate::rewrite::rewrite_font_link;
use crate::routes::Route;

/// Terminal state of one route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageOutcome {
    /// No output file, or not an HTML page.
    SkippedNotHtml,
    /// Too many unique characters; the file was left untouched.
    SkippedTooLong {
        /// Unique characters found in the body.
        unique_chars: usize,
    },
    /// The page was rewritten and saved.
    Processed {
        /// Whether a font stylesheet link was found and rewritten.
        font_link_rewritten: bool,
        /// Unique characters found in the body.
        unique_chars: usize,
    },
    /// Processing failed. Pages are only written after every other step
    /// succeeded, so the file on disk is unmodified.
    Failed(TrimError),
}

/// In-memory result of transforming one page's HTML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageTransform {
    /// The character threshold was exceeded; nothing should be written.
    TooManyCharacters {
        /// Unique characters found in the body.
        unique_chars: usize,
    },
    /// The page is ready to be written back.
    Ready {
        /// Serialized page.
        html: String,
        /// Whether a font stylesheet link was rewritten.
        font_link_rewritten: bool,
        /// Unique characters found in the body.
        unique_chars: usize,
    },
}

/// Transform one page's HTML without touching the filesystem.
pub fn transform_page(html: &str, options: &TrimOptions) -> Result<PageTransform, TrimError> {
    let mut document = HtmlDocument::parse(html)?;
    let extracted = extract(document.source())?;
    let unique_chars = extracted.unique_count();
    if unique_chars > options.max_unique_chars {
        return Ok(PageTransform::TooManyCharacters { unique_chars });
    }

    let font_link_rewritten = rewrite_font_link(&mut document, &extracted.encoded, options)?;
    Ok(PageTransform::Ready {
        html: document.into_html(),
        font_link_rewritten,
        unique_chars,
    })
}

/// Outcome of one route in a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteReport {
    /// Output path of the route, if it had one.
    pub path: Option<PathBuf>,
    /// What happened to it.
    pub outcome: PageOutcome,
}

/// Outcomes of a whole run, in route order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrimReport {
    /// One entry per route.
    pub routes: Vec<RouteReport>,
}

impl TrimReport {
    fn push(&mut self, route: &Route, outcome: PageOutcome) {
        self.routes.push(RouteReport {
            path: route.output_path().map(Path::to_path_buf),
            outcome,
        });
    }

    /// Outcome recorded for `path`.
    pub fn outcome_for(&self, path: &Path) -> Option<&PageOutcome> {
        self.routes
            .iter()
            .find(|entry| entry.path.as_deref() == Some(path))
            .map(|entry| &entry.outcome)
    }

    /// Pages rewritten and saved.
    pub fn processed(&self) -> usize {
        self.count(|outcome| matches!(outcome, PageOutcome::Processed { .. }))
    }

    /// Saved pages whose font link was rewritten.
    pub fn font_links_rewritten(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                PageOutcome::Processed {
                    font_link_rewritten: true,
                    ..
                }
            )
        })
    }

    /// Routes skipped as non-HTML.
    pub fn skipped_not_html(&self) -> usize {
        self.count(|outcome| matches!(outcome, PageOutcome::SkippedNotHtml))
    }

    /// Pages skipped for exceeding the character threshold.
    pub fn skipped_too_long(&self) -> usize {
        self.count(|outcome| matches!(outcome, PageOutcome::SkippedTooLong { .. }))
    }

    /// Pages that failed.
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, PageOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&PageOutcome) -> bool) -> usize {
        self.routes
            .iter()
            .filter(|entry| predicate(&entry.outcome))
            .count()
    }
}

impl fmt::Display for TrimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} font_links_rewritten={} skipped_not_html={} skipped_too_long={} failed={}",
            self.processed(),
            self.font_links_rewritten(),
            self.skipped_not_html(),
            self.skipped_too_long(),
            self.failed()
        )
    }
}

/// Process every route in order. Never fails; see [`TrimReport`].
pub fn process_routes(routes: &[Route], options: &TrimOptions) -> TrimReport {
    let mut report = TrimReport::default();
    for route in routes {
        let outcome = process_route(route, options);
        report.push(route, outcome);
    }
    report
}

/// Process a single route, logging and containing any failure.
pub fn process_route(route: &Route, options: &TrimOptions) -> PageOutcome {
    let Some(path) = route.html_path() else {
        log::debug!("Skipping non-HTML route {:?}", route.output_path());
        return PageOutcome::SkippedNotHtml;
    };
    let display = path.display().to_string();
    contain(process_page(path, &display, options), &display)
}

fn process_page(path: &Path, display: &str, options: &TrimOptions) -> Result<PageOutcome, TrimError> {
    let html = fs::read_to_string(path).map_err(|err| TrimError::read(display, &err))?;
    let transform = transform_page(&html, options).map_err(|err| err.with_path(display))?;
    match settle(transform, display, options) {
        Settled::Untouched(outcome) => Ok(outcome),
        Settled::Write { html, outcome } => {
            fs::write(path, html).map_err(|err| TrimError::write(display, &err))?;
            log::info!("Processed and saved: {}", display);
            Ok(outcome)
        }
    }
}

/// Async variant of [`process_routes`] using `tokio::fs`.
///
/// Each read and write is awaited before moving on, so pages are still
/// handled strictly one at a time.
#[cfg(feature = "async")]
pub async fn process_routes_async(routes: &[Route], options: &TrimOptions) -> TrimReport {
    let mut report = TrimReport::default();
    for route in routes {
        let outcome = process_route_async(route, options).await;
        report.push(route, outcome);
    }
    report
}

/// Async variant of [`process_route`].
#[cfg(feature = "async")]
pub async fn process_route_async(route: &Route, options: &TrimOptions) -> PageOutcome {
    let Some(path) = route.html_path() else {
        log::debug!("Skipping non-HTML route {:?}", route.output_path());
        return PageOutcome::SkippedNotHtml;
    };
    let display = path.display().to_string();
    contain(process_page_async(path, &display, options).await, &display)
}

#[cfg(feature = "async")]
async fn process_page_async(
    path: &Path,
    display: &str,
    options: &TrimOptions,
) -> Result<PageOutcome, TrimError> {
    let html = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| TrimError::read(display, &err))?;
    let transform = transform_page(&html, options).map_err(|err| err.with_path(display))?;
    match settle(transform, display, options) {
        Settled::Untouched(outcome) => Ok(outcome),
        Settled::Write { html, outcome } => {
            tokio::fs::write(path, html)
                .await
                .map_err(|err| TrimError::write(display, &err))?;
            log::info!("Processed and saved: {}", display);
            Ok(outcome)
        }
    }
}

enum Settled {
    Untouched(PageOutcome),
    Write { html: String, outcome: PageOutcome },
}

/// Log the non-fatal conditions of `transform` and decide whether to write.
fn settle(transform: PageTransform, display: &str, options: &TrimOptions) -> Settled {
    match transform {
        PageTransform::TooManyCharacters { unique_chars } => {
            log::warn!(
                "Skipped processing {} because text length exceeds characters limit ({} > {})",
                display,
                unique_chars,
                options.max_unique_chars
            );
            Settled::Untouched(PageOutcome::SkippedTooLong { unique_chars })
        }
        PageTransform::Ready {
            html,
            font_link_rewritten,
            unique_chars,
        } => {
            if !font_link_rewritten {
                log::warn!(
                    "The <link> tag for the font stylesheet was not found: {}",
                    display
                );
            }
            Settled::Write {
                html,
                outcome: PageOutcome::Processed {
                    font_link_rewritten,
                    unique_chars,
                },
            }
        }
    }
}

fn contain(outcome: Result<PageOutcome, TrimError>, display: &str) -> PageOutcome {
    match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            log::error!("Error processing route {}: {}", display, err);
            PageOutcome::Failed(err)
        }
    }
}
