//! Structured errors for page processing.

use core::fmt;

/// Processing phase where an error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorPhase {
    /// Reading the page from disk.
    Read,
    /// Tokenizing HTML markup.
    Tokenize,
    /// Extracting body text.
    Extract,
    /// Rewriting the font stylesheet link.
    Rewrite,
    /// Writing the page back to disk.
    Write,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Tokenize => "tokenize",
            Self::Extract => "extract",
            Self::Rewrite => "rewrite",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Error raised while processing a single page.
///
/// Errors never cross route boundaries: the driver records them as
/// [`crate::PageOutcome::Failed`] and continues with the next route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrimError {
    /// Processing phase where this error originated.
    pub phase: ErrorPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional page path context.
    pub path: Option<Box<str>>,
    /// Optional byte offset into the HTML source.
    pub token_offset: Option<usize>,
}

impl TrimError {
    /// The document has neither an explicit nor an implicit `<body>`.
    pub const NO_BODY_ELEMENT: &'static str = "NO_BODY_ELEMENT";
    /// The markup could not be tokenized.
    pub const HTML_TOKENIZE_ERROR: &'static str = "HTML_TOKENIZE_ERROR";
    /// The page could not be read.
    pub const IO_READ_ERROR: &'static str = "IO_READ_ERROR";
    /// The page could not be written.
    pub const IO_WRITE_ERROR: &'static str = "IO_WRITE_ERROR";
    /// A rewritten element could not be serialized.
    pub const SERIALIZE_ERROR: &'static str = "SERIALIZE_ERROR";

    pub(crate) fn new(phase: ErrorPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
            path: None,
            token_offset: None,
        }
    }

    pub(crate) fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into().into_boxed_str());
        self
    }

    pub(crate) fn with_token_offset(mut self, token_offset: usize) -> Self {
        self.token_offset = Some(token_offset);
        self
    }

    pub(crate) fn read(path: &str, err: &std::io::Error) -> Self {
        Self::new(
            ErrorPhase::Read,
            Self::IO_READ_ERROR,
            format!("Failed to read page: {}", err),
        )
        .with_path(path)
    }

    pub(crate) fn write(path: &str, err: &std::io::Error) -> Self {
        Self::new(
            ErrorPhase::Write,
            Self::IO_WRITE_ERROR,
            format!("Failed to write page: {}", err),
        )
        .with_path(path)
    }
}

impl fmt::Display for TrimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)?;
        if let Some(path) = self.path.as_deref() {
            write!(f, " [path={}]", path)?;
        }
        if let Some(token_offset) = self.token_offset {
            write!(f, " [token_offset={}]", token_offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for TrimError {}
