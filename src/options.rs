//! Processing options.

/// Default maximum number of unique characters a page may use before it is
/// left untouched.
pub const DEFAULT_MAX_UNIQUE_CHARS: usize = 1000;

/// Default substring identifying the web-font stylesheet link.
pub const DEFAULT_FONT_HREF_PATTERN: &str = "https://fonts.googleapis.com/css2?family=";

/// Default name of the character-filter query parameter.
pub const DEFAULT_TEXT_PARAM: &str = "text";

/// Options shared by every page in a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrimOptions {
    /// Pages with more unique characters than this are skipped.
    pub max_unique_chars: usize,
    /// Substring an element's decoded `href` must contain to be rewritten.
    pub font_href_pattern: String,
    /// Query parameter carrying the character filter.
    pub text_param: String,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            max_unique_chars: DEFAULT_MAX_UNIQUE_CHARS,
            font_href_pattern: DEFAULT_FONT_HREF_PATTERN.to_string(),
            text_param: DEFAULT_TEXT_PARAM.to_string(),
        }
    }
}

impl TrimOptions {
    /// Set the unique-character threshold.
    pub fn with_max_unique_chars(mut self, max_unique_chars: usize) -> Self {
        self.max_unique_chars = max_unique_chars;
        self
    }

    /// Set the href substring used to find the font stylesheet link.
    ///
    /// Empty patterns are ignored, since they would match every `link`.
    pub fn with_font_href_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if !pattern.trim().is_empty() {
            self.font_href_pattern = pattern;
        }
        self
    }

    /// Set the character-filter query parameter name.
    ///
    /// Empty names are ignored.
    pub fn with_text_param(mut self, param: impl Into<String>) -> Self {
        let param = param.into();
        if !param.trim().is_empty() {
            self.text_param = param;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_google_fonts_css2() {
        let opts = TrimOptions::default();
        assert_eq!(opts.max_unique_chars, 1000);
        assert_eq!(
            opts.font_href_pattern,
            "https://fonts.googleapis.com/css2?family="
        );
        assert_eq!(opts.text_param, "text");
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let opts = TrimOptions::default()
            .with_font_href_pattern("   ")
            .with_text_param("")
            .with_max_unique_chars(12);
        assert_eq!(opts.font_href_pattern, DEFAULT_FONT_HREF_PATTERN);
        assert_eq!(opts.text_param, DEFAULT_TEXT_PARAM);
        assert_eq!(opts.max_unique_chars, 12);
    }
}
