//! Body text extraction and character-set encoding.
//!
//! The body is located the way an HTML parser would place content: an
//! explicit `<body>` tag opens it, and otherwise the first non-whitespace
//! text or the first start tag that cannot live in `<head>` opens it
//! implicitly. Content after `</body>` still belongs to the body.
//!
//! Extraction reads a textual projection of the document. Script content is
//! dropped from that projection only, so nothing here can change the markup
//! that is later written back to disk.

use core::fmt;
use std::borrow::Cow;
use std::collections::BTreeSet;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{ErrorPhase, TrimError};
use crate::markup::{tokenize_with, Token};

/// Bytes left unescaped by URI-component encoding (`encodeURIComponent`).
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Ordered set of unique characters, in first-occurrence order.
///
/// Whitespace is never admitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacterSet {
    chars: Vec<char>,
    seen: BTreeSet<char>,
}

impl CharacterSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the unique non-whitespace characters of `text`.
    pub fn from_text(text: &str) -> Self {
        let mut set = Self::new();
        set.push_text(text);
        set
    }

    /// Add every non-whitespace character of `text` not already present.
    pub fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.insert(ch);
        }
    }

    /// Add `ch`. Returns `false` for whitespace and for characters already
    /// present.
    pub fn insert(&mut self, ch: char) -> bool {
        if is_stripped_whitespace(ch) || !self.seen.insert(ch) {
            return false;
        }
        self.chars.push(ch);
        true
    }

    /// Number of unique characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Whether `ch` is present.
    pub fn contains(&self, ch: char) -> bool {
        self.seen.contains(&ch)
    }

    /// Characters in first-occurrence order.
    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    /// Iterate characters in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// URI-component encoding of the concatenated characters.
    pub fn encode(&self) -> String {
        encode_uri_component(&self.to_string())
    }
}

impl fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for ch in &self.chars {
            f.write_char(*ch)?;
        }
        Ok(())
    }
}

/// Result of [`extract`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedText {
    /// Unique body characters in first-occurrence order.
    pub characters: CharacterSet,
    /// URI-component encoding of `characters`.
    pub encoded: String,
}

impl ExtractedText {
    /// Number of unique characters.
    pub fn unique_count(&self) -> usize {
        self.characters.len()
    }
}

/// Extract the unique characters of the document body and encode them.
///
/// Fails with [`TrimError::NO_BODY_ELEMENT`] when the document has no body,
/// explicit or implicit, and with [`TrimError::HTML_TOKENIZE_ERROR`] when the
/// markup cannot be tokenized.
pub fn extract(html: &str) -> Result<ExtractedText, TrimError> {
    let mut characters = CharacterSet::new();
    body_text_with(html, |text| characters.push_text(text))?;
    let encoded = characters.encode();
    Ok(ExtractedText {
        characters,
        encoded,
    })
}

/// Text content of the document body with script content removed.
pub fn body_text(html: &str) -> Result<String, TrimError> {
    let mut out = String::with_capacity(html.len() / 4);
    body_text_with(html, |text| out.push_str(text))?;
    Ok(out)
}

/// Stream the body text fragments of `html` in document order.
pub fn body_text_with<F>(html: &str, mut on_text: F) -> Result<(), TrimError>
where
    F: FnMut(&str),
{
    let mut scanner = BodyScanner::new();
    tokenize_with(html, |token| scanner.feed(token, &mut on_text))?;
    if scanner.insertion == Insertion::BeforeBody {
        return Err(TrimError::new(
            ErrorPhase::Extract,
            TrimError::NO_BODY_ELEMENT,
            "No <body> tag found in the HTML document",
        ));
    }
    Ok(())
}

/// Percent-encode `text` with `encodeURIComponent` semantics.
///
/// Every UTF-8 byte is escaped as `%XX` except ASCII letters, digits and
/// `- _ . ! ~ * ' ( )`.
pub fn encode_uri_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Whitespace removed from body text: ECMAScript `\s`, which is Unicode
/// `White_Space` (covering the ideographic space U+3000) without U+0085, plus
/// the byte-order mark.
pub fn is_stripped_whitespace(ch: char) -> bool {
    (ch.is_whitespace() && ch != '\u{85}') || ch == '\u{feff}'
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Insertion {
    BeforeBody,
    InBody,
}

struct BodyScanner {
    insertion: Insertion,
    in_head_raw_text: bool,
    head_container_depth: usize,
    in_script: bool,
    template_depth: usize,
}

impl BodyScanner {
    fn new() -> Self {
        Self {
            insertion: Insertion::BeforeBody,
            in_head_raw_text: false,
            head_container_depth: 0,
            in_script: false,
            template_depth: 0,
        }
    }

    fn feed<F: FnMut(&str)>(&mut self, token: Token<'_>, on_text: &mut F) {
        // U+0000 never reaches the DOM as body text.
        let token = match token {
            Token::Text(text) if text.contains('\0') => {
                Token::Text(Cow::Owned(text.replace('\0', "")))
            }
            other => other,
        };
        match self.insertion {
            Insertion::BeforeBody => self.before_body(token, on_text),
            Insertion::InBody => self.in_body(token, on_text),
        }
    }

    fn before_body<F: FnMut(&str)>(&mut self, token: Token<'_>, on_text: &mut F) {
        match token {
            Token::Start(tag) => match tag.name.as_str() {
                "body" => self.insertion = Insertion::InBody,
                "title" | "style" | "script" => self.in_head_raw_text = true,
                "noscript" | "template" => self.head_container_depth += 1,
                "html" | "head" | "meta" | "link" | "base" | "basefont" | "bgsound" => {}
                _ if self.head_container_depth > 0 => {}
                _ => {
                    self.insertion = Insertion::InBody;
                    self.in_body(Token::Start(tag), on_text);
                }
            },
            Token::End(name) => match name.as_str() {
                "title" | "style" | "script" => self.in_head_raw_text = false,
                "noscript" | "template" => {
                    self.head_container_depth = self.head_container_depth.saturating_sub(1);
                }
                _ => {}
            },
            Token::Text(text) => {
                if self.in_head_raw_text
                    || self.head_container_depth > 0
                    || text.chars().all(is_stripped_whitespace)
                {
                    return;
                }
                self.insertion = Insertion::InBody;
                on_text(&text);
            }
        }
    }

    fn in_body<F: FnMut(&str)>(&mut self, token: Token<'_>, on_text: &mut F) {
        match token {
            Token::Start(tag) => match tag.name.as_str() {
                "script" => self.in_script = true,
                "template" => self.template_depth += 1,
                _ => {}
            },
            Token::End(name) => match name.as_str() {
                "script" => self.in_script = false,
                "template" => self.template_depth = self.template_depth.saturating_sub(1),
                _ => {}
            },
            Token::Text(text) => {
                if !self.in_script && self.template_depth == 0 {
                    on_text(&text);
                }
            }
        }
    }
}
