//! Tolerant HTML tokenization and in-place start-tag editing.
//!
//! `quick-xml` does the tokenizing, configured to accept HTML tag soup:
//! unmatched and unclosed tags, bare `&`, valueless and unquoted
//! attributes. Elements whose content is raw text in HTML (`script`,
//! `style`) or escapable raw text (`title`, `textarea`) are not handed to the
//! XML tokenizer at all; their content is sliced out of the source up to the
//! matching close tag and tokenizing resumes after it.
//!
//! [`HtmlDocument`] keeps the original source and the spans of every start
//! tag. Serialization returns the source untouched except for start tags
//! that were edited through [`HtmlDocument::set_attribute`].

use std::borrow::Cow;
use std::ops::Range;

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{ErrorPhase, TrimError};

/// A start tag with decoded attributes and its byte span in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased local tag name.
    pub name: String,
    /// Attributes in source order; keys lowercased, values with character
    /// references resolved.
    pub attributes: Vec<(String, String)>,
    /// Byte range of the whole tag, `<` through `>`.
    pub span: Range<usize>,
    /// Whether the tag was written as `<name ... />`.
    pub self_closing: bool,
}

impl StartTag {
    /// Look up an attribute value by (case-insensitive) name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Replace the first attribute named `key`, or append it.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attributes
                .push((key.to_ascii_lowercase(), value.to_string())),
        }
    }

    /// Serialize the tag with double-quoted, escaped attribute values.
    pub fn to_markup(&self) -> Result<String, TrimError> {
        let mut element = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            element.push_attribute((key.as_str(), value.as_str()));
        }
        let event = if self.self_closing {
            Event::Empty(element)
        } else {
            Event::Start(element)
        };

        let mut writer = Writer::new(Vec::with_capacity(self.span.len() + 64));
        writer.write_event(event).map_err(|err| {
            TrimError::new(
                ErrorPhase::Rewrite,
                TrimError::SERIALIZE_ERROR,
                format!("Failed to serialize <{}>: {}", self.name, err),
            )
        })?;
        String::from_utf8(writer.into_inner()).map_err(|err| {
            TrimError::new(
                ErrorPhase::Rewrite,
                TrimError::SERIALIZE_ERROR,
                format!("Serialized <{}> is not UTF-8: {}", self.name, err),
            )
        })
    }
}

/// Markup token streamed by [`tokenize_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Start(StartTag),
    End(String),
    Text(Cow<'a, str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RawTextKind {
    /// Content is taken verbatim.
    Raw,
    /// Character references are resolved.
    Escapable,
}

impl RawTextKind {
    fn for_tag(tag: &str) -> Option<Self> {
        match tag {
            "script" | "style" => Some(Self::Raw),
            "title" | "textarea" => Some(Self::Escapable),
            _ => None,
        }
    }
}

/// Tokenize `html`, streaming each token to `on_token` in document order.
///
/// Comments, doctype and processing instructions produce no tokens. CDATA
/// sections inside `svg` or `math` produce text; elsewhere they are comments.
/// A `<` that does not open markup is text. Raw-text elements always produce
/// `Start`, an optional `Text`, then `End`, even when the close tag is
/// missing from the source.
pub(crate) fn tokenize_with<F>(html: &str, mut on_token: F) -> Result<(), TrimError>
where
    F: FnMut(Token<'_>),
{
    let mut base = 0usize;
    let mut reader = html_reader(html);
    let mut entity_buf = String::with_capacity(16);
    let mut foreign_depth = 0usize;

    loop {
        let token_start = base + reader_offset(&reader);
        if html.as_bytes().get(token_start) == Some(&b'<') {
            match classify_markup(html, token_start, foreign_depth > 0) {
                Markup::Parsed => {}
                Markup::Skip(resume) => {
                    base = resume;
                    reader = html_reader(&html[base..]);
                    continue;
                }
                Markup::Literal(end) => {
                    on_token(Token::Text(Cow::Borrowed(&html[token_start..end])));
                    base = end;
                    reader = html_reader(&html[base..]);
                    continue;
                }
            }
        }
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let span = token_start..base + reader_offset(&reader);
                let tag = start_tag(&reader, &e, span, false, base)?;
                if is_foreign_root(&tag.name) {
                    foreign_depth += 1;
                }
                if let Some(resume) = emit_element(html, tag, &mut on_token) {
                    base = resume;
                    reader = html_reader(&html[base..]);
                }
            }
            Ok(Event::Empty(e)) => {
                let span = token_start..base + reader_offset(&reader);
                let tag = start_tag(&reader, &e, span, true, base)?;
                if let Some(resume) = emit_element(html, tag, &mut on_token) {
                    base = resume;
                    reader = html_reader(&html[base..]);
                }
            }
            Ok(Event::End(e)) => {
                let tag = decode_tag_name(&reader, e.name().as_ref(), base)?;
                if is_foreign_root(&tag) {
                    foreign_depth = foreign_depth.saturating_sub(1);
                }
                on_token(Token::End(tag));
            }
            Ok(Event::CData(e)) => {
                let text = reader.decoder().decode(&e).map_err(|err| {
                    tokenize_error(format!("Decode error: {:?}", err), base, &reader)
                })?;
                on_token(Token::Text(Cow::Owned(text.into_owned())));
            }
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(|err| {
                    tokenize_error(format!("Decode error: {:?}", err), base, &reader)
                })?;
                on_token(Token::Text(text));
            }
            Ok(Event::GeneralRef(e)) => {
                let name = e.decode().map_err(|err| {
                    tokenize_error(format!("Decode error: {:?}", err), base, &reader)
                })?;
                entity_buf.clear();
                entity_buf.push('&');
                entity_buf.push_str(name.as_ref());
                entity_buf.push(';');
                let resolved = decode_references(&entity_buf);
                on_token(Token::Text(Cow::Owned(resolved.into_owned())));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(TrimError::new(
                    ErrorPhase::Tokenize,
                    TrimError::HTML_TOKENIZE_ERROR,
                    format!("HTML error: {:?}", err),
                )
                .with_token_offset(base + reader_error_offset(&reader)));
            }
        }
    }

    Ok(())
}

/// Emit the tokens for one start tag. For raw-text elements the content and
/// close tag are emitted too, and the byte offset to resume tokenizing from
/// is returned.
fn emit_element<F>(html: &str, tag: StartTag, on_token: &mut F) -> Option<usize>
where
    F: FnMut(Token<'_>),
{
    let name = tag.name.clone();
    let Some(kind) = RawTextKind::for_tag(&name) else {
        let self_closing = tag.self_closing;
        on_token(Token::Start(tag));
        if self_closing {
            on_token(Token::End(name));
        }
        return None;
    };

    // `<script/>` still opens a raw-text element in HTML.
    let content_start = tag.span.end;
    let (content_end, resume) = find_raw_text_end(html, content_start, &name);
    on_token(Token::Start(tag));
    let content = &html[content_start..content_end];
    if !content.is_empty() {
        let text = match kind {
            RawTextKind::Raw => Cow::Borrowed(content),
            RawTextKind::Escapable => decode_references(content),
        };
        on_token(Token::Text(text));
    }
    on_token(Token::End(name));
    Some(resume)
}

/// Find the close tag of a raw-text element starting the search at `from`.
///
/// Returns `(content_end, resume_offset)`. Without a close tag the content
/// runs to the end of the source.
fn find_raw_text_end(html: &str, from: usize, name: &str) -> (usize, usize) {
    let bytes = html.as_bytes();
    let mut cursor = from;
    while let Some(rel) = html[cursor..].find("</") {
        let open = cursor + rel;
        let name_start = open + 2;
        let name_end = name_start + name.len();
        let name_matches = bytes
            .get(name_start..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let boundary = matches!(
            bytes.get(name_end),
            None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
        );
        if name_matches && boundary {
            let resume = html[name_end..]
                .find('>')
                .map_or(html.len(), |pos| name_end + pos + 1);
            return (open, resume);
        }
        cursor = name_start;
    }
    (html.len(), html.len())
}

/// How the markup starting with `<` at `at` is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Markup {
    /// A tag, comment, doctype or CDATA section `quick-xml` reads.
    Parsed,
    /// Dropped up to this offset.
    Skip(usize),
    /// Plain text up to this offset.
    Literal(usize),
}

/// Classify markup by the characters after `<`, as the HTML tokenizer does.
///
/// Only a letter opens a tag. `<` followed by anything else is text, and
/// `</` or `<?` not followed by a tag name opens a comment that ends at the
/// next `>`. CDATA sections are only sections inside `svg` and `math`.
fn classify_markup(html: &str, at: usize, in_foreign: bool) -> Markup {
    let rest = &html.as_bytes()[at..];
    match rest.get(1) {
        Some(b) if b.is_ascii_alphabetic() => Markup::Parsed,
        Some(b'!') => {
            if rest.starts_with(b"<!-->") {
                Markup::Skip(at + 5)
            } else if rest.starts_with(b"<!--->") {
                Markup::Skip(at + 6)
            } else if rest.starts_with(b"<!--")
                || (in_foreign && rest.starts_with(b"<![CDATA["))
                || rest
                    .get(2..9)
                    .is_some_and(|word| word.eq_ignore_ascii_case(b"doctype"))
            {
                Markup::Parsed
            } else {
                bogus_comment(html, at + 2)
            }
        }
        Some(b'?') => bogus_comment(html, at + 2),
        Some(b'/') => match rest.get(2) {
            Some(b) if b.is_ascii_alphabetic() => Markup::Parsed,
            Some(b'>') => Markup::Skip(at + 3),
            Some(_) => bogus_comment(html, at + 2),
            None => Markup::Literal(at + 2),
        },
        _ => Markup::Literal(at + 1),
    }
}

fn bogus_comment(html: &str, from: usize) -> Markup {
    Markup::Skip(html[from..].find('>').map_or(html.len(), |pos| from + pos + 1))
}

fn is_foreign_root(tag: &str) -> bool {
    matches!(tag, "svg" | "math")
}

fn html_reader(html: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    config.check_comments = false;
    reader
}

fn start_tag(
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
    span: Range<usize>,
    self_closing: bool,
    base: usize,
) -> Result<StartTag, TrimError> {
    let name = decode_tag_name(reader, e.name().as_ref(), base)?;
    let mut attributes = Vec::with_capacity(4);
    for attr in e.html_attributes().flatten() {
        let Ok(key) = reader.decoder().decode(attr.key.as_ref()) else {
            continue;
        };
        let Ok(raw) = reader.decoder().decode(&attr.value) else {
            continue;
        };
        attributes.push((
            key.to_ascii_lowercase(),
            decode_references(raw.as_ref()).into_owned(),
        ));
    }
    Ok(StartTag {
        name,
        attributes,
        span,
        self_closing,
    })
}

fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8], base: usize) -> Result<String, TrimError> {
    let decoded = reader
        .decoder()
        .decode(raw)
        .map_err(|err| tokenize_error(format!("Decode error: {:?}", err), base, reader))?;
    let local_name = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
    Ok(local_name.to_ascii_lowercase())
}

/// Resolve numeric and HTML5 named character references. Text with an
/// unknown or malformed reference is returned unchanged.
pub(crate) fn decode_references(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    unescape_with(text, resolve_html5_entity).unwrap_or(Cow::Borrowed(text))
}

fn tokenize_error(message: String, base: usize, reader: &Reader<&[u8]>) -> TrimError {
    TrimError::new(ErrorPhase::Tokenize, TrimError::HTML_TOKENIZE_ERROR, message)
        .with_token_offset(base + reader_offset(reader))
}

fn reader_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn reader_error_offset(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.error_position()).unwrap_or(usize::MAX)
}

/// An HTML page held as source text plus the spans of its start tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HtmlDocument {
    source: String,
    elements: Vec<StartTag>,
}

impl HtmlDocument {
    /// Tokenize `html` and index its start tags.
    pub fn parse(html: impl Into<String>) -> Result<Self, TrimError> {
        let source = html.into();
        let mut elements = Vec::with_capacity(64);
        tokenize_with(&source, |token| {
            if let Token::Start(tag) = token {
                elements.push(tag);
            }
        })?;
        Ok(Self { source, elements })
    }

    /// Current HTML source, including any edits.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Start tags in document order.
    pub fn elements(&self) -> impl Iterator<Item = &StartTag> {
        self.elements.iter()
    }

    /// Start tag at `index`, in document order.
    pub fn element(&self, index: usize) -> Option<&StartTag> {
        self.elements.get(index)
    }

    /// Index of the first start tag matching `predicate`.
    pub fn find_element<P>(&self, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&StartTag) -> bool,
    {
        self.elements.iter().position(|tag| predicate(tag))
    }

    /// Set an attribute on the start tag at `index` and splice the
    /// re-serialized tag into the source.
    ///
    /// Returns `false` when there is no element at `index`.
    pub fn set_attribute(&mut self, index: usize, key: &str, value: &str) -> Result<bool, TrimError> {
        let Some(tag) = self.elements.get(index) else {
            return Ok(false);
        };
        let mut edited = tag.clone();
        edited.set_attribute(key, value);
        let markup = edited.to_markup()?;

        let old_span = edited.span.clone();
        let old_len = old_span.len();
        let new_len = markup.len();
        self.source.replace_range(old_span.clone(), &markup);
        edited.span = old_span.start..old_span.start + new_len;
        self.elements[index] = edited;

        for later in self.elements.iter_mut().skip(index + 1) {
            later.span = shift_range(&later.span, old_len, new_len);
        }
        Ok(true)
    }

    /// Serialize the document back to HTML text.
    pub fn to_html(&self) -> &str {
        &self.source
    }

    /// Consume the document, returning the serialized HTML.
    pub fn into_html(self) -> String {
        self.source
    }
}

fn shift_range(range: &Range<usize>, old_len: usize, new_len: usize) -> Range<usize> {
    if new_len >= old_len {
        let grow = new_len - old_len;
        range.start + grow..range.end + grow
    } else {
        let shrink = old_len - new_len;
        range.start.saturating_sub(shrink)..range.end.saturating_sub(shrink)
    }
}
