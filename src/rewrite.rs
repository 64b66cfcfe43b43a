//! Font stylesheet link rewriting.

use crate::error::TrimError;
use crate::markup::HtmlDocument;
use crate::options::TrimOptions;

/// Index of the first `link` element whose decoded `href` contains `pattern`.
pub fn find_font_link(document: &HtmlDocument, pattern: &str) -> Option<usize> {
    document.find_element(|tag| {
        tag.name == "link" && tag.attribute("href").is_some_and(|href| href.contains(pattern))
    })
}

/// Rewrite the first matching font stylesheet link so it requests only the
/// glyphs in `encoded`.
///
/// Returns `Ok(false)` and leaves the document untouched when no link
/// matches [`TrimOptions::font_href_pattern`]; reporting that is left to the
/// caller, which knows the page path.
pub fn rewrite_font_link(
    document: &mut HtmlDocument,
    encoded: &str,
    options: &TrimOptions,
) -> Result<bool, TrimError> {
    let Some(index) = find_font_link(document, &options.font_href_pattern) else {
        return Ok(false);
    };
    let href = document
        .element(index)
        .and_then(|tag| tag.attribute("href"))
        .unwrap_or_default();
    let new_href = apply_text_filter(href, encoded, &options.text_param);
    document.set_attribute(index, "href", &new_href)
}

/// Put a `param=encoded` character filter on `href`.
///
/// An existing filter is replaced together with everything that follows it
/// in the query. Otherwise the filter is appended as a new query parameter,
/// starting a query when `href` has none. A `#fragment` stays at the end.
pub fn apply_text_filter(href: &str, encoded: &str, param: &str) -> String {
    let (base, fragment) = match href.find('#') {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    };

    let mut out =
        String::with_capacity(base.len() + param.len() + encoded.len() + fragment.len() + 2);
    match filter_position(base, param) {
        // Keep the delimiter, drop the old filter and its tail.
        Some(pos) => out.push_str(&base[..=pos]),
        None => {
            out.push_str(base);
            match base.find('?') {
                None => out.push('?'),
                Some(_) if base.ends_with('?') || base.ends_with('&') => {}
                Some(_) => out.push('&'),
            }
        }
    }
    out.push_str(param);
    out.push('=');
    out.push_str(encoded);
    out.push_str(fragment);
    out
}

/// Byte offset of the `?` or `&` introducing `param=` in the query of `base`.
fn filter_position(base: &str, param: &str) -> Option<usize> {
    let query_start = base.find('?')?;
    base[query_start..]
        .match_indices(|ch: char| ch == '?' || ch == '&')
        .map(|(offset, _)| query_start + offset)
        .find(|&pos| {
            let rest = &base[pos + 1..];
            rest.starts_with(param) && rest[param.len()..].starts_with('=')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS2: &str = "https://fonts.googleapis.com/css2?family=Roboto";

    #[test]
    fn existing_filter_is_replaced_wholesale() {
        let href = format!("{CSS2}&text=ABC");
        assert_eq!(
            apply_text_filter(&href, "XYZ", "text"),
            format!("{CSS2}&text=XYZ")
        );
    }

    #[test]
    fn trailing_content_after_old_filter_is_dropped() {
        let href = format!("{CSS2}&text=ABC&display=swap");
        assert_eq!(
            apply_text_filter(&href, "XYZ", "text"),
            format!("{CSS2}&text=XYZ")
        );
    }

    #[test]
    fn missing_filter_is_appended_once() {
        assert_eq!(
            apply_text_filter(CSS2, "XYZ", "text"),
            format!("{CSS2}&text=XYZ")
        );
    }

    #[test]
    fn rewrite_is_idempotent() {
        let once = apply_text_filter(CSS2, "%E3%81%82b", "text");
        let twice = apply_text_filter(&once, "%E3%81%82b", "text");
        assert_eq!(once, twice);
        assert_eq!(once.matches("text=").count(), 1);
    }

    #[test]
    fn href_without_query_starts_one() {
        assert_eq!(
            apply_text_filter("https://example.com/fonts.css", "ab", "text"),
            "https://example.com/fonts.css?text=ab"
        );
        assert_eq!(
            apply_text_filter("https://example.com/fonts.css?", "ab", "text"),
            "https://example.com/fonts.css?text=ab"
        );
        assert_eq!(
            apply_text_filter("https://example.com/fonts.css?a=1&", "ab", "text"),
            "https://example.com/fonts.css?a=1&text=ab"
        );
    }

    #[test]
    fn filter_as_first_parameter_is_replaced() {
        assert_eq!(
            apply_text_filter("https://example.com/f.css?text=old&x=1", "new", "text"),
            "https://example.com/f.css?text=new"
        );
    }

    #[test]
    fn similar_parameter_names_are_not_mistaken_for_the_filter() {
        assert_eq!(
            apply_text_filter("https://example.com/f.css?context=1", "ab", "text"),
            "https://example.com/f.css?context=1&text=ab"
        );
        assert_eq!(
            apply_text_filter("https://example.com/f.css?a=1&textual=2", "ab", "text"),
            "https://example.com/f.css?a=1&textual=2&text=ab"
        );
    }

    #[test]
    fn fragment_stays_at_the_end() {
        assert_eq!(
            apply_text_filter("https://example.com/f.css?a=1#top", "ab", "text"),
            "https://example.com/f.css?a=1&text=ab#top"
        );
    }

    #[test]
    fn rewrite_updates_first_matching_link_only() {
        let html = format!(
            "<html><head><link rel=\"preconnect\" href=\"https://fonts.gstatic.com\">\
             <link href=\"{CSS2}&amp;display=swap\" rel=\"stylesheet\">\
             <link href=\"{CSS2}+Mono\" rel=\"stylesheet\"></head><body>x</body></html>"
        );
        let mut doc = HtmlDocument::parse(html).expect("parse");
        let rewritten =
            rewrite_font_link(&mut doc, "abc", &TrimOptions::default()).expect("rewrite");
        assert!(rewritten);
        let out = doc.into_html();
        assert!(out.contains(&format!(
            "<link href=\"{CSS2}&amp;display=swap&amp;text=abc\" rel=\"stylesheet\">"
        )));
        assert!(out.contains(&format!("<link href=\"{CSS2}+Mono\" rel=\"stylesheet\">")));
        assert!(out.contains("<link rel=\"preconnect\" href=\"https://fonts.gstatic.com\">"));
    }

    #[test]
    fn missing_link_leaves_document_untouched() {
        let html = "<html><head><link rel=\"stylesheet\" href=\"/site.css\"></head><body>x</body></html>";
        let mut doc = HtmlDocument::parse(html).expect("parse");
        let rewritten =
            rewrite_font_link(&mut doc, "x", &TrimOptions::default()).expect("rewrite");
        assert!(!rewritten);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn pattern_in_non_link_elements_is_ignored() {
        let html = format!("<body><a href=\"{CSS2}\">fonts</a></body>");
        let doc = HtmlDocument::parse(html).expect("parse");
        assert_eq!(find_font_link(&doc, "https://fonts.googleapis.com/css2?family="), None);
    }
}
