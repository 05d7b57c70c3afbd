//! Rich-text content handling
//!
//! Block `content` is an HTML fragment. It is parsed rather than escaped so
//! the export carries real markup, and re-serialised so unbalanced input
//! can never leak tags into the surrounding table layout.

use std::borrow::Cow;

use scraper::Html;

/// Parse a fragment and serialise it back as well-formed HTML
pub fn normalize_html(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return escape_html(fragment).into_owned();
    }
    Html::parse_fragment(fragment).root_element().inner_html()
}

/// Visible text of a fragment with whitespace collapsed
pub fn plain_text(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    let text: String = html.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for an HTML text node
pub fn escape_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Escape text for a double-quoted attribute value
pub fn escape_attr(s: &str) -> String {
    escape_html(s).replace('\n', "&#10;").replace('\r', "&#13;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_closes_open_tags() {
        assert_eq!(normalize_html("<p>Hi"), "<p>Hi</p>");
        assert_eq!(normalize_html("<p>Hi</p>"), "<p>Hi</p>");
    }

    #[test]
    fn test_normalize_escapes_plain_text() {
        assert_eq!(normalize_html("Fish & chips"), "Fish &amp; chips");
        assert_eq!(normalize_html("a > b"), "a &gt; b");
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text("<p>Hi</p>"), "Hi");
        assert_eq!(
            plain_text("<h1>Big</h1>\n  <p>news <b>today</b></p>"),
            "Big news today"
        );
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("a\"b\nc"), "a&quot;b&#10;c");
        assert!(matches!(escape_html("plain"), Cow::Borrowed("plain")));
    }
}
