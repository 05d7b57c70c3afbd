//! Error types for template script compilation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Longest fragment of source quoted in an error
const FRAGMENT_LIMIT: usize = 60;

/// A script that could not be compiled
///
/// Every variant carries the offending source fragment so callers can show
/// it without holding on to the source text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message} (near `{fragment}`)")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
        fragment: String,
    },

    #[error("Unbalanced delimiter at {span:?}: {message} (near `{fragment}`)")]
    Unbalanced {
        span: Span,
        message: String,
        fragment: String,
    },

    #[error("Unterminated {element} content at {span:?} (near `{fragment}`)")]
    Unterminated {
        span: Span,
        element: String,
        fragment: String,
    },

    #[error("Invalid JSON in attribute `{key}` at {span:?}: {message}")]
    InvalidJson {
        span: Span,
        key: String,
        message: String,
        fragment: String,
    },

    #[error("Tag and brace syntax mixed at {span:?} (near `{fragment}`)")]
    MixedSyntax { span: Span, fragment: String },

    #[error("Invalid structure at {span:?}: {message} (near `{fragment}`)")]
    Structure {
        span: Span,
        message: String,
        fragment: String,
    },
}

impl ParseError {
    pub fn syntax(source: &str, span: Span, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            fragment: fragment_at(source, &span),
            span,
            message: message.into(),
            expected: vec![],
        }
    }

    pub fn unbalanced(source: &str, span: Span, message: impl Into<String>) -> Self {
        ParseError::Unbalanced {
            fragment: fragment_at(source, &span),
            span,
            message: message.into(),
        }
    }

    pub fn structure(source: &str, span: Span, message: impl Into<String>) -> Self {
        ParseError::Structure {
            fragment: fragment_at(source, &span),
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. }
            | ParseError::Unbalanced { span, .. }
            | ParseError::Unterminated { span, .. }
            | ParseError::InvalidJson { span, .. }
            | ParseError::MixedSyntax { span, .. }
            | ParseError::Structure { span, .. } => span,
        }
    }

    /// The source text the error points at
    pub fn fragment(&self) -> &str {
        match self {
            ParseError::Syntax { fragment, .. }
            | ParseError::Unbalanced { fragment, .. }
            | ParseError::Unterminated { fragment, .. }
            | ParseError::InvalidJson { fragment, .. }
            | ParseError::MixedSyntax { fragment, .. }
            | ParseError::Structure { fragment, .. } => fragment,
        }
    }

    fn label_message(&self) -> String {
        match self {
            ParseError::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{}\nExpected: {}", message, expected.join(", "))
                }
            }
            ParseError::Unbalanced { message, .. } | ParseError::Structure { message, .. } => {
                message.clone()
            }
            ParseError::Unterminated { element, .. } => {
                format!("<{}> content is never closed", element)
            }
            ParseError::InvalidJson { key, message, .. } => {
                format!("`{}` is not valid JSON: {}", key, message)
            }
            ParseError::MixedSyntax { .. } => {
                "a script must use either tag syntax or brace syntax".to_string()
            }
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let span = self.span().clone();
        let message = self.label_message();

        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    /// Convert a grammar error, quoting the source it points at
    pub fn from_rich(err: chumsky::error::Rich<'_, Token>, source: &str) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        let span = err.span().into_range();
        ParseError::Syntax {
            fragment: fragment_at(source, &span),
            span,
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Keyword(element) => format!("keyword '{}'", element),
        Token::Attr(attr) => format!("attribute '{}'", attr.key),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::TagOpen(element) => format!("'<{}'", element),
        Token::TagEnd => "'>'".to_string(),
        Token::TagSelfClose => "'/>'".to_string(),
        Token::TagClose(element) => format!("'</{}>'", element),
        Token::Content(_) => "element content".to_string(),
    }
}

/// Source text under `span`, trimmed to a single short line
pub fn fragment_at(source: &str, span: &Span) -> String {
    let start = span.start.min(source.len());
    let end = span.end.clamp(start, source.len());
    let text = source.get(start..end).unwrap_or_default();
    let line = text.lines().next().unwrap_or_default();
    let mut fragment: String = line.chars().take(FRAGMENT_LIMIT).collect();
    if fragment.len() < line.len() {
        fragment.push('…');
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_at_truncates_to_line() {
        let source = "ROW {\n  COLUMN {";
        assert_eq!(fragment_at(source, &(0..source.len())), "ROW {");
        assert_eq!(fragment_at(source, &(100..200)), "");
    }

    #[test]
    fn test_format_includes_message() {
        let source = "ROW { COLUMN {";
        let err = ParseError::unbalanced(source, 4..5, "`{` is never closed");
        let report = err.format(source, "email.tpl");
        assert!(report.contains("never closed"));
        assert_eq!(err.fragment(), "{");
    }

    #[test]
    fn test_display_quotes_fragment() {
        let err = ParseError::structure("COLUMN { }", 0..6, "COLUMN outside of a ROW");
        assert!(err.to_string().contains("COLUMN outside of a ROW"));
        assert!(err.to_string().contains("`COLUMN`"));
    }
}
