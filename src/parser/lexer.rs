//! Lexers for the template script language using logos
//!
//! The language has two surface syntaxes. Each has its own logos front end
//! and both produce the same [`Token`] stream for the shared grammar. The
//! syntax is chosen by sniffing the first non-whitespace character: `<`
//! selects tag form, anything else brace form.

use std::fmt;

use logos::Logos;

use crate::error::{fragment_at, ParseError, Span};
use crate::model::BlockKind;

/// Element names shared by both syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Email,
    Row,
    Column,
    Block(BlockKind),
}

impl Element {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "EMAIL" => Some(Element::Email),
            "ROW" => Some(Element::Row),
            "COLUMN" => Some(Element::Column),
            other => BlockKind::from_keyword(other).map(Element::Block),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Element::Email => "EMAIL",
            Element::Row => "ROW",
            Element::Column => "COLUMN",
            Element::Block(kind) => kind.keyword(),
        }
    }

    /// Content blocks never contain other elements
    pub fn is_leaf(self) -> bool {
        matches!(self, Element::Block(_))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// An attribute value as written in the script
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Unquoted scalar or comma list
    Bare(String),
    /// `"..."` with escapes already removed
    Quoted(String),
    /// `[...]` or `{...}` embedded JSON, not yet parsed
    Structured(String),
    /// Inline HTML starting with `<`
    Html(String),
}

impl RawValue {
    pub fn as_str(&self) -> &str {
        match self {
            RawValue::Bare(s) | RawValue::Quoted(s) | RawValue::Structured(s) | RawValue::Html(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
    pub key: String,
    pub value: RawValue,
}

/// Token consumed by the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Brace-form element keyword, e.g. `ROW`
    Keyword(Element),
    Attr(RawAttribute),
    BraceOpen,
    BraceClose,
    /// `<ROW`
    TagOpen(Element),
    /// `>` ending an opening tag
    TagEnd,
    /// `/>`
    TagSelfClose,
    /// `</ROW>`
    TagClose(Element),
    /// Raw text between a leaf's opening and closing tags
    Content(String),
}

/// Which surface syntax a script uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Brace,
    Tag,
}

/// Failure while scanning a single token
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    Unexpected,
    UnterminatedString,
    UnbalancedValue,
    UnclosedHtml(String),
}

impl LexError {
    fn message(&self) -> String {
        match self {
            LexError::Unexpected => "unexpected character".to_string(),
            LexError::UnterminatedString => "quoted value is never closed".to_string(),
            LexError::UnbalancedValue => "bracketed value is never closed".to_string(),
            LexError::UnclosedHtml(name) => format!("inline <{}> is never closed", name),
        }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(error = LexError)]
enum BraceToken {
    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*=", brace_attribute)]
    Attr(RawAttribute),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Word(String),

    #[regex(r"//[^\n]*", logos::skip)]
    Comment,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(error = LexError)]
enum TagToken {
    #[regex(r"<[A-Za-z]+", |lex| lex.slice()[1..].to_string())]
    Open(String),

    #[regex(r"</[A-Za-z]+[ \t\r\n]*>", |lex| lex.slice()[2..].trim_end_matches('>').trim().to_string())]
    Close(String),

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[regex(r"[A-Za-z_][A-Za-z0-9_\-]*=", tag_attribute)]
    Attr(RawAttribute),

    #[regex(r"<!--([^-]|-[^-])*-->", logos::skip)]
    Comment,
}

fn brace_attribute(lex: &mut logos::Lexer<BraceToken>) -> Result<RawAttribute, LexError> {
    let key = lex.slice().trim_end_matches('=').to_string();
    let (value, consumed) = scan_value(lex.remainder(), Syntax::Brace)?;
    lex.bump(consumed);
    Ok(RawAttribute { key, value })
}

fn tag_attribute(lex: &mut logos::Lexer<TagToken>) -> Result<RawAttribute, LexError> {
    let key = lex.slice().trim_end_matches('=').to_string();
    let (value, consumed) = scan_value(lex.remainder(), Syntax::Tag)?;
    lex.bump(consumed);
    Ok(RawAttribute { key, value })
}

/// Scan one attribute value from the start of `rest`, returning the value
/// and the number of bytes it occupies
fn scan_value(rest: &str, syntax: Syntax) -> Result<(RawValue, usize), LexError> {
    match rest.chars().next() {
        Some('"') => scan_quoted(rest).map(|(s, n)| (RawValue::Quoted(s), n)),
        Some('[') | Some('{') => {
            let n = scan_structured(rest)?;
            Ok((RawValue::Structured(rest[..n].to_string()), n))
        }
        Some('<') => {
            let n = scan_html(rest)?;
            Ok((RawValue::Html(rest[..n].to_string()), n))
        }
        _ => {
            let n = scan_bare(rest, syntax);
            Ok((RawValue::Bare(rest[..n].to_string()), n))
        }
    }
}

fn scan_quoted(rest: &str) -> Result<(String, usize), LexError> {
    let mut out = String::new();
    let mut escaped = false;
    for (i, c) in rest.char_indices().skip(1) {
        if escaped {
            out.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((out, i + 1));
        } else {
            out.push(c);
        }
    }
    Err(LexError::UnterminatedString)
}

fn scan_structured(rest: &str) -> Result<usize, LexError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    Err(LexError::UnbalancedValue)
}

fn scan_bare(rest: &str, syntax: Syntax) -> usize {
    for (i, c) in rest.char_indices() {
        let stop = c.is_whitespace()
            || match syntax {
                Syntax::Brace => c == '{' || c == '}',
                Syntax::Tag => c == '>' || rest[i..].starts_with("/>"),
            };
        if stop {
            return i;
        }
    }
    rest.len()
}

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

/// Length of an inline HTML value: one element up to its matching close
/// tag, plus any sibling elements that follow without whitespace
fn scan_html(rest: &str) -> Result<usize, LexError> {
    let mut end = scan_html_element(rest)?;
    while rest[end..].starts_with('<') && !rest[end..].starts_with("</") {
        end += scan_html_element(&rest[end..])?;
    }
    Ok(end)
}

fn scan_html_element(rest: &str) -> Result<usize, LexError> {
    let name: String = rest[1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        return Err(LexError::Unexpected);
    }
    let name = name.to_ascii_lowercase();
    let open_end = rest
        .find('>')
        .ok_or_else(|| LexError::UnclosedHtml(name.clone()))?
        + 1;
    if rest[..open_end].ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str()) {
        return Ok(open_end);
    }

    // ASCII lowercasing keeps byte offsets intact
    let lower = rest.to_ascii_lowercase();
    let open_pat = format!("<{}", name);
    let close_pat = format!("</{}", name);
    let mut depth = 1usize;
    let mut i = open_end;
    while let Some(offset) = lower[i..].find('<') {
        let at = i + offset;
        let tail = &lower[at..];
        if tail.starts_with(&close_pat) && is_name_boundary(&tail[close_pat.len()..]) {
            let close_end = at
                + tail
                    .find('>')
                    .ok_or_else(|| LexError::UnclosedHtml(name.clone()))?
                + 1;
            depth -= 1;
            if depth == 0 {
                return Ok(close_end);
            }
            i = close_end;
        } else if tail.starts_with(&open_pat) && is_name_boundary(&tail[open_pat.len()..]) {
            depth += 1;
            i = at + open_pat.len();
        } else {
            i = at + 1;
        }
    }
    Err(LexError::UnclosedHtml(name))
}

fn is_name_boundary(s: &str) -> bool {
    s.chars().next().map_or(true, |c| !c.is_ascii_alphanumeric())
}

/// Whether `text` is exactly one inline HTML value
pub fn is_inline_html(text: &str) -> bool {
    text.starts_with('<') && scan_html(text).is_ok_and(|n| n == text.len())
}

pub fn detect_syntax(source: &str) -> Syntax {
    match source.trim_start().chars().next() {
        Some('<') => Syntax::Tag,
        _ => Syntax::Brace,
    }
}

/// Tokenize a script in whichever syntax it is written in
pub fn lex(source: &str) -> Result<(Syntax, Vec<(Token, Span)>), ParseError> {
    let syntax = detect_syntax(source);
    let tokens = match syntax {
        Syntax::Brace => lex_brace(source)?,
        Syntax::Tag => lex_tags(source)?,
    };
    Ok((syntax, tokens))
}

fn lex_brace(source: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut lexer = BraceToken::lexer(source);
    let mut tokens = vec![];

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let token = match result {
            Ok(BraceToken::BraceOpen) => Token::BraceOpen,
            Ok(BraceToken::BraceClose) => Token::BraceClose,
            Ok(BraceToken::Attr(attr)) => Token::Attr(attr),
            Ok(BraceToken::Word(word)) => match Element::from_keyword(&word) {
                Some(element) => Token::Keyword(element),
                None => {
                    return Err(ParseError::syntax(
                        source,
                        span,
                        format!(
                            "unknown element `{}` (quote attribute values that contain spaces)",
                            word
                        ),
                    ))
                }
            },
            Ok(BraceToken::Comment) => continue,
            Err(err) => {
                if source[span.start..].starts_with('<') {
                    return Err(ParseError::MixedSyntax {
                        fragment: fragment_at(source, &(span.start..source.len())),
                        span,
                    });
                }
                return Err(lex_failure(source, span, &err));
            }
        };
        tokens.push((token, span));
    }
    Ok(tokens)
}

fn lex_tags(source: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    let mut lexer = TagToken::lexer(source);
    let mut tokens = vec![];
    // Leaf element whose opening tag is still being read
    let mut open_leaf: Option<(Element, Span)> = None;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(TagToken::Open(name)) => {
                let element = tag_element(source, &name, span.clone())?;
                open_leaf = element.is_leaf().then(|| (element, span.clone()));
                tokens.push((Token::TagOpen(element), span));
            }
            Ok(TagToken::Close(name)) => {
                open_leaf = None;
                let element = tag_element(source, &name, span.clone())?;
                tokens.push((Token::TagClose(element), span));
            }
            Ok(TagToken::SelfClose) => {
                open_leaf = None;
                tokens.push((Token::TagSelfClose, span));
            }
            Ok(TagToken::Attr(attr)) => tokens.push((Token::Attr(attr), span)),
            Ok(TagToken::End) => {
                tokens.push((Token::TagEnd, span.clone()));
                if let Some((element, open_span)) = open_leaf.take() {
                    let rest = lexer.remainder();
                    let Some(len) = find_close_tag(rest, element.keyword()) else {
                        return Err(ParseError::Unterminated {
                            fragment: fragment_at(source, &(open_span.start..source.len())),
                            span: open_span.start..source.len(),
                            element: element.keyword().to_string(),
                        });
                    };
                    let content_span = span.end..span.end + len;
                    tokens.push((Token::Content(rest[..len].trim().to_string()), content_span));
                    lexer.bump(len);
                }
            }
            Ok(TagToken::Comment) => {}
            Err(err) => {
                let rest = &source[span.start..];
                let starts_keyword = rest
                    .split(|c: char| !c.is_ascii_alphabetic())
                    .next()
                    .and_then(Element::from_keyword)
                    .is_some();
                if rest.starts_with('{') || rest.starts_with('}') || starts_keyword {
                    return Err(ParseError::MixedSyntax {
                        fragment: fragment_at(source, &(span.start..source.len())),
                        span,
                    });
                }
                return Err(lex_failure(source, span, &err));
            }
        }
    }
    Ok(tokens)
}

fn tag_element(source: &str, name: &str, span: Span) -> Result<Element, ParseError> {
    Element::from_keyword(name).ok_or_else(|| {
        ParseError::syntax(source, span, format!("unknown element `{}`", name))
    })
}

/// Offset of the `</KEYWORD>` tag closing a leaf's content
fn find_close_tag(rest: &str, keyword: &str) -> Option<usize> {
    let pattern = format!("</{}", keyword);
    let mut from = 0;
    while let Some(offset) = rest[from..].find(&pattern) {
        let at = from + offset;
        let after = rest[at + pattern.len()..].trim_start();
        if after.starts_with('>') {
            return Some(at);
        }
        from = at + pattern.len();
    }
    None
}

fn lex_failure(source: &str, span: Span, err: &LexError) -> ParseError {
    // Point at the value that failed, not just the `key=` prefix
    let wide = span.start..source.len();
    match err {
        LexError::Unexpected => ParseError::syntax(source, span, err.message()),
        LexError::UnterminatedString | LexError::UnclosedHtml(_) | LexError::UnbalancedValue => {
            ParseError::Unbalanced {
                fragment: fragment_at(source, &wide),
                span,
                message: err.message(),
            }
        }
    }
}
