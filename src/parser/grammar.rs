//! Shared script grammar using chumsky
//!
//! Tokens from either front end are checked for delimiter balance and then
//! parsed into a [`Script`].

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::{fragment_at, ParseError, Span};
use crate::parser::ast::*;
use crate::parser::lexer::{self, Element, Token};

/// Parse script source into an AST
pub fn parse_script(source: &str) -> Result<Script, ParseError> {
    let (syntax, tokens) = lexer::lex(source)?;
    check_balance(source, &tokens)?;

    let len = source.len();
    let token_iter = tokens
        .into_iter()
        .map(|(tok, span)| (tok, SimpleSpan::from(span)));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    script_parser()
        .parse(token_stream)
        .into_result()
        .map(|nodes| Script { syntax, nodes })
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => ParseError::from_rich(err, source),
            None => ParseError::syntax(source, 0..len, "invalid script"),
        })
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

#[derive(Debug, Clone, Copy)]
enum Opener {
    Brace,
    Tag(Element),
}

/// Reject unmatched `{`/`}` and tags before parsing so the error names the
/// offending delimiter instead of the first token the grammar trips on
fn check_balance(source: &str, tokens: &[(Token, Span)]) -> Result<(), ParseError> {
    let mut stack: Vec<(Opener, Span)> = vec![];
    let mut last_keyword = 0;

    for (token, span) in tokens {
        match token {
            Token::Keyword(_) => last_keyword = span.start,
            Token::BraceOpen => stack.push((Opener::Brace, last_keyword..span.end)),
            Token::BraceClose => match stack.pop() {
                Some((Opener::Brace, _)) => {}
                _ => {
                    return Err(ParseError::unbalanced(
                        source,
                        span.clone(),
                        "`}` has no matching `{`",
                    ))
                }
            },
            Token::TagOpen(element) => stack.push((Opener::Tag(*element), span.clone())),
            Token::TagSelfClose => {
                stack.pop();
            }
            Token::TagClose(element) => match stack.pop() {
                Some((Opener::Tag(open), _)) if open == *element => {}
                Some((Opener::Tag(open), _)) => {
                    return Err(ParseError::unbalanced(
                        source,
                        span.clone(),
                        format!("`</{}>` does not close `<{}>`", element, open),
                    ))
                }
                _ => {
                    return Err(ParseError::unbalanced(
                        source,
                        span.clone(),
                        format!("`</{}>` has no matching `<{}>`", element, element),
                    ))
                }
            },
            _ => {}
        }
    }

    match stack.pop() {
        None => Ok(()),
        Some((opener, span)) => {
            let message = match opener {
                Opener::Brace => "`{` is never closed".to_string(),
                Opener::Tag(element) => format!("`<{}>` is never closed", element),
            };
            Err(ParseError::Unbalanced {
                fragment: fragment_at(source, &(span.start..source.len())),
                span,
                message,
            })
        }
    }
}

fn script_parser<'a, I>(
) -> impl Parser<'a, I, Vec<Spanned<ScriptNode>>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let attribute = select! {
        Token::Attr(attr) => attr,
    }
    .map_with(|attr, e| Spanned::new(attr, span_range(&e.span())));

    let attributes = attribute.repeated().collect::<Vec<_>>();

    let node = recursive(|node| {
        // KEYWORD attr=value ... { children }
        let brace_node = select! { Token::Keyword(element) => element }
            .then(attributes.clone())
            .then(
                node.clone()
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
                    .or_not(),
            )
            .map(|((element, attributes), children)| ScriptNode {
                element,
                attributes,
                body: children.map_or(NodeBody::Empty, NodeBody::Children),
            });

        let content = select! { Token::Content(text) => NodeBody::Content(text) };
        let children = node
            .repeated()
            .collect::<Vec<_>>()
            .map(NodeBody::Children);

        // <KIND attr=value ...> body </KIND> or <KIND ... />
        let tag_node = select! { Token::TagOpen(element) => element }
            .then(attributes)
            .then(choice((
                just(Token::TagSelfClose).to(None),
                just(Token::TagEnd)
                    .ignore_then(choice((content, children)))
                    .then(select! { Token::TagClose(element) => element })
                    .map(Some),
            )))
            .try_map(|((element, attributes), rest), span| match rest {
                None => Ok(ScriptNode {
                    element,
                    attributes,
                    body: NodeBody::Empty,
                }),
                Some((body, closing)) if closing == element => Ok(ScriptNode {
                    element,
                    attributes,
                    body,
                }),
                Some((_, closing)) => Err(Rich::custom(
                    span,
                    format!("`</{}>` does not close `<{}>`", closing, element),
                )),
            });

        choice((brace_node, tag_node))
            .map_with(|node, e| Spanned::new(node, span_range(&e.span())))
            .boxed()
    });

    node.repeated().collect::<Vec<_>>().then_ignore(end())
}
