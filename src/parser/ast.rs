//! Abstract syntax tree for template scripts
//!
//! Both surface syntaxes lower to this tree before it is turned into a
//! document.

use crate::error::Span;

use super::lexer::{Element, RawAttribute, Syntax};

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed script
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub syntax: Syntax,
    pub nodes: Vec<Spanned<ScriptNode>>,
}

/// One element with its attributes and body
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptNode {
    pub element: Element,
    pub attributes: Vec<Spanned<RawAttribute>>,
    pub body: NodeBody,
}

impl ScriptNode {
    pub fn attribute(&self, key: &str) -> Option<&Spanned<RawAttribute>> {
        self.attributes.iter().find(|a| a.node.key == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    /// Brace-form leaf without braces, or a self-closing tag
    Empty,
    Children(Vec<Spanned<ScriptNode>>),
    /// Text between a tag-form leaf's opening and closing tags
    Content(String),
}
