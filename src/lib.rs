//! Email Builder - template documents for email-safe HTML
//!
//! This library compiles a compact template script into a row/column/block
//! document, resolves each node's effective styling through a layered
//! cascade, edits the tree without breaking its invariants, and exports it
//! as HTML or script.
//!
//! # Example
//!
//! ```rust
//! use email_builder::render;
//!
//! let html = render("ROW { COLUMN { TEXT content=<p>Hi</p> } }").unwrap();
//! assert!(html.contains("<p>Hi</p>"));
//! ```

pub mod cascade;
pub mod config;
pub mod edit;
pub mod error;
pub mod model;
pub mod parser;
pub mod renderer;
pub mod starter;
pub mod theme;

pub use cascade::{resolve, resolve_email, Company, ResolveContext, ResolvedEmail};
pub use config::{ConfigError, EngineConfig, GridConfig, RenderConfig};
pub use edit::{BlockSource, DropTarget, Mutation, MutationError, Position};
pub use error::ParseError;
pub use model::{AttrValue, Attributes, Block, BlockKind, Column, Email, Row, RowType, StyleVariant};
pub use parser::{compile, compile_with, CompileOptions};
pub use renderer::{to_html, to_script, to_tag_script};
pub use theme::{derive_theme, ThemePalette};

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),
}

impl From<Vec<ParseError>> for RenderError {
    fn from(errors: Vec<ParseError>) -> Self {
        RenderError::Parse(errors)
    }
}

impl From<ParseError> for RenderError {
    fn from(error: ParseError) -> Self {
        RenderError::Parse(vec![error])
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Compile a script and export it as HTML with default settings
pub fn render(source: &str) -> Result<String, RenderError> {
    render_with(source, &ResolveContext::default())
}

/// Compile a script and export it as HTML for the given view
///
/// # Example
///
/// ```rust
/// use email_builder::{render_with, Company, RenderConfig, ResolveContext};
///
/// let ctx = ResolveContext::new()
///     .with_mobile_view(true)
///     .with_company(Company::with_logo("https://cdn.example.com/logo.png"))
///     .with_config(RenderConfig::default().with_pretty_print(false));
///
/// let html = render_with("ROW { COLUMN { IMAGE src=logo } }", &ctx).unwrap();
/// assert!(html.contains("https://cdn.example.com/logo.png"));
/// ```
pub fn render_with(source: &str, ctx: &ResolveContext) -> Result<String, RenderError> {
    let email = compile(source)?;
    let resolved = resolve_email(&email, ctx);
    Ok(to_html(&resolved, &ctx.config))
}
