//! Template script compiler
//!
//! ```text
//! ROW type=header padding=8,16 { COLUMN { TEXT content=<p>Hi</p> } }
//! ```
//!
//! or the equivalent tag form:
//!
//! ```text
//! <EMAIL><ROW type=header padding=8,16><COLUMN><TEXT><p>Hi</p></TEXT></COLUMN></ROW></EMAIL>
//! ```

pub mod ast;
mod grammar;
pub mod lexer;
mod lower;

use tracing::{debug, instrument};

pub use ast::*;
pub use grammar::parse_script;
pub use lexer::{Element, RawAttribute, RawValue, Syntax, Token};
pub use lower::{CompileOptions, DEFAULT_DOCUMENT_ID};

use crate::error::ParseError;
use crate::model::Email;

/// Compile a script into a document
pub fn compile(source: &str) -> Result<Email, ParseError> {
    compile_with(source, &CompileOptions::default())
}

/// Compile a script, seeding document fields the script leaves out
#[instrument(skip_all, fields(len = source.len()))]
pub fn compile_with(source: &str, options: &CompileOptions) -> Result<Email, ParseError> {
    let script = parse_script(source)?;
    let email = lower::lower(&script, source, options)?;
    debug!(
        syntax = ?script.syntax,
        rows = email.rows.len(),
        blocks = email.blocks().count(),
        "compiled template script"
    );
    Ok(email)
}
