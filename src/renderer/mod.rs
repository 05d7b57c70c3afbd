//! Exporters for documents and resolved documents
//!
//! [`to_html`] turns a resolved tree into an email-safe HTML document;
//! [`to_script`] and [`to_tag_script`] write the raw tree back as template
//! script.

pub mod content;
pub mod html;
pub mod script;

pub use content::{normalize_html, plain_text};
pub use html::to_html;
pub use script::{to_script, to_tag_script};
