//! Template document model

pub mod attributes;
pub mod document;
pub mod ids;

pub use attributes::{AttrValue, Attributes};
pub use document::{
    format_percent, percent_to_units, units_to_percent, Block, BlockKind, Column, Email, Row,
    RowType, StyleVariant, GRID_UNITS,
};
pub use ids::IdGenerator;
