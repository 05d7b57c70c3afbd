//! Tree mutations
//!
//! Every operation takes a document and returns a new one. An operation
//! that would break an invariant (unique ids, twelve grid units per row)
//! is rejected: the public functions log the rejection and hand back an
//! unchanged copy, while [`Mutation::apply`] reports it as a
//! [`MutationError`].

pub mod grid;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::model::{
    AttrValue, Block, BlockKind, Column, Email, IdGenerator, Row, RowType, StyleVariant,
    GRID_UNITS,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("No column to the right of {0}")]
    NoAdjacentColumn(String),

    #[error("Row already has the maximum of {max} columns")]
    ColumnLimit { max: usize },

    #[error("No column is wide enough to donate width")]
    NoDonorColumn,

    #[error("Cannot delete the only column of a row")]
    LastColumn,

    #[error("Columns spanning {units} units cannot both keep {min} units")]
    BelowMinimum { units: u8, min: u8 },

    #[error("Node cannot be moved relative to itself: {0}")]
    SameNode(String),

    #[error("Invalid column widths: {0}")]
    InvalidWidths(String),
}

/// Where a dropped block lands relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Above,
    Below,
}

/// Block being dropped: an existing one or a new one from the palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    Existing(String),
    New(BlockKind),
}

/// What a block is dropped onto
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTarget {
    /// Next to a sibling block
    Block(String),
    /// At the start (above) or end (below) of a column
    Column(String),
}

/// A tree operation as data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    MoveRow {
        drag_id: String,
        hover_id: String,
    },
    MoveBlock {
        source: BlockSource,
        target: DropTarget,
        position: Position,
    },
    DuplicateRow {
        row_id: String,
    },
    DuplicateBlock {
        block_id: String,
    },
    DeleteRow {
        row_id: String,
    },
    DeleteBlock {
        block_id: String,
    },
    ResizeColumns {
        row_id: String,
        left_column_id: String,
        left_percent: f64,
    },
    AddColumn {
        row_id: String,
    },
    DeleteColumn {
        column_id: String,
    },
    AddRow {
        widths: Vec<f64>,
        #[serde(default)]
        position: Option<usize>,
    },
    InsertRow {
        row: Row,
        #[serde(default)]
        position: Option<usize>,
    },
    SetBlockAttribute {
        block_id: String,
        key: String,
        value: AttrValue,
    },
    RemoveBlockAttribute {
        block_id: String,
        key: String,
    },
    SetBlockContent {
        block_id: String,
        content: Option<String>,
    },
    SetRowAttribute {
        row_id: String,
        key: String,
        value: AttrValue,
    },
    SetRowType {
        row_id: String,
        row_type: Option<RowType>,
    },
    SetStyleVariant {
        variant: Option<StyleVariant>,
    },
    SetTheme {
        seed: Option<String>,
    },
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::MoveRow { .. } => "move_row",
            Mutation::MoveBlock { .. } => "move_block",
            Mutation::DuplicateRow { .. } => "duplicate_row",
            Mutation::DuplicateBlock { .. } => "duplicate_block",
            Mutation::DeleteRow { .. } => "delete_row",
            Mutation::DeleteBlock { .. } => "delete_block",
            Mutation::ResizeColumns { .. } => "resize_columns",
            Mutation::AddColumn { .. } => "add_column",
            Mutation::DeleteColumn { .. } => "delete_column",
            Mutation::AddRow { .. } => "add_row",
            Mutation::InsertRow { .. } => "insert_row",
            Mutation::SetBlockAttribute { .. } => "set_block_attribute",
            Mutation::RemoveBlockAttribute { .. } => "remove_block_attribute",
            Mutation::SetBlockContent { .. } => "set_block_content",
            Mutation::SetRowAttribute { .. } => "set_row_attribute",
            Mutation::SetRowType { .. } => "set_row_type",
            Mutation::SetStyleVariant { .. } => "set_style_variant",
            Mutation::SetTheme { .. } => "set_theme",
        }
    }

    /// Apply to a copy of `email`
    pub fn apply(&self, email: &Email, grid: &GridConfig) -> Result<Email, MutationError> {
        let mut next = email.clone();
        match self {
            Mutation::MoveRow { drag_id, hover_id } => apply_move_row(&mut next, drag_id, hover_id)?,
            Mutation::MoveBlock {
                source,
                target,
                position,
            } => apply_move_block(&mut next, source, target, *position)?,
            Mutation::DuplicateRow { row_id } => apply_duplicate_row(&mut next, row_id)?,
            Mutation::DuplicateBlock { block_id } => apply_duplicate_block(&mut next, block_id)?,
            Mutation::DeleteRow { row_id } => {
                let index = row_index(&next, row_id)?;
                next.rows.remove(index);
            }
            Mutation::DeleteBlock { block_id } => {
                let (ri, ci, bi) = block_position(&next, block_id)?;
                next.rows[ri].columns[ci].blocks.remove(bi);
            }
            Mutation::ResizeColumns {
                row_id,
                left_column_id,
                left_percent,
            } => apply_resize(&mut next, row_id, left_column_id, *left_percent, grid)?,
            Mutation::AddColumn { row_id } => apply_add_column(&mut next, row_id, grid)?,
            Mutation::DeleteColumn { column_id } => apply_delete_column(&mut next, column_id)?,
            Mutation::AddRow { widths, position } => {
                let units = grid::units_from_percentages(widths)?;
                let mut ids = IdGenerator::for_email(&next);
                let columns = units
                    .into_iter()
                    .map(|u| Column::new(ids.next_id("column"), u))
                    .collect();
                let row = Row::new(ids.next_id("row"), columns);
                insert_at(&mut next.rows, *position, row);
            }
            Mutation::InsertRow { row, position } => {
                if row.columns.len() > usize::from(GRID_UNITS) {
                    return Err(MutationError::InvalidWidths(format!(
                        "{} columns do not fit {} grid units",
                        row.columns.len(),
                        GRID_UNITS
                    )));
                }
                let mut ids = IdGenerator::for_email(&next);
                let row = fit_row(copy_row(row, &mut ids), &mut ids);
                insert_at(&mut next.rows, *position, row);
            }
            Mutation::SetBlockAttribute {
                block_id,
                key,
                value,
            } => {
                block_mut(&mut next, block_id)?
                    .attributes
                    .set(key.clone(), value.clone());
            }
            Mutation::RemoveBlockAttribute { block_id, key } => {
                block_mut(&mut next, block_id)?.attributes.remove(key);
            }
            Mutation::SetBlockContent { block_id, content } => {
                block_mut(&mut next, block_id)?.content = content.clone();
            }
            Mutation::SetRowAttribute { row_id, key, value } => {
                let index = row_index(&next, row_id)?;
                next.rows[index].attributes.set(key.clone(), value.clone());
            }
            Mutation::SetRowType { row_id, row_type } => {
                let index = row_index(&next, row_id)?;
                next.rows[index].row_type = row_type.clone();
            }
            Mutation::SetStyleVariant { variant } => next.style_variant = *variant,
            Mutation::SetTheme { seed } => next.theme = seed.clone(),
        }
        debug!(operation = self.name(), "applied mutation");
        Ok(next)
    }

    /// Apply, or return an unchanged copy when the operation is rejected
    pub fn apply_or_keep(&self, email: &Email, grid: &GridConfig) -> Email {
        match self.apply(email, grid) {
            Ok(next) => next,
            Err(err) => {
                warn!(operation = self.name(), error = %err, "rejected mutation");
                email.clone()
            }
        }
    }
}

fn row_index(email: &Email, row_id: &str) -> Result<usize, MutationError> {
    email
        .row_index(row_id)
        .ok_or_else(|| MutationError::RowNotFound(row_id.to_string()))
}

fn column_position(email: &Email, column_id: &str) -> Result<(usize, usize), MutationError> {
    email
        .column_position(column_id)
        .ok_or_else(|| MutationError::ColumnNotFound(column_id.to_string()))
}

fn block_position(email: &Email, block_id: &str) -> Result<(usize, usize, usize), MutationError> {
    email
        .block_position(block_id)
        .ok_or_else(|| MutationError::BlockNotFound(block_id.to_string()))
}

fn block_mut<'e>(email: &'e mut Email, block_id: &str) -> Result<&'e mut Block, MutationError> {
    let (ri, ci, bi) = block_position(email, block_id)?;
    Ok(&mut email.rows[ri].columns[ci].blocks[bi])
}

fn insert_at<T>(items: &mut Vec<T>, position: Option<usize>, item: T) {
    let index = position.map_or(items.len(), |p| p.min(items.len()));
    items.insert(index, item);
}

/// Copy a row giving it and every node under it a fresh id
fn copy_row(row: &Row, ids: &mut IdGenerator) -> Row {
    Row {
        id: ids.next_id("row"),
        row_type: row.row_type.clone(),
        attributes: row.attributes.clone(),
        container: row.container.clone(),
        columns: row
            .columns
            .iter()
            .map(|column| Column {
                id: ids.next_id("column"),
                units: column.units,
                attributes: column.attributes.clone(),
                blocks: column.blocks.iter().map(|b| copy_block(b, ids)).collect(),
            })
            .collect(),
    }
}

fn copy_block(block: &Block, ids: &mut IdGenerator) -> Block {
    Block {
        id: ids.next_id("block"),
        kind: block.kind,
        content: block.content.clone(),
        attributes: block.attributes.clone(),
    }
}

/// Bring an externally built row onto the grid
fn fit_row(mut row: Row, ids: &mut IdGenerator) -> Row {
    if row.columns.is_empty() {
        row.columns.push(Column::new(ids.next_id("column"), GRID_UNITS));
    }
    if row.grid_total() != u32::from(GRID_UNITS) {
        let widths: Vec<u8> = row.columns.iter().map(|c| c.units.max(1)).collect();
        for (column, units) in row.columns.iter_mut().zip(grid::scale_units(&widths)) {
            column.units = units;
        }
    }
    row
}

fn apply_move_row(email: &mut Email, drag_id: &str, hover_id: &str) -> Result<(), MutationError> {
    if drag_id == hover_id {
        return Err(MutationError::SameNode(drag_id.to_string()));
    }
    let from = row_index(email, drag_id)?;
    let to = row_index(email, hover_id)?;
    let row = email.rows.remove(from);
    // Removal shifts the hover row up by one when dragging downwards
    let at = if from < to { to - 1 } else { to };
    email.rows.insert(at, row);
    Ok(())
}

fn apply_move_block(
    email: &mut Email,
    source: &BlockSource,
    target: &DropTarget,
    position: Position,
) -> Result<(), MutationError> {
    // Validate the target before anything is detached
    match target {
        DropTarget::Block(target_id) => {
            block_position(email, target_id)?;
            if let BlockSource::Existing(id) = source {
                if id == target_id {
                    return Err(MutationError::SameNode(id.clone()));
                }
            }
        }
        DropTarget::Column(column_id) => {
            column_position(email, column_id)?;
        }
    }

    let block = match source {
        BlockSource::Existing(id) => {
            let (ri, ci, bi) = block_position(email, id)?;
            email.rows[ri].columns[ci].blocks.remove(bi)
        }
        BlockSource::New(kind) => {
            let mut ids = IdGenerator::for_email(email);
            Block::new(ids.next_id("block"), *kind)
        }
    };

    let (ri, ci, index) = match target {
        DropTarget::Block(target_id) => {
            let (ri, ci, bi) = block_position(email, target_id)?;
            match position {
                Position::Above => (ri, ci, bi),
                Position::Below => (ri, ci, bi + 1),
            }
        }
        DropTarget::Column(column_id) => {
            let (ri, ci) = column_position(email, column_id)?;
            match position {
                Position::Above => (ri, ci, 0),
                Position::Below => (ri, ci, email.rows[ri].columns[ci].blocks.len()),
            }
        }
    };
    email.rows[ri].columns[ci].blocks.insert(index, block);
    Ok(())
}

fn apply_duplicate_row(email: &mut Email, row_id: &str) -> Result<(), MutationError> {
    let index = row_index(email, row_id)?;
    let mut ids = IdGenerator::for_email(email);
    let copy = copy_row(&email.rows[index], &mut ids);
    email.rows.insert(index + 1, copy);
    Ok(())
}

fn apply_duplicate_block(email: &mut Email, block_id: &str) -> Result<(), MutationError> {
    let (ri, ci, bi) = block_position(email, block_id)?;
    let mut ids = IdGenerator::for_email(email);
    let blocks = &mut email.rows[ri].columns[ci].blocks;
    let copy = copy_block(&blocks[bi], &mut ids);
    blocks.insert(bi + 1, copy);
    Ok(())
}

fn apply_resize(
    email: &mut Email,
    row_id: &str,
    left_column_id: &str,
    left_percent: f64,
    config: &GridConfig,
) -> Result<(), MutationError> {
    let ri = row_index(email, row_id)?;
    let columns = &mut email.rows[ri].columns;
    let left = columns
        .iter()
        .position(|c| c.id == left_column_id)
        .ok_or_else(|| MutationError::ColumnNotFound(left_column_id.to_string()))?;
    if left + 1 >= columns.len() {
        return Err(MutationError::NoAdjacentColumn(left_column_id.to_string()));
    }

    let (l, r) = grid::resize_pair(
        columns[left].units,
        columns[left + 1].units,
        left_percent,
        config,
    )?;
    columns[left].units = l;
    columns[left + 1].units = r;
    Ok(())
}

fn apply_add_column(email: &mut Email, row_id: &str, config: &GridConfig) -> Result<(), MutationError> {
    let ri = row_index(email, row_id)?;
    let units: Vec<u8> = email.rows[ri].columns.iter().map(|c| c.units).collect();
    let (donor, next) = grid::add_column(&units, config)?;
    debug!(row = row_id, donor, "adding column");

    let id = IdGenerator::for_email(email).next_id("column");
    let columns = &mut email.rows[ri].columns;
    for (column, units) in columns.iter_mut().zip(&next) {
        column.units = *units;
    }
    columns.push(Column::new(id, config.new_column_units));
    Ok(())
}

fn apply_delete_column(email: &mut Email, column_id: &str) -> Result<(), MutationError> {
    let (ri, ci) = column_position(email, column_id)?;
    let units: Vec<u8> = email.rows[ri].columns.iter().map(|c| c.units).collect();
    let next = grid::delete_column(&units, ci)?;

    let columns = &mut email.rows[ri].columns;
    columns.remove(ci);
    for (column, units) in columns.iter_mut().zip(next) {
        column.units = units;
    }
    Ok(())
}

pub fn move_row(email: &Email, drag_id: &str, hover_id: &str) -> Email {
    Mutation::MoveRow {
        drag_id: drag_id.to_string(),
        hover_id: hover_id.to_string(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

/// Move an existing block, or insert a new one, next to a target
pub fn move_block(
    email: &Email,
    source: BlockSource,
    target: DropTarget,
    position: Position,
) -> Email {
    Mutation::MoveBlock {
        source,
        target,
        position,
    }
    .apply_or_keep(email, &GridConfig::default())
}

/// Copy a row with fresh ids right after the original
pub fn duplicate_row(email: &Email, row_id: &str) -> Email {
    Mutation::DuplicateRow {
        row_id: row_id.to_string(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn duplicate_block(email: &Email, block_id: &str) -> Email {
    Mutation::DuplicateBlock {
        block_id: block_id.to_string(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn delete_row(email: &Email, row_id: &str) -> Email {
    Mutation::DeleteRow {
        row_id: row_id.to_string(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

/// Remove a block; its column stays even when left empty
pub fn delete_block(email: &Email, block_id: &str) -> Email {
    Mutation::DeleteBlock {
        block_id: block_id.to_string(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

/// Drag the divider right of `left_column_id` to `left_percent` of the row
pub fn resize_columns(
    email: &Email,
    row_id: &str,
    left_column_id: &str,
    left_percent: f64,
    grid: &GridConfig,
) -> Email {
    Mutation::ResizeColumns {
        row_id: row_id.to_string(),
        left_column_id: left_column_id.to_string(),
        left_percent,
    }
    .apply_or_keep(email, grid)
}

pub fn add_column(email: &Email, row_id: &str, grid: &GridConfig) -> Email {
    Mutation::AddColumn {
        row_id: row_id.to_string(),
    }
    .apply_or_keep(email, grid)
}

pub fn delete_column(email: &Email, column_id: &str, grid: &GridConfig) -> Email {
    Mutation::DeleteColumn {
        column_id: column_id.to_string(),
    }
    .apply_or_keep(email, grid)
}

/// New row with one empty column per percentage width
pub fn add_row(email: &Email, widths: &[f64], position: Option<usize>) -> Email {
    Mutation::AddRow {
        widths: widths.to_vec(),
        position,
    }
    .apply_or_keep(email, &GridConfig::default())
}

/// Insert a prebuilt row; every node in it gets a fresh id
pub fn insert_row(email: &Email, row: Row, position: Option<usize>) -> Email {
    Mutation::InsertRow { row, position }.apply_or_keep(email, &GridConfig::default())
}

pub fn set_block_attribute(
    email: &Email,
    block_id: &str,
    key: &str,
    value: impl Into<AttrValue>,
) -> Email {
    Mutation::SetBlockAttribute {
        block_id: block_id.to_string(),
        key: key.to_string(),
        value: value.into(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn remove_block_attribute(email: &Email, block_id: &str, key: &str) -> Email {
    Mutation::RemoveBlockAttribute {
        block_id: block_id.to_string(),
        key: key.to_string(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn set_block_content(email: &Email, block_id: &str, content: Option<String>) -> Email {
    Mutation::SetBlockContent {
        block_id: block_id.to_string(),
        content,
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn set_row_attribute(
    email: &Email,
    row_id: &str,
    key: &str,
    value: impl Into<AttrValue>,
) -> Email {
    Mutation::SetRowAttribute {
        row_id: row_id.to_string(),
        key: key.to_string(),
        value: value.into(),
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn set_row_type(email: &Email, row_id: &str, row_type: Option<RowType>) -> Email {
    Mutation::SetRowType {
        row_id: row_id.to_string(),
        row_type,
    }
    .apply_or_keep(email, &GridConfig::default())
}

pub fn set_style_variant(email: &Email, variant: Option<StyleVariant>) -> Email {
    Mutation::SetStyleVariant { variant }.apply_or_keep(email, &GridConfig::default())
}

pub fn set_theme(email: &Email, seed: Option<String>) -> Email {
    Mutation::SetTheme { seed }.apply_or_keep(email, &GridConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_ids(email: &Email, ri: usize, ci: usize) -> Vec<&str> {
        email.rows[ri].columns[ci]
            .blocks
            .iter()
            .map(|b| b.id.as_str())
            .collect()
    }

    fn row_ids(email: &Email) -> Vec<&str> {
        email.rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Email {
        let mut email = Email::new("e");
        let mut left = Column::new("c1", 6);
        left.blocks.push(Block::new("A", BlockKind::Text));
        left.blocks.push(Block::new("B", BlockKind::Button));
        let right = Column::new("c2", 6);
        email.rows.push(Row::new("r1", vec![left, right]));
        email.rows.push(Row::new("r2", vec![Column::new("c3", 12)]));
        email.rows.push(Row::new("r3", vec![Column::new("c4", 12)]));
        email
    }

    #[test]
    fn test_move_block_below_sibling() {
        let email = move_block(
            &sample(),
            BlockSource::Existing("A".into()),
            DropTarget::Block("B".into()),
            Position::Below,
        );
        assert_eq!(block_ids(&email, 0, 0), vec!["B", "A"]);
    }

    #[test]
    fn test_move_block_into_empty_column() {
        let email = move_block(
            &sample(),
            BlockSource::Existing("B".into()),
            DropTarget::Column("c2".into()),
            Position::Above,
        );
        assert_eq!(block_ids(&email, 0, 0), vec!["A"]);
        assert_eq!(block_ids(&email, 0, 1), vec!["B"]);
    }

    #[test]
    fn test_insert_new_block_above_sibling() {
        let email = move_block(
            &sample(),
            BlockSource::New(BlockKind::Divider),
            DropTarget::Block("B".into()),
            Position::Above,
        );
        let blocks = &email.rows[0].columns[0].blocks;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Divider);
        assert!(!["A", "B"].contains(&blocks[1].id.as_str()));
    }

    #[test]
    fn test_move_block_to_missing_target_is_noop() {
        let original = sample();
        let email = move_block(
            &original,
            BlockSource::Existing("A".into()),
            DropTarget::Block("missing".into()),
            Position::Below,
        );
        assert_eq!(email, original);
    }

    #[test]
    fn test_move_row_lands_before_hover() {
        let email = move_row(&sample(), "r3", "r1");
        assert_eq!(row_ids(&email), vec!["r3", "r1", "r2"]);

        let email = move_row(&sample(), "r1", "r3");
        assert_eq!(row_ids(&email), vec!["r2", "r1", "r3"]);

        let email = move_row(&sample(), "r1", "r2");
        assert_eq!(row_ids(&email), vec!["r1", "r2", "r3"]);

        let email = move_row(&sample(), "r3", "r2");
        assert_eq!(row_ids(&email), vec!["r1", "r3", "r2"]);

        let email = move_row(&sample(), "r1", "r1");
        assert_eq!(row_ids(&email), vec!["r1", "r2", "r3"]);
    }

    #[test]
    fn test_duplicate_row_fresh_ids() {
        let original = sample();
        let email = duplicate_row(&original, "r1");
        assert_eq!(email.rows.len(), 4);
        assert_eq!(email.rows[0], original.rows[0]);

        let copy = &email.rows[1];
        assert_ne!(copy.id, "r1");
        assert_eq!(copy.columns.len(), 2);
        assert_eq!(copy.columns[0].blocks.len(), 2);

        let mut ids = email.ids();
        let count = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }

    #[test]
    fn test_duplicate_block_inserts_after_original() {
        let email = duplicate_block(&sample(), "A");
        let ids = block_ids(&email, 0, 0);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], "A");
        assert_eq!(ids[2], "B");
        assert_eq!(email.rows[0].columns[0].blocks[1].kind, BlockKind::Text);
    }

    #[test]
    fn test_delete_block_keeps_empty_column() {
        let email = delete_block(&sample(), "A");
        let email = delete_block(&email, "B");
        assert_eq!(email.rows[0].columns.len(), 2);
        assert!(email.rows[0].columns[0].blocks.is_empty());
    }

    #[test]
    fn test_delete_row() {
        let email = delete_row(&sample(), "r2");
        assert_eq!(row_ids(&email), vec!["r1", "r3"]);
    }

    #[test]
    fn test_resize_keeps_pair_total() {
        let grid = GridConfig::default();
        let email = resize_columns(&sample(), "r1", "c1", 75.0, &grid);
        let units: Vec<u8> = email.rows[0].columns.iter().map(|c| c.units).collect();
        assert_eq!(units, vec![9, 3]);

        let email = resize_columns(&sample(), "r1", "c2", 50.0, &grid);
        assert_eq!(email, sample());
    }

    #[test]
    fn test_add_and_delete_column() {
        let grid = GridConfig::default();
        let email = add_column(&sample(), "r1", &grid);
        let units: Vec<u8> = email.rows[0].columns.iter().map(|c| c.units).collect();
        assert_eq!(units, vec![6, 4, 2]);

        let new_id = email.rows[0].columns[2].id.clone();
        let email = delete_column(&email, &new_id, &grid);
        let units: Vec<u8> = email.rows[0].columns.iter().map(|c| c.units).collect();
        assert_eq!(units, vec![7, 5]);

        let email = delete_column(&email, "c3", &grid);
        assert_eq!(email.rows[1].columns.len(), 1);
    }

    #[test]
    fn test_add_row_from_percentages() {
        let email = add_row(&sample(), &[25.0, 75.0], Some(1));
        let row = &email.rows[1];
        let units: Vec<u8> = row.columns.iter().map(|c| c.units).collect();
        assert_eq!(units, vec![3, 9]);
        assert_eq!(email.rows.len(), 4);

        let email = add_row(&sample(), &[], None);
        assert_eq!(email, sample());
    }

    #[test]
    fn test_insert_row_regenerates_ids() {
        let original = sample();
        let row = original.rows[0].clone();
        let email = insert_row(&original, row, None);
        let inserted = email.rows.last().unwrap();
        assert_ne!(inserted.id, "r1");
        assert_ne!(inserted.columns[0].blocks[0].id, "A");
    }

    #[test]
    fn test_insert_row_rejects_too_many_columns() {
        let original = sample();
        let columns = (0..13)
            .map(|i| {
                let mut column = Column::new(format!("wide-{}", i), 1);
                column
                    .blocks
                    .push(Block::new(format!("wide-block-{}", i), BlockKind::Text));
                column
            })
            .collect();
        let row = Row::new("wide", columns);

        let op = Mutation::InsertRow {
            row: row.clone(),
            position: None,
        };
        assert!(matches!(
            op.apply(&original, &GridConfig::default()),
            Err(MutationError::InvalidWidths(_))
        ));
        assert_eq!(insert_row(&original, row, None), original);
    }

    #[test]
    fn test_attribute_mutations() {
        let email = set_block_attribute(&sample(), "A", "color", "#FF0000");
        assert_eq!(
            email.rows[0].columns[0].blocks[0].attributes.get_str("color"),
            Some("#FF0000")
        );
        let email = remove_block_attribute(&email, "A", "color");
        assert!(!email.rows[0].columns[0].blocks[0].attributes.contains("color"));

        let email = set_block_content(&email, "A", Some("<p>Hi</p>".into()));
        assert_eq!(
            email.rows[0].columns[0].blocks[0].content.as_deref(),
            Some("<p>Hi</p>")
        );

        let email = set_row_type(&email, "r2", Some(RowType::Hero));
        assert_eq!(email.rows[1].row_type, Some(RowType::Hero));
        let email = set_row_attribute(&email, "r2", "paddingTop", 32.0);
        assert_eq!(
            email.rows[1].attributes.get("paddingTop"),
            Some(&AttrValue::Number(32.0))
        );

        let email = set_style_variant(&email, Some(StyleVariant::Clear));
        assert_eq!(email.variant(), StyleVariant::Clear);
        let email = set_theme(&email, Some("#10B981".into()));
        assert_eq!(email.theme.as_deref(), Some("#10B981"));
    }

    #[test]
    fn test_apply_reports_errors() {
        let grid = GridConfig::default();
        let err = Mutation::DeleteColumn {
            column_id: "c3".into(),
        }
        .apply(&sample(), &grid)
        .unwrap_err();
        assert_eq!(err, MutationError::LastColumn);

        let err = Mutation::DeleteRow {
            row_id: "nope".into(),
        }
        .apply(&sample(), &grid)
        .unwrap_err();
        assert_eq!(err, MutationError::RowNotFound("nope".into()));
    }

    #[test]
    fn test_mutation_json_round_trip() {
        let json = r#"{"op":"move_block","source":{"existing":"A"},"target":{"block":"B"},"position":"below"}"#;
        let mutation: Mutation = serde_json::from_str(json).expect("Should deserialize");
        let email = mutation
            .apply(&sample(), &GridConfig::default())
            .expect("Should apply");
        assert_eq!(block_ids(&email, 0, 0), vec!["B", "A"]);
    }
}
