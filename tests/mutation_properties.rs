//! Structural invariants that every tree edit must keep

use email_builder::edit::{
    add_column, add_row, delete_column, delete_row, duplicate_block, duplicate_row, move_block,
    move_row, resize_columns, set_block_attribute,
};
use email_builder::starter;
use email_builder::{
    compile, BlockSource, DropTarget, Email, GridConfig, Mutation, MutationError, Position,
};
use pretty_assertions::assert_eq;

fn assert_grid_conserved(email: &Email) {
    for row in &email.rows {
        assert_eq!(row.grid_total(), 12, "row {}", row.id);
        assert!(!row.columns.is_empty(), "row {} has no columns", row.id);
    }
}

fn assert_unique_ids(email: &Email) {
    let mut ids = email.ids();
    let count = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), count);
}

#[test]
fn test_grid_conserved_across_column_edits() {
    let grid = GridConfig::default();
    let mut email = starter::newsletter();
    let row_id = email.rows[2].id.clone();

    for _ in 0..3 {
        email = add_column(&email, &row_id, &grid);
        assert_grid_conserved(&email);
    }
    assert_eq!(email.rows[2].columns.len(), 4);

    let first = email.rows[2].columns[0].id.clone();
    for percent in [10.0, 40.0, 75.0, 0.0, 100.0] {
        email = resize_columns(&email, &row_id, &first, percent, &grid);
        assert_grid_conserved(&email);
        assert!(email.rows[2]
            .columns
            .iter()
            .all(|c| c.units >= grid.min_column_units));
    }

    while email.rows[2].columns.len() > 1 {
        let last = email.rows[2].columns.last().map(|c| c.id.clone()).unwrap_or_default();
        email = delete_column(&email, &last, &grid);
        assert_grid_conserved(&email);
    }
    assert_eq!(email.rows[2].columns[0].units, 12);
}

#[test]
fn test_add_row_widths_conserve_grid() {
    let email = compile("ROW { }").expect("Should compile");
    for widths in [vec![50.0, 50.0], vec![33.3, 33.3, 33.4], vec![25.0, 75.0]] {
        let edited = add_row(&email, &widths, None);
        assert_eq!(edited.rows.len(), 2);
        assert_grid_conserved(&edited);
    }
}

#[test]
fn test_duplicates_keep_ids_unique() {
    let mut email = starter::promotion();
    for _ in 0..3 {
        let row_id = email.rows[1].id.clone();
        email = duplicate_row(&email, &row_id);
        let block_id = email.rows[3].columns[0].blocks[0].id.clone();
        email = duplicate_block(&email, &block_id);
        assert_unique_ids(&email);
    }
    assert_eq!(email.rows.len(), starter::promotion().rows.len() + 3);
}

#[test]
fn test_move_block_scenario() {
    let email = compile("ROW { COLUMN { TEXT id=A TEXT id=B } }").expect("Should compile");
    let moved = move_block(
        &email,
        BlockSource::Existing("A".into()),
        DropTarget::Block("B".into()),
        Position::Below,
    );
    let ids: Vec<&str> = moved.rows[0].columns[0]
        .blocks
        .iter()
        .map(|b| b.id.as_str())
        .collect();
    assert_eq!(ids, vec!["B", "A"]);
}

#[test]
fn test_move_row_lands_before_hover_row() {
    let email = compile("ROW id=a { } ROW id=b { } ROW id=c { } ROW id=d { }").expect("Should compile");
    let ids = |email: &Email| email.rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>();

    assert_eq!(ids(&move_row(&email, "a", "c")), vec!["b", "a", "c", "d"]);
    assert_eq!(ids(&move_row(&email, "d", "b")), vec!["a", "d", "b", "c"]);
    assert_eq!(ids(&move_row(&email, "a", "b")), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_rejected_edits_leave_document_unchanged() {
    let grid = GridConfig::default();
    let email = starter::welcome();
    let footer = email.rows[3].columns[0].id.clone();

    assert_eq!(delete_column(&email, &footer, &grid), email);
    assert_eq!(delete_row(&email, "missing"), email);
    assert_eq!(set_block_attribute(&email, "missing", "color", "#FFF"), email);
    assert_eq!(
        add_column(&email, &email.rows[0].id, &grid.clone().with_max_columns(2)),
        email
    );
}

#[test]
fn test_apply_reports_rejection() {
    let email = starter::welcome();
    let op = Mutation::DeleteColumn {
        column_id: email.rows[3].columns[0].id.clone(),
    };
    assert_eq!(op.apply(&email, &GridConfig::default()), Err(MutationError::LastColumn));

    let op = Mutation::DeleteRow {
        row_id: "nope".into(),
    };
    assert_eq!(
        op.apply(&email, &GridConfig::default()),
        Err(MutationError::RowNotFound("nope".into()))
    );
}

#[test]
fn test_mutations_from_json() {
    let ops: Vec<Mutation> = serde_json::from_str(
        r##"[
            {"op": "add_column", "row_id": "row-1"},
            {"op": "set_block_attribute", "block_id": "block-3", "key": "color", "value": "#FF0000"},
            {"op": "move_row", "drag_id": "row-1", "hover_id": "row-11"}
        ]"##,
    )
    .expect("Should deserialize");
    assert_eq!(ops[0].name(), "add_column");

    let grid = GridConfig::default();
    let email = ops
        .iter()
        .fold(starter::welcome(), |email, op| op.apply_or_keep(&email, &grid));
    assert_grid_conserved(&email);
    assert_eq!(email.rows[1].id, "row-1");
    assert_eq!(email.rows[1].columns.len(), 3);
    assert_eq!(
        email.rows[1].columns[0].blocks[0].attributes.get_str("color"),
        Some("#FF0000")
    );
}
