//! End-to-end engine scenarios: inference, deferred edits, batched undo.

use cellgrid_core::{CellValue, Column, ColumnType, RowData, Schema};
use cellgrid_engine::{infer_sequence, CommandQueue, DataModel, SequenceRegistry};
use cellgrid_protocol::Command;

#[test]
fn test_numeric_seed_continues() {
    let seed = [CellValue::Number(2.0), CellValue::Number(4.0), CellValue::Number(6.0)];
    let next: Vec<CellValue> = infer_sequence(&seed, &SequenceRegistry::builtin()).take(3).collect();
    assert_eq!(next, vec![CellValue::Number(8.0), CellValue::Number(10.0), CellValue::Number(12.0)]);
}

#[test]
fn test_month_seed_continues() {
    let seed = [CellValue::text("Jan"), CellValue::text("Feb")];
    let registry = SequenceRegistry::builtin().with_languages(["en"]);
    assert_eq!(infer_sequence(&seed, &registry).next(), Some(CellValue::text("Mar")));
}

#[test]
fn test_unpatterned_seed_cycles() {
    let seed = [CellValue::text("A"), CellValue::text("C"), CellValue::text("B")];
    let next: Vec<CellValue> = infer_sequence(&seed, &SequenceRegistry::builtin()).take(4).collect();
    assert_eq!(
        next,
        vec![CellValue::text("A"), CellValue::text("C"), CellValue::text("B"), CellValue::text("A")]
    );
}

#[test]
fn test_deferred_cell_then_apply() {
    let schema = Schema::new(vec![Column::new("x", ColumnType::Number)]).unwrap();
    let mut model = DataModel::new(schema).with_data(vec![RowData::keyed([("x", CellValue::Number(1.0))])]);
    let row = model.row_id_at(0).unwrap();

    model.set_cell(row, "x", CellValue::Number(5.0), false);
    assert_eq!(model.get_cell(row, "x"), Some(CellValue::Number(5.0)));
    assert_eq!(model.get_raw_cell(row, "x"), Some(CellValue::Number(1.0)));

    model.apply_pending(row);
    assert_eq!(model.get_raw_cell(row, "x"), Some(CellValue::Number(5.0)));
}

#[test]
fn test_batched_commands_undo_together() {
    let mut queue = CommandQueue::new();
    let row = cellgrid_core::RowId(1);
    let cmd1 = Command::edit(row, "x", CellValue::Empty, CellValue::Number(1.0)).with_batch("b1");
    let cmd2 = Command::edit(row, "y", CellValue::Empty, CellValue::Number(2.0)).with_batch("b1");
    queue.enqueue(cmd1.clone());
    queue.enqueue(cmd2.clone());

    let batch = queue.undo().unwrap();
    assert_eq!(batch.batch_id.as_deref(), Some("b1"));
    assert_eq!(batch.commands, vec![cmd1, cmd2]);
    assert!(!queue.can_undo());
}
