//! Server adapter plumbing, scoped errors, auto-scroll and lifecycle.

mod common;

use cellgrid_core::{CellValue, RowData, SelectionRange};
use cellgrid_editor::{ErrorScope, Mode, PointerEvent, Viewport};
use cellgrid_protocol::{Command, InitialPayload, ServerEvent, User};
use common::*;
use serde_json::json;

fn them() -> User {
    User { id: "them".into(), name: "Them".into() }
}

#[test]
fn test_load_initial_installs_payload() {
    let mut h = harness(1);
    h.adapter.0.borrow_mut().initial = Some(InitialPayload {
        data: rows(4),
        schema: Some(schema()),
        view: Some(json!({"filter": "open"})),
        user: User { id: "u1".into(), name: "Ada".into() },
    });

    assert!(h.grid.load_initial());
    assert_eq!(h.grid.model().row_count(), 4);
    assert_eq!(h.grid.user().id, "u1");
    assert_eq!(h.grid.view(), &json!({"filter": "open"}));
    assert!(h.grid.history().is_empty());
    assert_eq!(h.grid.mode(), Mode::Idle);

    // A second fetch fails and is reported
    assert!(!h.grid.load_initial());
    assert!(h.grid.errors().get(ErrorScope::Commit).is_some());
}

#[test]
fn test_remote_commit_applies_without_history() {
    let mut h = harness(2);
    h.grid.connect();
    let id = h.row_id(1);
    let cmd = Command::edit(id, "name", CellValue::text("item1"), CellValue::text("remote"));
    h.adapter.push(ServerEvent::Committed { commands: vec![cmd], user: them() });

    // Nothing applies until the host pumps the inbox
    assert_eq!(h.value(1, "name"), CellValue::text("item1"));
    assert_eq!(h.grid.pump_server_events(), 1);
    assert_eq!(h.value(1, "name"), CellValue::text("remote"));
    assert!(h.grid.history().is_empty());
}

#[test]
fn test_own_commit_echo_is_ignored() {
    let mut h = harness(1);
    h.grid.connect();
    let id = h.row_id(0);
    let cmd = Command::edit(id, "name", CellValue::text("item0"), CellValue::text("echo"));
    let me = h.grid.user().clone();
    h.adapter.push(ServerEvent::Committed { commands: vec![cmd], user: me });
    h.grid.pump_server_events();
    assert_eq!(h.value(0, "name"), CellValue::text("item0"));
}

#[test]
fn test_remote_lock_closes_open_editor() {
    let mut h = harness(2);
    h.grid.connect();
    h.grid.select_cell(0, 0);
    h.grid.open_editor();
    h.controls.type_text("lost");

    h.adapter.push(ServerEvent::RowsLocked { row_ids: vec![h.row_id(0)], user: them() });
    h.grid.pump_server_events();
    assert!(!h.grid.is_editing());
    assert_eq!(h.value(0, "name"), CellValue::text("item0"));
}

#[test]
fn test_data_replaced_resets_history() {
    let mut h = harness(3);
    h.grid.connect();
    h.grid.select_cell(2, 0);
    h.grid.toggle_boolean(2, 2);
    assert!(h.grid.can_undo());

    h.adapter.push(ServerEvent::DataReplaced { data: rows(1) });
    h.grid.pump_server_events();
    assert_eq!(h.grid.model().row_count(), 1);
    assert!(!h.grid.can_undo());
    assert_eq!(h.grid.active_cell(), Some((0, 0)));
}

#[test]
fn test_commit_failure_keeps_local_change() {
    let mut h = harness(1);
    h.adapter.0.borrow_mut().fail_commit = true;
    assert!(h.grid.toggle_boolean(0, 2));
    assert_eq!(h.value(0, "done"), CellValue::Bool(true));
    assert_eq!(h.grid.errors().get(ErrorScope::Commit), Some("server unavailable: offline"));

    // The next successful commit clears the slot
    h.adapter.0.borrow_mut().fail_commit = false;
    h.grid.toggle_boolean(0, 2);
    assert_eq!(h.grid.errors().get(ErrorScope::Commit), None);
}

#[test]
fn test_structural_commands_reach_server_in_deferred_mode() {
    let settings = cellgrid_config::GridSettings {
        commit_mode: cellgrid_config::CommitMode::Deferred,
        ..Default::default()
    };
    let model = cellgrid_engine::DataModel::new(schema()).with_data(rows(1));
    let mut h = harness_with(model, |g| g.with_settings(settings));
    h.grid.insert_row(RowData::default(), 1);
    h.grid.toggle_boolean(0, 2);

    let adapter = h.adapter.0.borrow();
    assert_eq!(adapter.commits.len(), 1);
    assert_eq!(adapter.commits[0][0].kind, cellgrid_protocol::CommandKind::InsertRow);
}

#[test]
fn test_render_error_clears_on_next_render() {
    let mut h = harness(2);
    h.surface.0.borrow_mut().fail_render = true;
    h.grid.select_cell(0, 0);
    assert_eq!(h.grid.errors().get(ErrorScope::Render), Some("render failed: canvas lost"));

    h.surface.0.borrow_mut().fail_render = false;
    assert!(h.grid.render());
    assert!(h.grid.errors().is_empty());
}

#[test]
fn test_report_error_replaces_message_in_scope() {
    let mut h = harness(1);
    h.grid.report_error(ErrorScope::Commit, "first");
    h.grid.report_error(ErrorScope::Commit, "second");
    h.grid.report_error(ErrorScope::Lock, "lock");
    let all: Vec<_> = h.grid.errors().iter().collect();
    assert_eq!(all, vec![(ErrorScope::Commit, "second"), (ErrorScope::Lock, "lock")]);
}

// ============================================================================
// Auto-scroll
// ============================================================================

fn scrolling_harness() -> Harness {
    let mut h = harness(30);
    h.grid.set_viewport(Viewport { first_row: 0, visible_rows: 10 });
    h
}

#[test]
fn test_drag_near_bottom_edge_scrolls_and_extends() {
    let mut h = scrolling_harness();
    h.grid.pointer_down(cell_point(0, 0));
    // Inside the bottom margin of the 200px viewport
    h.grid.pointer_move(PointerEvent::at(50.0, 190.0));
    assert!(h.grid.is_auto_scrolling());

    assert!(h.grid.tick_auto_scroll());
    assert!(h.grid.tick_auto_scroll());
    assert_eq!(h.grid.viewport().first_row, 2);
    // Pointer re-sampled over row 2 + 9
    assert_eq!(h.grid.selection().ranges(), &[SelectionRange::cells(0, 0, 11, 0)]);

    h.grid.pointer_up(PointerEvent::at(50.0, 190.0));
    assert!(!h.grid.is_auto_scrolling());
    assert!(!h.grid.tick_auto_scroll());
}

#[test]
fn test_auto_scroll_stops_on_cancel_and_destroy() {
    let mut h = scrolling_harness();
    h.grid.pointer_down(cell_point(0, 0));
    h.grid.pointer_move(PointerEvent::at(50.0, 195.0));
    assert!(h.grid.tick_auto_scroll());
    h.grid.pointer_cancel();
    assert!(!h.grid.tick_auto_scroll());

    h.grid.pointer_down(cell_point(0, 0));
    h.grid.pointer_move(PointerEvent::at(50.0, 195.0));
    h.grid.destroy();
    assert!(!h.grid.tick_auto_scroll());
}

#[test]
fn test_auto_scroll_clamps_at_last_page() {
    let mut h = scrolling_harness();
    h.grid.set_viewport(Viewport { first_row: 19, visible_rows: 10 });
    h.grid.select_cell(25, 0);
    h.grid.pointer_down(cell_point(6, 0));
    h.grid.pointer_move(PointerEvent::at(50.0, 199.0));
    h.grid.tick_auto_scroll();
    h.grid.tick_auto_scroll();
    assert_eq!(h.grid.viewport().first_row, 20);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_destroy_releases_collaborators() {
    let mut h = harness(2);
    h.grid.connect();
    h.grid.select_cell(0, 0);
    h.grid.open_editor();

    h.grid.destroy();
    assert!(h.grid.is_destroyed());
    assert!(h.surface.0.borrow().destroyed);
    assert_eq!(h.controls.0.borrow().destroyed, 1);
    assert!(h.adapter.0.borrow().sink.is_none());
    assert_eq!(h.adapter.0.borrow().unlocks.len(), 1);

    // Input after destroy is ignored
    assert!(!h.grid.pointer_down(cell_point(1, 0)));
    h.grid.handle_server_event(ServerEvent::DataReplaced { data: rows(5) });
    assert_eq!(h.grid.model().row_count(), 2);
}
