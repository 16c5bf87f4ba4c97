// Pointer and keyboard selection, plus a property test over random gesture
// sequences.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

mod common;

use cellgrid_core::{RangeKind, SelectionRange};
use cellgrid_editor::{Key, KeyEvent, Mode, Modifiers, PointerEvent};
use common::*;
use proptest::prelude::*;

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn click(h: &mut Harness, at: PointerEvent) {
    h.grid.pointer_down(at);
    h.grid.pointer_up(at);
}

#[test]
fn test_click_sets_active_cell() {
    let mut h = harness(4);
    assert_eq!(h.grid.mode(), Mode::Idle);
    click(&mut h, cell_point(2, 1));
    assert_eq!(h.grid.active_cell(), Some((2, 1)));
    assert_eq!(h.grid.selection().ranges(), &[SelectionRange::cell(2, 1)]);
    assert_eq!(h.surface.0.borrow().active, Some((h.row_id(2), "qty".to_string())));
}

#[test]
fn test_shift_click_extends_from_active_cell() {
    let mut h = harness(5);
    click(&mut h, cell_point(1, 0));
    click(&mut h, cell_point(3, 2).with_modifiers(Modifiers::shift()));
    assert_eq!(h.grid.active_cell(), Some((1, 0)));
    assert_eq!(h.grid.selection().ranges()[0].normalized(), SelectionRange::cells(1, 0, 3, 2));
}

#[test]
fn test_accel_click_unions_and_merges() {
    let mut h = harness(5);
    click(&mut h, cell_point(0, 0));
    click(&mut h, cell_point(2, 0).with_modifiers(Modifiers::accel()));
    assert_eq!(h.grid.selection().ranges().len(), 2);

    // The gap row joins both into one column span
    click(&mut h, cell_point(1, 0).with_modifiers(Modifiers::accel()));
    assert_eq!(h.grid.selection().ranges(), &[SelectionRange::cells(0, 0, 2, 0)]);
}

#[test]
fn test_drag_extends_range() {
    let mut h = harness(5);
    h.grid.pointer_down(cell_point(0, 0));
    assert_eq!(h.grid.mode(), Mode::RangeDragging);
    h.grid.pointer_move(cell_point(2, 1));
    h.grid.pointer_move(cell_point(3, 2));
    h.grid.pointer_up(cell_point(3, 2));

    assert_eq!(h.grid.mode(), Mode::Selection);
    assert_eq!(h.grid.active_cell(), Some((0, 0)));
    assert_eq!(h.grid.selection().ranges(), &[SelectionRange::cells(0, 0, 3, 2)]);
}

#[test]
fn test_accel_drag_keeps_earlier_ranges() {
    let mut h = harness(6);
    click(&mut h, cell_point(0, 0));
    h.grid.pointer_down(cell_point(3, 2).with_modifiers(Modifiers::accel()));
    h.grid.pointer_move(cell_point(5, 3));
    h.grid.pointer_up(cell_point(5, 3));

    let ranges = h.grid.selection().ranges();
    assert_eq!(ranges.len(), 2);
    assert!(h.grid.selection().contains(0, 0));
    assert!(h.grid.selection().contains(4, 3));
}

#[test]
fn test_header_selection() {
    let mut h = harness(4);
    click(&mut h, row_header_point(2));
    let range = h.grid.selection().ranges()[0];
    assert_eq!(range.kind, RangeKind::Rows);
    assert_eq!(range.row_span(), (2, 2));

    click(&mut h, col_header_point(1));
    assert_eq!(h.grid.selection().ranges(), &[SelectionRange::cells(0, 1, 3, 1)]);
    assert_eq!(h.grid.active_cell(), Some((0, 1)));
}

#[test]
fn test_arrow_keys_move_and_clamp() {
    let mut h = harness(3);
    h.grid.select_cell(0, 0);
    h.grid.handle_key(KeyEvent::new(Key::ArrowUp));
    assert_eq!(h.grid.active_cell(), Some((0, 0)));
    h.grid.handle_key(KeyEvent::new(Key::ArrowDown));
    h.grid.handle_key(KeyEvent::new(Key::ArrowRight));
    assert_eq!(h.grid.active_cell(), Some((1, 1)));

    let shift = Modifiers::shift();
    h.grid.handle_key(KeyEvent::new(Key::ArrowDown).with_modifiers(shift));
    h.grid.handle_key(KeyEvent::new(Key::ArrowDown).with_modifiers(shift));
    assert_eq!(h.grid.active_cell(), Some((1, 1)));
    assert_eq!(h.grid.selection().ranges()[0].normalized(), SelectionRange::cells(1, 1, 2, 1));
}

#[test]
fn test_selection_pushed_to_surface() {
    let mut h = harness(3);
    click(&mut h, cell_point(1, 1));
    assert_eq!(h.surface.0.borrow().selection, vec![SelectionRange::cell(1, 1)]);
    h.grid.clear_selection();
    assert!(h.surface.0.borrow().selection.is_empty());
    assert_eq!(h.grid.mode(), Mode::Idle);
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
enum Gesture {
    Click { row: usize, col: usize, mods: Modifiers },
    Drag { from: (usize, usize), to: (usize, usize), accel: bool },
    RowHeader { row: usize, mods: Modifiers },
    Arrow { key: Key, shift: bool },
}

fn arb_mods() -> impl Strategy<Value = Modifiers> {
    prop_oneof![
        3 => Just(Modifiers::NONE),
        1 => Just(Modifiers::shift()),
        2 => Just(Modifiers::accel()),
    ]
}

fn arb_gesture() -> impl Strategy<Value = Gesture> {
    let cell = (0usize..6, 0usize..5);
    prop_oneof![
        4 => (cell.clone(), arb_mods()).prop_map(|((row, col), mods)| Gesture::Click { row, col, mods }),
        2 => (cell.clone(), cell, any::<bool>()).prop_map(|(from, to, accel)| Gesture::Drag { from, to, accel }),
        1 => (0usize..6, arb_mods()).prop_map(|(row, mods)| Gesture::RowHeader { row, mods }),
        1 => (
            prop_oneof![Just(Key::ArrowUp), Just(Key::ArrowDown), Just(Key::ArrowLeft), Just(Key::ArrowRight)],
            any::<bool>()
        )
            .prop_map(|(key, shift)| Gesture::Arrow { key, shift }),
    ]
}

fn play(h: &mut Harness, gesture: &Gesture) {
    match *gesture {
        Gesture::Click { row, col, mods } => {
            let at = cell_point(row, col).with_modifiers(mods);
            h.grid.pointer_down(at);
            h.grid.pointer_up(at);
        }
        Gesture::Drag { from, to, accel } => {
            let mods = if accel { Modifiers::accel() } else { Modifiers::NONE };
            h.grid.pointer_down(cell_point(from.0, from.1).with_modifiers(mods));
            h.grid.pointer_move(cell_point(to.0, to.1));
            h.grid.pointer_up(cell_point(to.0, to.1));
        }
        Gesture::RowHeader { row, mods } => {
            let at = row_header_point(row).with_modifiers(mods);
            h.grid.pointer_down(at);
            h.grid.pointer_up(at);
        }
        Gesture::Arrow { key, shift } => {
            let mods = if shift { Modifiers::shift() } else { Modifiers::NONE };
            h.grid.handle_key(KeyEvent::new(key).with_modifiers(mods));
        }
    }
}

proptest! {
    #![proptest_config(config_256())]

    /// After any gesture sequence no two stored ranges could merge, the
    /// active cell stays inside the grid and no drag is left running.
    #[test]
    fn prop_selection_stays_minimal(gestures in prop::collection::vec(arb_gesture(), 1..20)) {
        let mut h = harness(6);
        for g in &gestures {
            play(&mut h, g);
            let ranges = h.grid.selection().ranges();
            for (i, a) in ranges.iter().enumerate() {
                for b in &ranges[i + 1..] {
                    prop_assert!(a.try_merge(b).is_none(), "{:?} and {:?} should have merged", a, b);
                }
            }
            if let Some((row, col)) = h.grid.active_cell() {
                prop_assert!(row < 6 && col < 5);
            }
            prop_assert!(!h.grid.mode().is_dragging());
        }
    }
}
