//! Every pointer-driven operation releases exactly the global listeners it took.

use lightplot_core::{BehaviorKind, Point};
use lightplot_designer::{
    memory_scene, Editor, ElementInit, ElementRef, Key, Modifiers, Properties, ResizableLogic,
    ResizeHandle, RotatableLogic, FIXTURE_TYPE,
};
use lightplot_settings::EditorConfig;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Cycle {
    Drag,
    Rotate,
    Resize,
    Drop,
    CancelledDrop,
}

fn cycle_strategy() -> impl Strategy<Value = Cycle> {
    prop_oneof![
        Just(Cycle::Drag),
        Just(Cycle::Rotate),
        Just(Cycle::Resize),
        Just(Cycle::Drop),
        Just(Cycle::CancelledDrop),
    ]
}

fn center(element: &ElementRef) -> Point {
    element.bounds().map(|b| b.center()).unwrap_or_default()
}

fn grip(element: &ElementRef) -> Option<Point> {
    let node = element
        .behavior(&BehaviorKind::Rotatable)?
        .with_logic(|logic: &RotatableLogic| logic.grip())??;
    element.scene().borrow().translation(node)
}

fn south_east(element: &ElementRef) -> Option<Point> {
    let node = element
        .behavior(&BehaviorKind::Resizable)?
        .with_logic(|logic: &ResizableLogic| logic.handle_node(ResizeHandle::SE))??;
    element
        .scene()
        .borrow()
        .bounding_box(node)
        .map(|b| b.center())
}

fn run(editor: &Editor, fixture: &ElementRef, cycle: Cycle, step: f64) {
    let input = editor.input();
    match cycle {
        Cycle::Drag => {
            let from = center(fixture);
            input.pointer_down(from);
            input.pointer_move(Point::new(from.x + step, from.y));
            input.pointer_up(Point::new(from.x + step, from.y));
        }
        Cycle::Rotate => {
            let Some(from) = grip(fixture) else {
                return;
            };
            input.pointer_down(from);
            input.pointer_move(Point::new(from.x + step, from.y));
            input.pointer_up(Point::new(from.x + step, from.y));
        }
        Cycle::Resize => {
            let Some(from) = south_east(fixture) else {
                return;
            };
            input.pointer_down(from);
            input.pointer_move(Point::new(from.x + step, from.y + step));
            input.pointer_up(Point::new(from.x + step, from.y + step));
        }
        Cycle::Drop => {
            let at = Point::new(500.0, 500.0);
            editor
                .place(FIXTURE_TYPE, Properties::new(), at)
                .unwrap()
                .unwrap();
            input.pointer_move(Point::new(at.x + step, at.y));
            input.pointer_up(Point::new(at.x + step, at.y));
        }
        Cycle::CancelledDrop => {
            let at = Point::new(500.0, 500.0);
            editor
                .place(FIXTURE_TYPE, Properties::new(), at)
                .unwrap()
                .unwrap();
            input.pointer_move(Point::new(at.x, at.y + step));
            input.dispatch_key(Key::Escape, Modifiers::NONE);
        }
    }
}

proptest! {
    #[test]
    fn global_listeners_balance_over_any_cycle_mix(
        cycles in prop::collection::vec(cycle_strategy(), 1..12),
        step in 1.0f64..30.0,
    ) {
        let editor = Editor::new(EditorConfig::default(), memory_scene());
        let fixture = editor
            .elements()
            .create_element(FIXTURE_TYPE, ElementInit::new().with_id("subject"))
            .unwrap()
            .unwrap();
        // Select once so the rotation and resize handles exist
        editor.input().pointer_down(center(&fixture));
        editor.input().pointer_up(center(&fixture));

        let count = editor.input().global_listener_count();
        let added = editor.input().global_added_total();
        let removed = editor.input().global_removed_total();

        for cycle in cycles.iter().copied() {
            run(&editor, &fixture, cycle, step);
            prop_assert_eq!(editor.input().global_listener_count(), count);
        }

        let added = editor.input().global_added_total() - added;
        let removed = editor.input().global_removed_total() - removed;
        prop_assert_eq!(added, removed);
    }

    #[test]
    fn removing_an_element_mid_drag_releases_its_listeners(step in 1.0f64..50.0) {
        let editor = Editor::new(EditorConfig::default(), memory_scene());
        let fixture = editor
            .elements()
            .create_element(FIXTURE_TYPE, ElementInit::new())
            .unwrap()
            .unwrap();
        let count = editor.input().global_listener_count();

        editor.input().pointer_down(center(&fixture));
        editor.input().pointer_move(Point::new(20.0 + step, 20.0));
        prop_assert!(editor.input().global_listener_count() > count);

        fixture.remove();
        prop_assert_eq!(editor.input().global_listener_count(), count);
        editor.input().pointer_up(Point::new(20.0 + step, 20.0));
    }
}
