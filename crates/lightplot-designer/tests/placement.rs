//! Placement from the library through the Droppable behavior.

use std::cell::RefCell;
use std::rc::Rc;

use lightplot_core::{BehaviorKind, Options, Point};
use lightplot_designer::{
    memory_scene, BehaviorEvent, DroppableLogic, Editor, Key, LockState, Modifiers, Properties,
    FIXTURE_TYPE, PIPE_TYPE,
};
use lightplot_settings::EditorConfig;
use serde_json::json;

fn editor_with(config: EditorConfig) -> Editor {
    Editor::new(config, memory_scene())
}

#[test]
fn test_place_follows_pointer_and_commits_on_release() {
    let editor = editor_with(EditorConfig::default());
    let fixture = editor
        .place(FIXTURE_TYPE, Properties::new(), Point::new(100.0, 100.0))
        .unwrap()
        .unwrap();
    let droppable = fixture.behavior(&BehaviorKind::Droppable).unwrap();

    let log = Rc::new(RefCell::new(Vec::new()));
    let l = Rc::clone(&log);
    droppable.events().on_any(move |event| l.borrow_mut().push(event.clone()));

    assert!(editor
        .scene()
        .borrow()
        .has_class(fixture.visual_node(), "dropping"));

    // Centered under the pointer: the 40x40 body is offset by half its size
    editor.input().pointer_move(Point::new(150.0, 160.0));
    assert_eq!(fixture.position(), Point::new(130.0, 140.0));
    editor.input().pointer_up(Point::new(150.0, 160.0));

    assert_eq!(fixture.position(), Point::new(130.0, 140.0));
    assert!(!fixture.has_behavior(&BehaviorKind::Droppable));
    assert!(editor.elements().has(fixture.id()));
    assert!(!editor
        .scene()
        .borrow()
        .has_class(fixture.visual_node(), "dropping"));
    assert_eq!(
        editor.scene().borrow().style(fixture.visual_node(), "opacity"),
        None
    );

    let log = log.borrow();
    assert_eq!(
        log[0],
        BehaviorEvent::DropMove {
            position: Point::new(130.0, 140.0)
        }
    );
    assert!(log.contains(&BehaviorEvent::DropComplete {
        position: Point::new(130.0, 140.0)
    }));

    // Later moves leave the placed element alone
    editor.input().pointer_move(Point::new(400.0, 400.0));
    assert_eq!(fixture.position(), Point::new(130.0, 140.0));
}

#[test]
fn test_escape_cancels_placement_and_removes_element() {
    let editor = editor_with(EditorConfig::default());
    let pipe = editor
        .place(PIPE_TYPE, Properties::new(), Point::new(50.0, 50.0))
        .unwrap()
        .unwrap();
    let droppable = pipe.behavior(&BehaviorKind::Droppable).unwrap();

    let cancelled = Rc::new(RefCell::new(None));
    let c = Rc::clone(&cancelled);
    droppable.events().on_any(move |event| {
        if let BehaviorEvent::DropCancel { position } = event {
            *c.borrow_mut() = Some(*position);
        }
    });

    editor.input().pointer_move(Point::new(300.0, 80.0));
    editor.input().dispatch_key(Key::Escape, Modifiers::NONE);

    assert_eq!(*cancelled.borrow(), Some(Point::new(50.0, 50.0)));
    assert!(pipe.is_removed());
    assert!(!editor.elements().has(pipe.id()));
    assert!(!editor.scene().borrow().contains(pipe.visual_node()));
}

#[test]
fn test_placement_snaps_to_grid() {
    let mut config = EditorConfig::default();
    config.grid.snap = true;
    config.grid.size = 25.0;
    config.drop.center_on_pointer = false;
    let editor = editor_with(config);

    let fixture = editor
        .place(FIXTURE_TYPE, Properties::new(), Point::new(0.0, 0.0))
        .unwrap()
        .unwrap();
    editor.input().pointer_move(Point::new(61.0, 13.0));
    editor.input().pointer_up(Point::new(61.0, 13.0));

    assert_eq!(fixture.position(), Point::new(50.0, 25.0));
}

#[test]
fn test_placement_uses_viewport_coordinates() {
    let editor = editor_with(EditorConfig::default());
    {
        let mut viewport = editor.viewport().borrow_mut();
        viewport.set_zoom(2.0);
        viewport.set_pan(100.0, 0.0);
    }

    let fixture = editor
        .place(FIXTURE_TYPE, Properties::new(), Point::new(300.0, 200.0))
        .unwrap()
        .unwrap();
    assert_eq!(fixture.position(), Point::new(100.0, 100.0));
}

#[test]
fn test_placed_properties_override_defaults() {
    let editor = editor_with(EditorConfig::default());
    let mut properties = Properties::new();
    properties.insert("channel".into(), json!("42"));
    properties.insert("purpose".into(), json!("Front wash"));

    let fixture = editor
        .place(FIXTURE_TYPE, properties, Point::new(0.0, 0.0))
        .unwrap()
        .unwrap();
    assert_eq!(fixture.prop("channel"), Some(json!("42")));
    assert_eq!(fixture.prop("purpose"), Some(json!("Front wash")));
    assert_eq!(fixture.prop("color"), Some(json!("#0066cc")));
    editor.input().dispatch_key(Key::Escape, Modifiers::NONE);
    assert!(editor.elements().is_empty());
}

#[test]
fn test_locked_drop_cannot_begin_again() {
    let editor = editor_with(EditorConfig::default());
    let fixture = editor
        .place(FIXTURE_TYPE, Properties::new(), Point::new(0.0, 0.0))
        .unwrap()
        .unwrap();
    editor.input().pointer_up(Point::new(0.0, 0.0));

    let baseline = editor.input().global_listener_count();
    let droppable = editor
        .behaviors()
        .apply_behavior(
            &fixture,
            &BehaviorKind::Droppable,
            &Options::from_iter([("startOnAttach".to_string(), json!(false))]),
        )
        .unwrap()
        .unwrap();
    fixture.lock(true);
    assert_eq!(droppable.with_logic(|logic: &DroppableLogic| logic.begin()), Some(false));
    assert_eq!(editor.input().global_listener_count(), baseline);
}
