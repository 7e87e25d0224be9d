//! Snapshots reload into equivalent elements, and angle math stays in range.

use lightplot_core::{Point, Rect};
use lightplot_designer::{
    compute_angle, memory_scene, snap_angle, Editor, ElementInit, ElementSnapshot, LockState,
    FIXTURE_TYPE,
};
use lightplot_settings::EditorConfig;
use proptest::prelude::*;
use serde_json::Value;

fn editor() -> Editor {
    Editor::new(EditorConfig::default(), memory_scene())
}

fn number(snapshot: &ElementSnapshot, key: &str) -> f64 {
    snapshot.extra.get(key).and_then(Value::as_f64).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

proptest! {
    #[test]
    fn reloaded_snapshot_matches_original(
        id in "[a-z][a-z0-9-]{0,12}",
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        width in 10.0f64..300.0,
        height in 10.0f64..300.0,
        rotation in 0i32..360,
        locked in any::<bool>(),
        channel in "[0-9]{1,3}",
        notes in ".{0,24}",
    ) {
        let source = editor();
        let element = source
            .elements()
            .create_element(FIXTURE_TYPE, ElementInit::new().with_id(id.clone()))
            .unwrap()
            .unwrap();
        element.set_prop("channel", channel);
        element.set_prop("notes", notes);
        element.resize_to(Rect::new(x, y, width, height));
        element.rotate_to(f64::from(rotation));
        element.lock(locked);
        let saved = element.serialize();

        let target = editor();
        let loaded = target.elements().load_element(&saved).unwrap().unwrap();
        let reloaded = loaded.serialize();

        prop_assert_eq!(&reloaded.id, &id);
        prop_assert_eq!(&reloaded.element_type, FIXTURE_TYPE);
        prop_assert_eq!(&reloaded.properties, &saved.properties);
        prop_assert_eq!(reloaded.locked, locked);
        prop_assert!(close(reloaded.x, saved.x), "x {} vs {}", reloaded.x, saved.x);
        prop_assert!(close(reloaded.y, saved.y), "y {} vs {}", reloaded.y, saved.y);
        prop_assert!(close(reloaded.rotation, saved.rotation));
        prop_assert!(close(number(&reloaded, "width"), number(&saved, "width")));
        prop_assert!(close(number(&reloaded, "height"), number(&saved, "height")));
    }

    #[test]
    fn pointer_angles_stay_in_range(
        cx in -1_000.0f64..1_000.0,
        cy in -1_000.0f64..1_000.0,
        px in -1_000.0f64..1_000.0,
        py in -1_000.0f64..1_000.0,
        step in 0.0f64..90.0,
    ) {
        let angle = compute_angle(Point::new(cx, cy), Point::new(px, py));
        prop_assert!((0.0..360.0).contains(&angle), "angle {}", angle);
        let snapped = snap_angle(angle, step);
        prop_assert!((0.0..360.0).contains(&snapped), "snapped {}", snapped);
    }

    #[test]
    fn angle_follows_polar_offset(degrees in 0.5f64..359.5, distance in 1.0f64..500.0) {
        let center = Point::new(20.0, 20.0);
        // polar_offset measures from the x axis; pointer angles from straight up
        let pointer = center.polar_offset(degrees - 90.0, distance);
        prop_assert!(close(compute_angle(center, pointer), degrees));
    }
}
