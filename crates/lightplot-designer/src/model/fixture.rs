//! Lighting fixture: a colored body with its channel number on it.

use std::rc::Rc;

use lightplot_core::{BehaviorSpec, Point, Rect};
use serde_json::{json, Value};

use super::{find_child, number_prop, register_model, value_text, ElementModel};
use crate::behavior::BehaviorRegistry;
use crate::element::{Element, ElementRegistry, Properties};
use crate::scene::{NodeShape, SceneHandle};

pub const FIXTURE_TYPE: &str = "fixture";

const DEFAULT_SIZE: f64 = 40.0;
const DEFAULT_COLOR: &str = "#0066cc";
const LABEL_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureModel;

impl FixtureModel {
    fn body_size(element: &Element) -> (f64, f64) {
        (
            number_prop(element, "width", DEFAULT_SIZE),
            number_prop(element, "height", DEFAULT_SIZE),
        )
    }

    fn layout(&self, element: &Element) {
        let scene = element.scene();
        let node = element.visual_node();
        let (width, height) = Self::body_size(element);

        let body = find_child(scene, node, |s| matches!(s, NodeShape::Rect { .. }));
        let label = find_child(scene, node, |s| matches!(s, NodeShape::Text { .. }));

        let mut surface = scene.borrow_mut();
        if let Some(body) = body {
            surface.set_shape(body, NodeShape::Rect { width, height });
        }
        if let Some(label) = label {
            surface.set_translation(label, Point::new(width / 2.0, height / 2.0));
        }
    }
}

impl ElementModel for FixtureModel {
    fn default_properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("channel".into(), json!("1"));
        properties.insert("dimmer".into(), json!(""));
        properties.insert("circuit".into(), json!(""));
        properties.insert("color".into(), json!(DEFAULT_COLOR));
        properties.insert("purpose".into(), json!(""));
        properties.insert("notes".into(), json!(""));
        properties.insert("fixture_type".into(), json!(""));
        properties
    }

    fn build(&self, element: &Element) {
        let (width, height) = Self::body_size(element);
        let color = element
            .prop("color")
            .map(|v| value_text(&v))
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        let channel = element.prop("channel").map(|v| value_text(&v)).unwrap_or_default();

        let node = element.visual_node();
        let mut surface = element.scene().borrow_mut();
        let body = surface.create_node(Some(node), NodeShape::Rect { width, height });
        surface.set_style(body, "fill", Some(&color));
        surface.set_style(body, "stroke", Some("#000000"));

        let label = surface.create_node(
            Some(node),
            NodeShape::Text {
                content: channel,
                size: LABEL_SIZE,
            },
        );
        surface.set_translation(label, Point::new(width / 2.0, height / 2.0));
    }

    fn property_changed(&self, element: &Element, key: &str, value: &Value) {
        let scene = element.scene();
        let node = element.visual_node();
        match key {
            "color" => {
                if let Some(body) = find_child(scene, node, |s| matches!(s, NodeShape::Rect { .. })) {
                    scene
                        .borrow_mut()
                        .set_style(body, "fill", Some(&value_text(value)));
                }
            }
            "channel" => {
                if let Some(label) = find_child(scene, node, |s| matches!(s, NodeShape::Text { .. })) {
                    scene.borrow_mut().set_shape(
                        label,
                        NodeShape::Text {
                            content: value_text(value),
                            size: LABEL_SIZE,
                        },
                    );
                }
            }
            "width" | "height" => self.layout(element),
            _ => {}
        }
    }

    fn extend_snapshot(&self, element: &Element, extra: &mut serde_json::Map<String, Value>) {
        if let Some(bounds) = element.bounds() {
            extra.insert("width".into(), json!(bounds.width));
            extra.insert("height".into(), json!(bounds.height));
        }
    }

    fn restore(&self, element: &Element, extra: &serde_json::Map<String, Value>) {
        let Some(bounds) = element.bounds() else {
            return;
        };
        let width = extra.get("width").and_then(Value::as_f64).unwrap_or(bounds.width);
        let height = extra.get("height").and_then(Value::as_f64).unwrap_or(bounds.height);
        if width != bounds.width || height != bounds.height {
            element.resize_to(Rect::new(bounds.x, bounds.y, width, height));
        }
    }
}

/// Register the `fixture` element type
pub fn register_fixture(
    registry: &ElementRegistry,
    scene: SceneHandle,
    behaviors: BehaviorRegistry,
    specs: Vec<BehaviorSpec>,
) -> bool {
    register_model(
        registry,
        FIXTURE_TYPE,
        Rc::new(FixtureModel),
        scene,
        behaviors,
        specs,
    )
}
