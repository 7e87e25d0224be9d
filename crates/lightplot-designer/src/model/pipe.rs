//! Hanging pipe: a straight line fixtures are rigged along.

use std::rc::Rc;

use lightplot_core::{BehaviorSpec, Point, Rect};
use serde_json::{json, Value};

use super::{find_child, number_prop, register_model, value_text, ElementModel};
use crate::behavior::BehaviorRegistry;
use crate::element::{Element, ElementRegistry, Properties};
use crate::scene::{NodeShape, SceneHandle};

pub const PIPE_TYPE: &str = "pipe";

const DEFAULT_LENGTH: f64 = 200.0;
const DEFAULT_COLOR: &str = "#333333";

#[derive(Debug, Clone, Copy, Default)]
pub struct PipeModel;

fn pipe_line(length: f64) -> NodeShape {
    NodeShape::Line {
        from: Point::new(0.0, 0.0),
        to: Point::new(length, 0.0),
    }
}

impl ElementModel for PipeModel {
    fn default_properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("length".into(), json!(DEFAULT_LENGTH));
        properties.insert("color".into(), json!(DEFAULT_COLOR));
        properties
    }

    fn build(&self, element: &Element) {
        let length = number_prop(element, "length", DEFAULT_LENGTH);
        let color = element
            .prop("color")
            .map(|v| value_text(&v))
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());

        let mut surface = element.scene().borrow_mut();
        let line = surface.create_node(Some(element.visual_node()), pipe_line(length));
        surface.set_style(line, "stroke", Some(&color));
        surface.set_style(line, "stroke-width", Some("4"));
    }

    fn property_changed(&self, element: &Element, key: &str, value: &Value) {
        let scene = element.scene();
        let Some(line) = find_child(scene, element.visual_node(), |s| {
            matches!(s, NodeShape::Line { .. })
        }) else {
            return;
        };
        match key {
            "length" => {
                let length = number_prop(element, "length", DEFAULT_LENGTH);
                scene.borrow_mut().set_shape(line, pipe_line(length));
            }
            "color" => {
                scene
                    .borrow_mut()
                    .set_style(line, "stroke", Some(&value_text(value)));
            }
            _ => {}
        }
    }

    fn extend_snapshot(&self, element: &Element, extra: &mut serde_json::Map<String, Value>) {
        if let Some(bounds) = element.bounds() {
            extra.insert("length".into(), json!(bounds.width));
        }
    }

    fn restore(&self, element: &Element, extra: &serde_json::Map<String, Value>) {
        let (Some(bounds), Some(length)) =
            (element.bounds(), extra.get("length").and_then(Value::as_f64))
        else {
            return;
        };
        if length > 0.0 && length != bounds.width {
            element.resize_to(Rect::new(bounds.x, bounds.y, length, bounds.height));
        }
    }
}

/// Register the `pipe` element type
pub fn register_pipe(
    registry: &ElementRegistry,
    scene: SceneHandle,
    behaviors: BehaviorRegistry,
    specs: Vec<BehaviorSpec>,
) -> bool {
    register_model(
        registry,
        PIPE_TYPE,
        Rc::new(PipeModel),
        scene,
        behaviors,
        specs,
    )
}
