//! Element models: how each element type draws itself.
//!
//! A model builds the children of an element's group node, keeps them in
//! step with property changes, and contributes type-specific geometry to
//! snapshots.

mod fixture;
mod pipe;

pub use fixture::{register_fixture, FixtureModel, FIXTURE_TYPE};
pub use pipe::{register_pipe, PipeModel, PIPE_TYPE};

use std::rc::Rc;

use lightplot_core::{BehaviorSpec, Result};
use serde_json::Value;

use crate::behavior::BehaviorRegistry;
use crate::element::{Element, ElementConfig, ElementRef, ElementRegistry, Properties};
use crate::scene::{NodeId, NodeShape, SceneHandle};

pub trait ElementModel {
    /// Properties every new element of this type starts with
    fn default_properties(&self) -> Properties {
        Properties::new()
    }

    /// Create child nodes under the element's visual node
    fn build(&self, _element: &Element) {}

    /// Mirror a property change into the visual
    fn property_changed(&self, _element: &Element, _key: &str, _value: &Value) {}

    /// Add type-specific fields to a snapshot
    fn extend_snapshot(&self, _element: &Element, _extra: &mut serde_json::Map<String, Value>) {}

    /// Apply type-specific fields from a snapshot
    fn restore(&self, _element: &Element, _extra: &serde_json::Map<String, Value>) {}
}

/// A model with no visuals of its own
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainModel;

impl ElementModel for PlainModel {}

/// Register `element_type` with a factory that builds elements on `scene`
/// with `model` and applies `behaviors` to each one.
pub fn register_model(
    registry: &ElementRegistry,
    element_type: &str,
    model: Rc<dyn ElementModel>,
    scene: SceneHandle,
    behaviors: BehaviorRegistry,
    specs: Vec<BehaviorSpec>,
) -> bool {
    registry.register_type(element_type, move |mut config: ElementConfig| -> Result<ElementRef> {
        let mut properties = model.default_properties();
        properties.append(&mut config.properties);
        config.properties = properties;

        let element = Element::new(config, Rc::clone(&scene), Rc::clone(&model))?;
        behaviors.apply_behaviors(&element, &specs)?;
        Ok(element)
    })
}

/// Text shown for a property value
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn number_prop(element: &Element, key: &str, default: f64) -> f64 {
    element
        .prop(key)
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

/// First child of `parent` whose shape matches `predicate`
pub(crate) fn find_child(
    scene: &SceneHandle,
    parent: NodeId,
    predicate: impl Fn(&NodeShape) -> bool,
) -> Option<NodeId> {
    let scene = scene.borrow();
    scene
        .children(parent)
        .into_iter()
        .find(|child| scene.shape(*child).is_some_and(|shape| predicate(&shape)))
}
