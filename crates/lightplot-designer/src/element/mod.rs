//! Placed plot elements.
//!
//! An [`Element`] owns one visual node on the scene, a property bag, and at
//! most one behavior per [`BehaviorKind`]. Every state change is published on
//! the element's event channel so inspectors and inventories can follow it.

mod registry;

pub use registry::{ElementFactory, ElementInit, ElementRegistry, WeakElementRegistry};

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use lightplot_core::{BehaviorKind, ElementError, Event, EventChannel, Point, Rect, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::behavior::{Behavior, BehaviorHandle};
use crate::model::ElementModel;
use crate::scene::{NodeId, NodeShape, SceneHandle};

/// Semantic attributes of an element
pub type Properties = BTreeMap<String, Value>;

/// Shared handle to an element
pub type ElementRef = Rc<Element>;

/// Events published by an element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    PropertyChanged {
        key: String,
        old: Option<Value>,
        new: Value,
    },
    SelectionChanged {
        selected: bool,
    },
    LockChanged {
        locked: bool,
    },
    PositionChanged {
        x: f64,
        y: f64,
    },
    BehaviorApplied {
        kind: BehaviorKind,
    },
    BehaviorRemoved {
        kind: BehaviorKind,
    },
    Removed {
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementEventKind {
    PropertyChanged,
    SelectionChanged,
    LockChanged,
    PositionChanged,
    BehaviorApplied,
    BehaviorRemoved,
    Removed,
}

impl ElementEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PropertyChanged => "property:change",
            Self::SelectionChanged => "selection:change",
            Self::LockChanged => "lock:change",
            Self::PositionChanged => "position:change",
            Self::BehaviorApplied => "behavior:applied",
            Self::BehaviorRemoved => "behavior:removed",
            Self::Removed => "element:remove",
        }
    }
}

impl fmt::Display for ElementEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event for ElementEvent {
    type Kind = ElementEventKind;

    fn kind(&self) -> ElementEventKind {
        match self {
            Self::PropertyChanged { .. } => ElementEventKind::PropertyChanged,
            Self::SelectionChanged { .. } => ElementEventKind::SelectionChanged,
            Self::LockChanged { .. } => ElementEventKind::LockChanged,
            Self::PositionChanged { .. } => ElementEventKind::PositionChanged,
            Self::BehaviorApplied { .. } => ElementEventKind::BehaviorApplied,
            Self::BehaviorRemoved { .. } => ElementEventKind::BehaviorRemoved,
            Self::Removed { .. } => ElementEventKind::Removed,
        }
    }
}

/// Lock capability consulted by behaviors
pub trait LockState {
    fn is_locked(&self) -> bool;

    /// Returns true if the flag changed
    fn lock(&self, locked: bool) -> bool;
}

/// Selection capability consulted by behaviors and the selection set
pub trait SelectState {
    fn is_selected(&self) -> bool;

    /// Returns true if the flag changed
    fn select(&self, selected: bool) -> bool;
}

/// Construction input for [`Element::new`]
#[derive(Debug, Clone, Default)]
pub struct ElementConfig {
    pub id: String,
    pub element_type: String,
    pub properties: Properties,
    /// Existing node to bind; a group node is created when absent
    pub visual_node: Option<NodeId>,
    pub position: Option<Point>,
}

impl ElementConfig {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }
}

/// Plain snapshot of an element, as stored in plot documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub locked: bool,
    /// Type-specific geometry (width, height, length, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

pub struct Element {
    id: String,
    element_type: String,
    properties: RefCell<Properties>,
    visual_node: NodeId,
    scene: SceneHandle,
    model: Rc<dyn ElementModel>,
    behaviors: RefCell<BTreeMap<BehaviorKind, BehaviorHandle>>,
    selected: Cell<bool>,
    locked: Cell<bool>,
    removed: Cell<bool>,
    events: EventChannel<ElementEvent>,
}

impl Element {
    /// Create an element bound to `config.visual_node` or a new group node.
    pub fn new(
        config: ElementConfig,
        scene: SceneHandle,
        model: Rc<dyn ElementModel>,
    ) -> Result<ElementRef> {
        if config.id.trim().is_empty() {
            return Err(ElementError::MissingField { field: "id" }.into());
        }
        if config.element_type.trim().is_empty() {
            return Err(ElementError::MissingField { field: "type" }.into());
        }

        let visual_node = {
            let mut surface = scene.borrow_mut();
            let node = match config.visual_node {
                Some(node) if surface.contains(node) => node,
                Some(node) => return Err(ElementError::MissingNode { node: node.0 }.into()),
                None => surface.create_node(None, NodeShape::Group),
            };
            if let Err(owner) = surface.claim_node(node, &config.id) {
                return Err(ElementError::NodeInUse {
                    node: node.0,
                    owner,
                }
                .into());
            }
            if let Some(position) = config.position {
                surface.set_translation(node, position);
            }
            node
        };

        let element = Rc::new(Self {
            id: config.id,
            element_type: config.element_type,
            properties: RefCell::new(config.properties),
            visual_node,
            scene,
            model,
            behaviors: RefCell::new(BTreeMap::new()),
            selected: Cell::new(false),
            locked: Cell::new(false),
            removed: Cell::new(false),
            events: EventChannel::new("element"),
        });
        element.model.build(&element);
        tracing::debug!(id = %element.id, element_type = %element.element_type, node = %visual_node, "element created");
        Ok(element)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub fn visual_node(&self) -> NodeId {
        self.visual_node
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn events(&self) -> &EventChannel<ElementEvent> {
        &self.events
    }

    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }

    pub fn prop(&self, key: &str) -> Option<Value> {
        self.properties.borrow().get(key).cloned()
    }

    pub fn properties(&self) -> Properties {
        self.properties.borrow().clone()
    }

    /// Set a property; emits `property:change` only when the value differs.
    pub fn set_prop(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let old = {
            let mut properties = self.properties.borrow_mut();
            if properties.get(key) == Some(&value) {
                return false;
            }
            properties.insert(key.to_string(), value.clone())
        };

        self.model.property_changed(self, key, &value);
        self.events.emit(&ElementEvent::PropertyChanged {
            key: key.to_string(),
            old,
            new: value,
        });
        true
    }

    /// Translation of the visual node
    pub fn position(&self) -> Point {
        self.scene
            .borrow()
            .translation(self.visual_node)
            .unwrap_or_default()
    }

    /// Unrotated bounds of the visual node
    pub fn bounds(&self) -> Option<Rect> {
        self.scene.borrow().bounding_box(self.visual_node)
    }

    pub fn rotation(&self) -> f64 {
        self.scene
            .borrow()
            .rotation(self.visual_node)
            .unwrap_or_default()
    }

    /// Reposition the visual node; does nothing while locked.
    pub fn move_to(&self, x: f64, y: f64) -> bool {
        if self.locked.get() || self.removed.get() {
            return false;
        }
        if !self
            .scene
            .borrow_mut()
            .set_translation(self.visual_node, Point::new(x, y))
        {
            tracing::warn!(id = %self.id, "cannot move element: visual node is missing");
            return false;
        }
        self.events.emit(&ElementEvent::PositionChanged { x, y });
        true
    }

    /// Rotate about the center of the node's extent and record `rotation`.
    pub fn rotate_to(&self, degrees: f64) -> bool {
        if self.locked.get() || self.removed.get() {
            return false;
        }
        if !self.apply_rotation(degrees) {
            tracing::warn!(id = %self.id, "cannot rotate element: visual node is missing");
            return false;
        }
        self.set_prop("rotation", degrees);
        true
    }

    /// Scale the visual node to `bounds`; does nothing while locked.
    pub fn resize_to(&self, bounds: Rect) -> bool {
        if self.locked.get() || self.removed.get() {
            return false;
        }
        if !self.scene.borrow_mut().set_bounds(self.visual_node, bounds) {
            tracing::warn!(id = %self.id, "cannot resize element: visual node is missing");
            return false;
        }
        // The pivot follows the new extent
        self.apply_rotation(self.rotation());

        let position = self.position();
        self.events.emit(&ElementEvent::PositionChanged {
            x: position.x,
            y: position.y,
        });
        true
    }

    fn apply_rotation(&self, degrees: f64) -> bool {
        let mut surface = self.scene.borrow_mut();
        let (Some(bounds), Some(translation)) = (
            surface.bounding_box(self.visual_node),
            surface.translation(self.visual_node),
        ) else {
            return false;
        };
        let pivot = bounds.center() - translation;
        surface.set_rotation(self.visual_node, degrees, pivot)
    }

    /// Attach `behavior`, replacing any other instance of the same kind
    pub fn add_behavior(self: &Rc<Self>, behavior: &BehaviorHandle) {
        behavior.attach(self);
    }

    /// Detach and drop the behavior of `kind`; returns false if there was none
    pub fn remove_behavior(&self, kind: &BehaviorKind) -> bool {
        let Some(behavior) = self.behaviors.borrow_mut().remove(kind) else {
            return false;
        };
        behavior.detach();
        self.events
            .emit(&ElementEvent::BehaviorRemoved { kind: kind.clone() });
        true
    }

    pub fn behavior(&self, kind: &BehaviorKind) -> Option<BehaviorHandle> {
        self.behaviors.borrow().get(kind).cloned()
    }

    pub fn has_behavior(&self, kind: &BehaviorKind) -> bool {
        self.behaviors.borrow().contains_key(kind)
    }

    pub fn behavior_kinds(&self) -> Vec<BehaviorKind> {
        self.behaviors.borrow().keys().cloned().collect()
    }

    /// Record `behavior` in the map; called by [`Behavior::attach`]
    pub(crate) fn adopt_behavior(&self, behavior: &BehaviorHandle) {
        let displaced = {
            let mut behaviors = self.behaviors.borrow_mut();
            match behaviors.get(behavior.kind()) {
                Some(existing) if Rc::ptr_eq(existing, behavior) => None,
                _ => behaviors.insert(behavior.kind().clone(), Rc::clone(behavior)),
            }
        };
        if let Some(old) = displaced {
            tracing::debug!(id = %self.id, kind = %behavior.kind(), "replacing behavior");
            old.detach();
        }
    }

    /// Drop the map entry for `kind` if it is `behavior`; called on detach
    pub(crate) fn release_behavior(&self, kind: &BehaviorKind, behavior: &Behavior) {
        let mut behaviors = self.behaviors.borrow_mut();
        if behaviors
            .get(kind)
            .is_some_and(|entry| std::ptr::eq(Rc::as_ptr(entry), behavior))
        {
            behaviors.remove(kind);
        }
    }

    /// Snapshot with geometry read from the visual node.
    pub fn serialize(&self) -> ElementSnapshot {
        let position = self.position();
        let mut snapshot = ElementSnapshot {
            id: self.id.clone(),
            element_type: self.element_type.clone(),
            properties: self.properties(),
            x: position.x,
            y: position.y,
            rotation: self.rotation(),
            locked: self.locked.get(),
            extra: serde_json::Map::new(),
        };
        self.model.extend_snapshot(self, &mut snapshot.extra);
        snapshot
    }

    /// Apply type-specific geometry from a snapshot
    pub fn restore(&self, extra: &serde_json::Map<String, Value>) {
        self.model.restore(self, extra);
    }

    /// Detach every behavior, destroy the visual node and emit `element:remove`.
    ///
    /// Returns false (and does nothing) if the element was already removed.
    pub fn remove(&self) -> bool {
        if self.removed.get() {
            return false;
        }

        // Ordered by kind
        let behaviors = std::mem::take(&mut *self.behaviors.borrow_mut());
        for behavior in behaviors.values() {
            behavior.detach();
        }

        self.removed.set(true);
        self.selected.set(false);
        self.scene.borrow_mut().remove_node(self.visual_node);
        tracing::debug!(id = %self.id, "element removed");

        self.events.emit(&ElementEvent::Removed {
            id: self.id.clone(),
        });
        self.events.clear();
        true
    }
}

impl LockState for Element {
    fn is_locked(&self) -> bool {
        self.locked.get()
    }

    fn lock(&self, locked: bool) -> bool {
        if self.locked.replace(locked) == locked {
            return false;
        }
        self.events.emit(&ElementEvent::LockChanged { locked });
        true
    }
}

impl SelectState for Element {
    fn is_selected(&self) -> bool {
        self.selected.get()
    }

    fn select(&self, selected: bool) -> bool {
        if self.removed.get() || self.selected.replace(selected) == selected {
            return false;
        }
        self.events.emit(&ElementEvent::SelectionChanged { selected });
        true
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("type", &self.element_type)
            .field("node", &self.visual_node)
            .field("selected", &self.selected.get())
            .field("locked", &self.locked.get())
            .field("behaviors", &self.behavior_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlainModel;
    use crate::scene::memory_scene;
    use serde_json::json;

    fn element() -> ElementRef {
        Element::new(
            ElementConfig::new("f1", "fixture").at(10.0, 20.0),
            memory_scene(),
            Rc::new(PlainModel),
        )
        .unwrap()
    }

    fn record(element: &Element) -> Rc<RefCell<Vec<ElementEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        element
            .events()
            .on_any(move |event| sink.borrow_mut().push(event.clone()));
        log
    }

    #[test]
    fn test_missing_fields_fail_fast() {
        let err = Element::new(
            ElementConfig::new("", "fixture"),
            memory_scene(),
            Rc::new(PlainModel),
        )
        .unwrap_err();
        assert!(err.is_configuration_error());

        let err = Element::new(ElementConfig::new("a", ""), memory_scene(), Rc::new(PlainModel))
            .unwrap_err();
        assert!(matches!(
            err,
            lightplot_core::Error::Element(ElementError::MissingField { field: "type" })
        ));
    }

    #[test]
    fn test_unknown_visual_node_is_rejected() {
        let config = ElementConfig {
            visual_node: Some(NodeId(999)),
            ..ElementConfig::new("a", "fixture")
        };
        let err = Element::new(config, memory_scene(), Rc::new(PlainModel)).unwrap_err();
        assert!(matches!(
            err,
            lightplot_core::Error::Element(ElementError::MissingNode { node: 999 })
        ));
    }

    #[test]
    fn test_visual_node_cannot_be_shared() {
        let scene = memory_scene();
        let a = Element::new(
            ElementConfig::new("a", "fixture"),
            Rc::clone(&scene),
            Rc::new(PlainModel),
        )
        .unwrap();

        let config = ElementConfig {
            visual_node: Some(a.visual_node()),
            ..ElementConfig::new("b", "fixture")
        };
        let err = Element::new(config, Rc::clone(&scene), Rc::new(PlainModel)).unwrap_err();
        assert!(matches!(
            err,
            lightplot_core::Error::Element(ElementError::NodeInUse { ref owner, .. }) if owner == "a"
        ));
        assert!(err.is_configuration_error());
        assert!(scene.borrow().contains(a.visual_node()));
    }

    #[test]
    fn test_unowned_node_can_be_bound() {
        let scene = memory_scene();
        let node = scene.borrow_mut().create_node(None, NodeShape::Group);
        let config = ElementConfig {
            visual_node: Some(node),
            ..ElementConfig::new("a", "fixture")
        };
        let element = Element::new(config, Rc::clone(&scene), Rc::new(PlainModel)).unwrap();
        assert_eq!(element.visual_node(), node);
        assert_eq!(scene.borrow().node_owner(node).as_deref(), Some("a"));
    }

    #[test]
    fn test_set_prop_emits_only_on_change() {
        let element = element();
        let log = record(&element);

        assert!(element.set_prop("color", "R02"));
        assert!(!element.set_prop("color", "R02"));
        assert!(element.set_prop("color", "L201"));

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            ElementEvent::PropertyChanged {
                key: "color".into(),
                old: Some(json!("R02")),
                new: json!("L201"),
            }
        );
    }

    #[test]
    fn test_flags_emit_on_change() {
        let element = element();
        let log = record(&element);

        assert!(element.select(true));
        assert!(!element.select(true));
        assert!(element.lock(true));
        assert!(!element.lock(true));

        assert_eq!(
            *log.borrow(),
            vec![
                ElementEvent::SelectionChanged { selected: true },
                ElementEvent::LockChanged { locked: true },
            ]
        );
    }

    #[test]
    fn test_locked_element_does_not_move() {
        let element = element();
        element.lock(true);
        let log = record(&element);

        assert!(!element.move_to(50.0, 50.0));
        assert!(!element.rotate_to(45.0));
        assert_eq!(element.position(), Point::new(10.0, 20.0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_move_emits_position() {
        let element = element();
        let log = record(&element);
        assert!(element.move_to(30.0, 40.0));
        assert_eq!(element.position(), Point::new(30.0, 40.0));
        assert_eq!(
            *log.borrow(),
            vec![ElementEvent::PositionChanged { x: 30.0, y: 40.0 }]
        );
    }

    #[test]
    fn test_rotate_records_property() {
        let element = element();
        assert!(element.rotate_to(90.0));
        assert_eq!(element.rotation(), 90.0);
        assert_eq!(element.prop("rotation"), Some(json!(90.0)));
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let element = element();
        let scene = Rc::clone(element.scene());
        let removed = Rc::new(Cell::new(0));
        let r = Rc::clone(&removed);
        element
            .events()
            .on(ElementEventKind::Removed, move |_| r.set(r.get() + 1));

        assert!(element.remove());
        assert!(!element.remove());
        assert_eq!(removed.get(), 1);
        assert!(!scene.borrow().contains(element.visual_node()));
    }

    #[test]
    fn test_serialize_reads_scene_geometry() {
        let element = element();
        element.set_prop("channel", 12);
        element
            .scene()
            .borrow_mut()
            .set_translation(element.visual_node(), Point::new(5.0, 6.0));

        let snapshot = element.serialize();
        assert_eq!(snapshot.id, "f1");
        assert_eq!(snapshot.element_type, "fixture");
        assert_eq!((snapshot.x, snapshot.y), (5.0, 6.0));
        assert_eq!(snapshot.properties.get("channel"), Some(&json!(12)));
        assert!(!snapshot.locked);
    }
}
