//! The built-in interaction behaviors.
//!
//! Pointer-driven behaviors share one shape:
//! 1. Arm on a primary press (on the element, or on a handle), unless the
//!    element is locked or an operation is already in flight, and register
//!    global move/release listeners.
//! 2. Track each move relative to the armed snapshot.
//! 3. Resolve on release by dropping the listener guards.
//!
//! `cleanup` drops the same guards, so an operation cut short by detach or
//! element removal leaves nothing registered.

mod draggable;
mod droppable;
mod lockable;
mod resizable;
mod rotatable;
mod selectable;

pub use draggable::{DraggableLogic, DraggableOptions};
pub use droppable::{DroppableLogic, DroppableOptions};
pub use lockable::{LockableLogic, LockableOptions};
pub use resizable::{compute_resize, ResizableLogic, ResizableOptions, ResizeHandle, ResizeLimits};
pub use rotatable::{compute_angle, snap_angle, RotatableLogic, RotatableOptions};
pub use selectable::{SelectableLogic, SelectableOptions};

use lightplot_core::{
    merge_options, snap_to_step, BehaviorError, BehaviorKind, Options, Point, Result,
};
use lightplot_settings::StyleMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::behavior::{Behavior, BehaviorHandle, BehaviorLogic, BehaviorRegistry};
use crate::input::InputHub;
use crate::scene::{NodeId, SceneHandle};
use crate::selection_manager::SelectionManager;

impl BehaviorRegistry {
    /// A registry with the six built-in behaviors
    pub fn with_defaults(input: &InputHub, selection: &SelectionManager) -> Self {
        let registry = Self::new();
        register_defaults(&registry, input, selection);
        registry
    }
}

/// Register the built-in behaviors on `registry`
pub fn register_defaults(
    registry: &BehaviorRegistry,
    input: &InputHub,
    selection: &SelectionManager,
) {
    let select = selection.clone();
    let hub = input.clone();
    registry.register_behavior(BehaviorKind::Selectable, move |overrides| {
        let options: SelectableOptions = merged(BehaviorKind::Selectable, overrides)?;
        build(
            BehaviorKind::Selectable,
            &options,
            SelectableLogic::new(options.clone(), hub.clone(), select.clone()),
        )
    });

    let hub = input.clone();
    registry.register_behavior(BehaviorKind::Draggable, move |overrides| {
        let options: DraggableOptions = merged(BehaviorKind::Draggable, overrides)?;
        build(
            BehaviorKind::Draggable,
            &options,
            DraggableLogic::new(options.clone(), hub.clone()),
        )
    });

    registry.register_behavior(BehaviorKind::Lockable, move |overrides| {
        let options: LockableOptions = merged(BehaviorKind::Lockable, overrides)?;
        build(
            BehaviorKind::Lockable,
            &options,
            LockableLogic::new(options.clone()),
        )
    });

    let hub = input.clone();
    registry.register_behavior(BehaviorKind::Rotatable, move |overrides| {
        let options: RotatableOptions = merged(BehaviorKind::Rotatable, overrides)?;
        build(
            BehaviorKind::Rotatable,
            &options,
            RotatableLogic::new(options.clone(), hub.clone()),
        )
    });

    let hub = input.clone();
    registry.register_behavior(BehaviorKind::Resizable, move |overrides| {
        let options: ResizableOptions = merged(BehaviorKind::Resizable, overrides)?;
        build(
            BehaviorKind::Resizable,
            &options,
            ResizableLogic::new(options.clone(), hub.clone()),
        )
    });

    let hub = input.clone();
    registry.register_behavior(BehaviorKind::Droppable, move |overrides| {
        let options: DroppableOptions = merged(BehaviorKind::Droppable, overrides)?;
        build(
            BehaviorKind::Droppable,
            &options,
            DroppableLogic::new(options.clone(), hub.clone()),
        )
    });
}

fn merged<T>(kind: BehaviorKind, overrides: &Options) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    Ok(merge_options(&kind, overrides)?)
}

fn build<T: Serialize>(
    kind: BehaviorKind,
    options: &T,
    logic: impl BehaviorLogic,
) -> Result<BehaviorHandle> {
    let options = match serde_json::to_value(options)? {
        serde_json::Value::Object(map) => map,
        _ => {
            return Err(BehaviorError::InvalidOptions {
                kind: kind.to_string(),
                reason: "options must serialize to a table".into(),
            }
            .into())
        }
    };
    Ok(Behavior::new(kind, options, logic))
}

/// Snap both coordinates when `enabled`
pub(crate) fn snap_point(point: Point, enabled: bool, grid_size: f64) -> Point {
    if !enabled {
        return point;
    }
    Point::new(
        snap_to_step(point.x, grid_size),
        snap_to_step(point.y, grid_size),
    )
}

/// Class and style attributes applied over a node's own values.
///
/// Styles go on a scene style layer named after the owning behavior, so
/// overrides from several behaviors stack: removing one layer falls back to
/// whatever the remaining layers and the node itself set.
#[derive(Debug)]
pub(crate) struct StyleOverride {
    node: NodeId,
    layer: String,
    class_name: String,
    added_class: bool,
}

impl StyleOverride {
    pub(crate) fn apply(
        scene: &SceneHandle,
        node: NodeId,
        layer: &BehaviorKind,
        class_name: &str,
        style: &StyleMap,
    ) -> Self {
        let mut surface = scene.borrow_mut();
        let added_class = !class_name.is_empty() && !surface.has_class(node, class_name);
        if added_class {
            surface.add_class(node, class_name);
        }
        surface.push_style_layer(node, layer.as_str(), style);

        Self {
            node,
            layer: layer.to_string(),
            class_name: class_name.to_string(),
            added_class,
        }
    }

    pub(crate) fn restore(self, scene: &SceneHandle) {
        let mut surface = scene.borrow_mut();
        if !surface.contains(self.node) {
            return;
        }
        surface.remove_style_layer(self.node, &self.layer);
        if self.added_class {
            surface.remove_class(self.node, &self.class_name);
        }
    }
}
