//! Rotation through a grip handle drawn above the selected element.
//!
//! The handle is a line from the element center to a circular grip at
//! `handleDistance`. At rotation 0 the grip sits straight above the center.
//! It exists only while the element is selected and unlocked.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lightplot_core::{normalize_degrees, shared, snap_to_step, EventChannel, Point, Shared, Subscription};
use serde::{Deserialize, Serialize};

use crate::behavior::{BehaviorContext, BehaviorEvent, BehaviorLogic};
use crate::element::{Element, ElementEventKind, LockState, SelectState};
use crate::input::{InputHub, PointerEvent, PointerPhase, WeakInputHub};
use crate::scene::{NodeId, NodeShape, POINTER_EVENTS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotatableOptions {
    pub handle_distance: f64,
    /// Zero disables snapping
    pub snap_angle: f64,
    pub handle_radius: f64,
}

impl Default for RotatableOptions {
    fn default() -> Self {
        Self {
            handle_distance: 30.0,
            snap_angle: 0.0,
            handle_radius: 5.0,
        }
    }
}

/// Angle of `pointer` around `center`, in degrees clockwise from straight up.
pub fn compute_angle(center: Point, pointer: Point) -> f64 {
    let dy = pointer.y - center.y;
    let dx = pointer.x - center.x;
    normalize_degrees(dy.atan2(dx).to_degrees() + 90.0)
}

/// Round `angle` to the nearest multiple of `step`; a non-positive step is no-op
pub fn snap_angle(angle: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return normalize_degrees(angle);
    }
    normalize_degrees(snap_to_step(angle, step))
}

struct RotationHandle {
    line: NodeId,
    grip: NodeId,
    _press: Subscription,
}

struct RotateOperation {
    _listeners: [Subscription; 2],
}

#[derive(Default)]
struct RotateState {
    element: Weak<Element>,
    watchers: Vec<Subscription>,
    handle: Option<RotationHandle>,
    operation: Option<RotateOperation>,
}

pub struct RotatableLogic {
    options: RotatableOptions,
    input: InputHub,
    state: Shared<RotateState>,
}

impl RotatableLogic {
    pub fn new(options: RotatableOptions, input: InputHub) -> Self {
        Self {
            options,
            input,
            state: shared(RotateState::default()),
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.state.borrow().operation.is_some()
    }

    /// The grip node, while the handle is shown
    pub fn grip(&self) -> Option<NodeId> {
        self.state.borrow().handle.as_ref().map(|h| h.grip)
    }
}

#[derive(Clone)]
struct Rotation {
    options: RotatableOptions,
    input: WeakInputHub,
    events: EventChannel<BehaviorEvent>,
    state: Weak<RefCell<RotateState>>,
}

impl Rotation {
    fn element(&self) -> Option<Rc<Element>> {
        self.state.upgrade()?.borrow().element.upgrade()
    }

    /// Grip position for the element's current bounds and rotation
    fn grip_position(&self, element: &Element) -> Option<(Point, Point)> {
        let center = element.bounds()?.center();
        let grip = center.polar_offset(element.rotation() - 90.0, self.options.handle_distance);
        Some((center, grip))
    }

    /// Create, move or remove the handle to match the element's state
    fn sync_handle(&self) {
        let (Some(state), Some(element)) = (self.state.upgrade(), self.element()) else {
            return;
        };
        let wanted = element.is_selected() && !element.is_locked() && !element.is_removed();

        if !wanted {
            self.remove_handle(&state, &element);
            return;
        }
        let Some((center, grip)) = self.grip_position(&element) else {
            return;
        };

        let existing = state.borrow().handle.as_ref().map(|h| (h.line, h.grip));
        let scene = element.scene();
        match existing {
            Some((line, grip_node)) => {
                let mut surface = scene.borrow_mut();
                surface.set_shape(
                    line,
                    NodeShape::Line {
                        from: center,
                        to: grip,
                    },
                );
                surface.set_translation(grip_node, grip);
            }
            None => {
                let (line, grip_node) = {
                    let mut surface = scene.borrow_mut();
                    let line = surface.create_node(
                        None,
                        NodeShape::Line {
                            from: center,
                            to: grip,
                        },
                    );
                    surface.add_class(line, "rotation-handle");
                    surface.set_style(line, POINTER_EVENTS, Some("none"));
                    let radius = self.options.handle_radius;
                    let grip_node = surface.create_node(
                        None,
                        NodeShape::Ellipse {
                            rx: radius,
                            ry: radius,
                        },
                    );
                    surface.set_translation(grip_node, grip);
                    surface.add_class(grip_node, "rotation-grip");
                    (line, grip_node)
                };

                let Some(input) = self.input.upgrade() else {
                    return;
                };
                let rotation = self.clone();
                let press = input.on_node(grip_node, PointerPhase::Down, move |event| {
                    rotation.arm(event)
                });
                state.borrow_mut().handle = Some(RotationHandle {
                    line,
                    grip: grip_node,
                    _press: press,
                });
            }
        }
    }

    fn remove_handle(&self, state: &Shared<RotateState>, element: &Element) {
        let handle = state.borrow_mut().handle.take();
        if let Some(handle) = handle {
            let mut surface = element.scene().borrow_mut();
            surface.remove_node(handle.line);
            surface.remove_node(handle.grip);
        }
        // A lock or deselect ends an operation in flight
        if state.borrow().operation.is_some() {
            self.resolve();
        }
    }

    fn arm(&self, event: &PointerEvent) {
        if !event.is_primary() {
            return;
        }
        let (Some(state), Some(element), Some(input)) =
            (self.state.upgrade(), self.element(), self.input.upgrade())
        else {
            return;
        };
        if element.is_locked() || state.borrow().operation.is_some() {
            return;
        }

        let on_move = {
            let rotation = self.clone();
            input.on_pointer(PointerPhase::Move, move |event| rotation.track(event))
        };
        let on_up = {
            let rotation = self.clone();
            input.on_pointer(PointerPhase::Up, move |event| {
                rotation.track(event);
                rotation.resolve();
            })
        };
        state.borrow_mut().operation = Some(RotateOperation {
            _listeners: [on_move, on_up],
        });
        self.events.emit(&BehaviorEvent::RotateStart {
            angle: element.rotation(),
        });
    }

    fn track(&self, event: &PointerEvent) {
        let Some(element) = self.element() else {
            return;
        };
        let Some(center) = element.bounds().map(|b| b.center()) else {
            return;
        };
        let angle = snap_angle(compute_angle(center, event.local), self.options.snap_angle);
        if (angle - element.rotation()).abs() < f64::EPSILON {
            return;
        }
        if element.rotate_to(angle) {
            self.events.emit(&BehaviorEvent::Rotate { angle });
        }
    }

    fn resolve(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let operation = state.borrow_mut().operation.take();
        if operation.is_none() {
            return;
        }
        drop(operation);

        let angle = self.element().map(|e| e.rotation()).unwrap_or_default();
        self.events.emit(&BehaviorEvent::RotateEnd { angle });
    }
}

impl BehaviorLogic for RotatableLogic {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>) {
        if !self.state.borrow().watchers.is_empty() {
            return;
        }
        let element = ctx.element;
        self.state.borrow_mut().element = Rc::downgrade(element);

        let rotation = Rotation {
            options: self.options.clone(),
            input: self.input.downgrade(),
            events: ctx.events.clone(),
            state: Rc::downgrade(&self.state),
        };

        let watchers: Vec<Subscription> = [
            ElementEventKind::SelectionChanged,
            ElementEventKind::LockChanged,
            ElementEventKind::PositionChanged,
            ElementEventKind::PropertyChanged,
        ]
        .into_iter()
        .map(|kind| {
            let rotation = rotation.clone();
            element.events().scoped(kind, move |_| rotation.sync_handle())
        })
        .collect();
        self.state.borrow_mut().watchers = watchers;

        rotation.sync_handle();
    }

    fn cleanup(&mut self) {
        let (watchers, handle, operation, element) = {
            let mut state = self.state.borrow_mut();
            (
                std::mem::take(&mut state.watchers),
                state.handle.take(),
                state.operation.take(),
                state.element.upgrade(),
            )
        };
        drop(watchers);
        drop(operation);
        if let (Some(handle), Some(element)) = (handle, element) {
            let mut surface = element.scene().borrow_mut();
            surface.remove_node(handle.line);
            surface.remove_node(handle.grip);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
