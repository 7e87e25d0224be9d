//! Press and drag to move the element, optionally snapped to a grid.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lightplot_core::{shared, EventChannel, Point, Shared, Subscription};
use serde::{Deserialize, Serialize};

use super::snap_point;
use crate::behavior::{BehaviorContext, BehaviorEvent, BehaviorLogic};
use crate::element::{Element, LockState};
use crate::input::{InputHub, PointerEvent, PointerPhase, WeakInputHub};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraggableOptions {
    pub snap_to_grid: bool,
    pub grid_size: f64,
}

impl Default for DraggableOptions {
    fn default() -> Self {
        Self {
            snap_to_grid: false,
            grid_size: 10.0,
        }
    }
}

struct DragOperation {
    pointer: Point,
    origin: Point,
    _listeners: [Subscription; 2],
}

#[derive(Default)]
struct DragState {
    press: Option<Subscription>,
    operation: Option<DragOperation>,
}

pub struct DraggableLogic {
    options: DraggableOptions,
    input: InputHub,
    state: Shared<DragState>,
}

impl DraggableLogic {
    pub fn new(options: DraggableOptions, input: InputHub) -> Self {
        Self {
            options,
            input,
            state: shared(DragState::default()),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state.borrow().operation.is_some()
    }
}

/// Everything the listeners of one drag need
#[derive(Clone)]
struct Drag {
    options: DraggableOptions,
    input: WeakInputHub,
    element: Weak<Element>,
    events: EventChannel<BehaviorEvent>,
    state: Weak<RefCell<DragState>>,
}

impl Drag {
    fn arm(&self, event: &PointerEvent) {
        if !event.is_primary() {
            return;
        }
        let (Some(element), Some(state), Some(input)) = (
            self.element.upgrade(),
            self.state.upgrade(),
            self.input.upgrade(),
        ) else {
            return;
        };
        if element.is_locked() || state.borrow().operation.is_some() {
            return;
        }

        let origin = element.position();
        let on_move = {
            let drag = self.clone();
            input.on_pointer(PointerPhase::Move, move |event| drag.track(event))
        };
        let on_up = {
            let drag = self.clone();
            input.on_pointer(PointerPhase::Up, move |event| {
                drag.track(event);
                drag.resolve();
            })
        };

        state.borrow_mut().operation = Some(DragOperation {
            pointer: event.local,
            origin,
            _listeners: [on_move, on_up],
        });
        tracing::debug!(element = element.id(), "drag started");
        self.events.emit(&BehaviorEvent::DragStart { position: origin });
    }

    fn track(&self, event: &PointerEvent) {
        let (Some(element), Some(state)) = (self.element.upgrade(), self.state.upgrade()) else {
            return;
        };
        let Some((pointer, origin)) = state
            .borrow()
            .operation
            .as_ref()
            .map(|op| (op.pointer, op.origin))
        else {
            return;
        };

        let target = snap_point(
            origin + (event.local - pointer),
            self.options.snap_to_grid,
            self.options.grid_size,
        );
        if target == element.position() {
            return;
        }
        if element.move_to(target.x, target.y) {
            self.events.emit(&BehaviorEvent::Drag { position: target });
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

        let position = self
            .element
            .upgrade()
            .map(|element| element.position())
            .unwrap_or_default();
        self.events.emit(&BehaviorEvent::DragEnd { position });
    }
}

impl BehaviorLogic for DraggableLogic {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>) {
        if self.state.borrow().press.is_some() {
            return;
        }
        let drag = Drag {
            options: self.options.clone(),
            input: self.input.downgrade(),
            element: Rc::downgrade(ctx.element),
            events: ctx.events.clone(),
            state: Rc::downgrade(&self.state),
        };
        let press = self
            .input
            .on_node(ctx.element.visual_node(), PointerPhase::Down, move |event| {
                drag.arm(event)
            });
        self.state.borrow_mut().press = Some(press);
    }

    fn cleanup(&mut self) {
        let (press, operation) = {
            let mut state = self.state.borrow_mut();
            (state.press.take(), state.operation.take())
        };
        drop(press);
        drop(operation);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
