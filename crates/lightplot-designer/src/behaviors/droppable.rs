//! Placement from the library: the element follows the pointer until a
//! release drops it or Escape cancels.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lightplot_core::{shared, BehaviorKind, EventChannel, Point, Shared, Subscription};
use lightplot_settings::{DropSettings, StyleMap};
use serde::{Deserialize, Serialize};

use super::{snap_point, StyleOverride};
use crate::behavior::{BehaviorContext, BehaviorEvent, BehaviorLogic};
use crate::element::{Element, LockState};
use crate::input::{InputHub, Key, PointerEvent, PointerPhase, WeakInputHub};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DroppableOptions {
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub class_name: String,
    pub style: StyleMap,
    /// Keep the element centered under the pointer rather than its origin
    pub center_on_pointer: bool,
    /// Begin following the pointer as soon as the behavior is initialized
    pub start_on_attach: bool,
}

impl Default for DroppableOptions {
    fn default() -> Self {
        let settings = DropSettings::default();
        Self {
            snap_to_grid: false,
            grid_size: 10.0,
            class_name: settings.class_name,
            style: settings.style,
            center_on_pointer: settings.center_on_pointer,
            start_on_attach: true,
        }
    }
}

struct DropOperation {
    origin: Point,
    feedback: StyleOverride,
    listeners: [Subscription; 3],
}

#[derive(Default)]
struct DropState {
    element: Weak<Element>,
    events: Option<EventChannel<BehaviorEvent>>,
    operation: Option<DropOperation>,
}

pub struct DroppableLogic {
    placement: Placement,
}

struct Placement {
    options: Rc<DroppableOptions>,
    input: WeakInputHub,
    state: Shared<DropState>,
}

impl DroppableLogic {
    pub fn new(options: DroppableOptions, input: InputHub) -> Self {
        Self {
            placement: Placement {
                options: Rc::new(options),
                input: input.downgrade(),
                state: shared(DropState::default()),
            },
        }
    }

    pub fn is_dropping(&self) -> bool {
        self.placement.state.borrow().operation.is_some()
    }

    /// Start following the pointer; false if already dropping, locked or detached
    pub fn begin(&self) -> bool {
        self.placement.begin()
    }

    /// Abandon the drop and put the element back where it started
    pub fn cancel(&self) -> bool {
        self.placement.cancel()
    }
}

impl Placement {
    fn element(&self) -> Option<Rc<Element>> {
        self.state.borrow().element.upgrade()
    }

    fn emit(&self, event: BehaviorEvent) {
        let events = self.state.borrow().events.clone();
        if let Some(events) = events {
            events.emit(&event);
        }
    }

    fn begin(&self) -> bool {
        let (Some(element), Some(input)) = (self.element(), self.input.upgrade()) else {
            return false;
        };
        if element.is_locked() || self.state.borrow().operation.is_some() {
            return false;
        }

        let origin = element.position();
        let feedback = StyleOverride::apply(
            element.scene(),
            element.visual_node(),
            &BehaviorKind::Droppable,
            &self.options.class_name,
            &self.options.style,
        );

        let weak = Rc::downgrade(&self.state);
        let on_move = {
            let placement = self.weak_clone(&weak);
            input.on_pointer(PointerPhase::Move, move |event| {
                if let Some(placement) = placement.upgrade() {
                    placement.follow(event);
                }
            })
        };
        let on_up = {
            let placement = self.weak_clone(&weak);
            input.on_pointer(PointerPhase::Up, move |event| {
                if let Some(placement) = placement.upgrade() {
                    placement.follow(event);
                    placement.complete();
                }
            })
        };
        let on_key = {
            let placement = self.weak_clone(&weak);
            input.on_key(move |event| {
                if event.key == Key::Escape {
                    if let Some(placement) = placement.upgrade() {
                        placement.cancel();
                    }
                }
            })
        };

        self.state.borrow_mut().operation = Some(DropOperation {
            origin,
            feedback,
            listeners: [on_move, on_up, on_key],
        });
        tracing::debug!(element = element.id(), "drop started");
        self.emit(BehaviorEvent::DropStart { position: origin });
        true
    }

    fn weak_clone(&self, state: &Weak<RefCell<DropState>>) -> WeakPlacement {
        WeakPlacement {
            options: Rc::clone(&self.options),
            input: self.input.clone(),
            state: state.clone(),
        }
    }

    fn follow(&self, event: &PointerEvent) {
        let Some(element) = self.element() else {
            return;
        };
        if self.state.borrow().operation.is_none() {
            return;
        }

        let mut target = event.local;
        if self.options.center_on_pointer {
            if let Some(bounds) = element.bounds() {
                let position = element.position();
                // Offset from the node origin to its bounds center
                let center = bounds.center() - position;
                target = target - center;
            }
        }
        let target = snap_point(target, self.options.snap_to_grid, self.options.grid_size);
        if element.position() != target && element.move_to(target.x, target.y) {
            self.emit(BehaviorEvent::DropMove { position: target });
        }
    }

    fn finish(&self) -> Option<(Rc<Element>, Point)> {
        let operation = self.state.borrow_mut().operation.take()?;
        let element = self.element()?;
        let DropOperation {
            origin,
            feedback,
            listeners,
        } = operation;
        drop(listeners);
        feedback.restore(element.scene());
        Some((element, origin))
    }

    fn complete(&self) -> bool {
        let Some((element, _)) = self.finish() else {
            return false;
        };
        let position = element.position();
        tracing::debug!(element = element.id(), x = position.x, y = position.y, "drop completed");
        self.emit(BehaviorEvent::DropComplete { position });
        true
    }

    fn cancel(&self) -> bool {
        let Some((element, origin)) = self.finish() else {
            return false;
        };
        element.move_to(origin.x, origin.y);
        tracing::debug!(element = element.id(), "drop cancelled");
        self.emit(BehaviorEvent::DropCancel { position: origin });
        true
    }
}

/// Placement held by the input listeners it registers
struct WeakPlacement {
    options: Rc<DroppableOptions>,
    input: WeakInputHub,
    state: Weak<RefCell<DropState>>,
}

impl WeakPlacement {
    fn upgrade(&self) -> Option<Placement> {
        Some(Placement {
            options: Rc::clone(&self.options),
            input: self.input.clone(),
            state: self.state.upgrade()?,
        })
    }
}

impl BehaviorLogic for DroppableLogic {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>) {
        {
            let mut state = self.placement.state.borrow_mut();
            state.element = Rc::downgrade(ctx.element);
            state.events = Some(ctx.events.clone());
        }
        if self.placement.options.start_on_attach {
            self.placement.begin();
        }
    }

    fn cleanup(&mut self) {
        let (operation, element) = {
            let mut state = self.placement.state.borrow_mut();
            state.events = None;
            (state.operation.take(), state.element.upgrade())
        };
        if let Some(operation) = operation {
            let DropOperation {
                feedback,
                listeners,
                ..
            } = operation;
            drop(listeners);
            if let Some(element) = element {
                feedback.restore(element.scene());
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
