//! Edge and corner handles that resize the selected element.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use lightplot_core::{shared, EventChannel, Point, Rect, Shared, Subscription};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::behavior::{BehaviorContext, BehaviorEvent, BehaviorLogic};
use crate::element::{Element, ElementEventKind, LockState, SelectState};
use crate::input::{InputHub, PointerEvent, PointerPhase, WeakInputHub};
use crate::scene::{NodeId, NodeShape};

/// One resize handle, named by the compass direction it sits at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    E,
    S,
    W,
    NW,
    NE,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::E,
        ResizeHandle::S,
        ResizeHandle::W,
        ResizeHandle::NW,
        ResizeHandle::NE,
        ResizeHandle::SE,
        ResizeHandle::SW,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::N => "n",
            Self::E => "e",
            Self::S => "s",
            Self::W => "w",
            Self::NW => "nw",
            Self::NE => "ne",
            Self::SE => "se",
            Self::SW => "sw",
        }
    }

    pub fn moves_left(&self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, Self::N | Self::NW | Self::NE)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, Self::S | Self::SW | Self::SE)
    }

    pub fn is_corner(&self) -> bool {
        matches!(self, Self::NW | Self::NE | Self::SE | Self::SW)
    }

    /// Where the handle sits on `bounds`
    pub fn anchor(&self, bounds: &Rect) -> Point {
        let x = if self.moves_left() {
            bounds.x
        } else if self.moves_right() {
            bounds.right()
        } else {
            bounds.x + bounds.width / 2.0
        };
        let y = if self.moves_top() {
            bounds.y
        } else if self.moves_bottom() {
            bounds.bottom()
        } else {
            bounds.y + bounds.height / 2.0
        };
        Point::new(x, y)
    }
}

impl fmt::Display for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size constraints applied while resizing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeLimits {
    pub min_width: f64,
    pub min_height: f64,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
    pub preserve_aspect_ratio: bool,
}

impl Default for ResizeLimits {
    fn default() -> Self {
        Self {
            min_width: 10.0,
            min_height: 10.0,
            max_width: None,
            max_height: None,
            preserve_aspect_ratio: false,
        }
    }
}

fn clamp_dimension(value: f64, min: f64, max: Option<f64>) -> f64 {
    let min = min.max(0.0);
    let value = value.max(min);
    match max {
        Some(max) if max >= min => value.min(max),
        _ => value,
    }
}

/// Bounds after dragging `handle` by `(dx, dy)` from `start`.
///
/// The edges the handle does not move stay where they were in `start`.
pub fn compute_resize(start: Rect, handle: ResizeHandle, dx: f64, dy: f64, limits: &ResizeLimits) -> Rect {
    let mut width = start.width;
    let mut height = start.height;
    if handle.moves_right() {
        width += dx;
    }
    if handle.moves_left() {
        width -= dx;
    }
    if handle.moves_bottom() {
        height += dy;
    }
    if handle.moves_top() {
        height -= dy;
    }

    if limits.preserve_aspect_ratio && start.width > 0.0 && start.height > 0.0 {
        let ratio = start.width / start.height;
        let width_changed = handle.moves_left() || handle.moves_right();
        let height_changed = handle.moves_top() || handle.moves_bottom();
        let width_leads = match (width_changed, height_changed) {
            (true, false) => true,
            (false, true) => false,
            _ => (width / start.width - 1.0).abs() >= (height / start.height - 1.0).abs(),
        };
        if width_leads {
            height = width / ratio;
        } else {
            width = height * ratio;
        }
    }

    width = clamp_dimension(width, limits.min_width, limits.max_width);
    height = clamp_dimension(height, limits.min_height, limits.max_height);

    let x = if handle.moves_left() {
        start.right() - width
    } else {
        start.x
    };
    let y = if handle.moves_top() {
        start.bottom() - height
    } else {
        start.y
    };
    Rect::new(x, y, width, height)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResizableOptions {
    pub handles: Vec<ResizeHandle>,
    pub min_width: f64,
    pub min_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    pub preserve_aspect_ratio: bool,
    pub handle_size: f64,
}

impl Default for ResizableOptions {
    fn default() -> Self {
        let limits = ResizeLimits::default();
        Self {
            handles: ResizeHandle::ALL.to_vec(),
            min_width: limits.min_width,
            min_height: limits.min_height,
            max_width: limits.max_width,
            max_height: limits.max_height,
            preserve_aspect_ratio: limits.preserve_aspect_ratio,
            handle_size: 8.0,
        }
    }
}

impl ResizableOptions {
    pub fn limits(&self) -> ResizeLimits {
        ResizeLimits {
            min_width: self.min_width,
            min_height: self.min_height,
            max_width: self.max_width,
            max_height: self.max_height,
            preserve_aspect_ratio: self.preserve_aspect_ratio,
        }
    }
}

struct HandleNode {
    handle: ResizeHandle,
    node: NodeId,
    _press: Subscription,
}

struct ResizeOperation {
    handle: ResizeHandle,
    pointer: Point,
    start: Rect,
    _listeners: [Subscription; 2],
}

#[derive(Default)]
struct ResizeState {
    element: Weak<Element>,
    watchers: Vec<Subscription>,
    handles: SmallVec<[HandleNode; 8]>,
    operation: Option<ResizeOperation>,
}

pub struct ResizableLogic {
    options: ResizableOptions,
    input: InputHub,
    state: Shared<ResizeState>,
}

impl ResizableLogic {
    pub fn new(options: ResizableOptions, input: InputHub) -> Self {
        Self {
            options,
            input,
            state: shared(ResizeState::default()),
        }
    }

    pub fn is_resizing(&self) -> bool {
        self.state.borrow().operation.is_some()
    }

    /// Node of `handle`, while handles are shown
    pub fn handle_node(&self, handle: ResizeHandle) -> Option<NodeId> {
        self.state
            .borrow()
            .handles
            .iter()
            .find(|h| h.handle == handle)
            .map(|h| h.node)
    }
}

#[derive(Clone)]
struct Resize {
    options: ResizableOptions,
    input: WeakInputHub,
    events: EventChannel<BehaviorEvent>,
    state: Weak<RefCell<ResizeState>>,
}

impl Resize {
    fn element(&self) -> Option<Rc<Element>> {
        self.state.upgrade()?.borrow().element.upgrade()
    }

    fn handle_origin(&self, handle: ResizeHandle, bounds: &Rect) -> Point {
        let anchor = handle.anchor(bounds);
        let half = self.options.handle_size / 2.0;
        Point::new(anchor.x - half, anchor.y - half)
    }

    fn sync_handles(&self) {
        let (Some(state), Some(element)) = (self.state.upgrade(), self.element()) else {
            return;
        };
        let wanted = element.is_selected() && !element.is_locked() && !element.is_removed();
        let bounds = element.bounds();

        let Some(bounds) = bounds.filter(|_| wanted) else {
            let handles = std::mem::take(&mut state.borrow_mut().handles);
            let mut surface = element.scene().borrow_mut();
            for handle in handles {
                surface.remove_node(handle.node);
            }
            return;
        };

        if !state.borrow().handles.is_empty() {
            let mut surface = element.scene().borrow_mut();
            for handle in state.borrow().handles.iter() {
                surface.set_translation(handle.node, self.handle_origin(handle.handle, &bounds));
            }
            return;
        }

        let Some(input) = self.input.upgrade() else {
            return;
        };
        let mut created: SmallVec<[HandleNode; 8]> = SmallVec::new();
        for handle in self.options.handles.iter().copied() {
            let node = {
                let mut surface = element.scene().borrow_mut();
                let node = surface.create_node(
                    None,
                    NodeShape::Rect {
                        width: self.options.handle_size,
                        height: self.options.handle_size,
                    },
                );
                surface.set_translation(node, self.handle_origin(handle, &bounds));
                surface.add_class(node, "resize-handle");
                surface.add_class(node, handle.as_str());
                node
            };
            let resize = self.clone();
            let press = input.on_node(node, PointerPhase::Down, move |event| {
                resize.arm(handle, event)
            });
            created.push(HandleNode {
                handle,
                node,
                _press: press,
            });
        }
        state.borrow_mut().handles = created;
    }

    fn arm(&self, handle: ResizeHandle, event: &PointerEvent) {
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
        let Some(start) = element.bounds() else {
            return;
        };

        let on_move = {
            let resize = self.clone();
            input.on_pointer(PointerPhase::Move, move |event| resize.track(event))
        };
        let on_up = {
            let resize = self.clone();
            input.on_pointer(PointerPhase::Up, move |event| {
                resize.track(event);
                resize.resolve();
            })
        };
        state.borrow_mut().operation = Some(ResizeOperation {
            handle,
            pointer: event.local,
            start,
            _listeners: [on_move, on_up],
        });
        self.events.emit(&BehaviorEvent::ResizeStart {
            handle,
            bounds: start,
        });
    }

    fn track(&self, event: &PointerEvent) {
        let (Some(state), Some(element)) = (self.state.upgrade(), self.element()) else {
            return;
        };
        let Some((handle, pointer, start)) = state
            .borrow()
            .operation
            .as_ref()
            .map(|op| (op.handle, op.pointer, op.start))
        else {
            return;
        };

        let delta = event.local - pointer;
        let bounds = compute_resize(start, handle, delta.x, delta.y, &self.options.limits());
        if element.bounds().is_some_and(|current| same_bounds(&current, &bounds)) {
            return;
        }
        if element.resize_to(bounds) {
            self.events.emit(&BehaviorEvent::Resize { handle, bounds });
        }
    }

    fn resolve(&self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        let Some(operation) = state.borrow_mut().operation.take() else {
            return;
        };
        let handle = operation.handle;
        drop(operation);

        let bounds = self
            .element()
            .and_then(|element| element.bounds())
            .unwrap_or_default();
        self.events.emit(&BehaviorEvent::ResizeEnd { handle, bounds });
    }
}

fn same_bounds(a: &Rect, b: &Rect) -> bool {
    const TOLERANCE: f64 = 1e-9;
    (a.x - b.x).abs() < TOLERANCE
        && (a.y - b.y).abs() < TOLERANCE
        && (a.width - b.width).abs() < TOLERANCE
        && (a.height - b.height).abs() < TOLERANCE
}

impl BehaviorLogic for ResizableLogic {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>) {
        if !self.state.borrow().watchers.is_empty() {
            return;
        }
        let element = ctx.element;
        self.state.borrow_mut().element = Rc::downgrade(element);

        let resize = Resize {
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
            let resize = resize.clone();
            element.events().scoped(kind, move |_| resize.sync_handles())
        })
        .collect();
        self.state.borrow_mut().watchers = watchers;

        resize.sync_handles();
    }

    fn cleanup(&mut self) {
        let (watchers, handles, operation, element) = {
            let mut state = self.state.borrow_mut();
            (
                std::mem::take(&mut state.watchers),
                std::mem::take(&mut state.handles),
                state.operation.take(),
                state.element.upgrade(),
            )
        };
        drop(watchers);
        drop(operation);
        if let Some(element) = element {
            let mut surface = element.scene().borrow_mut();
            for handle in &handles {
                surface.remove_node(handle.node);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
