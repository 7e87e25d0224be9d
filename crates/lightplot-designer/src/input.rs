//! Pointer and keyboard input routing.
//!
//! The host feeds raw input into an [`InputHub`]. Pointer positions are
//! converted from client to scene-local coordinates through the viewport,
//! then delivered to
//! - listeners registered on the hit node and each of its ancestors, and
//! - global (document-level) listeners.
//!
//! Behaviors listen for presses on their element's node and, while an
//! operation is in flight, for global move/release events.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use lightplot_core::{Event, EventChannel, Point, Shared, Subscription};

use crate::scene::{NodeId, SceneHandle};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Keyboard modifiers held during an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };

    /// Whether the press should extend the current selection
    pub fn extends_selection(&self) -> bool {
        self.shift || self.ctrl
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub button: PointerButton,
    /// Position in client coordinates
    pub client: Point,
    /// Position in scene-local coordinates
    pub local: Point,
    pub modifiers: Modifiers,
    /// Topmost node under the pointer
    pub target: Option<NodeId>,
}

impl PointerEvent {
    pub fn is_primary(&self) -> bool {
        self.button == PointerButton::Primary
    }
}

impl Event for PointerEvent {
    type Kind = PointerPhase;

    fn kind(&self) -> PointerPhase {
        self.phase
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Character(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

/// Events delivered to global listeners
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Key,
}

impl From<PointerPhase> for InputKind {
    fn from(phase: PointerPhase) -> Self {
        match phase {
            PointerPhase::Down => InputKind::PointerDown,
            PointerPhase::Move => InputKind::PointerMove,
            PointerPhase::Up => InputKind::PointerUp,
        }
    }
}

impl Event for InputEvent {
    type Kind = InputKind;

    fn kind(&self) -> InputKind {
        match self {
            InputEvent::Pointer(p) => p.phase.into(),
            InputEvent::Key(_) => InputKind::Key,
        }
    }
}

struct HubInner {
    scene: SceneHandle,
    viewport: Shared<Viewport>,
    global: EventChannel<InputEvent>,
    nodes: RefCell<HashMap<NodeId, EventChannel<PointerEvent>>>,
}

/// Routes host input to node and global listeners.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone)]
pub struct InputHub {
    inner: Rc<HubInner>,
}

/// Non-owning handle to an [`InputHub`], held by listeners the hub itself stores
#[derive(Clone)]
pub struct WeakInputHub {
    inner: Weak<HubInner>,
}

impl WeakInputHub {
    pub fn upgrade(&self) -> Option<InputHub> {
        self.inner.upgrade().map(|inner| InputHub { inner })
    }
}

impl InputHub {
    pub fn downgrade(&self) -> WeakInputHub {
        WeakInputHub {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn new(scene: SceneHandle, viewport: Shared<Viewport>) -> Self {
        Self {
            inner: Rc::new(HubInner {
                scene,
                viewport,
                global: EventChannel::new("input"),
                nodes: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn viewport(&self) -> &Shared<Viewport> {
        &self.inner.viewport
    }

    /// Listen for pointer events that hit `node` or one of its descendants
    pub fn on_node<F>(&self, node: NodeId, phase: PointerPhase, listener: F) -> Subscription
    where
        F: Fn(&PointerEvent) + 'static,
    {
        let channel = self
            .inner
            .nodes
            .borrow_mut()
            .entry(node)
            .or_insert_with(|| EventChannel::new("node-input"))
            .clone();
        let id = channel.on(phase, listener);

        let weak: Weak<HubInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            channel.off(id);
            if channel.listener_count() == 0 {
                inner.nodes.borrow_mut().remove(&node);
            }
        })
    }

    /// Listen for a global pointer phase
    pub fn on_pointer<F>(&self, phase: PointerPhase, listener: F) -> Subscription
    where
        F: Fn(&PointerEvent) + 'static,
    {
        self.inner.global.scoped(phase.into(), move |event| {
            if let InputEvent::Pointer(pointer) = event {
                listener(pointer);
            }
        })
    }

    /// Listen for key presses
    pub fn on_key<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&KeyEvent) + 'static,
    {
        self.inner.global.scoped(InputKind::Key, move |event| {
            if let InputEvent::Key(key) = event {
                listener(key);
            }
        })
    }

    /// Deliver a pointer event and return it as dispatched
    pub fn dispatch_pointer(
        &self,
        phase: PointerPhase,
        button: PointerButton,
        client: Point,
        modifiers: Modifiers,
    ) -> PointerEvent {
        let local = self.inner.viewport.borrow().client_to_local(client);

        let (target, path) = {
            let scene = self.inner.scene.borrow();
            let target = scene.hit_test(local);
            let mut path = Vec::new();
            let mut cursor = target;
            while let Some(node) = cursor {
                path.push(node);
                cursor = scene.parent(node);
            }
            (target, path)
        };

        let event = PointerEvent {
            phase,
            button,
            client,
            local,
            modifiers,
            target,
        };
        tracing::trace!(?phase, x = local.x, y = local.y, ?target, "pointer");

        for node in path {
            let channel = self.inner.nodes.borrow().get(&node).cloned();
            if let Some(channel) = channel {
                channel.emit(&event);
            }
        }
        self.inner.global.emit(&InputEvent::Pointer(event.clone()));
        event
    }

    /// Primary-button press with no modifiers
    pub fn pointer_down(&self, client: Point) -> PointerEvent {
        self.dispatch_pointer(PointerPhase::Down, PointerButton::Primary, client, Modifiers::NONE)
    }

    pub fn pointer_move(&self, client: Point) -> PointerEvent {
        self.dispatch_pointer(PointerPhase::Move, PointerButton::Primary, client, Modifiers::NONE)
    }

    pub fn pointer_up(&self, client: Point) -> PointerEvent {
        self.dispatch_pointer(PointerPhase::Up, PointerButton::Primary, client, Modifiers::NONE)
    }

    pub fn dispatch_key(&self, key: Key, modifiers: Modifiers) {
        tracing::trace!(?key, "key");
        self.inner
            .global
            .emit(&InputEvent::Key(KeyEvent { key, modifiers }));
    }

    /// Number of global listeners currently registered
    pub fn global_listener_count(&self) -> usize {
        self.inner.global.listener_count()
    }

    pub fn global_added_total(&self) -> u64 {
        self.inner.global.added_total()
    }

    pub fn global_removed_total(&self) -> u64 {
        self.inner.global.removed_total()
    }

    /// Number of listeners registered on `node`
    pub fn node_listener_count(&self, node: NodeId) -> usize {
        self.inner
            .nodes
            .borrow()
            .get(&node)
            .map_or(0, |channel| channel.listener_count())
    }
}

impl std::fmt::Debug for InputHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHub")
            .field("global_listeners", &self.global_listener_count())
            .field("nodes", &self.inner.nodes.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{memory_scene, NodeShape};
    use lightplot_core::shared;
    use std::cell::Cell;

    fn hub_with_box() -> (InputHub, NodeId, NodeId) {
        let scene = memory_scene();
        let (group, rect) = {
            let mut s = scene.borrow_mut();
            let group = s.create_node(None, NodeShape::Group);
            let rect = s.create_node(
                Some(group),
                NodeShape::Rect {
                    width: 20.0,
                    height: 20.0,
                },
            );
            (group, rect)
        };
        (InputHub::new(scene, shared(Viewport::default())), group, rect)
    }

    #[test]
    fn test_press_bubbles_to_ancestors() {
        let (hub, group, rect) = hub_with_box();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        let _g = hub.on_node(group, PointerPhase::Down, move |_| h.set(h.get() + 1));
        let h = Rc::clone(&hits);
        let _r = hub.on_node(rect, PointerPhase::Down, move |_| h.set(h.get() + 10));

        let event = hub.pointer_down(Point::new(5.0, 5.0));
        assert_eq!(event.target, Some(rect));
        assert_eq!(hits.get(), 11);

        hub.pointer_down(Point::new(50.0, 50.0));
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn test_local_coordinates_use_viewport() {
        let (hub, _, rect) = hub_with_box();
        {
            let mut viewport = hub.viewport().borrow_mut();
            viewport.set_zoom(2.0);
            viewport.set_pan(100.0, 100.0);
        }
        let event = hub.pointer_down(Point::new(120.0, 120.0));
        assert_eq!(event.local, Point::new(10.0, 10.0));
        assert_eq!(event.target, Some(rect));
    }

    #[test]
    fn test_node_subscription_release() {
        let (hub, group, _) = hub_with_box();
        let sub = hub.on_node(group, PointerPhase::Down, |_| {});
        assert_eq!(hub.node_listener_count(group), 1);
        drop(sub);
        assert_eq!(hub.node_listener_count(group), 0);
    }

    #[test]
    fn test_global_listeners_balance() {
        let (hub, _, _) = hub_with_box();
        let moves = Rc::new(Cell::new(0));
        let m = Rc::clone(&moves);
        let sub = hub.on_pointer(PointerPhase::Move, move |_| m.set(m.get() + 1));
        let keys = hub.on_key(|_| {});

        hub.pointer_move(Point::new(1.0, 1.0));
        hub.pointer_up(Point::new(1.0, 1.0));
        assert_eq!(moves.get(), 1);

        drop(sub);
        drop(keys);
        assert_eq!(hub.global_listener_count(), 0);
        assert_eq!(hub.global_added_total(), hub.global_removed_total());
    }
}
