//! Attachable units of interaction logic.
//!
//! A [`Behavior`] wraps one [`BehaviorLogic`] plus the lifecycle every
//! behavior shares:
//!
//! ```text
//! Detached ──attach──▶ Attached+Disabled ──set_enabled(true)──▶ Attached+Enabled
//!     ▲                        │                                  (initialized)
//!     └───────detach───────────┴──────────────detach─────────────────┘
//! ```
//!
//! `initialize` runs when a behavior becomes both attached and enabled, and
//! `cleanup` when it stops being either. A behavior belongs to at most one
//! element at a time.

mod registry;

pub use registry::{BehaviorFactory, BehaviorRegistry};

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use lightplot_core::{BehaviorKind, Event, EventChannel, Options, Point, Rect};

use crate::behaviors::ResizeHandle;
use crate::element::{Element, ElementRef};

/// Shared handle to a behavior instance
pub type BehaviorHandle = Rc<Behavior>;

/// Events published by a behavior
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorEvent {
    Attached { element_id: String },
    Detached { element_id: String },
    EnabledChanged { enabled: bool },
    DragStart { position: Point },
    Drag { position: Point },
    DragEnd { position: Point },
    RotateStart { angle: f64 },
    Rotate { angle: f64 },
    RotateEnd { angle: f64 },
    ResizeStart { handle: ResizeHandle, bounds: Rect },
    Resize { handle: ResizeHandle, bounds: Rect },
    ResizeEnd { handle: ResizeHandle, bounds: Rect },
    DropStart { position: Point },
    DropMove { position: Point },
    DropComplete { position: Point },
    DropCancel { position: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorEventKind {
    Attached,
    Detached,
    EnabledChanged,
    DragStart,
    Drag,
    DragEnd,
    RotateStart,
    Rotate,
    RotateEnd,
    ResizeStart,
    Resize,
    ResizeEnd,
    DropStart,
    DropMove,
    DropComplete,
    DropCancel,
}

impl BehaviorEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::EnabledChanged => "enabledChanged",
            Self::DragStart => "dragStart",
            Self::Drag => "drag",
            Self::DragEnd => "dragEnd",
            Self::RotateStart => "rotateStart",
            Self::Rotate => "rotate",
            Self::RotateEnd => "rotateEnd",
            Self::ResizeStart => "resizeStart",
            Self::Resize => "resize",
            Self::ResizeEnd => "resizeEnd",
            Self::DropStart => "dropStart",
            Self::DropMove => "dropMove",
            Self::DropComplete => "dropComplete",
            Self::DropCancel => "dropCancel",
        }
    }
}

impl fmt::Display for BehaviorEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event for BehaviorEvent {
    type Kind = BehaviorEventKind;

    fn kind(&self) -> BehaviorEventKind {
        match self {
            Self::Attached { .. } => BehaviorEventKind::Attached,
            Self::Detached { .. } => BehaviorEventKind::Detached,
            Self::EnabledChanged { .. } => BehaviorEventKind::EnabledChanged,
            Self::DragStart { .. } => BehaviorEventKind::DragStart,
            Self::Drag { .. } => BehaviorEventKind::Drag,
            Self::DragEnd { .. } => BehaviorEventKind::DragEnd,
            Self::RotateStart { .. } => BehaviorEventKind::RotateStart,
            Self::Rotate { .. } => BehaviorEventKind::Rotate,
            Self::RotateEnd { .. } => BehaviorEventKind::RotateEnd,
            Self::ResizeStart { .. } => BehaviorEventKind::ResizeStart,
            Self::Resize { .. } => BehaviorEventKind::Resize,
            Self::ResizeEnd { .. } => BehaviorEventKind::ResizeEnd,
            Self::DropStart { .. } => BehaviorEventKind::DropStart,
            Self::DropMove { .. } => BehaviorEventKind::DropMove,
            Self::DropComplete { .. } => BehaviorEventKind::DropComplete,
            Self::DropCancel { .. } => BehaviorEventKind::DropCancel,
        }
    }
}

/// What a behavior's logic may use while initializing.
pub struct BehaviorContext<'a> {
    pub kind: &'a BehaviorKind,
    pub element: &'a ElementRef,
    pub events: &'a EventChannel<BehaviorEvent>,
}

/// Behavior-specific extension points.
///
/// Both hooks must be idempotent. Everything `initialize` registers
/// (element listeners, input listeners, handle nodes) must be released by
/// `cleanup`, including listeners of an operation that is still in flight.
pub trait BehaviorLogic: Any {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>);

    fn cleanup(&mut self);

    fn as_any(&self) -> &dyn Any;
}

/// A behavior instance: lifecycle state plus its logic.
pub struct Behavior {
    kind: BehaviorKind,
    options: Options,
    element: RefCell<Option<Weak<Element>>>,
    enabled: Cell<bool>,
    initialized: Cell<bool>,
    /// Set when `cleanup` found the logic borrowed; runs once the borrow ends
    cleanup_pending: Cell<bool>,
    events: EventChannel<BehaviorEvent>,
    logic: RefCell<Box<dyn BehaviorLogic>>,
}

impl Behavior {
    /// Create an enabled, detached behavior
    pub fn new(kind: BehaviorKind, options: Options, logic: impl BehaviorLogic) -> BehaviorHandle {
        Rc::new(Self {
            kind,
            options,
            element: RefCell::new(None),
            enabled: Cell::new(true),
            initialized: Cell::new(false),
            cleanup_pending: Cell::new(false),
            events: EventChannel::new("behavior"),
            logic: RefCell::new(Box::new(logic)),
        })
    }

    pub fn kind(&self) -> &BehaviorKind {
        &self.kind
    }

    /// Options after merging caller overrides onto the defaults
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn events(&self) -> &EventChannel<BehaviorEvent> {
        &self.events
    }

    /// The element this behavior is attached to
    pub fn element(&self) -> Option<ElementRef> {
        self.element.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.element().is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Bind to `element`, detaching from any previous owner first.
    ///
    /// Attaching to the element the behavior already belongs to is a no-op,
    /// apart from retrying an initialize that was previously skipped.
    pub fn attach(self: &Rc<Self>, element: &ElementRef) {
        if let Some(current) = self.element() {
            if Rc::ptr_eq(&current, element) {
                if self.enabled.get() {
                    self.initialize();
                }
                return;
            }
            self.detach();
        }

        element.adopt_behavior(self);
        *self.element.borrow_mut() = Some(Rc::downgrade(element));
        tracing::debug!(kind = %self.kind, element = element.id(), "behavior attached");

        if self.enabled.get() {
            self.initialize();
        }
        self.events.emit(&BehaviorEvent::Attached {
            element_id: element.id().to_string(),
        });
    }

    /// Unbind from the current element; a no-op when already detached
    pub fn detach(&self) {
        let Some(weak) = self.element.borrow().clone() else {
            return;
        };

        if self.initialized.get() {
            self.cleanup();
        }
        *self.element.borrow_mut() = None;

        let element_id = match weak.upgrade() {
            Some(element) => {
                element.release_behavior(&self.kind, self);
                element.id().to_string()
            }
            None => String::new(),
        };
        tracing::debug!(kind = %self.kind, element = %element_id, "behavior detached");
        self.events.emit(&BehaviorEvent::Detached { element_id });
    }

    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.replace(enabled) == enabled {
            return;
        }

        if self.element.borrow().is_some() {
            if enabled {
                self.initialize();
            } else if self.initialized.get() {
                self.cleanup();
            }
        }
        self.events.emit(&BehaviorEvent::EnabledChanged { enabled });
    }

    fn initialize(&self) {
        if self.initialized.get() {
            return;
        }
        self.run_pending_cleanup();

        let Some(element) = self.element() else {
            tracing::warn!(kind = %self.kind, "cannot initialize behavior without an element");
            return;
        };
        if !element.scene().borrow().contains(element.visual_node()) {
            tracing::warn!(
                kind = %self.kind,
                element = element.id(),
                "cannot initialize behavior: visual node is missing"
            );
            return;
        }

        let Ok(mut logic) = self.logic.try_borrow_mut() else {
            tracing::warn!(kind = %self.kind, "behavior is busy; initialize skipped");
            return;
        };
        let ctx = BehaviorContext {
            kind: &self.kind,
            element: &element,
            events: &self.events,
        };
        logic.initialize(&ctx);
        self.initialized.set(true);
    }

    /// Leaves the behavior uninitialized in every case; a busy logic has its
    /// cleanup deferred until the outstanding borrow is released.
    fn cleanup(&self) {
        self.initialized.set(false);
        match self.logic.try_borrow_mut() {
            Ok(mut logic) => logic.cleanup(),
            Err(_) => {
                tracing::debug!(kind = %self.kind, "behavior is busy; cleanup deferred");
                self.cleanup_pending.set(true);
            }
        }
    }

    fn run_pending_cleanup(&self) {
        if !self.cleanup_pending.get() {
            return;
        }
        if let Ok(mut logic) = self.logic.try_borrow_mut() {
            self.cleanup_pending.set(false);
            logic.cleanup();
        }
    }

    /// Run `f` against the logic if it is of type `T`
    pub fn with_logic<T, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R>
    where
        T: BehaviorLogic,
    {
        let result = {
            let logic = self.logic.try_borrow().ok()?;
            logic.as_any().downcast_ref::<T>().map(f)
        };
        self.run_pending_cleanup();
        result
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("kind", &self.kind)
            .field("attached", &self.is_attached())
            .field("enabled", &self.enabled.get())
            .field("initialized", &self.initialized.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementConfig};
    use crate::model::PlainModel;
    use crate::scene::memory_scene;

    #[derive(Default)]
    struct Counting {
        initialized: Rc<Cell<u32>>,
        cleaned: Rc<Cell<u32>>,
    }

    impl BehaviorLogic for Counting {
        fn initialize(&mut self, _ctx: &BehaviorContext<'_>) {
            self.initialized.set(self.initialized.get() + 1);
        }

        fn cleanup(&mut self) {
            self.cleaned.set(self.cleaned.get() + 1);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn element(id: &str) -> ElementRef {
        Element::new(
            ElementConfig::new(id, "fixture"),
            memory_scene(),
            Rc::new(PlainModel),
        )
        .unwrap()
    }

    fn counting() -> (BehaviorHandle, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let logic = Counting::default();
        let init = Rc::clone(&logic.initialized);
        let clean = Rc::clone(&logic.cleaned);
        (
            Behavior::new(BehaviorKind::Custom("marker".into()), Options::new(), logic),
            init,
            clean,
        )
    }

    #[test]
    fn test_attach_initializes_once() {
        let (behavior, init, _) = counting();
        let a = element("a");
        behavior.attach(&a);
        behavior.attach(&a);
        assert_eq!(init.get(), 1);
        assert!(behavior.is_initialized());
        assert!(a.has_behavior(behavior.kind()));
    }

    #[test]
    fn test_reattach_moves_ownership() {
        let (behavior, init, clean) = counting();
        let a = element("a");
        let b = element("b");

        behavior.attach(&a);
        behavior.attach(&b);

        assert!(!a.has_behavior(behavior.kind()));
        assert!(b.has_behavior(behavior.kind()));
        assert_eq!(behavior.element().map(|e| e.id().to_string()), Some("b".into()));
        assert_eq!(init.get(), 2);
        assert_eq!(clean.get(), 1);
    }

    #[test]
    fn test_disabled_behavior_initializes_on_enable() {
        let (behavior, init, clean) = counting();
        behavior.set_enabled(false);
        let a = element("a");
        behavior.attach(&a);
        assert_eq!(init.get(), 0);

        behavior.set_enabled(true);
        assert_eq!(init.get(), 1);
        behavior.set_enabled(false);
        assert_eq!(clean.get(), 1);
        assert!(!behavior.is_initialized());
    }

    #[test]
    fn test_detach_when_detached_is_noop() {
        let (behavior, _, clean) = counting();
        let detached = Rc::new(Cell::new(0));
        let d = Rc::clone(&detached);
        behavior
            .events()
            .on(BehaviorEventKind::Detached, move |_| d.set(d.get() + 1));

        behavior.detach();
        assert_eq!(detached.get(), 0);

        let a = element("a");
        behavior.attach(&a);
        behavior.detach();
        behavior.detach();
        assert_eq!(detached.get(), 1);
        assert_eq!(clean.get(), 1);
    }

    #[test]
    fn test_detach_from_inside_logic_defers_cleanup() {
        let (behavior, _, clean) = counting();
        let a = element("a");
        behavior.attach(&a);

        let inside = behavior.with_logic(|_: &Counting| {
            behavior.detach();
            (behavior.is_attached(), behavior.is_initialized(), clean.get())
        });
        assert_eq!(inside, Some((false, false, 0)));

        assert_eq!(clean.get(), 1);
        assert!(!a.has_behavior(behavior.kind()));
    }

    #[test]
    fn test_deferred_cleanup_runs_before_reattach() {
        let (behavior, init, clean) = counting();
        let a = element("a");
        behavior.attach(&a);

        behavior.with_logic(|_: &Counting| behavior.set_enabled(false));
        behavior.set_enabled(true);

        assert_eq!(clean.get(), 1);
        assert_eq!(init.get(), 2);
        assert!(behavior.is_initialized());
    }

    #[test]
    fn test_missing_visual_node_leaves_behavior_uninitialized() {
        let (behavior, init, _) = counting();
        let a = element("a");
        a.scene().borrow_mut().remove_node(a.visual_node());

        behavior.attach(&a);
        assert!(behavior.is_attached());
        assert!(!behavior.is_initialized());
        assert_eq!(init.get(), 0);
    }
}
