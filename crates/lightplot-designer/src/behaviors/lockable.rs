//! Lock feedback.
//!
//! Locking itself is a flag on the element; the pointer behaviors check it
//! before arming. This behavior only styles the element while it is locked.

use std::any::Any;
use std::rc::{Rc, Weak};

use lightplot_core::{shared, BehaviorKind, Shared, Subscription};
use lightplot_settings::{LockSettings, StyleMap};
use serde::{Deserialize, Serialize};

use super::StyleOverride;
use crate::behavior::{BehaviorContext, BehaviorLogic};
use crate::element::{Element, ElementEvent, ElementEventKind, LockState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LockableOptions {
    pub class_name: String,
    pub style: StyleMap,
}

impl Default for LockableOptions {
    fn default() -> Self {
        let settings = LockSettings::default();
        Self {
            class_name: settings.class_name,
            style: settings.style,
        }
    }
}

#[derive(Default)]
struct LockableState {
    element: Weak<Element>,
    subscription: Option<Subscription>,
    feedback: Option<StyleOverride>,
}

pub struct LockableLogic {
    options: Rc<LockableOptions>,
    state: Shared<LockableState>,
}

impl LockableLogic {
    pub fn new(options: LockableOptions) -> Self {
        Self {
            options: Rc::new(options),
            state: shared(LockableState::default()),
        }
    }

    pub fn shows_feedback(&self) -> bool {
        self.state.borrow().feedback.is_some()
    }
}

fn show_feedback(state: &Shared<LockableState>, options: &LockableOptions, locked: bool) {
    let Some(element) = state.borrow().element.upgrade() else {
        return;
    };

    if locked {
        if state.borrow().feedback.is_some() {
            return;
        }
        let feedback = StyleOverride::apply(
            element.scene(),
            element.visual_node(),
            &BehaviorKind::Lockable,
            &options.class_name,
            &options.style,
        );
        state.borrow_mut().feedback = Some(feedback);
    } else if let Some(feedback) = state.borrow_mut().feedback.take() {
        feedback.restore(element.scene());
    }
}

impl BehaviorLogic for LockableLogic {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>) {
        if self.state.borrow().subscription.is_some() {
            return;
        }
        let element = ctx.element;
        self.state.borrow_mut().element = Rc::downgrade(element);

        let state = Rc::downgrade(&self.state);
        let options = Rc::clone(&self.options);
        let subscription = element
            .events()
            .scoped(ElementEventKind::LockChanged, move |event| {
                if let (ElementEvent::LockChanged { locked }, Some(state)) =
                    (event, state.upgrade())
                {
                    show_feedback(&state, &options, *locked);
                }
            });
        self.state.borrow_mut().subscription = Some(subscription);

        if element.is_locked() {
            show_feedback(&self.state, &self.options, true);
        }
    }

    fn cleanup(&mut self) {
        let subscription = self.state.borrow_mut().subscription.take();
        drop(subscription);
        show_feedback(&self.state, &self.options, false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
