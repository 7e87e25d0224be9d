//! Press to select; shows selection feedback on the element.

use std::any::Any;
use std::rc::{Rc, Weak};

use lightplot_core::{shared, BehaviorKind, Shared, Subscription};
use lightplot_settings::{SelectionSettings, StyleMap};
use serde::{Deserialize, Serialize};

use super::StyleOverride;
use crate::behavior::{BehaviorContext, BehaviorLogic};
use crate::element::{Element, ElementEvent, ElementEventKind, SelectState};
use crate::input::{InputHub, PointerPhase};
use crate::selection_manager::SelectionManager;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectableOptions {
    pub class_name: String,
    pub style: StyleMap,
}

impl Default for SelectableOptions {
    fn default() -> Self {
        let settings = SelectionSettings::default();
        Self {
            class_name: settings.class_name,
            style: settings.style,
        }
    }
}

#[derive(Default)]
struct SelectableState {
    element: Weak<Element>,
    subscriptions: Vec<Subscription>,
    feedback: Option<StyleOverride>,
}

pub struct SelectableLogic {
    options: Rc<SelectableOptions>,
    input: InputHub,
    selection: SelectionManager,
    state: Shared<SelectableState>,
}

impl SelectableLogic {
    pub fn new(options: SelectableOptions, input: InputHub, selection: SelectionManager) -> Self {
        Self {
            options: Rc::new(options),
            input,
            selection,
            state: shared(SelectableState::default()),
        }
    }

    /// Whether selection feedback is currently applied
    pub fn shows_feedback(&self) -> bool {
        self.state.borrow().feedback.is_some()
    }
}

fn show_feedback(state: &Shared<SelectableState>, options: &SelectableOptions, selected: bool) {
    let Some(element) = state.borrow().element.upgrade() else {
        return;
    };

    if selected {
        if state.borrow().feedback.is_some() {
            return;
        }
        let feedback = StyleOverride::apply(
            element.scene(),
            element.visual_node(),
            &BehaviorKind::Selectable,
            &options.class_name,
            &options.style,
        );
        state.borrow_mut().feedback = Some(feedback);
    } else {
        let feedback = state.borrow_mut().feedback.take();
        if let Some(feedback) = feedback {
            feedback.restore(element.scene());
        }
    }
}

impl BehaviorLogic for SelectableLogic {
    fn initialize(&mut self, ctx: &BehaviorContext<'_>) {
        if !self.state.borrow().subscriptions.is_empty() {
            return;
        }
        let element = ctx.element;
        self.state.borrow_mut().element = Rc::downgrade(element);

        let weak = Rc::downgrade(element);
        let selection = self.selection.clone();
        let press = self
            .input
            .on_node(element.visual_node(), PointerPhase::Down, move |event| {
                if !event.is_primary() {
                    return;
                }
                if let Some(element) = weak.upgrade() {
                    selection.press(&element, event.modifiers.extends_selection());
                }
            });

        let state = Rc::downgrade(&self.state);
        let options = Rc::clone(&self.options);
        let changes = element
            .events()
            .scoped(ElementEventKind::SelectionChanged, move |event| {
                if let (ElementEvent::SelectionChanged { selected }, Some(state)) =
                    (event, state.upgrade())
                {
                    show_feedback(&state, &options, *selected);
                }
            });

        self.state.borrow_mut().subscriptions = vec![press, changes];
        if element.is_selected() {
            show_feedback(&self.state, &self.options, true);
        }
    }

    fn cleanup(&mut self) {
        let subscriptions = std::mem::take(&mut self.state.borrow_mut().subscriptions);
        drop(subscriptions);
        show_feedback(&self.state, &self.options, false);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
