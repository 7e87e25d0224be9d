use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use lightplot_settings::SelectionPolicy;

use crate::element::{Element, ElementRef, SelectState};

struct SelectionInner {
    policy: Cell<SelectionPolicy>,
    members: RefCell<Vec<Weak<Element>>>,
}

/// Manages the set of selected elements.
///
/// `SelectionManager` is the multi-select bookkeeping that lives outside
/// the elements themselves:
/// - A plain press selects only the pressed element
/// - A press with Shift or Ctrl held follows the configured [`SelectionPolicy`]
/// - Removed elements drop out of the set
///
/// Elements keep their own `selected` flag; the manager flips those flags
/// and never reads them from a cache. Others are always deselected before
/// the new element is selected, so their `selection:change` events come
/// first.
#[derive(Clone)]
pub struct SelectionManager {
    inner: Rc<SelectionInner>,
}

impl SelectionManager {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            inner: Rc::new(SelectionInner {
                policy: Cell::new(policy),
                members: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.inner.policy.get()
    }

    pub fn set_policy(&self, policy: SelectionPolicy) {
        self.inner.policy.set(policy);
    }

    /// Apply a press on `element`, `extend` being whether a selection modifier was held
    pub fn press(&self, element: &ElementRef, extend: bool) {
        match (self.policy(), extend) {
            (SelectionPolicy::Toggle, true) => self.toggle(element),
            (SelectionPolicy::Add, true) => self.add(element),
            _ => self.select_only(element),
        }
    }

    /// Deselect everything else, then select `element`
    pub fn select_only(&self, element: &ElementRef) {
        let others: Vec<ElementRef> = self
            .selected()
            .into_iter()
            .filter(|other| !Rc::ptr_eq(other, element))
            .collect();
        for other in &others {
            other.select(false);
        }

        *self.inner.members.borrow_mut() = vec![Rc::downgrade(element)];
        element.select(true);
    }

    pub fn add(&self, element: &ElementRef) {
        if element.is_removed() {
            return;
        }
        if !self.contains(element) {
            self.inner.members.borrow_mut().push(Rc::downgrade(element));
        }
        element.select(true);
    }

    pub fn toggle(&self, element: &ElementRef) {
        if self.contains(element) {
            self.deselect(element);
        } else {
            self.add(element);
        }
    }

    pub fn deselect(&self, element: &ElementRef) {
        self.inner
            .members
            .borrow_mut()
            .retain(|member| !std::ptr::eq(member.as_ptr(), Rc::as_ptr(element)));
        element.select(false);
    }

    /// Deselect every member
    pub fn clear(&self) {
        let members = self.selected();
        self.inner.members.borrow_mut().clear();
        for member in members {
            member.select(false);
        }
    }

    /// Live, still-selected members in selection order
    pub fn selected(&self) -> Vec<ElementRef> {
        let mut members = self.inner.members.borrow_mut();
        members.retain(|member| {
            member
                .upgrade()
                .is_some_and(|element| !element.is_removed() && element.is_selected())
        });
        members.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn contains(&self, element: &ElementRef) -> bool {
        self.selected().iter().any(|member| Rc::ptr_eq(member, element))
    }

    pub fn len(&self) -> usize {
        self.selected().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(SelectionPolicy::default())
    }
}

impl std::fmt::Debug for SelectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionManager")
            .field("policy", &self.policy())
            .field("selected", &self.len())
            .finish()
    }
}
