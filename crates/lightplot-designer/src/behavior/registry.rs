//! Named behavior factories.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use lightplot_core::{BehaviorKind, BehaviorSpec, Options, Result};

use super::BehaviorHandle;
use crate::element::{ElementEvent, ElementRef};

/// Builds a behavior from caller option overrides
pub type BehaviorFactory = Rc<dyn Fn(&Options) -> Result<BehaviorHandle>>;

/// Factory table keyed by [`BehaviorKind`].
///
/// Cloning yields another handle to the same table, so element factories
/// can hold the registry they apply behaviors from.
#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    factories: Rc<RefCell<IndexMap<BehaviorKind, BehaviorFactory>>>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `kind`.
    ///
    /// Returns false, registering nothing, for an empty custom kind name.
    pub fn register_behavior<F>(&self, kind: BehaviorKind, factory: F) -> bool
    where
        F: Fn(&Options) -> Result<BehaviorHandle> + 'static,
    {
        if !kind.is_valid() {
            tracing::warn!("refusing to register a behavior with an empty kind name");
            return false;
        }
        tracing::debug!(%kind, "behavior registered");
        self.factories.borrow_mut().insert(kind, Rc::new(factory));
        true
    }

    pub fn has_behavior(&self, kind: &BehaviorKind) -> bool {
        self.factories.borrow().contains_key(kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> Vec<BehaviorKind> {
        self.factories.borrow().keys().cloned().collect()
    }

    /// Instantiate a detached behavior; `Ok(None)` for an unknown kind
    pub fn create_behavior(
        &self,
        kind: &BehaviorKind,
        options: &Options,
    ) -> Result<Option<BehaviorHandle>> {
        let factory = self.factories.borrow().get(kind).cloned();
        match factory {
            Some(factory) => factory(options).map(Some),
            None => {
                tracing::warn!(%kind, "no behavior registered under this kind");
                Ok(None)
            }
        }
    }

    /// Ensure `element` carries a behavior of `kind`.
    ///
    /// An existing instance is returned unchanged and `options` are ignored.
    pub fn apply_behavior(
        &self,
        element: &ElementRef,
        kind: &BehaviorKind,
        options: &Options,
    ) -> Result<Option<BehaviorHandle>> {
        if let Some(existing) = element.behavior(kind) {
            return Ok(Some(existing));
        }

        let Some(behavior) = self.create_behavior(kind, options)? else {
            return Ok(None);
        };
        element.add_behavior(&behavior);
        element
            .events()
            .emit(&ElementEvent::BehaviorApplied { kind: kind.clone() });
        Ok(Some(behavior))
    }

    /// Apply every spec in order, returning the behaviors that were found or created
    pub fn apply_behaviors(
        &self,
        element: &ElementRef,
        specs: &[BehaviorSpec],
    ) -> Result<Vec<BehaviorHandle>> {
        let mut applied = Vec::with_capacity(specs.len());
        for spec in specs {
            if let Some(behavior) = self.apply_behavior(element, &spec.kind, &spec.options)? {
                applied.push(behavior);
            }
        }
        Ok(applied)
    }

    /// Detach and drop the behavior of `kind`; returns false if there was none
    pub fn remove_behavior(&self, element: &ElementRef, kind: &BehaviorKind) -> bool {
        element.remove_behavior(kind)
    }
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::{Behavior, BehaviorContext, BehaviorLogic};
    use crate::element::{Element, ElementConfig, ElementEventKind};
    use crate::model::PlainModel;
    use crate::scene::memory_scene;
    use std::any::Any;
    use std::cell::Cell;

    struct Inert;

    impl BehaviorLogic for Inert {
        fn initialize(&mut self, _ctx: &BehaviorContext<'_>) {}
        fn cleanup(&mut self) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn marker() -> BehaviorKind {
        BehaviorKind::Custom("marker".into())
    }

    fn registry() -> BehaviorRegistry {
        let registry = BehaviorRegistry::new();
        registry.register_behavior(marker(), |options| {
            Ok(Behavior::new(marker(), options.clone(), Inert))
        });
        registry
    }

    fn element() -> ElementRef {
        Element::new(
            ElementConfig::new("e1", "fixture"),
            memory_scene(),
            Rc::new(PlainModel),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_kind_is_rejected() {
        let registry = BehaviorRegistry::new();
        let accepted = registry.register_behavior(BehaviorKind::Custom(" ".into()), |options| {
            Ok(Behavior::new(marker(), options.clone(), Inert))
        });
        assert!(!accepted);
        assert!(registry.kinds().is_empty());
    }

    #[test]
    fn test_unknown_kind_creates_nothing() {
        let registry = registry();
        let created = registry
            .create_behavior(&BehaviorKind::Draggable, &Options::new())
            .unwrap();
        assert!(created.is_none());
    }

    #[test]
    fn test_apply_behavior_is_idempotent() {
        let registry = registry();
        let element = element();
        let applied = Rc::new(Cell::new(0));
        let a = Rc::clone(&applied);
        element
            .events()
            .on(ElementEventKind::BehaviorApplied, move |_| a.set(a.get() + 1));

        let first = registry
            .apply_behavior(&element, &marker(), &Options::new())
            .unwrap()
            .unwrap();
        let second = registry
            .apply_behavior(&element, &marker(), &Options::new())
            .unwrap()
            .unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(applied.get(), 1);
    }

    #[test]
    fn test_apply_and_remove() {
        let registry = registry();
        let element = element();
        let specs = vec![BehaviorSpec::new(marker()), BehaviorSpec::new(BehaviorKind::Lockable)];
        let applied = registry.apply_behaviors(&element, &specs).unwrap();
        assert_eq!(applied.len(), 1);

        assert!(registry.remove_behavior(&element, &marker()));
        assert!(!registry.remove_behavior(&element, &marker()));
        assert!(!applied[0].is_attached());
    }
}
