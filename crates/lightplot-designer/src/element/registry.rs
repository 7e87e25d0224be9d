//! Element type factories and the index of live elements.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use lightplot_core::{ElementError, Point, Result};
use uuid::Uuid;

use super::{
    ElementConfig, ElementEventKind, ElementRef, ElementSnapshot, LockState, Properties,
    SelectState,
};
use crate::scene::NodeId;

/// Builds an element of one type from a complete config
pub type ElementFactory = Rc<dyn Fn(ElementConfig) -> Result<ElementRef>>;

/// Caller input for [`ElementRegistry::create_element`]
#[derive(Debug, Clone, Default)]
pub struct ElementInit {
    /// Generated when absent
    pub id: Option<String>,
    pub properties: Properties,
    pub visual_node: Option<NodeId>,
    pub position: Option<Point>,
}

impl ElementInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Default)]
struct RegistryInner {
    factories: RefCell<IndexMap<String, ElementFactory>>,
    instances: RefCell<IndexMap<String, ElementRef>>,
}

/// Element factories plus the id index of created elements.
///
/// Elements leave the index when they are removed.
#[derive(Clone, Default)]
pub struct ElementRegistry {
    inner: Rc<RegistryInner>,
}

/// Non-owning handle to an [`ElementRegistry`]
#[derive(Clone)]
pub struct WeakElementRegistry {
    inner: Weak<RegistryInner>,
}

impl WeakElementRegistry {
    pub fn upgrade(&self) -> Option<ElementRegistry> {
        self.inner.upgrade().map(|inner| ElementRegistry { inner })
    }
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakElementRegistry {
        WeakElementRegistry {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register (or replace) the factory for `element_type`.
    ///
    /// Returns false, registering nothing, for an empty type name.
    pub fn register_type<F>(&self, element_type: &str, factory: F) -> bool
    where
        F: Fn(ElementConfig) -> Result<ElementRef> + 'static,
    {
        let name = element_type.trim();
        if name.is_empty() {
            tracing::warn!("refusing to register an element type with an empty name");
            return false;
        }
        tracing::debug!(element_type = name, "element type registered");
        self.inner
            .factories
            .borrow_mut()
            .insert(name.to_string(), Rc::new(factory));
        true
    }

    pub fn has_type(&self, element_type: &str) -> bool {
        self.inner.factories.borrow().contains_key(element_type)
    }

    pub fn types(&self) -> Vec<String> {
        self.inner.factories.borrow().keys().cloned().collect()
    }

    /// Create and index an element; `Ok(None)` for an unknown type.
    pub fn create_element(
        &self,
        element_type: &str,
        init: ElementInit,
    ) -> Result<Option<ElementRef>> {
        let factory = self.inner.factories.borrow().get(element_type).cloned();
        let Some(factory) = factory else {
            tracing::warn!(element_type, "no element type registered under this name");
            return Ok(None);
        };

        let id = init
            .id
            .unwrap_or_else(|| format!("{}-{}", element_type, Uuid::new_v4().simple()));
        if self.has(&id) {
            return Err(ElementError::DuplicateId { id }.into());
        }

        let element = factory(ElementConfig {
            id: id.clone(),
            element_type: element_type.to_string(),
            properties: init.properties,
            visual_node: init.visual_node,
            position: init.position,
        })?;

        let weak = Rc::downgrade(&self.inner);
        let indexed_id = id.clone();
        element.events().on(ElementEventKind::Removed, move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.instances.borrow_mut().shift_remove(&indexed_id);
            }
        });
        self.inner
            .instances
            .borrow_mut()
            .insert(id, Rc::clone(&element));
        Ok(Some(element))
    }

    /// Rebuild an element from a snapshot.
    ///
    /// Position, rotation and lock state are applied after construction,
    /// lock last so it does not block the geometry updates.
    pub fn load_element(&self, snapshot: &ElementSnapshot) -> Result<Option<ElementRef>> {
        let init = ElementInit::new()
            .with_id(snapshot.id.clone())
            .with_properties(snapshot.properties.clone());
        let Some(element) = self.create_element(&snapshot.element_type, init)? else {
            return Ok(None);
        };

        element.restore(&snapshot.extra);
        element.move_to(snapshot.x, snapshot.y);
        if snapshot.rotation != 0.0 {
            element.rotate_to(snapshot.rotation);
        }
        element.lock(snapshot.locked);
        Ok(Some(element))
    }

    pub fn get(&self, id: &str) -> Option<ElementRef> {
        self.inner.instances.borrow().get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        self.inner.instances.borrow().contains_key(id)
    }

    /// All live elements in creation order
    pub fn get_all(&self) -> Vec<ElementRef> {
        self.inner.instances.borrow().values().cloned().collect()
    }

    pub fn get_by_type(&self, element_type: &str) -> Vec<ElementRef> {
        self.inner
            .instances
            .borrow()
            .values()
            .filter(|element| element.element_type() == element_type)
            .cloned()
            .collect()
    }

    pub fn get_selected(&self) -> Vec<ElementRef> {
        self.inner
            .instances
            .borrow()
            .values()
            .filter(|element| element.is_selected())
            .cloned()
            .collect()
    }

    pub fn get_locked(&self) -> Vec<ElementRef> {
        self.inner
            .instances
            .borrow()
            .values()
            .filter(|element| element.is_locked())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove one element from the scene and the index
    pub fn remove(&self, id: &str) -> bool {
        match self.get(id) {
            Some(element) => element.remove(),
            None => false,
        }
    }

    /// Drop every indexed element, removing each from the scene first if asked
    pub fn clear(&self, remove_from_scene: bool) {
        if remove_from_scene {
            for element in self.get_all() {
                element.remove();
            }
        }
        self.inner.instances.borrow_mut().clear();
    }
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("types", &self.types())
            .field("elements", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::model::PlainModel;
    use crate::scene::{memory_scene, SceneHandle};

    fn registry(scene: &SceneHandle) -> ElementRegistry {
        let registry = ElementRegistry::new();
        for element_type in ["fixture", "pipe"] {
            let scene = Rc::clone(scene);
            registry.register_type(element_type, move |config| {
                Element::new(config, Rc::clone(&scene), Rc::new(PlainModel))
            });
        }
        registry
    }

    #[test]
    fn test_empty_type_is_rejected() {
        let registry = ElementRegistry::new();
        let scene = memory_scene();
        assert!(!registry.register_type(" ", move |config| {
            Element::new(config, Rc::clone(&scene), Rc::new(PlainModel))
        }));
        assert!(registry.types().is_empty());
    }

    #[test]
    fn test_create_and_lookup() {
        let scene = memory_scene();
        let registry = registry(&scene);

        let a = registry
            .create_element("fixture", ElementInit::new().with_id("a"))
            .unwrap()
            .unwrap();
        registry
            .create_element("pipe", ElementInit::new().with_id("b"))
            .unwrap();
        let generated = registry
            .create_element("fixture", ElementInit::new())
            .unwrap()
            .unwrap();

        assert!(generated.id().starts_with("fixture-"));
        assert_eq!(registry.len(), 3);
        assert!(registry.has("a"));
        assert_eq!(registry.get_by_type("fixture").len(), 2);

        a.select(true);
        let selected = registry.get_selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id(), "a");
    }

    #[test]
    fn test_unknown_type_returns_none() {
        let scene = memory_scene();
        let registry = registry(&scene);
        assert!(registry
            .create_element("truss", ElementInit::new())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_duplicate_id_and_shared_node_are_rejected() {
        let scene = memory_scene();
        let registry = registry(&scene);
        let a = registry
            .create_element("fixture", ElementInit::new().with_id("a"))
            .unwrap()
            .unwrap();

        let err = registry
            .create_element("fixture", ElementInit::new().with_id("a"))
            .unwrap_err();
        assert!(matches!(
            err,
            lightplot_core::Error::Element(ElementError::DuplicateId { .. })
        ));

        let err = registry
            .create_element(
                "fixture",
                ElementInit {
                    visual_node: Some(a.visual_node()),
                    ..ElementInit::new().with_id("b")
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            lightplot_core::Error::Element(ElementError::NodeInUse { .. })
        ));
    }

    #[test]
    fn test_removed_elements_leave_the_index() {
        let scene = memory_scene();
        let registry = registry(&scene);
        let a = registry
            .create_element("fixture", ElementInit::new().with_id("a"))
            .unwrap()
            .unwrap();

        a.remove();
        assert!(!registry.has("a"));
        assert!(!registry.remove("a"));
    }

    #[test]
    fn test_clear_optionally_removes_from_scene() {
        let scene = memory_scene();
        let registry = registry(&scene);
        registry
            .create_element("fixture", ElementInit::new().with_id("a"))
            .unwrap();
        registry
            .create_element("fixture", ElementInit::new().with_id("b"))
            .unwrap();

        registry.clear(false);
        assert!(registry.is_empty());
        assert_eq!(scene.borrow().node_count(), 2);

        let c = registry
            .create_element("fixture", ElementInit::new().with_id("c"))
            .unwrap()
            .unwrap();
        registry.clear(true);
        assert!(c.is_removed());
        assert_eq!(scene.borrow().node_count(), 2);
    }

    #[test]
    fn test_load_element_applies_state_after_construction() {
        let scene = memory_scene();
        let registry = registry(&scene);
        let snapshot = ElementSnapshot {
            id: "a".into(),
            element_type: "fixture".into(),
            properties: Properties::new(),
            x: 40.0,
            y: 80.0,
            rotation: 45.0,
            locked: true,
            extra: serde_json::Map::new(),
        };

        let element = registry.load_element(&snapshot).unwrap().unwrap();
        assert_eq!(element.position(), Point::new(40.0, 80.0));
        assert_eq!(element.rotation(), 45.0);
        assert!(element.is_locked());
    }
}
