//! Editor application context.
//!
//! Owns the scene handle, viewport, input hub, selection set and both
//! registries for one plot. Several editors can coexist; nothing here is
//! global.

use std::collections::HashSet;
use std::rc::Rc;

use lightplot_core::{
    shared, BehaviorKind, BehaviorSpec, ElementError, Point, Result, Shared, Subscription,
};
use lightplot_settings::EditorConfig;

use crate::behavior::{BehaviorEventKind, BehaviorRegistry};
use crate::element::{ElementInit, ElementRef, ElementRegistry, LockState, Properties, WeakElementRegistry};
use crate::input::{InputHub, Key};
use crate::model::{register_fixture, register_pipe, FIXTURE_TYPE, PIPE_TYPE};
use crate::scene::SceneHandle;
use crate::selection_manager::SelectionManager;
use crate::serialization::{PlotDocument, PlotMetadata};
use crate::viewport::Viewport;

pub struct Editor {
    config: EditorConfig,
    scene: SceneHandle,
    viewport: Shared<Viewport>,
    input: InputHub,
    selection: SelectionManager,
    behaviors: BehaviorRegistry,
    elements: ElementRegistry,
    _keyboard: Subscription,
}

impl Editor {
    /// Build an editor drawing on `scene`, with the built-in behaviors and
    /// the `fixture` and `pipe` element types registered.
    pub fn new(config: EditorConfig, scene: SceneHandle) -> Self {
        let viewport = shared(Viewport::default());
        let input = InputHub::new(Rc::clone(&scene), Rc::clone(&viewport));
        let selection = SelectionManager::new(config.selection.policy);
        let behaviors = BehaviorRegistry::with_defaults(&input, &selection);
        let elements = ElementRegistry::new();

        register_fixture(
            &elements,
            Rc::clone(&scene),
            behaviors.clone(),
            config.behaviors_for(FIXTURE_TYPE),
        );
        register_pipe(
            &elements,
            Rc::clone(&scene),
            behaviors.clone(),
            config.behaviors_for(PIPE_TYPE),
        );

        let keyboard = {
            let registry = elements.downgrade();
            input.on_key(move |event| {
                if matches!(event.key, Key::Delete | Key::Backspace) {
                    delete_selected(&registry);
                }
            })
        };

        tracing::info!(
            policy = %config.selection.policy,
            types = ?elements.types(),
            "editor ready"
        );

        Self {
            config,
            scene,
            viewport,
            input,
            selection,
            behaviors,
            elements,
            _keyboard: keyboard,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn viewport(&self) -> &Shared<Viewport> {
        &self.viewport
    }

    pub fn input(&self) -> &InputHub {
        &self.input
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    pub fn elements(&self) -> &ElementRegistry {
        &self.elements
    }

    /// Start placing a new element of `element_type` under the pointer.
    ///
    /// The element follows the pointer until the next release. Escape
    /// removes it again. `Ok(None)` for an unknown type.
    pub fn place(
        &self,
        element_type: &str,
        properties: Properties,
        pointer: Point,
    ) -> Result<Option<ElementRef>> {
        let local = self.viewport.borrow().client_to_local(pointer);
        let init = ElementInit::new().with_properties(properties).at(local);
        let Some(element) = self.elements.create_element(element_type, init)? else {
            return Ok(None);
        };

        let spec = self
            .config
            .with_section_defaults(BehaviorSpec::new(BehaviorKind::Droppable));
        let Some(droppable) = self
            .behaviors
            .apply_behavior(&element, &spec.kind, &spec.options)?
        else {
            return Ok(Some(element));
        };

        let placed = Rc::downgrade(&element);
        droppable.events().on(BehaviorEventKind::DropComplete, move |_| {
            if let Some(element) = placed.upgrade() {
                tracing::info!(id = element.id(), "element placed");
                element.remove_behavior(&BehaviorKind::Droppable);
            }
        });
        let placed = Rc::downgrade(&element);
        droppable.events().on(BehaviorEventKind::DropCancel, move |_| {
            if let Some(element) = placed.upgrade() {
                tracing::info!(id = element.id(), "placement cancelled");
                element.remove();
            }
        });

        Ok(Some(element))
    }

    /// Remove the selected elements that are not locked; returns how many went
    pub fn delete_selected(&self) -> usize {
        delete_selected(&self.elements.downgrade())
    }

    /// Snapshot every element into a plot document
    pub fn document(&self, metadata: PlotMetadata) -> PlotDocument {
        PlotDocument::from_elements(metadata, &self.elements.get_all())
    }

    /// Replace the plot with the contents of `document`.
    ///
    /// A document that repeats an id is rejected before anything is
    /// cleared. Snapshots that cannot be rebuilt, including those of an
    /// unknown type, are skipped with a warning. Returns how many elements
    /// were rebuilt.
    pub fn load_document(&self, document: &PlotDocument) -> Result<usize> {
        let mut ids = HashSet::with_capacity(document.elements.len());
        for snapshot in &document.elements {
            if !ids.insert(snapshot.id.as_str()) {
                return Err(ElementError::DuplicateId {
                    id: snapshot.id.clone(),
                }
                .into());
            }
        }

        self.selection.clear();
        self.elements.clear(true);

        let mut loaded = 0;
        for snapshot in &document.elements {
            match self.elements.load_element(snapshot) {
                Ok(Some(_)) => loaded += 1,
                Ok(None) => tracing::warn!(
                    id = %snapshot.id,
                    element_type = %snapshot.element_type,
                    "skipping element of unknown type"
                ),
                Err(err) => tracing::warn!(
                    id = %snapshot.id,
                    error = %err,
                    "skipping element that could not be rebuilt"
                ),
            }
        }
        tracing::info!(title = %document.metadata.title, loaded, "plot loaded");
        Ok(loaded)
    }
}

fn delete_selected(registry: &WeakElementRegistry) -> usize {
    let Some(registry) = registry.upgrade() else {
        return 0;
    };
    let doomed: Vec<ElementRef> = registry
        .get_selected()
        .into_iter()
        .filter(|element| !element.is_locked())
        .collect();
    for element in &doomed {
        element.remove();
    }
    if !doomed.is_empty() {
        tracing::debug!(count = doomed.len(), "deleted selected elements");
    }
    doomed.len()
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("elements", &self.elements.len())
            .field("selected", &self.selection.len())
            .field("behaviors", &self.behaviors)
            .field("input", &self.input)
            .finish()
    }
}
