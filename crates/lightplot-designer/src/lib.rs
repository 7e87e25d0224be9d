//! # LightPlot Designer
//!
//! The interactive core of the lighting plot editor: placed elements,
//! the behaviors that make them interactive, and plot persistence.
//!
//! ## Core Components
//!
//! ### Object Model
//! - **Elements**: placed domain entities (fixtures, pipes) bound to one
//!   visual node, with properties, selection and lock state
//! - **Behaviors**: attachable interaction units with an
//!   attach/initialize/cleanup/detach lifecycle
//! - **Registries**: per-editor factories and instance indexes for both
//!
//! ### Interaction
//! - **Selectable**, **Draggable**, **Lockable**, **Rotatable**,
//!   **Resizable** and **Droppable** behaviors driven by pointer input
//! - **Input hub**: hit-tested node listeners plus global listeners
//! - **Viewport**: client to scene-local coordinate conversion
//!
//! ## Architecture
//!
//! ```text
//! Editor
//!   ├── InputHub ── Viewport
//!   ├── SelectionManager
//!   ├── BehaviorRegistry ── Selectable, Draggable, ...
//!   └── ElementRegistry ── Element ── visual node on the SceneSurface
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lightplot_designer::{memory_scene, Editor};
//! use lightplot_core::Point;
//! use lightplot_settings::EditorConfig;
//!
//! let editor = Editor::new(EditorConfig::default(), memory_scene());
//! let fixture = editor.place("fixture", Default::default(), Point::new(120.0, 80.0))?;
//! editor.input().pointer_up(Point::new(160.0, 80.0));
//! ```

pub mod behavior;
pub mod behaviors;
pub mod editor;
pub mod element;
pub mod input;
pub mod model;
pub mod scene;
pub mod selection_manager;
pub mod serialization;
pub mod viewport;

pub use behavior::{
    Behavior, BehaviorContext, BehaviorEvent, BehaviorEventKind, BehaviorFactory, BehaviorHandle,
    BehaviorLogic, BehaviorRegistry,
};
pub use behaviors::{
    compute_angle, compute_resize, register_defaults, snap_angle, DraggableLogic,
    DraggableOptions, DroppableLogic, DroppableOptions, LockableLogic, LockableOptions,
    ResizableLogic, ResizableOptions, ResizeHandle, ResizeLimits, RotatableLogic,
    RotatableOptions, SelectableLogic, SelectableOptions,
};
pub use editor::Editor;
pub use element::{
    Element, ElementConfig, ElementEvent, ElementEventKind, ElementFactory, ElementInit,
    ElementRef, ElementRegistry, ElementSnapshot, LockState, Properties, SelectState,
    WeakElementRegistry,
};
pub use input::{
    InputEvent, InputHub, InputKind, Key, KeyEvent, Modifiers, PointerButton, PointerEvent,
    PointerPhase, WeakInputHub,
};
pub use model::{
    register_fixture, register_model, register_pipe, ElementModel, FixtureModel, PipeModel, PlainModel,
    FIXTURE_TYPE, PIPE_TYPE,
};
pub use scene::{
    memory_scene, MemoryScene, NodeId, NodeShape, SceneHandle, SceneSurface, POINTER_EVENTS,
};
pub use selection_manager::SelectionManager;
pub use serialization::{PlotDocument, PlotMetadata, PLOT_FORMAT_VERSION};
pub use viewport::Viewport;
