//! # LightPlot
//!
//! A lighting plot editor core: fixtures and pipes placed on a stage plot,
//! made interactive by composable behaviors.
//!
//! ## Architecture
//!
//! LightPlot is organized as a workspace with multiple crates:
//!
//! 1. **lightplot-core** - Event channel, subscriptions, geometry, behavior kinds, errors
//! 2. **lightplot-settings** - Editor configuration (grid, handles, styling, behavior sets)
//! 3. **lightplot-designer** - Scene, input, elements, behaviors, plot documents, editor
//! 4. **lightplot** - Logging setup and the headless `lightplot` binary
//!
//! ## Features
//!
//! - **Composable Behaviors**: Selectable, Draggable, Lockable, Rotatable, Resizable, Droppable
//! - **Element Models**: Fixtures with channel labels, pipes
//! - **Plot Documents**: JSON save/load with show and venue metadata
//! - **Headless Scene**: In-memory scene graph with hit testing

pub use lightplot_core::{
    BehaviorError, BehaviorKind, BehaviorSpec, ElementError, Error, Event, EventChannel, Point,
    Rect, Result, Subscription,
};

pub use lightplot_designer::{
    memory_scene, Behavior, BehaviorEvent, BehaviorRegistry, Editor, Element, ElementEvent,
    ElementRef, ElementRegistry, ElementSnapshot, InputHub, Key, LockState, MemoryScene,
    Modifiers, PlotDocument, PlotMetadata, SceneSurface, SelectState, SelectionManager, Viewport,
    FIXTURE_TYPE, PIPE_TYPE,
};

pub use lightplot_settings::{ConfigError, EditorConfig, SelectionPolicy, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
