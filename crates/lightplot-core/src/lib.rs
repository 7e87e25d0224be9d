//! # LightPlot Core
//!
//! Core types, traits, and utilities shared by the LightPlot crates.
//! Provides the event channel primitive every element and behavior
//! publishes through, the behavior kind/spec vocabulary, geometry
//! primitives, and the error taxonomy.

pub mod behavior_spec;
pub mod error;
pub mod event_channel;
pub mod geometry;
pub mod types;

pub use behavior_spec::{merge_options, BehaviorKind, BehaviorSpec, Options};

pub use error::{BehaviorError, ElementError, Error, Result};

pub use event_channel::{Event, EventChannel, ListenerId, Subscription};

pub use geometry::{normalize_degrees, snap_to_step, Point, Rect};

pub use types::{shared, Shared, WeakShared};
