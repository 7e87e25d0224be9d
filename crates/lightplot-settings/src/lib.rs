//! LightPlot Settings Crate
//!
//! Handles editor configuration: grid and snapping, handle geometry,
//! selection/lock/drop styling, and the behavior set attached to each
//! element type.

pub mod config;
pub mod error;

pub use config::{
    DropSettings, EditorConfig, ElementTypeSettings, GridSettings, LockSettings,
    ResizeSettings, RotationSettings, SelectionPolicy, SelectionSettings, StyleMap,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
