//! Editor configuration for LightPlot
//!
//! Configuration is organized into logical sections:
//! - Grid and snapping
//! - Rotation handle geometry and angle snapping
//! - Resize limits
//! - Selection, lock, and drop-placement styling
//! - The behavior set attached to each element type
//!
//! Files are JSON or TOML, chosen by extension, stored under the platform
//! configuration directory.

use lightplot_core::{BehaviorKind, BehaviorSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult, SettingsResult};

/// Style attribute overrides, `attribute -> value`.
pub type StyleMap = BTreeMap<String, String>;

fn style(pairs: &[(&str, &str)]) -> StyleMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Grid pitch in scene units
    pub size: f64,
    /// Snap dragged and dropped elements to the grid
    pub snap: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            size: 10.0,
            snap: false,
        }
    }
}

/// Rotation handle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Distance from the element center to the grip
    pub handle_distance: f64,
    /// Snap increment in degrees; 0 disables snapping
    pub snap_angle: f64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            handle_distance: 30.0,
            snap_angle: 0.0,
        }
    }
}

/// Resize limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeSettings {
    pub min_width: f64,
    pub min_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    pub preserve_aspect_ratio: bool,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            min_width: 10.0,
            min_height: 10.0,
            max_width: None,
            max_height: None,
            preserve_aspect_ratio: false,
        }
    }
}

/// How a modified press changes the multi-selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Every press replaces the selection
    Replace,
    /// A modified press toggles membership
    #[default]
    Toggle,
    /// A modified press adds to the selection
    Add,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Toggle => write!(f, "toggle"),
            Self::Add => write!(f, "add"),
        }
    }
}

/// Selection feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    pub policy: SelectionPolicy,
    pub class_name: String,
    pub style: StyleMap,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::Toggle,
            class_name: "selected".to_string(),
            style: style(&[("stroke", "#ff9900"), ("stroke-width", "2")]),
        }
    }
}

/// Lock feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub class_name: String,
    pub style: StyleMap,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            class_name: "locked".to_string(),
            style: style(&[("stroke", "#999999"), ("stroke-dasharray", "4 2")]),
        }
    }
}

/// Placement-from-library feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropSettings {
    pub class_name: String,
    pub style: StyleMap,
    /// Keep the element centered under the pointer while placing
    pub center_on_pointer: bool,
}

impl Default for DropSettings {
    fn default() -> Self {
        Self {
            class_name: "dropping".to_string(),
            style: style(&[("opacity", "0.6")]),
            center_on_pointer: true,
        }
    }
}

/// Per element type settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementTypeSettings {
    /// Behaviors applied when an element of this type is created
    pub behaviors: Vec<BehaviorSpec>,
}

impl ElementTypeSettings {
    pub fn new(kinds: &[BehaviorKind]) -> Self {
        Self {
            behaviors: kinds.iter().cloned().map(BehaviorSpec::new).collect(),
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub grid: GridSettings,
    pub rotation: RotationSettings,
    pub resize: ResizeSettings,
    pub selection: SelectionSettings,
    pub lock: LockSettings,
    pub drop: DropSettings,
    pub element_types: BTreeMap<String, ElementTypeSettings>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        use BehaviorKind::*;

        let mut element_types = BTreeMap::new();
        element_types.insert(
            "fixture".to_string(),
            ElementTypeSettings::new(&[Selectable, Draggable, Lockable, Rotatable, Resizable]),
        );
        element_types.insert(
            "pipe".to_string(),
            ElementTypeSettings::new(&[Selectable, Draggable, Lockable, Rotatable]),
        );

        Self {
            grid: GridSettings::default(),
            rotation: RotationSettings::default(),
            resize: ResizeSettings::default(),
            selection: SelectionSettings::default(),
            lock: LockSettings::default(),
            drop: DropSettings::default(),
            element_types,
        }
    }
}

impl EditorConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into())
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into())
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Platform configuration directory for LightPlot
    pub fn config_dir() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("lightplot"))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Default location of the configuration file
    pub fn default_path() -> ConfigResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from `path` (or the default location); fall back to defaults
    /// when the file is absent or unreadable.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("No configuration directory: {}", e);
                    return Self::default();
                }
            },
        };

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Validate config values
    pub fn validate(&self) -> ConfigResult<()> {
        fn out_of_range(key: &str, value: impl ToString) -> ConfigError {
            ConfigError::ValueOutOfRange {
                key: key.to_string(),
                value: value.to_string(),
            }
        }

        if !(self.grid.size > 0.0 && self.grid.size.is_finite()) {
            return Err(out_of_range("grid.size", self.grid.size));
        }
        if self.rotation.snap_angle < 0.0 || self.rotation.snap_angle >= 360.0 {
            return Err(out_of_range("rotation.snap_angle", self.rotation.snap_angle));
        }
        if self.rotation.handle_distance < 0.0 {
            return Err(out_of_range(
                "rotation.handle_distance",
                self.rotation.handle_distance,
            ));
        }
        if self.resize.min_width < 0.0 {
            return Err(out_of_range("resize.min_width", self.resize.min_width));
        }
        if self.resize.min_height < 0.0 {
            return Err(out_of_range("resize.min_height", self.resize.min_height));
        }
        if let Some(max) = self.resize.max_width {
            if max < self.resize.min_width {
                return Err(out_of_range("resize.max_width", max));
            }
        }
        if let Some(max) = self.resize.max_height {
            if max < self.resize.min_height {
                return Err(out_of_range("resize.max_height", max));
            }
        }

        for (name, settings) in &self.element_types {
            if let Some(spec) = settings.behaviors.iter().find(|s| !s.kind.is_valid()) {
                return Err(ConfigError::InvalidBehavior {
                    element_type: name.clone(),
                    reason: format!("behavior name '{}' is empty", spec.kind),
                });
            }
        }

        Ok(())
    }

    /// Behavior specs for an element type with the section settings folded in.
    ///
    /// Options written on an individual spec win over the section values.
    pub fn behaviors_for(&self, element_type: &str) -> Vec<BehaviorSpec> {
        let Some(settings) = self.element_types.get(element_type) else {
            return Vec::new();
        };

        settings
            .behaviors
            .iter()
            .cloned()
            .map(|spec| self.with_section_defaults(spec))
            .collect()
    }

    /// Fold the section settings relevant to `spec.kind` into its options
    pub fn with_section_defaults(&self, spec: BehaviorSpec) -> BehaviorSpec {
        match spec.kind {
            BehaviorKind::Selectable => spec
                .with_default_option("className", self.selection.class_name.clone())
                .with_default_option("style", style_value(&self.selection.style)),
            BehaviorKind::Draggable => spec
                .with_default_option("snapToGrid", self.grid.snap)
                .with_default_option("gridSize", self.grid.size),
            BehaviorKind::Lockable => spec
                .with_default_option("className", self.lock.class_name.clone())
                .with_default_option("style", style_value(&self.lock.style)),
            BehaviorKind::Rotatable => spec
                .with_default_option("handleDistance", self.rotation.handle_distance)
                .with_default_option("snapAngle", self.rotation.snap_angle),
            BehaviorKind::Resizable => {
                let mut spec = spec
                    .with_default_option("minWidth", self.resize.min_width)
                    .with_default_option("minHeight", self.resize.min_height)
                    .with_default_option(
                        "preserveAspectRatio",
                        self.resize.preserve_aspect_ratio,
                    );
                if let Some(max) = self.resize.max_width {
                    spec = spec.with_default_option("maxWidth", max);
                }
                if let Some(max) = self.resize.max_height {
                    spec = spec.with_default_option("maxHeight", max);
                }
                spec
            }
            BehaviorKind::Droppable => spec
                .with_default_option("snapToGrid", self.grid.snap)
                .with_default_option("gridSize", self.grid.size)
                .with_default_option("className", self.drop.class_name.clone())
                .with_default_option("style", style_value(&self.drop.style))
                .with_default_option("centerOnPointer", self.drop.center_on_pointer),
            BehaviorKind::Custom(_) => spec,
        }
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

fn style_value(style: &StyleMap) -> serde_json::Value {
    serde_json::Value::Object(
        style
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
}
