//! Behavior kinds and attachment specs.
//!
//! A [`BehaviorKind`] names a behavior type; a [`BehaviorSpec`] pairs a kind
//! with caller option overrides. Specs deserialize from either a bare kind
//! name or a `{ "type": ..., "options": {...} }` table, so element behavior
//! sets can live in configuration files.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::BehaviorError;

/// Option overrides supplied when a behavior is created.
pub type Options = serde_json::Map<String, Value>;

/// The kinds of behavior an element can carry.
///
/// The derived ordering is the order behaviors are detached in when an
/// element is removed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BehaviorKind {
    Selectable,
    Draggable,
    Lockable,
    Rotatable,
    Resizable,
    Droppable,
    /// A behavior registered by an embedding application.
    Custom(String),
}

impl BehaviorKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Selectable => "selectable",
            Self::Draggable => "draggable",
            Self::Lockable => "lockable",
            Self::Rotatable => "rotatable",
            Self::Resizable => "resizable",
            Self::Droppable => "droppable",
            Self::Custom(name) => name,
        }
    }

    /// Whether this is one of the built-in kinds
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// A custom kind with an empty name cannot be registered or applied
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Custom(name) => !name.trim().is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorKind {
    type Err = BehaviorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(BehaviorError::EmptyKind);
        }
        Ok(match name.to_ascii_lowercase().as_str() {
            "selectable" => Self::Selectable,
            "draggable" => Self::Draggable,
            "lockable" => Self::Lockable,
            "rotatable" => Self::Rotatable,
            "resizable" => Self::Resizable,
            "droppable" => Self::Droppable,
            _ => Self::Custom(name.to_string()),
        })
    }
}

impl TryFrom<String> for BehaviorKind {
    type Error = BehaviorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BehaviorKind> for String {
    fn from(kind: BehaviorKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A behavior kind plus option overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSpec", into = "RawSpec")]
pub struct BehaviorSpec {
    pub kind: BehaviorKind,
    pub options: Options,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawSpec {
    Name(BehaviorKind),
    Configured {
        #[serde(rename = "type")]
        kind: BehaviorKind,
        #[serde(default)]
        options: Options,
    },
}

impl From<RawSpec> for BehaviorSpec {
    fn from(raw: RawSpec) -> Self {
        match raw {
            RawSpec::Name(kind) => Self::new(kind),
            RawSpec::Configured { kind, options } => Self { kind, options },
        }
    }
}

impl From<BehaviorSpec> for RawSpec {
    fn from(spec: BehaviorSpec) -> Self {
        if spec.options.is_empty() {
            RawSpec::Name(spec.kind)
        } else {
            RawSpec::Configured {
                kind: spec.kind,
                options: spec.options,
            }
        }
    }
}

impl BehaviorSpec {
    pub fn new(kind: BehaviorKind) -> Self {
        Self {
            kind,
            options: Options::new(),
        }
    }

    /// Add one option override
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add an override only if the caller has not already set that key
    pub fn with_default_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.entry(key.into()).or_insert_with(|| value.into());
        self
    }
}

impl From<BehaviorKind> for BehaviorSpec {
    fn from(kind: BehaviorKind) -> Self {
        Self::new(kind)
    }
}

/// Merge caller overrides onto `T::default()` and parse the result.
///
/// Keys the option type does not know about are ignored.
pub fn merge_options<T>(kind: &BehaviorKind, overrides: &Options) -> Result<T, BehaviorError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let invalid = |reason: String| BehaviorError::InvalidOptions {
        kind: kind.to_string(),
        reason,
    };

    let mut base = serde_json::to_value(T::default()).map_err(|e| invalid(e.to_string()))?;
    if let Value::Object(map) = &mut base {
        for (key, value) in overrides {
            map.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(base).map_err(|e| invalid(e.to_string()))
}
