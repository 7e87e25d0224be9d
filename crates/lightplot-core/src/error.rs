//! Error handling for LightPlot
//!
//! Provides error types for the element/behavior object model:
//! - Element errors (construction and registry bookkeeping)
//! - Behavior errors (kind names and option parsing)
//!
//! Missing-collaborator conditions (a visual node that vanished, a behavior
//! without an element) are not errors here; they are logged and skipped by
//! the code that encounters them.

use thiserror::Error;

/// Element error type
///
/// Raised when an element cannot be constructed or indexed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    /// A required constructor field was empty
    #[error("Element is missing required field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Another element is already registered under this id
    #[error("Element id '{id}' is already registered")]
    DuplicateId {
        /// The conflicting id.
        id: String,
    },

    /// The supplied visual node already belongs to another element
    #[error("Visual node {node} is already owned by element '{owner}'")]
    NodeInUse {
        /// Raw id of the visual node.
        node: u64,
        /// Id of the element that owns it.
        owner: String,
    },

    /// The supplied visual node does not exist in the scene
    #[error("Visual node {node} does not exist in the scene")]
    MissingNode {
        /// Raw id of the visual node.
        node: u64,
    },
}

/// Behavior error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BehaviorError {
    /// An empty string was used as a behavior kind name
    #[error("Behavior kind name must not be empty")]
    EmptyKind,

    /// Caller overrides could not be merged into the behavior's options
    #[error("Invalid options for behavior '{kind}': {reason}")]
    InvalidOptions {
        /// The behavior kind the options were meant for.
        kind: String,
        /// Why the merged options were rejected.
        reason: String,
    },
}

/// Main error type for LightPlot
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Element error
    #[error(transparent)]
    Element(#[from] ElementError),

    /// Behavior error
    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this error stems from bad construction input (fail-fast class)
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::Element(
                ElementError::MissingField { .. }
                    | ElementError::DuplicateId { .. }
                    | ElementError::NodeInUse { .. }
            ) | Error::Behavior(_)
        )
    }

    /// Check if this is an element error
    pub fn is_element_error(&self) -> bool {
        matches!(self, Error::Element(_))
    }

    /// Check if this is a behavior error
    pub fn is_behavior_error(&self) -> bool {
        matches!(self, Error::Behavior(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
