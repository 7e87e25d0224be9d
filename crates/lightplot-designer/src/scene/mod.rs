//! Rendering surface abstraction.
//!
//! Elements and behaviors never draw directly; they create and mutate nodes
//! on a [`SceneSurface`]. A desktop or web front end supplies its own
//! implementation; [`MemoryScene`] is the headless one used by tests and the
//! command line tool.

mod memory;

pub use memory::{MemoryScene, POINTER_EVENTS};

use lightplot_core::{Point, Rect, Shared};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a node on the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry of a node, in the node's local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    /// A container; its extent is the union of its children.
    Group,
    /// Rectangle from the local origin to `(width, height)`.
    Rect { width: f64, height: f64 },
    /// Ellipse centered on the local origin.
    Ellipse { rx: f64, ry: f64 },
    /// Line segment between two local points.
    Line { from: Point, to: Point },
    /// Text anchored at the local origin.
    Text { content: String, size: f64 },
}

/// A retained-mode vector scene graph.
///
/// Translations, rotations and bounding boxes are expressed in the
/// coordinate space of the node's parent; root nodes live in scene space.
/// Mutators return `false` when the node does not exist.
pub trait SceneSurface {
    /// Create a node under `parent` (or at the root) and return its id
    fn create_node(&mut self, parent: Option<NodeId>, shape: NodeShape) -> NodeId;

    /// Remove a node and all of its descendants
    fn remove_node(&mut self, node: NodeId) -> bool;

    fn contains(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn shape(&self, node: NodeId) -> Option<NodeShape>;

    fn set_shape(&mut self, node: NodeId, shape: NodeShape) -> bool;

    fn translation(&self, node: NodeId) -> Option<Point>;

    fn set_translation(&mut self, node: NodeId, position: Point) -> bool;

    /// Rotation in degrees, clockwise in the y-down scene
    fn rotation(&self, node: NodeId) -> Option<f64>;

    /// Rotate around `pivot`, given in the node's local coordinates
    fn set_rotation(&mut self, node: NodeId, degrees: f64, pivot: Point) -> bool;

    /// Axis-aligned bounds, ignoring rotation
    fn bounding_box(&self, node: NodeId) -> Option<Rect>;

    /// Scale the node's geometry and reposition it so its bounds equal `bounds`
    fn set_bounds(&mut self, node: NodeId, bounds: Rect) -> bool;

    /// Effective style: the newest layer that sets `key`, else the node's own value
    fn style(&self, node: NodeId, key: &str) -> Option<String>;

    /// Set the node's own style attribute; `None` removes it
    fn set_style(&mut self, node: NodeId, key: &str, value: Option<&str>) -> bool;

    /// Stack a named style layer over the node's own styles.
    ///
    /// Pushing a layer name that is already present replaces it in place.
    fn push_style_layer(&mut self, node: NodeId, layer: &str, styles: &BTreeMap<String, String>)
        -> bool;

    /// Drop a named style layer; the attributes it set fall back to lower layers
    fn remove_style_layer(&mut self, node: NodeId, layer: &str) -> bool;

    /// Claim `node` for `owner`.
    ///
    /// Re-claiming by the same owner succeeds; otherwise the error carries
    /// the owner that already holds the node (empty when the node does not
    /// exist). Removing the node releases it.
    fn claim_node(&mut self, node: NodeId, owner: &str) -> Result<(), String>;

    /// Current owner of `node`, if claimed
    fn node_owner(&self, node: NodeId) -> Option<String>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str) -> bool;

    fn remove_class(&mut self, node: NodeId, class: &str) -> bool;

    /// Topmost node whose geometry contains `point` (scene space).
    ///
    /// Nodes styled `pointer-events: none` are skipped along with their children.
    fn hit_test(&self, point: Point) -> Option<NodeId>;

    fn node_count(&self) -> usize;
}

/// Shared handle to the scene every element of an editor draws on.
pub type SceneHandle = Shared<dyn SceneSurface>;

/// Create a [`SceneHandle`] backed by a fresh [`MemoryScene`].
pub fn memory_scene() -> SceneHandle {
    lightplot_core::shared(MemoryScene::new())
}
