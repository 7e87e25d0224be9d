//! Headless retained-mode scene.

use lightplot_core::{Point, Rect};
use lyon::math::{point, vector, Angle, Transform};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{NodeId, NodeShape, SceneSurface};

/// Distance within which a line counts as hit.
const LINE_HIT_TOLERANCE: f64 = 3.0;

const EPSILON: f64 = 1e-9;

/// Style key that, set to `none`, takes a node and its subtree out of hit testing.
pub const POINTER_EVENTS: &str = "pointer-events";

#[derive(Debug, Clone)]
struct SceneNode {
    shape: NodeShape,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    translation: Point,
    rotation: f64,
    pivot: Point,
    styles: BTreeMap<String, String>,
    layers: Vec<(String, BTreeMap<String, String>)>,
    classes: BTreeSet<String>,
    owner: Option<String>,
}

impl SceneNode {
    fn new(shape: NodeShape, parent: Option<NodeId>) -> Self {
        Self {
            shape,
            parent,
            children: Vec::new(),
            translation: Point::default(),
            rotation: 0.0,
            pivot: Point::default(),
            styles: BTreeMap::new(),
            layers: Vec::new(),
            classes: BTreeSet::new(),
            owner: None,
        }
    }

    fn effective_style(&self, key: &str) -> Option<&String> {
        self.layers
            .iter()
            .rev()
            .find_map(|(_, styles)| styles.get(key))
            .or_else(|| self.styles.get(key))
    }

    /// Local → parent transform.
    fn transform(&self) -> Transform {
        let p = self.pivot;
        let t = self.translation;
        Transform::translation(-p.x as f32, -p.y as f32)
            .then_rotate(Angle::radians(self.rotation.to_radians() as f32))
            .then_translate(vector((p.x + t.x) as f32, (p.y + t.y) as f32))
    }
}

/// In-memory [`SceneSurface`].
///
/// Text has no font metrics here, so a text node contributes only its
/// anchor point to bounds and is never hit.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: HashMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
    next_id: u64,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// Root nodes in draw order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Extent in the node's own local coordinates.
    fn local_extent(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(&id)?;
        match &node.shape {
            NodeShape::Group => {
                let mut extent: Option<Rect> = None;
                for child in &node.children {
                    if let Some(b) = self.bounding_box(*child) {
                        extent = Some(match extent {
                            Some(e) => e.union(&b),
                            None => b,
                        });
                    }
                }
                Some(extent.unwrap_or_default())
            }
            NodeShape::Rect { width, height } => Some(Rect::new(0.0, 0.0, *width, *height)),
            NodeShape::Ellipse { rx, ry } => Some(Rect::new(-rx, -ry, rx * 2.0, ry * 2.0)),
            NodeShape::Line { from, to } => Some(Rect::from_corners(*from, *to)),
            NodeShape::Text { .. } => Some(Rect::default()),
        }
    }

    fn scale_node(&mut self, id: NodeId, sx: f64, sy: f64) {
        let children = match self.nodes.get_mut(&id) {
            Some(node) => {
                match &mut node.shape {
                    NodeShape::Group | NodeShape::Text { .. } => {}
                    NodeShape::Rect { width, height } => {
                        *width *= sx;
                        *height *= sy;
                    }
                    NodeShape::Ellipse { rx, ry } => {
                        *rx *= sx;
                        *ry *= sy;
                    }
                    NodeShape::Line { from, to } => {
                        *from = Point::new(from.x * sx, from.y * sy);
                        *to = Point::new(to.x * sx, to.y * sy);
                    }
                }
                node.pivot = Point::new(node.pivot.x * sx, node.pivot.y * sy);
                node.children.clone()
            }
            None => return,
        };

        for child in children {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.translation = Point::new(node.translation.x * sx, node.translation.y * sy);
            }
            self.scale_node(child, sx, sy);
        }
    }

    fn hit_node(&self, id: NodeId, parent_point: Point) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if node.effective_style(POINTER_EVENTS).is_some_and(|v| v == "none") {
            return None;
        }
        let inverse = node.transform().inverse()?;
        let local = inverse.transform_point(point(parent_point.x as f32, parent_point.y as f32));
        let local = Point::new(local.x as f64, local.y as f64);

        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_node(*child, local) {
                return Some(hit);
            }
        }

        let inside = match &node.shape {
            NodeShape::Group | NodeShape::Text { .. } => false,
            NodeShape::Rect { width, height } => {
                Rect::new(0.0, 0.0, *width, *height).contains(local)
            }
            NodeShape::Ellipse { rx, ry } => {
                if *rx <= EPSILON || *ry <= EPSILON {
                    false
                } else {
                    let nx = local.x / rx;
                    let ny = local.y / ry;
                    nx * nx + ny * ny <= 1.0
                }
            }
            NodeShape::Line { from, to } => distance_to_segment(local, *from, *to) <= LINE_HIT_TOLERANCE,
        };
        inside.then_some(id)
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= EPSILON {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + ab.x * t, a.y + ab.y * t))
}

impl SceneSurface for MemoryScene {
    fn create_node(&mut self, parent: Option<NodeId>, shape: NodeShape) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        // An unknown parent places the node at the root
        let parent = parent.filter(|p| self.nodes.contains_key(p));
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.nodes.insert(id, SceneNode::new(shape, parent));
        id
    }

    fn remove_node(&mut self, node: NodeId) -> bool {
        let Some(removed) = self.nodes.remove(&node) else {
            return false;
        };
        match removed.parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(&p) {
                    parent.children.retain(|c| *c != node);
                }
            }
            None => self.roots.retain(|r| *r != node),
        }

        let mut pending = removed.children;
        while let Some(child) = pending.pop() {
            if let Some(n) = self.nodes.remove(&child) {
                pending.extend(n.children);
            }
        }
        true
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn shape(&self, node: NodeId) -> Option<NodeShape> {
        self.nodes.get(&node).map(|n| n.shape.clone())
    }

    fn set_shape(&mut self, node: NodeId, shape: NodeShape) -> bool {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.shape = shape;
                true
            }
            None => false,
        }
    }

    fn translation(&self, node: NodeId) -> Option<Point> {
        self.nodes.get(&node).map(|n| n.translation)
    }

    fn set_translation(&mut self, node: NodeId, position: Point) -> bool {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.translation = position;
                true
            }
            None => false,
        }
    }

    fn rotation(&self, node: NodeId) -> Option<f64> {
        self.nodes.get(&node).map(|n| n.rotation)
    }

    fn set_rotation(&mut self, node: NodeId, degrees: f64, pivot: Point) -> bool {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.rotation = degrees;
                n.pivot = pivot;
                true
            }
            None => false,
        }
    }

    fn bounding_box(&self, node: NodeId) -> Option<Rect> {
        let extent = self.local_extent(node)?;
        let t = self.nodes.get(&node)?.translation;
        Some(extent.translate(t.x, t.y))
    }

    fn set_bounds(&mut self, node: NodeId, bounds: Rect) -> bool {
        let Some(current) = self.bounding_box(node) else {
            return false;
        };
        let sx = if current.width.abs() > EPSILON {
            bounds.width / current.width
        } else {
            1.0
        };
        let sy = if current.height.abs() > EPSILON {
            bounds.height / current.height
        } else {
            1.0
        };
        self.scale_node(node, sx, sy);

        if let Some(after) = self.bounding_box(node) {
            if let Some(n) = self.nodes.get_mut(&node) {
                n.translation = Point::new(
                    n.translation.x + bounds.x - after.x,
                    n.translation.y + bounds.y - after.y,
                );
            }
        }
        true
    }

    fn style(&self, node: NodeId, key: &str) -> Option<String> {
        self.nodes.get(&node)?.effective_style(key).cloned()
    }

    fn set_style(&mut self, node: NodeId, key: &str, value: Option<&str>) -> bool {
        let Some(n) = self.nodes.get_mut(&node) else {
            return false;
        };
        match value {
            Some(v) => {
                n.styles.insert(key.to_string(), v.to_string());
            }
            None => {
                n.styles.remove(key);
            }
        }
        true
    }

    fn push_style_layer(
        &mut self,
        node: NodeId,
        layer: &str,
        styles: &BTreeMap<String, String>,
    ) -> bool {
        let Some(n) = self.nodes.get_mut(&node) else {
            return false;
        };
        match n.layers.iter_mut().find(|(name, _)| name == layer) {
            Some((_, existing)) => *existing = styles.clone(),
            None => n.layers.push((layer.to_string(), styles.clone())),
        }
        true
    }

    fn remove_style_layer(&mut self, node: NodeId, layer: &str) -> bool {
        let Some(n) = self.nodes.get_mut(&node) else {
            return false;
        };
        let before = n.layers.len();
        n.layers.retain(|(name, _)| name != layer);
        n.layers.len() != before
    }

    fn claim_node(&mut self, node: NodeId, owner: &str) -> Result<(), String> {
        let Some(n) = self.nodes.get_mut(&node) else {
            return Err(String::new());
        };
        match &n.owner {
            Some(current) if current != owner => Err(current.clone()),
            _ => {
                n.owner = Some(owner.to_string());
                Ok(())
            }
        }
    }

    fn node_owner(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.owner.clone())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.classes.contains(class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> bool {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.classes.insert(class.to_string());
                true
            }
            None => false,
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> bool {
        match self.nodes.get_mut(&node) {
            Some(n) => {
                n.classes.remove(class);
                true
            }
            None => false,
        }
    }

    fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.roots
            .iter()
            .rev()
            .find_map(|root| self.hit_node(*root, point))
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(scene: &mut MemoryScene, x: f64, y: f64, w: f64, h: f64) -> (NodeId, NodeId) {
        let group = scene.create_node(None, NodeShape::Group);
        let rect = scene.create_node(Some(group), NodeShape::Rect { width: w, height: h });
        scene.set_translation(group, Point::new(x, y));
        (group, rect)
    }

    #[test]
    fn test_group_bounds_follow_children() {
        let mut scene = MemoryScene::new();
        let (group, _) = body(&mut scene, 10.0, 20.0, 40.0, 30.0);
        assert_eq!(scene.bounding_box(group), Some(Rect::new(10.0, 20.0, 40.0, 30.0)));
    }

    #[test]
    fn test_remove_node_is_recursive() {
        let mut scene = MemoryScene::new();
        let (group, rect) = body(&mut scene, 0.0, 0.0, 10.0, 10.0);
        assert_eq!(scene.node_count(), 2);
        assert!(scene.remove_node(group));
        assert!(!scene.contains(rect));
        assert_eq!(scene.node_count(), 0);
        assert!(!scene.remove_node(group));
    }

    #[test]
    fn test_hit_test_returns_topmost_leaf() {
        let mut scene = MemoryScene::new();
        let (_, lower) = body(&mut scene, 0.0, 0.0, 50.0, 50.0);
        let (_, upper) = body(&mut scene, 25.0, 25.0, 50.0, 50.0);

        assert_eq!(scene.hit_test(Point::new(30.0, 30.0)), Some(upper));
        assert_eq!(scene.hit_test(Point::new(10.0, 10.0)), Some(lower));
        assert_eq!(scene.hit_test(Point::new(200.0, 200.0)), None);
    }

    #[test]
    fn test_hit_test_respects_rotation() {
        let mut scene = MemoryScene::new();
        let (group, rect) = body(&mut scene, 0.0, 0.0, 100.0, 10.0);
        scene.set_rotation(group, 90.0, Point::new(50.0, 5.0));

        // The bar now stands vertically through (50, 5)
        assert_eq!(scene.hit_test(Point::new(50.0, 40.0)), Some(rect));
        assert_eq!(scene.hit_test(Point::new(90.0, 5.0)), None);
    }

    #[test]
    fn test_set_bounds_scales_and_moves() {
        let mut scene = MemoryScene::new();
        let (group, rect) = body(&mut scene, 10.0, 10.0, 40.0, 20.0);
        assert!(scene.set_bounds(group, Rect::new(0.0, 5.0, 80.0, 10.0)));

        assert_eq!(scene.bounding_box(group), Some(Rect::new(0.0, 5.0, 80.0, 10.0)));
        assert_eq!(
            scene.shape(rect),
            Some(NodeShape::Rect {
                width: 80.0,
                height: 10.0
            })
        );
    }

    #[test]
    fn test_styles_and_classes() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(None, NodeShape::Rect { width: 1.0, height: 1.0 });
        scene.set_style(node, "stroke", Some("#fff"));
        assert_eq!(scene.style(node, "stroke").as_deref(), Some("#fff"));
        scene.set_style(node, "stroke", None);
        assert_eq!(scene.style(node, "stroke"), None);

        scene.add_class(node, "selected");
        assert!(scene.has_class(node, "selected"));
        scene.remove_class(node, "selected");
        assert!(!scene.has_class(node, "selected"));
    }

    #[test]
    fn test_style_layers_stack_over_own_styles() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(None, NodeShape::Rect { width: 1.0, height: 1.0 });
        scene.set_style(node, "stroke", Some("#000"));
        let layer = |value: &str| BTreeMap::from([("stroke".to_string(), value.to_string())]);

        scene.push_style_layer(node, "selectable", &layer("#f90"));
        scene.push_style_layer(node, "lockable", &layer("#999"));
        assert_eq!(scene.style(node, "stroke").as_deref(), Some("#999"));

        // Removing the lower layer leaves the upper one in effect
        assert!(scene.remove_style_layer(node, "selectable"));
        assert_eq!(scene.style(node, "stroke").as_deref(), Some("#999"));
        assert!(scene.remove_style_layer(node, "lockable"));
        assert_eq!(scene.style(node, "stroke").as_deref(), Some("#000"));
        assert!(!scene.remove_style_layer(node, "lockable"));
    }

    #[test]
    fn test_claim_node_has_one_owner() {
        let mut scene = MemoryScene::new();
        let node = scene.create_node(None, NodeShape::Group);
        assert_eq!(scene.claim_node(node, "a"), Ok(()));
        assert_eq!(scene.claim_node(node, "a"), Ok(()));
        assert_eq!(scene.claim_node(node, "b"), Err("a".to_string()));
        assert_eq!(scene.node_owner(node).as_deref(), Some("a"));
    }

    #[test]
    fn test_line_hit_tolerance() {
        let mut scene = MemoryScene::new();
        let line = scene.create_node(
            None,
            NodeShape::Line {
                from: Point::new(0.0, 0.0),
                to: Point::new(100.0, 0.0),
            },
        );
        assert_eq!(scene.hit_test(Point::new(50.0, 2.0)), Some(line));
        assert_eq!(scene.hit_test(Point::new(50.0, 6.0)), None);
    }

    #[test]
    fn test_pointer_events_none_is_transparent() {
        let mut scene = MemoryScene::new();
        let (_, lower) = body(&mut scene, 0.0, 0.0, 50.0, 50.0);
        let (overlay, _) = body(&mut scene, 0.0, 0.0, 50.0, 50.0);
        scene.set_style(overlay, POINTER_EVENTS, Some("none"));

        assert_eq!(scene.hit_test(Point::new(10.0, 10.0)), Some(lower));
    }
}
