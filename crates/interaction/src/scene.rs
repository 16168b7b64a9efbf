//! Scene graph model the interaction layer reads and decorates.
//!
//! Nodes live in an arena keyed by [`NodeId`]; parent/child links are ids, so
//! no node ever holds an owning reference to another. Every topology change
//! (add, detach, visibility toggle) bumps a monotonic version that derived
//! caches compare against.

use std::collections::HashMap;

use glam::{Affine3A, Quat, Vec3};

use crate::error::{InteractionError, Result};
use crate::resources::{GeometryHandle, GpuResources, MaterialHandle};

/// Stable identifier of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    Mesh,
    /// A placed point (usually a small sphere mesh)
    PointMarker,
    /// Two end-point markers plus the line between them
    MeasurementGroup,
    Line,
    Light,
    /// Grids, axes, overlays; never pickable
    Helper,
}

impl NodeKind {
    /// Short tag used in selection keys and logs
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh => "mesh",
            NodeKind::PointMarker => "point",
            NodeKind::MeasurementGroup => "measurement",
            NodeKind::Line => "line",
            NodeKind::Light => "light",
            NodeKind::Helper => "helper",
        }
    }
}

/// Local translation/rotation/scale of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl NodeTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// One material or a per-group material array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialSlot {
    Single(MaterialHandle),
    Multi(Vec<MaterialHandle>),
}

impl MaterialSlot {
    pub fn handles(&self) -> Vec<MaterialHandle> {
        match self {
            MaterialSlot::Single(handle) => vec![*handle],
            MaterialSlot::Multi(handles) => handles.clone(),
        }
    }

    /// The material used when only one can be shown
    pub fn primary(&self) -> Option<MaterialHandle> {
        match self {
            MaterialSlot::Single(handle) => Some(*handle),
            MaterialSlot::Multi(handles) => handles.first().copied(),
        }
    }
}

/// Geometry + material(s) drawn for a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderable {
    pub geometry: GeometryHandle,
    pub materials: MaterialSlot,
}

/// A node in the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub transform: NodeTransform,
    pub visible: bool,
    /// False for helpers and overlays
    pub pickable: bool,
    /// Higher orders draw later
    pub render_order: i32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub renderable: Option<Renderable>,
}

/// Description of a node to insert
#[derive(Debug, Clone)]
pub struct NodeDesc {
    name: String,
    kind: NodeKind,
    transform: NodeTransform,
    visible: bool,
    pickable: bool,
    render_order: i32,
    renderable: Option<Renderable>,
}

impl NodeDesc {
    fn new(name: impl Into<String>, kind: NodeKind, renderable: Option<Renderable>) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: NodeTransform::default(),
            visible: true,
            pickable: kind != NodeKind::Helper,
            render_order: 0,
            renderable,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group, None)
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self::new(
            name,
            NodeKind::Mesh,
            Some(Renderable {
                geometry,
                materials: MaterialSlot::Single(material),
            }),
        )
    }

    pub fn line(name: impl Into<String>, geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self::new(
            name,
            NodeKind::Line,
            Some(Renderable {
                geometry,
                materials: MaterialSlot::Single(material),
            }),
        )
    }

    /// Point marker drawn with the given geometry (typically a small sphere)
    pub fn point_marker(
        name: impl Into<String>,
        geometry: GeometryHandle,
        material: MaterialHandle,
    ) -> Self {
        Self::new(
            name,
            NodeKind::PointMarker,
            Some(Renderable {
                geometry,
                materials: MaterialSlot::Single(material),
            }),
        )
    }

    pub fn measurement_group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::MeasurementGroup, None)
    }

    pub fn light(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Light, None)
    }

    pub fn helper(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Helper, None)
    }

    /// Drawable helper, e.g. a hover outline; never pickable
    pub fn overlay(name: impl Into<String>, geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self::new(
            name,
            NodeKind::Helper,
            Some(Renderable {
                geometry,
                materials: MaterialSlot::Single(material),
            }),
        )
    }

    /// Replace the material slot with a per-group material array
    pub fn with_materials(mut self, materials: Vec<MaterialHandle>) -> Self {
        if let Some(renderable) = &mut self.renderable {
            renderable.materials = MaterialSlot::Multi(materials);
        }
        self
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn non_pickable(mut self) -> Self {
        self.pickable = false;
        self
    }

    pub fn with_render_order(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }
}

/// Arena scene graph plus the resources its nodes reference
#[derive(Debug)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
    version: u64,
    resources: GpuResources,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create a scene containing only the root group
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            SceneNode {
                id: root,
                name: "Scene".to_string(),
                kind: NodeKind::Group,
                transform: NodeTransform::default(),
                visible: true,
                pickable: false,
                render_order: 0,
                parent: None,
                children: Vec::new(),
                renderable: None,
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
            version: 0,
            resources: GpuResources::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Monotonic counter bumped by every topology or visibility change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of direct children of the root
    pub fn root_child_count(&self) -> usize {
        self.children(self.root).len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes.get_mut(&id).ok_or(InteractionError::NodeNotFound(id))
    }

    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut GpuResources {
        &mut self.resources
    }

    /// All nodes in arbitrary order
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    /// Insert a node under `parent`
    pub fn add(&mut self, parent: NodeId, desc: NodeDesc) -> Result<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(InteractionError::NodeNotFound(parent));
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            SceneNode {
                id,
                name: desc.name,
                kind: desc.kind,
                transform: desc.transform,
                visible: desc.visible,
                pickable: desc.pickable,
                render_order: desc.render_order,
                parent: Some(parent),
                children: Vec::new(),
                renderable: desc.renderable,
            },
        );
        self.node_mut(parent)?.children.push(id);
        self.version += 1;
        Ok(id)
    }

    /// Remove a node and its whole subtree, returning the removed ids.
    ///
    /// Resources referenced by the subtree are not touched; dispose them first.
    pub fn detach(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if id == self.root {
            return Err(InteractionError::RootNode(id));
        }
        let parent = self.node(id).ok_or(InteractionError::NodeNotFound(id))?.parent;

        let removed = self.descendants(id);
        for node_id in &removed {
            self.nodes.remove(node_id);
        }
        if let Some(parent) = parent
            && let Ok(parent_node) = self.node_mut(parent)
        {
            parent_node.children.retain(|child| *child != id);
        }
        self.version += 1;
        Ok(removed)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The node and all of its descendants in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    pub fn set_transform(&mut self, id: NodeId, transform: NodeTransform) -> Result<()> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.visible != visible {
            node.visible = visible;
            self.version += 1;
        }
        Ok(())
    }

    /// Swap a node's materials, returning the previous slot
    pub fn replace_materials(&mut self, id: NodeId, materials: MaterialSlot) -> Result<MaterialSlot> {
        let node = self.node_mut(id)?;
        let renderable = node.renderable.as_mut().ok_or(InteractionError::MissingComponent {
            node: id,
            what: "renderable",
        })?;
        Ok(std::mem::replace(&mut renderable.materials, materials))
    }

    /// Composed local-to-world transform
    pub fn world_transform(&self, id: NodeId) -> Option<Affine3A> {
        let mut node = self.node(id)?;
        let mut world = node.transform.to_affine();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            world = node.transform.to_affine() * world;
        }
        Some(world)
    }

    /// True when the node and every ancestor are visible
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.node(node_id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_detach_bump_version() {
        let mut scene = SceneGraph::new();
        let v0 = scene.version();

        let group = scene.add(scene.root(), NodeDesc::group("model")).unwrap();
        let child = scene.add(group, NodeDesc::group("part")).unwrap();
        assert!(scene.version() > v0);
        assert_eq!(scene.root_child_count(), 1);

        let v1 = scene.version();
        let removed = scene.detach(group).unwrap();
        assert_eq!(removed, vec![group, child]);
        assert!(!scene.contains(child));
        assert_eq!(scene.root_child_count(), 0);
        assert!(scene.version() > v1);
    }

    #[test]
    fn test_visibility_toggle_bumps_version_without_child_count_change() {
        let mut scene = SceneGraph::new();
        let node = scene.add(scene.root(), NodeDesc::group("g")).unwrap();
        let before = (scene.version(), scene.root_child_count());

        scene.set_visible(node, false).unwrap();
        assert_eq!(scene.root_child_count(), before.1);
        assert!(scene.version() > before.0);

        // No-op toggle leaves the version alone
        let v = scene.version();
        scene.set_visible(node, false).unwrap();
        assert_eq!(scene.version(), v);
    }

    #[test]
    fn test_detach_root_is_rejected() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert_eq!(scene.detach(root), Err(InteractionError::RootNode(root)));
    }

    #[test]
    fn test_world_transform_composes_parents() {
        let mut scene = SceneGraph::new();
        let parent = scene
            .add(scene.root(), NodeDesc::group("p").at(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        let child = scene
            .add(parent, NodeDesc::group("c").at(Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();

        let world = scene.world_transform(child).unwrap();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_hidden_ancestor_hides_descendants() {
        let mut scene = SceneGraph::new();
        let parent = scene.add(scene.root(), NodeDesc::group("p").hidden()).unwrap();
        let child = scene.add(parent, NodeDesc::group("c")).unwrap();
        assert!(!scene.is_effectively_visible(child));
    }
}
