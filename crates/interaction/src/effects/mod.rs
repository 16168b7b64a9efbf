//! Hover and selection visual feedback.
//!
//! Each entity kind has its own [`EffectStrategy`]. Strategies decorate a
//! node without touching its own content: they add overlay nodes next to it
//! (outlines, halos, bounding wireframes) or, for marker hover, swap its
//! material with a recorded snapshot. Overlays refer to their owner by id
//! through the [`OverlayRegistry`], never by ownership.

mod marker;
mod measurement;
mod mesh;
mod snapshot;

use std::collections::HashMap;

use glam::Vec4;
use tracing::{debug, warn};
use vista_config::OverlayStyle;

use crate::error::{InteractionError, Result};
use crate::lifecycle;
use crate::resources::{Geometry, Material};
use crate::scene::{NodeDesc, NodeId, NodeKind, NodeTransform, SceneGraph};

pub use marker::MarkerEffect;
pub use measurement::MeasurementEffect;
pub use mesh::MeshEffect;
pub use snapshot::MaterialSnapshots;

/// Which interaction state an effect represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Highlight {
    Hover,
    Selection,
}

/// One overlay slot per node; a node never carries two of the same kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    HoverOutline,
    SelectionOutline,
    SelectionBounds,
    MarkerHalo,
    MeasurementHover,
    MeasurementSelection,
}

/// Overlay node per (owner, effect kind)
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    overlays: HashMap<(NodeId, EffectKind), NodeId>,
}

impl OverlayRegistry {
    pub fn get(&self, owner: NodeId, kind: EffectKind) -> Option<NodeId> {
        self.overlays.get(&(owner, kind)).copied()
    }

    fn insert(&mut self, owner: NodeId, kind: EffectKind, overlay: NodeId) {
        self.overlays.insert((owner, kind), overlay);
    }

    fn remove(&mut self, owner: NodeId, kind: EffectKind) -> Option<NodeId> {
        self.overlays.remove(&(owner, kind))
    }

    /// Overlays attached to `owner`
    pub fn owned_by(&self, owner: NodeId) -> Vec<(EffectKind, NodeId)> {
        self.overlays
            .iter()
            .filter(|((o, _), _)| *o == owner)
            .map(|((_, kind), overlay)| (*kind, *overlay))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, EffectKind, NodeId)> + '_ {
        self.overlays.iter().map(|((owner, kind), overlay)| (*owner, *kind, *overlay))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

/// Visual feedback routine for one entity kind.
///
/// `apply` is idempotent: activating twice leaves a single set of overlays,
/// and deactivating removes every overlay it created and disposes their
/// resources.
pub trait EffectStrategy {
    fn apply(
        &self,
        effects: &mut VisualEffects,
        scene: &mut SceneGraph,
        node: NodeId,
        highlight: Highlight,
        active: bool,
    ) -> Result<()>;
}

/// Strategy used for a node kind, if the kind has visual feedback
pub fn strategy_for(kind: NodeKind) -> Option<&'static dyn EffectStrategy> {
    match kind {
        NodeKind::Mesh => Some(&MeshEffect),
        NodeKind::PointMarker => Some(&MarkerEffect),
        NodeKind::MeasurementGroup => Some(&MeasurementEffect),
        NodeKind::Group | NodeKind::Line | NodeKind::Light | NodeKind::Helper => None,
    }
}

/// Overlay bookkeeping plus the style overlays are drawn with
#[derive(Debug, Default)]
pub struct VisualEffects {
    style: OverlayStyle,
    overlays: OverlayRegistry,
    snapshots: MaterialSnapshots,
}

impl VisualEffects {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            overlays: OverlayRegistry::default(),
            snapshots: MaterialSnapshots::new(),
        }
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    pub fn snapshots(&self) -> &MaterialSnapshots {
        &self.snapshots
    }

    /// Turn `highlight` on or off for `node` using its kind's strategy.
    ///
    /// Kinds without a strategy are ignored.
    pub fn apply(
        &mut self,
        scene: &mut SceneGraph,
        node: NodeId,
        highlight: Highlight,
        active: bool,
    ) -> Result<()> {
        let kind = scene.node(node).ok_or(InteractionError::NodeNotFound(node))?.kind;
        match strategy_for(kind) {
            Some(strategy) => strategy.apply(self, scene, node, highlight, active),
            None => {
                debug!("No visual effect for {} node {:?}", kind.tag(), node);
                Ok(())
            }
        }
    }

    /// Remove every effect on `node`, including overlays whose owner is already gone
    pub fn clear_node(&mut self, scene: &mut SceneGraph, node: NodeId) {
        if scene.contains(node) {
            for highlight in [Highlight::Hover, Highlight::Selection] {
                if let Err(err) = self.apply(scene, node, highlight, false) {
                    warn!("Failed to clear {:?} effect on {:?}: {}", highlight, node, err);
                }
            }
        }

        // Anything left belongs to a node that vanished underneath us
        for (kind, _) in self.overlays.owned_by(node) {
            if let Err(err) = self.remove_overlay(scene, node, kind) {
                warn!("Failed to remove orphaned overlay {:?} of {:?}: {}", kind, node, err);
            }
        }
        self.snapshots.take(node);
    }

    /// Remove every effect on every node
    pub fn clear_all(&mut self, scene: &mut SceneGraph) {
        for owner in self.owners() {
            self.clear_node(scene, owner);
        }
    }

    /// Nodes carrying any overlay or material override, sorted
    pub fn owners(&self) -> Vec<NodeId> {
        let mut owners: Vec<NodeId> = self.overlays.iter().map(|(owner, _, _)| owner).collect();
        owners.extend(self.snapshots.nodes());
        owners.sort();
        owners.dedup();
        owners
    }

    /// Copy each owner's local transform and visibility onto its overlays.
    ///
    /// Overlays are siblings of their owner, so matching the owner's own
    /// flag gives them the same effective visibility.
    pub fn sync_overlays(&self, scene: &mut SceneGraph) {
        let updates: Vec<(NodeId, NodeTransform, bool)> = self
            .overlays
            .iter()
            .filter_map(|(owner, _, overlay)| {
                let owner = scene.node(owner)?;
                Some((overlay, owner.transform, owner.visible))
            })
            .collect();

        for (overlay, transform, visible) in updates {
            let Some(current) = scene.node(overlay) else {
                // Detached along with its owner's subtree
                continue;
            };
            let (moved, toggled) = (current.transform != transform, current.visible != visible);
            if moved && let Err(err) = scene.set_transform(overlay, transform) {
                debug!("Failed to move overlay {:?}: {}", overlay, err);
            }
            if toggled && let Err(err) = scene.set_visible(overlay, visible) {
                debug!("Failed to toggle overlay {:?}: {}", overlay, err);
            }
        }
    }

    /// Build the overlay for (`owner`, `kind`) unless a live one exists.
    ///
    /// `build` receives the owner's parent and local transform and returns the
    /// new overlay root. Returns the new overlay, or `None` when one was already
    /// in place.
    pub(crate) fn ensure_overlay(
        &mut self,
        scene: &mut SceneGraph,
        owner: NodeId,
        kind: EffectKind,
        build: impl FnOnce(&mut SceneGraph, NodeId, NodeTransform) -> Result<NodeId>,
    ) -> Result<Option<NodeId>> {
        if let Some(existing) = self.overlays.get(owner, kind) {
            if scene.contains(existing) {
                return Ok(None);
            }
            // Stale entry: replace rather than add a second overlay
            self.overlays.remove(owner, kind);
        }

        let owner_node = scene.node(owner).ok_or(InteractionError::NodeNotFound(owner))?;
        let parent = owner_node.parent.unwrap_or(scene.root());
        let transform = owner_node.transform;

        let overlay = build(scene, parent, transform)?;
        self.overlays.insert(owner, kind, overlay);
        Ok(Some(overlay))
    }

    /// Remove the overlay for (`owner`, `kind`) and dispose its resources
    pub(crate) fn remove_overlay(
        &mut self,
        scene: &mut SceneGraph,
        owner: NodeId,
        kind: EffectKind,
    ) -> Result<()> {
        if let Some(overlay) = self.overlays.remove(owner, kind) {
            lifecycle::remove_and_dispose(scene, overlay)?;
        }
        Ok(())
    }

    pub(crate) fn snapshots_mut(&mut self) -> &mut MaterialSnapshots {
        &mut self.snapshots
    }
}

/// Linear RGBA from a config colour
pub(crate) fn color(rgba: [f32; 4]) -> Vec4 {
    Vec4::from_array(rgba)
}

/// Add a drawable, non-pickable helper node owning fresh resources
pub(crate) fn spawn_drawable(
    scene: &mut SceneGraph,
    parent: NodeId,
    name: String,
    geometry: Geometry,
    material: Material,
    transform: NodeTransform,
    render_order: i32,
) -> Result<NodeId> {
    let resources = scene.resources_mut();
    let geometry = resources.add_geometry(geometry);
    let material = resources.add_material(material);

    let desc = NodeDesc::overlay(name, geometry, material)
        .with_transform(transform)
        .with_render_order(render_order);
    match scene.add(parent, desc) {
        Ok(id) => Ok(id),
        Err(err) => {
            // Never attached, so nothing else references these
            let resources = scene.resources_mut();
            if let Err(dispose_err) = resources.dispose_geometry(geometry) {
                debug!("Unattached overlay geometry already released: {}", dispose_err);
            }
            if let Err(dispose_err) = resources.dispose_material(material) {
                debug!("Unattached overlay material already released: {}", dispose_err);
            }
            Err(err)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::Vec3;

    use crate::resources::Material;
    use crate::scene::{NodeDesc, NodeId, SceneGraph};
    use crate::shapes::{cuboid, uv_sphere};

    pub fn add_box(scene: &mut SceneGraph, parent: NodeId) -> NodeId {
        let geometry = scene.resources_mut().add_geometry(cuboid(Vec3::splat(0.5)));
        let material = scene.resources_mut().add_material(Material::default());
        scene
            .add(parent, NodeDesc::mesh("box", geometry, material).at(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap()
    }

    pub fn add_marker(scene: &mut SceneGraph, parent: NodeId, at: Vec3) -> NodeId {
        let geometry = scene.resources_mut().add_geometry(uv_sphere(0.1, 8, 6));
        let material = scene.resources_mut().add_material(Material::default());
        scene
            .add(parent, NodeDesc::point_marker("marker", geometry, material).at(at))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::test_support::add_box;
    use super::*;

    #[test]
    fn test_hover_a_b_a_keeps_one_overlay() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = add_box(&mut scene, root);
        let b = add_box(&mut scene, root);
        let mut effects = VisualEffects::default();

        let sequence = [(None, a), (Some(a), b), (Some(b), a)];
        for (previous, next) in sequence {
            if let Some(previous) = previous {
                effects.apply(&mut scene, previous, Highlight::Hover, false).unwrap();
            }
            effects.apply(&mut scene, next, Highlight::Hover, true).unwrap();

            assert_eq!(effects.overlays().len(), 1);
            assert!(effects.overlays().get(next, EffectKind::HoverOutline).is_some());
        }
    }

    #[test]
    fn test_kinds_without_strategy_are_ignored() {
        let mut scene = SceneGraph::new();
        let light = scene.add(scene.root(), NodeDesc::light("sun")).unwrap();
        let mut effects = VisualEffects::default();

        effects.apply(&mut scene, light, Highlight::Selection, true).unwrap();
        assert!(effects.overlays().is_empty());
    }

    #[test]
    fn test_overlays_follow_owner_transform() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let node = add_box(&mut scene, root);
        let mut effects = VisualEffects::default();
        effects.apply(&mut scene, node, Highlight::Selection, true).unwrap();

        let moved = NodeTransform::from_translation(Vec3::new(4.0, 2.0, 0.0));
        scene.set_transform(node, moved).unwrap();
        effects.sync_overlays(&mut scene);

        for (_, overlay) in effects.overlays().owned_by(node) {
            assert_eq!(scene.node(overlay).unwrap().transform, moved);
        }
    }

    #[test]
    fn test_overlays_hide_and_show_with_owner() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let node = add_box(&mut scene, root);
        let mut effects = VisualEffects::default();
        effects.apply(&mut scene, node, Highlight::Selection, true).unwrap();
        let overlays = effects.overlays().owned_by(node);
        assert_eq!(overlays.len(), 2);

        scene.set_visible(node, false).unwrap();
        effects.sync_overlays(&mut scene);
        for (_, overlay) in &overlays {
            assert!(!scene.is_effectively_visible(*overlay));
        }

        scene.set_visible(node, true).unwrap();
        effects.sync_overlays(&mut scene);
        for (_, overlay) in &overlays {
            assert!(scene.is_effectively_visible(*overlay));
        }
    }

    #[test]
    fn test_clear_all_disposes_everything_it_created() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = add_box(&mut scene, root);
        let b = add_box(&mut scene, root);
        let baseline = scene.resources().live_counts();
        let mut effects = VisualEffects::default();

        effects.apply(&mut scene, a, Highlight::Hover, true).unwrap();
        effects.apply(&mut scene, b, Highlight::Selection, true).unwrap();
        effects.clear_all(&mut scene);

        assert!(effects.overlays().is_empty());
        assert_eq!(scene.resources().live_counts(), baseline);
        assert_eq!(scene.root_child_count(), 2);
    }

    #[test]
    fn test_orphaned_overlay_is_removed_on_clear() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let node = add_box(&mut scene, root);
        let mut effects = VisualEffects::default();
        effects.apply(&mut scene, node, Highlight::Hover, true).unwrap();

        lifecycle::remove_and_dispose(&mut scene, node).unwrap();
        effects.clear_node(&mut scene, node);

        assert!(effects.overlays().is_empty());
        assert_eq!(scene.root_child_count(), 0);
    }
}
