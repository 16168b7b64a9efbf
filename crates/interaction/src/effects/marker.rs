//! Point-marker effects: an in-place hover tint and a selection halo.

use tracing::warn;

use crate::error::Result;
use crate::resources::Material;
use crate::scene::{MaterialSlot, NodeId, SceneGraph};
use crate::shapes::uv_sphere;

use super::{color, spawn_drawable, EffectKind, EffectStrategy, Highlight, VisualEffects};

/// Radius assumed for markers drawn without geometry
const BARE_MARKER_RADIUS: f32 = 0.06;

pub struct MarkerEffect;

impl EffectStrategy for MarkerEffect {
    fn apply(
        &self,
        effects: &mut VisualEffects,
        scene: &mut SceneGraph,
        node: NodeId,
        highlight: Highlight,
        active: bool,
    ) -> Result<()> {
        match (highlight, active) {
            (Highlight::Hover, true) => tint(effects, scene, node),
            (Highlight::Hover, false) => restore(effects, scene, node),
            (Highlight::Selection, true) => add_halo(effects, scene, node),
            (Highlight::Selection, false) => effects.remove_overlay(scene, node, EffectKind::MarkerHalo),
        }
    }
}

fn marker_radius(scene: &SceneGraph, node: NodeId) -> f32 {
    scene
        .node(node)
        .and_then(|n| n.renderable.as_ref())
        .and_then(|r| scene.resources().geometry(r.geometry))
        .and_then(|g| g.bounds())
        .map(|b| b.half_extents().max_element())
        .filter(|r| *r > 0.0)
        .unwrap_or(BARE_MARKER_RADIUS)
}

fn add_halo(effects: &mut VisualEffects, scene: &mut SceneGraph, node: NodeId) -> Result<()> {
    let style = effects.style().clone();
    let radius = marker_radius(scene, node) * style.marker_halo_scale;
    let name = scene.node(node).map(|n| n.name.clone()).unwrap_or_default();

    effects.ensure_overlay(scene, node, EffectKind::MarkerHalo, |scene, parent, transform| {
        spawn_drawable(
            scene,
            parent,
            format!("{} halo", name),
            uv_sphere(radius, 16, 12),
            Material::overlay(color(style.marker_halo_color)),
            transform,
            style.selection_render_order,
        )
    })?;
    Ok(())
}

/// Swap in the hover tint, recording the original materials once
fn tint(effects: &mut VisualEffects, scene: &mut SceneGraph, node: NodeId) -> Result<()> {
    if effects.snapshots().is_overridden(node) {
        return Ok(());
    }
    let has_renderable = scene.node(node).is_some_and(|n| n.renderable.is_some());
    if !has_renderable {
        return Ok(());
    }

    let tint = scene
        .resources_mut()
        .add_material(Material::from_color(color(effects.style().marker_hover_color)));
    let original = scene.replace_materials(node, MaterialSlot::Single(tint))?;
    effects.snapshots_mut().record(node, original);
    Ok(())
}

/// Put the original materials back and dispose the tint
fn restore(effects: &mut VisualEffects, scene: &mut SceneGraph, node: NodeId) -> Result<()> {
    let Some(original) = effects.snapshots_mut().take(node) else {
        return Ok(());
    };
    let tint = scene.replace_materials(node, original)?;
    for handle in tint.handles() {
        if let Err(err) = scene.resources_mut().dispose_material(handle) {
            warn!("Hover tint on {:?} already released: {}", node, err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::super::test_support::add_marker;
    use super::*;

    #[test]
    fn test_hover_tint_restores_original_materials() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let marker = add_marker(&mut scene, root, Vec3::ONE);
        let original = scene.node(marker).unwrap().renderable.clone().unwrap().materials;
        let baseline = scene.resources().live_counts();
        let mut effects = VisualEffects::default();

        effects.apply(&mut scene, marker, Highlight::Hover, true).unwrap();
        effects.apply(&mut scene, marker, Highlight::Hover, true).unwrap();
        assert_eq!(effects.snapshots().len(), 1);
        assert_ne!(scene.node(marker).unwrap().renderable.as_ref().unwrap().materials, original);

        effects.apply(&mut scene, marker, Highlight::Hover, false).unwrap();
        assert!(effects.snapshots().is_empty());
        assert_eq!(scene.node(marker).unwrap().renderable.as_ref().unwrap().materials, original);
        assert_eq!(scene.resources().live_counts(), baseline);
    }

    #[test]
    fn test_selection_halo_is_larger_and_unique() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let marker = add_marker(&mut scene, root, Vec3::ONE);
        let mut effects = VisualEffects::default();

        effects.apply(&mut scene, marker, Highlight::Selection, true).unwrap();
        effects.apply(&mut scene, marker, Highlight::Selection, true).unwrap();
        assert_eq!(effects.overlays().len(), 1);

        let halo = effects.overlays().get(marker, EffectKind::MarkerHalo).unwrap();
        let halo_geometry = scene.node(halo).unwrap().renderable.as_ref().unwrap().geometry;
        let radius = scene.resources().geometry(halo_geometry).unwrap().bounds().unwrap().max.x;
        assert!(radius > marker_radius(&scene, marker));
        assert_eq!(scene.node(halo).unwrap().transform.translation, Vec3::ONE);

        effects.apply(&mut scene, marker, Highlight::Selection, false).unwrap();
        assert!(!scene.contains(halo));
    }
}
