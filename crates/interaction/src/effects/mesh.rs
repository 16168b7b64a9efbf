//! Mesh hover outline and selection outline + bounding wireframe.

use crate::error::{InteractionError, Result};
use crate::resources::{Geometry, Material};
use crate::scene::{NodeId, SceneGraph};
use crate::shapes::{box_edges, outline_edges};

use super::{color, spawn_drawable, EffectKind, EffectStrategy, Highlight, VisualEffects};

pub struct MeshEffect;

impl MeshEffect {
    fn kinds(highlight: Highlight) -> &'static [EffectKind] {
        match highlight {
            Highlight::Hover => &[EffectKind::HoverOutline],
            Highlight::Selection => &[EffectKind::SelectionOutline, EffectKind::SelectionBounds],
        }
    }
}

impl EffectStrategy for MeshEffect {
    fn apply(
        &self,
        effects: &mut VisualEffects,
        scene: &mut SceneGraph,
        node: NodeId,
        highlight: Highlight,
        active: bool,
    ) -> Result<()> {
        if !active {
            for kind in Self::kinds(highlight) {
                effects.remove_overlay(scene, node, *kind)?;
            }
            return Ok(());
        }

        let source = owner_geometry(scene, node)?;
        let style = effects.style().clone();
        let name = scene.node(node).map(|n| n.name.clone()).unwrap_or_default();

        for kind in Self::kinds(highlight) {
            let (label, geometry, rgba, order) = match kind {
                EffectKind::HoverOutline => (
                    "hover outline",
                    outline_edges(&source, style.outline_crease_degrees),
                    style.hover_color,
                    style.hover_render_order,
                ),
                EffectKind::SelectionOutline => (
                    "selection outline",
                    outline_edges(&source, style.outline_crease_degrees),
                    style.selection_color,
                    style.selection_render_order,
                ),
                EffectKind::SelectionBounds => {
                    let bounds = source.bounds().ok_or(InteractionError::MissingComponent {
                        node,
                        what: "bounds",
                    })?;
                    ("selection bounds", box_edges(&bounds), style.bounds_color, style.selection_render_order)
                }
                _ => continue,
            };

            effects.ensure_overlay(scene, node, *kind, |scene, parent, transform| {
                spawn_drawable(
                    scene,
                    parent,
                    format!("{} {}", name, label),
                    geometry,
                    Material::overlay(color(rgba)),
                    transform,
                    order,
                )
            })?;
        }
        Ok(())
    }
}

/// Copy of the node's geometry, read before any overlay resources are added
fn owner_geometry(scene: &SceneGraph, node: NodeId) -> Result<Geometry> {
    let renderable = scene
        .node(node)
        .ok_or(InteractionError::NodeNotFound(node))?
        .renderable
        .as_ref()
        .ok_or(InteractionError::MissingComponent {
            node,
            what: "renderable",
        })?;
    scene
        .resources()
        .geometry(renderable.geometry)
        .cloned()
        .ok_or(InteractionError::MissingComponent {
            node,
            what: "geometry",
        })
}
