//! Measurement-group highlight: enlarged end points and thick dashed lines,
//! collected under one auxiliary group so they come and go together.

use crate::error::Result;
use crate::lifecycle;
use crate::resources::{Geometry, Material};
use crate::scene::{NodeDesc, NodeId, NodeKind, NodeTransform, SceneGraph};
use crate::shapes::uv_sphere;

use super::{color, spawn_drawable, EffectKind, EffectStrategy, Highlight, VisualEffects};

pub struct MeasurementEffect;

/// What to draw for one child of the measurement group
enum ChildHighlight {
    Point { radius: f32, transform: NodeTransform },
    Line { geometry: Geometry, transform: NodeTransform },
}

impl EffectStrategy for MeasurementEffect {
    fn apply(
        &self,
        effects: &mut VisualEffects,
        scene: &mut SceneGraph,
        node: NodeId,
        highlight: Highlight,
        active: bool,
    ) -> Result<()> {
        let kind = match highlight {
            Highlight::Hover => EffectKind::MeasurementHover,
            Highlight::Selection => EffectKind::MeasurementSelection,
        };
        if !active {
            return effects.remove_overlay(scene, node, kind);
        }

        let style = effects.style().clone();
        let (rgba, order) = match highlight {
            Highlight::Hover => (style.hover_color, style.hover_render_order),
            Highlight::Selection => (style.measurement_color, style.selection_render_order),
        };
        let children = collect_children(scene, node, style.measurement_point_scale);
        let name = scene.node(node).map(|n| n.name.clone()).unwrap_or_default();

        effects.ensure_overlay(scene, node, kind, |scene, parent, transform| {
            let group = scene.add(
                parent,
                NodeDesc::helper(format!("{} highlight", name))
                    .with_transform(transform)
                    .with_render_order(order),
            )?;

            let populated = children.into_iter().try_for_each(|child| {
                let (label, geometry, material, transform) = match child {
                    ChildHighlight::Point { radius, transform } => (
                        "end point",
                        uv_sphere(radius, 12, 8),
                        Material::overlay(color(rgba)),
                        transform,
                    ),
                    ChildHighlight::Line { geometry, transform } => (
                        "line",
                        geometry,
                        Material::overlay(color(rgba))
                            .with_line_width(style.highlight_line_width)
                            .with_dash(style.dash_size, style.gap_size),
                        transform,
                    ),
                };
                spawn_drawable(scene, group, label.to_string(), geometry, material, transform, order)
                    .map(|_| ())
            });

            match populated {
                Ok(()) => Ok(group),
                Err(err) => {
                    // Half-built group would otherwise leak
                    lifecycle::remove_and_dispose(scene, group)?;
                    Err(err)
                }
            }
        })?;
        Ok(())
    }
}

fn collect_children(scene: &SceneGraph, node: NodeId, point_scale: f32) -> Vec<ChildHighlight> {
    scene
        .children(node)
        .iter()
        .filter_map(|&child| {
            let child_node = scene.node(child)?;
            let geometry = child_node
                .renderable
                .as_ref()
                .and_then(|r| scene.resources().geometry(r.geometry));
            match child_node.kind {
                NodeKind::PointMarker | NodeKind::Mesh => {
                    let radius = geometry
                        .and_then(|g| g.bounds())
                        .map(|b| b.half_extents().max_element())
                        .unwrap_or(0.05);
                    Some(ChildHighlight::Point {
                        radius: radius * point_scale,
                        transform: child_node.transform,
                    })
                }
                NodeKind::Line => Some(ChildHighlight::Line {
                    geometry: geometry?.clone(),
                    transform: child_node.transform,
                }),
                _ => None,
            }
        })
        .collect()
}
