//! Immediate-mode drawing of line and point geometry from the scene graph.
//!
//! Lines are redrawn every frame, so geometry edited in place (the measure
//! preview) needs no re-upload. Materials with depth testing disabled go
//! through [`OverlayGizmos`], which draws on top of everything.

use bevy::prelude::*;
use vista_config::InteractionConfig;
use vista_interaction::resources::Dash;
use vista_interaction::{SceneGraph, Topology};

use crate::{InteractionLayer, ViewerSet};

/// Gizmo group for lines that ignore the depth buffer
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct OverlayGizmos;

pub struct OverlayDrawPlugin;

impl Plugin for OverlayDrawPlugin {
    fn build(&self, app: &mut App) {
        app.init_gizmo_group::<OverlayGizmos>()
            .add_systems(Startup, configure_overlay_gizmos)
            .add_systems(Update, draw_scene_lines.in_set(ViewerSet::Draw));
    }
}

fn configure_overlay_gizmos(mut store: ResMut<GizmoConfigStore>, config: Res<InteractionConfig>) {
    let (overlay, _) = store.config_mut::<OverlayGizmos>();
    // -1 draws in front of all geometry
    overlay.depth_bias = -1.0;
    overlay.line.width = config.overlay.highlight_line_width;
}

/// Split segment `a`-`b` into visible dash pieces
pub fn dash_pieces(a: Vec3, b: Vec3, dash: Option<Dash>) -> Vec<(Vec3, Vec3)> {
    let Some(Dash { dash, gap }) = dash.filter(|d| d.dash > 0.0 && d.gap >= 0.0) else {
        return vec![(a, b)];
    };

    let length = a.distance(b);
    if length <= dash {
        return vec![(a, b)];
    }

    let direction = (b - a) / length;
    let period = dash + gap;
    let mut pieces = Vec::with_capacity((length / period).ceil() as usize);
    let mut offset = 0.0;
    while offset < length {
        let end = (offset + dash).min(length);
        pieces.push((a + direction * offset, a + direction * end));
        offset += period;
    }
    pieces
}

/// World-space segments of every visible line node, in render order
fn collect_lines(scene: &SceneGraph) -> Vec<(i32, bool, Color, Vec<(Vec3, Vec3)>)> {
    let mut batches = Vec::new();

    for node in scene.nodes() {
        let Some(renderable) = &node.renderable else {
            continue;
        };
        let Some(geometry) = scene.resources().geometry(renderable.geometry) else {
            continue;
        };
        if !matches!(geometry.topology, Topology::LineList | Topology::LineStrip) {
            continue;
        }
        if !scene.is_effectively_visible(node.id) {
            continue;
        }
        let Some(material) = renderable
            .materials
            .primary()
            .and_then(|handle| scene.resources().material(handle))
        else {
            continue;
        };
        let Some(world) = scene.world_transform(node.id) else {
            continue;
        };

        let c = material.color;
        let color = Color::linear_rgba(c.x, c.y, c.z, c.w);
        let pieces = geometry
            .segments()
            .into_iter()
            .flat_map(|(a, b)| dash_pieces(world.transform_point3(a), world.transform_point3(b), material.dash))
            .collect();
        batches.push((node.render_order, material.depth_test, color, pieces));
    }

    batches.sort_by_key(|(order, ..)| *order);
    batches
}

fn draw_scene_lines(
    layer: Res<InteractionLayer>,
    config: Res<InteractionConfig>,
    mut gizmos: Gizmos,
    mut overlay: Gizmos<OverlayGizmos>,
) {
    let scene = &layer.scene;

    for (_, depth_test, color, pieces) in collect_lines(scene) {
        for (a, b) in pieces {
            if depth_test {
                gizmos.line(a, b, color);
            } else {
                overlay.line(a, b, color);
            }
        }
    }

    // Point clouds have no mesh; draw each point as a small sphere
    for node in scene.nodes() {
        let Some(renderable) = &node.renderable else {
            continue;
        };
        let Some(geometry) = scene
            .resources()
            .geometry(renderable.geometry)
            .filter(|g| g.topology == Topology::Points)
        else {
            continue;
        };
        let Some(world) = scene.world_transform(node.id).filter(|_| scene.is_effectively_visible(node.id)) else {
            continue;
        };
        let color = renderable
            .materials
            .primary()
            .and_then(|handle| scene.resources().material(handle))
            .map(|m| Color::linear_rgba(m.color.x, m.color.y, m.color.z, m.color.w))
            .unwrap_or(Color::WHITE);

        for point in &geometry.positions {
            gizmos.sphere(
                Isometry3d::from_translation(world.transform_point3(*point)),
                config.point_pick_radius,
                color,
            );
        }
    }
}
