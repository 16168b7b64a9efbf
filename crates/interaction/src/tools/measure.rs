//! Two-click distance measurement with a live preview line.

use glam::Vec3;
use tracing::{debug, warn};

use crate::effects::color;
use crate::lifecycle;
use crate::resources::{Geometry, Material};
use crate::scene::{NodeDesc, NodeId};

use super::{PointerEvent, ToolAction, ToolContext};

/// Progress of the measurement in hand
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MeasureState {
    #[default]
    Idle,
    Started {
        start: Vec3,
    },
}

#[derive(Debug, Default)]
pub struct MeasureTool {
    state: MeasureState,
    /// Helper line drawn from the start point to the pointer
    preview: Option<NodeId>,
}

impl MeasureTool {
    pub fn state(&self) -> MeasureState {
        self.state
    }

    pub fn preview(&self) -> Option<NodeId> {
        self.preview
    }

    pub fn on_click(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        let Some(point) = ctx.ground_point(event.position) else {
            return;
        };

        match self.state {
            MeasureState::Idle => {
                debug!("Measurement started at {:?}", point);
                self.state = MeasureState::Started { start: point };
                ctx.actions.push(ToolAction::MeasurementStarted(point));
            }
            MeasureState::Started { start } => {
                self.clear_preview(ctx);
                self.state = MeasureState::Idle;
                ctx.actions.push(ToolAction::MeasurementCreated { start, end: point });
            }
        }
    }

    pub fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        let MeasureState::Started { start } = self.state else {
            return;
        };
        let Some(end) = ctx.ground_point(event.position) else {
            return;
        };

        self.update_preview(ctx, start, end);
        ctx.actions.push(ToolAction::MeasurementPreview { start, end });
    }

    /// Right-click: abandon the measurement without emitting it
    pub fn cancel(&mut self, ctx: &mut ToolContext<'_>, _event: PointerEvent) {
        if self.state != MeasureState::Idle {
            debug!("Measurement cancelled");
            self.reset(ctx);
            ctx.actions.push(ToolAction::MeasurementCancelled);
        }
    }

    pub fn reset(&mut self, ctx: &mut ToolContext<'_>) {
        self.clear_preview(ctx);
        self.state = MeasureState::Idle;
    }

    fn update_preview(&mut self, ctx: &mut ToolContext<'_>, start: Vec3, end: Vec3) {
        let existing = self
            .preview
            .filter(|id| ctx.scene.contains(*id))
            .and_then(|id| ctx.scene.node(id)?.renderable.as_ref().map(|r| r.geometry));

        if let Some(handle) = existing
            && let Some(geometry) = ctx.scene.resources_mut().geometry_mut(handle)
        {
            geometry.positions = vec![start, end];
            return;
        }

        let style = &ctx.config.overlay;
        let resources = ctx.scene.resources_mut();
        let geometry = resources.add_geometry(Geometry::line_list(vec![start, end]));
        let material = resources.add_material(
            Material::overlay(color(style.measurement_color))
                .with_line_width(style.highlight_line_width)
                .with_dash(style.dash_size, style.gap_size),
        );

        let root = ctx.scene.root();
        let desc = NodeDesc::overlay("measurement preview", geometry, material)
            .with_render_order(style.selection_render_order);
        match ctx.scene.add(root, desc) {
            Ok(id) => self.preview = Some(id),
            Err(err) => warn!("Failed to add measurement preview: {}", err),
        }
    }

    fn clear_preview(&mut self, ctx: &mut ToolContext<'_>) {
        if let Some(preview) = self.preview.take()
            && let Err(err) = lifecycle::remove_and_dispose(ctx.scene, preview)
        {
            warn!("Failed to remove measurement preview: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::super::test_support::{Fixture, VIEWPORT};
    use super::*;

    #[test]
    fn test_two_clicks_emit_measurement() {
        let mut fixture = Fixture::new();
        let mut tool = MeasureTool::default();

        tool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        assert!(matches!(tool.state(), MeasureState::Started { .. }));

        tool.on_click(&mut fixture.ctx(), PointerEvent::at(Vec2::new(600.0, 350.0)));
        assert_eq!(tool.state(), MeasureState::Idle);

        let created = fixture
            .actions
            .iter()
            .find_map(|a| match a {
                ToolAction::MeasurementCreated { start, end } => Some((*start, *end)),
                _ => None,
            })
            .unwrap();
        assert!(created.0.length() < 1e-3);
        assert!(created.0.distance(created.1) > 0.1);
    }

    #[test]
    fn test_preview_then_right_click_cancels() {
        let mut fixture = Fixture::new();
        let baseline = fixture.scene.resources().live_counts();
        let mut tool = MeasureTool::default();

        tool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        tool.on_pointer_move(&mut fixture.ctx(), PointerEvent::at(Vec2::new(500.0, 300.0)));
        tool.on_pointer_move(&mut fixture.ctx(), PointerEvent::at(Vec2::new(520.0, 310.0)));

        let preview = tool.preview().unwrap();
        assert_eq!(fixture.scene.root_child_count(), 1);
        assert!(fixture
            .actions
            .iter()
            .any(|a| matches!(a, ToolAction::MeasurementPreview { .. })));

        tool.cancel(&mut fixture.ctx(), PointerEvent::default());
        assert_eq!(tool.state(), MeasureState::Idle);
        assert!(!fixture.scene.contains(preview));
        assert_eq!(fixture.scene.resources().live_counts(), baseline);
        assert!(!fixture
            .actions
            .iter()
            .any(|a| matches!(a, ToolAction::MeasurementCreated { .. })));
    }

    #[test]
    fn test_reset_discards_start_point() {
        let mut fixture = Fixture::new();
        let mut tool = MeasureTool::default();

        tool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        tool.reset(&mut fixture.ctx());
        tool.reset(&mut fixture.ctx());
        assert_eq!(tool.state(), MeasureState::Idle);

        // The next click starts over instead of finishing
        fixture.actions.clear();
        tool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        assert!(matches!(fixture.actions[..], [ToolAction::MeasurementStarted(_)]));
    }
}
