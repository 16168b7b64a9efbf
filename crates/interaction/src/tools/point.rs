use tracing::debug;

use super::{PointerEvent, ToolAction, ToolContext};

/// Click to place a point on the ground plane
#[derive(Debug, Default, Clone, Copy)]
pub struct PointTool;

impl PointTool {
    pub fn on_click(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        let Some(point) = ctx.ground_point(event.position) else {
            debug!("Point click missed the ground plane");
            return;
        };
        ctx.actions.push(ToolAction::PointCreated(point));
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::super::test_support::{Fixture, VIEWPORT};
    use super::*;
    use crate::camera::PickCamera;

    #[test]
    fn test_two_clicks_create_two_distinct_points() {
        let mut fixture = Fixture::new();

        PointTool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        PointTool.on_click(&mut fixture.ctx(), PointerEvent::at(Vec2::new(600.0, 400.0)));

        let points: Vec<_> = fixture
            .actions
            .iter()
            .map(|action| match action {
                ToolAction::PointCreated(p) => *p,
                other => panic!("unexpected action {other:?}"),
            })
            .collect();
        assert_eq!(points.len(), 2);
        assert!(points[0].distance(points[1]) > 0.1);
        assert!(points.iter().all(|p| p.y.abs() < 1e-4));
        assert!(fixture.selection.is_empty());
    }

    #[test]
    fn test_click_above_horizon_places_nothing() {
        let mut fixture = Fixture::new();
        fixture.camera = PickCamera::perspective_looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, -5.0), 1.0, 1.0);

        PointTool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        assert!(fixture.actions.is_empty());
    }
}
