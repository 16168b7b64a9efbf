//! Transform gizmo used by the move tool.
//!
//! [`DragGizmo`] is the built-in implementation: transforms are computed
//! relative to the node's transform at drag start, so the result always
//! equals start + total pointer delta * sensitivity, with no accumulation
//! drift. Translation follows the camera's view plane so the node tracks the
//! cursor from any angle.

use std::fmt;

use glam::{Quat, Vec2, Vec3};
use tracing::debug;

use crate::camera::PickCamera;
use crate::error::{InteractionError, Result};
use crate::scene::{NodeId, NodeTransform, SceneGraph};

/// Which transform a drag applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

impl GizmoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GizmoMode::Translate => "translate",
            GizmoMode::Rotate => "rotate",
            GizmoMode::Scale => "scale",
        }
    }
}

impl fmt::Display for GizmoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transform-gizmo collaborator
pub trait TransformGizmo {
    fn attach(&mut self, node: NodeId);
    fn detach(&mut self);
    fn attached(&self) -> Option<NodeId>;
    fn set_mode(&mut self, mode: GizmoMode);
    fn mode(&self) -> GizmoMode;
    fn is_dragging(&self) -> bool;

    /// Start dragging the attached node. Returns false when nothing is attached.
    fn begin_drag(&mut self, scene: &SceneGraph, pointer: Vec2) -> bool;

    /// Apply the transform for the current pointer position
    fn update_drag(&mut self, scene: &mut SceneGraph, camera: &PickCamera, pointer: Vec2) -> Result<()>;

    fn end_drag(&mut self);
}

/// Pointer and node state captured when a drag starts
#[derive(Debug, Clone, Copy)]
struct DragStart {
    pointer: Vec2,
    transform: NodeTransform,
}

/// Screen-drag gizmo
#[derive(Debug)]
pub struct DragGizmo {
    target: Option<NodeId>,
    mode: GizmoMode,
    drag: Option<DragStart>,
    /// World units (or radians, or scale factor) per pixel of pointer travel
    sensitivity: f32,
}

impl Default for DragGizmo {
    fn default() -> Self {
        Self {
            target: None,
            mode: GizmoMode::Translate,
            drag: None,
            sensitivity: 0.01,
        }
    }
}

impl TransformGizmo for DragGizmo {
    fn attach(&mut self, node: NodeId) {
        if self.target != Some(node) {
            self.drag = None;
            self.target = Some(node);
        }
    }

    fn detach(&mut self) {
        self.target = None;
        self.drag = None;
    }

    fn attached(&self) -> Option<NodeId> {
        self.target
    }

    fn set_mode(&mut self, mode: GizmoMode) {
        self.mode = mode;
    }

    fn mode(&self) -> GizmoMode {
        self.mode
    }

    fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn begin_drag(&mut self, scene: &SceneGraph, pointer: Vec2) -> bool {
        let Some(node) = self.target.and_then(|id| scene.node(id)) else {
            return false;
        };
        self.drag = Some(DragStart {
            pointer,
            transform: node.transform,
        });
        debug!("Gizmo {} drag started on {:?}", self.mode, node.id);
        true
    }

    fn update_drag(&mut self, scene: &mut SceneGraph, camera: &PickCamera, pointer: Vec2) -> Result<()> {
        let (Some(target), Some(start)) = (self.target, self.drag) else {
            return Ok(());
        };
        let node = scene.node(target).ok_or(InteractionError::NodeNotFound(target))?;

        let delta = pointer - start.pointer;
        let original = start.transform;
        let mut transform = original;

        match self.mode {
            GizmoMode::Translate => {
                let camera_right = camera.world_from_view.transform_vector3(Vec3::X).normalize_or_zero();
                let camera_up = camera.world_from_view.transform_vector3(Vec3::Y).normalize_or_zero();
                // Screen y grows downward
                let world_move = (camera_right * delta.x - camera_up * delta.y) * self.sensitivity;

                // Express the world-space move in the parent's space
                let local_move = match node.parent.and_then(|p| scene.world_transform(p)) {
                    Some(parent_world) => parent_world.inverse().transform_vector3(world_move),
                    None => world_move,
                };
                transform.translation = original.translation + local_move;
            }
            GizmoMode::Rotate => {
                let angle = delta.x * self.sensitivity;
                transform.rotation = (Quat::from_rotation_y(angle) * original.rotation).normalize();
            }
            GizmoMode::Scale => {
                let factor = (1.0 + (delta.x - delta.y) * self.sensitivity).max(0.01);
                transform.scale = original.scale * factor;
            }
        }

        scene.set_transform(target, transform)
    }

    fn end_drag(&mut self) {
        if self.drag.take().is_some() {
            debug!("Gizmo drag finished");
        }
    }
}
