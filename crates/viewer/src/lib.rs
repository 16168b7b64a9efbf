//! Bevy viewer for Vista
//!
//! Owns the interaction scene graph and controller as a resource, feeds
//! window input into the controller, mirrors triangle geometry into Bevy
//! meshes (overlays through a second camera), and draws line overlays with
//! gizmos.

use bevy::ecs::message::Message;
use bevy::prelude::*;
use vista_config::InteractionConfig;
use vista_interaction::{InteractionController, InteractionEvent, SceneGraph};

mod camera;
mod input;
mod mirror;
mod overlay_camera;
mod overlay_draw;

pub use camera::{CameraControllerPlugin, MainCamera, OrbitCamera, pick_camera};
pub use input::{InteractionInputPlugin, PointerState};
pub use mirror::{MirroredNode, SceneMirror, SceneMirrorPlugin, render_layers, to_bevy_mesh, to_standard_material};
pub use overlay_camera::{OVERLAY_LAYER, OverlayCamera, OverlayCameraPlugin};
pub use overlay_draw::{OverlayDrawPlugin, OverlayGizmos, dash_pieces};

/// Ordering of the viewer's per-frame work
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Window input into the controller
    Input,
    /// Controller frame: hover pick, effects, notifications
    Frame,
    /// Scene graph to Bevy entities
    Mirror,
    /// Immediate-mode line drawing
    Draw,
}

/// The interaction scene and the controller that works on it
#[derive(Resource)]
pub struct InteractionLayer {
    pub scene: SceneGraph,
    pub controller: InteractionController,
}

impl InteractionLayer {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            scene: SceneGraph::new(),
            controller: InteractionController::new(config),
        }
    }
}

impl Default for InteractionLayer {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

/// Message for controller notifications (points, measurements, selection, tool)
#[derive(Message, Debug, Clone)]
pub struct InteractionNotice(pub InteractionEvent);

/// Everything needed to view and interact with an [`InteractionLayer`] scene.
///
/// Uses an existing [`InteractionConfig`] resource when one was inserted,
/// otherwise loads it from the environment.
pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<InteractionConfig>()
            .cloned()
            .unwrap_or_else(InteractionConfig::from_env);

        app.insert_resource(InteractionLayer::new(config.clone()))
            .insert_resource(config)
            .add_message::<InteractionNotice>()
            .configure_sets(
                Update,
                (ViewerSet::Input, ViewerSet::Frame, ViewerSet::Mirror, ViewerSet::Draw).chain(),
            );

        app.add_plugins(CameraControllerPlugin);
        app.add_plugins(InteractionInputPlugin);
        app.add_plugins(SceneMirrorPlugin);
        app.add_plugins(OverlayCameraPlugin);
        app.add_plugins(OverlayDrawPlugin);
    }
}
