//! Vista - 3D scene viewer with picking, selection, and measurement tools

use bevy::prelude::*;
use bevy::window::WindowResolution;
use vista_config::{DisplayConfig, InteractionConfig};
use vista_viewer::ViewerPlugin;

mod demo;

fn main() {
    // Display configuration - single source of truth for window size
    let display_config = DisplayConfig::default();
    let interaction_config = InteractionConfig::from_env();

    let window_config = Window {
        title: "Vista".into(),
        resolution: WindowResolution::new(display_config.width, display_config.height),
        present_mode: bevy::window::PresentMode::AutoVsync,
        ..default()
    };

    let mut app = App::new();

    app.insert_resource(display_config)
        .insert_resource(interaction_config);

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(window_config),
                ..default()
            })
            .set(bevy::log::LogPlugin {
                level: bevy::log::Level::INFO,
                filter: "wgpu=error,naga=warn,vista_interaction=debug".into(),
                ..default()
            }),
    );

    app.add_plugins(ViewerPlugin)
        .add_plugins(demo::DemoScenePlugin)
        .run();
}
