//! Shared configuration for Vista
//!
//! This crate is the single source of truth for window dimensions, overlay
//! styling, and the tuning values the interaction layer runs with. Every
//! struct deserializes with per-field defaults so a partial JSON file only
//! overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default window width in pixels
pub const DEFAULT_WIDTH: u32 = 1600;

/// Default window height in pixels
pub const DEFAULT_HEIGHT: u32 = 900;

/// Default scale factor (1.0 = no scaling)
pub const DEFAULT_SCALE: f32 = 1.0;

/// Environment variable naming a JSON file with an [`InteractionConfig`]
pub const CONFIG_ENV_VAR: &str = "VISTA_CONFIG";

/// Errors raised while loading configuration from disk
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Display configuration for window and rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct DisplayConfig {
    /// Window width in logical pixels
    pub width: u32,
    /// Window height in logical pixels
    pub height: u32,
    /// Scale factor for DPI scaling
    pub scale: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: DEFAULT_SCALE,
        }
    }
}

/// Colours, opacities, and draw ordering for hover/selection overlays.
///
/// Colours are linear RGBA in 0.0-1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Edge outline drawn while a mesh is hovered
    pub hover_color: [f32; 4],
    /// Edge outline drawn while a mesh is selected
    pub selection_color: [f32; 4],
    /// Bounding-box wireframe drawn around a selected mesh
    pub bounds_color: [f32; 4],
    /// Translucent halo drawn around a selected point marker
    pub marker_halo_color: [f32; 4],
    /// Tint swapped onto a point marker's material while hovered
    pub marker_hover_color: [f32; 4],
    /// Colour of highlighted measurement lines and end points
    pub measurement_color: [f32; 4],
    /// Render order of hover overlays
    pub hover_render_order: i32,
    /// Render order of selection overlays (must exceed the hover order)
    pub selection_render_order: i32,
    /// Halo radius as a multiple of the marker's own radius
    pub marker_halo_scale: f32,
    /// End-point highlight radius as a multiple of the child marker radius
    pub measurement_point_scale: f32,
    /// Line width used for highlighted measurement lines
    pub highlight_line_width: f32,
    /// Dash length for highlighted measurement lines
    pub dash_size: f32,
    /// Gap length for highlighted measurement lines
    pub gap_size: f32,
    /// Crease angle (degrees) above which a mesh edge is part of the outline
    pub outline_crease_degrees: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            hover_color: [0.25, 0.75, 1.0, 0.6],
            selection_color: [1.0, 0.55, 0.0, 0.9],
            bounds_color: [1.0, 0.9, 0.2, 0.8],
            marker_halo_color: [1.0, 0.55, 0.0, 0.35],
            marker_hover_color: [0.4, 0.85, 1.0, 1.0],
            measurement_color: [1.0, 0.55, 0.0, 1.0],
            hover_render_order: 998,
            selection_render_order: 999,
            marker_halo_scale: 1.8,
            measurement_point_scale: 1.6,
            highlight_line_width: 3.0,
            dash_size: 0.1,
            gap_size: 0.05,
            outline_crease_degrees: 30.0,
        }
    }
}

/// Bounded retry policy for collaborators that appear after startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupRetryConfig {
    /// Delay between availability polls in milliseconds
    pub interval_ms: u64,
    /// Number of polls before giving up
    pub max_attempts: u32,
}

impl Default for SetupRetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_attempts: 50,
        }
    }
}

/// Tuning for picking, tools, and pooled primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct InteractionConfig {
    /// Overlay appearance
    pub overlay: OverlayStyle,
    /// Collaborator availability polling
    pub setup_retry: SetupRetryConfig,
    /// Instances each primitive pool creates up front
    pub pool_prewarm: usize,
    /// Height of the reference plane used by the point and measure tools
    pub ground_height: f32,
    /// Pointer travel (pixels) after which a press becomes a drag
    pub drag_threshold_px: f32,
    /// World-space distance within which a ray hits a line segment
    pub line_pick_threshold: f32,
    /// Radius used to pick point markers that carry no mesh
    pub point_pick_radius: f32,
    /// Radius of point markers created by the point and measure tools
    pub marker_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            overlay: OverlayStyle::default(),
            setup_retry: SetupRetryConfig::default(),
            pool_prewarm: 5,
            ground_height: 0.0,
            drag_threshold_px: 4.0,
            line_pick_threshold: 0.05,
            point_pick_radius: 0.08,
            marker_radius: 0.06,
        }
    }
}

impl InteractionConfig {
    /// Parse a config from a JSON string; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Load the file named by `VISTA_CONFIG`, falling back to defaults.
    ///
    /// A missing variable is silent; an unreadable or malformed file is logged.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded interaction config from {}", path);
                config
            }
            Err(err) => {
                tracing::warn!("{}; using default interaction config", err);
                Self::default()
            }
        }
    }
}
