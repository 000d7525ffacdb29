use std::env;

use glam::Vec3;

use crate::treatment::{Palette, Treatment};

/// Environment variable overriding [`ViewerConfig::default_model`]. An empty
/// value disables the startup load.
pub const DEFAULT_MODEL_ENV: &str = "VIEWER_MODEL";

/// Where the bundled converter writes its output.
pub const DEFAULT_MODEL_PATH: &str = "model/model.glb";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Degrees from straight up.
    pub min_polar_angle: f32,
    /// Degrees from straight up. 90 keeps the camera above the horizon.
    pub max_polar_angle: f32,
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 0.5,
            max_distance: 500.0,
            min_polar_angle: 1.0,
            max_polar_angle: 90.0,
        }
    }
}

/// Placement applied to every loaded subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtreeParams {
    pub scale: f32,
    pub translation: Vec3,
}

impl Default for SubtreeParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub subtree: SubtreeParams,

    pub fov_y: f32,
    pub znear: f32,
    pub zfar: f32,
    pub initial_distance: f32,
    pub orbit_limits: OrbitLimits,
    /// Degrees per pixel dragged.
    pub rotate_speed: f32,
    /// Fraction of the orbit distance per pixel dragged.
    pub pan_speed: f32,
    /// Fraction of the orbit distance per wheel line.
    pub zoom_speed: f32,
    /// Exponential approach rate per second. Zero disables damping.
    pub damping: f32,
    /// Pointer travel in physical pixels below which a press counts as a click.
    pub click_threshold: f32,

    pub hover_treatment: Treatment,
    pub default_treatment: Treatment,
    pub palette: Palette,

    pub background_color: [f32; 3],
    pub light_direction: Vec3,

    pub default_model: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            subtree: SubtreeParams::default(),
            fov_y: 45.0,
            znear: 0.05,
            zfar: 5000.0,
            initial_distance: 5.0,
            orbit_limits: OrbitLimits::default(),
            rotate_speed: 0.3,
            pan_speed: 0.002,
            zoom_speed: 0.1,
            damping: 12.0,
            click_threshold: 4.0,
            hover_treatment: Treatment::hover(),
            default_treatment: Treatment::default_gray(),
            palette: Palette::default(),
            background_color: [0.1, 0.1, 0.1],
            light_direction: Vec3::new(2.0, 3.0, 2.0),
            default_model: Some(DEFAULT_MODEL_PATH.to_string()),
        }
    }
}

impl ViewerConfig {
    /// Defaults, with the startup model taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(model) = env::var(DEFAULT_MODEL_ENV) {
            config.default_model = Some(model).filter(|model| !model.trim().is_empty());
        }
        config
    }
}
