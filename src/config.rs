//! Scene configuration.
//!
//! Every tunable of the diorama lives here. The defaults reproduce the
//! reference scene; a JSON file can override any subset of fields:
//!
//! ```json
//! {
//!     "fireflies": { "ambient_count": 60, "size": 140.0 },
//!     "renderer": { "clear_color": "#101018" }
//! }
//! ```

use std::f32::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fireflies::FieldPolicy;

/// Top-level configuration for the portal scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub fireflies: FireflyConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub renderer: RendererConfig,
}

impl SceneConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse a configuration from JSON text and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check colors and ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_hex_color(&self.renderer.clear_color)?;
        parse_hex_color(&self.renderer.pole_light_color)?;

        if self.renderer.max_pixel_ratio <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "renderer.max_pixel_ratio",
                reason: "must be positive".into(),
            });
        }
        if self.controls.min_distance > self.controls.max_distance {
            return Err(ConfigError::InvalidValue {
                field: "controls.min_distance",
                reason: format!(
                    "{} exceeds max_distance {}",
                    self.controls.min_distance, self.controls.max_distance
                ),
            });
        }
        let damping = self.controls.damping_factor;
        if !(damping > 0.0 && damping <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "controls.damping_factor",
                reason: "must lie in (0, 1]".into(),
            });
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(ConfigError::InvalidValue {
                field: "camera.near",
                reason: "need 0 < near < far".into(),
            });
        }
        Ok(())
    }
}

/// Window creation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial logical width.
    pub width: u32,
    /// Initial logical height.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Portal".into(),
            width: 1280,
            height: 720,
        }
    }
}

/// Locations of the model and its baked lighting texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub model: PathBuf,
    pub baked_texture: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("static/portal.glb"),
            baked_texture: PathBuf::from("static/baked.jpg"),
        }
    }
}

/// Firefly point clouds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireflyConfig {
    /// Particles in the scene-filling field.
    pub ambient_count: u32,
    pub ambient: FieldPolicy,
    /// Particles clustered around the axe handle.
    pub handle_count: u32,
    pub handle: FieldPolicy,
    /// Base point size in drawing-buffer pixels at unit view depth.
    pub size: f32,
}

impl Default for FireflyConfig {
    fn default() -> Self {
        Self {
            ambient_count: 30,
            ambient: FieldPolicy::Ambient {
                half_extent: 2.0,
                height: 1.2,
            },
            handle_count: 10,
            handle: FieldPolicy::Cluster {
                min: 1.0,
                max: 2.0,
                y: 0.0,
            },
            size: 100.0,
        }
    }
}

/// Perspective camera parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::new(2.0, 4.0, 4.0),
            target: Vec3::ZERO,
        }
    }
}

/// Orbit control limits and damping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    /// Fraction of the remaining motion applied per frame.
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limit in radians measured from straight up.
    pub max_polar_angle: f32,
    /// Radians of rotation per dragged pixel.
    pub rotate_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 2.0,
            max_distance: 10.0,
            // Keep the camera above the ground plane.
            max_polar_angle: FRAC_PI_2 - 0.2,
            rotate_speed: 0.005,
        }
    }
}

/// Output surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// sRGB background color as `#rrggbb`.
    pub clear_color: String,
    /// sRGB emissive color of both pole lights.
    pub pole_light_color: String,
    /// Upper bound for the device pixel ratio.
    pub max_pixel_ratio: f32,
    /// Enable 4x multisampling.
    pub antialias: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: "#0e0e0e".into(),
            pole_light_color: "#ffffe5".into(),
            max_pixel_ratio: 2.0,
            antialias: true,
        }
    }
}

/// Parse `#rrggbb` into sRGB components in `[0, 1]`.
pub fn parse_hex_color(hex: &str) -> Result<[f32; 3], ConfigError> {
    let invalid = || ConfigError::InvalidColor(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }

    let mut rgb = [0.0; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        *channel = byte as f32 / 255.0;
    }
    Ok(rgb)
}

/// Convert one sRGB-encoded channel to linear light.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
