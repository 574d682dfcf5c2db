//! Viewer configuration system.
//!
//! Provides user-configurable viewer settings that can be overridden
//! from the command line via `--name=value` options.

use glam::Vec3;

use crate::core::error::{DisplayError, DisplayResult};
use crate::core::types::Color;

/// Master viewer configuration
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Perspective camera settings
    pub camera: CameraConfig,

    /// Orbit control settings
    pub controls: ControlsConfig,

    /// Ambient and fill light settings
    pub lighting: LightingConfig,

    /// Shadow map settings
    pub shadows: ShadowConfig,

    /// Clock model placement and node names
    pub model: ModelConfig,

    /// Settings panel layout and initial values
    pub panel: PanelConfig,

    /// Largest device pixel ratio used for the output surface
    pub pixel_ratio_cap: f32,

    /// Wait for vertical blank when presenting
    pub vsync: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lighting: LightingConfig::default(),
            shadows: ShadowConfig::default(),
            model: ModelConfig::default(),
            panel: PanelConfig::default(),
            pixel_ratio_cap: 2.0,
            vsync: true,
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Perspective camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Initial camera position
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, 6.0),
        }
    }
}

/// Orbit control configuration
#[derive(Debug, Clone)]
pub struct ControlsConfig {
    pub damping: bool,

    /// Fraction of the pending motion applied per frame (0.0 - 1.0)
    pub damping_factor: f32,

    pub min_distance: f32,

    /// Defaults to the initial camera distance when unset
    pub max_distance: Option<f32>,

    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping: true,
            damping_factor: 0.05,
            min_distance: 4.0,
            max_distance: None,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

/// Scene light configuration
#[derive(Debug, Clone)]
pub struct LightingConfig {
    pub ambient_color: Color,
    pub ambient_intensity: f32,

    /// Directional fill light placed behind the clock
    pub fill_color: Color,
    pub fill_intensity: f32,
    pub fill_position: Vec3,

    /// Name of the model light that casts the clock shadows
    pub sun_name: String,
    pub sun_intensity: f32,
    pub sun_scale: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: Color::WHITE,
            ambient_intensity: 1.0,
            fill_color: Color::WHITE,
            fill_intensity: 1.0,
            fill_position: Vec3::new(0.0, 2.0, -5.0),
            sun_name: "Sun".to_string(),
            sun_intensity: 10.0,
            sun_scale: 0.5,
        }
    }
}

/// Shadow map configuration
#[derive(Debug, Clone)]
pub struct ShadowConfig {
    pub enabled: bool,

    /// Square shadow map resolution in texels
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    pub bias: f32,

    /// Half width of the orthographic shadow frustum
    pub frustum_half_extent: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            map_size: 2048 * 2,
            near: 0.1,
            far: 40.0,
            bias: -0.001,
            frustum_half_extent: 5.0,
        }
    }
}

/// Clock model configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Path (or URL on the web) of the glTF asset
    pub path: String,

    /// Uniform scale applied to the loaded model
    pub scale: f32,

    /// Rotation about X applied to the loaded model, radians
    pub tilt: f32,

    pub hour_hand: String,
    pub minute_hand: String,
    pub second_hand: String,

    /// Mesh node and material recolored by the case color picker
    pub case_node: String,
    pub case_material: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "assets/gltf/clock.gltf".to_string(),
            scale: 2.0,
            tilt: std::f32::consts::FRAC_PI_2,
            hour_hand: "heure".to_string(),
            minute_hand: "minute".to_string(),
            second_hand: "seconde".to_string(),
            case_node: "Circle".to_string(),
            case_material: "block texture".to_string(),
        }
    }
}

/// Settings panel configuration
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub title: String,

    /// Show the wireframe checkbox
    pub wireframe_toggle: bool,

    pub case_color: String,
    pub background: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            title: "Clock Controller".to_string(),
            wireframe_toggle: true,
            case_color: "#4e99FF".to_string(),
            background: "#11141e".to_string(),
        }
    }
}

/// Builder for viewer config from string options
impl ViewerConfig {
    /// Set option by name (for command line integration)
    pub fn set_option(&mut self, name: &str, value: &str) -> DisplayResult<()> {
        let invalid = || DisplayError::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
        };

        match name {
            "model" | "model-path" => self.model.path = value.to_string(),
            "model-scale" => self.model.scale = parse_f32(value).ok_or_else(invalid)?,

            "camera-fov" | "fov" => {
                self.camera.fov = parse_f32(value).ok_or_else(invalid)?.clamp(1.0, 179.0)
            }
            "camera-distance" => {
                let distance = parse_f32(value).ok_or_else(invalid)?;
                if distance <= 0.0 {
                    return Err(invalid());
                }
                self.camera.position = Vec3::new(0.0, 0.0, distance);
            }

            "damping" => self.controls.damping = parse_bool(value).ok_or_else(invalid)?,
            "damping-factor" => {
                self.controls.damping_factor =
                    parse_f32(value).ok_or_else(invalid)?.clamp(0.001, 1.0)
            }
            "min-distance" => {
                let distance = parse_f32(value).ok_or_else(invalid)?;
                if distance <= 0.0 {
                    return Err(invalid());
                }
                self.controls.min_distance = distance;
            }
            "max-distance" => {
                self.controls.max_distance = Some(parse_f32(value).ok_or_else(invalid)?)
            }

            "shadows" => self.shadows.enabled = parse_bool(value).ok_or_else(invalid)?,
            "shadow-map-size" => {
                let size = value.parse::<u32>().map_err(|_| invalid())?;
                self.shadows.map_size = size.clamp(256, 8192);
            }
            "shadow-bias" => self.shadows.bias = parse_f32(value).ok_or_else(invalid)?,

            "ambient-intensity" => {
                self.lighting.ambient_intensity = parse_f32(value).ok_or_else(invalid)?
            }
            "sun-intensity" => self.lighting.sun_intensity = parse_f32(value).ok_or_else(invalid)?,

            "case-color" | "colors" => {
                Color::from_hex(value)?;
                self.panel.case_color = value.to_string();
            }
            "background" => {
                Color::from_hex(value)?;
                self.panel.background = value.to_string();
            }
            "wireframe-toggle" => {
                self.panel.wireframe_toggle = parse_bool(value).ok_or_else(invalid)?
            }
            "title" => self.panel.title = value.to_string(),

            "pixel-ratio-cap" => {
                self.pixel_ratio_cap = parse_f32(value).ok_or_else(invalid)?.max(0.5)
            }
            "vsync" => self.vsync = parse_bool(value).ok_or_else(invalid)?,

            _ => return Err(DisplayError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    /// Get option value as string
    pub fn get_option(&self, name: &str) -> Option<String> {
        match name {
            "model" | "model-path" => Some(self.model.path.clone()),
            "model-scale" => Some(self.model.scale.to_string()),
            "camera-fov" | "fov" => Some(self.camera.fov.to_string()),
            "camera-distance" => Some(self.camera.position.length().to_string()),
            "damping" => Some(self.controls.damping.to_string()),
            "damping-factor" => Some(self.controls.damping_factor.to_string()),
            "min-distance" => Some(self.controls.min_distance.to_string()),
            "max-distance" => Some(self.max_distance().to_string()),
            "shadows" => Some(self.shadows.enabled.to_string()),
            "shadow-map-size" => Some(self.shadows.map_size.to_string()),
            "shadow-bias" => Some(self.shadows.bias.to_string()),
            "ambient-intensity" => Some(self.lighting.ambient_intensity.to_string()),
            "sun-intensity" => Some(self.lighting.sun_intensity.to_string()),
            "case-color" | "colors" => Some(self.panel.case_color.clone()),
            "background" => Some(self.panel.background.clone()),
            "wireframe-toggle" => Some(self.panel.wireframe_toggle.to_string()),
            "title" => Some(self.panel.title.clone()),
            "pixel-ratio-cap" => Some(self.pixel_ratio_cap.to_string()),
            "vsync" => Some(self.vsync.to_string()),
            _ => None,
        }
    }

    /// Farthest orbit distance; the starting camera distance unless overridden.
    pub fn max_distance(&self) -> f32 {
        self.controls
            .max_distance
            .unwrap_or_else(|| self.camera.position.length())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_f32(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::new();
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.controls.min_distance, 4.0);
        assert!((config.max_distance() - 6.0).abs() < 1e-6);
        assert_eq!(config.shadows.map_size, 4096);
        assert_eq!(config.pixel_ratio_cap, 2.0);
        assert_eq!(config.panel.case_color, "#4e99FF");
    }

    #[test]
    fn test_set_option() {
        let mut config = ViewerConfig::new();

        config.set_option("shadows", "off").unwrap();
        assert!(!config.shadows.enabled);

        config.set_option("model", "clock.glb").unwrap();
        assert_eq!(config.get_option("model").as_deref(), Some("clock.glb"));

        config.set_option("camera-distance", "8").unwrap();
        assert!((config.max_distance() - 8.0).abs() < 1e-6);

        config.set_option("background", "#000").unwrap();
        assert_eq!(config.get_option("background").as_deref(), Some("#000"));

        config.set_option("vsync", "off").unwrap();
        assert!(!config.vsync);
        assert_eq!(config.get_option("vsync").as_deref(), Some("false"));
    }

    #[test]
    fn test_min_distance_must_be_positive() {
        let mut config = ViewerConfig::new();
        for bad in ["0", "-1", "0.0"] {
            assert!(matches!(
                config.set_option("min-distance", bad),
                Err(DisplayError::InvalidOption { .. })
            ));
        }
        assert_eq!(config.controls.min_distance, 4.0);

        config.set_option("min-distance", "2.5").unwrap();
        assert_eq!(config.controls.min_distance, 2.5);
    }

    #[test]
    fn test_clamped_values() {
        let mut config = ViewerConfig::new();
        config.set_option("shadow-map-size", "100000").unwrap();
        assert_eq!(config.shadows.map_size, 8192);
        config.set_option("damping-factor", "5").unwrap();
        assert_eq!(config.controls.damping_factor, 1.0);
    }

    #[test]
    fn test_rejects_bad_options() {
        let mut config = ViewerConfig::new();
        assert!(matches!(
            config.set_option("shadows", "maybe"),
            Err(DisplayError::InvalidOption { .. })
        ));
        assert!(matches!(
            config.set_option("background", "blue-ish"),
            Err(DisplayError::InvalidColor(_))
        ));
        assert!(matches!(
            config.set_option("no-such-option", "1"),
            Err(DisplayError::UnknownOption(_))
        ));
        assert!(config.get_option("no-such-option").is_none());
    }
}
