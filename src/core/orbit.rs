//! Orbit camera controls.
//!
//! Pointer drags rotate the camera around a target on a sphere, the
//! scroll wheel dollies in and out within a distance range. With damping
//! enabled, motion is eased out over several frames.

use std::f32::consts::PI;

use glam::Vec3;

use crate::core::config::ControlsConfig;

/// Keeps the camera off the poles.
const POLAR_EPSILON: f32 = 1e-6;

/// Spherical coordinates around the target, Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Angle from +Y
    phi: f32,
    /// Angle around Y measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    spherical: Spherical,
    /// Pending rotation (theta, phi) not yet applied.
    delta_theta: f32,
    delta_phi: f32,
    /// Pending multiplicative zoom.
    scale: f32,

    pub damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitControls {
    pub fn new(camera_position: Vec3, target: Vec3, config: &ControlsConfig, max_distance: f32) -> Self {
        let mut controls = Self {
            target,
            spherical: Spherical::from_offset(camera_position - target),
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            damping: config.damping,
            damping_factor: config.damping_factor,
            min_distance: config.min_distance,
            max_distance: max_distance.max(config.min_distance),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
        };
        controls.clamp();
        controls
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.spherical.radius
    }

    /// Current camera position.
    pub fn position(&self) -> Vec3 {
        self.target + self.spherical.to_offset()
    }

    /// Rotate by a pointer drag of `dx`, `dy` pixels on a surface
    /// `viewport_height` pixels high.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= 2.0 * PI * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= 2.0 * PI * dy / viewport_height * self.rotate_speed;
    }

    /// Zoom by wheel notches; positive values move the camera closer.
    pub fn zoom(&mut self, notches: f32) {
        let step = 0.95_f32.powf(self.zoom_speed);
        self.scale *= step.powf(notches);
    }

    /// Apply pending motion. Returns true when the camera moved.
    pub fn update(&mut self) -> bool {
        let before = self.spherical;

        if self.damping {
            self.spherical.theta += self.delta_theta * self.damping_factor;
            self.spherical.phi += self.delta_phi * self.damping_factor;
        } else {
            self.spherical.theta += self.delta_theta;
            self.spherical.phi += self.delta_phi;
        }
        self.spherical.radius *= self.scale;
        self.clamp();

        if self.damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        const MIN_CHANGE: f32 = 1e-6;
        (self.spherical.theta - before.theta).abs() > MIN_CHANGE
            || (self.spherical.phi - before.phi).abs() > MIN_CHANGE
            || (self.spherical.radius - before.radius).abs() > MIN_CHANGE
    }

    fn clamp(&mut self) {
        self.spherical.phi = self.spherical.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.spherical.radius = self.spherical.radius.clamp(self.min_distance, self.max_distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls() -> OrbitControls {
        OrbitControls::new(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, &ControlsConfig::default(), 6.0)
    }

    #[test]
    fn test_initial_position_preserved() {
        let c = controls();
        assert!((c.position() - Vec3::new(0.0, 0.0, 6.0)).length() < 1e-4);
        assert!((c.distance() - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped_to_range() {
        let mut c = controls();
        c.zoom(100.0);
        c.update();
        assert!((c.distance() - 4.0).abs() < 1e-5);

        c.zoom(-100.0);
        c.update();
        assert!((c.distance() - 6.0).abs() < 1e-5);
    }

    #[test]
    fn test_damping_eases_rotation() {
        let mut c = controls();
        c.rotate(100.0, 0.0, 600.0);
        c.update();
        let first = c.position();
        assert!(first.x < 0.0);

        // Remaining motion keeps moving the camera on later frames.
        assert!(c.update());
        assert!(c.position().x < first.x);
        assert!((c.distance() - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_undamped_rotation_applies_at_once() {
        let config = ControlsConfig {
            damping: false,
            ..ControlsConfig::default()
        };
        let mut c = OrbitControls::new(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, &config, 6.0);
        // A quarter turn: dx / height = 1/4.
        c.rotate(-150.0, 0.0, 600.0);
        assert!(c.update());
        assert!((c.position() - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-3);
        assert!(!c.update());
    }

    #[test]
    fn test_polar_angle_clamped() {
        let mut c = controls();
        c.damping = false;
        c.rotate(0.0, 10_000.0, 600.0);
        c.update();
        assert!(c.position().y > 5.99);
        assert!(c.position().is_finite());
    }
}
