//! Shared value types.

use glam::{Mat4, Quat, Vec3};

use crate::core::error::{DisplayError, DisplayResult};

/// RGBA color with float components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from a packed `0xRRGGBB` value.
    pub fn from_u32(rgb: u32) -> Self {
        Self::from_rgb8(
            ((rgb >> 16) & 0xff) as u8,
            ((rgb >> 8) & 0xff) as u8,
            (rgb & 0xff) as u8,
        )
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Parse `#rgb`, `#rrggbb`, `0xrrggbb` or a bare `rrggbb` string.
    pub fn from_hex(s: &str) -> DisplayResult<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DisplayError::InvalidColor(s.to_string()));
        }

        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return Err(DisplayError::InvalidColor(s.to_string())),
        };

        u32::from_str_radix(&expanded, 16)
            .map(Self::from_u32)
            .map_err(|_| DisplayError::InvalidColor(s.to_string()))
    }

    /// Lowercase `#rrggbb` representation.
    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Convert from sRGB-encoded components to linear light.
    pub fn to_linear(&self) -> Self {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Approximate equality, used when comparing parsed colors.
    pub fn approx_eq(&self, other: &Color) -> bool {
        const EPS: f32 = 1e-5;
        (self.r - other.r).abs() < EPS
            && (self.g - other.g).abs() < EPS
            && (self.b - other.b).abs() < EPS
            && (self.a - other.a).abs() < EPS
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Translation / rotation / scale of a scene node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Euler angles in XYZ order (radians).
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(glam::EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler(glam::EulerRot::XYZ, euler.x, euler.y, euler.z);
    }

    pub fn set_euler_x(&mut self, angle: f32) {
        let mut euler = self.euler();
        euler.x = angle;
        self.set_euler(euler);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        let long = Color::from_hex("#4e99FF").unwrap();
        assert_eq!(long.to_rgb8(), [0x4e, 0x99, 0xff]);

        let short = Color::from_hex("#fff").unwrap();
        assert!(short.approx_eq(&Color::WHITE));

        let prefixed = Color::from_hex("0x11141e").unwrap();
        assert_eq!(prefixed.to_hex(), "#11141e");
    }

    #[test]
    fn test_reject_invalid_hex() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
        assert!(Color::from_hex("").is_err());
    }

    #[test]
    fn test_linear_conversion_endpoints() {
        assert!(Color::BLACK.to_linear().approx_eq(&Color::BLACK));
        assert!(Color::WHITE.to_linear().approx_eq(&Color::WHITE));
        let mid = Color::rgb(0.5, 0.5, 0.5).to_linear();
        assert!(mid.r < 0.5 && mid.r > 0.2);
    }

    #[test]
    fn test_set_euler_x_keeps_y() {
        let mut t = Transform::IDENTITY;
        t.set_euler(Vec3::new(0.0, -0.5, 0.0));
        t.set_euler_x(0.3);
        let e = t.euler();
        assert!((e.x - 0.3).abs() < 1e-4);
        assert!((e.y + 0.5).abs() < 1e-4);
        assert!(e.z.abs() < 1e-4);
    }
}
