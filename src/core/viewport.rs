//! Output surface size and pointer position.

/// Size of the drawing surface and the last cursor position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width
    pub width: f32,
    /// Logical height
    pub height: f32,
    /// Device scale factor reported by the window system
    pub scale_factor: f32,
    pub pixel_ratio_cap: f32,
    /// Cursor in `-0.5..=0.5`, +Y up
    pub cursor: (f32, f32),
}

impl Viewport {
    pub fn new(width: f32, height: f32, scale_factor: f32, pixel_ratio_cap: f32) -> Self {
        Self {
            width,
            height,
            scale_factor,
            pixel_ratio_cap,
            cursor: (0.0, 0.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.scale_factor.min(self.pixel_ratio_cap)
    }

    /// Output surface size in physical pixels, never zero.
    pub fn surface_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        (
            ((self.width * ratio).round() as u32).max(1),
            ((self.height * ratio).round() as u32).max(1),
        )
    }

    pub fn resize(&mut self, width: f32, height: f32, scale_factor: f32) {
        self.width = width;
        self.height = height;
        self.scale_factor = scale_factor;
    }

    /// Record a cursor position given in logical pixels.
    pub fn set_cursor(&mut self, x: f32, y: f32) {
        if self.width > 0.0 && self.height > 0.0 {
            self.cursor = (x / self.width - 0.5, -(y / self.height - 0.5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_ratio_capped() {
        let vp = Viewport::new(800.0, 600.0, 3.0, 2.0);
        assert_eq!(vp.pixel_ratio(), 2.0);
        assert_eq!(vp.surface_size(), (1600, 1200));
    }

    #[test]
    fn test_cursor_normalized() {
        let mut vp = Viewport::new(800.0, 600.0, 1.0, 2.0);
        vp.set_cursor(800.0, 0.0);
        assert_eq!(vp.cursor, (0.5, 0.5));
        vp.set_cursor(400.0, 300.0);
        assert_eq!(vp.cursor, (0.0, 0.0));
    }

    #[test]
    fn test_zero_size_surface_clamped() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 2.0);
        assert_eq!(vp.surface_size(), (1, 1));
        assert_eq!(vp.aspect(), 1.0);
    }
}
