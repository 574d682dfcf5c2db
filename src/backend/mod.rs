//! Display backends.

#[cfg(feature = "winit-backend")]
pub mod wgpu;

use crate::core::camera::PerspectiveCamera;
use crate::core::error::DisplayResult;
use crate::core::scene::Scene;

/// Something that can draw a [`Scene`] seen through a camera.
pub trait DisplayBackend {
    /// Render one frame and present it.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> DisplayResult<()>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Resize the output surface, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Enable or disable vertical sync.
    fn set_vsync(&mut self, enabled: bool);
}
