//! Winit + wgpu GPU-accelerated display backend.

mod backend;
mod gpu_mesh;
mod panel;
mod pipelines;
mod renderer;
mod vertex;

pub use backend::WinitBackend;
pub use panel::SettingsPanel;
pub use renderer::{Overlay, WgpuRenderer};
