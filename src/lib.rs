//! Clockview: a 3D wall clock viewer.
//!
//! Loads a glTF clock, lights it with a shadow casting sun, turns its
//! hands to the local time and offers a small settings panel for the
//! case color, background color and wireframe mode. Runs natively and
//! in the browser (feature `web`).

pub mod backend;
pub mod core;
pub mod loader;

#[cfg(feature = "web")]
pub mod web;

#[cfg(all(target_arch = "wasm32", not(feature = "web")))]
compile_error!("the browser build needs the `web` feature");

pub use crate::core::config::ViewerConfig;
pub use crate::core::error::{DisplayError, DisplayResult};
pub use crate::core::viewer::ClockViewer;

#[cfg(feature = "winit-backend")]
pub use crate::backend::wgpu::WinitBackend;

/// Open the viewer window and run until it is closed.
#[cfg(feature = "winit-backend")]
pub fn run(config: ViewerConfig) -> DisplayResult<()> {
    let event_loop = winit::event_loop::EventLoop::new()?;
    let mut backend = WinitBackend::new(config);
    event_loop.run_app(&mut backend)?;
    Ok(())
}

/// Browser entry point.
#[cfg(all(target_arch = "wasm32", feature = "web"))]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("logger init failed: {}", e).into());
    }

    let mut config = ViewerConfig::new();
    // External .bin buffers cannot be resolved from memory.
    config.model.path = "assets/gltf/clock.glb".to_string();

    if let Err(e) = run(config) {
        log::error!("Clockview failed: {}", e);
    }
}
