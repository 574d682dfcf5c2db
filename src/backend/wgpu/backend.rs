//! Winit window and event handling backend.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use super::panel::SettingsPanel;
use super::renderer::{Overlay, WgpuRenderer};
use crate::backend::DisplayBackend;
use crate::core::clock::ClockTime;
use crate::core::config::ViewerConfig;
use crate::core::error::{DisplayError, DisplayResult};
use crate::core::viewer::ClockViewer;
use crate::loader::ModelLoader;

/// Pixels of trackpad scroll per wheel notch.
const PIXELS_PER_NOTCH: f64 = 50.0;

/// Winit-based window and input backend driving a [`ClockViewer`].
pub struct WinitBackend {
    viewer: ClockViewer,
    loader: ModelLoader,
    panel: SettingsPanel,
    window: Option<Arc<Window>>,
    renderer: Option<WgpuRenderer>,
    /// Renderer still being created (browser only)
    renderer_rx: Option<Receiver<DisplayResult<WgpuRenderer>>>,
    egui_state: Option<egui_winit::State>,
    /// Last cursor position in logical pixels
    cursor: Option<(f32, f32)>,
    dragging: bool,
}

impl WinitBackend {
    pub fn new(config: ViewerConfig) -> Self {
        let panel = SettingsPanel::new(&config.panel);
        Self {
            viewer: ClockViewer::new(config),
            loader: ModelLoader::new(),
            panel,
            window: None,
            renderer: None,
            renderer_rx: None,
            egui_state: None,
            cursor: None,
            dragging: false,
        }
    }

    fn window_attributes(&self) -> WindowAttributes {
        let attributes = Window::default_attributes()
            .with_title("Clockview")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));

        #[cfg(target_arch = "wasm32")]
        let attributes = {
            use winit::platform::web::WindowAttributesExtWebSys;
            attributes.with_canvas(crate::web::canvas())
        };

        attributes
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn create_renderer(&mut self, window: Arc<Window>, width: u32, height: u32) -> DisplayResult<()> {
        let mut renderer = pollster::block_on(WgpuRenderer::new(window, width, height))?;
        renderer.set_vsync(self.viewer.config().vsync);
        log::info!("WinitBackend: {} renderer ready", renderer.name());
        self.renderer = Some(renderer);
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn create_renderer(&mut self, window: Arc<Window>, width: u32, height: u32) -> DisplayResult<()> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.renderer_rx = Some(rx);
        wasm_bindgen_futures::spawn_local(async move {
            let _ = tx.send(WgpuRenderer::new(window, width, height).await);
        });
        Ok(())
    }

    /// Pick up a renderer created asynchronously.
    fn poll_renderer(&mut self, event_loop: &ActiveEventLoop) {
        let Some(rx) = &self.renderer_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(mut renderer)) => {
                log::info!("WinitBackend: {} renderer ready", renderer.name());
                let (width, height) = self.viewer.viewport().surface_size();
                renderer.resize(width, height);
                renderer.set_vsync(self.viewer.config().vsync);
                self.renderer = Some(renderer);
                self.renderer_rx = None;
            }
            Ok(Err(e)) => {
                log::error!("WinitBackend: failed to create renderer: {}", e);
                self.renderer_rx = None;
                event_loop.exit();
            }
            Err(_) => {}
        }
    }

    fn resize(&mut self, window: &Window, size: PhysicalSize<u32>) {
        let scale = window.scale_factor();
        let logical = size.to_logical::<f32>(scale);
        let (width, height) = self.viewer.on_resize(logical.width, logical.height, scale as f32);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height);
        }
    }

    fn redraw(&mut self, window: &Window) {
        if let Some(loaded) = self.loader.poll() {
            match loaded.result {
                Ok(scene) => self.viewer.attach_model(scene),
                Err(e) => log::error!("WinitBackend: failed to load {}: {}", loaded.path, e),
            }
        }

        self.viewer.frame(ClockTime::now());

        let (Some(renderer), Some(egui_state)) = (self.renderer.as_mut(), self.egui_state.as_mut())
        else {
            return;
        };

        let ctx = egui_state.egui_ctx().clone();
        let mut input = egui_state.take_egui_input(window);
        set_native_pixels_per_point(&mut input, self.viewer.viewport().pixel_ratio());
        ctx.begin_pass(input);
        let changes = self.panel.show(&ctx, self.viewer.settings());
        let output = ctx.end_pass();
        egui_state.handle_platform_output(window, output.platform_output);

        for change in changes {
            if let Err(e) = self.viewer.apply(change) {
                log::warn!("WinitBackend: ignoring setting: {}", e);
            }
        }

        renderer.set_overlay(Overlay {
            paint_jobs: ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        });

        match renderer.render(self.viewer.scene(), self.viewer.camera()) {
            Ok(()) => {}
            Err(DisplayError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                let (width, height) = self.viewer.viewport().surface_size();
                renderer.resize(width, height);
            }
            Err(DisplayError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::debug!("WinitBackend: surface timeout, skipping frame");
            }
            Err(e) => log::error!("WinitBackend: render failed: {}", e),
        }
    }
}

/// Make egui lay out and rasterize at the capped surface pixel ratio
/// instead of the window's raw scale factor.
fn set_native_pixels_per_point(input: &mut egui::RawInput, pixels_per_point: f32) {
    if let Some(info) = input.viewports.get_mut(&input.viewport_id) {
        info.native_pixels_per_point = Some(pixels_per_point);
    }
}

impl ApplicationHandler for WinitBackend {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(self.window_attributes()) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("WinitBackend: failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let scale = window.scale_factor();
        let logical = window.inner_size().to_logical::<f32>(scale);
        let (width, height) = self.viewer.on_resize(logical.width, logical.height, scale as f32);

        self.egui_state = Some(egui_winit::State::new(
            egui::Context::default(),
            egui::ViewportId::ROOT,
            &*window,
            Some(scale as f32),
            None,
            None,
        ));

        if let Err(e) = self.create_renderer(window.clone(), width, height) {
            log::error!("WinitBackend: failed to create renderer: {}", e);
            event_loop.exit();
            return;
        }

        let model_path = self.viewer.config().model.path.clone();
        self.loader.load(&model_path);

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.poll_renderer(event_loop);

        let Some(window) = self.window.clone() else {
            return;
        };
        let consumed = self
            .egui_state
            .as_mut()
            .is_some_and(|state| state.on_window_event(&window, &event).consumed);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(&window, size),
            WindowEvent::ScaleFactorChanged { .. } => self.resize(&window, window.inner_size()),
            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f32>(window.scale_factor());
                self.viewer.on_cursor_moved(position.x, position.y);
                if let (true, Some((x, y))) = (self.dragging, self.cursor) {
                    let height = self.viewer.viewport().height;
                    self.viewer
                        .controls_mut()
                        .rotate(position.x - x, position.y - y, height);
                }
                self.cursor = Some((position.x, position.y));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.dragging = false;
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed && !consumed;
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_NOTCH) as f32,
                };
                self.viewer.controls_mut().zoom(notches);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !consumed && cfg!(not(target_arch = "wasm32")) => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                self.redraw(&window);
                window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with_scale(scale: f32) -> egui::RawInput {
        let mut input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(800.0, 600.0),
            )),
            ..Default::default()
        };
        input
            .viewports
            .entry(input.viewport_id)
            .or_default()
            .native_pixels_per_point = Some(scale);
        input
    }

    #[test]
    fn test_overlay_uses_capped_pixel_ratio() {
        let ctx = egui::Context::default();
        let mut input = input_with_scale(3.0);
        set_native_pixels_per_point(&mut input, 2.0);

        let output = ctx.run(input, |ctx| {
            egui::Window::new("Clock Controller").show(ctx, |ui| {
                ui.label("12:00:00");
            });
        });
        assert_eq!(output.pixels_per_point, 2.0);
        assert_eq!(ctx.pixels_per_point(), 2.0);
    }

    #[test]
    fn test_uncapped_scale_passes_through() {
        let ctx = egui::Context::default();
        let mut input = input_with_scale(1.5);
        set_native_pixels_per_point(&mut input, 1.5);
        let output = ctx.run(input, |_| {});
        assert_eq!(output.pixels_per_point, 1.5);
    }
}
