//! wgpu GPU-accelerated scene renderer.
//!
//! Each frame runs up to three passes:
//! 1. Depth-only shadow pass from the first shadow casting directional light
//! 2. Lit scene pass (solid or wireframe per material)
//! 3. egui overlay pass for the settings panel

use std::ops::Range;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::gpu_mesh::GpuMesh;
use super::pipelines::{
    GlobalUniforms, GpuLight, InstanceUniforms, ScenePipelines, DEPTH_FORMAT, MAX_LIGHTS,
};
use crate::backend::DisplayBackend;
use crate::core::camera::PerspectiveCamera;
use crate::core::error::{DisplayError, DisplayResult};
use crate::core::scene::{LightAim, LightKind, LightShadow, NodeId, Scene, ShadowFlags};

/// egui output to draw on top of the scene.
pub struct Overlay {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    /// Physical pixels per egui point on the output surface
    pub pixels_per_point: f32,
}

struct DrawItem {
    node: NodeId,
    mesh: usize,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct ShadowMap {
    size: u32,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// GPU-accelerated renderer using wgpu.
pub struct WgpuRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipelines: ScenePipelines,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    shadow_sampler: wgpu::Sampler,
    shadow_map: ShadowMap,
    max_texture_size: u32,
    meshes: Vec<GpuMesh>,
    draws: Vec<DrawItem>,
    /// Node and mesh counts of the scene last uploaded
    uploaded: (usize, usize),
    egui: egui_wgpu::Renderer,
    overlay: Option<Overlay>,
}

impl WgpuRenderer {
    /// Create a renderer drawing into `window`, sized in physical pixels.
    pub async fn new(window: Arc<Window>, width: u32, height: u32) -> DisplayResult<Self> {
        // WebGL2 is the one backend every browser has.
        let backends = if cfg!(target_arch = "wasm32") {
            wgpu::Backends::GL
        } else {
            wgpu::Backends::all()
        };
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DisplayError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("WgpuRenderer: using {} ({:?})", info.name, info.backend);

        let base_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::downlevel_defaults()
        };
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Clockview Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: base_limits.using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(DisplayError::NoAdapter)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let pipelines = ScenePipelines::new(&device, format);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[GlobalUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &pipelines.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_map = create_shadow_map(&device, &pipelines, &shadow_sampler, 1);
        let depth_view = create_depth_view(&device, config.width, config.height);
        let max_texture_size = device.limits().max_texture_dimension_2d;

        let egui = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipelines,
            globals_buffer,
            globals_bind_group,
            depth_view,
            shadow_sampler,
            shadow_map,
            max_texture_size,
            meshes: Vec::new(),
            draws: Vec::new(),
            uploaded: (0, 0),
            egui,
            overlay: None,
        })
    }

    /// Set the egui output drawn by the next frame.
    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    /// Upload every mesh of `scene` and create one draw per mesh node
    /// and primitive.
    pub fn upload_scene(&mut self, scene: &Scene) {
        self.meshes.clear();
        self.draws.clear();

        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(scene.meshes.len());
        for mesh in &scene.meshes {
            let start = self.meshes.len();
            for primitive in &mesh.primitives {
                if let Some(gpu) = GpuMesh::upload(&self.device, primitive, &mesh.name) {
                    self.meshes.push(gpu);
                }
            }
            ranges.push(start..self.meshes.len());
        }

        for (node_id, node) in scene.nodes.iter().enumerate() {
            let Some(range) = node.mesh.and_then(|m| ranges.get(m)) else {
                continue;
            };
            for mesh in range.clone() {
                let uniforms = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Instance Buffer"),
                    size: std::mem::size_of::<InstanceUniforms>() as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Instance Bind Group"),
                    layout: &self.pipelines.instance_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    }],
                });
                self.draws.push(DrawItem {
                    node: node_id,
                    mesh,
                    uniforms,
                    bind_group,
                });
            }
        }

        self.uploaded = (scene.nodes.len(), scene.meshes.len());
        log::debug!(
            "WgpuRenderer: uploaded {} primitives, {} draws",
            self.meshes.len(),
            self.draws.len()
        );
    }

    fn ensure_shadow_map(&mut self, requested: u32) {
        let size = requested.clamp(1, self.max_texture_size);
        if size != requested {
            log::warn!(
                "WgpuRenderer: shadow map size {} clamped to {}",
                requested,
                size
            );
        }
        if self.shadow_map.size != size {
            self.shadow_map =
                create_shadow_map(&self.device, &self.pipelines, &self.shadow_sampler, size);
        }
    }

    fn draw_frame(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> DisplayResult<()> {
        if self.uploaded != (scene.nodes.len(), scene.meshes.len()) {
            self.upload_scene(scene);
        }

        let world = scene.world_matrices();
        let frame = frame_uniforms(scene, &world, camera);
        let mut globals = frame.globals;
        if let Some(shadow) = frame.shadow {
            self.ensure_shadow_map(shadow.map_size);
            globals.shadow[1] = 1.0 / self.shadow_map.size as f32;
        }
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[globals]));

        let mut wireframe = Vec::with_capacity(self.draws.len());
        let mut casts = Vec::with_capacity(self.draws.len());
        for draw in &self.draws {
            let node = scene.node(draw.node);
            let material = scene.materials.get(self.meshes[draw.mesh].material);
            let color = material
                .map(|m| m.base_color.to_array())
                .unwrap_or([1.0; 4]);
            wireframe.push(material.is_some_and(|m| m.wireframe));
            casts.push(node.shadow.contains(ShadowFlags::CAST));

            let uniforms = InstanceUniforms::new(
                world[draw.node],
                color,
                node.shadow.contains(ShadowFlags::RECEIVE),
            );
            self.queue
                .write_buffer(&draw.uniforms, 0, bytemuck::cast_slice(&[uniforms]));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if frame.shadow.is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.shadow);
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for (draw, _) in self.draws.iter().zip(&casts).filter(|(_, cast)| **cast) {
                let mesh = &self.meshes[draw.mesh];
                pass.set_bind_group(1, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        {
            let bg = scene.background.to_linear();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.r as f64,
                            g: bg.g as f64,
                            b: bg.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_bind_group(2, &self.shadow_map.bind_group, &[]);
            for (draw, &lines) in self.draws.iter().zip(&wireframe) {
                let mesh = &self.meshes[draw.mesh];
                pass.set_bind_group(1, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                if lines {
                    pass.set_pipeline(&self.pipelines.wireframe);
                    pass.set_index_buffer(mesh.edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.edge_count, 0, 0..1);
                } else {
                    pass.set_pipeline(&self.pipelines.solid);
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }

        let mut command_buffers = Vec::new();
        let overlay = self.overlay.take();
        if let Some(overlay) = &overlay {
            let screen = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: overlay.pixels_per_point,
            };
            for (id, delta) in &overlay.textures_delta.set {
                self.egui.update_texture(&self.device, &self.queue, *id, delta);
            }
            command_buffers = self.egui.update_buffers(
                &self.device,
                &self.queue,
                &mut encoder,
                &overlay.paint_jobs,
                &screen,
            );

            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui
                .render(&mut pass.forget_lifetime(), &overlay.paint_jobs, &screen);
        }

        command_buffers.push(encoder.finish());
        self.queue.submit(command_buffers);
        output.present();

        if let Some(overlay) = overlay {
            for id in &overlay.textures_delta.free {
                self.egui.free_texture(id);
            }
        }
        Ok(())
    }
}

impl DisplayBackend for WgpuRenderer {
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> DisplayResult<()> {
        self.draw_frame(scene, camera)
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max = self.max_texture_size;
        self.config.width = width.min(max);
        self.config.height = height.min(max);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }

    fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = if enabled {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_shadow_map(
    device: &wgpu::Device,
    pipelines: &ScenePipelines,
    sampler: &wgpu::Sampler,
    size: u32,
) -> ShadowMap {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Shadow Map"),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Shadow Map Bind Group"),
        layout: &pipelines.shadow_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    ShadowMap {
        size,
        view,
        bind_group,
    }
}

/// Lighting state of one frame.
struct FrameUniforms {
    globals: GlobalUniforms,
    /// Parameters of the light rendering the shadow map, if any
    shadow: Option<LightShadow>,
}

/// Collect camera and light uniforms. Ambient lights are summed; the
/// first [`MAX_LIGHTS`] other lights are kept in node order and the
/// first shadow casting directional light among them drives the shadow map.
fn frame_uniforms(scene: &Scene, world: &[Mat4], camera: &PerspectiveCamera) -> FrameUniforms {
    let mut globals = GlobalUniforms::default();
    globals.view_proj = camera.view_projection_matrix().to_cols_array_2d();
    globals.camera_pos = camera.position().extend(1.0).to_array();

    let mut ambient = Vec3::ZERO;
    let mut count = 0;
    let mut shadow = None;

    for (id, node) in scene.nodes.iter().enumerate() {
        let Some(light) = node.light.and_then(|l| scene.lights.get(l)) else {
            continue;
        };
        let radiance = Vec3::new(light.color.r, light.color.g, light.color.b) * light.intensity;
        if light.kind == LightKind::Ambient {
            ambient += radiance;
            continue;
        }
        if count == MAX_LIGHTS {
            log::debug!("Ignoring light {:?}: only {} lights are shaded", light.name, MAX_LIGHTS);
            continue;
        }

        let position = world[id].transform_point3(Vec3::ZERO);
        let vector = if light.kind == LightKind::Directional {
            let direction = match light.aim {
                LightAim::Target(target) => target - position,
                LightAim::Forward => world[id].transform_vector3(Vec3::NEG_Z),
            };
            let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Y);
            if let (None, Some(params)) = (shadow, light.shadow) {
                globals.light_view_proj =
                    light_view_projection(position, direction, &params).to_cols_array_2d();
                globals.light_count[1] = count as u32;
                globals.shadow = [params.bias, 0.0, 1.0, 0.0];
                shadow = Some(params);
            }
            direction.extend(0.0)
        } else {
            // Spot cones are not modelled; spots shade like points.
            position.extend(1.0)
        };

        globals.lights[count] = GpuLight {
            vector: vector.to_array(),
            color: radiance.extend(1.0).to_array(),
        };
        count += 1;
    }

    globals.ambient = ambient.extend(1.0).to_array();
    globals.light_count[0] = count as u32;
    FrameUniforms { globals, shadow }
}

/// Orthographic light-space projection looking along `direction`.
fn light_view_projection(position: Vec3, direction: Vec3, params: &LightShadow) -> Mat4 {
    let up = if direction.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_at_rh(position, position + direction, up);
    let h = params.half_extent;
    let proj = Mat4::orthographic_rh(-h, h, -h, h, params.near, params.far);
    proj * view
}
