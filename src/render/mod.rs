pub mod passes;
pub mod pipeline;
pub mod plan;
pub mod reflection;
pub mod renderable;
mod resources;

pub use passes::{composite_pass, record_frame, reflection_pass, FrameParams};
pub use plan::{DepthFunc, FramePlan, FrameRecorder, PlanError, RenderTarget};
pub use reflection::{CubeFace, ReflectionMode, ReflectionTarget};
pub use renderable::{CameraMatrices, Geometry, Renderable, ShaderKind, TextureSource};
pub use resources::SceneResources;

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::model::Texture;
use crate::scene::{self, SceneHandles};
use pipeline::{DrawUniform, PipelineCache, PipelineKey};
use renderable::TextureBinding;

/// Owns the GPU: surface, device, persistent resources, and executes frame plans.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    reflection: ReflectionTarget,
    pipelines: PipelineCache,
    resources: SceneResources,
    // Bind groups for draws whose textures do not change per mesh, keyed by shader.
    static_bind_groups: HashMap<ShaderKind, wgpu::BindGroup>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, viewer_config: &ViewerConfig) -> Result<Self, ViewerError> {
        let size = window.inner_size();

        log::info!("Creating WGPU instance...");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: if cfg!(target_os = "macos") {
                wgpu::Backends::METAL
            } else {
                wgpu::Backends::PRIMARY
            },
            dx12_shader_compiler: Default::default(),
            flags: wgpu::InstanceFlags::from_build_config(),
            gles_minor_version: wgpu::Gles3MinorVersion::default(),
        });

        log::info!("Creating surface for {}x{} window", size.width, size.height);
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(ViewerError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);
        log::debug!("Adapter driver: {} {}", info.driver, info.driver_info);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(ViewerError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(ViewerError::UnsupportedSurface)?;
        log::info!("Selected surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // Fifo is always supported and waits for vsync
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = Texture::create_depth_view(&device, config.width, config.height, "Depth Texture");
        let reflection = ReflectionTarget::new(&device, viewer_config.reflection_size);

        let mut pipelines = PipelineCache::new(&device);
        let material_layout = pipelines.texture_layout(&device, &[scene::DIFFUSE]);
        let resources = SceneResources::load(&device, &queue, viewer_config, material_layout)?;
        log::info!("Scene resources ready");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            reflection,
            pipelines,
            resources,
            static_bind_groups: HashMap::new(),
        })
    }

    pub fn scene_handles(&self) -> SceneHandles {
        self.resources.handles
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = Texture::create_depth_view(&self.device, width, height, "Depth Texture");
            log::debug!("Resized surface to {width}x{height}");
        }
    }

    /// Reconfigures the surface at its current size after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        let (width, height) = self.size();
        self.resize(width, height);
    }

    pub fn render(&mut self, plan: &FramePlan) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let screen_view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let keys = self.prepare(plan);
        let uniform_groups: Vec<Vec<wgpu::BindGroup>> = plan
            .passes
            .iter()
            .map(|pass| {
                pass.draws
                    .iter()
                    .map(|draw| self.uniform_bind_group(&DrawUniform::new(&draw.uniforms), draw.label))
                    .collect()
            })
            .collect();

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        for ((pass, keys), uniform_groups) in plan.passes.iter().zip(&keys).zip(&uniform_groups) {
            let (color_view, depth_view) = match pass.target {
                RenderTarget::Screen => (&screen_view, &self.depth_view),
                RenderTarget::ReflectionFace(face) => {
                    (self.reflection.face_view(face), &self.reflection.depth_view)
                }
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&pass.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: pass.clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for ((draw, key), uniforms) in pass.draws.iter().zip(keys).zip(uniform_groups) {
                let Some(pipeline) = self.pipelines.get(key) else {
                    log::warn!("No pipeline for draw '{}'", draw.label);
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, uniforms, &[]);

                match draw.geometry {
                    Geometry::Model(handle) => match self.resources.models.get(handle.0) {
                        Some(model) => model.render(&mut render_pass),
                        None => log::warn!("Unknown model {:?} in draw '{}'", handle, draw.label),
                    },
                    Geometry::Vertices {
                        buffer,
                        vertex_count,
                    } => {
                        let (Some(vertices), Some(textures)) = (
                            self.resources.vertex_buffers.get(buffer.0),
                            self.static_bind_groups.get(&draw.shader),
                        ) else {
                            log::warn!("Missing resources for draw '{}'", draw.label);
                            continue;
                        };
                        render_pass.set_bind_group(1, textures, &[]);
                        render_pass.set_vertex_buffer(0, vertices.slice(..));
                        render_pass.draw(0..vertex_count, 0..1);
                    }
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        log::trace!("Presented frame with {} draws", plan.draw_count());
        Ok(())
    }

    /// Creates any pipeline and texture bind group the plan needs that does not exist yet.
    fn prepare(&mut self, plan: &FramePlan) -> Vec<Vec<PipelineKey>> {
        let mut keys = Vec::with_capacity(plan.passes.len());
        for pass in &plan.passes {
            let color_format = match pass.target {
                RenderTarget::Screen => self.config.format,
                RenderTarget::ReflectionFace(_) => reflection::REFLECTION_FORMAT,
            };
            let mut pass_keys = Vec::with_capacity(pass.draws.len());
            for draw in &pass.draws {
                pass_keys.push(self.pipelines.prepare(
                    &self.device,
                    draw.shader,
                    draw.depth_func,
                    color_format,
                    &draw.textures,
                ));

                if matches!(draw.geometry, Geometry::Vertices { .. })
                    && !self.static_bind_groups.contains_key(&draw.shader)
                {
                    let layout = self.pipelines.texture_layout(&self.device, &draw.textures);
                    if let Some(group) = texture_bind_group(
                        &self.device,
                        layout,
                        &draw.textures,
                        &self.resources,
                        &self.reflection,
                        draw.shader.label(),
                    ) {
                        self.static_bind_groups.insert(draw.shader, group);
                    }
                }
            }
            keys.push(pass_keys);
        }
        keys
    }

    fn uniform_bind_group(&self, uniform: &DrawUniform, label: &str) -> wgpu::BindGroup {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Uniform Buffer")),
            contents: bytemuck::cast_slice(&[*uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Uniform Bind Group")),
            layout: self.pipelines.uniform_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    bindings: &[TextureBinding],
    resources: &SceneResources,
    reflection: &ReflectionTarget,
    label: &str,
) -> Option<wgpu::BindGroup> {
    let mut entries = Vec::with_capacity(bindings.len() * 2);
    for binding in bindings {
        let (view, sampler) = match binding.source {
            TextureSource::Skybox => (&resources.skybox.view, &resources.skybox.sampler),
            TextureSource::DynamicReflection => (&reflection.cube_view, &reflection.sampler),
            TextureSource::GlassDetail => (&resources.glass_detail.view, &resources.glass_detail.sampler),
            TextureSource::ModelMaterial => {
                log::warn!("'{}' cannot be bound outside a model", binding.uniform);
                return None;
            }
        };
        entries.push(wgpu::BindGroupEntry {
            binding: binding.unit * 2,
            resource: wgpu::BindingResource::TextureView(view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: binding.unit * 2 + 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }

    Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label} Texture Bind Group")),
        layout,
        entries: &entries,
    }))
}
