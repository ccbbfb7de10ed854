use std::collections::HashMap;

use super::plan::{DepthFunc, DrawUniforms};
use super::renderable::{ShaderKind, TextureBinding, TextureSource};
use crate::model::{ModelVertex, QuadVertex, SkyboxVertex, Texture};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
}

impl DrawUniform {
    pub fn new(uniforms: &DrawUniforms) -> Self {
        // Eye position in world space; meaningless for the sky's rotation-only view
        let eye = uniforms.view.inverse().w_axis;
        Self {
            projection: uniforms.projection.to_cols_array_2d(),
            view: uniforms.view.to_cols_array_2d(),
            model: uniforms.model.to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, 1.0],
        }
    }
}

pub fn texture_dimension(source: TextureSource) -> wgpu::TextureViewDimension {
    match source {
        TextureSource::Skybox | TextureSource::DynamicReflection => wgpu::TextureViewDimension::Cube,
        TextureSource::ModelMaterial | TextureSource::GlassDetail => wgpu::TextureViewDimension::D2,
    }
}

/// Texture unit `n` lives at binding `2n` with its sampler at `2n + 1`.
pub fn texture_layout_entries(bindings: &[TextureBinding]) -> Vec<wgpu::BindGroupLayoutEntry> {
    bindings
        .iter()
        .flat_map(|binding| {
            [
                wgpu::BindGroupLayoutEntry {
                    binding: binding.unit * 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: texture_dimension(binding.source),
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: binding.unit * 2 + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ]
        })
        .collect()
}

/// Textures with the same units and dimensions share one bind group layout.
pub type TextureLayoutKey = Vec<(u32, wgpu::TextureViewDimension)>;

pub fn texture_layout_key(bindings: &[TextureBinding]) -> TextureLayoutKey {
    bindings
        .iter()
        .map(|b| (b.unit, texture_dimension(b.source)))
        .collect()
}

pub fn vertex_layout(shader: ShaderKind) -> wgpu::VertexBufferLayout<'static> {
    match shader {
        ShaderKind::DrStrange | ShaderKind::TimeStone => ModelVertex::desc(),
        ShaderKind::Skybox => SkyboxVertex::desc(),
        ShaderKind::BrokenGlass => QuadVertex::desc(),
    }
}

pub fn topology(shader: ShaderKind) -> wgpu::PrimitiveTopology {
    match shader {
        ShaderKind::BrokenGlass => wgpu::PrimitiveTopology::TriangleStrip,
        _ => wgpu::PrimitiveTopology::TriangleList,
    }
}

pub fn blend_state(shader: ShaderKind) -> wgpu::BlendState {
    if shader.is_blended() {
        wgpu::BlendState::ALPHA_BLENDING
    } else {
        wgpu::BlendState::REPLACE
    }
}

fn shader_source(shader: ShaderKind) -> &'static str {
    match shader {
        ShaderKind::DrStrange => include_str!("../shaders/dr_strange.wgsl"),
        ShaderKind::TimeStone => include_str!("../shaders/timestone.wgsl"),
        ShaderKind::Skybox => include_str!("../shaders/skybox.wgsl"),
        ShaderKind::BrokenGlass => include_str!("../shaders/broken_glass.wgsl"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub shader: ShaderKind,
    pub depth_func: DepthFunc,
    pub color_format: wgpu::TextureFormat,
    pub textures: TextureLayoutKey,
}

/// Shader modules, bind group layouts and render pipelines, created on first use.
pub struct PipelineCache {
    uniform_layout: wgpu::BindGroupLayout,
    modules: HashMap<ShaderKind, wgpu::ShaderModule>,
    texture_layouts: HashMap<TextureLayoutKey, wgpu::BindGroupLayout>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let modules = ShaderKind::ALL
            .into_iter()
            .map(|shader| {
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader.label()),
                    source: wgpu::ShaderSource::Wgsl(shader_source(shader).into()),
                });
                (shader, module)
            })
            .collect();

        Self {
            uniform_layout,
            modules,
            texture_layouts: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    pub fn texture_layout(
        &mut self,
        device: &wgpu::Device,
        bindings: &[TextureBinding],
    ) -> &wgpu::BindGroupLayout {
        self.texture_layouts
            .entry(texture_layout_key(bindings))
            .or_insert_with(|| {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Texture Bind Group Layout"),
                    entries: &texture_layout_entries(bindings),
                })
            })
    }

    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        shader: ShaderKind,
        depth_func: DepthFunc,
        color_format: wgpu::TextureFormat,
        bindings: &[TextureBinding],
    ) -> PipelineKey {
        let key = PipelineKey {
            shader,
            depth_func,
            color_format,
            textures: texture_layout_key(bindings),
        };
        if self.pipelines.contains_key(&key) {
            return key;
        }

        self.texture_layout(device, bindings);
        let texture_layout = &self.texture_layouts[&key.textures];
        let module = &self.modules[&shader];

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", shader.label())),
            bind_group_layouts: &[&self.uniform_layout, texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline ({:?}, {:?})", shader.label(), depth_func, color_format)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout(shader)],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(blend_state(shader)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: topology(shader),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Face cameras mirror y, which flips winding
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Texture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: depth_func.compare_function(),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        log::debug!("Created pipeline {:?}", key);
        self.pipelines.insert(key.clone(), pipeline);
        key
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    const GLASS: [TextureBinding; 2] = [
        TextureBinding::new(0, "environmentMap", TextureSource::DynamicReflection),
        TextureBinding::new(1, "brokenGlassTexture", TextureSource::GlassDetail),
    ];

    #[test]
    fn test_uniform_layout_size() {
        // Three mat4 plus a vec4, no padding
        assert_eq!(std::mem::size_of::<DrawUniform>(), 3 * 64 + 16);
    }

    #[test]
    fn test_uniform_carries_eye_position() {
        let eye = Vec3::new(1.0, 2.0, 55.0);
        let uniforms = DrawUniforms {
            projection: Mat4::IDENTITY,
            view: Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y),
            model: Mat4::IDENTITY,
        };
        let uniform = DrawUniform::new(&uniforms);
        for (got, want) in uniform.camera_pos.iter().zip([eye.x, eye.y, eye.z, 1.0]) {
            assert!((got - want).abs() < 1e-4, "{got} != {want}");
        }
    }

    #[test]
    fn test_texture_units_map_to_binding_pairs() {
        let entries = texture_layout_entries(&GLASS);
        let bindings: Vec<_> = entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3]);

        match entries[0].ty {
            wgpu::BindingType::Texture { view_dimension, .. } => {
                assert_eq!(view_dimension, wgpu::TextureViewDimension::Cube)
            }
            other => panic!("unexpected binding {other:?}"),
        }
        match entries[2].ty {
            wgpu::BindingType::Texture { view_dimension, .. } => {
                assert_eq!(view_dimension, wgpu::TextureViewDimension::D2)
            }
            other => panic!("unexpected binding {other:?}"),
        }
        assert!(matches!(entries[3].ty, wgpu::BindingType::Sampler(_)));
    }

    #[test]
    fn test_models_share_texture_layout() {
        let diffuse = [TextureBinding::new(0, "texture_diffuse1", TextureSource::ModelMaterial)];
        let sky = [TextureBinding::new(0, "skybox", TextureSource::Skybox)];
        assert_eq!(texture_layout_key(&diffuse), texture_layout_key(&diffuse));
        assert_ne!(texture_layout_key(&diffuse), texture_layout_key(&sky));
    }

    #[test]
    fn test_pipeline_state_per_shader() {
        assert_eq!(topology(ShaderKind::BrokenGlass), wgpu::PrimitiveTopology::TriangleStrip);
        assert_eq!(topology(ShaderKind::Skybox), wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(blend_state(ShaderKind::BrokenGlass), wgpu::BlendState::ALPHA_BLENDING);
        assert_eq!(blend_state(ShaderKind::DrStrange), wgpu::BlendState::REPLACE);
        assert_eq!(vertex_layout(ShaderKind::Skybox).array_stride, 12);
        assert_eq!(vertex_layout(ShaderKind::TimeStone).array_stride, 32);
    }

    #[test]
    fn test_depth_func_maps_to_compare() {
        assert_eq!(DepthFunc::Less.compare_function(), wgpu::CompareFunction::Less);
        assert_eq!(DepthFunc::LessEqual.compare_function(), wgpu::CompareFunction::LessEqual);
    }

    #[test]
    fn test_shaders_declare_entry_points() {
        for shader in ShaderKind::ALL {
            let source = shader_source(shader);
            assert!(source.contains("fn vs_main"), "{}", shader.label());
            assert!(source.contains("fn fs_main"), "{}", shader.label());
        }
    }
}
