use wgpu::util::DeviceExt;

use super::renderable::{ModelHandle, VertexBufferHandle};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::model::primitives::{GLASS_QUAD_VERTICES, SKYBOX_VERTICES};
use crate::model::{Model, Texture};
use crate::scene::SceneHandles;

/// Everything loaded from disk or uploaded once at start-up.
pub struct SceneResources {
    pub models: Vec<Model>,
    pub vertex_buffers: Vec<wgpu::Buffer>,
    pub skybox: Texture,
    pub glass_detail: Texture,
    pub handles: SceneHandles,
}

impl SceneResources {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &ViewerConfig,
        material_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let mut models = Vec::new();
        let mut load_model = |path: std::path::PathBuf| -> Result<ModelHandle, ViewerError> {
            log::info!("Loading model {}", path.display());
            let model = Model::load(device, queue, &path, material_bind_group_layout)?;
            models.push(model);
            Ok(ModelHandle(models.len() - 1))
        };
        let doctor_strange = load_model(config.doctor_model_path())?;
        let time_stone = load_model(config.time_stone_model_path())?;

        let glass_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Broken Glass Vertex Buffer"),
            contents: bytemuck::cast_slice(&GLASS_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let skybox_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Vertex Buffer"),
            contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::info!("Loading skybox from {}", config.asset_root.display());
        let skybox = Texture::cubemap_from_paths(
            device,
            queue,
            &config.skybox_face_paths(),
            Some("Skybox Cubemap"),
        )?;
        let glass_detail = Texture::from_path(
            device,
            queue,
            &config.glass_texture_path(),
            Some("Broken Glass Texture"),
        )?;

        Ok(Self {
            models,
            vertex_buffers: vec![glass_buffer, skybox_buffer],
            skybox,
            glass_detail,
            handles: SceneHandles {
                doctor_strange,
                time_stone,
                glass_quad: VertexBufferHandle(0),
                skybox_cube: VertexBufferHandle(1),
            },
        })
    }
}
