pub mod camera;
pub mod timing;
pub mod transform;
#[cfg(test)]
mod tests;

pub use camera::{Camera, CameraMovement};
pub use timing::{FrameClock, RotationAngle};
pub use transform::Transform;

use glam::Vec3;

use crate::render::renderable::{
    Geometry, ModelHandle, Renderable, ShaderKind, TextureBinding, TextureSource,
    VertexBufferHandle, ViewSpace,
};

pub const DOCTOR_POSITION: Vec3 = Vec3::new(0.0, -24.0, 0.0);
pub const DOCTOR_SCALE: Vec3 = Vec3::splat(32.0);
pub const TIME_STONE_POSITION: Vec3 = Vec3::new(0.0, 0.0, 32.0);
pub const TIME_STONE_SCALE: Vec3 = Vec3::new(1.0, 1.2, 1.0);
pub const TIME_STONE_AXIS: Vec3 = Vec3::new(0.2, 1.0, 0.3);
pub const GLASS_POSITION: Vec3 = Vec3::new(0.0, 0.0, 40.0);
pub const GLASS_SCALE: Vec3 = Vec3::new(4.0, 4.0, 1.0);

pub const GLASS_VERTEX_COUNT: u32 = 4;
pub const SKYBOX_VERTEX_COUNT: u32 = 36;

pub const DIFFUSE: TextureBinding =
    TextureBinding::new(0, "texture_diffuse1", TextureSource::ModelMaterial);
pub const SKYBOX: TextureBinding = TextureBinding::new(0, "skybox", TextureSource::Skybox);
pub const ENVIRONMENT_MAP: TextureBinding =
    TextureBinding::new(0, "environmentMap", TextureSource::DynamicReflection);
pub const GLASS_DETAIL: TextureBinding =
    TextureBinding::new(1, "brokenGlassTexture", TextureSource::GlassDetail);

/// GPU resources the scene's renderables refer to, created once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub doctor_strange: ModelHandle,
    pub time_stone: ModelHandle,
    pub glass_quad: VertexBufferHandle,
    pub skybox_cube: VertexBufferHandle,
}

/// The fixed set of things drawn every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub doctor_strange: Renderable,
    pub time_stone: Renderable,
    pub glass: Renderable,
    pub sky: Renderable,
}

impl Scene {
    pub fn new(handles: SceneHandles) -> Self {
        let doctor_strange = Renderable {
            name: "doctor_strange",
            shader: ShaderKind::DrStrange,
            transform: Some(
                Transform::new()
                    .with_position(DOCTOR_POSITION)
                    .with_scale(DOCTOR_SCALE),
            ),
            geometry: Geometry::Model(handles.doctor_strange),
            textures: vec![DIFFUSE],
            view_space: ViewSpace::World,
        };

        let time_stone = Renderable {
            name: "time_stone",
            shader: ShaderKind::TimeStone,
            transform: Some(
                Transform::new()
                    .with_position(TIME_STONE_POSITION)
                    .with_scale(TIME_STONE_SCALE)
                    .with_rotation_axis(TIME_STONE_AXIS),
            ),
            geometry: Geometry::Model(handles.time_stone),
            textures: vec![DIFFUSE],
            view_space: ViewSpace::World,
        };

        let glass = Renderable {
            name: "broken_glass",
            shader: ShaderKind::BrokenGlass,
            transform: Some(
                Transform::new()
                    .with_position(GLASS_POSITION)
                    .with_scale(GLASS_SCALE),
            ),
            geometry: Geometry::Vertices {
                buffer: handles.glass_quad,
                vertex_count: GLASS_VERTEX_COUNT,
            },
            textures: vec![ENVIRONMENT_MAP, GLASS_DETAIL],
            view_space: ViewSpace::World,
        };

        let sky = Renderable {
            name: "skybox",
            shader: ShaderKind::Skybox,
            transform: None,
            geometry: Geometry::Vertices {
                buffer: handles.skybox_cube,
                vertex_count: SKYBOX_VERTEX_COUNT,
            },
            textures: vec![SKYBOX],
            view_space: ViewSpace::RotationOnly,
        };

        Self {
            doctor_strange,
            time_stone,
            glass,
            sky,
        }
    }

    /// Models drawn into both the reflection and the visible frame, in draw order.
    pub fn opaque_models(&self) -> [&Renderable; 2] {
        [&self.doctor_strange, &self.time_stone]
    }

    /// Centre of the mirror, where per-face reflection cameras sit.
    pub fn reflection_origin(&self) -> Vec3 {
        self.glass
            .transform
            .map(|t| t.position)
            .unwrap_or(Vec3::ZERO)
    }
}
