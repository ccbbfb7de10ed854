use glam::{Mat3, Mat4};

use super::plan::{DrawUniforms, FrameRecorder, PlanError};
use crate::scene::Transform;

/// The shader programs the scene is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    DrStrange,
    TimeStone,
    Skybox,
    BrokenGlass,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 4] = [
        ShaderKind::DrStrange,
        ShaderKind::TimeStone,
        ShaderKind::Skybox,
        ShaderKind::BrokenGlass,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::DrStrange => "dr_strange",
            ShaderKind::TimeStone => "timestone",
            ShaderKind::Skybox => "skybox",
            ShaderKind::BrokenGlass => "broken_glass",
        }
    }

    pub fn is_blended(self) -> bool {
        matches!(self, ShaderKind::BrokenGlass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// An externally loaded model; each mesh binds its own material.
    Model(ModelHandle),
    Vertices {
        buffer: VertexBufferHandle,
        vertex_count: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// Diffuse texture of whichever mesh material is being drawn.
    ModelMaterial,
    Skybox,
    DynamicReflection,
    GlassDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub unit: u32,
    pub uniform: &'static str,
    pub source: TextureSource,
}

impl TextureBinding {
    pub const fn new(unit: u32, uniform: &'static str, source: TextureSource) -> Self {
        Self {
            unit,
            uniform,
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSpace {
    World,
    /// Translation stripped from the view so the geometry follows the eye.
    RotationOnly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub projection: Mat4,
    pub view: Mat4,
}

impl CameraMatrices {
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self { projection, view }
    }

    pub fn view_for(&self, space: ViewSpace) -> Mat4 {
        match space {
            ViewSpace::World => self.view,
            ViewSpace::RotationOnly => Mat4::from_mat3(Mat3::from_mat4(self.view)),
        }
    }
}

/// Shader + transform recipe + geometry + textures.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub name: &'static str,
    pub shader: ShaderKind,
    pub transform: Option<Transform>,
    pub geometry: Geometry,
    pub textures: Vec<TextureBinding>,
    pub view_space: ViewSpace,
}

impl Renderable {
    pub fn model_matrix(&self, angle_degrees: f32) -> Mat4 {
        self.transform
            .map(|t| t.to_matrix(angle_degrees))
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn samples(&self, source: TextureSource) -> bool {
        self.textures.iter().any(|t| t.source == source)
    }

    /// Records one draw: shader, projection/view/model, texture units,
    /// geometry. The geometry binding is released before returning.
    pub fn draw(
        &self,
        recorder: &mut FrameRecorder,
        matrices: &CameraMatrices,
        angle_degrees: f32,
    ) -> Result<(), PlanError> {
        let uniforms = DrawUniforms {
            projection: matrices.projection,
            view: matrices.view_for(self.view_space),
            model: self.model_matrix(angle_degrees),
        };
        let mut binding = recorder.bind_geometry(self.geometry);
        binding.draw(self.name, self.shader, uniforms, &self.textures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4Swizzles};

    #[test]
    fn test_rotation_only_view_drops_translation() {
        let view = Mat4::look_at_rh(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, Vec3::Y);
        let matrices = CameraMatrices::new(Mat4::IDENTITY, view);

        let sky_view = matrices.view_for(ViewSpace::RotationOnly);
        assert_eq!(sky_view.col(3).xyz(), Vec3::ZERO);
        assert_eq!(sky_view.col(3).w, 1.0);
        assert_eq!(sky_view.col(0).xyz(), view.col(0).xyz());
        assert_eq!(matrices.view_for(ViewSpace::World), view);
    }

    #[test]
    fn test_model_matrix_without_transform_is_identity() {
        let sky = Renderable {
            name: "sky",
            shader: ShaderKind::Skybox,
            transform: None,
            geometry: Geometry::Vertices {
                buffer: VertexBufferHandle(0),
                vertex_count: 36,
            },
            textures: vec![],
            view_space: ViewSpace::RotationOnly,
        };
        assert_eq!(sky.model_matrix(123.0), Mat4::IDENTITY);
    }

    #[test]
    fn test_only_glass_blends() {
        let blended: Vec<_> = ShaderKind::ALL.into_iter().filter(|s| s.is_blended()).collect();
        assert_eq!(blended, vec![ShaderKind::BrokenGlass]);
    }
}
