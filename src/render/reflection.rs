use glam::{Mat4, Vec3};

use super::renderable::CameraMatrices;
use crate::model::Texture;

pub const REFLECTION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// Layer order of a cube texture.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(self) -> usize {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "+X",
            CubeFace::NegativeX => "-X",
            CubeFace::PositiveY => "+Y",
            CubeFace::NegativeY => "-Y",
            CubeFace::PositiveZ => "+Z",
            CubeFace::NegativeZ => "-Z",
        }
    }

    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the conventional cube-face camera for this face.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }
}

/// How the six faces of the dynamic reflection are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReflectionMode {
    /// Every face reuses the player's projection and view.
    #[default]
    MainCamera,
    /// Each face gets its own 90 degree camera at the mirror, looking down its axis.
    PerFace,
}

impl ReflectionMode {
    /// Matrices used while rendering into `face`.
    pub fn face_matrices(
        self,
        face: CubeFace,
        main: &CameraMatrices,
        origin: Vec3,
        depth_range: (f32, f32),
    ) -> CameraMatrices {
        match self {
            ReflectionMode::MainCamera => *main,
            ReflectionMode::PerFace => face_camera(face, origin, depth_range),
        }
    }
}

fn face_camera(face: CubeFace, origin: Vec3, (near, far): (f32, f32)) -> CameraMatrices {
    // Cube texels are stored top row first while the face table assumes
    // bottom-up rows, so the face projection mirrors y.
    let projection = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far);
    let view = Mat4::look_at_rh(origin, origin + face.direction(), face.up());
    CameraMatrices::new(projection, view)
}

/// Off-screen cube target the reflection pass renders into and the glass samples.
pub struct ReflectionTarget {
    face_views: Vec<wgpu::TextureView>,
    pub cube_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub depth_view: wgpu::TextureView,
}

impl ReflectionTarget {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Dynamic Reflection Cubemap"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: REFLECTION_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = CubeFace::ALL
            .iter()
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("Reflection Face {}", face.label())),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face.index() as u32,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Reflection Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Reflection Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // One depth buffer is enough: faces are rendered one after another.
        let depth_view = Texture::create_depth_view(device, size, size, "Reflection Depth Texture");

        log::debug!("Created {size}x{size} reflection cubemap");

        Self {
            face_views,
            cube_view,
            sampler,
            depth_view,
        }
    }

    pub fn face_view(&self, face: CubeFace) -> &wgpu::TextureView {
        &self.face_views[face.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DEPTH: (f32, f32) = (0.1, 1000.0);

    fn main_camera() -> CameraMatrices {
        CameraMatrices::new(
            Mat4::perspective_rh(45f32.to_radians(), 4.0 / 3.0, 0.1, 1000.0),
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 55.0), Vec3::ZERO, Vec3::Y),
        )
    }

    #[test]
    fn test_face_order_matches_layers() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
        }
    }

    #[test]
    fn test_face_bases_are_perpendicular() {
        for face in CubeFace::ALL {
            assert_relative_eq!(face.direction().dot(face.up()), 0.0);
            assert_relative_eq!(face.direction().length(), 1.0);
        }
    }

    #[test]
    fn test_main_camera_mode_reuses_player_view() {
        let main = main_camera();
        for face in CubeFace::ALL {
            let m = ReflectionMode::MainCamera.face_matrices(face, &main, Vec3::new(0.0, 0.0, 40.0), DEPTH);
            assert_eq!(m, main);
        }
    }

    #[test]
    fn test_per_face_camera_looks_down_axis() {
        let origin = Vec3::new(0.0, 0.0, 40.0);
        let main = main_camera();
        for face in CubeFace::ALL {
            let m = ReflectionMode::PerFace.face_matrices(face, &main, origin, DEPTH);
            // A point one unit along the face axis lands in the middle of the face
            let clip = m.projection * m.view * (origin + face.direction()).extend(1.0);
            assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
            assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
            assert!(clip.w > 0.0);
        }
    }

    #[test]
    fn test_per_face_field_of_view_is_ninety_degrees() {
        let origin = Vec3::ZERO;
        let m = ReflectionMode::PerFace.face_matrices(CubeFace::PositiveZ, &main_camera(), origin, DEPTH);
        // Corner of the face frustum at distance 1 sits on the clip edge
        let clip = m.projection * m.view * Vec3::new(1.0, 1.0, 1.0).extend(1.0);
        assert_relative_eq!((clip.x / clip.w).abs(), 1.0, epsilon = 1e-5);
        assert_relative_eq!((clip.y / clip.w).abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_per_face_clips_at_depth_range() {
        let m = ReflectionMode::PerFace.face_matrices(CubeFace::NegativeX, &main_camera(), Vec3::ZERO, DEPTH);
        let near = m.projection * m.view * Vec3::new(-0.1, 0.0, 0.0).extend(1.0);
        let far = m.projection * m.view * Vec3::new(-1000.0, 0.0, 0.0).extend(1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-4);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-4);
    }
}
