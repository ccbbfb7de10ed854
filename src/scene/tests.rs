use super::*;
use approx::assert_relative_eq;
use glam::{Mat4, Vec4Swizzles};

fn test_handles() -> SceneHandles {
    SceneHandles {
        doctor_strange: ModelHandle(0),
        time_stone: ModelHandle(1),
        glass_quad: VertexBufferHandle(0),
        skybox_cube: VertexBufferHandle(1),
    }
}

#[test]
fn test_transform_new() {
    let transform = Transform::new();
    assert_eq!(transform.position, Vec3::ZERO);
    assert_eq!(transform.scale, Vec3::ONE);
    assert_eq!(transform.rotation_axis, None);
    assert_eq!(transform.to_matrix(90.0), Mat4::IDENTITY);
}

#[test]
fn test_transform_matrix() {
    // Test translation
    let transform = Transform::new().with_position(Vec3::new(1.0, 2.0, 3.0));
    let matrix = transform.to_matrix(0.0);
    assert_eq!(matrix.col(3).xyz(), Vec3::new(1.0, 2.0, 3.0));

    // Test scale
    let transform = Transform::new().with_scale(Vec3::new(2.0, 3.0, 4.0));
    let matrix = transform.to_matrix(0.0);
    assert_eq!(matrix.col(0).x, 2.0);
    assert_eq!(matrix.col(1).y, 3.0);
    assert_eq!(matrix.col(2).z, 4.0);
}

#[test]
fn test_transform_rotates_before_scaling() {
    let transform = Transform::new()
        .with_scale(Vec3::new(2.0, 1.0, 1.0))
        .with_rotation_axis(Vec3::Y);
    // +Z rotated 90 degrees about Y becomes +X, which the scale then doubles
    let p = transform.to_matrix(90.0) * Vec3::Z.extend(1.0);
    assert_relative_eq!(p.x, 2.0, epsilon = 1e-5);
    assert_relative_eq!(p.z, 0.0, epsilon = 1e-5);
}

#[test]
fn test_rotation_axis_is_normalized() {
    let transform = Transform::new().with_rotation_axis(TIME_STONE_AXIS);
    let m = transform.to_matrix(123.0);
    // A pure rotation keeps unit vectors unit length
    assert_relative_eq!((m * Vec3::X.extend(0.0)).length(), 1.0, epsilon = 1e-5);
}

#[test]
fn test_transform_is_recomputed_not_accumulated() {
    let scene = Scene::new(test_handles());
    let first = scene.time_stone.model_matrix(45.0);
    let _ = scene.time_stone.model_matrix(200.0);
    assert_eq!(scene.time_stone.model_matrix(45.0), first);
}

#[test]
fn test_scene_layout() {
    let scene = Scene::new(test_handles());

    let doctor = scene.doctor_strange.model_matrix(0.0);
    assert_eq!(doctor.col(3).xyz(), DOCTOR_POSITION);
    assert_eq!(doctor.col(1).y, 32.0);

    assert_eq!(scene.reflection_origin(), GLASS_POSITION);
    assert_eq!(scene.sky.view_space, ViewSpace::RotationOnly);
    assert_eq!(scene.sky.model_matrix(10.0), Mat4::IDENTITY);

    // Only the stone spins
    assert_eq!(scene.doctor_strange.model_matrix(90.0), doctor);
    assert_ne!(scene.time_stone.model_matrix(90.0), scene.time_stone.model_matrix(0.0));
}

#[test]
fn test_glass_texture_units() {
    let scene = Scene::new(test_handles());
    let units: Vec<_> = scene
        .glass
        .textures
        .iter()
        .map(|t| (t.unit, t.uniform, t.source))
        .collect();
    assert_eq!(
        units,
        vec![
            (0, "environmentMap", TextureSource::DynamicReflection),
            (1, "brokenGlassTexture", TextureSource::GlassDetail),
        ]
    );
}

#[test]
fn test_only_glass_samples_reflection() {
    let scene = Scene::new(test_handles());
    assert!(scene.glass.samples(TextureSource::DynamicReflection));
    for r in scene.opaque_models().into_iter().chain([&scene.sky]) {
        assert!(!r.samples(TextureSource::DynamicReflection), "{}", r.name);
    }
}
