use std::path::{Path, PathBuf};

use glam::Vec3;

use crate::render::ReflectionMode;
use crate::scene::camera::{DEFAULT_SENSITIVITY, DEFAULT_SPEED};

pub const WINDOW_TITLE: &str = "Time Stone - dynamic environment mirror";

/// Skybox face images, ordered +X, -X, +Y, -Y, +Z, -Z.
pub const SKYBOX_FACE_FILES: [&str; 6] = [
    "right.jpg",
    "left.jpg",
    "top.jpg",
    "bottom.jpg",
    "front.jpg",
    "back.jpg",
];

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub asset_root: PathBuf,
    pub camera_position: Vec3,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Time Stone spin in degrees per second.
    pub rotate_speed: f32,
    pub reflection_size: u32,
    pub reflection_mode: ReflectionMode,
    pub near: f32,
    pub far: f32,
    pub clear_color: wgpu::Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 600,
            asset_root: PathBuf::from("resources"),
            camera_position: Vec3::new(0.0, 0.0, 55.0),
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            rotate_speed: 32.0,
            reflection_size: 512,
            reflection_mode: ReflectionMode::MainCamera,
            near: 0.1,
            far: 1000.0,
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
        }
    }
}

impl ViewerConfig {
    pub fn with_asset_root(mut self, root: impl AsRef<Path>) -> Self {
        self.asset_root = root.as_ref().to_path_buf();
        self
    }

    pub fn doctor_model_path(&self) -> PathBuf {
        self.asset_root.join("objects/dr-strange/Dr Strange.obj")
    }

    pub fn time_stone_model_path(&self) -> PathBuf {
        self.asset_root.join("objects/timestone/timestone.obj")
    }

    pub fn glass_texture_path(&self) -> PathBuf {
        self.asset_root.join("textures/broken-glass/WireReinforced_N.jpg")
    }

    pub fn skybox_face_paths(&self) -> [PathBuf; 6] {
        let dir = self.asset_root.join("textures/skybox");
        SKYBOX_FACE_FILES.map(|file| dir.join(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scene() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera_position, Vec3::new(0.0, 0.0, 55.0));
        assert_eq!(config.rotate_speed, 32.0);
        assert_eq!(config.reflection_size, 512);
        assert_eq!(config.reflection_mode, ReflectionMode::MainCamera);
        assert!(config.far > config.near && config.near > 0.0);
    }

    #[test]
    fn test_asset_paths_follow_root() {
        let config = ViewerConfig::default().with_asset_root("/data/assets");
        assert_eq!(
            config.doctor_model_path(),
            PathBuf::from("/data/assets/objects/dr-strange/Dr Strange.obj")
        );
        assert_eq!(
            config.time_stone_model_path(),
            PathBuf::from("/data/assets/objects/timestone/timestone.obj")
        );
        assert!(config.glass_texture_path().starts_with("/data/assets/textures"));
    }

    #[test]
    fn test_skybox_faces_are_ordered_by_axis() {
        let config = ViewerConfig::default();
        let names: Vec<_> = config
            .skybox_face_paths()
            .iter()
            .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["right", "left", "top", "bottom", "front", "back"]);
    }
}
