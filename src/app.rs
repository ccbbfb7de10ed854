use std::time::Instant;

use glam::Mat4;
use winit::keyboard::KeyCode;

use crate::config::ViewerConfig;
use crate::input::{CursorTracker, InputSink, KeyState, CLOSE_KEY};
use crate::render::{record_frame, CameraMatrices, FrameParams, FramePlan, PlanError};
use crate::scene::{Camera, FrameClock, RotationAngle, Scene, SceneHandles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Initializing,
    Running,
    Terminating,
}

/// Application state between the window and the renderer: camera, input,
/// timing, and the scene that gets recorded each frame.
pub struct Viewer {
    config: ViewerConfig,
    camera: Camera,
    cursor: CursorTracker,
    keys: KeyState,
    clock: FrameClock,
    rotation: RotationAngle,
    scene: Scene,
    aspect: f32,
    phase: LoopPhase,
}

impl Viewer {
    pub fn new(config: ViewerConfig, handles: SceneHandles, now: Instant) -> Self {
        let camera = Camera::with_tuning(
            config.camera_position,
            config.movement_speed,
            config.mouse_sensitivity,
        );
        let aspect = aspect_ratio(config.window_width, config.window_height).unwrap_or(1.0);
        Self {
            camera,
            cursor: CursorTracker::default(),
            keys: KeyState::default(),
            clock: FrameClock::new(now),
            rotation: RotationAngle::new(config.rotate_speed),
            scene: Scene::new(handles),
            aspect,
            phase: LoopPhase::Initializing,
            config,
        }
    }

    /// Marks initialization as finished. Time spent loading does not count as a frame.
    pub fn start(&mut self, now: Instant) {
        if self.phase == LoopPhase::Initializing {
            self.clock = FrameClock::new(now);
            self.phase = LoopPhase::Running;
            log::info!("Entering frame loop");
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn should_close(&self) -> bool {
        self.phase == LoopPhase::Terminating
    }

    pub fn request_close(&mut self) {
        if self.phase != LoopPhase::Terminating {
            log::info!("Close requested");
            self.phase = LoopPhase::Terminating;
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation.degrees()
    }

    /// Measures the frame delta, applies held keys and advances the rotation.
    /// Returns the delta in seconds.
    pub fn begin_frame(&mut self, now: Instant) -> f32 {
        let delta_time = self.clock.tick(now);
        if self.phase != LoopPhase::Running {
            return delta_time;
        }

        if self.keys.is_pressed(CLOSE_KEY) {
            self.request_close();
        }
        for movement in self.keys.active_movements() {
            self.camera.process_keyboard(movement, delta_time);
        }
        self.rotation.advance(delta_time);

        log::trace!("Frame delta {:.4}s, angle {:.2}", delta_time, self.rotation.degrees());
        delta_time
    }

    pub fn matrices(&self) -> CameraMatrices {
        let projection = Mat4::perspective_rh(
            self.camera.zoom.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        );
        CameraMatrices::new(projection, self.camera.view_matrix())
    }

    pub fn frame_params(&self) -> FrameParams {
        FrameParams {
            matrices: self.matrices(),
            angle_degrees: self.rotation.degrees(),
            reflection_mode: self.config.reflection_mode,
            depth_range: (self.config.near, self.config.far),
            clear_color: self.config.clear_color,
        }
    }

    /// Records the reflection and composite passes for the current state.
    pub fn record_frame(&self) -> Result<FramePlan, PlanError> {
        record_frame(&self.scene, &self.frame_params())
    }
}

fn aspect_ratio(width: u32, height: u32) -> Option<f32> {
    (width > 0 && height > 0).then(|| width as f32 / height as f32)
}

impl InputSink for Viewer {
    fn on_resize(&mut self, width: u32, height: u32) {
        // Minimized windows report a zero size; keep the last usable aspect
        if let Some(aspect) = aspect_ratio(width, height) {
            self.aspect = aspect;
        }
    }

    fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let (dx, dy) = self.cursor.offset(x as f32, y as f32);
        self.camera.process_mouse_movement(dx, dy);
    }

    fn on_scroll(&mut self, dy: f32) {
        self.camera.process_mouse_scroll(dy);
    }

    fn on_key(&mut self, key: KeyCode, pressed: bool) {
        self.keys.set(key, pressed);
    }

    fn on_close_requested(&mut self) {
        self.request_close();
    }

    fn on_focus_lost(&mut self) {
        log::debug!("Focus lost, releasing held keys");
        self.keys.clear();
        self.cursor.reset();
    }
}
