use std::sync::Arc;
use std::time::Instant;

use winit::keyboard::KeyCode;
use winit::window::Window;

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod render;
pub mod scene;

pub use app::{LoopPhase, Viewer};
pub use config::ViewerConfig;
pub use error::ViewerError;

use input::InputSink;
use render::Renderer;

pub struct State {
    window: Arc<Window>,
    viewer: Viewer,
    renderer: Renderer,
}

impl State {
    pub fn new(window: Arc<Window>, config: ViewerConfig) -> Result<Self, ViewerError> {
        let started = Instant::now();
        let renderer = Renderer::new(window.clone(), &config)?;
        let mut viewer = Viewer::new(config, renderer.scene_handles(), started);

        let (width, height) = renderer.size();
        viewer.on_resize(width, height);
        viewer.start(Instant::now());
        log::info!("Initialized in {:.2}s", started.elapsed().as_secs_f32());

        Ok(Self {
            window,
            viewer,
            renderer,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn should_close(&self) -> bool {
        self.viewer.should_close()
    }

    /// Runs one iteration of the frame loop: input polling, plan recording, drawing and present.
    /// Only unrecoverable failures are returned.
    pub fn frame(&mut self) -> Result<(), ViewerError> {
        self.viewer.begin_frame(Instant::now());
        let plan = self.viewer.record_frame()?;

        match self.renderer.render(&plan) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.renderer.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(ViewerError::Present(wgpu::SurfaceError::OutOfMemory)),
            Err(e) => {
                log::error!("Dropped frame: {e:?}");
                Ok(())
            }
        }
    }
}

impl InputSink for State {
    fn on_resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.viewer.on_resize(width, height);
    }

    fn on_cursor_moved(&mut self, x: f64, y: f64) {
        self.viewer.on_cursor_moved(x, y);
    }

    fn on_scroll(&mut self, dy: f32) {
        self.viewer.on_scroll(dy);
    }

    fn on_key(&mut self, key: KeyCode, pressed: bool) {
        self.viewer.on_key(key, pressed);
    }

    fn on_close_requested(&mut self) {
        self.viewer.on_close_requested();
    }

    fn on_focus_lost(&mut self) {
        self.viewer.on_focus_lost();
    }
}
