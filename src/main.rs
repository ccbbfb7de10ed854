use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    window::{CursorGrabMode, Window, WindowBuilder},
};

use timestone_viewer::config::WINDOW_TITLE;
use timestone_viewer::input::{dispatch_window_event, InputSink, VirtualCursor};
use timestone_viewer::render::ReflectionMode;
use timestone_viewer::scene::camera::{DEFAULT_SENSITIVITY, DEFAULT_SPEED};
use timestone_viewer::{State, ViewerConfig, ViewerError};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding objects/ and textures/
    #[arg(long, default_value = "resources")]
    assets: PathBuf,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Camera movement speed in units per second
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    speed: f32,

    /// Degrees of rotation per pixel of mouse motion
    #[arg(long, default_value_t = DEFAULT_SENSITIVITY)]
    sensitivity: f32,

    /// Time Stone spin in degrees per second
    #[arg(long, default_value_t = 32.0)]
    rotate_speed: f32,

    /// Edge length of each reflection cubemap face
    #[arg(long, default_value_t = 512)]
    reflection_size: u32,

    /// Render each reflection face from the mirror's position
    #[arg(long)]
    true_reflections: bool,
}

impl Args {
    fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            window_width: self.width,
            window_height: self.height,
            movement_speed: self.speed,
            mouse_sensitivity: self.sensitivity,
            rotate_speed: self.rotate_speed,
            reflection_size: self.reflection_size.max(1),
            reflection_mode: if self.true_reflections {
                ReflectionMode::PerFace
            } else {
                ReflectionMode::MainCamera
            },
            ..ViewerConfig::default()
        }
        .with_asset_root(&self.assets)
    }
}

fn grab_cursor(window: &Window) -> bool {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_e| window.set_cursor_grab(CursorGrabMode::Locked));
    match grabbed {
        Ok(()) => {
            window.set_cursor_visible(false);
            true
        }
        Err(e) => {
            log::warn!("Cursor grab unavailable, using window cursor events: {e}");
            false
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = args.viewer_config();
    log::debug!("Configuration: {config:?}");

    let event_loop = EventLoop::new().map_err(ViewerError::from)?;
    let window = WindowBuilder::new()
        .with_title(WINDOW_TITLE)
        .with_inner_size(PhysicalSize::new(config.window_width, config.window_height))
        .with_visible(true)
        .build(&event_loop)
        .map_err(ViewerError::from)?;
    let window = Arc::new(window);

    let mut state = State::new(window.clone(), config).context("failed to initialize viewer")?;

    let cursor_grabbed = grab_cursor(&window);
    let size = window.inner_size();
    let mut virtual_cursor = VirtualCursor::new(size.width as f64 / 2.0, size.height as f64 / 2.0);

    let failure: Rc<RefCell<Option<ViewerError>>> = Rc::new(RefCell::new(None));
    let loop_failure = failure.clone();

    event_loop
        .run(move |event, elwt| {
            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        // Grabbed cursors report motion through device events only
                        WindowEvent::CursorMoved { .. } if cursor_grabbed => {}
                        WindowEvent::RedrawRequested => {
                            if let Err(e) = state.frame() {
                                *loop_failure.borrow_mut() = Some(e);
                                elwt.exit();
                            }
                        }
                        ref other => {
                            dispatch_window_event(&mut state, other);
                        }
                    }
                }
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta },
                    ..
                } if cursor_grabbed => {
                    let (x, y) = virtual_cursor.apply_motion(delta.0, delta.1);
                    state.on_cursor_moved(x, y);
                }
                Event::AboutToWait => {
                    state.window().request_redraw();
                }
                _ => {}
            }

            if state.should_close() {
                elwt.exit();
            }
        })
        .map_err(ViewerError::from)?;

    let failure = failure.borrow_mut().take();
    match failure {
        Some(e) => Err(e).context("frame loop aborted"),
        None => {
            log::info!("Viewer closed");
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{e:?}");
        std::process::exit(1);
    }
}
