use std::collections::HashSet;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::scene::camera::CameraMovement;

/// Held keys that move the camera while pressed.
pub const MOVEMENT_BINDINGS: [(KeyCode, CameraMovement); 6] = [
    (KeyCode::KeyW, CameraMovement::Forward),
    (KeyCode::KeyS, CameraMovement::Backward),
    (KeyCode::KeyA, CameraMovement::Left),
    (KeyCode::KeyD, CameraMovement::Right),
    (KeyCode::Space, CameraMovement::Up),
    (KeyCode::ShiftLeft, CameraMovement::Down),
];

pub const CLOSE_KEY: KeyCode = KeyCode::Escape;

/// Receiver for the events the windowing layer delivers outside of key polling.
pub trait InputSink {
    fn on_resize(&mut self, width: u32, height: u32);
    fn on_cursor_moved(&mut self, x: f64, y: f64);
    fn on_scroll(&mut self, dy: f32);
    fn on_key(&mut self, key: KeyCode, pressed: bool);
    fn on_close_requested(&mut self);
    /// Key releases and cursor motion are not delivered while unfocused.
    fn on_focus_lost(&mut self);
}

/// Routes a winit window event to `sink`. Returns false for events the
/// sink has no interest in.
pub fn dispatch_window_event<S: InputSink + ?Sized>(sink: &mut S, event: &WindowEvent) -> bool {
    match event {
        WindowEvent::Resized(size) => {
            sink.on_resize(size.width, size.height);
            true
        }
        WindowEvent::CursorMoved { position, .. } => {
            sink.on_cursor_moved(position.x, position.y);
            true
        }
        WindowEvent::MouseWheel { delta, .. } => {
            sink.on_scroll(scroll_lines(delta));
            true
        }
        WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
            PhysicalKey::Code(key) => {
                sink.on_key(key, event.state == ElementState::Pressed);
                true
            }
            PhysicalKey::Unidentified(_) => false,
        },
        WindowEvent::CloseRequested => {
            sink.on_close_requested();
            true
        }
        WindowEvent::Focused(false) => {
            sink.on_focus_lost();
            true
        }
        _ => false,
    }
}

/// Pixel deltas (touchpads) are scaled down to roughly one line per notch.
pub fn scroll_lines(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
    }
}

#[derive(Debug, Default, Clone)]
pub struct KeyState {
    pressed: HashSet<KeyCode>,
}

impl KeyState {
    pub fn set(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn active_movements(&self) -> impl Iterator<Item = CameraMovement> + '_ {
        MOVEMENT_BINDINGS
            .iter()
            .filter(|(key, _)| self.is_pressed(*key))
            .map(|(_, movement)| *movement)
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

/// Converts absolute cursor samples into offsets. The first sample only
/// seeds the tracker.
#[derive(Debug, Default, Clone, Copy)]
pub struct CursorTracker {
    last: Option<(f32, f32)>,
}

impl CursorTracker {
    /// Returns (dx, dy) with y pointing up.
    pub fn offset(&mut self, x: f32, y: f32) -> (f32, f32) {
        let (last_x, last_y) = self.last.unwrap_or((x, y));
        self.last = Some((x, y));
        (x - last_x, last_y - y)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Unbounded cursor position built from raw device motion, used while the
/// real cursor is grabbed and hidden.
#[derive(Debug, Clone, Copy)]
pub struct VirtualCursor {
    x: f64,
    y: f64,
}

impl VirtualCursor {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn apply_motion(&mut self, dx: f64, dy: f64) -> (f64, f64) {
        self.x += dx;
        self.y += dy;
        (self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::{PhysicalPosition, PhysicalSize};

    #[derive(Default)]
    struct Recorder {
        resized: Option<(u32, u32)>,
        cursor: Vec<(f64, f64)>,
        scroll: Vec<f32>,
        closed: bool,
        focus_lost: bool,
    }

    impl InputSink for Recorder {
        fn on_resize(&mut self, width: u32, height: u32) {
            self.resized = Some((width, height));
        }
        fn on_cursor_moved(&mut self, x: f64, y: f64) {
            self.cursor.push((x, y));
        }
        fn on_scroll(&mut self, dy: f32) {
            self.scroll.push(dy);
        }
        fn on_key(&mut self, _key: KeyCode, _pressed: bool) {}
        fn on_close_requested(&mut self) {
            self.closed = true;
        }
        fn on_focus_lost(&mut self) {
            self.focus_lost = true;
        }
    }

    #[test]
    fn test_first_cursor_sample_has_no_offset() {
        let mut tracker = CursorTracker::default();
        assert_eq!(tracker.offset(400.0, 300.0), (0.0, 0.0));
        assert_eq!(tracker.offset(410.0, 300.0), (10.0, 0.0));
        // Screen y grows downward, camera pitch grows upward
        assert_eq!(tracker.offset(410.0, 280.0), (0.0, 20.0));
    }

    #[test]
    fn test_cursor_reset_reseeds() {
        let mut tracker = CursorTracker::default();
        tracker.offset(0.0, 0.0);
        tracker.reset();
        assert_eq!(tracker.offset(900.0, 900.0), (0.0, 0.0));
    }

    #[test]
    fn test_key_state() {
        let mut keys = KeyState::default();
        keys.set(KeyCode::KeyW, true);
        keys.set(KeyCode::Space, true);
        keys.set(KeyCode::KeyQ, true);

        let movements: Vec<_> = keys.active_movements().collect();
        assert_eq!(movements, vec![CameraMovement::Forward, CameraMovement::Up]);

        keys.set(KeyCode::KeyW, false);
        assert!(!keys.is_pressed(KeyCode::KeyW));
        assert_eq!(keys.active_movements().count(), 1);

        keys.clear();
        assert_eq!(keys.active_movements().count(), 0);
    }

    #[test]
    fn test_virtual_cursor_accumulates() {
        let mut cursor = VirtualCursor::new(400.0, 300.0);
        assert_eq!(cursor.apply_motion(5.0, -2.0), (405.0, 298.0));
        assert_eq!(cursor.apply_motion(-1000.0, 0.0), (-595.0, 298.0));
    }

    #[test]
    fn test_dispatch_routes_events() {
        let mut sink = Recorder::default();

        assert!(dispatch_window_event(&mut sink, &WindowEvent::Resized(PhysicalSize::new(1024, 768))));
        assert_eq!(sink.resized, Some((1024, 768)));

        assert!(dispatch_window_event(&mut sink, &WindowEvent::CloseRequested));
        assert!(sink.closed);

        assert!(!dispatch_window_event(&mut sink, &WindowEvent::Focused(true)));
        assert!(!sink.focus_lost);
        assert!(dispatch_window_event(&mut sink, &WindowEvent::Focused(false)));
        assert!(sink.focus_lost);
        assert!(sink.cursor.is_empty());
    }

    #[test]
    fn test_scroll_line_conversion() {
        assert_eq!(scroll_lines(&MouseScrollDelta::LineDelta(0.0, -5.0)), -5.0);
        let pixels = scroll_lines(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 30.0)));
        assert!((pixels - 3.0).abs() < 1e-5);
    }
}
