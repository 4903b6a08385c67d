use std::collections::HashSet;

use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Which movement keys are currently held.
///
/// Updated by [`Input::handle_event`] and read once per tick by the frame
/// controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MovementKeys {
    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right || self.up || self.down
    }

    /// Sum of the held directions, given the camera's level forward and right
    /// axes. Opposite keys cancel. The result is not normalized.
    pub fn direction(&self, forward: Vec3, right: Vec3) -> Vec3 {
        let axis = |pos: bool, neg: bool| pos as i32 as f32 - neg as i32 as f32;

        forward * axis(self.forward, self.back)
            + right * axis(self.right, self.left)
            + Vec3::Y * axis(self.up, self.down)
    }

    /// Sets the flag bound to `key`. Returns `false` if the key moves nothing.
    fn set(&mut self, key: KeyCode, held: bool) -> bool {
        let flag = match key {
            KeyCode::KeyW => &mut self.forward,
            KeyCode::KeyS => &mut self.back,
            KeyCode::KeyA => &mut self.left,
            KeyCode::KeyD => &mut self.right,
            KeyCode::Space => &mut self.up,
            KeyCode::ControlLeft | KeyCode::ControlRight => &mut self.down,
            _ => return false,
        };
        *flag = held;
        true
    }
}

/// Keyboard and mouse state for one window.
#[derive(Debug, Default)]
pub struct Input {
    movement: MovementKeys,
    keys_pressed: HashSet<KeyCode>,
    dragging: bool,
    mouse_position: Option<Vec2>,
    drag_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets which keys went down. Call once the presses have been acted on.
    pub fn clear_pressed(&mut self) {
        self.keys_pressed.clear();
    }

    /// Process a window event. Returns `true` if the event changed anything
    /// that should trigger a redraw.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return false;
                };
                let held = event.state == ElementState::Pressed;
                if held && !event.repeat {
                    self.keys_pressed.insert(key);
                }
                self.movement.set(key, held)
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = *state == ElementState::Pressed;
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                let moved = match self.mouse_position {
                    Some(old) if self.dragging => {
                        self.drag_delta += new_pos - old;
                        true
                    }
                    _ => false,
                };
                self.mouse_position = Some(new_pos);
                moved
            }
            WindowEvent::Focused(false) => {
                self.movement = MovementKeys::default();
                self.dragging = false;
                false
            }
            _ => false,
        }
    }

    pub fn movement(&self) -> MovementKeys {
        self.movement
    }

    /// Returns true if the key went down since the last [`Input::clear_pressed`].
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Takes the cursor motion accumulated while the left button was held,
    /// leaving zero behind.
    pub fn take_drag_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.drag_delta)
    }
}
