//! Fixed-interval tick driving camera motion and redraw requests.

use std::time::{Duration, Instant};

use glam::Vec2;

use crate::camera::Camera;
use crate::input::MovementKeys;

/// Nominal tick rate of the frame loop.
pub const TICK_HZ: u32 = 60;

/// Advances the camera from held keys and mouse drags once per tick.
///
/// The controller never renders itself; [`FrameController::tick`] reports
/// whether the frame is stale and the caller requests the redraw.
#[derive(Clone, Debug)]
pub struct FrameController {
    interval: Duration,
    next_tick: Instant,
    last_tick: Instant,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Look sensitivity in radians per pixel of drag.
    pub sensitivity: f32,
}

impl Default for FrameController {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl FrameController {
    pub fn new(now: Instant) -> Self {
        let interval = Duration::from_secs(1) / TICK_HZ;
        Self {
            interval,
            next_tick: now + interval,
            last_tick: now,
            speed: 5.0,
            sensitivity: 0.003,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the event loop should wake for the next tick.
    pub fn next_deadline(&self) -> Instant {
        self.next_tick
    }

    /// Returns the elapsed time since the previous tick if the deadline has
    /// passed, and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> Option<f32> {
        if now < self.next_tick {
            return None;
        }
        let dt = now.saturating_duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.next_tick = now + self.interval;
        Some(dt)
    }

    /// Applies one tick of motion. Returns `true` if the camera moved and the
    /// frame needs to be redrawn.
    pub fn tick(&self, dt: f32, keys: &MovementKeys, drag: Vec2, camera: &mut Camera) -> bool {
        let mut changed = false;

        if drag != Vec2::ZERO {
            camera.rotate_around_up(-drag.x * self.sensitivity);
            camera.rotate_around_right(-drag.y * self.sensitivity);
            changed = true;
        }

        if keys.any() {
            let direction = keys.direction(camera.flat_forward(), camera.right());
            if direction != glam::Vec3::ZERO {
                camera.translate(direction * self.speed * dt);
                changed = true;
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn forward_motion_stays_level() {
        let controller = FrameController::default();
        let mut camera = Camera::new();
        camera.set_view_matrix(Vec3::ZERO, Vec3::new(0.0, -1.0, -1.0), Vec3::Y);

        let keys = MovementKeys {
            forward: true,
            ..Default::default()
        };
        assert!(controller.tick(0.5, &keys, Vec2::ZERO, &mut camera));

        let p = camera.position();
        assert_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, -2.5, epsilon = 1e-5);
    }

    #[test]
    fn idle_tick_requests_nothing() {
        let controller = FrameController::default();
        let mut camera = Camera::new();
        let before = camera.clone();
        assert!(!controller.tick(1.0 / 60.0, &MovementKeys::default(), Vec2::ZERO, &mut camera));
        assert_eq!(camera, before);
    }

    #[test]
    fn drag_right_turns_right() {
        let controller = FrameController::default();
        let mut camera = Camera::new();
        assert!(controller.tick(0.0, &MovementKeys::default(), Vec2::new(100.0, 0.0), &mut camera));
        assert!(camera.look().x > 0.0);
    }

    #[test]
    fn poll_waits_for_the_interval() {
        let start = Instant::now();
        let mut controller = FrameController::new(start);

        assert_eq!(controller.poll(start), None);

        let later = start + controller.interval() * 2;
        let dt = controller.poll(later).unwrap();
        assert_relative_eq!(dt, 2.0 / TICK_HZ as f32, epsilon = 1e-4);
        assert_eq!(controller.next_deadline(), later + controller.interval());
    }
}
