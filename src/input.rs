//! Keyboard and mouse state for the fly camera.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

pub const MOVE_SPEED: f32 = 3.0;
pub const LOOK_SENSITIVITY: f32 = 0.004;
pub const DOLLY_STEP: f32 = 0.5;
/// Pitch stays strictly inside +-1.5 rad so the view basis never degenerates
/// at the poles.
pub const PITCH_LIMIT: f32 = 1.5;

const FAST_MULTIPLIER: f32 = 4.0;
const SLOW_MULTIPLIER: f32 = 0.2;

const HOME_POSITION: Vec3 = Vec3::new(0.0, -1.0, -2.5);

/// WASD/QE fly camera driven by key state, right-drag look and scroll dolly.
/// Holds the camera pose as translation plus YXZ Euler angles, the same
/// convention `Camera::set_view_yxz` consumes.
pub struct CameraController {
    pub position: Vec3,
    pub rotation: Vec3,
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    fast: bool,
    slow: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            position: HOME_POSITION,
            rotation: Vec3::ZERO,
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            fast: false,
            slow: false,
        }
    }
}

impl CameraController {
    /// Records a key transition. Returns true when the key is one the
    /// controller cares about.
    pub fn process_key(&mut self, code: KeyCode, state: ElementState) -> bool {
        let pressed = state.is_pressed();
        let flag = match code {
            KeyCode::KeyW => &mut self.forward,
            KeyCode::KeyS => &mut self.backward,
            KeyCode::KeyA => &mut self.left,
            KeyCode::KeyD => &mut self.right,
            KeyCode::KeyE => &mut self.up,
            KeyCode::KeyQ => &mut self.down,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => &mut self.fast,
            KeyCode::ControlLeft | KeyCode::ControlRight => &mut self.slow,
            _ => return false,
        };
        *flag = pressed;
        true
    }

    /// Applies a right-drag delta in window pixels. Yaw wraps into
    /// `[0, TAU)` and pitch clamps so the camera cannot flip over.
    pub fn apply_look(&mut self, delta: Vec2) {
        self.rotation.y = (self.rotation.y + delta.x * LOOK_SENSITIVITY).rem_euclid(TAU);
        self.rotation.x =
            (self.rotation.x + delta.y * LOOK_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves along the current view direction, scroll-wheel style.
    pub fn dolly(&mut self, scroll: f32) {
        self.position += self.view_forward() * scroll * DOLLY_STEP * self.speed_multiplier();
    }

    /// Integrates held movement keys over `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let forward = self.view_forward();
        let yaw = self.rotation.y;
        let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());
        let up = Vec3::new(0.0, -1.0, 0.0);

        let mut direction = Vec3::ZERO;
        if self.forward {
            direction += forward;
        }
        if self.backward {
            direction -= forward;
        }
        if self.right {
            direction += right;
        }
        if self.left {
            direction -= right;
        }
        if self.up {
            direction += up;
        }
        if self.down {
            direction -= up;
        }

        if direction.length_squared() > f32::EPSILON {
            self.position +=
                direction.normalize() * MOVE_SPEED * self.speed_multiplier() * dt;
        }
    }

    pub fn reset(&mut self) {
        self.position = HOME_POSITION;
        self.rotation = Vec3::ZERO;
    }

    fn speed_multiplier(&self) -> f32 {
        if self.fast {
            FAST_MULTIPLIER
        } else if self.slow {
            SLOW_MULTIPLIER
        } else {
            1.0
        }
    }

    fn view_forward(&self) -> Vec3 {
        let (pitch, yaw) = (self.rotation.x, self.rotation.y);
        Vec3::new(
            yaw.sin() * pitch.cos(),
            -pitch.sin(),
            yaw.cos() * pitch.cos(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(controller: &mut CameraController, code: KeyCode) {
        assert!(controller.process_key(code, ElementState::Pressed));
    }

    #[test]
    fn pitch_clamps_and_yaw_wraps() {
        let mut controller = CameraController::default();
        // Drag hard down-right for a while.
        for _ in 0..10_000 {
            controller.apply_look(Vec2::new(7.0, 11.0));
        }
        assert!(controller.rotation.x <= PITCH_LIMIT);
        assert!(controller.rotation.x >= -PITCH_LIMIT);
        assert!(controller.rotation.y >= 0.0 && controller.rotation.y < TAU);

        for _ in 0..10_000 {
            controller.apply_look(Vec2::new(-7.0, -11.0));
        }
        assert!(controller.rotation.x >= -PITCH_LIMIT);
        assert!(controller.rotation.y >= 0.0 && controller.rotation.y < TAU);
    }

    #[test]
    fn forward_key_moves_along_plus_z_at_zero_rotation() {
        let mut controller = CameraController::default();
        let start = controller.position;
        press(&mut controller, KeyCode::KeyW);
        controller.update(1.0);
        let moved = controller.position - start;
        assert!((moved.z - MOVE_SPEED).abs() < 1e-5);
        assert!(moved.x.abs() < 1e-6 && moved.y.abs() < 1e-6);
    }

    #[test]
    fn shift_and_ctrl_scale_speed() {
        let mut fast = CameraController::default();
        press(&mut fast, KeyCode::KeyW);
        press(&mut fast, KeyCode::ShiftLeft);
        let start = fast.position;
        fast.update(1.0);
        assert!(((fast.position - start).z - MOVE_SPEED * 4.0).abs() < 1e-4);

        let mut slow = CameraController::default();
        press(&mut slow, KeyCode::KeyW);
        press(&mut slow, KeyCode::ControlLeft);
        let start = slow.position;
        slow.update(1.0);
        assert!(((slow.position - start).z - MOVE_SPEED * 0.2).abs() < 1e-5);
    }

    #[test]
    fn releasing_a_key_stops_movement() {
        let mut controller = CameraController::default();
        press(&mut controller, KeyCode::KeyD);
        controller.process_key(KeyCode::KeyD, ElementState::Released);
        let start = controller.position;
        controller.update(1.0);
        assert_eq!(controller.position, start);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut controller = CameraController::default();
        press(&mut controller, KeyCode::KeyW);
        press(&mut controller, KeyCode::KeyS);
        let start = controller.position;
        controller.update(1.0);
        assert_eq!(controller.position, start);
    }

    #[test]
    fn reset_returns_home() {
        let mut controller = CameraController::default();
        controller.apply_look(Vec2::new(300.0, 100.0));
        press(&mut controller, KeyCode::KeyW);
        controller.update(2.0);
        controller.reset();
        assert_eq!(controller.position, HOME_POSITION);
        assert_eq!(controller.rotation, Vec3::ZERO);
    }
}
