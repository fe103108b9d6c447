use glam::{Mat4, Vec3};
use winit::event::KeyEvent;
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::types::Uniforms;

/// Radians per second while an orbit key is held
pub const ORBIT_SPEED: f32 = 1.2;
/// Distance units per second while a zoom key is held
pub const ZOOM_SPEED: f32 = 1.5;
pub const MIN_DISTANCE: f32 = 1.3;
pub const MAX_DISTANCE: f32 = 10.0;
const MAX_PITCH: f32 = 1.45;
const Z_NEAR: f32 = 0.05;
const Z_FAR: f32 = 100.0;

#[derive(Default, Clone, Copy)]
pub struct MovementState {
    pub orbit_left: bool,
    pub orbit_right: bool,
    pub tilt_up: bool,
    pub tilt_down: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
}

impl MovementState {
    const fn to_direction(&self, positive: bool, negative: bool) -> f32 {
        match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// (yaw, pitch, distance) rates in [-1, 1]
    const fn velocity(&self) -> (f32, f32, f32) {
        (
            self.to_direction(self.orbit_right, self.orbit_left),
            self.to_direction(self.tilt_up, self.tilt_down),
            self.to_direction(self.zoom_out, self.zoom_in),
        )
    }

    const fn is_idle(&self) -> bool {
        !(self.orbit_left
            || self.orbit_right
            || self.tilt_up
            || self.tilt_down
            || self.zoom_in
            || self.zoom_out)
    }
}

/// Camera orbiting the globe at the origin
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
    pub aspect: f32,
    /// Globe rotation about its axis, radians
    pub spin: f32,
    /// Radians per second added to `spin`
    pub spin_rate: f32,
    pub movement: MovementState,
}

impl OrbitCamera {
    pub fn new(aspect: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.35,
            distance: 3.0,
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect,
            spin: 0.0,
            spin_rate: 0.0,
            movement: MovementState::default(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        ) * self.distance
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Apply held keys and spin for `delta` seconds. Returns true if the
    /// view changed.
    pub fn update(&mut self, delta: f32) -> bool {
        if self.movement.is_idle() && self.spin_rate == 0.0 {
            return false;
        }

        let (yaw, pitch, zoom) = self.movement.velocity();
        self.yaw += yaw * ORBIT_SPEED * delta;
        self.pitch = (self.pitch + pitch * ORBIT_SPEED * delta).clamp(-MAX_PITCH, MAX_PITCH);
        self.distance = (self.distance + zoom * ZOOM_SPEED * delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.spin = (self.spin + self.spin_rate * delta) % std::f32::consts::TAU;
        true
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_y(self.spin)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, Z_NEAR, Z_FAR)
    }

    pub fn to_uniform(&self) -> Uniforms {
        Uniforms::new(self.projection() * self.view() * self.model())
    }

    pub fn process_keyboard(&mut self, event: &KeyEvent) {
        let is_pressed = event.state.is_pressed();
        if let PhysicalKey::Code(keycode) = event.physical_key {
            match keycode {
                KeyCode::KeyA => self.movement.orbit_left = is_pressed,
                KeyCode::KeyD => self.movement.orbit_right = is_pressed,
                KeyCode::KeyW => self.movement.tilt_up = is_pressed,
                KeyCode::KeyS => self.movement.tilt_down = is_pressed,
                KeyCode::KeyE => self.movement.zoom_in = is_pressed,
                KeyCode::KeyQ => self.movement.zoom_out = is_pressed,
                _ => {}
            }
        }
    }
}
