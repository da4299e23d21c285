//! Collaborator interfaces
//!
//! The simulation never talks to a concrete renderer or physics engine.
//! Every box exists twice: once as a mesh in a [`SceneBackend`] and once as a
//! rigid body in a [`PhysicsBackend`]. Handles are opaque ids issued by the
//! backend that created them.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to a mesh in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalHandle(pub u32);

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Normalized sRGB components for GPU upload
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Renderer/scene graph collaborator
pub trait SceneBackend {
    /// Insert a flat-shaded box of full extents `size` centered at `position`
    fn create_box(&mut self, position: Vec3, size: Vec3, color: Rgba) -> VisualHandle;
    fn remove(&mut self, handle: VisualHandle);
    fn set_position(&mut self, handle: VisualHandle, position: Vec3);
    /// Scale relative to the size the box was created with
    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3);
    fn set_orientation(&mut self, handle: VisualHandle, orientation: Quat);
    /// Remove every mesh
    fn clear(&mut self);

    fn set_camera_position(&mut self, position: Vec3);
    fn look_at(&mut self, target: Vec3);
    /// Viewport changed (window resize)
    fn resize(&mut self, width: u32, height: u32);
    fn render_frame(&mut self);
}

/// Rigid-body physics collaborator
pub trait PhysicsBackend {
    /// Insert a cuboid body. `mass == 0` makes it fixed (immovable).
    fn create_box(&mut self, position: Vec3, half_extents: Vec3, mass: f32) -> PhysicalHandle;
    fn remove(&mut self, handle: PhysicalHandle);
    /// Teleport a body
    fn set_position(&mut self, handle: PhysicalHandle, position: Vec3);
    /// Destroy the body's collider and attach a fresh cuboid; colliders are never rescaled
    fn replace_collider_shape(&mut self, handle: PhysicalHandle, half_extents: Vec3);
    /// Advance the world by exactly `dt` seconds
    fn step(&mut self, dt: f32);
    /// Current (position, orientation) of a body
    fn transform(&self, handle: PhysicalHandle) -> Option<(Vec3, Quat)>;
    /// Remove every body
    fn clear(&mut self);
}
