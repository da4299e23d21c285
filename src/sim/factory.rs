//! Paired visual + physical box construction

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::backend::{PhysicalHandle, PhysicsBackend, Rgba, SceneBackend, VisualHandle};
use crate::settings::Settings;

/// One box living in both the scene and the physics world
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBody {
    pub visual: VisualHandle,
    pub physical: PhysicalHandle,
    /// Model position (center). For falling boxes this is the spawn position;
    /// the live transform belongs to the physics world.
    pub position: Vec3,
    pub width: f32,
    pub depth: f32,
}

/// Owns the scene and physics world and builds boxes into both
pub struct BoxFactory<S, P> {
    pub scene: S,
    pub physics: P,
    rng: Pcg32,
    box_height: f32,
    falling_mass: f32,
}

impl<S: SceneBackend, P: PhysicsBackend> BoxFactory<S, P> {
    pub fn new(scene: S, physics: P, settings: &Settings, seed: u64) -> Self {
        Self {
            scene,
            physics,
            rng: Pcg32::seed_from_u64(seed),
            box_height: settings.box_height,
            falling_mass: settings.falling_mass,
        }
    }

    #[inline]
    pub fn box_height(&self) -> f32 {
        self.box_height
    }

    /// Build a box of `width` x box height x `depth` centered at `(x, y, z)`.
    ///
    /// Falling boxes get a positive mass and are simulated; others are fixed.
    pub fn create_box(&mut self, x: f32, y: f32, z: f32, width: f32, depth: f32, falling: bool) -> BoxBody {
        let position = Vec3::new(x, y, z);
        let size = Vec3::new(width, self.box_height, depth);
        let color = self.random_color();

        let visual = self.scene.create_box(position, size, color);
        let mass = if falling { self.falling_mass } else { 0.0 };
        let physical = self.physics.create_box(position, size / 2.0, mass);

        BoxBody {
            visual,
            physical,
            position,
            width,
            depth,
        }
    }

    /// Remove a box from both worlds
    pub fn destroy(&mut self, body: &BoxBody) {
        self.physics.remove(body.physical);
        self.scene.remove(body.visual);
    }

    /// Remove every box from both worlds
    pub fn clear(&mut self) {
        self.physics.clear();
        self.scene.clear();
    }

    /// Uniform random opaque color, 0-255 per channel
    fn random_color(&mut self) -> Rgba {
        Rgba::opaque(self.rng.random(), self.rng.random(), self.rng.random())
    }
}
