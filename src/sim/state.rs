//! Stack model: placed layers and falling overhangs

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::backend::{PhysicsBackend, SceneBackend};
use super::factory::{BoxBody, BoxFactory};
use crate::settings::Settings;

/// Horizontal direction a layer slides along before it is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// The other horizontal axis
    #[inline]
    pub fn orthogonal(self) -> Axis {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Z => Vec3::Z,
        }
    }

    /// Component of `v` along this axis
    #[inline]
    pub fn of(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Z => v.z = value,
        }
    }

    /// Pick the box dimension that lies along this axis
    #[inline]
    pub fn extent(self, width: f32, depth: f32) -> f32 {
        match self {
            Axis::X => width,
            Axis::Z => depth,
        }
    }
}

/// A placed (or currently moving) box on the tower
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub body: BoxBody,
    /// Slide direction; `None` for the foundation
    pub axis: Option<Axis>,
}

impl Layer {
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.body.width
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.body.depth
    }
}

/// A falling fragment; its live transform is owned by the physics world
#[derive(Debug, Clone, PartialEq)]
pub struct Overhang {
    pub body: BoxBody,
}

/// The tower: layers in height order plus falling debris
#[derive(Debug, Clone, Default)]
pub struct Stack {
    pub layers: Vec<Layer>,
    pub overhangs: Vec<Overhang>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Current top (moving or just-cut) layer
    pub fn top(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Layer> {
        self.layers.last_mut()
    }

    /// Layer a new cut is measured against
    pub fn reference(&self) -> Option<&Layer> {
        self.layers.len().checked_sub(2).map(|i| &self.layers[i])
    }

    /// Append a static layer at height `box_height * len`
    pub fn add_layer<S: SceneBackend, P: PhysicsBackend>(
        &mut self,
        factory: &mut BoxFactory<S, P>,
        x: f32,
        z: f32,
        width: f32,
        depth: f32,
        axis: Option<Axis>,
    ) {
        let y = factory.box_height() * self.layers.len() as f32;
        let body = factory.create_box(x, y, z, width, depth, false);
        self.layers.push(Layer { body, axis });
    }

    /// Spawn a falling box at the height of the top layer
    pub fn add_overhang<S: SceneBackend, P: PhysicsBackend>(
        &mut self,
        factory: &mut BoxFactory<S, P>,
        x: f32,
        z: f32,
        width: f32,
        depth: f32,
    ) {
        let y = factory.box_height() * (self.layers.len() as f32 - 1.0);
        let body = factory.create_box(x, y, z, width, depth, true);
        log::debug!(
            "Overhang spawned at ({:.3}, {:.3}, {:.3}) size {:.3} x {:.3}",
            x,
            y,
            z,
            width,
            depth
        );
        self.overhangs.push(Overhang { body });
    }

    /// Tear down everything and rebuild the foundation plus the first moving layer
    pub fn reset<S: SceneBackend, P: PhysicsBackend>(
        &mut self,
        factory: &mut BoxFactory<S, P>,
        settings: &Settings,
    ) {
        self.layers.clear();
        self.overhangs.clear();
        factory.clear();

        let size = settings.initial_box_size;
        // Foundation
        self.add_layer(factory, 0.0, 0.0, size, size, None);
        // First layer
        self.add_layer(factory, settings.spawn_offset, 0.0, size, size, Some(Axis::X));
    }
}
