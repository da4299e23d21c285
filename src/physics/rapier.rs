//! Rapier world wrapper
//!
//! Mass-0 boxes become fixed bodies; anything heavier is dynamic with the
//! mass set on its collider.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;

use crate::consts::SOLVER_ITERATIONS;
use crate::sim::backend::{PhysicalHandle, PhysicsBackend};

/// Surface friction for every box
const BOX_FRICTION: f32 = 0.3;

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    handle: RigidBodyHandle,
    mass: f32,
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Our handles → Rapier handles, in creation order
    entries: BTreeMap<PhysicalHandle, BodyEntry>,
    next_id: u32,
}

impl RapierWorld {
    pub fn new(gravity_y: f32) -> Self {
        let integration_params = IntegrationParameters {
            num_solver_iterations: NonZeroUsize::new(SOLVER_ITERATIONS).unwrap_or(NonZeroUsize::MIN),
            ..Default::default()
        };
        Self {
            gravity: vector![0.0, gravity_y, 0.0],
            integration_params,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Mass the body was created with (0 for fixed bodies)
    pub fn mass(&self, handle: PhysicalHandle) -> Option<f32> {
        self.entries.get(&handle).map(|e| e.mass)
    }

    pub fn is_fixed(&self, handle: PhysicalHandle) -> bool {
        self.entries
            .get(&handle)
            .and_then(|e| self.bodies.get(e.handle))
            .map(|b| b.is_fixed())
            .unwrap_or(false)
    }

    /// Half-extents of the body's cuboid collider
    pub fn half_extents(&self, handle: PhysicalHandle) -> Option<Vec3> {
        let entry = self.entries.get(&handle)?;
        let body = self.bodies.get(entry.handle)?;
        let collider = self.colliders.get(*body.colliders().first()?)?;
        let cuboid = collider.shape().as_cuboid()?;
        let he = cuboid.half_extents;
        Some(Vec3::new(he.x, he.y, he.z))
    }

    fn cuboid(half_extents: Vec3, mass: f32) -> Collider {
        let builder = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(BOX_FRICTION);
        if mass > 0.0 {
            builder.mass(mass).build()
        } else {
            builder.build()
        }
    }
}

impl PhysicsBackend for RapierWorld {
    fn create_box(&mut self, position: Vec3, half_extents: Vec3, mass: f32) -> PhysicalHandle {
        let builder = if mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder
            .translation(vector![position.x, position.y, position.z])
            .build();
        let rb = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(Self::cuboid(half_extents, mass), rb, &mut self.bodies);

        let handle = PhysicalHandle(self.next_id);
        self.next_id += 1;
        self.entries.insert(handle, BodyEntry { handle: rb, mass });
        handle
    }

    fn remove(&mut self, handle: PhysicalHandle) {
        if let Some(entry) = self.entries.remove(&handle) {
            self.bodies.remove(
                entry.handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
    }

    fn set_position(&mut self, handle: PhysicalHandle, position: Vec3) {
        let Some(entry) = self.entries.get(&handle) else {
            return;
        };
        if let Some(body) = self.bodies.get_mut(entry.handle) {
            body.set_translation(vector![position.x, position.y, position.z], true);
        }
    }

    fn replace_collider_shape(&mut self, handle: PhysicalHandle, half_extents: Vec3) {
        let Some(entry) = self.entries.get(&handle).copied() else {
            return;
        };
        let Some(body) = self.bodies.get(entry.handle) else {
            return;
        };

        let attached: Vec<ColliderHandle> = body.colliders().to_vec();
        for collider in attached {
            self.colliders
                .remove(collider, &mut self.island_manager, &mut self.bodies, true);
        }
        self.colliders.insert_with_parent(
            Self::cuboid(half_extents, entry.mass),
            entry.handle,
            &mut self.bodies,
        );
    }

    fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
    }

    fn transform(&self, handle: PhysicalHandle) -> Option<(Vec3, Quat)> {
        let entry = self.entries.get(&handle)?;
        let body = self.bodies.get(entry.handle)?;
        let t = body.translation();
        let q = body.rotation().coords;
        Some((Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(q.x, q.y, q.z, q.w)))
    }

    fn clear(&mut self) {
        self.island_manager = IslandManager::new();
        self.broad_phase = BroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.ccd = CCDSolver::new();
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_solver_iterations() {
        let world = RapierWorld::new(-9.82);
        assert_eq!(world.integration_params.num_solver_iterations.get(), SOLVER_ITERATIONS);
    }

    #[test]
    fn test_fixed_body_stays_put() {
        let mut world = RapierWorld::new(-9.82);
        let h = world.create_box(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.5, 0.5, 1.5), 0.0);
        for _ in 0..60 {
            world.step(DT);
        }
        assert_eq!(world.transform(h).unwrap().0, Vec3::ZERO);
        assert!(world.is_fixed(h));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = RapierWorld::new(-9.82);
        let h = world.create_box(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.5, 0.5, 0.5), 5.0);
        for _ in 0..30 {
            world.step(DT);
        }
        let (pos, _) = world.transform(h).unwrap();
        assert!(pos.y < 10.0);
        assert!(!world.is_fixed(h));
    }

    #[test]
    fn test_falling_box_lands_on_fixed_box() {
        let mut world = RapierWorld::new(-9.82);
        world.create_box(Vec3::ZERO, Vec3::new(1.5, 0.5, 1.5), 0.0);
        let h = world.create_box(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.5, 0.5, 0.5), 5.0);
        for _ in 0..120 {
            world.step(DT);
        }
        let (pos, _) = world.transform(h).unwrap();
        assert!((pos.y - 1.0).abs() < 0.1, "resting height {}", pos.y);
    }

    #[test]
    fn test_replace_collider_shape() {
        let mut world = RapierWorld::new(-9.82);
        let h = world.create_box(Vec3::ZERO, Vec3::new(1.5, 0.5, 1.5), 0.0);
        world.replace_collider_shape(h, Vec3::new(1.0, 0.5, 1.5));
        assert_eq!(world.half_extents(h), Some(Vec3::new(1.0, 0.5, 1.5)));
        assert_eq!(world.colliders.len(), 1);
    }

    #[test]
    fn test_set_position_teleports() {
        let mut world = RapierWorld::new(-9.82);
        let h = world.create_box(Vec3::ZERO, Vec3::splat(0.5), 0.0);
        world.set_position(h, Vec3::new(2.0, 1.0, -3.0));
        assert_eq!(world.transform(h).unwrap().0, Vec3::new(2.0, 1.0, -3.0));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut world = RapierWorld::new(-9.82);
        let a = world.create_box(Vec3::ZERO, Vec3::splat(0.5), 0.0);
        let b = world.create_box(Vec3::Y, Vec3::splat(0.5), 5.0);
        world.remove(a);
        assert!(world.transform(a).is_none());
        assert_eq!(world.body_count(), 1);

        world.clear();
        assert!(world.transform(b).is_none());
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.colliders.len(), 0);

        // Handles are never reused
        let c = world.create_box(Vec3::ZERO, Vec3::splat(0.5), 0.0);
        assert_ne!(c, a);
        assert_ne!(c, b);
    }
}
