//! Physics → scene synchronization
//!
//! Only overhangs move under physics. Static layers are driven by gameplay
//! and never read back.

use super::backend::{PhysicsBackend, SceneBackend};
use super::factory::BoxFactory;
use super::state::Stack;

/// Advance physics by one fixed step and copy overhang transforms to their meshes
pub fn step_physics<S: SceneBackend, P: PhysicsBackend>(
    stack: &Stack,
    factory: &mut BoxFactory<S, P>,
    dt: f32,
) {
    factory.physics.step(dt);

    for overhang in &stack.overhangs {
        if let Some((position, orientation)) = factory.physics.transform(overhang.body.physical) {
            factory.scene.set_position(overhang.body.visual, position);
            factory.scene.set_orientation(overhang.body.visual, orientation);
        }
    }
}
