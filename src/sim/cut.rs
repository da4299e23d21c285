//! Cut/overlap engine
//!
//! When the player drops the moving layer, the part hanging past the layer
//! below is sliced off and falls; the rest stays as the new top. A drop with
//! no overlap at all ends the game.

use glam::Vec3;

use super::backend::{PhysicsBackend, SceneBackend};
use super::factory::BoxFactory;
use super::state::{Axis, Stack};
use crate::settings::Settings;

/// Footprint of a box to be spawned (y is decided by the stack)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
}

/// Spawn parameters for the layer that slides in after a successful cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextLayer {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub depth: f32,
    pub axis: Axis,
}

/// Geometry of a successful cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutPlan {
    pub axis: Axis,
    /// Signed offset of the top layer from the reference layer along `axis`
    pub delta: f32,
    /// Top layer extent along `axis` before the cut
    pub size: f32,
    /// Surviving extent along `axis`
    pub overlap: f32,
    /// Top layer after recentring
    pub top_position: Vec3,
    pub top_width: f32,
    pub top_depth: f32,
    /// Sliced-off piece; `None` on a perfect drop, since a zero-extent
    /// cuboid has no volume to give a falling body mass
    pub overhang: Option<Footprint>,
    pub next: NextLayer,
}

/// Outcome of a drop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutResult {
    /// Top layer trimmed; `next` is now sliding in
    Placed { score: u32, next: NextLayer },
    /// No overlap; the whole top layer fell
    GameOver { score: u32 },
}

/// Compute the cut of a top layer against the layer beneath it.
///
/// Returns `None` when nothing overlaps (`overlap <= 0`).
pub fn plan_cut(
    top_position: Vec3,
    top_width: f32,
    top_depth: f32,
    axis: Axis,
    reference_position: Vec3,
    spawn_offset: f32,
) -> Option<CutPlan> {
    let delta = axis.of(top_position) - axis.of(reference_position);
    let overhang_size = delta.abs();
    let size = axis.extent(top_width, top_depth);
    let overlap = size - overhang_size;

    // NaN counts as a miss
    if overlap.is_nan() || overlap <= 0.0 {
        return None;
    }

    let (new_width, new_depth) = match axis {
        Axis::X => (overlap, top_depth),
        Axis::Z => (top_width, overlap),
    };

    let mut recentred = top_position;
    axis.set(&mut recentred, axis.of(top_position) - delta / 2.0);

    let overhang = (overhang_size > 0.0).then(|| {
        let shift = (overlap / 2.0 + overhang_size / 2.0) * delta.signum();
        let mut center = recentred;
        axis.set(&mut center, axis.of(recentred) + shift);
        let (width, depth) = match axis {
            Axis::X => (overhang_size, new_depth),
            Axis::Z => (new_width, overhang_size),
        };
        Footprint {
            x: center.x,
            z: center.z,
            width,
            depth,
        }
    });

    // Continue along the cut axis, slide in from outside on the other one
    let next_axis = axis.orthogonal();
    let mut spawn = recentred;
    next_axis.set(&mut spawn, spawn_offset);

    Some(CutPlan {
        axis,
        delta,
        size,
        overlap,
        top_position: recentred,
        top_width: new_width,
        top_depth: new_depth,
        overhang,
        next: NextLayer {
            x: spawn.x,
            z: spawn.z,
            width: new_width,
            depth: new_depth,
            axis: next_axis,
        },
    })
}

/// Drop the top layer onto the one beneath it.
///
/// # Panics
/// If the stack has fewer than two layers or the top layer has no axis.
pub fn apply_cut<S: SceneBackend, P: PhysicsBackend>(
    stack: &mut Stack,
    factory: &mut BoxFactory<S, P>,
    settings: &Settings,
) -> CutResult {
    assert!(
        stack.len() >= 2,
        "cut needs a reference layer and a moving layer (stack has {})",
        stack.len()
    );

    let top = &stack.layers[stack.len() - 1];
    let reference = &stack.layers[stack.len() - 2];
    let axis = top.axis.expect("top layer has no movement axis");

    let plan = plan_cut(
        top.position(),
        top.width(),
        top.depth(),
        axis,
        reference.position(),
        settings.spawn_offset,
    );

    let Some(plan) = plan else {
        let position = top.position();
        let (width, depth) = (top.width(), top.depth());
        let score = stack.len() as u32 - 2;

        // The whole layer falls
        stack.add_overhang(factory, position.x, position.z, width, depth);
        if let Some(missed) = stack.layers.pop() {
            factory.destroy(&missed.body);
        }
        log::info!("Missed the tower, final score {}", score);
        return CutResult::GameOver { score };
    };

    log::debug!(
        "Cut on {:?}: delta {:.3}, overlap {:.3} of {:.3}",
        plan.axis,
        plan.delta,
        plan.overlap,
        plan.size
    );

    let box_height = factory.box_height();
    if let Some(top) = stack.top_mut() {
        top.body.width = plan.top_width;
        top.body.depth = plan.top_depth;
        top.body.position = plan.top_position;

        let mut scale = Vec3::ONE;
        axis.set(&mut scale, plan.overlap / plan.size);
        factory.scene.set_scale(top.body.visual, scale);
        factory.scene.set_position(top.body.visual, plan.top_position);

        factory.physics.set_position(top.body.physical, plan.top_position);
        factory.physics.replace_collider_shape(
            top.body.physical,
            Vec3::new(plan.top_width / 2.0, box_height / 2.0, plan.top_depth / 2.0),
        );
    }

    if let Some(piece) = plan.overhang {
        stack.add_overhang(factory, piece.x, piece.z, piece.width, piece.depth);
    }

    let score = stack.len() as u32 - 1;
    let next = plan.next;
    stack.add_layer(factory, next.x, next.z, next.width, next.depth, Some(next.axis));

    CutResult::Placed { score, next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::RapierWorld;
    use crate::renderer::SceneGraph;
    use proptest::prelude::*;

    fn setup() -> (Stack, BoxFactory<SceneGraph, RapierWorld>, Settings) {
        let settings = Settings::default();
        let mut factory = BoxFactory::new(
            SceneGraph::new(800, 600),
            RapierWorld::new(settings.gravity),
            &settings,
            1,
        );
        let mut stack = Stack::new();
        stack.reset(&mut factory, &settings);
        (stack, factory, settings)
    }

    /// Slide the top layer to `value` along its axis in model and both worlds
    fn move_top_to(stack: &mut Stack, factory: &mut BoxFactory<SceneGraph, RapierWorld>, value: f32) {
        let top = stack.top_mut().unwrap();
        let axis = top.axis.unwrap();
        axis.set(&mut top.body.position, value);
        factory.scene.set_position(top.body.visual, top.body.position);
        factory.physics.set_position(top.body.physical, top.body.position);
    }

    #[test]
    fn test_plan_worked_example() {
        let plan = plan_cut(
            Vec3::new(1.0, 1.0, 0.0),
            3.0,
            3.0,
            Axis::X,
            Vec3::ZERO,
            -10.0,
        )
        .unwrap();

        assert_eq!(plan.delta, 1.0);
        assert_eq!(plan.overlap, 2.0);
        assert_eq!(plan.top_width, 2.0);
        assert_eq!(plan.top_depth, 3.0);
        assert_eq!(plan.top_position, Vec3::new(0.5, 1.0, 0.0));

        let piece = plan.overhang.unwrap();
        assert_eq!(piece.x, 2.0);
        assert_eq!(piece.z, 0.0);
        assert_eq!(piece.width, 1.0);
        assert_eq!(piece.depth, 3.0);

        assert_eq!(
            plan.next,
            NextLayer {
                x: 0.5,
                z: -10.0,
                width: 2.0,
                depth: 3.0,
                axis: Axis::Z,
            }
        );
    }

    #[test]
    fn test_plan_negative_delta_on_z() {
        let plan = plan_cut(
            Vec3::new(0.5, 2.0, -0.5),
            2.0,
            3.0,
            Axis::Z,
            Vec3::new(0.5, 1.0, 0.0),
            -10.0,
        )
        .unwrap();

        assert_eq!(plan.top_depth, 2.5);
        assert_eq!(plan.top_width, 2.0);
        assert_eq!(plan.top_position.z, -0.25);

        let piece = plan.overhang.unwrap();
        // Falls off the negative side
        assert_eq!(piece.z, -0.25 - (1.25 + 0.25));
        assert_eq!(piece.depth, 0.5);
        assert_eq!(piece.width, 2.0);

        assert_eq!(plan.next.axis, Axis::X);
        assert_eq!(plan.next.x, -10.0);
        assert_eq!(plan.next.z, -0.25);
    }

    #[test]
    fn test_plan_perfect_drop_has_no_overhang() {
        let plan = plan_cut(Vec3::new(0.0, 1.0, 0.0), 3.0, 3.0, Axis::X, Vec3::ZERO, -10.0).unwrap();
        assert_eq!(plan.overlap, 3.0);
        assert!(plan.overhang.is_none());
        assert_eq!(plan.top_position.x, 0.0);
    }

    #[test]
    fn test_plan_miss() {
        assert!(plan_cut(Vec3::new(3.5, 1.0, 0.0), 3.0, 3.0, Axis::X, Vec3::ZERO, -10.0).is_none());
        // Exactly touching edges is still a miss
        assert!(plan_cut(Vec3::new(-3.0, 1.0, 0.0), 3.0, 3.0, Axis::X, Vec3::ZERO, -10.0).is_none());
    }

    #[test]
    fn test_apply_cut_placed() {
        let (mut stack, mut factory, settings) = setup();
        move_top_to(&mut stack, &mut factory, 1.0);

        let result = apply_cut(&mut stack, &mut factory, &settings);
        let CutResult::Placed { score, next } = result else {
            panic!("expected placement, got {:?}", result);
        };
        assert_eq!(score, 1);
        assert_eq!(next.axis, Axis::Z);

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.overhangs.len(), 1);

        let cut = &stack.layers[1];
        assert_eq!(cut.width(), 2.0);
        assert_eq!(cut.position(), Vec3::new(0.5, 1.0, 0.0));

        // Visual rescaled, physical rebuilt
        let node = factory.scene.node(cut.body.visual).unwrap();
        assert_eq!(node.scale, Vec3::new(2.0 / 3.0, 1.0, 1.0));
        assert_eq!(node.position, Vec3::new(0.5, 1.0, 0.0));
        assert_eq!(factory.physics.half_extents(cut.body.physical), Some(Vec3::new(1.0, 0.5, 1.5)));
        assert_eq!(
            factory.physics.transform(cut.body.physical).unwrap().0,
            Vec3::new(0.5, 1.0, 0.0)
        );

        let piece = &stack.overhangs[0].body;
        assert_eq!(piece.position, Vec3::new(2.0, 1.0, 0.0));
        assert_eq!((piece.width, piece.depth), (1.0, 3.0));

        let new_top = stack.top().unwrap();
        assert_eq!(new_top.position(), Vec3::new(0.5, 2.0, -10.0));
        assert_eq!(new_top.axis, Some(Axis::Z));
        assert_eq!((new_top.width(), new_top.depth()), (2.0, 3.0));
    }

    #[test]
    fn test_apply_cut_game_over() {
        let (mut stack, mut factory, settings) = setup();
        move_top_to(&mut stack, &mut factory, 3.5);
        let missed = stack.top().unwrap().body.clone();

        let result = apply_cut(&mut stack, &mut factory, &settings);
        assert_eq!(result, CutResult::GameOver { score: 0 });

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.overhangs.len(), 1);
        let fallen = &stack.overhangs[0].body;
        assert_eq!(fallen.position, Vec3::new(3.5, 1.0, 0.0));
        assert_eq!((fallen.width, fallen.depth), (3.0, 3.0));

        // Static box gone from both worlds
        assert!(factory.scene.node(missed.visual).is_none());
        assert!(factory.physics.transform(missed.physical).is_none());
    }

    #[test]
    fn test_game_over_score_after_placements() {
        let (mut stack, mut factory, settings) = setup();
        for _ in 0..3 {
            move_top_to(&mut stack, &mut factory, 0.0);
            assert!(matches!(apply_cut(&mut stack, &mut factory, &settings), CutResult::Placed { .. }));
        }
        assert_eq!(stack.len(), 5);

        move_top_to(&mut stack, &mut factory, 10.0);
        assert_eq!(apply_cut(&mut stack, &mut factory, &settings), CutResult::GameOver { score: 3 });
        assert_eq!(stack.len(), 4);
    }

    #[test]
    fn test_repeated_identical_drops_do_not_drift() {
        let (mut stack, mut factory, settings) = setup();
        for _ in 0..6 {
            move_top_to(&mut stack, &mut factory, 0.0);
            apply_cut(&mut stack, &mut factory, &settings);
        }
        for layer in &stack.layers[..stack.len() - 1] {
            assert_eq!(layer.position().x, 0.0);
            assert_eq!(layer.position().z, 0.0);
            assert_eq!(layer.width(), 3.0);
            assert_eq!(layer.depth(), 3.0);
        }
        assert!(stack.overhangs.is_empty());
    }

    #[test]
    #[should_panic(expected = "cut needs a reference layer")]
    fn test_cut_on_short_stack_panics() {
        let (mut stack, mut factory, settings) = setup();
        stack.layers.truncate(1);
        apply_cut(&mut stack, &mut factory, &settings);
    }

    proptest! {
        #[test]
        fn prop_miss_when_offset_exceeds_size(size in 0.1f32..5.0, extra in 0.0f32..10.0, negative in any::<bool>()) {
            let offset = (size + extra) * if negative { -1.0 } else { 1.0 };
            let top = Vec3::new(offset, 1.0, 0.0);
            prop_assert!(plan_cut(top, size, 3.0, Axis::X, Vec3::ZERO, -10.0).is_none());
        }

        #[test]
        fn prop_overlap_plus_overhang_is_size(size in 0.1f32..5.0, frac in -0.99f32..0.99) {
            let offset = size * frac;
            let top = Vec3::new(0.0, 1.0, offset);
            let plan = plan_cut(top, 3.0, size, Axis::Z, Vec3::ZERO, -10.0).unwrap();

            prop_assert!(plan.top_depth <= size);
            prop_assert_eq!(plan.top_width, 3.0);
            let piece = plan.overhang.map(|p| p.depth).unwrap_or(0.0);
            prop_assert!((plan.top_depth + piece - size).abs() <= 1e-5 * size.max(1.0));
            if offset.abs() > 1e-3 {
                prop_assert!(plan.top_depth < size);
            }
        }

        #[test]
        fn prop_overhang_sits_outside_the_overlap(frac in -0.99f32..0.99) {
            let top = Vec3::new(3.0 * frac, 1.0, 0.0);
            let plan = plan_cut(top, 3.0, 3.0, Axis::X, Vec3::ZERO, -10.0).unwrap();
            if let Some(piece) = plan.overhang {
                let gap = (piece.x - plan.top_position.x).abs();
                let touching = plan.top_width / 2.0 + piece.width / 2.0;
                prop_assert!((gap - touching).abs() <= 1e-5);
                prop_assert_eq!(piece.x > plan.top_position.x, frac > 0.0);
            }
        }

        #[test]
        fn prop_axes_alternate(offsets in proptest::collection::vec(-0.2f32..0.2, 1..12)) {
            let (mut stack, mut factory, settings) = setup();
            for offset in offsets {
                let reference = stack.reference().unwrap().position();
                let axis = stack.top().unwrap().axis.unwrap();
                move_top_to(&mut stack, &mut factory, axis.of(reference) + offset);
                if let CutResult::GameOver { .. } = apply_cut(&mut stack, &mut factory, &settings) {
                    break;
                }
            }
            for pair in stack.layers[1..].windows(2) {
                prop_assert_ne!(pair[0].axis, pair[1].axis);
            }
        }
    }
}
