//! Gameplay core
//!
//! All gameplay logic lives here. Rendering and physics are reached only
//! through the traits in [`backend`]:
//! - Fixed physics timestep only
//! - Seeded RNG only
//! - State owned by an explicit [`GameSession`], no globals

pub mod backend;
pub mod cut;
pub mod factory;
pub mod session;
pub mod state;
pub mod sync;

pub use backend::{PhysicalHandle, PhysicsBackend, Rgba, SceneBackend, VisualHandle};
pub use cut::{CutPlan, CutResult, Footprint, NextLayer, apply_cut, plan_cut};
pub use factory::{BoxBody, BoxFactory};
pub use session::{Camera, GameEvent, GamePhase, GameSession, game_over_message};
pub use state::{Axis, Layer, Overhang, Stack};
pub use sync::step_physics;
