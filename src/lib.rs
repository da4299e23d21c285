//! Stack Tower - A block stacking arcade game
//!
//! Core modules:
//! - `sim`: Gameplay core (stack model, cut engine, physics sync, game state machine)
//! - `physics`: Rapier-backed rigid-body world
//! - `renderer`: Retained scene graph and WebGPU rendering pipeline
//! - `settings`: Data-driven game tuning

pub mod physics;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use physics::RapierWorld;
pub use renderer::SceneGraph;
pub use settings::Settings;
pub use sim::{CutResult, GameEvent, GamePhase, GameSession};

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed physics timestep (never scaled by wall-clock frame time)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Height of every box (one layer)
    pub const BOX_HEIGHT: f32 = 1.0;
    /// Width and depth of the foundation and first layer
    pub const INITIAL_BOX_SIZE: f32 = 3.0;
    /// Mass of falling boxes; static boxes have mass 0
    pub const FALLING_MASS: f32 = 5.0;

    /// Distance the moving layer (and camera) travels per frame
    pub const LAYER_SPEED: f32 = 0.05;
    /// Cross-axis start position of a new layer, clear of the tower footprint
    pub const SPAWN_OFFSET: f32 = -10.0;

    /// Gravity along Y (m/s²)
    pub const GRAVITY: f32 = -9.82;
    /// Constraint solver iterations per physics step
    pub const SOLVER_ITERATIONS: usize = 40;

    /// Camera defaults
    pub const CAMERA_START: Vec3 = Vec3::new(4.0, 4.0, 4.0);
    pub const CAMERA_TARGET: Vec3 = Vec3::ZERO;
    /// Camera keeps this far above the layer below the moving one
    pub const CAMERA_HEIGHT_MARGIN: f32 = 4.0;
    pub const CAMERA_FOV_DEGREES: f32 = 90.0;
    pub const CAMERA_NEAR: f32 = 1.0;
    pub const CAMERA_FAR: f32 = 1000.0;

    /// Lighting
    pub const AMBIENT_INTENSITY: f32 = 0.6;
    pub const DIRECTIONAL_INTENSITY: f32 = 0.6;
    pub const LIGHT_POSITION: Vec3 = Vec3::new(10.0, 25.0, 5.0);
}
