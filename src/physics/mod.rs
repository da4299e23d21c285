//! Rigid-body physics backend
//!
//! Rapier 3D implementation of [`PhysicsBackend`].

pub mod rapier;

pub use rapier::RapierWorld;
