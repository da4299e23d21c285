//! Rendering module
//!
//! The retained [`SceneGraph`] is the scene backend the simulation drives;
//! [`RenderState`] draws its snapshots with WebGPU.

pub mod pipeline;
pub mod scene;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::{Lighting, MeshNode, SceneGraph};
pub use vertex::BoxInstance;
