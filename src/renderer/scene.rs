//! Retained scene graph
//!
//! Holds every box mesh, the camera and the lights. It has no GPU
//! dependency: [`SceneGraph::render_frame`] snapshots the scene into
//! instance data which [`super::RenderState`] uploads when a surface exists.

use std::collections::BTreeMap;

use glam::{Mat4, Quat, Vec3};

use super::vertex::BoxInstance;
use crate::consts::*;
use crate::sim::backend::{Rgba, SceneBackend, VisualHandle};

/// A box mesh in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub position: Vec3,
    /// Full extents the geometry was built with
    pub size: Vec3,
    pub scale: Vec3,
    pub orientation: Quat,
    pub color: Rgba,
}

impl MeshNode {
    /// World transform of the unit cube drawn for this node
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.size * self.scale, self.orientation, self.position)
    }
}

/// Ambient + directional lighting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub directional: f32,
    /// Directional light position (shines toward the origin)
    pub position: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: AMBIENT_INTENSITY,
            directional: DIRECTIONAL_INTENSITY,
            position: LIGHT_POSITION,
        }
    }
}

pub struct SceneGraph {
    /// Nodes by handle (stable draw order)
    nodes: BTreeMap<VisualHandle, MeshNode>,
    next_id: u32,
    camera_position: Vec3,
    /// Unit view direction, fixed by `look_at` and kept while the camera moves
    camera_forward: Vec3,
    viewport: (u32, u32),
    lighting: Lighting,
    /// Instances captured by the last `render_frame`
    frame: Vec<BoxInstance>,
    frames_rendered: u64,
}

impl SceneGraph {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            camera_position: CAMERA_START,
            camera_forward: (CAMERA_TARGET - CAMERA_START).normalize(),
            viewport: (width.max(1), height.max(1)),
            lighting: Lighting::default(),
            frame: Vec::new(),
            frames_rendered: 0,
        }
    }

    pub fn node(&self, handle: VisualHandle) -> Option<&MeshNode> {
        self.nodes.get(&handle)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&VisualHandle, &MeshNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    pub fn camera_forward(&self) -> Vec3 {
        self.camera_forward
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }

    pub fn lighting(&self) -> Lighting {
        self.lighting
    }

    /// Perspective camera matrix (right-handed, Y up)
    pub fn view_projection(&self) -> Mat4 {
        let projection = Mat4::perspective_rh(
            CAMERA_FOV_DEGREES.to_radians(),
            self.aspect(),
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        let view = Mat4::look_to_rh(self.camera_position, self.camera_forward, Vec3::Y);
        projection * view
    }

    /// Instances captured by the last rendered frame
    pub fn frame(&self) -> &[BoxInstance] {
        &self.frame
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl SceneBackend for SceneGraph {
    fn create_box(&mut self, position: Vec3, size: Vec3, color: Rgba) -> VisualHandle {
        let handle = VisualHandle(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            handle,
            MeshNode {
                position,
                size,
                scale: Vec3::ONE,
                orientation: Quat::IDENTITY,
                color,
            },
        );
        handle
    }

    fn remove(&mut self, handle: VisualHandle) {
        self.nodes.remove(&handle);
    }

    fn set_position(&mut self, handle: VisualHandle, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.position = position;
        }
    }

    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.scale = scale;
        }
    }

    fn set_orientation(&mut self, handle: VisualHandle, orientation: Quat) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.orientation = orientation;
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn set_camera_position(&mut self, position: Vec3) {
        self.camera_position = position;
    }

    fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.camera_position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.camera_forward = forward;
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = (width, height);
        }
    }

    fn render_frame(&mut self) {
        self.frame.clear();
        self.frame.extend(
            self.nodes
                .values()
                .map(|node| BoxInstance::new(node.model_matrix(), node.color.to_f32())),
        );
        self.frames_rendered += 1;
    }
}
