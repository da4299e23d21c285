//! Game tuning and preferences
//!
//! Persisted in LocalStorage on the web; native builds always use defaults.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Runtime tuning for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Geometry ===
    /// Height of one layer
    pub box_height: f32,
    /// Width/depth of the foundation and first layer
    pub initial_box_size: f32,
    /// Mass given to falling boxes
    pub falling_mass: f32,

    // === Motion ===
    /// Per-frame travel of the moving layer and camera
    pub layer_speed: f32,
    /// Cross-axis spawn position for new layers
    pub spawn_offset: f32,
    /// Physics timestep (seconds)
    pub physics_dt: f32,
    /// Gravity along Y
    pub gravity: f32,

    // === Camera ===
    pub camera_start: Vec3,
    pub camera_target: Vec3,
    pub camera_height_margin: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            box_height: BOX_HEIGHT,
            initial_box_size: INITIAL_BOX_SIZE,
            falling_mass: FALLING_MASS,

            layer_speed: LAYER_SPEED,
            spawn_offset: SPAWN_OFFSET,
            physics_dt: SIM_DT,
            gravity: GRAVITY,

            camera_start: CAMERA_START,
            camera_target: CAMERA_TARGET,
            camera_height_margin: CAMERA_HEIGHT_MARGIN,
        }
    }
}

impl Settings {
    /// Parse settings from JSON (missing fields fall back to defaults)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Settings>(json).map(Settings::sanitized)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Replace degenerate values with defaults.
    ///
    /// Box dimensions, mass, speed and timestep must be strictly positive for
    /// the stack invariants to hold.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let positive = |v: f32, fallback: f32| if v.is_finite() && v > 0.0 { v } else { fallback };

        self.box_height = positive(self.box_height, defaults.box_height);
        self.initial_box_size = positive(self.initial_box_size, defaults.initial_box_size);
        self.falling_mass = positive(self.falling_mass, defaults.falling_mass);
        self.layer_speed = positive(self.layer_speed, defaults.layer_speed);
        self.physics_dt = positive(self.physics_dt, defaults.physics_dt);
        if !self.spawn_offset.is_finite() {
            self.spawn_offset = defaults.spawn_offset;
        }
        if !self.gravity.is_finite() {
            self.gravity = defaults.gravity;
        }
        self
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "stack_tower_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
