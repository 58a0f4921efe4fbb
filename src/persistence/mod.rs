//! Maze preset storage
//!
//! A preset is a named list of lattice cells, each holding one solid box.
//! The editor posts `{ name, coords }` and reads back
//! `{ presets: { name: coords } }`. The store validates names and keeps
//! every coordinate on the lattice before turning a preset into an
//! obstacle layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::obstacles::ObstacleField;
use crate::tuning::ObstacleTuning;

/// A box center on the maze lattice (world units on the ground plane)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub z: i32,
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset name must not be empty")]
    EmptyName,
    #[error("cell ({x}, {z}) is not on the {step}-unit lattice")]
    OffLattice { x: i32, z: i32, step: i32 },
    #[error("no preset named {0:?}")]
    Unknown(String),
    #[error("malformed preset payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Body of a preset POST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazePreset {
    pub name: String,
    pub coords: Vec<CellCoord>,
}

impl MazePreset {
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Named presets, listed in name order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetStore {
    presets: BTreeMap<String, Vec<CellCoord>>,
}

impl PresetStore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "disk_survivor_presets";

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{ "presets": { ... } }` listing
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Store a preset, replacing any preset of the same name. Duplicate
    /// cells collapse and the list is kept sorted.
    pub fn insert(&mut self, preset: MazePreset, step: i32) -> Result<(), PresetError> {
        let name = preset.name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        let step = step.max(1);
        if let Some(c) = preset
            .coords
            .iter()
            .find(|c| c.x % step != 0 || c.z % step != 0)
        {
            return Err(PresetError::OffLattice {
                x: c.x,
                z: c.z,
                step,
            });
        }
        let mut coords = preset.coords;
        coords.sort();
        coords.dedup();
        log::debug!("Saved maze preset {:?} with {} boxes", name, coords.len());
        self.presets.insert(name.to_string(), coords);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[CellCoord]> {
        self.presets.get(name).map(Vec::as_slice)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.presets.remove(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Obstacle layout for a stored preset
    pub fn obstacles(&self, name: &str, tuning: &ObstacleTuning) -> Result<ObstacleField, PresetError> {
        let coords = self
            .get(name)
            .ok_or_else(|| PresetError::Unknown(name.to_string()))?;
        Ok(ObstacleField::from_cells(coords, tuning))
    }

    /// Load presets from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(store) => {
                        log::info!("Loaded {} maze presets", store.len());
                        return store;
                    }
                    Err(e) => log::warn!("Discarding maze presets: {}", e),
                }
            }
        }
        Self::new()
    }

    /// Save presets to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                        log::warn!("Failed to save maze presets");
                    }
                }
                Err(e) => log::warn!("Failed to encode maze presets: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn preset(name: &str, coords: &[(i32, i32)]) -> MazePreset {
        MazePreset {
            name: name.to_string(),
            coords: coords.iter().map(|&(x, z)| CellCoord { x, z }).collect(),
        }
    }

    #[test]
    fn test_post_body_then_listing() {
        let mut store = PresetStore::new();
        let body = r#"{"name":"ring","coords":[{"x":8,"z":0},{"x":-8,"z":16}]}"#;
        store.insert(MazePreset::from_json(body).unwrap(), 8).unwrap();

        let listing: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(listing["presets"]["ring"][0]["x"], -8);
        assert_eq!(listing["presets"]["ring"][1]["z"], 0);

        let back = PresetStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn test_insert_validates() {
        let mut store = PresetStore::new();
        assert!(matches!(
            store.insert(preset("  ", &[]), 8),
            Err(PresetError::EmptyName)
        ));
        assert!(matches!(
            store.insert(preset("odd", &[(8, 0), (4, 8)]), 8),
            Err(PresetError::OffLattice { x: 4, z: 8, step: 8 })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insert_replaces_and_dedups() {
        let mut store = PresetStore::new();
        store.insert(preset("a", &[(0, 8)]), 8).unwrap();
        store.insert(preset("a", &[(8, 8), (8, 8), (0, 0)]), 8).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("a").unwrap(),
            &[CellCoord { x: 0, z: 0 }, CellCoord { x: 8, z: 8 }]
        );
        assert!(store.remove("a"));
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_preset_becomes_obstacles() {
        let mut store = PresetStore::new();
        store.insert(preset("one", &[(16, 0)]), 8).unwrap();
        let tuning = ObstacleTuning::default();
        let field = store.obstacles("one", &tuning).unwrap();
        assert!(field.blocks_point(Vec2::new(16.0, 0.5)));
        assert!(!field.blocks_point(Vec2::ZERO));
        assert!(matches!(
            store.obstacles("missing", &tuning),
            Err(PresetError::Unknown(_))
        ));
    }
}
