//! Game settings and preferences
//!
//! Persisted separately from run state in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::sim::state::RunOptions;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Gameplay ===
    /// Fire continuously without holding the trigger
    pub auto_fire: bool,
    /// Heal and vacuum pickups drop far more often
    pub plentiful_pickups: bool,
    /// Spawn cadence runs much faster
    pub kernel_panic: bool,
    /// Start runs inside a generated maze
    pub maze: bool,

    // === Leaderboard ===
    /// Name last used for a leaderboard submission
    pub player_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.9,
            sfx_volume: 0.9,
            muted: false,

            auto_fire: true,
            plentiful_pickups: false,
            kernel_panic: false,
            maze: false,

            player_name: String::new(),
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "disk_survivor_settings";

    /// Volumes clamped into 0..1; NaN falls back to the default
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for (value, fallback) in [
            (&mut self.master_volume, defaults.master_volume),
            (&mut self.sfx_volume, defaults.sfx_volume),
        ] {
            *value = if value.is_nan() {
                fallback
            } else {
                value.clamp(0.0, 1.0)
            };
        }
        self
    }

    /// Switches handed to a new run
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            auto_fire: self.auto_fire,
            plentiful_pickups: self.plentiful_pickups,
            kernel_panic: self.kernel_panic,
            maze: self.maze,
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<Settings>(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings.sanitized();
                    }
                    Err(e) => log::warn!("Discarding unreadable settings: {}", e),
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
            if let Ok(json) = serde_json::to_string(self) {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Failed to save settings");
                }
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"auto_fire": false, "sfx_volume": 0.3}"#).unwrap();
        assert!(!s.auto_fire);
        assert_eq!(s.sfx_volume, 0.3);
        assert_eq!(s.master_volume, 0.9);
        assert!(!s.kernel_panic);
    }

    #[test]
    fn test_older_blob_with_retired_keys_still_loads() {
        let s: Settings =
            serde_json::from_str(r#"{"music_volume": 0.2, "show_fps": true, "muted": true}"#)
                .unwrap();
        assert!(s.muted);
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("music_volume"));
        assert!(!json.contains("show_fps"));
    }

    #[test]
    fn test_sanitized_clamps_volumes() {
        let s = Settings {
            master_volume: 3.0,
            sfx_volume: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.master_volume, 1.0);
        assert_eq!(s.sfx_volume, 0.9);
    }

    #[test]
    fn test_run_options_follow_switches() {
        let s = Settings {
            auto_fire: false,
            kernel_panic: true,
            ..Default::default()
        };
        let opts = s.run_options();
        assert!(!opts.auto_fire);
        assert!(opts.kernel_panic);
        assert!(!opts.plentiful_pickups);
    }
}
