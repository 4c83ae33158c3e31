//! Player preferences
//!
//! Persisted in LocalStorage, separate from the tuning table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be between 0 and 1, got {value}")]
    VolumeOutOfRange { field: &'static str, value: f32 },
}

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
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Display ===
    /// Draw the predicted path while aiming
    pub trajectory_preview: bool,

    // === Accessibility ===
    /// Skip the extra-ball drop animation
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            mute_on_blur: true,
            trajectory_preview: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "pachinko_settings";

    /// Parse and validate settings JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        for (field, value) in [
            ("master_volume", settings.master_volume),
            ("sfx_volume", settings.sfx_volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::VolumeOutOfRange { field, value });
            }
        }
        Ok(settings)
    }

    /// Gain applied to sound effects (0 when muted)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    #[inline]
    pub fn animate_falling_balls(&self) -> bool {
        !self.reduced_motion
    }

    /// Apply an in-game settings hotkey; returns false for unbound keys
    ///
    /// `M` mute, `T` trajectory preview, `R` reduced motion, `B` mute on blur,
    /// `-` and `=` step the master volume by 0.1.
    pub fn apply_key(&mut self, key: &str) -> bool {
        match key {
            "m" | "M" => self.muted = !self.muted,
            "t" | "T" => self.trajectory_preview = !self.trajectory_preview,
            "r" | "R" => self.reduced_motion = !self.reduced_motion,
            "b" | "B" => self.mute_on_blur = !self.mute_on_blur,
            "-" => self.step_volume(-1.0),
            "=" | "+" => self.step_volume(1.0),
            _ => return false,
        }
        true
    }

    fn step_volume(&mut self, dir: f32) {
        let tenths = (self.master_volume * 10.0).round() + dir;
        self.master_volume = (tenths / 10.0).clamp(0.0, 1.0);
    }

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
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} store on native; using defaults", Self::STORAGE_KEY);
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
        let settings = Settings::from_json(r#"{"muted": true}"#).expect("valid");
        assert!(settings.muted);
        assert!(settings.trajectory_preview);
        assert_eq!(settings.sfx_volume, 1.0);
        assert_eq!(settings.effective_sfx_volume(), 0.0);
    }

    #[test]
    fn test_hotkeys_toggle_preferences() {
        let mut settings = Settings::default();
        assert!(settings.apply_key("m"));
        assert!(settings.muted);
        assert_eq!(settings.effective_sfx_volume(), 0.0);
        assert!(settings.apply_key("M"));
        assert!(!settings.muted);

        assert!(settings.apply_key("t"));
        assert!(!settings.trajectory_preview);
        assert!(settings.apply_key("r"));
        assert!(!settings.animate_falling_balls());
        assert!(settings.apply_key("b"));
        assert!(!settings.mute_on_blur);

        assert!(!settings.apply_key("x"));
        assert!(!settings.apply_key("Escape"));
    }

    #[test]
    fn test_volume_keys_stay_in_range() {
        let mut settings = Settings::default();
        settings.apply_key("=");
        assert!((settings.master_volume - 0.9).abs() < 1e-6);
        for _ in 0..5 {
            settings.apply_key("=");
        }
        assert_eq!(settings.master_volume, 1.0);
        for _ in 0..15 {
            settings.apply_key("-");
        }
        assert_eq!(settings.master_volume, 0.0);

        // Still loads after a round trip through storage
        let json = serde_json::to_string(&settings).expect("serializes");
        assert_eq!(Settings::from_json(&json).expect("valid"), settings);
    }

    #[test]
    fn test_volume_out_of_range() {
        let err = Settings::from_json(r#"{"sfx_volume": 1.5}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::VolumeOutOfRange { field: "sfx_volume", .. }
        ));
        assert!(matches!(
            Settings::from_json("not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_settings_json_roundtrip() {
        let settings = Settings {
            reduced_motion: true,
            master_volume: 0.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).expect("serialize");
        assert_eq!(Settings::from_json(&json).expect("parse"), settings);
        assert!(!settings.animate_falling_balls());
        assert!((settings.effective_sfx_volume() - 0.5).abs() < 1e-6);
    }
}
