use std::path::{Path, PathBuf};

use crate::canvas::{DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH};
use crate::ops::filters::{BlurStrength, DEFAULT_BLUR_STRENGTH};

const SETTINGS_FILE: &str = "mosaicfe_settings.cfg";

/// Persisted user preferences.
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Language code ("en", "ja"). Empty string = auto-detect system language.
    pub language: String,
    /// Strength the slider starts at.
    pub blur_strength: u8,
    pub surface_width: u32,
    pub surface_height: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            language: String::new(),
            blur_strength: DEFAULT_BLUR_STRENGTH,
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/mosaicfe/mosaicfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\MosaicFE\mosaicfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/MosaicFE/mosaicfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("mosaicfe");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_default();
            let config_dir = PathBuf::from(appdata).join("MosaicFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("MosaicFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        }
    }

    pub fn strength(&self) -> BlurStrength {
        BlurStrength::new(self.blur_strength as i32)
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_width, self.surface_height)
    }

    fn to_config(&self) -> String {
        format!(
            "language={}\n\
             blur_strength={}\n\
             surface_width={}\n\
             surface_height={}\n",
            self.language, self.blur_strength, self.surface_width, self.surface_height,
        )
    }

    fn from_config(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "language" => s.language = val.to_string(),
                "blur_strength" => {
                    if let Ok(v) = val.parse::<i32>() {
                        s.blur_strength = BlurStrength::new(v).value();
                    }
                }
                "surface_width" => {
                    s.surface_width = val.parse().unwrap_or(DEFAULT_SURFACE_WIDTH);
                }
                "surface_height" => {
                    s.surface_height = val.parse().unwrap_or(DEFAULT_SURFACE_HEIGHT);
                }
                _ => {}
            }
        }
        s
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            crate::log_warn!("could not save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_config())
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config(&content),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let settings = AppSettings {
            language: "ja".to_string(),
            blur_strength: 80,
            surface_width: 320,
            surface_height: 240,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppSettings::load_from(&dir.path().join("nope.cfg")), AppSettings::default());
    }

    #[test]
    fn unknown_keys_and_junk_are_ignored() {
        let s = AppSettings::from_config(
            "theme_mode=dark\nno equals sign here\nblur_strength=250\nsurface_width=abc\nlanguage = en \n",
        );
        assert_eq!(s.language, "en");
        assert_eq!(s.blur_strength, 100);
        assert_eq!(s.surface_width, DEFAULT_SURFACE_WIDTH);
        assert_eq!(s.surface_height, DEFAULT_SURFACE_HEIGHT);
    }
}
