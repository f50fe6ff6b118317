//! Persistent converter settings.
//!
//! Settings and the material library live in a single directory, which
//! defaults to `~/.xct_config/`.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ExportOptions, MaterialLibrary};
use crate::script::ModelDirectory;

/// User defaults applied when converting and exporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    /// Export options used unless overridden on the command line
    pub export: ExportOptions,
    /// Material library file; `materials.json` in the settings root when unset
    pub material_library: Option<PathBuf>,
    /// Directory holding sample models
    pub model_dir: Option<PathBuf>,
}

impl ConverterSettings {
    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Settings directory manager.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Root directory (e.g., ~/.xct_config)
    root_path: PathBuf,
}

impl SettingsStore {
    /// Create a store at the default path (~/.xct_config)
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        let root_path = PathBuf::from(home).join(".xct_config");
        Ok(Self { root_path })
    }

    /// Create a store with a custom root path
    pub fn with_path(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn settings_path(&self) -> PathBuf {
        self.root_path.join("settings.json")
    }

    fn default_library_path(&self) -> PathBuf {
        self.root_path.join("materials.json")
    }

    /// Load settings, falling back to defaults when none were saved.
    pub fn load_settings(&self) -> Result<ConverterSettings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(ConverterSettings::default());
        }
        ConverterSettings::load_from_file(&path)
    }

    /// Save settings, creating the root directory if needed.
    ///
    /// Returns the path written.
    pub fn save_settings(&self, settings: &ConverterSettings) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root_path)?;
        let path = self.settings_path();
        settings.save_to_file(&path)?;
        info!("Saved settings to {}", path.display());
        Ok(path)
    }

    fn library_path(&self, settings: &ConverterSettings) -> PathBuf {
        settings
            .material_library
            .clone()
            .unwrap_or_else(|| self.default_library_path())
    }

    /// Load the material library named by `settings`.
    ///
    /// A missing library file yields an empty library.
    pub fn load_material_library(&self, settings: &ConverterSettings) -> Result<MaterialLibrary> {
        let path = self.library_path(settings);
        if !path.exists() {
            return Ok(MaterialLibrary::new());
        }
        MaterialLibrary::load_from_file(&path)
    }

    /// Save a material library where `settings` expects it.
    pub fn save_material_library(
        &self,
        settings: &ConverterSettings,
        library: &MaterialLibrary,
    ) -> Result<PathBuf> {
        let path = self.library_path(settings);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        library.save_to_file(&path)?;
        Ok(path)
    }

    /// Model directory from `settings`, `models/` in the root when unset.
    pub fn model_directory(&self, settings: &ConverterSettings) -> ModelDirectory {
        ModelDirectory::new(
            settings
                .model_dir
                .clone()
                .unwrap_or_else(|| self.root_path.join("models")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::titanium_library;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::with_path(temp_dir.path().join("nested"));

        let settings = store.load_settings().unwrap();
        assert_eq!(settings, ConverterSettings::default());
        assert!(store.load_material_library(&settings).unwrap().is_empty());
        assert_eq!(
            store.model_directory(&settings).root(),
            temp_dir.path().join("nested").join("models")
        );
    }

    #[test]
    fn test_settings_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::with_path(temp_dir.path().to_path_buf());

        let mut settings = ConverterSettings::default();
        settings.export.materials_as_id = true;
        settings.export.projection_folder = "scans".to_string();
        settings.model_dir = Some(PathBuf::from("/data/models"));

        let path = store.save_settings(&settings).unwrap();
        assert!(path.exists());
        assert_eq!(store.load_settings().unwrap(), settings);
    }

    #[test]
    fn test_material_library_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::with_path(temp_dir.path().to_path_buf());
        let settings = ConverterSettings {
            material_library: Some(temp_dir.path().join("libs").join("lab.json")),
            ..Default::default()
        };

        store
            .save_material_library(&settings, &titanium_library())
            .unwrap();
        let loaded = store.load_material_library(&settings).unwrap();
        assert_eq!(loaded, titanium_library());
        assert!(loaded.resolve("metals/ti64").is_ok());
    }

    #[test]
    fn test_partial_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::with_path(temp_dir.path().to_path_buf());
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{"export": {"includeReconstruction": true}}"#,
        )
        .unwrap();

        let settings = store.load_settings().unwrap();
        assert!(settings.export.include_reconstruction);
        assert_eq!(settings.export.projection_folder, "projections");
        assert!(settings.material_library.is_none());
    }
}
