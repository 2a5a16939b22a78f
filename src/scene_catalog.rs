//! Scene catalog backed by a JSON manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::capabilities::{check_compatibility, Capabilities, RequiredFeatures};

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_ir_version() -> String {
    "1.0.0".to_owned()
}

/// One scene entry from the manifest. Unknown keys are tolerated.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneInfo {
    pub scene_id: String,
    /// Relative to the manifest directory.
    pub ir_path: PathBuf,
    #[serde(default)]
    pub scene_hash: String,
    #[serde(default = "default_ir_version")]
    pub ir_version: String,
    #[serde(default = "default_width")]
    pub default_width: u32,
    #[serde(default = "default_height")]
    pub default_height: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_features: RequiredFeatures,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default = "default_ir_version")]
    version: String,
    scenes: Vec<SceneInfo>,
}

/// Scenes available to a run, resolved against the manifest directory.
#[derive(Debug, Default)]
pub struct SceneCatalog {
    manifest_version: String,
    base_dir: PathBuf,
    scenes: Vec<SceneInfo>,
}

impl SceneCatalog {
    /// Load a manifest. `ir_path` entries resolve relative to the
    /// manifest's own directory.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(manifest_path)
            .with_context(|| format!("failed to read manifest {}", manifest_path.display()))?;
        let manifest: ManifestFile = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse manifest {}", manifest_path.display()))?;

        let base_dir = manifest_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self {
            manifest_version: manifest.version,
            base_dir,
            scenes: manifest.scenes,
        })
    }

    pub fn manifest_version(&self) -> &str {
        &self.manifest_version
    }

    /// Scene ids, sorted lexicographically.
    pub fn scene_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scenes.iter().map(|s| s.scene_id.clone()).collect();
        ids.sort();
        ids
    }

    pub fn info(&self, scene_id: &str) -> Option<&SceneInfo> {
        self.scenes.iter().find(|s| s.scene_id == scene_id)
    }

    /// Absolute path of a scene's IR file.
    pub fn scene_path(&self, scene_id: &str) -> Option<PathBuf> {
        self.info(scene_id).map(|s| self.base_dir.join(&s.ir_path))
    }

    pub fn is_compatible(&self, scene_id: &str, caps: &Capabilities) -> bool {
        self.info(scene_id)
            .map(|s| check_compatibility(caps, &s.required_features).is_none())
            .unwrap_or(false)
    }

    /// Ids of all scenes a backend with `caps` can run, sorted.
    pub fn compatible_scenes(&self, caps: &Capabilities) -> Vec<String> {
        let mut ids: Vec<String> = self
            .scenes
            .iter()
            .filter(|s| check_compatibility(caps, &s.required_features).is_none())
            .map(|s| s.scene_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"{
        "version": "1.0.0",
        "scenes": [
            {
                "scene_id": "strokes/dashed",
                "ir_path": "strokes/dashed.irbin",
                "required_features": { "needs_dashes": true },
                "future_key": "ignored"
            },
            {
                "scene_id": "fills/solid_basic",
                "ir_path": "fills/solid_basic.irbin",
                "description": "solid fills",
                "tags": ["fills"]
            }
        ]
    }"#;

    fn write_manifest() -> (tempfile::TempDir, SceneCatalog) {
        let dir = tempdir().expect("tempdir should create");
        let path = dir.path().join("manifest.json");
        fs::write(&path, MANIFEST).expect("manifest should write");
        let catalog = SceneCatalog::load(&path).expect("manifest should load");
        (dir, catalog)
    }

    #[test]
    fn ids_sort_lexicographically() {
        let (_dir, catalog) = write_manifest();
        assert_eq!(
            catalog.scene_ids(),
            vec!["fills/solid_basic".to_owned(), "strokes/dashed".to_owned()]
        );
        assert_eq!(catalog.scene_ids(), catalog.scene_ids());
    }

    #[test]
    fn paths_resolve_against_manifest_dir() {
        let (dir, catalog) = write_manifest();
        let path = catalog.scene_path("fills/solid_basic").expect("path");
        assert_eq!(path, dir.path().join("fills/solid_basic.irbin"));
        assert!(catalog.scene_path("missing").is_none());
    }

    #[test]
    fn compatibility_filters_on_required_features() {
        let (_dir, catalog) = write_manifest();
        let minimal = Capabilities::minimal();
        assert!(!catalog.is_compatible("strokes/dashed", &minimal));
        assert!(catalog.is_compatible("fills/solid_basic", &minimal));
        assert_eq!(
            catalog.compatible_scenes(&minimal),
            vec!["fills/solid_basic".to_owned()]
        );
        assert_eq!(catalog.compatible_scenes(&Capabilities::all()).len(), 2);
    }
}
