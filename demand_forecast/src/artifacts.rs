//! Versioned on-disk artifact bundles
//!
//! Layout under the artifact root:
//!
//! ```text
//! CURRENT                        active version id
//! versions/<version>/model.json
//! versions/<version>/preprocessor.json
//! versions/<version>/schema.json
//! versions/<version>/manifest.json
//! ```
//!
//! A bundle is written into `versions/.staging-<version>`, renamed into
//! place, and only then does `CURRENT` switch to it, by writing a temporary
//! file and renaming it over the old pointer. Published files are never
//! rewritten.

use crate::builder::{TrainedBundle, TrainingReport};
use crate::error::{DemandError, Result};
use crate::schema::FeatureSchema;
use chrono::{DateTime, Utc};
use demand_math::{LinearModel, StandardScaler, TrainedRegressor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

const CURRENT_FILE: &str = "CURRENT";
const VERSIONS_DIR: &str = "versions";
const STAGING_PREFIX: &str = ".staging-";
const MODEL_FILE: &str = "model.json";
const PREPROCESSOR_FILE: &str = "preprocessor.json";
const SCHEMA_FILE: &str = "schema.json";
const MANIFEST_FILE: &str = "manifest.json";

/// Descriptive metadata stored next to a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub schema_format_version: u32,
    pub n_features: usize,
    pub model_name: String,
    pub report: TrainingReport,
}

/// A loaded, internally consistent set of artifacts
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub version: String,
    pub schema: FeatureSchema,
    pub preprocessor: StandardScaler,
    pub model: LinearModel,
    pub manifest: BundleManifest,
}

impl ArtifactBundle {
    /// Wrap freshly trained artifacts under a version id
    pub fn from_trained(version: impl Into<String>, trained: TrainedBundle) -> Result<Self> {
        let version = version.into();
        let manifest = BundleManifest {
            version: version.clone(),
            created_at: Utc::now(),
            schema_format_version: trained.schema.format_version(),
            n_features: trained.schema.len(),
            model_name: trained.model.name().to_string(),
            report: trained.report,
        };
        let bundle = Self {
            version,
            schema: trained.schema,
            preprocessor: trained.preprocessor,
            model: trained.model,
            manifest,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check that the preprocessor and model widths match the schema
    pub fn validate(&self) -> Result<()> {
        let width = self.schema.len();
        if self.preprocessor.n_features() != width
            || self.preprocessor.scales().len() != width
        {
            return Err(DemandError::SchemaMismatch(format!(
                "Preprocessor expects {} columns, schema has {}",
                self.preprocessor.n_features(),
                width
            )));
        }
        if self.model.n_features() != width {
            return Err(DemandError::SchemaMismatch(format!(
                "Model expects {} columns, schema has {}",
                self.model.n_features(),
                width
            )));
        }
        if self.manifest.version != self.version {
            return Err(DemandError::SchemaMismatch(format!(
                "Manifest describes version {}, bundle is {}",
                self.manifest.version, self.version
            )));
        }
        Ok(())
    }
}

/// Artifact directory with versioned bundles and a `CURRENT` pointer
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    fn version_dir(&self, version: &str) -> PathBuf {
        self.versions_dir().join(version)
    }

    /// Write a trained bundle under a new version and make it current.
    pub fn publish(&self, trained: TrainedBundle) -> Result<ArtifactBundle> {
        let bundle = ArtifactBundle::from_trained(new_version_id(), trained)?;

        let versions = self.versions_dir();
        fs::create_dir_all(&versions)?;

        let staging = versions.join(format!("{}{}", STAGING_PREFIX, bundle.version));
        if let Err(e) = write_bundle(&staging, &bundle) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!("Failed to remove staging directory {:?}: {}", staging, cleanup);
            }
            return Err(e);
        }

        let target = self.version_dir(&bundle.version);
        if let Err(e) = fs::rename(&staging, &target) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!("Failed to remove staging directory {:?}: {}", staging, cleanup);
            }
            return Err(e.into());
        }

        self.set_current(&bundle.version)?;
        info!(
            "Published artifact bundle {} ({} features, {})",
            bundle.version, bundle.manifest.n_features, bundle.manifest.model_name
        );
        Ok(bundle)
    }

    /// Point `CURRENT` at an existing version
    pub fn set_current(&self, version: &str) -> Result<()> {
        check_version_id(version).map_err(DemandError::Validation)?;
        if !self.version_dir(version).is_dir() {
            return Err(DemandError::NotFound(format!(
                "Artifact version {} does not exist",
                version
            )));
        }

        let tmp = self.root.join(format!("{}.tmp-{}", CURRENT_FILE, Uuid::new_v4().simple()));
        fs::write(&tmp, version)?;
        if let Err(e) = fs::rename(&tmp, self.root.join(CURRENT_FILE)) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!("Failed to remove pointer file {:?}: {}", tmp, cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Active version id, `None` before the first publication
    pub fn current_version(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.root.join(CURRENT_FILE)) {
            Ok(content) => {
                let version = content.trim();
                if version.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(version.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Published versions, oldest first
    pub fn versions(&self) -> Result<Vec<String>> {
        let dir = self.versions_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') {
                versions.push(name);
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Load the bundle `CURRENT` points to.
    ///
    /// Every failure, including a bundle whose parts disagree on width, is
    /// reported as [`DemandError::ArtifactUnavailable`].
    pub fn load_current(&self) -> Result<ArtifactBundle> {
        let version = self
            .current_version()
            .map_err(|e| DemandError::ArtifactUnavailable(e.to_string()))?
            .ok_or_else(|| {
                DemandError::ArtifactUnavailable(format!(
                    "No current artifact version under {:?}",
                    self.root
                ))
            })?;
        self.load_version(&version)
    }

    /// Load a specific published version
    pub fn load_version(&self, version: &str) -> Result<ArtifactBundle> {
        check_version_id(version).map_err(DemandError::ArtifactUnavailable)?;
        let dir = self.version_dir(version);

        let bundle = ArtifactBundle {
            version: version.to_string(),
            model: read_json(&dir.join(MODEL_FILE))?,
            preprocessor: read_json(&dir.join(PREPROCESSOR_FILE))?,
            schema: read_json(&dir.join(SCHEMA_FILE))?,
            manifest: read_json(&dir.join(MANIFEST_FILE))?,
        };
        bundle
            .validate()
            .map_err(|e| DemandError::ArtifactUnavailable(format!("Bundle {}: {}", version, e)))?;

        info!("Loaded artifact bundle {}", version);
        Ok(bundle)
    }
}

/// `<UTC timestamp>-<8 hex chars>`; sorts chronologically
pub fn new_version_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ"), &suffix[..8])
}

fn check_version_id(version: &str) -> std::result::Result<(), String> {
    let valid = !version.is_empty()
        && !version.starts_with('.')
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid artifact version id '{}'", version))
    }
}

fn write_bundle(dir: &Path, bundle: &ArtifactBundle) -> Result<()> {
    fs::create_dir_all(dir)?;
    write_json(&dir.join(MODEL_FILE), &bundle.model)?;
    write_json(&dir.join(PREPROCESSOR_FILE), &bundle.preprocessor)?;
    write_json(&dir.join(SCHEMA_FILE), &bundle.schema)?;
    write_json(&dir.join(MANIFEST_FILE), &bundle.manifest)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read(path).map_err(|e| {
        DemandError::ArtifactUnavailable(format!("Failed to read {:?}: {}", path, e))
    })?;
    serde_json::from_slice(&content).map_err(|e| {
        DemandError::ArtifactUnavailable(format!("Failed to parse {:?}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn version_ids_are_unique_and_well_formed() {
        let a = new_version_id();
        let b = new_version_id();
        assert_ne!(a, b);
        assert!(check_version_id(&a).is_ok());
        let suffix = a.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn path_like_versions_are_rejected() {
        assert!(check_version_id("../etc").is_err());
        assert!(check_version_id("a/b").is_err());
        assert!(check_version_id(".staging-x").is_err());
        assert!(check_version_id("").is_err());
    }

    #[test]
    fn empty_root_has_no_current_bundle() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.current_version().unwrap(), None);
        assert!(store.versions().unwrap().is_empty());
        assert!(matches!(
            store.load_current(),
            Err(DemandError::ArtifactUnavailable(_))
        ));
    }

    #[test]
    fn current_must_point_at_existing_version() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.set_current("20240101T000000.000Z-deadbeef"),
            Err(DemandError::NotFound(_))
        ));
    }
}
