use crate::catalog::Catalog;
use crate::draft::DEFAULT_DEBOUNCE_MS;
use crate::error::{CmdgenError, Result};
use crate::guidance::GuidanceOverride;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Above this the debounce never fires within a CLI session.
const MAX_SENSIBLE_DEBOUNCE_MS: u64 = 60 * 60 * 1000;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: String) -> Self {
        Self {
            level: WarnLevel::Warning,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: WarnLevel::Error,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// DraftConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// GuidanceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// Appended after the built-in override table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<GuidanceOverride>,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default)]
    pub draft: DraftConfig,
    #[serde(default)]
    pub guidance: GuidanceConfig,
}

fn default_version() -> u32 {
    1
}

fn default_catalog() -> PathBuf {
    PathBuf::from(paths::DEFAULT_CATALOG_FILE)
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_STORE_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            catalog: default_catalog(),
            storage_dir: default_storage_dir(),
            draft: DraftConfig::default(),
            guidance: GuidanceConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(CmdgenError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        // An empty file is a valid all-defaults config.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.catalog)
    }

    pub fn store_dir(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.storage_dir)
    }

    pub fn load_catalog(&self, root: &Path) -> Result<Catalog> {
        Catalog::load(&self.catalog_path(root))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let catalog = match self.load_catalog(root) {
            Ok(catalog) => Some(catalog),
            Err(CmdgenError::NotInitialized) => {
                warnings.push(ConfigWarning::error(format!(
                    "catalog file '{}' does not exist",
                    self.catalog.display()
                )));
                None
            }
            Err(e) => {
                warnings.push(ConfigWarning::error(format!(
                    "catalog '{}' is unreadable: {e}",
                    self.catalog.display()
                )));
                None
            }
        };

        if self.draft.debounce_ms == 0 {
            warnings.push(ConfigWarning::warning(
                "draft.debounce_ms is 0; every edit writes the draft".to_string(),
            ));
        } else if self.draft.debounce_ms > MAX_SENSIBLE_DEBOUNCE_MS {
            warnings.push(ConfigWarning::warning(format!(
                "draft.debounce_ms is {}; drafts are only written on exit",
                self.draft.debounce_ms
            )));
        }

        for o in &self.guidance.overrides {
            if o.workflow.trim().is_empty() {
                warnings.push(ConfigWarning::warning(format!(
                    "guidance override for stage '{}' has an empty workflow",
                    o.stage
                )));
            }
            let Some(catalog) = &catalog else { continue };
            match catalog.command(&o.command) {
                None => warnings.push(ConfigWarning::warning(format!(
                    "guidance override for '{}' names unknown command '{}'",
                    o.workflow, o.command
                ))),
                Some(cmd) if cmd.stage != o.stage => {
                    warnings.push(ConfigWarning::warning(format!(
                        "guidance override command '{}' belongs to stage '{}', not '{}'",
                        o.command, cmd.stage, o.stage
                    )))
                }
                Some(_) => {}
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StageKey;
    use tempfile::TempDir;

    fn init_project(cfg: &Config) -> TempDir {
        let dir = TempDir::new().unwrap();
        cfg.save(dir.path()).unwrap();
        std::fs::write(cfg.catalog_path(dir.path()), Catalog::starter_yaml()).unwrap();
        dir
    }

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.draft.debounce_ms, 400);
    }

    #[test]
    fn sparse_yaml_fills_defaults() {
        let yaml = "draft:\n  debounce_ms: 50\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.draft.debounce_ms, 50);
        assert_eq!(cfg.catalog, PathBuf::from(".cmdgen/catalog.yaml"));
        assert!(cfg.guidance.overrides.is_empty());
    }

    #[test]
    fn load_missing_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(CmdgenError::NotInitialized)
        ));
    }

    #[test]
    fn load_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(paths::cmdgen_dir(dir.path())).unwrap();
        std::fs::write(paths::config_path(dir.path()), "").unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn paths_resolve_against_root() {
        let cfg = Config::default();
        let root = Path::new("/srv/app");
        assert_eq!(
            cfg.store_dir(root),
            PathBuf::from("/srv/app/.cmdgen/store")
        );
    }

    #[test]
    fn validate_clean_project() {
        let cfg = Config::default();
        let dir = init_project(&cfg);
        assert!(cfg.validate(dir.path()).is_empty());
    }

    #[test]
    fn validate_missing_catalog_is_error() {
        let dir = TempDir::new().unwrap();
        let warnings = Config::default().validate(dir.path());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
    }

    #[test]
    fn validate_flags_bad_overrides() {
        let mut cfg = Config::default();
        cfg.guidance.overrides = vec![
            GuidanceOverride {
                stage: StageKey::Plan,
                workflow: "workflow-x".to_string(),
                command: "does-not-exist".to_string(),
            },
            GuidanceOverride {
                stage: StageKey::Plan,
                workflow: "workflow-y".to_string(),
                command: "implement-lite".to_string(),
            },
        ];
        cfg.draft.debounce_ms = 0;
        let dir = init_project(&cfg);
        let warnings = cfg.validate(dir.path());
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
        assert!(warnings.iter().any(|w| w.message.contains("does-not-exist")));
    }

    #[test]
    fn huge_debounce_warns() {
        let mut cfg = Config::default();
        cfg.draft.debounce_ms = u64::MAX;
        let dir = init_project(&cfg);
        let warnings = cfg.validate(dir.path());
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].message.contains("debounce_ms"));
    }
}
