use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CMDGEN_DIR: &str = ".cmdgen";
pub const CONFIG_FILE: &str = ".cmdgen/config.yaml";
pub const DEFAULT_CATALOG_FILE: &str = ".cmdgen/catalog.yaml";
pub const DEFAULT_STORE_DIR: &str = ".cmdgen/store";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn cmdgen_dir(root: &Path) -> PathBuf {
    root.join(CMDGEN_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// taken from the project root.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_and_absolute() {
        let root = Path::new("/work/proj");
        assert_eq!(
            resolve(root, Path::new(DEFAULT_CATALOG_FILE)),
            PathBuf::from("/work/proj/.cmdgen/catalog.yaml")
        );
        assert_eq!(
            resolve(root, Path::new("/etc/catalog.yaml")),
            PathBuf::from("/etc/catalog.yaml")
        );
    }

    #[test]
    fn config_lives_under_cmdgen_dir() {
        let root = Path::new("/p");
        assert!(config_path(root).starts_with(cmdgen_dir(root)));
    }
}
