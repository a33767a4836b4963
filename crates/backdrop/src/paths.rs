use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories_next::ProjectDirs;
use settings::BackdropSettings;
use tracing::{debug, info};

/// Environment variable naming the configuration file; mirrors `--config`.
pub const ENV_CONFIG: &str = "BACKDROP_CONFIG";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Backdrop";
const APPLICATION: &str = "Backdrop";
const CONFIG_FILE: &str = "backdrop.toml";

/// Where the settings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Named on the command line or through [`ENV_CONFIG`]; must exist.
    Explicit(PathBuf),
    /// The per-user default; a missing file means built-in defaults.
    Discovered(PathBuf),
    /// No usable config directory on this platform.
    BuiltIn,
}

impl ConfigLocation {
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return ConfigLocation::Explicit(path.to_path_buf());
        }
        match default_config_dir() {
            Some(dir) => ConfigLocation::Discovered(dir.join(CONFIG_FILE)),
            None => ConfigLocation::BuiltIn,
        }
    }

    pub fn load(&self) -> Result<BackdropSettings> {
        match self {
            ConfigLocation::Explicit(path) => {
                info!(path = %path.display(), "loading configuration");
                BackdropSettings::load(path)
                    .with_context(|| format!("failed to load {}", path.display()))
            }
            ConfigLocation::Discovered(path) if path.exists() => {
                info!(path = %path.display(), "loading configuration");
                BackdropSettings::load(path)
                    .with_context(|| format!("failed to load {}", path.display()))
            }
            ConfigLocation::Discovered(path) => {
                debug!(path = %path.display(), "no configuration file; using defaults");
                Ok(BackdropSettings::default())
            }
            ConfigLocation::BuiltIn => Ok(BackdropSettings::default()),
        }
    }
}

fn default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_path_wins() {
        let location = ConfigLocation::resolve(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(
            location,
            ConfigLocation::Explicit(PathBuf::from("/tmp/custom.toml"))
        );
    }

    #[test]
    fn missing_discovered_file_yields_defaults() {
        let root = TempDir::new().unwrap();
        let location = ConfigLocation::Discovered(root.path().join(CONFIG_FILE));
        let settings = location.load().unwrap();
        assert_eq!(settings.version, 1);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let root = TempDir::new().unwrap();
        let location = ConfigLocation::Explicit(root.path().join("absent.toml"));
        assert!(location.load().is_err());
    }

    #[test]
    fn discovered_file_is_parsed() {
        let root = TempDir::new().unwrap();
        let path = root.path().join(CONFIG_FILE);
        fs::write(&path, "version = 1\n[renderer]\nintensity = 0.8\n").unwrap();
        let settings = ConfigLocation::Discovered(path).load().unwrap();
        assert_eq!(settings.renderer.intensity, 0.8);
    }
}
