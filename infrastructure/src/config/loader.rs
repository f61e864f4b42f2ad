//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "agent-fleet";
const PROJECT_FILES: [&str; 2] = ["fleet.toml", ".fleet.toml"];
const ENV_PREFIX: &str = "FLEET_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Environment: `FLEET_<SECTION>__<KEY>` (e.g. `FLEET_BACKEND__COMMAND`)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./fleet.toml` or `./.fleet.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/agent-fleet/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let global = Self::global_config_path().filter(|p| p.exists());
        let project = Self::project_config_path();

        Self::layered(
            global.as_deref(),
            project.as_deref(),
            config_path.map(|p| p.as_path()),
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(Box::new)
    }

    /// File layers only, lowest priority first.
    fn layered(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(path) = global {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = project {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            // `Toml::file` treats a missing file as empty; an explicit path
            // the user typed should exist
            figment = figment.merge(Toml::file_exact(path));
        }

        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/agent-fleet/config.toml if set,
    /// otherwise falls back to ~/.config/agent-fleet/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");

        println!("  [     ] Env:     {}<SECTION>__<KEY>", ENV_PREFIX);

        if let Some(path) = explicit {
            if path.exists() {
                println!("  [FOUND] Explicit: {}", path.display());
            } else {
                println!("  [     ] Explicit: {} (missing)", path.display());
            }
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./fleet.toml or ./.fleet.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.backend.command, "claude");
        assert_eq!(config.registry.unknown_agent, "deny");
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("agent-fleet"));
    }

    #[test]
    fn test_layers_override_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("fleet.toml");
        let explicit = dir.path().join("explicit.toml");

        fs::write(
            &global,
            "[backend]\ncommand = \"global-cmd\"\ncancel_grace_ms = 100\n[status]\nttl_secs = 10\n",
        )
        .unwrap();
        fs::write(&project, "[backend]\ncommand = \"project-cmd\"\n").unwrap();
        fs::write(&explicit, "[status]\nttl_secs = 99\n").unwrap();

        let config: FileConfig = ConfigLoader::layered(
            Some(global.as_path()),
            Some(project.as_path()),
            Some(explicit.as_path()),
        )
        .extract()
        .unwrap();

        assert_eq!(config.backend.command, "project-cmd");
        // Keys a higher layer leaves out survive from lower layers
        assert_eq!(config.backend.cancel_grace_ms, 100);
        assert_eq!(config.status.ttl_secs, 99);
        assert_eq!(config.trace.buffer, 256);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result: Result<FileConfig, _> =
            ConfigLoader::layered(None, None, Some(missing.as_path())).extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[trace]\nbuffer = \"lots\"\n").unwrap();
        let result: Result<FileConfig, _> =
            ConfigLoader::layered(None, None, Some(bad.as_path())).extract();
        assert!(result.is_err());
    }
}
