use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::WardlineConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "wardline.toml",
    "wardline.yaml",
    "wardline.yml",
    "wardline.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<WardlineConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./wardline.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/wardline/wardline.{toml,yaml,yml,json}` (user-global)
///
/// Returns `WardlineConfig::default()` if no config file is found or the one
/// found cannot be loaded. Environment overrides are applied either way.
pub fn discover_and_load() -> WardlineConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                WardlineConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            WardlineConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    find_config_in(Path::new("."), config_dir().as_deref())
}

fn find_config_in(local: &Path, global: Option<&Path>) -> Option<PathBuf> {
    std::iter::once(local)
        .chain(global)
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/wardline/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "wardline").map(|d| d.config_dir().to_path_buf())
}

/// Apply `WARDLINE_STORE_URL`, `WARDLINE_BIND` and `WARDLINE_PORT`.
pub fn apply_env_overrides(config: &mut WardlineConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut WardlineConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("WARDLINE_STORE_URL").filter(|v| !v.is_empty()) {
        config.store.base_url = url;
    }
    if let Some(bind) = lookup("WARDLINE_BIND").filter(|v| !v.is_empty()) {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("WARDLINE_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid WARDLINE_PORT"),
        }
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<WardlineConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
