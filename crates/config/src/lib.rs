//! Configuration loading, validation and env substitution.
//!
//! Config files: `wardline.toml`, `wardline.yaml`, `wardline.yml` or
//! `wardline.json`, searched in `./` then `~/.config/wardline/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution in the raw
//! file, and `WARDLINE_*` environment overrides after parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        CorsConfig, DEFAULT_MAX_BODY_BYTES, ServerConfig, StoreConfig, WardlineConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
