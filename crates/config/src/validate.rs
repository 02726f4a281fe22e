//! Configuration validation.
//!
//! Checks TOML syntax, unknown/misspelled fields, type errors, and a handful of
//! semantic problems (unparseable store URL, zero timeout, insecure TLS).

use std::{collections::HashMap, path::Path};

use crate::schema::WardlineConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "store", "cors",
    /// "security", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "store.base_url"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        (
            "server",
            Struct(HashMap::from([
                ("bind", Leaf),
                ("port", Leaf),
                ("max_body_bytes", Leaf),
            ])),
        ),
        (
            "store",
            Struct(HashMap::from([
                ("base_url", Leaf),
                ("collection", Leaf),
                ("timeout_secs", Leaf),
                ("accept_invalid_certs", Leaf),
                ("user_agent", Leaf),
            ])),
        ),
        ("cors", Struct(HashMap::from([("allowed_origins", Leaf)]))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            )],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let mut result = match std::fs::read_to_string(actual_path) {
        Ok(content) if is_toml => {
            validate_toml_str(&crate::env_subst::substitute_env(&content))
        },
        Ok(_) => match crate::loader::load_config(actual_path) {
            Ok(config) => {
                let mut diagnostics = vec![Diagnostic::new(
                    Severity::Info,
                    "file-ref",
                    "",
                    "unknown-field checks only run on TOML files",
                )];
                check_semantics(&config, &mut diagnostics);
                ValidationResult {
                    diagnostics,
                    config_path: None,
                }
            },
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "type-error",
                    "",
                    e.to_string(),
                )],
                config_path: None,
            },
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = config_path;
    result
}

/// Validate TOML config text.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<WardlineConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known_keys: Vec<&str> = fields.keys().copied().collect();

    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let level = if prefix.is_empty() {
            " at top level"
        } else {
            ""
        };
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field{level} (did you mean \"{s}\"?)"),
            None => format!("unknown field{level}"),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unknown-field",
            path,
            message,
        ));
    }
}

fn check_semantics(config: &WardlineConfig, diagnostics: &mut Vec<Diagnostic>) {
    match url::Url::parse(&config.store.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            if url.scheme() == "http" && !is_loopback_host(url.host_str()) {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "security",
                    "store.base_url",
                    "store is reached over plain HTTP on a non-local host",
                ));
            }
        },
        Ok(url) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "store",
            "store.base_url",
            format!("unsupported scheme \"{}\"", url.scheme()),
        )),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "store",
            "store.base_url",
            format!("invalid URL: {e}"),
        )),
    }

    if config.store.collection.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "store",
            "store.collection",
            "collection must not be empty",
        ));
    }

    if config.store.timeout_secs == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "store",
            "store.timeout_secs",
            "timeout must be at least one second",
        ));
    } else if config.store.timeout_secs > 60 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "store",
            "store.timeout_secs",
            format!(
                "{}s is a long time to hold an inbound request open",
                config.store.timeout_secs
            ),
        ));
    }

    if config.store.accept_invalid_certs {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "security",
            "store.accept_invalid_certs",
            "TLS certificate verification is disabled for the store",
        ));
    }

    let origins = &config.cors.allowed_origins;
    if origins.len() > 1 && origins.iter().any(|o| o == "*") {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "cors",
            "cors.allowed_origins",
            "\"*\" allows every origin; the other entries have no effect",
        ));
    }

    if config.server.port == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "server",
            "server.port",
            "port 0 binds a random free port",
        ));
    }

    if config.server.max_body_bytes == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "server",
            "server.max_body_bytes",
            "max_body_bytes of 0 rejects every request",
        ));
    }
}

fn is_loopback_host(host: Option<&str>) -> bool {
    matches!(host, Some("localhost" | "127.0.0.1" | "[::1]" | "::1"))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(result: &'a ValidationResult, path: &str) -> Option<&'a Diagnostic> {
        result.diagnostics.iter().find(|d| d.path == path)
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("store", "store"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("stor", "store"), 1);
        assert_eq!(levenshtein("colection", "collection"), 1);
    }

    #[test]
    fn defaults_are_clean() {
        let result = validate_toml_str("");
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0);
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = validate_toml_str("[stor]\nbase_url = \"http://localhost\"\n");
        let d = find(&result, "stor").unwrap();
        assert_eq!(d.category, "unknown-field");
        assert!(d.message.contains("did you mean \"store\""), "{}", d.message);
    }

    #[test]
    fn unknown_nested_key() {
        let result = validate_toml_str("[store]\ntimeout = 3\n");
        let d = find(&result, "store.timeout").unwrap();
        assert!(d.message.contains("timeout_secs"), "{}", d.message);
    }

    #[test]
    fn syntax_error_short_circuits() {
        let result = validate_toml_str("[store\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn type_error_is_reported() {
        let result = validate_toml_str("[server]\nport = \"five thousand\"\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn bad_store_url() {
        let result = validate_toml_str("[store]\nbase_url = \"not a url\"\n");
        assert_eq!(
            find(&result, "store.base_url").unwrap().severity,
            Severity::Error
        );

        let result = validate_toml_str("[store]\nbase_url = \"ftp://fhir.example.org\"\n");
        assert!(
            find(&result, "store.base_url")
                .unwrap()
                .message
                .contains("ftp")
        );
    }

    #[test]
    fn remote_plain_http_warns() {
        let result = validate_toml_str("[store]\nbase_url = \"http://fhir.example.org/r4\"\n");
        assert_eq!(
            find(&result, "store.base_url").unwrap().severity,
            Severity::Warning
        );
    }

    #[test]
    fn zero_timeout_is_error() {
        let result = validate_toml_str("[store]\ntimeout_secs = 0\n");
        assert!(result.has_errors());
    }

    #[test]
    fn body_limit_is_known_and_must_be_positive() {
        let result = validate_toml_str("[server]\nmax_body_bytes = 1048576\n");
        assert!(!result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .all(|d| d.path != "server.max_body_bytes")
        );

        let result = validate_toml_str("[server]\nmax_body_bytes = 0\n");
        assert!(result.has_errors());
    }

    #[test]
    fn insecure_tls_and_wildcard_cors_warn() {
        let result = validate_toml_str(
            "[store]\naccept_invalid_certs = true\n[cors]\nallowed_origins = [\"*\", \"https://a.example\"]\n",
        );
        assert!(find(&result, "store.accept_invalid_certs").is_some());
        assert!(find(&result, "cors.allowed_origins").is_some());
        assert!(!result.has_errors());
    }

    #[test]
    fn validate_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wardline.toml");
        let result = validate(Some(&path));
        assert!(result.has_errors());
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn validate_json_file_runs_semantic_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wardline.json");
        std::fs::write(&path, r#"{"store":{"timeout_secs":0}}"#).unwrap();
        let result = validate(Some(&path));
        assert!(find(&result, "store.timeout_secs").is_some());
    }
}
