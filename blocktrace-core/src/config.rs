//! Configuration file support for blocktrace
//!
//! Loads project-specific configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.blocktracerc.json` in the project root
//! 3. `blocktrace.config.json` in the project root
//!
//! All fields are optional. CLI flags take precedence over config file values.

use crate::identifier::NamingScheme;
use crate::planner::{MarkerFormat, MarkerStyle, DEFAULT_MARKER_FUNCTION, DEFAULT_RUN_ID};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// blocktrace configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlocktraceConfig {
    /// Marker text settings
    #[serde(default)]
    pub marker: Option<MarkerConfig>,

    /// Identifier scheme (default: auto)
    #[serde(default)]
    pub naming: Option<NamingScheme>,

    /// Glob patterns for sources to instrument (default: all)
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns for sources to leave alone
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Marker text settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkerConfig {
    /// Trace function name (default: trace_marker)
    pub function: Option<String>,
    /// Run id token passed as the second argument (default: ID)
    pub run_id: Option<String>,
    /// comment or statement (default: comment)
    pub style: Option<MarkerStyle>,
}

/// Resolved configuration with compiled glob patterns
#[derive(Debug)]
pub struct ResolvedConfig {
    /// Compiled include patterns (None means include all)
    pub include: Option<GlobSet>,
    /// Compiled exclude patterns
    pub exclude: GlobSet,
    pub marker: MarkerFormat,
    pub naming: NamingScheme,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

/// Whether `name` can be used as a C function name
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Check a run id token
pub fn validate_run_id(run_id: &str) -> Result<()> {
    if run_id.trim().is_empty() {
        anyhow::bail!("marker.run_id must not be empty");
    }
    if run_id.contains("*/") {
        anyhow::bail!("marker.run_id must not contain \"*/\" (got {})", run_id);
    }
    Ok(())
}

impl BlocktraceConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref marker) = self.marker {
            if let Some(ref function) = marker.function {
                if !is_c_identifier(function) {
                    anyhow::bail!(
                        "marker.function must be a C identifier (got {:?})",
                        function
                    );
                }
            }
            if let Some(ref run_id) = marker.run_id {
                validate_run_id(run_id)?;
            }
        }

        // Validate glob patterns compile
        for pattern in &self.include {
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {}", pattern))?;
        }
        for pattern in &self.exclude {
            Glob::new(pattern).with_context(|| format!("invalid exclude pattern: {}", pattern))?;
        }

        Ok(())
    }

    /// Resolve config into compiled form ready for use
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let include = if self.include.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.include {
                builder.add(Glob::new(pattern)?);
            }
            Some(builder.build()?)
        };

        let exclude = {
            let mut builder = GlobSetBuilder::new();
            for pattern in &self.exclude {
                builder.add(Glob::new(pattern)?);
            }
            builder.build()?
        };

        let marker = match &self.marker {
            Some(m) => MarkerFormat {
                function: m
                    .function
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MARKER_FUNCTION.to_string()),
                run_id: m.run_id.clone().unwrap_or_else(|| DEFAULT_RUN_ID.to_string()),
                style: m.style.unwrap_or_default(),
            },
            None => MarkerFormat::default(),
        };

        Ok(ResolvedConfig {
            include,
            exclude,
            marker,
            naming: self.naming.unwrap_or_default(),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Check if a source path should be instrumented based on include/exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        // Check exclude first
        if self.exclude.is_match(path_str.as_ref()) {
            return false;
        }

        // If include patterns exist, file must match at least one
        if let Some(ref include) = self.include {
            return include.is_match(path_str.as_ref());
        }

        true
    }

    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        BlocktraceConfig::default().resolve()
    }
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(BlocktraceConfig, PathBuf)>> {
    for name in [".blocktracerc.json", "blocktrace.config.json"] {
        let path = project_root.join(name);
        if path.exists() {
            let config = load_config_file(&path)?;
            return Ok(Some((config, path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<BlocktraceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: BlocktraceConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (BlocktraceConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = BlocktraceConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert!(resolved.include.is_none());
        assert_eq!(resolved.marker, MarkerFormat::default());
        assert_eq!(resolved.naming, NamingScheme::Auto);
        assert!(resolved.should_include(Path::new("src/a.cpp")));
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{}"#;
        let config: BlocktraceConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "marker": { "function": "__bt_hit", "run_id": "RUN_7", "style": "statement" },
            "naming": "qualified",
            "include": ["src/**"],
            "exclude": ["**/third_party/**"]
        }"#;
        let config: BlocktraceConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.marker.function, "__bt_hit");
        assert_eq!(resolved.marker.run_id, "RUN_7");
        assert_eq!(resolved.marker.style, MarkerStyle::Statement);
        assert_eq!(resolved.naming, NamingScheme::Qualified);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{ "marker": { "fn": "x" } }"#;
        assert!(serde_json::from_str::<BlocktraceConfig>(json).is_err());
        let json = r#"{ "style": "comment" }"#;
        assert!(serde_json::from_str::<BlocktraceConfig>(json).is_err());
    }

    #[test]
    fn test_invalid_marker_function() {
        for name in ["", "1abc", "trace-marker", "a b"] {
            let config = BlocktraceConfig {
                marker: Some(MarkerConfig {
                    function: Some(name.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", name);
        }
    }

    #[test]
    fn test_invalid_run_id() {
        for run_id in ["", "  ", "a*/b"] {
            let config = BlocktraceConfig {
                marker: Some(MarkerConfig {
                    run_id: Some(run_id.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{:?} should be rejected", run_id);
        }
    }

    #[test]
    fn test_invalid_glob() {
        let config = BlocktraceConfig {
            include: vec!["[invalid".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_should_include() {
        let config = BlocktraceConfig {
            include: vec!["src/**".to_string()],
            exclude: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert!(resolved.should_include(Path::new("src/core/a.cpp")));
        assert!(!resolved.should_include(Path::new("src/generated/b.cpp")));
        assert!(!resolved.should_include(Path::new("tools/c.cpp")));
    }

    #[test]
    fn test_discover_and_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());

        fs::write(
            dir.path().join(".blocktracerc.json"),
            r#"{ "marker": { "run_id": "42" } }"#,
        )
        .unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.marker.run_id, "42");
        assert_eq!(
            resolved.config_path,
            Some(dir.path().join(".blocktracerc.json"))
        );
    }

    #[test]
    fn test_explicit_config_path_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_and_resolve(dir.path(), Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
