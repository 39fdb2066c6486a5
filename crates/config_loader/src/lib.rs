//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Resolve `includes` and merge layers (the including file wins)
//! - Apply command-line overrides
//! - Validate configuration legality
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("node.toml")).unwrap();
//! println!("Node: {}", config.node_id);
//! ```
//!
//! # Layering
//!
//! ```toml
//! includes = ["base.toml", "site/calibration.toml"]
//! node_id = "node_007"
//! ```
//!
//! Include paths are relative to the including file. Includes are merged in
//! order, then the including file is merged on top. Tables merge key by key;
//! scalars and arrays replace.

mod merge;
mod overrides;
mod parser;
mod validator;

pub use contracts::NodeConfig;
pub use merge::merge;
pub use overrides::ConfigOverrides;
pub use parser::ConfigFormat;
pub use validator::validate;

use std::path::{Path, PathBuf};

use contracts::ContractError;
use tracing::debug;

/// Top-level key listing files to layer underneath the current one
const INCLUDES_KEY: &str = "includes";

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure (any layer)
    /// - Include cycle
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<NodeConfig, ContractError> {
        Self::load_with_overrides(path, &ConfigOverrides::default())
    }

    /// Load, apply `overrides`, then validate the result
    pub fn load_with_overrides(
        path: &Path,
        overrides: &ConfigOverrides,
    ) -> Result<NodeConfig, ContractError> {
        let mut stack = Vec::new();
        let tree = Self::load_layered(path, &mut stack)?;
        let mut config = parser::into_config(tree)?;
        overrides.apply(&mut config);
        validator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from string
    ///
    /// Includes, if any, resolve against the current directory.
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<NodeConfig, ContractError> {
        let mut stack = Vec::new();
        let tree = Self::merge_layers(content, format, Path::new("."), &mut stack)?;
        let config = parser::into_config(tree)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Serialize NodeConfig to TOML string
    pub fn to_toml(config: &NodeConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize NodeConfig to JSON string
    pub fn to_json(config: &NodeConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ContractError::not_found(format!("config file {}", path.display()))
            }
            _ => ContractError::io_at(path, e),
        })
    }

    /// Load one file and everything it includes, as a merged untyped tree
    fn load_layered(path: &Path, stack: &mut Vec<PathBuf>) -> Result<toml::Value, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        let canonical = std::fs::canonicalize(path).map_err(|e| ContractError::io_at(path, e))?;

        if stack.contains(&canonical) {
            let chain: Vec<String> = stack
                .iter()
                .chain(std::iter::once(&canonical))
                .map(|p| p.display().to_string())
                .collect();
            return Err(ContractError::config_validation(
                INCLUDES_KEY,
                format!("include cycle detected: {}", chain.join(" -> ")),
            ));
        }

        debug!(path = %path.display(), depth = stack.len(), "loading config layer");
        stack.push(canonical);
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let merged = Self::merge_layers(&content, format, base_dir, stack);
        stack.pop();
        merged
    }

    /// Parse `content`, merge its includes underneath it
    fn merge_layers(
        content: &str,
        format: ConfigFormat,
        base_dir: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<toml::Value, ContractError> {
        let mut own = parser::parse_value(content, format)?;
        let includes = match &mut own {
            toml::Value::Table(table) => table.remove(INCLUDES_KEY),
            _ => None,
        };

        let mut merged = toml::Value::Table(toml::Table::new());
        for include in Self::include_paths(includes)? {
            let child = Self::load_layered(&base_dir.join(include), stack)?;
            merge::merge(&mut merged, child);
        }
        merge::merge(&mut merged, own);
        Ok(merged)
    }

    fn include_paths(value: Option<toml::Value>) -> Result<Vec<PathBuf>, ContractError> {
        let Some(value) = value else {
            return Ok(Vec::new());
        };
        let invalid =
            || ContractError::config_validation(INCLUDES_KEY, "includes must be an array of strings");
        match value {
            toml::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(PathBuf::from(s)),
                    _ => Err(invalid()),
                })
                .collect(),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ErrorKind, InputKind, RunMode};
    use std::fs;
    use tempfile::TempDir;

    const MINIMAL_TOML: &str = r#"
mode = "replay"
node_id = "node_001"

[input]
type = "synth"
tick_hz = 10.0
max_ticks = 120

[input.synth]
seed = 3
obstacle_start_s = 8.0

[output]
out_dir = "out"
"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_str_toml() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg.node_id, "node_001");
        assert_eq!(cfg.input.max_ticks, 120);
        assert_eq!(cfg.input.synth.seed, 3);
    }

    #[test]
    fn test_round_trip_toml() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&cfg).unwrap();
        let cfg2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg, cfg2);
    }

    #[test]
    fn test_round_trip_json() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&cfg).unwrap();
        let cfg2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(cfg, cfg2);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = "[mapping]\nvoxel_size_m = -1.0\n";
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("voxel_size_m"), "got: {err}");
    }

    #[test]
    fn test_includes_merge_with_child_winning() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "base.toml",
            r#"
node_id = "base_node"
[input]
tick_hz = 20.0
[input.synth]
seed = 11
num_points = 400
"#,
        );
        write(
            &dir,
            "site/calib.toml",
            r#"
[calibration]
calibration_version = "site-v2"
"#,
        );
        let main = write(
            &dir,
            "node.toml",
            r#"
includes = ["base.toml", "site/calib.toml"]
node_id = "edge_7"
[input.synth]
seed = 12
"#,
        );

        let cfg = ConfigLoader::load_from_path(&main).unwrap();
        assert_eq!(cfg.node_id, "edge_7");
        assert_eq!(cfg.input.tick_hz, 20.0);
        assert_eq!(cfg.input.synth.seed, 12);
        assert_eq!(cfg.input.synth.num_points, 400);
        assert_eq!(cfg.calibration.calibration_version, "site-v2");
    }

    #[test]
    fn test_nested_includes_resolve_relative_to_includer() {
        let dir = TempDir::new().unwrap();
        write(&dir, "layers/common.toml", "[output]\nkeep_last_runs = 7\n");
        write(&dir, "layers/mid.json", r#"{ "includes": ["common.toml"], "node_id": "mid" }"#);
        let main = write(&dir, "node.toml", "includes = [\"layers/mid.json\"]\n");

        let cfg = ConfigLoader::load_from_path(&main).unwrap();
        assert_eq!(cfg.node_id, "mid");
        assert_eq!(cfg.output.keep_last_runs, 7);
    }

    #[test]
    fn test_include_cycle_detected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.toml", "includes = [\"b.toml\"]\n");
        let b = write(&dir, "b.toml", "includes = [\"a.toml\"]\n");

        let err = ConfigLoader::load_from_path(&b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("include cycle"), "got: {err}");
    }

    #[test]
    fn test_includes_must_be_strings() {
        let err = ConfigLoader::load_from_str("includes = [1]", ConfigFormat::Toml).unwrap_err();
        assert!(err.to_string().contains("array of strings"), "got: {err}");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let missing_include = write(&dir, "node.toml", "includes = [\"gone.toml\"]\n");
        let err = ConfigLoader::load_from_path(&missing_include).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "node.yaml", "node_id: x\n");
        let err = ConfigLoader::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"), "got: {err}");
    }

    #[test]
    fn test_overrides_are_revalidated() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "node.toml", MINIMAL_TOML);

        let overrides = ConfigOverrides {
            mode: Some(RunMode::Live),
            node_id: Some("override_node".into()),
            ..Default::default()
        };
        let cfg = ConfigLoader::load_with_overrides(&path, &overrides).unwrap();
        assert_eq!(cfg.mode, RunMode::Live);
        assert_eq!(cfg.node_id, "override_node");

        let bad = ConfigOverrides {
            node_id: Some(String::new()),
            ..Default::default()
        };
        let err = ConfigLoader::load_with_overrides(&path, &bad).unwrap_err();
        assert!(err.to_string().contains("node_id"), "got: {err}");
    }

    #[test]
    fn test_dataset_override_satisfies_frame_dir() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "node.toml", "[input]\ntype = \"frame_dir\"\n");
        assert!(ConfigLoader::load_from_path(&path).is_err());

        let overrides = ConfigOverrides {
            dataset_path: Some(dir.path().join("frames")),
            ..Default::default()
        };
        let cfg = ConfigLoader::load_with_overrides(&path, &overrides).unwrap();
        assert_eq!(cfg.input.kind, InputKind::FrameDir);
        assert_eq!(cfg.input.frame_dir.path, dir.path().join("frames"));
    }
}
