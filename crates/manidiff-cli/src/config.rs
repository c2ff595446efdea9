use manidiff_schema::FieldPath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fields dropped by `--normalize-manifests` unless the config names others.
pub const DEFAULT_NORMALIZE_FIELDS: &[&str] = &[
    "metadata.creationTimestamp",
    "metadata.generation",
    "metadata.resourceVersion",
    "metadata.uid",
    "metadata.managedFields",
    "metadata.selfLink",
    "status",
];

/// Settings read from `~/.config/manidiff/config.toml` or `--config`.
/// Command-line flags take precedence over every value here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub default_namespace: Option<String>,
    pub suppress: Vec<String>,
    pub normalize_fields: Option<Vec<String>>,
    pub cluster_scoped_kinds: Vec<String>,
    pub context: Option<i64>,
    pub output: Option<String>,
}

impl CliConfig {
    /// Load the default config file. A missing file means defaults.
    pub fn load_default() -> Result<Self, String> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("config error: failed to read {}: {e}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| format!("config error: invalid config {}: {e}", path.display()))
    }

    pub fn normalize_fields(&self) -> Result<Vec<FieldPath>, String> {
        let parse = |raw: &str| FieldPath::parse(raw).map_err(|e| format!("config error: {e}"));
        match &self.normalize_fields {
            Some(fields) => fields.iter().map(String::as_str).map(parse).collect(),
            None => DEFAULT_NORMALIZE_FIELDS.iter().copied().map(parse).collect(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/manidiff/config.toml"))
}
