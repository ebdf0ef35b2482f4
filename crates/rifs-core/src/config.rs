//! Toolkit configuration.
//!
//! The top-level [`Config`] struct is deserialized from TOML. Every section
//! defaults sensibly so an empty file is valid.
//!
//! ```toml
//! [farm]
//! workspace_root = "$FARM_ROOT/rif"
//! interpreter = ["python3"]
//!
//! [job]
//! cpus = 4
//! ram = 16000
//!
//! [resolve]
//! policy = "force"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Files probed, in order, when no explicit config path is given.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./rifs.toml",
    "~/.config/rifs/config.toml",
    "/etc/rifs/config.toml",
];

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub farm: FarmConfig,
    pub job: JobDefaults,
    pub resolve: ResolveConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Load configuration from an explicit file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        for warning in config.validate() {
            tracing::warn!("{}: {warning}", path.display());
        }
        Ok(config)
    }

    /// Load configuration from `path` when given, otherwise from the first
    /// default location that exists, otherwise return defaults.
    ///
    /// An explicit path that cannot be read or parsed is an error; default
    /// locations are only used when present.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        for candidate in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(candidate);
            let candidate = Path::new(expanded.as_ref());
            if candidate.exists() {
                tracing::debug!("Using config file {}", candidate.display());
                return Self::load(candidate);
            }
        }

        tracing::debug!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.farm.workspace_root.trim().is_empty() {
            warnings.push("farm.workspace_root is empty".into());
        } else if let Err(e) = self.farm.workspace_root() {
            warnings.push(e.to_string());
        }

        if self.farm.interpreter.is_empty() {
            warnings.push("farm.interpreter is empty; script jobs will have no program".into());
        }

        if self.job.cpus == 0 {
            warnings.push("job.cpus is 0".into());
        }

        if self.job.ram == 0 {
            warnings.push("job.ram is 0".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Where workspaces live and how materialized scripts are executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Root for per-operation workspaces. Environment variables and `~` are
    /// expanded when the root is used.
    pub workspace_root: String,
    /// Command prefix used to run a materialized script.
    pub interpreter: Vec<String>,
    /// Show name stamped on every job as `job_name`.
    pub show: String,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("rif").display().to_string(),
            interpreter: vec!["python".into()],
            show: std::env::var("DD_SHOW").unwrap_or_else(|_| "DEV01".into()),
        }
    }
}

impl FarmConfig {
    /// The workspace root with environment variables and `~` expanded.
    pub fn workspace_root(&self) -> Result<PathBuf> {
        shellexpand::full(&self.workspace_root)
            .map(|expanded| PathBuf::from(expanded.as_ref()))
            .map_err(|e| {
                Error::Config(format!(
                    "farm.workspace_root '{}' cannot be expanded: {e}",
                    self.workspace_root
                ))
            })
    }
}

/// Resource hints applied to every new job before operation fields and
/// submission fields are copied over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefaults {
    pub activity: String,
    pub cpus: u32,
    pub ram: u64,
    pub job_class_type: String,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            activity: "comprender".into(),
            cpus: 2,
            ram: 8000,
            job_class_type: "NukeJob".into(),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    pub policy: ResolvePolicy,
}

// ---------------------------------------------------------------------------
// ResolvePolicy
// ---------------------------------------------------------------------------

/// What the resolver does with groupings whose dependencies never become
/// satisfiable (missing from the batch, or part of a cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePolicy {
    /// Drop them; they are never submitted.
    #[default]
    Strict,
    /// Append them after everything else, in their original relative order,
    /// with their dependency lists left unresolved.
    Force,
}

impl fmt::Display for ResolvePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvePolicy::Strict => f.write_str("strict"),
            ResolvePolicy::Force => f.write_str("force"),
        }
    }
}

impl FromStr for ResolvePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ResolvePolicy::Strict),
            "force" => Ok(ResolvePolicy::Force),
            other => Err(Error::Validation(format!(
                "unknown resolve policy '{other}' (expected strict or force)"
            ))),
        }
    }
}
