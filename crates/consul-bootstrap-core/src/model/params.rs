//! Parameter set
//!
//! Merges caller overrides with [`BootstrapDefaults`] into an effective
//! [`ParameterSet`]. The merge is a pure function of its two inputs.

use super::autopilot::{AutopilotOverrides, AutopilotSettings};
use super::role::NodeRole;
use crate::error::{BootstrapError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_RAFT_PROTOCOL: u32 = 3;
pub const DEFAULT_CLUSTER_SIZE_KEY: &str = "cluster-size";
pub const DEFAULT_NETWORK_INTERFACE: u32 = 0;

/// Compiled-in defaults, built once at startup.
#[derive(Debug, Clone)]
pub struct BootstrapDefaults {
    /// Root of the Consul install, e.g. `/opt/consul`
    pub install_root: PathBuf,
    pub raft_protocol: u32,
    pub cluster_size_key: String,
    pub network_interface: u32,
    pub autopilot: AutopilotSettings,
}

impl BootstrapDefaults {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            raft_protocol: DEFAULT_RAFT_PROTOCOL,
            cluster_size_key: DEFAULT_CLUSTER_SIZE_KEY.to_string(),
            network_interface: DEFAULT_NETWORK_INTERFACE,
            autopilot: AutopilotSettings::default(),
        }
    }

    /// Install root for a binary living at `<root>/bin/<exe>`
    pub fn install_root_for_exe(exe: &Path) -> Option<PathBuf> {
        exe.parent()?.parent().map(Path::to_path_buf)
    }

    pub fn directories(&self) -> Directories {
        Directories {
            config_dir: self.install_root.join("config"),
            data_dir: self.install_root.join("data"),
            log_dir: self.install_root.join("log"),
            bin_dir: self.install_root.join("bin"),
        }
    }
}

/// Directories the agent is installed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub bin_dir: PathBuf,
}

/// Raw caller overrides. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: bool,
    pub client: bool,
    pub cluster_tag_name: Option<String>,
    pub raft_protocol: Option<u32>,
    pub config_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub bin_dir: Option<PathBuf>,
    pub user: Option<String>,
    pub skip_consul_config: bool,
    /// `Some("")` is an explicitly empty key and is kept as such
    pub encrypt: Option<String>,
    pub cluster_size_key: Option<String>,
    pub network_interface: Option<u32>,
    pub environment: Vec<(String, String)>,
    pub autopilot: AutopilotOverrides,
}

/// Effective parameters for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSet {
    pub role: NodeRole,
    pub cluster_tag_name: Option<String>,
    pub raft_protocol: u32,
    pub directories: Directories,
    /// `None` means the owner of the install root
    pub user: Option<String>,
    pub skip_consul_config: bool,
    pub encrypt: Option<String>,
    pub cluster_size_key: String,
    pub network_interface: u32,
    pub environment: Vec<(String, String)>,
    pub autopilot: AutopilotSettings,
}

impl ParameterSet {
    /// Validate overrides and fill every unset field from `defaults`.
    pub fn build(defaults: &BootstrapDefaults, overrides: Overrides) -> Result<Self> {
        let role = NodeRole::from_flags(overrides.server, overrides.client)?;

        require_non_empty("--cluster-tag-name", overrides.cluster_tag_name.as_deref())?;
        require_non_empty("--user", overrides.user.as_deref())?;
        require_non_empty("--cluster-size-key", overrides.cluster_size_key.as_deref())?;
        require_non_empty_path("--config-dir", overrides.config_dir.as_deref())?;
        require_non_empty_path("--data-dir", overrides.data_dir.as_deref())?;
        require_non_empty_path("--log-dir", overrides.log_dir.as_deref())?;
        require_non_empty_path("--bin-dir", overrides.bin_dir.as_deref())?;
        require_non_empty(
            "--autopilot-last-contact-threshold",
            overrides.autopilot.last_contact_threshold.as_deref(),
        )?;
        require_non_empty(
            "--autopilot-server-stabilization-time",
            overrides.autopilot.server_stabilization_time.as_deref(),
        )?;
        for (key, value) in &overrides.environment {
            validate_environment(key, value)?;
        }

        let default_dirs = defaults.directories();
        let directories = Directories {
            config_dir: overrides.config_dir.unwrap_or(default_dirs.config_dir),
            data_dir: overrides.data_dir.unwrap_or(default_dirs.data_dir),
            log_dir: overrides.log_dir.unwrap_or(default_dirs.log_dir),
            bin_dir: overrides.bin_dir.unwrap_or(default_dirs.bin_dir),
        };

        Ok(Self {
            role,
            cluster_tag_name: overrides.cluster_tag_name,
            raft_protocol: overrides.raft_protocol.unwrap_or(defaults.raft_protocol),
            directories,
            user: overrides.user,
            skip_consul_config: overrides.skip_consul_config,
            encrypt: overrides.encrypt,
            cluster_size_key: overrides
                .cluster_size_key
                .unwrap_or_else(|| defaults.cluster_size_key.clone()),
            network_interface: overrides
                .network_interface
                .unwrap_or(defaults.network_interface),
            environment: overrides.environment,
            autopilot: defaults.autopilot.merged(&overrides.autopilot),
        })
    }
}

/// Keys must be shell-style identifiers and values must stay on one INI line.
fn validate_environment(key: &str, value: &str) -> Result<()> {
    let mut chars = key.chars();
    let valid_key = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_key {
        return Err(BootstrapError::Validation(format!(
            "--environment key '{}' must match [A-Za-z_][A-Za-z0-9_]*",
            key
        )));
    }
    if value.contains(['\n', '\r']) {
        return Err(BootstrapError::Validation(format!(
            "--environment value for '{}' must not contain line breaks",
            key
        )));
    }
    Ok(())
}

fn require_non_empty(flag: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.is_empty() => Err(BootstrapError::Validation(format!(
            "{} must not be empty",
            flag
        ))),
        _ => Ok(()),
    }
}

fn require_non_empty_path(flag: &str, value: Option<&Path>) -> Result<()> {
    match value {
        Some(p) if p.as_os_str().is_empty() => Err(BootstrapError::Validation(format!(
            "{} must not be empty",
            flag
        ))),
        _ => Ok(()),
    }
}
