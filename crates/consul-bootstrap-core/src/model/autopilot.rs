//! Autopilot settings

use serde::{Deserialize, Serialize};

/// Consul autopilot tunables.
///
/// Field names serialize to the keys of Consul's `autopilot` stanza.
/// Duration values are passed through verbatim; Consul parses them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutopilotSettings {
    pub cleanup_dead_servers: bool,
    pub last_contact_threshold: String,
    pub max_trailing_logs: u64,
    pub server_stabilization_time: String,
    /// Empty disables redundancy zones
    pub redundancy_zone_tag: String,
    pub disable_upgrade_migration: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_version_tag: Option<String>,
}

impl Default for AutopilotSettings {
    fn default() -> Self {
        Self {
            cleanup_dead_servers: true,
            last_contact_threshold: "200ms".to_string(),
            max_trailing_logs: 250,
            server_stabilization_time: "10s".to_string(),
            redundancy_zone_tag: "az".to_string(),
            disable_upgrade_migration: false,
            upgrade_version_tag: None,
        }
    }
}

/// Caller overrides for [`AutopilotSettings`]; `None` keeps the default.
#[derive(Debug, Clone, Default)]
pub struct AutopilotOverrides {
    pub cleanup_dead_servers: Option<bool>,
    pub last_contact_threshold: Option<String>,
    pub max_trailing_logs: Option<u64>,
    pub server_stabilization_time: Option<String>,
    pub redundancy_zone_tag: Option<String>,
    pub disable_upgrade_migration: Option<bool>,
    pub upgrade_version_tag: Option<String>,
}

impl AutopilotSettings {
    /// Apply overrides field by field. No cross-field checks are made.
    pub fn merged(&self, overrides: &AutopilotOverrides) -> Self {
        Self {
            cleanup_dead_servers: overrides
                .cleanup_dead_servers
                .unwrap_or(self.cleanup_dead_servers),
            last_contact_threshold: overrides
                .last_contact_threshold
                .clone()
                .unwrap_or_else(|| self.last_contact_threshold.clone()),
            max_trailing_logs: overrides.max_trailing_logs.unwrap_or(self.max_trailing_logs),
            server_stabilization_time: overrides
                .server_stabilization_time
                .clone()
                .unwrap_or_else(|| self.server_stabilization_time.clone()),
            redundancy_zone_tag: overrides
                .redundancy_zone_tag
                .clone()
                .unwrap_or_else(|| self.redundancy_zone_tag.clone()),
            disable_upgrade_migration: overrides
                .disable_upgrade_migration
                .unwrap_or(self.disable_upgrade_migration),
            upgrade_version_tag: overrides
                .upgrade_version_tag
                .clone()
                .or_else(|| self.upgrade_version_tag.clone()),
        }
    }
}
