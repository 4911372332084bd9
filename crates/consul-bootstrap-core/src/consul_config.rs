//! Consul agent configuration document
//!
//! Builds the `default.json` that Consul reads from its config directory.
//! Optional fields are `None` and skipped on serialization, so a field whose
//! trigger condition is false is absent from the document rather than null.

use crate::error::{BootstrapError, Result};
use crate::model::{AutopilotSettings, ClusterFormationFacts, NodeRole, ParameterSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the generated document inside the config directory
pub const CONSUL_CONFIG_FILE: &str = "default.json";

const CLIENT_ADDR: &str = "0.0.0.0";

/// Generated Consul configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsulNodeConfig {
    pub advertise_addr: String,
    pub bind_addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_expect: Option<u32>,
    pub client_addr: String,
    pub datacenter: String,
    pub node_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_join: Option<Vec<String>>,
    pub server: bool,
    pub autopilot: AutopilotSettings,
    pub ui: bool,
    pub raft_protocol: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<String>,
}

impl ConsulNodeConfig {
    /// Build the document from resolved facts and effective parameters.
    pub fn generate(facts: &ClusterFormationFacts, params: &ParameterSet) -> Result<Self> {
        let bootstrap_expect = match params.role {
            NodeRole::Server => Some(facts.expected_cluster_size.ok_or_else(|| {
                BootstrapError::Validation(
                    "server role requires an expected cluster size".to_string(),
                )
            })?),
            NodeRole::Client => None,
        };

        let retry_join = params
            .cluster_tag_name
            .as_deref()
            .filter(|tag| !tag.is_empty())
            .map(|tag| vec![gce_retry_join(&facts.project_id, tag)]);

        tracing::debug!(
            role = %params.role,
            retry_join = retry_join.is_some(),
            encrypt = params.encrypt.is_some(),
            "Generating consul configuration"
        );

        Ok(Self {
            advertise_addr: facts.self_ip.clone(),
            bind_addr: facts.self_ip.clone(),
            bootstrap_expect,
            client_addr: CLIENT_ADDR.to_string(),
            datacenter: facts.region.clone(),
            node_name: facts.self_name.clone(),
            retry_join,
            server: params.role.is_server(),
            autopilot: params.autopilot.clone(),
            ui: true,
            raft_protocol: params.raft_protocol,
            encrypt: params.encrypt.clone(),
        })
    }

    /// Pretty-printed JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONSUL_CONFIG_FILE)
    }
}

/// Cloud auto-join directive: peers are found by instance tag instead of by
/// address.
pub fn gce_retry_join(project_id: &str, tag_value: &str) -> String {
    format!(
        "provider=gce project_name={} tag_value={}",
        project_id, tag_value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AutopilotOverrides, BootstrapDefaults, Overrides};

    fn facts(cluster_size: Option<u32>) -> ClusterFormationFacts {
        ClusterFormationFacts {
            self_ip: "10.138.0.4".to_string(),
            self_name: "consul-server-1".to_string(),
            region: "us-west1".to_string(),
            project_id: "my-project".to_string(),
            expected_cluster_size: cluster_size,
        }
    }

    fn params(overrides: Overrides) -> ParameterSet {
        ParameterSet::build(&BootstrapDefaults::new("/opt/consul"), overrides).unwrap()
    }

    fn server() -> Overrides {
        Overrides {
            server: true,
            ..Default::default()
        }
    }

    fn client() -> Overrides {
        Overrides {
            client: true,
            ..Default::default()
        }
    }

    fn as_json(config: &ConsulNodeConfig) -> serde_json::Value {
        serde_json::from_str(&config.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_server_document() {
        let config = ConsulNodeConfig::generate(&facts(Some(3)), &params(server())).unwrap();
        let json = as_json(&config);

        assert_eq!(json["advertise_addr"], "10.138.0.4");
        assert_eq!(json["bind_addr"], "10.138.0.4");
        assert_eq!(json["bootstrap_expect"], 3);
        assert_eq!(json["client_addr"], "0.0.0.0");
        assert_eq!(json["datacenter"], "us-west1");
        assert_eq!(json["node_name"], "consul-server-1");
        assert_eq!(json["server"], true);
        assert_eq!(json["ui"], true);
        assert_eq!(json["raft_protocol"], 3);
        assert!(json.get("retry_join").is_none());
        assert!(json.get("encrypt").is_none());
    }

    #[test]
    fn test_client_has_no_bootstrap_expect() {
        let config = ConsulNodeConfig::generate(&facts(None), &params(client())).unwrap();
        let json = as_json(&config);

        assert_eq!(json["server"], false);
        assert!(json.get("bootstrap_expect").is_none());
    }

    #[test]
    fn test_client_ignores_cluster_size_fact() {
        let config = ConsulNodeConfig::generate(&facts(Some(5)), &params(client())).unwrap();
        assert_eq!(config.bootstrap_expect, None);
    }

    #[test]
    fn test_server_without_cluster_size_is_rejected() {
        let result = ConsulNodeConfig::generate(&facts(None), &params(server()));
        assert!(matches!(result, Err(BootstrapError::Validation(_))));
    }

    #[test]
    fn test_retry_join_embeds_project_and_tag() {
        let overrides = Overrides {
            cluster_tag_name: Some("consul-servers".to_string()),
            ..client()
        };
        let config = ConsulNodeConfig::generate(&facts(None), &params(overrides)).unwrap();
        let json = as_json(&config);

        assert_eq!(
            json["retry_join"],
            serde_json::json!(["provider=gce project_name=my-project tag_value=consul-servers"])
        );
    }

    #[test]
    fn test_encrypt_tri_state() {
        let absent = ConsulNodeConfig::generate(&facts(None), &params(client())).unwrap();
        assert!(as_json(&absent).get("encrypt").is_none());

        let empty = Overrides {
            encrypt: Some(String::new()),
            ..client()
        };
        let empty = ConsulNodeConfig::generate(&facts(None), &params(empty)).unwrap();
        assert_eq!(as_json(&empty)["encrypt"], "");

        let key = Overrides {
            encrypt: Some("pUqJrVyVRj5jsiYEkM/tFQ==".to_string()),
            ..client()
        };
        let key = ConsulNodeConfig::generate(&facts(None), &params(key)).unwrap();
        assert_eq!(as_json(&key)["encrypt"], "pUqJrVyVRj5jsiYEkM/tFQ==");
    }

    #[test]
    fn test_autopilot_defaults_and_overrides() {
        let config = ConsulNodeConfig::generate(&facts(Some(3)), &params(server())).unwrap();
        assert_eq!(
            as_json(&config)["autopilot"],
            serde_json::json!({
                "cleanup_dead_servers": true,
                "last_contact_threshold": "200ms",
                "max_trailing_logs": 250,
                "server_stabilization_time": "10s",
                "redundancy_zone_tag": "az",
                "disable_upgrade_migration": false
            })
        );

        let overrides = Overrides {
            autopilot: AutopilotOverrides {
                cleanup_dead_servers: Some(false),
                last_contact_threshold: Some("1s".to_string()),
                server_stabilization_time: Some("30s".to_string()),
                redundancy_zone_tag: Some(String::new()),
                disable_upgrade_migration: Some(true),
                upgrade_version_tag: Some("version".to_string()),
                ..Default::default()
            },
            ..server()
        };
        let config = ConsulNodeConfig::generate(&facts(Some(3)), &params(overrides)).unwrap();
        let autopilot = &as_json(&config)["autopilot"];
        assert_eq!(autopilot["cleanup_dead_servers"], false);
        assert_eq!(autopilot["last_contact_threshold"], "1s");
        assert_eq!(autopilot["max_trailing_logs"], 250);
        assert_eq!(autopilot["server_stabilization_time"], "30s");
        assert_eq!(autopilot["redundancy_zone_tag"], "");
        assert_eq!(autopilot["disable_upgrade_migration"], true);
        assert_eq!(autopilot["upgrade_version_tag"], "version");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let overrides = Overrides {
            cluster_tag_name: Some("consul".to_string()),
            encrypt: Some("key".to_string()),
            ..server()
        };
        let params = params(overrides);

        let first = ConsulNodeConfig::generate(&facts(Some(3)), &params)
            .unwrap()
            .to_json()
            .unwrap();
        let second = ConsulNodeConfig::generate(&facts(Some(3)), &params)
            .unwrap()
            .to_json()
            .unwrap();
        assert_eq!(first, second);
    }
}
