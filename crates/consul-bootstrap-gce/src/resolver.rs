//! Metadata resolver
//!
//! Maps each cluster-formation fact to its metadata path and parses the
//! returned value. Lookups run one after another; the first failure aborts.

use crate::error::{MetadataError, Result};
use crate::metadata::MetadataSource;
use consul_bootstrap_core::{ClusterFormationFacts, NodeRole};

const NAME_PATH: &str = "instance/name";
const ZONE_PATH: &str = "instance/zone";
const PROJECT_ID_PATH: &str = "project/project-id";

/// Resolves node identity from a [`MetadataSource`]
pub struct MetadataResolver<S> {
    source: S,
}

impl<S: MetadataSource> MetadataResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Internal IP of the given network interface
    pub async fn self_ip(&self, interface: u32) -> Result<String> {
        self.source
            .get(&format!("instance/network-interfaces/{}/ip", interface))
            .await
    }

    pub async fn self_name(&self) -> Result<String> {
        self.source.get(NAME_PATH).await
    }

    pub async fn project_id(&self) -> Result<String> {
        self.source.get(PROJECT_ID_PATH).await
    }

    /// Region the instance runs in, with the zone suffix stripped
    pub async fn region(&self) -> Result<String> {
        let zone = self.source.get(ZONE_PATH).await?;
        parse_region(&zone).ok_or_else(|| MetadataError::Malformed {
            path: ZONE_PATH.to_string(),
            value: zone,
        })
    }

    /// Value of a custom instance attribute
    pub async fn custom_value(&self, key: &str) -> Result<String> {
        self.source
            .get(&format!("instance/attributes/{}", key))
            .await
    }

    /// Expected number of servers, read from the attribute `key`
    pub async fn expected_cluster_size(&self, key: &str) -> Result<u32> {
        let value = self.custom_value(key).await?;
        value.parse::<u32>().map_err(|_| MetadataError::Malformed {
            path: format!("instance/attributes/{}", key),
            value,
        })
    }

    /// Resolve every fact the config generator needs. The cluster size is
    /// only looked up for servers.
    pub async fn resolve_facts(
        &self,
        role: NodeRole,
        interface: u32,
        cluster_size_key: &str,
    ) -> Result<ClusterFormationFacts> {
        let self_ip = self.self_ip(interface).await?;
        let self_name = self.self_name().await?;
        let region = self.region().await?;
        let project_id = self.project_id().await?;
        let expected_cluster_size = match role {
            NodeRole::Server => Some(self.expected_cluster_size(cluster_size_key).await?),
            NodeRole::Client => None,
        };

        tracing::info!(
            ip = %self_ip,
            name = %self_name,
            region = %region,
            project = %project_id,
            cluster_size = ?expected_cluster_size,
            "Resolved instance metadata"
        );

        Ok(ClusterFormationFacts {
            self_ip,
            self_name,
            region,
            project_id,
            expected_cluster_size,
        })
    }
}

/// Region from a zone path such as `projects/123/zones/us-west1-a`.
///
/// Returns `None` unless the last path segment ends in `-<letter>`.
pub fn parse_region(zone_path: &str) -> Option<String> {
    let zone = zone_path.rsplit('/').next()?;
    let (region, suffix) = zone.rsplit_once('-')?;
    let is_zone_letter = matches!(suffix.as_bytes(), [b'a'..=b'z']);
    (is_zone_letter && !region.is_empty()).then(|| region.to_string())
}
