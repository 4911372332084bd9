//! Cluster formation facts

use serde::{Deserialize, Serialize};

/// Facts about this instance resolved from the metadata service at boot.
///
/// Never user supplied. Once resolved they are not mutated for the rest of
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterFormationFacts {
    /// Primary internal IP address
    pub self_ip: String,
    /// Instance name, used as the Consul node name
    pub self_name: String,
    /// Region the instance runs in, used as the datacenter
    pub region: String,
    /// Owning project ID
    pub project_id: String,
    /// Number of servers to wait for. Only resolved for servers.
    pub expected_cluster_size: Option<u32>,
}
