//! Node role

use crate::error::{BootstrapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role the Consul agent runs in on this node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Server,
    Client,
}

impl NodeRole {
    /// Resolve the role from the two mutually exclusive role flags.
    ///
    /// Exactly one flag must be set; there is no default role.
    pub fn from_flags(server: bool, client: bool) -> Result<Self> {
        match (server, client) {
            (true, false) => Ok(Self::Server),
            (false, true) => Ok(Self::Client),
            (true, true) => Err(BootstrapError::Validation(
                "exactly one of --server or --client must be set, got both".to_string(),
            )),
            (false, false) => Err(BootstrapError::Validation(
                "exactly one of --server or --client must be set, got neither".to_string(),
            )),
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Server => write!(f, "server"),
            NodeRole::Client => write!(f, "client"),
        }
    }
}
