//! Google Compute Engine metadata for consul-bootstrap
//!
//! Resolves the facts a node needs to join its cluster (IP, name, region,
//! project, expected cluster size) from the instance metadata server.
//!
//! # Example
//!
//! ```ignore
//! use consul_bootstrap_gce::{GceMetadataClient, MetadataResolver};
//! use consul_bootstrap_core::NodeRole;
//!
//! let resolver = MetadataResolver::new(GceMetadataClient::from_env()?);
//! let facts = resolver.resolve_facts(NodeRole::Server, 0, "cluster-size").await?;
//! ```

pub mod error;
pub mod metadata;
pub mod resolver;

pub use error::{MetadataError, Result};
pub use metadata::{GceMetadataClient, METADATA_HOST, METADATA_HOST_ENV, MetadataSource};
pub use resolver::{MetadataResolver, parse_region};
