//! consul-bootstrap core
//!
//! Turns cluster-formation facts and operator parameters into the two
//! artifacts a freshly booted node needs:
//!
//! - the Consul agent configuration (`default.json`)
//! - the supervisord program definition that keeps the agent running
//!
//! Everything here is a pure transform; fetching metadata, writing files and
//! talking to supervisord happen in the callers.
//!
//! # Example
//!
//! ```ignore
//! use consul_bootstrap_core::{BootstrapDefaults, ConsulNodeConfig, Overrides, ParameterSet};
//!
//! let defaults = BootstrapDefaults::new("/opt/consul");
//! let params = ParameterSet::build(&defaults, Overrides { server: true, ..Default::default() })?;
//! let config = ConsulNodeConfig::generate(&facts, &params)?;
//! std::fs::write(ConsulNodeConfig::path_in(&params.directories.config_dir), config.to_json()?)?;
//! ```

pub mod consul_config;
pub mod error;
pub mod model;
pub mod supervisor;

// Re-exports
pub use consul_config::{CONSUL_CONFIG_FILE, ConsulNodeConfig, gce_retry_join};
pub use error::{BootstrapError, Result};
pub use model::*;
pub use supervisor::{
    PROGRAM_NAME, RunAsUser, STOP_SIGNAL, SUPERVISOR_CONFIG_PATH, SupervisedProcessDescriptor,
};
