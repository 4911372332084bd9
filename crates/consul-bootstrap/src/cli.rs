use clap::{ArgAction, Parser};
use consul_bootstrap_core::{AutopilotOverrides, Overrides};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "run-consul", version)]
#[command(
    about = "Configure Consul from Google Compute Engine metadata and start it under supervisord",
    long_about = None
)]
pub struct Cli {
    /// Run Consul in server mode (exactly one of --server or --client is required)
    #[arg(long)]
    pub server: bool,

    /// Run Consul in client mode (exactly one of --server or --client is required)
    #[arg(long)]
    pub client: bool,

    /// Instance tag whose members are auto-joined into the cluster
    #[arg(long, value_name = "TAG")]
    pub cluster_tag_name: Option<String>,

    /// Raft protocol version [default: 3]
    #[arg(long, value_name = "N")]
    pub raft_protocol: Option<u32>,

    /// Consul config directory [default: <install root>/config]
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Consul data directory [default: <install root>/data]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for Consul's stdout/stderr logs [default: <install root>/log]
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Directory holding the consul binary [default: <install root>/bin]
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// User to run Consul as [default: owner of the install root]
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Leave the Consul config directory untouched; only (re)write the supervisor config
    #[arg(long)]
    pub skip_consul_config: bool,

    /// Gossip encryption key. An empty value is written as-is.
    #[arg(long, value_name = "KEY")]
    pub encrypt: Option<String>,

    /// Remove dead servers when a new one joins [default: true]
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub autopilot_cleanup_dead_servers: Option<bool>,

    /// Max time a server may go without leader contact [default: 200ms]
    #[arg(long, value_name = "DURATION")]
    pub autopilot_last_contact_threshold: Option<String>,

    /// Max log entries a server may trail the leader by [default: 250]
    #[arg(long, value_name = "N")]
    pub autopilot_max_trailing_logs: Option<u64>,

    /// Min time a server must be stable before it can vote [default: 10s]
    #[arg(long, value_name = "DURATION")]
    pub autopilot_server_stabilization_time: Option<String>,

    /// Node meta key holding the redundancy zone; empty disables it [default: az]
    #[arg(long, value_name = "TAG")]
    pub autopilot_redundancy_zone_tag: Option<String>,

    /// Disable automatic upgrade migrations [default: false]
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub autopilot_disable_upgrade_migration: Option<bool>,

    /// Node meta key overriding the version used for upgrade migrations
    #[arg(long, value_name = "TAG")]
    pub autopilot_upgrade_version_tag: Option<String>,

    /// Instance attribute holding the expected number of servers [default: cluster-size]
    #[arg(long, value_name = "KEY")]
    pub cluster_size_key: Option<String>,

    /// Network interface whose IP is advertised [default: 0]
    #[arg(long, value_name = "N")]
    pub network_interface: Option<u32>,

    /// Extra environment variable for the Consul process (repeatable)
    #[arg(long = "environment", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub environment: Vec<(String, String)>,
}

impl Cli {
    pub fn into_overrides(self) -> Overrides {
        Overrides {
            server: self.server,
            client: self.client,
            cluster_tag_name: self.cluster_tag_name,
            raft_protocol: self.raft_protocol,
            config_dir: self.config_dir,
            data_dir: self.data_dir,
            log_dir: self.log_dir,
            bin_dir: self.bin_dir,
            user: self.user,
            skip_consul_config: self.skip_consul_config,
            encrypt: self.encrypt,
            cluster_size_key: self.cluster_size_key,
            network_interface: self.network_interface,
            environment: self.environment,
            autopilot: AutopilotOverrides {
                cleanup_dead_servers: self.autopilot_cleanup_dead_servers,
                last_contact_threshold: self.autopilot_last_contact_threshold,
                max_trailing_logs: self.autopilot_max_trailing_logs,
                server_stabilization_time: self.autopilot_server_stabilization_time,
                redundancy_zone_tag: self.autopilot_redundancy_zone_tag,
                disable_upgrade_migration: self.autopilot_disable_upgrade_migration,
                upgrade_version_tag: self.autopilot_upgrade_version_tag,
            },
        }
    }
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}
