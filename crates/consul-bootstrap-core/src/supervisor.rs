//! Supervised process descriptor
//!
//! Describes to supervisord how to launch, restart and log the Consul agent.
//! Rendered as an INI `[program:...]` section with Tera.

use crate::error::{BootstrapError, Result};
use crate::model::Directories;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Where supervisord picks up program definitions
pub const SUPERVISOR_CONFIG_PATH: &str = "/etc/supervisor/conf.d/run-consul.conf";

pub const PROGRAM_NAME: &str = "consul";

const DESCRIPTOR_TEMPLATE: &str = r#"[program:{{ program_name }}]
command={{ command }}
stdout_logfile={{ stdout_log_path }}
stderr_logfile={{ stderr_log_path }}
numprocs=1
autostart={{ auto_start }}
autorestart={{ auto_restart }}
stopsignal={{ stop_signal }}
user={{ run_as_user }}
environment={{ environment }}
"#;

/// Account the agent runs as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAsUser {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home_dir: PathBuf,
}

/// Signal supervisord sends to stop the agent
pub const STOP_SIGNAL: &str = "INT";

/// supervisord program definition for the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisedProcessDescriptor {
    pub program_name: String,
    pub command: String,
    pub stdout_log_path: PathBuf,
    pub stderr_log_path: PathBuf,
    pub run_as_user: String,
    pub run_as_user_home_dir: PathBuf,
    /// Extra variables exported after HOME
    pub environment: Vec<(String, String)>,
    pub auto_start: bool,
    pub auto_restart: bool,
    pub stop_signal: String,
}

impl SupervisedProcessDescriptor {
    /// Build the descriptor.
    ///
    /// Fails with [`BootstrapError::FatalConfig`] when the user's home
    /// directory is unset or `/`.
    pub fn generate(
        dirs: &Directories,
        user: &RunAsUser,
        environment: &[(String, String)],
    ) -> Result<Self> {
        if user.home_dir.as_os_str().is_empty() || user.home_dir == Path::new("/") {
            return Err(BootstrapError::FatalConfig(format!(
                "home directory of user '{}' resolves to '{}'; set a home directory for that user",
                user.name,
                user.home_dir.display()
            )));
        }

        let command = format!(
            "{} agent -config-dir {} -data-dir {}",
            dirs.bin_dir.join("consul").display(),
            dirs.config_dir.display(),
            dirs.data_dir.display()
        );
        tracing::debug!(user = %user.name, "Supervisor command: {}", command);

        Ok(Self {
            program_name: PROGRAM_NAME.to_string(),
            command,
            stdout_log_path: dirs.log_dir.join("consul-stdout.log"),
            stderr_log_path: dirs.log_dir.join("consul-stderr.log"),
            run_as_user: user.name.clone(),
            run_as_user_home_dir: user.home_dir.clone(),
            environment: environment.to_vec(),
            auto_start: true,
            auto_restart: true,
            stop_signal: STOP_SIGNAL.to_string(),
        })
    }

    /// supervisord `environment=` value: HOME first, then the extras in order
    pub fn environment_line(&self) -> String {
        std::iter::once(("HOME", self.run_as_user_home_dir.display().to_string()))
            .chain(
                self.environment
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.clone())),
            )
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_value(&v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render the INI program section
    pub fn render(&self) -> Result<String> {
        let mut context = Context::new();
        context.insert("program_name", &self.program_name);
        context.insert("command", &self.command);
        context.insert("stdout_log_path", &self.stdout_log_path.display().to_string());
        context.insert("stderr_log_path", &self.stderr_log_path.display().to_string());
        context.insert("auto_start", &self.auto_start);
        context.insert("auto_restart", &self.auto_restart);
        context.insert("stop_signal", &self.stop_signal);
        context.insert("run_as_user", &self.run_as_user);
        context.insert("environment", &self.environment_line());

        let mut tera = Tera::default();
        Ok(tera.render_str(DESCRIPTOR_TEMPLATE, &context)?)
    }
}

/// Quote-safe and safe from supervisord's `%(name)s` expansion
fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%")
}
