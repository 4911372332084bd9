//! supervisorctl wrapper
//!
//! Control channel to supervisord. After every run the program definitions
//! are re-read and applied.

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

const SUPERVISORCTL: &str = "supervisorctl";

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("supervisorctl not found. Please install supervisor: apt-get install supervisor")]
    NotInstalled,

    #[error("supervisorctl {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;

/// Operations the bootstrapper needs from the process supervisor
#[async_trait]
pub trait SupervisorControl: Send + Sync {
    /// Fail with [`SupervisorError::NotInstalled`] when the control tool is missing
    async fn check_installed(&self) -> Result<()>;

    /// Re-read program definitions
    async fn reread(&self) -> Result<()>;

    /// Apply re-read definitions, (re)starting changed programs
    async fn update(&self) -> Result<()>;
}

/// supervisorctl on PATH
#[derive(Debug, Default)]
pub struct Supervisorctl;

impl Supervisorctl {
    pub fn new() -> Self {
        Self
    }

    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(SUPERVISORCTL);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", SUPERVISORCTL, args.join(" "));

        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SupervisorError::NotInstalled,
            _ => SupervisorError::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SupervisorError::CommandFailed {
                command: args.join(" "),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::debug!("{}", stdout.trim());
        Ok(stdout)
    }
}

#[async_trait]
impl SupervisorControl for Supervisorctl {
    async fn check_installed(&self) -> Result<()> {
        let which = Command::new("which")
            .arg(SUPERVISORCTL)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await?;

        if !which.success() {
            return Err(SupervisorError::NotInstalled);
        }
        Ok(())
    }

    async fn reread(&self) -> Result<()> {
        self.run_command(&["reread"]).await?;
        Ok(())
    }

    async fn update(&self) -> Result<()> {
        self.run_command(&["update"]).await?;
        Ok(())
    }
}
