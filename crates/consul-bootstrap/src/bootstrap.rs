//! Bootstrap orchestration
//!
//! Runs the steps of one boot strictly in order:
//!
//! 1. supervisorctl present
//! 2. run-as user resolved
//! 3. metadata resolved and `default.json` written (unless skipped)
//! 4. supervisord program definition written
//! 5. supervisord told to reread and apply
//!
//! A failing step aborts the run. Files already written stay in place and the
//! supervisor is not signaled.

use crate::account::{self, UserDirectory};
use crate::steps::{BootstrapStep, StepLogger};
use crate::supervisorctl::SupervisorControl;
use anyhow::Context;
use consul_bootstrap_core::{
    ClusterFormationFacts, ConsulNodeConfig, ParameterSet, RunAsUser, SupervisedProcessDescriptor,
};
use consul_bootstrap_gce::{MetadataResolver, MetadataSource};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Files produced by a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapOutcome {
    /// `None` when the consul config was skipped
    pub consul_config: Option<PathBuf>,
    pub supervisor_config: PathBuf,
    pub node_name: Option<String>,
}

pub struct Bootstrap<S, C, U> {
    resolver: MetadataResolver<S>,
    supervisor: C,
    users: U,
    install_root: PathBuf,
    supervisor_config_path: PathBuf,
}

impl<S, C, U> Bootstrap<S, C, U>
where
    S: MetadataSource,
    C: SupervisorControl,
    U: UserDirectory,
{
    pub fn new(
        metadata: S,
        supervisor: C,
        users: U,
        install_root: impl Into<PathBuf>,
        supervisor_config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver: MetadataResolver::new(metadata),
            supervisor,
            users,
            install_root: install_root.into(),
            supervisor_config_path: supervisor_config_path.into(),
        }
    }

    pub async fn run(
        &self,
        params: &ParameterSet,
        logger: &mut StepLogger,
    ) -> anyhow::Result<BootstrapOutcome> {
        logger.start_step(BootstrapStep::CheckDependencies);
        logger.finish(self.supervisor.check_installed().await)?;

        logger.start_step(BootstrapStep::ResolveUser);
        let user = logger.finish(self.resolve_user(params))?;
        logger.log_detail(&format!(
            "{} (uid {}, home {})",
            user.name,
            user.uid,
            user.home_dir.display()
        ));

        let (consul_config, node_name) = if params.skip_consul_config {
            logger.start_step(BootstrapStep::ResolveMetadata);
            logger.step_skipped("--skip-consul-config");
            logger.start_step(BootstrapStep::WriteConsulConfig);
            logger.step_skipped("--skip-consul-config");
            tracing::info!("Skipping consul config generation");
            (None, None)
        } else {
            logger.start_step(BootstrapStep::ResolveMetadata);
            let facts = logger.finish(
                self.resolver
                    .resolve_facts(
                        params.role,
                        params.network_interface,
                        &params.cluster_size_key,
                    )
                    .await,
            )?;

            logger.start_step(BootstrapStep::WriteConsulConfig);
            let path = logger.finish(self.write_consul_config(&facts, params, &user).await)?;
            logger.log_detail(&path.display().to_string());
            (Some(path), Some(facts.self_name))
        };

        logger.start_step(BootstrapStep::WriteSupervisorConfig);
        logger.finish(self.write_supervisor_config(params, &user).await)?;
        logger.log_detail(&self.supervisor_config_path.display().to_string());

        logger.start_step(BootstrapStep::SignalSupervisor);
        logger.finish(self.signal_supervisor().await)?;

        Ok(BootstrapOutcome {
            consul_config,
            supervisor_config: self.supervisor_config_path.clone(),
            node_name,
        })
    }

    fn resolve_user(&self, params: &ParameterSet) -> anyhow::Result<RunAsUser> {
        let name = match &params.user {
            Some(name) => name.clone(),
            None => self.users.owner_of(&self.install_root)?,
        };
        self.users.lookup(&name)
    }

    async fn write_consul_config(
        &self,
        facts: &ClusterFormationFacts,
        params: &ParameterSet,
        user: &RunAsUser,
    ) -> anyhow::Result<PathBuf> {
        let config = ConsulNodeConfig::generate(facts, params)?;
        let path = ConsulNodeConfig::path_in(&params.directories.config_dir);

        write_file(&path, &config.to_json()?).await?;
        account::set_owner(&path, user)?;

        tracing::info!(path = %path.display(), owner = %user.name, "Wrote consul config");
        Ok(path)
    }

    async fn write_supervisor_config(
        &self,
        params: &ParameterSet,
        user: &RunAsUser,
    ) -> anyhow::Result<()> {
        let descriptor =
            SupervisedProcessDescriptor::generate(&params.directories, user, &params.environment)?;
        write_file(&self.supervisor_config_path, &descriptor.render()?).await?;

        tracing::info!(path = %self.supervisor_config_path.display(), "Wrote supervisor config");
        Ok(())
    }

    async fn signal_supervisor(&self) -> anyhow::Result<()> {
        self.supervisor.reread().await?;
        self.supervisor.update().await?;
        Ok(())
    }
}

/// Plain overwrite: no temp file, no rename, no backup
async fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        tracing::warn!(path = %path.display(), "Overwriting existing file");
    }
    fs::write(path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}
