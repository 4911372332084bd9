mod account;
mod bootstrap;
mod cli;
mod steps;
mod supervisorctl;

use anyhow::Context;
use bootstrap::Bootstrap;
use clap::Parser;
use clap::error::ErrorKind;
use cli::Cli;
use colored::Colorize;
use consul_bootstrap_core::{BootstrapDefaults, ParameterSet, SUPERVISOR_CONFIG_PATH};
use consul_bootstrap_gce::GceMetadataClient;
use steps::StepLogger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            // Usage errors exit 1, not clap's default of 2.
            let _ = e.print();
            std::process::exit(1);
        }
    };

    // Logs go to stderr; step progress goes to stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let exe = std::env::current_exe().context("failed to locate the running executable")?;
    let install_root = BootstrapDefaults::install_root_for_exe(&exe)
        .with_context(|| format!("cannot derive install root from {}", exe.display()))?;
    let defaults = BootstrapDefaults::new(&install_root);

    let params = match ParameterSet::build(&defaults, cli.into_overrides()) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!();
            eprintln!("Run {} for usage.", "run-consul --help".cyan());
            std::process::exit(1);
        }
    };
    tracing::debug!(
        role = %params.role,
        raft_protocol = params.raft_protocol,
        config_dir = %params.directories.config_dir.display(),
        skip_consul_config = params.skip_consul_config,
        "Effective parameters"
    );

    let bootstrap = Bootstrap::new(
        GceMetadataClient::from_env()?,
        supervisorctl::Supervisorctl::new(),
        account::SystemUsers,
        &install_root,
        SUPERVISOR_CONFIG_PATH,
    );

    println!(
        "{}",
        format!("🚀 Bootstrapping consul {} node", params.role)
            .blue()
            .bold()
    );
    println!();

    let mut logger = StepLogger::new();
    let result = bootstrap.run(&params, &mut logger).await;

    let summary_name = match &result {
        Ok(outcome) => outcome.node_name.clone().unwrap_or_else(|| params.role.to_string()),
        Err(_) => params.role.to_string(),
    };
    logger.print_summary(&summary_name);

    let outcome = result?;
    println!();
    match &outcome.consul_config {
        Some(path) => println!("Consul config:     {}", path.display()),
        None => println!(
            "Consul config:     {}",
            "left untouched (--skip-consul-config)".dimmed()
        ),
    }
    println!(
        "Supervisor config: {}",
        outcome.supervisor_config.display()
    );
    if logger.all_success() {
        println!();
        println!("{}", "✓ consul handed over to supervisord".green().bold());
    }
    Ok(())
}
