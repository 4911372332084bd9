//! Step logger
//!
//! Prints each bootstrap step with a timestamp and duration, and a summary
//! at the end of the run.

use chrono::Local;
use colored::Colorize;
use std::time::{Duration, Instant};

/// Steps of one bootstrap run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    /// supervisorctl present
    CheckDependencies,
    /// Run-as user from the user database
    ResolveUser,
    /// Cluster formation facts from the metadata server
    ResolveMetadata,
    /// default.json
    WriteConsulConfig,
    /// supervisord program definition
    WriteSupervisorConfig,
    /// supervisorctl reread + update
    SignalSupervisor,
}

impl BootstrapStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckDependencies => "Check dependencies",
            Self::ResolveUser => "Resolve run-as user",
            Self::ResolveMetadata => "Resolve instance metadata",
            Self::WriteConsulConfig => "Write consul config",
            Self::WriteSupervisorConfig => "Write supervisor config",
            Self::SignalSupervisor => "Reload supervisor",
        }
    }
}

/// Outcome of a step
#[derive(Debug, Clone)]
pub enum StepResult {
    Success { duration: Duration },
    Skipped,
    Failed { error: String, duration: Duration },
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Success { duration } | Self::Failed { duration, .. } => Some(*duration),
            Self::Skipped => None,
        }
    }
}

pub struct StepLogger {
    start_time: Instant,
    step_results: Vec<(BootstrapStep, StepResult)>,
    current_step: Option<(BootstrapStep, Instant)>,
}

impl StepLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            step_results: Vec::new(),
            current_step: None,
        }
    }

    pub fn start_step(&mut self, step: BootstrapStep) {
        println!("[{}] {} {}", timestamp().dimmed(), "▶".cyan(), step.name());
        self.current_step = Some((step, Instant::now()));
    }

    pub fn step_success(&mut self) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();
            println!(
                "[{}] {} {} ({})",
                timestamp().dimmed(),
                "✓".green().bold(),
                step.name(),
                format_duration(duration).dimmed()
            );
            self.step_results
                .push((step, StepResult::Success { duration }));
        }
    }

    pub fn step_skipped(&mut self, reason: &str) {
        if let Some((step, _)) = self.current_step.take() {
            println!(
                "[{}] {} {} ({})",
                timestamp().dimmed(),
                "⏭".yellow(),
                step.name(),
                reason.dimmed()
            );
            self.step_results.push((step, StepResult::Skipped));
        }
    }

    pub fn step_failed(&mut self, error: &str) {
        if let Some((step, start)) = self.current_step.take() {
            let duration = start.elapsed();
            println!(
                "[{}] {} {}: {}",
                timestamp().dimmed(),
                "✗".red().bold(),
                step.name(),
                error.red()
            );
            self.step_results.push((
                step,
                StepResult::Failed {
                    error: error.to_string(),
                    duration,
                },
            ));
        }
    }

    /// Record the outcome of the current step from `result` and pass it on
    pub fn finish<T, E: std::fmt::Display>(
        &mut self,
        result: std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        match &result {
            Ok(_) => self.step_success(),
            Err(e) => self.step_failed(&e.to_string()),
        }
        result
    }

    /// First failed step and its error, if any
    pub fn failure(&self) -> Option<(BootstrapStep, &str)> {
        self.step_results
            .iter()
            .find_map(|(step, result)| match result {
                StepResult::Failed { error, .. } => Some((*step, error.as_str())),
                _ => None,
            })
    }

    pub fn log_detail(&self, message: &str) {
        println!("[{}]   → {}", timestamp().dimmed(), message.cyan());
    }

    pub fn print_summary(&self, node_name: &str) {
        let total_duration = self.start_time.elapsed();
        let slowest_step = self
            .step_results
            .iter()
            .filter_map(|(step, result)| result.duration().map(|d| (step, d)))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("Bootstrap Summary: {}", node_name.cyan().bold());
        println!("{}", "─".repeat(44));
        println!("Total time:    {}", format_duration(total_duration).green());
        if let Some((step, duration)) = slowest_step {
            println!(
                "Slowest step:  {} ({})",
                step.name(),
                format_duration(duration)
            );
        }
        match self.failure() {
            Some((step, error)) => {
                println!("Failed step:   {}", step.name().red().bold());
                println!("Error:         {}", error.red());
            }
            None => println!("Errors:        {}", "0".green()),
        }
        println!("{}", "═".repeat(44));
    }

    pub fn all_success(&self) -> bool {
        self.step_results
            .iter()
            .all(|(_, result)| result.is_success())
    }
}

impl Default for StepLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}
