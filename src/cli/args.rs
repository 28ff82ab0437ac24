//! Command line argument parsing and validation.

use crate::error::{ReplicatorError, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "registry-replicator",
    version,
    about = "Declarative, multi-registry container image replicator",
    long_about = "Expands a YAML replication specification into copy tasks and drives them across registries with bounded concurrency, adaptive batching, and retries."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a replication specification.
    Run(RunArgs),

    /// Validate a replication specification without running it.
    Validate(ValidateArgs),
}

impl Args {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn try_parse() -> Result<Self> {
        <Self as Parser>::try_parse()
            .map_err(|e| ReplicatorError::ConfigInvalid(format!("failed to parse arguments: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Some(Commands::Run(args)) => args.validate(),
            Some(Commands::Validate(args)) => args.validate(),
            None => Err(ReplicatorError::ConfigInvalid(
                "no command provided; use --help for usage information".to_string(),
            )),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the replication specification (YAML).
    #[arg(short, long, value_name = "FILE")]
    pub spec: PathBuf,

    /// Print the planned tasks without executing any copies.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Enable verbose logging.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Suppress all but warnings and errors.
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub quiet: bool,
}

impl RunArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.spec.exists() {
            return Err(ReplicatorError::ConfigInvalid(format!(
                "specification file '{}' does not exist",
                self.spec.display()
            )));
        }
        if self.verbose && self.quiet {
            return Err(ReplicatorError::ConfigInvalid(
                "cannot specify both --verbose and --quiet".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the replication specification (YAML).
    #[arg(short, long, value_name = "FILE")]
    pub spec: PathBuf,
}

impl ValidateArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.spec.exists() {
            return Err(ReplicatorError::ConfigInvalid(format!(
                "specification file '{}' does not exist",
                self.spec.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_command_fails_validation() {
        let args = Args { command: None };
        assert!(args.validate().is_err());
    }

    #[test]
    fn run_rejects_missing_spec_file() {
        let args = RunArgs {
            spec: PathBuf::from("/nonexistent/spec.yaml"),
            dry_run: false,
            verbose: false,
            quiet: false,
        };
        assert!(args.validate().is_err());
    }

    #[test]
    fn run_rejects_verbose_and_quiet_together() {
        let tmp = std::env::temp_dir().join("registry-replicator-test-spec.yaml");
        std::fs::write(&tmp, "source: {}\n").unwrap();
        let args = RunArgs { spec: tmp.clone(), dry_run: false, verbose: true, quiet: true };
        assert!(args.validate().is_err());
        let _ = std::fs::remove_file(tmp);
    }
}
