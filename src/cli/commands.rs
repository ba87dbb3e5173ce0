//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};

use crate::config::API_KEY_VAR;
use crate::validation::ValidationRequest;

/// Soong - launch and manage Lambda Cloud GPU instances.
#[derive(Parser, Debug)]
#[command(name = "soong")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Lambda Cloud API key.
    #[arg(long, global = true, env = API_KEY_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List GPU instance types with pricing and capacity.
    Types {
        /// Only show types with capacity somewhere.
        #[arg(short, long)]
        available: bool,

        /// Only show types with capacity in this region.
        #[arg(long)]
        region: Option<String>,
    },

    /// List known models with their VRAM requirements.
    Models,

    /// Check launch parameters without launching.
    Validate(TargetArgs),

    /// Validate, launch an instance and wait for it to become ready.
    Launch(LaunchArgs),

    /// Wait for an instance to become ready.
    Wait {
        /// Instance ID.
        instance_id: String,

        /// Seconds to wait before giving up.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show one instance, or the active instance if no ID is given.
    Status {
        /// Instance ID.
        instance_id: Option<String>,
    },

    /// Terminate an instance.
    Terminate {
        /// Instance ID.
        instance_id: String,

        /// Wait until the instance is gone.
        #[arg(long)]
        wait: bool,

        /// Seconds to wait for termination.
        #[arg(long, default_value_t = 300)]
        timeout: u64,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// What to launch and where.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Instance type name, e.g. `gpu_1x_a100`.
    #[arg(long)]
    pub gpu: String,

    /// Region to launch in.
    #[arg(long)]
    pub region: String,

    /// Persistent filesystem to attach.
    #[arg(long)]
    pub filesystem: Option<String>,

    /// SSH key name (repeatable).
    #[arg(long = "ssh-key")]
    pub ssh_keys: Vec<String>,

    /// Model to size the GPU for.
    #[arg(long)]
    pub model: Option<String>,
}

/// Launch options.
#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// Launch target.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Instance name.
    #[arg(long)]
    pub name: Option<String>,

    /// Seconds to wait for readiness.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Return right after launch without waiting.
    #[arg(long)]
    pub no_wait: bool,
}

impl TargetArgs {
    /// Builds the validation request for these arguments.
    #[must_use]
    pub fn to_request(&self) -> ValidationRequest {
        let mut request = ValidationRequest::new(&self.gpu, &self.region, self.ssh_keys.clone());
        if let Some(filesystem) = &self.filesystem {
            request = request.with_filesystem(filesystem);
        }
        if let Some(model) = &self.model {
            request = request.with_model(model);
        }
        request
    }
}

/// Output format for CLI.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_launch() {
        let cli = Cli::try_parse_from([
            "soong",
            "launch",
            "--gpu",
            "gpu_1x_a100",
            "--region",
            "us-east-1",
            "--ssh-key",
            "laptop",
            "--ssh-key",
            "desktop",
            "--filesystem",
            "data",
            "--no-wait",
        ])
        .expect("arguments should parse");

        let Commands::Launch(args) = cli.command else {
            panic!("expected launch command");
        };
        assert!(args.no_wait);

        let request = args.target.to_request();
        assert_eq!(request.ssh_key_names, ["laptop", "desktop"]);
        assert_eq!(request.filesystem_name.as_deref(), Some("data"));
        assert!(request.model_id.is_none());
    }

    #[test]
    fn test_validate_requires_gpu_and_region() {
        assert!(Cli::try_parse_from(["soong", "validate", "--gpu", "gpu_1x_a10"]).is_err());
        assert!(
            Cli::try_parse_from(["soong", "validate", "--gpu", "g", "--region", "r"]).is_ok()
        );
    }

    #[test]
    fn test_models_needs_no_arguments() {
        let cli = Cli::try_parse_from(["soong", "models", "--output", "json"])
            .expect("arguments should parse");
        assert!(matches!(cli.command, Commands::Models));
        assert!(matches!(cli.output, OutputFormat::Json));
    }

    #[test]
    fn test_terminate_defaults() {
        let cli = Cli::try_parse_from(["soong", "terminate", "i-1"]).expect("should parse");
        let Commands::Terminate { wait, timeout, .. } = cli.command else {
            panic!("expected terminate command");
        };
        assert!(!wait);
        assert_eq!(timeout, 300);
    }
}
