//! CLI module for the Soong GPU launcher.
//!
//! This module provides the command-line interface for launching and
//! managing Lambda Cloud instances.

mod commands;
mod output;

pub use commands::{Cli, Commands, LaunchArgs, OutputFormat, TargetArgs};
pub use output::{MessageLevel, OutputFormatter};
