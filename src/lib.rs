// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Soong
//!
//! Reliable acquisition of short-lived GPU instances on Lambda Cloud.
//!
//! ## Overview
//!
//! Getting a GPU instance is a gamble on capacity. Soong makes it less of
//! one:
//!
//! - Every API call is retried with exponential backoff
//! - Launch parameters are checked against live capacity, filesystems and
//!   SSH keys before anything is provisioned, with concrete alternatives
//!   when the request cannot be satisfied
//! - Newly launched instances are polled until they are reachable
//!
//! ## Modules
//!
//! - [`lambda`]: Lambda Cloud API client and data types
//! - [`validation`]: Pre-launch validation and GPU alternatives
//! - [`lifecycle`]: Readiness and termination polling
//! - [`models`]: Model VRAM requirements
//! - [`config`]: Environment-driven settings
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use soong::lambda::LambdaClient;
//! use soong::lifecycle::InstancePoller;
//! use soong::validation::{LaunchValidator, ValidationRequest};
//!
//! # async fn example() -> soong::Result<()> {
//! let client = LambdaClient::new("secret")?;
//!
//! let request = ValidationRequest::new("gpu_1x_a100", "us-east-1", vec!["laptop".into()]);
//! let result = LaunchValidator::new(client.clone()).validate(&request).await;
//! if !result.can_launch() {
//!     return Ok(());
//! }
//!
//! let poller = InstancePoller::new(client);
//! let ready = poller.wait_for_ready("instance-id", Duration::from_secs(600)).await;
//! # let _ = ready;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod lambda;
pub mod lifecycle;
pub mod models;
pub mod validation;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::Settings;
pub use error::{ConfigError, ProviderError, Result, SoongError};
pub use lambda::{Instance, InstanceStatus, InstanceType, LambdaApi, LambdaClient};
pub use lifecycle::InstancePoller;
pub use models::{BuiltinModelRegistry, ModelRegistry};
pub use validation::{LaunchValidator, ValidationRequest, ValidationResult};
