//! Pre-launch validation.
//!
//! [`LaunchValidator`] checks a launch request against live account data
//! (instance types, filesystems, SSH keys) and reports every problem at once
//! as a [`ValidationResult`]. Errors block launch; warnings do not.
//!
//! The [`gpu`] submodule holds the static VRAM table and the ranking used to
//! suggest alternative instance types.

pub mod gpu;
mod result;
mod validator;

pub use gpu::check_vram_fit;
pub use result::{ValidationError, ValidationResult, ValidationWarning};
pub use validator::{LaunchValidator, ValidationRequest};
