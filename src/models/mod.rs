//! Model VRAM requirements.
//!
//! The validator resolves an optional model ID to a minimum VRAM figure
//! through [`ModelRegistry`]. [`BuiltinModelRegistry`] ships a small table of
//! popular models whose requirements are estimated from parameter count,
//! quantization and context length.

mod registry;
mod vram;

pub use registry::{BuiltinModelRegistry, ModelRegistry, ModelSpec};
pub use vram::{Quantization, estimate_vram_gb, round_to_gpu_size};
