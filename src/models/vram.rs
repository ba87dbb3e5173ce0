//! VRAM estimation for served models.

use std::fmt;

/// Common GPU memory sizes in GB, ascending.
const GPU_SIZES_GB: [u32; 6] = [16, 24, 40, 48, 80, 160];

/// Fraction of a GPU's memory a model may use.
const USABLE_FRACTION: f64 = 0.9;

/// Fixed overhead of the serving runtime in GB.
const RUNTIME_OVERHEAD_GB: f64 = 2.0;

/// Upper bound on the KV cache estimate in GB.
const MAX_KV_CACHE_GB: f64 = 4.0;

/// Weight quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantization {
    /// 32-bit floats.
    Fp32,
    /// 16-bit floats.
    Fp16,
    /// bfloat16.
    Bf16,
    /// 8-bit integers.
    Int8,
    /// 4-bit integers.
    Int4,
}

impl Quantization {
    /// Bytes used per parameter.
    #[must_use]
    pub const fn bytes_per_param(self) -> f64 {
        match self {
            Self::Fp32 => 4.0,
            Self::Fp16 | Self::Bf16 => 2.0,
            Self::Int8 => 1.0,
            Self::Int4 => 0.5,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fp32 => "fp32",
            Self::Fp16 => "fp16",
            Self::Bf16 => "bf16",
            Self::Int8 => "int8",
            Self::Int4 => "int4",
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estimates total VRAM in GB for serving a model.
///
/// Weights, plus KV cache (one GB per 2048 tokens of context, capped at
/// four), plus runtime overhead, plus ten percent for activations.
#[must_use]
pub fn estimate_vram_gb(params_billions: f64, quantization: Quantization, context_length: u32) -> f64 {
    let weights = params_billions * quantization.bytes_per_param();
    let kv_cache = (f64::from(context_length) / 2048.0).min(MAX_KV_CACHE_GB);
    let activations = weights * 0.1;
    weights + kv_cache + RUNTIME_OVERHEAD_GB + activations
}

/// Rounds an estimate up to the smallest GPU size it fits in with headroom.
///
/// Estimates beyond every size map to the largest one.
#[must_use]
pub fn round_to_gpu_size(estimated_gb: f64) -> u32 {
    GPU_SIZES_GB
        .iter()
        .copied()
        .find(|&size| estimated_gb <= f64::from(size) * USABLE_FRACTION)
        .unwrap_or(GPU_SIZES_GB[GPU_SIZES_GB.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_includes_overheads() {
        // 7B FP16 with 32k context: 14 + 4 + 2 + 1.4
        let estimate = estimate_vram_gb(7.0, Quantization::Fp16, 32768);
        assert!((estimate - 21.4).abs() < 1e-9);

        // Short context contributes proportionally.
        let estimate = estimate_vram_gb(7.0, Quantization::Int4, 2048);
        assert!((estimate - (3.5 + 1.0 + 2.0 + 0.35)).abs() < 1e-9);
    }

    #[test]
    fn test_round_to_gpu_size() {
        assert_eq!(round_to_gpu_size(10.0), 16);
        assert_eq!(round_to_gpu_size(21.4), 24);
        assert_eq!(round_to_gpu_size(44.5), 80);
        assert_eq!(round_to_gpu_size(500.0), 160);
    }

    #[test]
    fn test_quantization_sizes() {
        assert!((Quantization::Bf16.bytes_per_param() - 2.0).abs() < f64::EPSILON);
        assert_eq!(Quantization::Int4.to_string(), "int4");
    }
}
