//! Model registry: minimum VRAM per model.
//!
//! The validator only needs a lookup `model id -> minimum VRAM`. The
//! [`ModelRegistry`] trait is that seam; [`BuiltinModelRegistry`] is the
//! bundled table of known models.

use std::collections::HashMap;

use crate::validation::gpu::KNOWN_GPUS;

use super::vram::{Quantization, estimate_vram_gb, round_to_gpu_size};

/// Lookup of a model's minimum VRAM requirement.
pub trait ModelRegistry: Send + Sync {
    /// Minimum VRAM in GB for the model, or `None` if unknown.
    fn min_vram_gb(&self, model_id: &str) -> Option<f64>;
}

impl ModelRegistry for HashMap<String, f64> {
    fn min_vram_gb(&self, model_id: &str) -> Option<f64> {
        self.get(model_id).copied()
    }
}

/// A known model and the parameters that drive its VRAM estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    /// Identifier used on the command line.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// `HuggingFace` repository.
    pub hf_path: &'static str,
    /// Parameter count in billions.
    pub params_billions: f64,
    /// Quantization served by default.
    pub quantization: Quantization,
    /// Default context length in tokens.
    pub context_length: u32,
    /// Short description.
    pub description: &'static str,
}

impl ModelSpec {
    /// VRAM for the weights alone.
    #[must_use]
    pub fn base_vram_gb(&self) -> f64 {
        self.params_billions * self.quantization.bytes_per_param()
    }

    /// Estimated total VRAM including cache and overhead.
    #[must_use]
    pub fn estimated_vram_gb(&self) -> f64 {
        estimate_vram_gb(self.params_billions, self.quantization, self.context_length)
    }

    /// Smallest common GPU size that fits the estimate with headroom.
    #[must_use]
    pub fn min_vram_gb(&self) -> u32 {
        round_to_gpu_size(self.estimated_vram_gb())
    }
}

const BUILTIN_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "deepseek-r1-70b",
        name: "DeepSeek-R1 70B",
        hf_path: "deepseek-ai/DeepSeek-R1-Distill-Llama-70B",
        params_billions: 70.0,
        quantization: Quantization::Int4,
        context_length: 8192,
        description: "Best reasoning model for complex coding tasks",
    },
    ModelSpec {
        id: "qwen2.5-coder-32b",
        name: "Qwen2.5-Coder 32B",
        hf_path: "Qwen/Qwen2.5-Coder-32B-Instruct",
        params_billions: 32.0,
        quantization: Quantization::Fp16,
        context_length: 32768,
        description: "Fast coding specialist with long context",
    },
    ModelSpec {
        id: "qwen2.5-coder-32b-int4",
        name: "Qwen2.5-Coder 32B (Quantized)",
        hf_path: "Qwen/Qwen2.5-Coder-32B-Instruct-AWQ",
        params_billions: 32.0,
        quantization: Quantization::Int4,
        context_length: 32768,
        description: "Budget-friendly coding model",
    },
    ModelSpec {
        id: "llama-3.1-70b",
        name: "Llama 3.1 70B",
        hf_path: "meta-llama/Llama-3.1-70B-Instruct",
        params_billions: 70.0,
        quantization: Quantization::Int4,
        context_length: 8192,
        description: "General-purpose powerhouse",
    },
    ModelSpec {
        id: "llama-3.1-8b",
        name: "Llama 3.1 8B",
        hf_path: "meta-llama/Llama-3.1-8B-Instruct",
        params_billions: 8.0,
        quantization: Quantization::Fp16,
        context_length: 8192,
        description: "Fast and cheap for simple tasks",
    },
    ModelSpec {
        id: "codellama-34b",
        name: "Code Llama 34B",
        hf_path: "codellama/CodeLlama-34b-Instruct-hf",
        params_billions: 34.0,
        quantization: Quantization::Fp16,
        context_length: 16384,
        description: "Meta's dedicated coding model",
    },
    ModelSpec {
        id: "mistral-7b",
        name: "Mistral 7B",
        hf_path: "mistralai/Mistral-7B-Instruct-v0.3",
        params_billions: 7.0,
        quantization: Quantization::Fp16,
        context_length: 32768,
        description: "Efficient with sliding window attention",
    },
];

/// Registry backed by the bundled model table.
#[derive(Debug, Clone)]
pub struct BuiltinModelRegistry {
    models: Vec<ModelSpec>,
}

impl Default for BuiltinModelRegistry {
    fn default() -> Self {
        Self {
            models: BUILTIN_MODELS.to_vec(),
        }
    }
}

impl BuiltinModelRegistry {
    /// Creates a registry with the bundled models.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a model.
    pub fn register(&mut self, spec: ModelSpec) {
        self.models.retain(|m| m.id != spec.id);
        self.models.push(spec);
    }

    /// Looks up a model by ID.
    #[must_use]
    pub fn get(&self, model_id: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// All known models.
    pub fn models(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }

    /// Smallest GPU in the capability table that fits the model.
    #[must_use]
    pub fn recommended_gpu(&self, model_id: &str) -> Option<&'static str> {
        let min_vram = self.get(model_id)?.min_vram_gb();

        let mut gpus: Vec<_> = KNOWN_GPUS.iter().collect();
        gpus.sort_by_key(|g| g.vram_gb);
        gpus.into_iter()
            .find(|g| g.vram_gb >= min_vram)
            .map(|g| g.name)
    }
}

impl ModelRegistry for BuiltinModelRegistry {
    fn min_vram_gb(&self, model_id: &str) -> Option<f64> {
        self.get(model_id).map(|m| f64::from(m.min_vram_gb()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::gpu::vram_gb;

    #[test]
    fn test_min_vram_of_known_models() {
        let registry = BuiltinModelRegistry::new();
        assert_eq!(registry.min_vram_gb("deepseek-r1-70b"), Some(80.0));
        assert_eq!(registry.min_vram_gb("llama-3.1-8b"), Some(40.0));
        assert_eq!(registry.min_vram_gb("mistral-7b"), Some(24.0));
        assert_eq!(registry.min_vram_gb("qwen2.5-coder-32b"), Some(160.0));
        assert_eq!(registry.min_vram_gb("no-such-model"), None);
    }

    #[test]
    fn test_recommended_gpu_is_smallest_fit() {
        let registry = BuiltinModelRegistry::new();

        let gpu = registry
            .recommended_gpu("deepseek-r1-70b")
            .expect("70B model should have a recommendation");
        assert_eq!(vram_gb(gpu), Some(80));

        let gpu = registry
            .recommended_gpu("llama-3.1-8b")
            .expect("8B model should have a recommendation");
        assert_eq!(vram_gb(gpu), Some(40));

        assert!(registry.recommended_gpu("unknown").is_none());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = BuiltinModelRegistry::new();
        let count = registry.models().count();

        registry.register(ModelSpec {
            id: "mistral-7b",
            name: "Mistral 7B (INT4)",
            hf_path: "mistralai/Mistral-7B-Instruct-v0.3",
            params_billions: 7.0,
            quantization: Quantization::Int4,
            context_length: 8192,
            description: "Quantized",
        });

        assert_eq!(registry.models().count(), count);
        assert_eq!(registry.min_vram_gb("mistral-7b"), Some(16.0));
    }

    #[test]
    fn test_hashmap_registry() {
        let mut registry = HashMap::new();
        registry.insert(String::from("custom"), 48.0);
        assert_eq!(registry.min_vram_gb("custom"), Some(48.0));
        assert_eq!(registry.min_vram_gb("other"), None);
    }
}
