//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use chrono::{DateTime, Utc};
use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::lambda::{Instance, InstanceStatus, InstanceType, LeaseState};
use crate::models::BuiltinModelRegistry;
use crate::validation::ValidationResult;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Instance type row for table display.
#[derive(Tabled)]
struct InstanceTypeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "vCPU")]
    vcpus: u32,
    #[tabled(rename = "RAM")]
    memory: String,
    #[tabled(rename = "Regions")]
    regions: String,
}

/// Model row for table display.
#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Quant")]
    quantization: String,
    #[tabled(rename = "Weights")]
    weights: String,
    #[tabled(rename = "Min VRAM")]
    min_vram: String,
    #[tabled(rename = "GPU")]
    gpu: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the instance type catalog.
    #[must_use]
    pub fn format_instance_types(&self, types: &[InstanceType]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(types).unwrap_or_default(),
            OutputFormat::Text => {
                if types.is_empty() {
                    return String::from("No matching instance types.\n");
                }

                let rows: Vec<InstanceTypeRow> = types
                    .iter()
                    .map(|t| InstanceTypeRow {
                        name: t.name.clone(),
                        description: Self::truncate(&t.description, 32),
                        price: t.format_price(),
                        vcpus: t.vcpus,
                        memory: format!("{} GiB", t.memory_gib),
                        regions: if t.has_capacity() {
                            t.regions_available.join(", ")
                        } else {
                            "no capacity".dimmed().to_string()
                        },
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats the known models with their VRAM requirements.
    #[must_use]
    pub fn format_models(&self, registry: &BuiltinModelRegistry) -> String {
        match self.format {
            OutputFormat::Json => {
                let models: Vec<_> = registry
                    .models()
                    .map(|m| {
                        serde_json::json!({
                            "id": m.id,
                            "name": m.name,
                            "hf_path": m.hf_path,
                            "params_billions": m.params_billions,
                            "quantization": m.quantization.as_str(),
                            "context_length": m.context_length,
                            "weights_vram_gb": m.base_vram_gb(),
                            "estimated_vram_gb": m.estimated_vram_gb(),
                            "min_vram_gb": m.min_vram_gb(),
                            "recommended_gpu": registry.recommended_gpu(m.id),
                            "description": m.description,
                        })
                    })
                    .collect();
                serde_json::to_string_pretty(&models).unwrap_or_default()
            }
            OutputFormat::Text => {
                let rows: Vec<ModelRow> = registry
                    .models()
                    .map(|m| ModelRow {
                        id: m.id.to_string(),
                        name: m.name.to_string(),
                        quantization: m.quantization.to_string(),
                        weights: format!("{:.1} GB", m.base_vram_gb()),
                        min_vram: format!("{} GB", m.min_vram_gb()),
                        gpu: registry
                            .recommended_gpu(m.id)
                            .unwrap_or("-")
                            .to_string(),
                        description: Self::truncate(m.description, 40),
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats the outcome of a validation pass.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();

                for error in &result.errors {
                    let _ = writeln!(output, "{} {}", "✗".red(), error.message);
                    let _ = writeln!(output, "    {}", error.suggestion.dimmed());
                }
                for warning in &result.warnings {
                    let _ = writeln!(output, "{} {}", "⚠".yellow(), warning.message);
                    let _ = writeln!(output, "    {}", warning.suggestion.dimmed());
                }

                if result.can_launch() {
                    let _ = writeln!(output, "{} Ready to launch", "✓".green());
                } else {
                    let _ = writeln!(
                        output,
                        "\n{} error(s), {} warning(s)",
                        result.error_count().to_string().red(),
                        result.warning_count().to_string().yellow()
                    );
                }

                output
            }
        }
    }

    /// Formats one instance.
    #[must_use]
    pub fn format_instance(&self, instance: &Instance, now: DateTime<Utc>) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(instance).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();

                let _ = writeln!(output, "\nInstance: {}", instance.display_name());
                let _ = writeln!(output, "   ID: {}", instance.id);
                let _ = writeln!(output, "   Status: {}", Self::format_status(&instance.status));
                let _ = writeln!(output, "   Type: {}", instance.instance_type);
                let _ = writeln!(output, "   Region: {}", instance.region);
                let _ = writeln!(output, "   IP: {}", instance.ip.as_deref().unwrap_or("-"));

                if let Some(created) = instance.created_at() {
                    let _ = writeln!(output, "   Created: {}", created.format("%Y-%m-%d %H:%M UTC"));
                }
                if let Some(expires) = instance.lease_expires_at() {
                    let lease = match instance.lease_state(now) {
                        LeaseState::Expired => "expired".red().to_string(),
                        LeaseState::ExpiringSoon => "expiring soon".yellow().to_string(),
                        LeaseState::Healthy | LeaseState::Unknown => String::new(),
                    };
                    let _ = writeln!(
                        output,
                        "   Lease expires: {} {lease}",
                        expires.format("%Y-%m-%d %H:%M UTC")
                    );
                }

                output
            }
        }
    }

    /// Formats a one-line message with a status marker.
    #[must_use]
    pub fn format_message(&self, level: MessageLevel, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": level.as_str(), "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let marker = match level {
                    MessageLevel::Success => "✓".green(),
                    MessageLevel::Warning => "⚠".yellow(),
                    MessageLevel::Error => "✗".red(),
                };
                format!("{marker} {message}")
            }
        }
    }

    /// Formats an instance status with color.
    fn format_status(status: &InstanceStatus) -> String {
        match status {
            InstanceStatus::Active => "active".green().to_string(),
            InstanceStatus::Booting | InstanceStatus::Pending => {
                status.as_str().yellow().to_string()
            }
            InstanceStatus::Terminating | InstanceStatus::Terminated | InstanceStatus::Unhealthy => {
                status.as_str().red().to_string()
            }
            InstanceStatus::Other(other) => other.dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

/// Severity of a one-line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Operation succeeded.
    Success,
    /// Something needs attention.
    Warning,
    /// Operation failed.
    Error,
}

impl MessageLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a10() -> InstanceType {
        InstanceType {
            name: String::from("gpu_1x_a10"),
            description: String::from("1x A10 (24 GB PCIe)"),
            price_cents_per_hour: 75,
            vcpus: 30,
            memory_gib: 200,
            storage_gib: 1400,
            regions_available: vec![String::from("us-east-1")],
        }
    }

    #[test]
    fn test_instance_types_table() {
        let output = OutputFormatter::new(OutputFormat::Text).format_instance_types(&[a10()]);
        assert!(output.contains("gpu_1x_a10"));
        assert!(output.contains("$0.75/hr"));
        assert!(output.contains("us-east-1"));
    }

    #[test]
    fn test_validation_json() {
        let mut result = ValidationResult::default();
        result.error("SSH key 'x' not found", "Add at: https://cloud.lambda.ai/ssh-keys");

        let output = OutputFormatter::new(OutputFormat::Json).format_validation(&result);
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
        assert_eq!(value["errors"][0]["message"], "SSH key 'x' not found");
        assert!(value["warnings"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn test_validation_text_lists_suggestions() {
        let mut result = ValidationResult::default();
        result.warn("No capacity for 'gpu_1x_a10' in 'us-west-1'", "Available in: us-east-1");

        let output = OutputFormatter::new(OutputFormat::Text).format_validation(&result);
        assert!(output.contains("No capacity for 'gpu_1x_a10'"));
        assert!(output.contains("Available in: us-east-1"));
        assert!(output.contains("Ready to launch"));
    }

    #[test]
    fn test_instance_status_json() {
        let instance = Instance {
            id: String::from("i-1"),
            name: None,
            ip: Some(String::from("1.2.3.4")),
            status: InstanceStatus::Active,
            instance_type: String::from("gpu_1x_a10"),
            region: String::from("us-east-1"),
            created_at: None,
            lease_expires_at: None,
        };

        let output =
            OutputFormatter::new(OutputFormat::Json).format_instance(&instance, Utc::now());
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
        assert_eq!(value["status"], "active");
        assert_eq!(value["ip"], "1.2.3.4");
    }

    #[test]
    fn test_models_table_shows_requirements() {
        let registry = BuiltinModelRegistry::new();
        let output = OutputFormatter::new(OutputFormat::Text).format_models(&registry);
        assert!(output.contains("deepseek-r1-70b"));
        assert!(output.contains("DeepSeek-R1 70B"));
        assert!(output.contains("35.0 GB"));
        assert!(output.contains("80 GB"));
    }

    #[test]
    fn test_models_json_includes_source() {
        let registry = BuiltinModelRegistry::new();
        let output = OutputFormatter::new(OutputFormat::Json).format_models(&registry);
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");

        let llama = value
            .as_array()
            .and_then(|models| models.iter().find(|m| m["id"] == "llama-3.1-8b"))
            .expect("llama-3.1-8b listed");
        assert_eq!(llama["hf_path"], "meta-llama/Llama-3.1-8B-Instruct");
        assert_eq!(llama["min_vram_gb"], 40);
        assert_eq!(llama["weights_vram_gb"], 16.0);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("ééééééééééé", 6), "ééé...");
    }
}
