//! GPU capability table and alternative ranking.

use crate::lambda::InstanceType;

use super::result::ValidationWarning;

/// Static facts about a GPU instance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuCapability {
    /// Instance type name as used by the API.
    pub name: &'static str,
    /// Total VRAM in GB across all GPUs of the instance.
    pub vram_gb: u32,
    /// Human-readable description.
    pub description: &'static str,
}

/// VRAM of the instance types we know about.
///
/// The API does not report VRAM, so anything absent here counts as 0 GB
/// whenever a minimum is enforced.
pub const KNOWN_GPUS: &[GpuCapability] = &[
    GpuCapability { name: "gpu_1x_a10", vram_gb: 24, description: "1x A10 (24 GB)" },
    GpuCapability { name: "gpu_1x_a100", vram_gb: 40, description: "1x A100 (40 GB PCIe)" },
    GpuCapability { name: "gpu_1x_a100_sxm4", vram_gb: 40, description: "1x A100 (40 GB SXM4)" },
    GpuCapability { name: "gpu_1x_a100_sxm4_80gb", vram_gb: 80, description: "1x A100 (80 GB SXM4)" },
    GpuCapability { name: "gpu_1x_a6000", vram_gb: 48, description: "1x RTX A6000 (48 GB)" },
    GpuCapability { name: "gpu_1x_rtx6000", vram_gb: 48, description: "1x RTX 6000 (48 GB)" },
    GpuCapability { name: "gpu_1x_h100_pcie", vram_gb: 80, description: "1x H100 (80 GB PCIe)" },
    GpuCapability { name: "gpu_1x_h100_sxm5", vram_gb: 80, description: "1x H100 (80 GB SXM5)" },
    GpuCapability { name: "gpu_1x_gh200", vram_gb: 96, description: "1x GH200 (96 GB)" },
    GpuCapability { name: "gpu_2x_a100", vram_gb: 80, description: "2x A100 (80 GB total)" },
    GpuCapability { name: "gpu_4x_a100", vram_gb: 160, description: "4x A100 (160 GB total)" },
    GpuCapability { name: "gpu_8x_a100", vram_gb: 320, description: "8x A100 (320 GB total)" },
    GpuCapability { name: "gpu_8x_h100", vram_gb: 640, description: "8x H100 (640 GB total)" },
];

/// Looks up the VRAM of an instance type.
#[must_use]
pub fn vram_gb(gpu_name: &str) -> Option<u32> {
    KNOWN_GPUS
        .iter()
        .find(|g| g.name == gpu_name)
        .map(|g| g.vram_gb)
}

/// An instance type that could stand in for the requested one.
#[derive(Debug, Clone)]
pub struct Alternative<'a> {
    /// The candidate.
    pub gpu: &'a InstanceType,
    /// VRAM from the capability table, if known.
    pub vram_gb: Option<u32>,
    /// Whether the candidate has capacity in the preferred region.
    pub in_preferred_region: bool,
    /// Region to show for the candidate.
    pub region: &'a str,
}

impl Alternative<'_> {
    /// One-line description, e.g. `gpu_1x_h100_pcie (80GB) @ $2.49/hr in us-east-3`.
    #[must_use]
    pub fn describe(&self) -> String {
        let vram = self
            .vram_gb
            .map_or_else(|| String::from("?GB"), |v| format!("{v}GB"));
        let others = self.gpu.regions_available.len().saturating_sub(1);
        let more = if others > 0 {
            format!(", +{others} more")
        } else {
            String::new()
        };
        format!(
            "{} ({vram}) @ {} in {}{more}",
            self.gpu.name,
            self.gpu.format_price(),
            self.region
        )
    }
}

/// Ranks instance types that could replace `requested`.
///
/// Candidates need capacity somewhere and enough VRAM for `min_vram_gb`.
/// Those available in `preferred_region` come first, then cheaper before
/// more expensive. The sort is stable, so catalog order breaks ties.
#[must_use]
pub fn rank_alternatives<'a>(
    catalog: &'a [InstanceType],
    requested: &str,
    min_vram_gb: f64,
    preferred_region: Option<&str>,
) -> Vec<Alternative<'a>> {
    let mut alternatives: Vec<Alternative<'a>> = catalog
        .iter()
        .filter(|t| t.name != requested && t.has_capacity())
        .filter_map(|gpu| {
            let vram = vram_gb(&gpu.name);
            if f64::from(vram.unwrap_or(0)) < min_vram_gb {
                return None;
            }

            let preferred = preferred_region
                .and_then(|r| gpu.regions_available.iter().find(|a| a.as_str() == r));
            let region = preferred
                .or_else(|| gpu.regions_available.first())
                .map_or("", String::as_str);

            Some(Alternative {
                gpu,
                vram_gb: vram,
                in_preferred_region: preferred.is_some(),
                region,
            })
        })
        .collect();

    alternatives.sort_by_key(|a| (!a.in_preferred_region, a.gpu.price_cents_per_hour));
    alternatives
}

/// Joins the first `limit` alternatives for display.
#[must_use]
pub fn format_alternatives(alternatives: &[Alternative<'_>], limit: usize) -> String {
    alternatives
        .iter()
        .take(limit)
        .map(Alternative::describe)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Joins up to `limit` names, noting how many were left out.
///
/// An empty list reads `none available`.
#[must_use]
pub fn format_name_list<S: AsRef<str>>(names: &[S], limit: usize) -> String {
    if names.is_empty() {
        return String::from("none available");
    }

    let shown = names
        .iter()
        .take(limit)
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");

    if names.len() > limit {
        format!("{shown}... ({} more)", names.len() - limit)
    } else {
        shown
    }
}

/// Checks that a GPU has enough VRAM for a model.
///
/// Returns a warning when the capability table knows the GPU and it is too
/// small. Unknown GPUs and a zero requirement pass silently.
#[must_use]
pub fn check_vram_fit(gpu_name: &str, min_vram_gb: f64) -> Option<ValidationWarning> {
    if min_vram_gb <= 0.0 {
        return None;
    }

    let vram = vram_gb(gpu_name)?;
    if f64::from(vram) >= min_vram_gb {
        return None;
    }

    let mut fitting: Vec<_> = KNOWN_GPUS
        .iter()
        .filter(|g| f64::from(g.vram_gb) >= min_vram_gb)
        .collect();
    fitting.sort_by_key(|g| g.vram_gb);

    let suggestion = fitting.first().map_or_else(
        || format!("No known GPU has {min_vram_gb}GB of VRAM"),
        |g| format!("Use a GPU with at least {min_vram_gb}GB, e.g. {}", g.name),
    );

    Some(ValidationWarning::new(
        format!("'{gpu_name}' has {vram}GB VRAM but the model needs {min_vram_gb}GB"),
        suggestion,
    ))
}
