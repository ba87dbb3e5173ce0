//! Pre-launch validation against live Lambda Cloud data.

use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::lambda::{FileSystem, InstanceType, LambdaApi};
use crate::models::{BuiltinModelRegistry, ModelRegistry};

use super::gpu::{format_alternatives, format_name_list, rank_alternatives};
use super::result::ValidationResult;

/// Most names listed in a suggestion before truncating.
const MAX_LISTED: usize = 5;

/// Most alternatives offered in a suggestion.
const MAX_ALTERNATIVES: usize = 3;

/// Where SSH keys are managed.
const SSH_KEYS_URL: &str = "https://cloud.lambda.ai/ssh-keys";

/// What the user is about to launch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRequest {
    /// Instance type name.
    pub gpu_type: String,
    /// Region to launch in.
    pub region: String,
    /// Persistent filesystem to attach.
    pub filesystem_name: Option<String>,
    /// SSH key names. Duplicates are allowed and ignored.
    pub ssh_key_names: Vec<String>,
    /// Model the instance will serve, if any.
    pub model_id: Option<String>,
}

impl ValidationRequest {
    /// Creates a request without filesystem or model.
    #[must_use]
    pub fn new(gpu_type: &str, region: &str, ssh_key_names: Vec<String>) -> Self {
        Self {
            gpu_type: gpu_type.to_string(),
            region: region.to_string(),
            filesystem_name: None,
            ssh_key_names,
            model_id: None,
        }
    }

    /// Attaches a filesystem.
    #[must_use]
    pub fn with_filesystem(mut self, name: &str) -> Self {
        self.filesystem_name = Some(name.to_string());
        self
    }

    /// Sets the model to size the GPU against.
    #[must_use]
    pub fn with_model(mut self, model_id: &str) -> Self {
        self.model_id = Some(model_id.to_string());
        self
    }

    /// SSH key names with duplicates removed, first occurrence kept.
    #[must_use]
    pub fn unique_ssh_keys(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.ssh_key_names.len());
        for key in &self.ssh_key_names {
            if !unique.contains(key) {
                unique.push(key.clone());
            }
        }
        unique
    }
}

enum FilesystemLookup {
    Found(FileSystem),
    Missing(Vec<String>),
}

/// Validates launch parameters before anything is provisioned.
///
/// Each category (GPU, filesystem, SSH keys) is checked independently and
/// every problem found is reported at once. Listings fetched from the API are
/// cached for the lifetime of the validator; failed fetches are not cached,
/// so a later pass retries them.
pub struct LaunchValidator<A> {
    api: A,
    registry: Box<dyn ModelRegistry>,
    instance_types: Option<Vec<InstanceType>>,
    file_systems: Option<Vec<FileSystem>>,
    ssh_keys: Option<Vec<String>>,
}

impl<A> std::fmt::Debug for LaunchValidator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchValidator")
            .field("instance_types_cached", &self.instance_types.is_some())
            .field("file_systems_cached", &self.file_systems.is_some())
            .field("ssh_keys_cached", &self.ssh_keys.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: LambdaApi> LaunchValidator<A> {
    /// Creates a validator using the built-in model registry.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            registry: Box::new(BuiltinModelRegistry::default()),
            instance_types: None,
            file_systems: None,
            ssh_keys: None,
        }
    }

    /// Replaces the model registry.
    #[must_use]
    pub fn with_registry(mut self, registry: impl ModelRegistry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    /// Minimum VRAM for a model, or 0 when no model is given or it is unknown.
    #[must_use]
    pub fn min_vram_gb(&self, model_id: Option<&str>) -> f64 {
        model_id
            .and_then(|id| self.registry.min_vram_gb(id))
            .filter(|gb| gb.is_finite() && *gb > 0.0)
            .unwrap_or(0.0)
    }

    /// Checks GPU type, filesystem and SSH keys.
    ///
    /// Never fails: API errors become warnings so the user can still decide
    /// to launch.
    pub async fn validate(&mut self, request: &ValidationRequest) -> ValidationResult {
        let mut result = ValidationResult::default();

        if request.ssh_key_names.is_empty() {
            result.error(
                "No SSH keys provided",
                "At least one SSH key is required for instance access",
            );
            return result;
        }

        let filesystem_name = match request.filesystem_name.as_deref().map(str::trim) {
            Some("") => {
                result.error(
                    "Filesystem name cannot be empty",
                    "Provide a valid filesystem name or omit the parameter",
                );
                None
            }
            other => other,
        };

        let min_vram_gb = self.min_vram_gb(request.model_id.as_deref());

        let filesystem = match filesystem_name {
            Some(name) => Some(self.lookup_filesystem(name).await),
            None => None,
        };
        let filesystem_region = match (&filesystem, filesystem_name) {
            (Some(Ok(FilesystemLookup::Found(fs))), Some(name)) => Some((name, fs.region.as_str())),
            _ => None,
        };

        self.check_gpu(request, filesystem_region, min_vram_gb, &mut result)
            .await;

        if let (Some(name), Some(lookup)) = (filesystem_name, filesystem) {
            Self::check_filesystem(name, &request.region, lookup, &mut result);
        }

        self.check_ssh_keys(&request.unique_ssh_keys(), &mut result)
            .await;

        debug!(
            "Validated {} in {}: {} error(s), {} warning(s)",
            request.gpu_type,
            request.region,
            result.error_count(),
            result.warning_count()
        );
        result
    }

    async fn instance_types(&mut self) -> ProviderResult<Vec<InstanceType>> {
        if let Some(cached) = &self.instance_types {
            return Ok(cached.clone());
        }
        let fetched = self.api.list_instance_types().await?;
        self.instance_types = Some(fetched.clone());
        Ok(fetched)
    }

    async fn file_systems(&mut self) -> ProviderResult<Vec<FileSystem>> {
        if let Some(cached) = &self.file_systems {
            return Ok(cached.clone());
        }
        let fetched = self.api.list_file_systems().await?;
        self.file_systems = Some(fetched.clone());
        Ok(fetched)
    }

    async fn ssh_keys(&mut self) -> ProviderResult<Vec<String>> {
        if let Some(cached) = &self.ssh_keys {
            return Ok(cached.clone());
        }
        let fetched = self.api.list_ssh_key_names().await?;
        self.ssh_keys = Some(fetched.clone());
        Ok(fetched)
    }

    async fn lookup_filesystem(&mut self, name: &str) -> ProviderResult<FilesystemLookup> {
        let file_systems = self.file_systems().await?;
        if let Some(fs) = file_systems.iter().find(|f| f.name == name) {
            return Ok(FilesystemLookup::Found(fs.clone()));
        }
        Ok(FilesystemLookup::Missing(
            file_systems.into_iter().map(|f| f.name).collect(),
        ))
    }

    /// `filesystem` is the attached filesystem's `(name, region)` when known.
    async fn check_gpu(
        &mut self,
        request: &ValidationRequest,
        filesystem: Option<(&str, &str)>,
        min_vram_gb: f64,
        result: &mut ValidationResult,
    ) {
        let catalog = match self.instance_types().await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Could not fetch instance types: {e}");
                result.warn(
                    "Could not validate GPU type (API error)",
                    "Launch may fail if GPU type is invalid",
                );
                return;
            }
        };

        let Some(gpu) = catalog.iter().find(|t| t.name == request.gpu_type) else {
            let names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
            result.error(
                format!("GPU type '{}' not found", request.gpu_type),
                format!("Available: {}", format_name_list(&names, MAX_LISTED)),
            );
            return;
        };

        if gpu.is_available_in(&request.region) {
            return;
        }

        if !gpu.has_capacity() {
            let preferred = filesystem.map_or(request.region.as_str(), |(_, region)| region);
            let alternatives = rank_alternatives(&catalog, &gpu.name, min_vram_gb, Some(preferred));
            let suggestion = if alternatives.is_empty() {
                String::from("Try again later or choose a different GPU type")
            } else {
                format!(
                    "Try again later or choose a different GPU type. Alternatives: {}",
                    format_alternatives(&alternatives, MAX_ALTERNATIVES)
                )
            };
            result.warn(
                format!("No current capacity for '{}' in any region", gpu.name),
                suggestion,
            );
            return;
        }

        match filesystem {
            Some((fs_name, fs_region)) if gpu.is_available_in(fs_region) => {
                result.error(
                    format!("No capacity for '{}' in '{}'", gpu.name, request.region),
                    format!("Use --region {fs_region} (matches your filesystem '{fs_name}')"),
                );
            }
            Some((fs_name, fs_region)) => {
                let alternatives: Vec<_> =
                    rank_alternatives(&catalog, &gpu.name, min_vram_gb, Some(fs_region))
                        .into_iter()
                        .filter(|a| a.in_preferred_region)
                        .collect();

                if alternatives.is_empty() {
                    result.error(
                        format!(
                            "'{}' is not available in '{fs_region}' where filesystem '{fs_name}' lives",
                            gpu.name
                        ),
                        format!(
                            "No suitable GPU has capacity in {fs_region} right now. '{}' is available in: {}",
                            gpu.name,
                            format_name_list(&gpu.regions_available, MAX_LISTED)
                        ),
                    );
                } else {
                    result.error(
                        format!(
                            "No capacity for '{}' in '{fs_region}' where filesystem '{fs_name}' lives",
                            gpu.name
                        ),
                        format!(
                            "Alternatives in {fs_region}: {}",
                            format_alternatives(&alternatives, MAX_ALTERNATIVES)
                        ),
                    );
                }
            }
            None => {
                result.warn(
                    format!("No capacity for '{}' in '{}'", gpu.name, request.region),
                    format!(
                        "Available in: {}",
                        format_name_list(&gpu.regions_available, MAX_LISTED)
                    ),
                );
            }
        }
    }

    fn check_filesystem(
        name: &str,
        region: &str,
        lookup: ProviderResult<FilesystemLookup>,
        result: &mut ValidationResult,
    ) {
        match lookup {
            Ok(FilesystemLookup::Found(fs)) if fs.region != region => {
                result.error(
                    format!("Filesystem '{name}' is in '{}', not '{region}'", fs.region),
                    format!("Use --region {} or create filesystem in {region}", fs.region),
                );
            }
            Ok(FilesystemLookup::Found(_)) => {}
            Ok(FilesystemLookup::Missing(available)) => {
                let listed = if available.is_empty() {
                    String::from("none")
                } else {
                    available.join(", ")
                };
                result.error(
                    format!("Filesystem '{name}' not found"),
                    format!("Available filesystems: {listed}"),
                );
            }
            Err(e) => {
                warn!("Could not fetch filesystems: {e}");
                result.warn(
                    "Could not validate filesystem (API error)",
                    format!("Launch may fail if '{name}' doesn't exist in '{region}'"),
                );
            }
        }
    }

    async fn check_ssh_keys(&mut self, keys: &[String], result: &mut ValidationResult) {
        let registered = match self.ssh_keys().await {
            Ok(registered) => registered,
            Err(e) => {
                warn!("Could not fetch SSH keys: {e}");
                result.warn(
                    "Could not validate SSH keys (API error)",
                    "Launch may fail if SSH keys are invalid",
                );
                return;
            }
        };

        for key in keys.iter().filter(|k| !registered.contains(*k)) {
            result.error(
                format!("SSH key '{key}' not found"),
                format!("Add at: {SSH_KEYS_URL}"),
            );
        }
    }
}
