//! The provider operations the validator and the poller depend on.

use async_trait::async_trait;

use crate::error::ProviderResult;

use super::types::{FileSystem, Instance, InstanceType, LaunchRequest};

/// Lambda Cloud operations.
///
/// [`LambdaClient`](super::LambdaClient) is the production implementation.
/// Every method except [`LambdaApi::get_instance_once`] goes through the
/// client's retry policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LambdaApi: Send + Sync {
    /// Lists all instances on the account.
    async fn list_instances(&self) -> ProviderResult<Vec<Instance>>;

    /// Finds one instance by ID (list-then-find). `None` if it does not exist.
    async fn get_instance(&self, instance_id: &str) -> ProviderResult<Option<Instance>>;

    /// Like [`LambdaApi::get_instance`] but with a single attempt and no retry.
    async fn get_instance_once(&self, instance_id: &str) -> ProviderResult<Option<Instance>>;

    /// Launches an instance and returns its ID.
    async fn launch_instance(&self, request: &LaunchRequest) -> ProviderResult<String>;

    /// Terminates an instance.
    async fn terminate_instance(&self, instance_id: &str) -> ProviderResult<()>;

    /// Lists the names of registered SSH keys.
    async fn list_ssh_key_names(&self) -> ProviderResult<Vec<String>>;

    /// Lists instance types with pricing and current capacity.
    async fn list_instance_types(&self) -> ProviderResult<Vec<InstanceType>>;

    /// Lists persistent filesystems.
    async fn list_file_systems(&self) -> ProviderResult<Vec<FileSystem>>;
}
