//! Instance status polling.
//!
//! After launch an instance goes through `booting` before it is `active`
//! with a public IP. [`InstancePoller`] watches that transition with a fixed
//! interval, tolerating transient API errors while a wait is in progress.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::lambda::{Instance, InstanceStatus, LambdaApi, Readiness};

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Interval between polls while waiting for termination.
const TERMINATE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polls instance status until a target state or a deadline.
#[derive(Debug, Clone)]
pub struct InstancePoller<A> {
    api: A,
    poll_interval: Duration,
}

impl<A: LambdaApi> InstancePoller<A> {
    /// Creates a poller with the default interval.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the interval between polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The interval between polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Waits until the instance is active with an IP.
    ///
    /// Polls immediately, then once per interval. Returns `None` as soon as
    /// the instance disappears or reaches `terminated`/`unhealthy`, and once
    /// `timeout` has elapsed. API errors are logged and the wait goes on.
    ///
    /// The last interval can be shorter than [`poll_interval`](Self::poll_interval):
    /// it is cut to the time left so that a final poll lands on the deadline.
    pub async fn wait_for_ready(&self, instance_id: &str, timeout: Duration) -> Option<Instance> {
        let start = Instant::now();
        let mut last_status: Option<InstanceStatus> = None;

        info!("Waiting for instance {instance_id} to become ready (timeout {timeout:?})");

        loop {
            match self.api.get_instance(instance_id).await {
                Ok(None) => {
                    warn!("Instance {instance_id} not found");
                    return None;
                }
                Ok(Some(instance)) => {
                    if last_status.as_ref() != Some(&instance.status) {
                        info!("Instance {instance_id} is {}", instance.status);
                        last_status = Some(instance.status.clone());
                    }

                    match instance.readiness() {
                        Readiness::Ready => {
                            info!(
                                "Instance {instance_id} ready at {}",
                                instance.ip.as_deref().unwrap_or_default()
                            );
                            return Some(instance);
                        }
                        Readiness::Failed => {
                            warn!("Instance {instance_id} failed with status {}", instance.status);
                            return None;
                        }
                        Readiness::Transitional => {}
                    }
                }
                Err(e) => warn!("Error polling instance {instance_id}: {e}"),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!("Timed out after {elapsed:?} waiting for instance {instance_id}");
                return None;
            }

            tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Returns the first instance on the account whose status is `active`.
    ///
    /// Errors are logged and reported as `None`.
    pub async fn get_active_instance(&self) -> Option<Instance> {
        match self.api.list_instances().await {
            Ok(instances) => instances
                .into_iter()
                .find(|i| i.status == InstanceStatus::Active),
            Err(e) => {
                error!("Failed to list instances: {e}");
                None
            }
        }
    }

    /// Fetches an instance once, without retry. Errors become `None`.
    pub async fn poll_status(&self, instance_id: &str) -> Option<Instance> {
        match self.api.get_instance_once(instance_id).await {
            Ok(instance) => instance,
            Err(e) => {
                debug!("Status poll for {instance_id} failed: {e}");
                None
            }
        }
    }

    /// Waits until the instance is gone or `terminated`.
    ///
    /// An API error is taken to mean the instance no longer exists. Returns
    /// `false` only when `timeout` elapses first.
    pub async fn wait_for_terminated(&self, instance_id: &str, timeout: Duration) -> bool {
        let start = Instant::now();

        loop {
            match self.api.get_instance(instance_id).await {
                Ok(None) => return true,
                Ok(Some(instance)) if instance.status == InstanceStatus::Terminated => {
                    info!("Instance {instance_id} terminated");
                    return true;
                }
                Ok(Some(instance)) => {
                    debug!("Instance {instance_id} is {}", instance.status);
                }
                Err(e) => {
                    warn!("Error polling instance {instance_id}, assuming terminated: {e}");
                    return true;
                }
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!("Timed out waiting for instance {instance_id} to terminate");
                return false;
            }

            tokio::time::sleep(TERMINATE_POLL_INTERVAL.min(timeout - elapsed)).await;
        }
    }
}
