//! Lambda Cloud API integration module.
//!
//! This module provides the resilient API client and the data model shared
//! by the launch validator and the lifecycle poller.

mod api;
mod client;
mod types;

pub use api::LambdaApi;
pub use client::{LambdaClient, RetryPolicy};
pub use types::{
    FileSystem, Instance, InstanceStatus, InstanceType, LaunchRequest, LeaseState, Readiness,
};

#[cfg(test)]
pub(crate) use api::MockLambdaApi;
