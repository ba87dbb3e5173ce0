//! Instance lifecycle: waiting for readiness and termination.

mod poller;

pub use poller::{DEFAULT_POLL_INTERVAL, InstancePoller};
