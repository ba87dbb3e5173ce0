//! Lambda Cloud API types and data structures.
//!
//! Public types are snapshots of provider state; the client never mutates
//! them, it only re-fetches. The `*Record` types mirror the wire format and
//! stay private to the crate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Lease time left below which a lease counts as expiring soon.
const LEASE_WARNING_SECS: i64 = 3600;

/// A GPU instance type offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceType {
    /// Unique type name, e.g. `gpu_1x_a10`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Price in cents per hour. Authoritative unit for money.
    pub price_cents_per_hour: u32,
    /// vCPU count.
    pub vcpus: u32,
    /// Memory in GiB.
    pub memory_gib: u32,
    /// Local storage in GiB.
    pub storage_gib: u32,
    /// Regions currently offering capacity. Empty means "no capacity right
    /// now", not "does not exist".
    pub regions_available: Vec<String>,
}

/// A live or historical compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Provider-assigned opaque identifier.
    pub id: String,
    /// User-supplied name.
    #[serde(default)]
    pub name: Option<String>,
    /// Public IP, absent while booting.
    #[serde(default)]
    pub ip: Option<String>,
    /// Provider-reported status.
    pub status: InstanceStatus,
    /// Instance type name.
    #[serde(deserialize_with = "name_of")]
    pub instance_type: String,
    /// Region name.
    #[serde(deserialize_with = "name_of")]
    pub region: String,
    /// Creation timestamp; the provider may omit it early in boot.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Lease expiry timestamp.
    #[serde(default)]
    pub lease_expires_at: Option<String>,
}

/// Instance status as reported by the provider.
///
/// The provider's set of status strings is open; anything unrecognized is
/// kept verbatim in [`InstanceStatus::Other`] and treated as transitional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    /// Instance is booting.
    Booting,
    /// Launch accepted, not yet scheduled.
    Pending,
    /// Instance is running.
    Active,
    /// Instance is being torn down.
    Terminating,
    /// Instance is gone.
    Terminated,
    /// Instance failed health checks.
    Unhealthy,
    /// Any status this crate does not know about.
    Other(String),
}

/// Polling classification of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Keep polling.
    Transitional,
    /// Active and reachable: status is `active` and an IP is assigned.
    Ready,
    /// Terminated or unhealthy; polling should stop.
    Failed,
}

/// Lease health of an instance at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    /// No lease expiry known.
    Unknown,
    /// The lease has run out.
    Expired,
    /// Less than an hour left.
    ExpiringSoon,
    /// More than an hour left.
    Healthy,
}

/// A persistent filesystem (network volume).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystem {
    /// Filesystem identifier.
    pub id: String,
    /// Filesystem name.
    pub name: String,
    /// Region the filesystem lives in.
    #[serde(deserialize_with = "name_of")]
    pub region: String,
    /// Mount point on attached instances.
    pub mount_point: String,
    /// Whether an instance currently has it attached.
    #[serde(default)]
    pub is_in_use: bool,
}

/// Request to launch a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchRequest {
    /// Target region.
    #[serde(rename = "region_name")]
    pub region: String,
    /// Instance type name.
    #[serde(rename = "instance_type_name")]
    pub instance_type: String,
    /// Registered SSH key names to install.
    pub ssh_key_names: Vec<String>,
    /// Filesystems to attach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_system_names: Vec<String>,
    /// Instance name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Standard `{"data": ...}` envelope of every Lambda response.
///
/// `data` is required: a 2xx body without it is an invalid response, not an
/// empty listing.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// Payload of a launch response.
#[derive(Debug, Deserialize)]
pub(crate) struct LaunchRecord {
    #[serde(default)]
    pub instance_ids: Vec<String>,
}

/// One registered SSH key.
#[derive(Debug, Deserialize)]
pub(crate) struct SshKeyRecord {
    pub name: String,
}

/// Value side of the instance-types map, keyed by type name.
#[derive(Debug, Deserialize)]
pub(crate) struct InstanceTypeEntry {
    instance_type: InstanceTypeRecord,
    #[serde(default)]
    regions_with_capacity_available: Vec<NamedRef>,
}

#[derive(Debug, Deserialize)]
struct InstanceTypeRecord {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price_cents_per_hour: u32,
    #[serde(default)]
    specs: SpecsRecord,
}

#[derive(Debug, Default, Deserialize)]
struct SpecsRecord {
    #[serde(default)]
    vcpus: u32,
    #[serde(default)]
    memory_gib: u32,
    #[serde(default)]
    storage_gib: u32,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: String,
}

/// Flattens `{"name": "..."}` objects into their name.
fn name_of<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NamedRef::deserialize(deserializer).map(|named| named.name)
}

impl InstanceTypeEntry {
    /// Converts a map entry into an [`InstanceType`].
    pub(crate) fn into_instance_type(self, name: String) -> InstanceType {
        let record = self.instance_type;
        InstanceType {
            description: record.description.unwrap_or_else(|| name.clone()),
            name,
            price_cents_per_hour: record.price_cents_per_hour,
            vcpus: record.specs.vcpus,
            memory_gib: record.specs.memory_gib,
            storage_gib: record.specs.storage_gib,
            regions_available: self
                .regions_with_capacity_available
                .into_iter()
                .map(|r| r.name)
                .collect(),
        }
    }
}

impl InstanceType {
    /// Price in dollars per hour, for display only.
    #[must_use]
    pub fn price_per_hour(&self) -> f64 {
        f64::from(self.price_cents_per_hour) / 100.0
    }

    /// Formats the price as `$X.XX/hr`.
    #[must_use]
    pub fn format_price(&self) -> String {
        format!("${:.2}/hr", self.price_per_hour())
    }

    /// Estimated cost in cents for running the given number of hours.
    #[must_use]
    pub fn estimate_cost_cents(&self, hours: u32) -> u64 {
        u64::from(self.price_cents_per_hour) * u64::from(hours)
    }

    /// Returns true if any region currently has capacity.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        !self.regions_available.is_empty()
    }

    /// Returns true if the given region currently has capacity.
    #[must_use]
    pub fn is_available_in(&self, region: &str) -> bool {
        self.regions_available.iter().any(|r| r == region)
    }
}

impl Instance {
    /// Returns true if an IP has been assigned.
    #[must_use]
    pub fn has_ip(&self) -> bool {
        self.ip.as_deref().is_some_and(|ip| !ip.is_empty())
    }

    /// Classifies the instance for polling.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        match self.status {
            InstanceStatus::Active if self.has_ip() => Readiness::Ready,
            InstanceStatus::Terminated | InstanceStatus::Unhealthy => Readiness::Failed,
            _ => Readiness::Transitional,
        }
    }

    /// Parsed creation time, if present and well-formed.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Parsed lease expiry, if present and well-formed.
    #[must_use]
    pub fn lease_expires_at(&self) -> Option<DateTime<Utc>> {
        self.lease_expires_at.as_deref().and_then(parse_timestamp)
    }

    /// Returns true if the lease is known to have expired at `now`.
    #[must_use]
    pub fn is_lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.lease_expires_at().is_some_and(|expires| now > expires)
    }

    /// Lease health at `now`.
    #[must_use]
    pub fn lease_state(&self, now: DateTime<Utc>) -> LeaseState {
        let Some(expires) = self.lease_expires_at() else {
            return LeaseState::Unknown;
        };

        let remaining = expires - now;
        if remaining < Duration::zero() {
            LeaseState::Expired
        } else if remaining < Duration::seconds(LEASE_WARNING_SECS) {
            LeaseState::ExpiringSoon
        } else {
            LeaseState::Healthy
        }
    }

    /// Display name, falling back to the ID.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl InstanceStatus {
    /// The provider's string for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Booting => "booting",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
            Self::Unhealthy => "unhealthy",
            Self::Other(status) => status,
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "booting" => Self::Booting,
            "pending" => Self::Pending,
            "active" => Self::Active,
            "terminating" => Self::Terminating,
            "terminated" => Self::Terminated,
            "unhealthy" => Self::Unhealthy,
            _ => Self::Other(value),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(status: InstanceStatus) -> Self {
        match status {
            InstanceStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl From<&str> for InstanceStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl LaunchRequest {
    /// Creates a new launch request.
    #[must_use]
    pub fn new(region: &str, instance_type: &str, ssh_key_names: Vec<String>) -> Self {
        Self {
            region: region.to_string(),
            instance_type: instance_type.to_string(),
            ssh_key_names,
            file_system_names: Vec::new(),
            name: None,
        }
    }

    /// Attaches a filesystem.
    #[must_use]
    pub fn with_file_system(mut self, name: &str) -> Self {
        self.file_system_names.push(name.to_string());
        self
    }

    /// Sets the instance name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}
