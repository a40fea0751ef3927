//! vast.ai API models.
//!
//! Field names follow the marketplace's JSON; the client maps these onto the
//! provider-neutral types in [`crate::providers::traits`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Offer search
// ============================================================================

/// Response of `GET /bundles/`.
#[derive(Debug, Deserialize)]
pub struct OffersResponse {
    /// Matching offers, best score first.
    pub offers: Vec<RawOffer>,
}

/// Offer as returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOffer {
    /// Offer ID (used as the ask ID when renting).
    pub id: u64,
    /// Number of GPUs.
    pub num_gpus: u32,
    /// Total dollars per hour.
    pub dph_total: f64,
    /// Marketplace score.
    pub score: f64,
    /// Disk space in GB.
    pub disk_space: f64,
    /// Per-GPU RAM in MB.
    pub gpu_ram: f64,
}

/// Equality clause, `{"eq": value}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equals<T> {
    /// Required value.
    pub eq: T,
}

/// Range clause, `{"gte": min, "lte": max}` with unset bounds omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Range<T> {
    /// Inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<T>,
    /// Inclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<T>,
}

impl<T> Range<T> {
    /// Range with only a lower bound.
    pub const fn at_least(min: T) -> Self {
        Self {
            gte: Some(min),
            lte: None,
        }
    }

    /// Range with only an upper bound.
    pub const fn at_most(max: T) -> Self {
        Self {
            gte: None,
            lte: Some(max),
        }
    }

    /// Range with both bounds.
    pub const fn between(min: T, max: T) -> Self {
        Self {
            gte: Some(min),
            lte: Some(max),
        }
    }
}

/// Filter document sent as the `q` parameter of `GET /bundles/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferQuery {
    /// Only verified hosts.
    pub verified: Equals<bool>,
    /// Only rentable machines.
    pub rentable: Equals<bool>,
    /// GPU count bounds.
    pub num_gpus: Range<u32>,
    /// Disk space lower bound.
    pub disk_space: Range<f64>,
    /// Price ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dph_total: Option<Range<f64>>,
    /// Upload bandwidth floor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inet_up: Option<Range<f64>>,
    /// Download bandwidth floor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inet_down: Option<Range<f64>>,
    /// Sort order, e.g. `[["score", "desc"]]`.
    pub order: Vec<[String; 2]>,
    /// Disk the search should assume will be allocated, in GB.
    pub allocated_storage: f64,
    /// CUDA version constraint (unconstrained).
    pub cuda_max_good: Range<f64>,
    /// Extra offer IDs to include.
    pub extra_ids: Vec<u64>,
    /// Listing type: `ask` (on-demand) or `bid` (interruptible).
    #[serde(rename = "type")]
    pub offer_type: String,
}

// ============================================================================
// Instance creation
// ============================================================================

/// Request body for `PUT /asks/{id}/`.
#[derive(Debug, Serialize)]
pub struct CreateInstanceBody {
    /// Always `me`.
    pub client_id: String,
    /// Docker image.
    pub image: String,
    /// Docker options, each mapped to `"1"`.
    pub env: BTreeMap<String, String>,
    /// Arguments string.
    pub args_str: String,
    /// Startup script.
    pub onstart: String,
    /// Access methods.
    pub runtype: String,
    /// Registry login.
    pub image_login: Option<String>,
    /// Launch Jupyter Lab instead of notebook.
    pub use_jupyter_lab: bool,
    /// Jupyter working directory.
    pub jupyter_dir: Option<String>,
    /// Set `PYTHONIOENCODING=utf-8`.
    pub python_utf8: bool,
    /// Set a UTF-8 locale.
    pub lang_utf8: bool,
    /// Local disk partition size in GB.
    pub disk: u32,
}

/// Response of `PUT /asks/{id}/`.
#[derive(Debug, Deserialize)]
pub struct CreateInstanceResponse {
    /// Whether the marketplace accepted the request.
    #[serde(default = "default_success")]
    pub success: bool,
    /// New contract ID.
    pub new_contract: Option<u64>,
}

/// Response of `DELETE /instances/{id}/`.
#[derive(Debug, Deserialize)]
pub struct DeleteInstanceResponse {
    /// Whether the marketplace accepted the request.
    #[serde(default = "default_success")]
    pub success: bool,
}

const fn default_success() -> bool {
    true
}

// ============================================================================
// Instance listing
// ============================================================================

/// Response of `GET /instances/`.
#[derive(Debug, Deserialize)]
pub struct InstancesResponse {
    /// Instances owned by the caller.
    pub instances: Vec<RawInstance>,
}

/// Instance as returned by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstance {
    /// Contract ID.
    pub id: u64,
    /// SSH proxy host.
    pub ssh_host: Option<String>,
    /// SSH proxy port.
    pub ssh_port: Option<u16>,
    /// Status message.
    pub status_msg: Option<String>,
    /// Public IP of the host machine.
    pub public_ipaddr: Option<String>,
    /// Docker port mappings keyed by container port (e.g. `8081/tcp`).
    pub ports: Option<BTreeMap<String, Option<Vec<PortBinding>>>>,
    /// Start time, seconds since the epoch.
    pub start_date: Option<f64>,
}

/// Single host-side port binding.
#[derive(Debug, Clone, Deserialize)]
pub struct PortBinding {
    /// Host IP the port is bound on.
    #[serde(rename = "HostIp")]
    pub host_ip: Option<String>,
    /// Host port.
    #[serde(rename = "HostPort")]
    pub host_port: String,
}
