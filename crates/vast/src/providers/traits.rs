//! GPU marketplace trait and common types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Default Docker image for new instances.
pub const DEFAULT_DOCKER_IMAGE: &str = "pytorch/pytorch";

/// Default local disk partition size in GB for new instances.
pub const DEFAULT_INSTANCE_DISK_GB: u32 = 10;

/// Default minimum number of GPUs an offer must carry.
pub const DEFAULT_MIN_GPU_COUNT: u32 = 8;

/// Default minimum disk space in GB an offer must provide.
pub const DEFAULT_MIN_DISK_GB: f64 = 16.0;

/// Errors that can occur during marketplace operations.
#[derive(Error, Debug)]
pub enum VastError {
    /// Missing or invalid configuration (e.g. no API key).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl VastError {
    /// Whether this error came from the transport layer (connection or status).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}

/// Filter describing acceptable offers.
///
/// Built once and handed to [`GpuMarketplace::list_offers`]. Values are not
/// validated locally; the marketplace rejects anything it does not accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferFilter {
    /// Minimum number of GPUs.
    pub min_gpu_count: u32,
    /// Minimum disk space in GB.
    pub min_disk_gb: f64,
    /// Maximum total price per hour in USD.
    pub max_hourly_price: Option<f64>,
    /// Minimum upload bandwidth in Mbps.
    pub min_upload_mbps: Option<f64>,
    /// Minimum download bandwidth in Mbps.
    pub min_download_mbps: Option<f64>,
}

impl Default for OfferFilter {
    fn default() -> Self {
        Self {
            min_gpu_count: DEFAULT_MIN_GPU_COUNT,
            min_disk_gb: DEFAULT_MIN_DISK_GB,
            max_hourly_price: None,
            min_upload_mbps: None,
            min_download_mbps: None,
        }
    }
}

impl OfferFilter {
    /// Require at least `count` GPUs.
    #[must_use]
    pub const fn min_gpu_count(mut self, count: u32) -> Self {
        self.min_gpu_count = count;
        self
    }

    /// Require at least `gb` of disk.
    #[must_use]
    pub const fn min_disk_gb(mut self, gb: f64) -> Self {
        self.min_disk_gb = gb;
        self
    }

    /// Cap the hourly price.
    #[must_use]
    pub const fn max_hourly_price(mut self, usd: f64) -> Self {
        self.max_hourly_price = Some(usd);
        self
    }

    /// Require at least `mbps` upload bandwidth.
    #[must_use]
    pub const fn min_upload_mbps(mut self, mbps: f64) -> Self {
        self.min_upload_mbps = Some(mbps);
        self
    }

    /// Require at least `mbps` download bandwidth.
    #[must_use]
    pub const fn min_download_mbps(mut self, mbps: f64) -> Self {
        self.min_download_mbps = Some(mbps);
        self
    }
}

/// A rentable machine listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Marketplace-assigned offer ID.
    pub id: u64,
    /// Number of GPUs.
    pub gpu_count: u32,
    /// Total price per hour in USD.
    pub hourly_price: f64,
    /// Marketplace ranking score.
    pub score: f64,
    /// Available disk space in GB.
    pub disk_gb: f64,
    /// Per-GPU memory as reported by the marketplace.
    pub gpu_ram: f64,
}

/// Options for creating an instance from an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceCreateOptions {
    /// Docker image to launch.
    pub docker_image: String,
    /// Docker flags (e.g. `-p 8081:8081`), in the order given.
    pub docker_options: Vec<String>,
    /// Local disk partition size in GB.
    pub disk_space_gb: u32,
}

impl Default for InstanceCreateOptions {
    fn default() -> Self {
        Self {
            docker_image: DEFAULT_DOCKER_IMAGE.to_string(),
            docker_options: Vec::new(),
            disk_space_gb: DEFAULT_INSTANCE_DISK_GB,
        }
    }
}

impl InstanceCreateOptions {
    /// Set the Docker image.
    #[must_use]
    pub fn docker_image(mut self, image: impl Into<String>) -> Self {
        self.docker_image = image.into();
        self
    }

    /// Append a Docker flag.
    #[must_use]
    pub fn docker_option(mut self, option: impl Into<String>) -> Self {
        self.docker_options.push(option.into());
        self
    }

    /// Set the disk size.
    #[must_use]
    pub fn disk_space_gb(mut self, gb: u32) -> Self {
        self.disk_space_gb = gb;
        self
    }
}

/// Acknowledgement of an accepted create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInstance {
    /// Contract (instance) ID assigned by the marketplace, if reported.
    pub contract_id: Option<u64>,
}

/// A rented instance owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningInstance {
    /// Instance (contract) ID.
    pub id: u64,
    /// SSH proxy host.
    pub ssh_host: Option<String>,
    /// SSH proxy port.
    pub ssh_port: Option<u16>,
    /// Human-readable status message.
    pub status: Option<String>,
    /// Ready-to-paste SSH command, when host and port are known.
    pub ssh_command: Option<String>,
    /// Public IP address of the host machine.
    pub public_ip: Option<String>,
    /// Forwarded ports, `{public_ip}:{host_port} -> {internal_port}`.
    ///
    /// Ordered lexicographically by container port, not in marketplace order.
    pub forwarded_ports: Vec<String>,
    /// When the instance started.
    pub started_at: Option<DateTime<Utc>>,
}

/// Trait for GPU rental marketplaces.
///
/// Every call is a single attempt; nothing is retried.
#[async_trait]
pub trait GpuMarketplace: Send + Sync {
    /// List offers matching `filter`, in marketplace order.
    async fn list_offers(&self, filter: &OfferFilter) -> Result<Vec<Offer>, VastError>;

    /// Rent the machine behind `offer_id`.
    ///
    /// Not idempotent: calling twice creates two instances.
    async fn create_instance(
        &self,
        offer_id: u64,
        options: InstanceCreateOptions,
    ) -> Result<CreatedInstance, VastError>;

    /// List instances owned by the caller.
    async fn list_instances(&self) -> Result<Vec<RunningInstance>, VastError>;

    /// Destroy an instance.
    async fn delete_instance(&self, id: u64) -> Result<(), VastError>;

    /// Delete every running instance, one at a time.
    ///
    /// Stops at the first failed deletion. Instances deleted before the
    /// failure stay deleted and the remaining ones are not attempted.
    async fn stop_all(&self) -> Result<Vec<u64>, VastError> {
        let instances = self.list_instances().await?;
        info!(count = instances.len(), "Stopping all instances");

        let mut deleted = Vec::with_capacity(instances.len());
        for instance in instances {
            self.delete_instance(instance.id).await?;
            deleted.push(instance.id);
        }

        info!(count = deleted.len(), "All instances stopped");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// In-memory marketplace that fails deletion of one ID.
    struct FakeMarketplace {
        ids: Vec<u64>,
        fail_on: Option<u64>,
        attempted: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl GpuMarketplace for FakeMarketplace {
        async fn list_offers(&self, _filter: &OfferFilter) -> Result<Vec<Offer>, VastError> {
            Ok(vec![])
        }

        async fn create_instance(
            &self,
            _offer_id: u64,
            _options: InstanceCreateOptions,
        ) -> Result<CreatedInstance, VastError> {
            Ok(CreatedInstance { contract_id: None })
        }

        async fn list_instances(&self) -> Result<Vec<RunningInstance>, VastError> {
            Ok(self
                .ids
                .iter()
                .map(|&id| RunningInstance {
                    id,
                    ssh_host: None,
                    ssh_port: None,
                    status: None,
                    ssh_command: None,
                    public_ip: None,
                    forwarded_ports: vec![],
                    started_at: None,
                })
                .collect())
        }

        async fn delete_instance(&self, id: u64) -> Result<(), VastError> {
            self.attempted.lock().unwrap().push(id);
            if self.fail_on == Some(id) {
                return Err(VastError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stop_all_deletes_everything() {
        let market = FakeMarketplace {
            ids: vec![1, 2, 3],
            fail_on: None,
            attempted: Mutex::new(vec![]),
        };

        let deleted = market.stop_all().await.unwrap();
        assert_eq!(deleted, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stop_all_aborts_at_first_failure() {
        let market = FakeMarketplace {
            ids: vec![1, 2, 3],
            fail_on: Some(2),
            attempted: Mutex::new(vec![]),
        };

        let err = market.stop_all().await.unwrap_err();
        assert!(matches!(err, VastError::Api { status: 500, .. }));
        assert_eq!(*market.attempted.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_offer_filter_defaults() {
        let filter = OfferFilter::default();
        assert_eq!(filter.min_gpu_count, 8);
        assert!((filter.min_disk_gb - 16.0).abs() < f64::EPSILON);
        assert!(filter.max_hourly_price.is_none());
        assert!(filter.min_upload_mbps.is_none());
        assert!(filter.min_download_mbps.is_none());
    }

    #[test]
    fn test_create_options_builder() {
        let options = InstanceCreateOptions::default()
            .docker_image("nvidia/cuda:12.1.0-base")
            .docker_option("-p 8081:8081")
            .docker_option("-e FOO=bar")
            .disk_space_gb(40);

        assert_eq!(options.docker_image, "nvidia/cuda:12.1.0-base");
        assert_eq!(options.docker_options, vec!["-p 8081:8081", "-e FOO=bar"]);
        assert_eq!(options.disk_space_gb, 40);
    }

    #[test]
    fn test_create_options_defaults() {
        let options = InstanceCreateOptions::default();
        assert_eq!(options.docker_image, "pytorch/pytorch");
        assert!(options.docker_options.is_empty());
        assert_eq!(options.disk_space_gb, 10);
    }

    #[test]
    fn test_transport_classification() {
        assert!(VastError::Api {
            status: 404,
            message: String::new()
        }
        .is_transport());
        assert!(!VastError::Config("missing".to_string()).is_transport());
        assert!(!VastError::MalformedResponse("no offers".to_string()).is_transport());
    }
}
