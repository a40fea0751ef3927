//! vast.ai GPU marketplace provider.
//!
//! Implements the [`GpuMarketplace`](crate::providers::traits::GpuMarketplace)
//! trait against the vast.ai REST API (`https://cloud.vast.ai/api/v0`).
//!
//! ## Example
//!
//! ```ignore
//! use vast::providers::vast::Vast;
//! use vast::{GpuMarketplace, InstanceCreateOptions, OfferFilter, VastConfig};
//!
//! let market = Vast::new(VastConfig::from_env()?)?;
//!
//! // Cheapest-first is not guaranteed; offers come back by score
//! let offers = market
//!     .list_offers(&OfferFilter::default().min_gpu_count(8).max_hourly_price(4.0))
//!     .await?;
//!
//! // Rent the first one
//! let created = market
//!     .create_instance(offers[0].id, InstanceCreateOptions::default())
//!     .await?;
//! ```

mod client;
mod models;
mod query;

pub use client::{forwarded_ports, ssh_command, Vast};
pub use models::{Equals, OfferQuery, PortBinding, Range};
pub use query::{build_offer_query, MAX_GPU_COUNT};
