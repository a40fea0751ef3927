//! GPU instance rental on the vast.ai marketplace.
//!
//! Thin client over the vast.ai REST API: search offers, rent one, list what
//! is running, and tear it down. Every operation is a single HTTP request;
//! nothing is retried, cached, or run concurrently.
//!
//! ## Example
//!
//! ```ignore
//! use vast::providers::vast::Vast;
//! use vast::{GpuMarketplace, OfferFilter, VastConfig};
//!
//! let market = Vast::new(VastConfig::from_env()?)?;
//!
//! for offer in market.list_offers(&OfferFilter::default()).await? {
//!     println!("{} x{} ${:.2}/hr", offer.id, offer.gpu_count, offer.hourly_price);
//! }
//!
//! // Delete everything when done
//! market.stop_all().await?;
//! ```

pub mod config;
pub mod providers;

pub use config::{RequestPolicy, VastConfig};
pub use providers::vast::Vast;
pub use providers::traits::{
    CreatedInstance, GpuMarketplace, InstanceCreateOptions, Offer, OfferFilter, RunningInstance,
    VastError,
};
