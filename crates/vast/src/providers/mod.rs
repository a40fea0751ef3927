//! GPU marketplace implementations.
//!
//! This module contains the [`GpuMarketplace`] trait and its vast.ai
//! implementation.

pub mod traits;
pub mod vast;

pub use traits::{
    CreatedInstance, GpuMarketplace, InstanceCreateOptions, Offer, OfferFilter, RunningInstance,
    VastError,
};
