//! Offer search query construction.

use super::models::{Equals, OfferQuery, Range};
use crate::providers::traits::OfferFilter;

/// Upper bound on GPU count applied to every offer search.
///
/// Fixed for all filters; larger multi-GPU listings are never returned.
pub const MAX_GPU_COUNT: u32 = 16;

/// Listing type for on-demand offers (as opposed to interruptible `bid`).
const ON_DEMAND: &str = "ask";

/// Build the marketplace filter document for `filter`.
///
/// Only verified, rentable, on-demand listings are requested, ordered by
/// descending score. Filter values are passed through as-is.
#[must_use]
pub fn build_offer_query(filter: &OfferFilter) -> OfferQuery {
    OfferQuery {
        verified: Equals { eq: true },
        rentable: Equals { eq: true },
        num_gpus: Range::between(filter.min_gpu_count, MAX_GPU_COUNT),
        disk_space: Range::at_least(filter.min_disk_gb),
        dph_total: filter.max_hourly_price.map(Range::at_most),
        inet_up: filter.min_upload_mbps.map(Range::at_least),
        inet_down: filter.min_download_mbps.map(Range::at_least),
        order: vec![["score".to_string(), "desc".to_string()]],
        allocated_storage: filter.min_disk_gb,
        cuda_max_good: Range::default(),
        extra_ids: Vec::new(),
        offer_type: ON_DEMAND.to_string(),
    }
}
