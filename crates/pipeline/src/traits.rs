//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable filters to be
//! applied to the candidate set.

use crate::types::{Candidate, UserContext};
use anyhow::Result;

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
/// Filters take ownership of the `Vec<Candidate>` and return the survivors,
/// preserving their relative order.
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>>;
}
