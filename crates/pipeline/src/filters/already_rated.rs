//! Filter to remove movies the user has already rated.
//!
//! Turns the candidate universe into the candidate set: all movie ids minus
//! the user's rated set.

use crate::traits::Filter;
use crate::types::{Candidate, UserContext};
use anyhow::Result;

/// Removes candidates that the user has already rated.
///
/// Uses the HashSet in UserContext.rated_movies for O(1) lookups.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &UserContext,
    ) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !context.has_rated(candidate.movie_id))
            .collect();
        Ok(filtered)
    }
}
