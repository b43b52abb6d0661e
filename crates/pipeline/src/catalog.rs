//! Catalog Source - the full candidate universe
//!
//! Every request scores the same universe of movies minus what the user has
//! already rated. The universe is fixed for the lifetime of a DataIndex, so it
//! is captured once, sorted, and shared between clones.

use crate::types::Candidate;
use data_loader::{DataIndex, MovieId};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Which movie ids make up the candidate universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateUniverse {
    /// Distinct movie ids that appear in the ratings table
    RatedMovies,
    /// Rated movie ids plus every id of the movies table
    #[default]
    RatedAndCatalog,
}

/// Produces the candidate universe for every request
#[derive(Debug, Clone)]
pub struct CatalogSource {
    movie_ids: Arc<[MovieId]>,
    universe: CandidateUniverse,
}

impl CatalogSource {
    pub fn new(data_index: &DataIndex, universe: CandidateUniverse) -> Self {
        let movie_ids = match universe {
            CandidateUniverse::RatedMovies => data_index.rated_movie_ids(),
            CandidateUniverse::RatedAndCatalog => data_index.all_movie_ids(),
        };
        debug!(?universe, movies = movie_ids.len(), "Captured candidate universe");

        Self {
            movie_ids: movie_ids.into(),
            universe,
        }
    }

    pub fn universe(&self) -> CandidateUniverse {
        self.universe
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    /// All movies of the universe, ascending by id
    #[instrument(skip(self), fields(universe = ?self.universe))]
    pub fn get_candidates(&self) -> Vec<Candidate> {
        self.movie_ids.iter().copied().map(Candidate::new).collect()
    }
}
