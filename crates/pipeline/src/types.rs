//! Types shared by the candidate stages.

use data_loader::{MovieId, UserId};
use std::collections::HashSet;

/// A movie eligible for scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub movie_id: MovieId,
}

impl Candidate {
    pub fn new(movie_id: MovieId) -> Self {
        Self { movie_id }
    }
}

/// What the filters need to know about the requesting user.
///
/// Built once per request so the filters never query the DataIndex themselves.
#[derive(Debug, Clone, Default)]
pub struct UserContext {
    pub user_id: UserId,
    /// Every movie the user has a rating for
    pub rated_movies: HashSet<MovieId>,
    /// Mean of the user's ratings, 0.0 for a user without ratings
    pub avg_rating: f32,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// False when the ratings table has no row for this user
    pub fn is_known(&self) -> bool {
        !self.rated_movies.is_empty()
    }

    pub fn has_rated(&self, movie_id: MovieId) -> bool {
        self.rated_movies.contains(&movie_id)
    }
}
