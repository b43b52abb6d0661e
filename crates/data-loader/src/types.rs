//! Core domain types for the ratings and movies tables.
//!
//! `DataIndex` is the read-only snapshot every request works against. It is
//! built once at startup and shared behind an `Arc`, so all getters hand out
//! borrows instead of owned values.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user in the ratings table
pub type UserId = u32;

/// Unique identifier for a movie, shared by the ratings and movies tables
pub type MovieId = u32;

// =============================================================================
// Records
// =============================================================================

/// A row of the movies table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    /// Display title, usually with the release year: "Toy Story (1995)"
    pub title: String,
    /// Empty when the table has no genres column or lists none
    pub genres: Vec<String>,
}

/// A row of the ratings table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    /// Unix timestamp, when the table carries one
    pub timestamp: Option<i64>,
}

// =============================================================================
// DataIndex - The In-Memory Snapshot
// =============================================================================

/// Holds both tables plus the indices the recommendation path needs.
///
/// Lookups by movie id and by user id are O(1) through `HashMap`s. The only
/// ordered query, [`DataIndex::rated_movie_ids`], is answered from the keys of
/// `movie_ratings` and sorted on the way out.
#[derive(Debug, Default)]
pub struct DataIndex {
    pub(crate) movies: HashMap<MovieId, Movie>,

    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Title of a movie, by exact id match
    pub fn get_title(&self, id: MovieId) -> Option<&str> {
        self.get_movie(id).map(|m| m.title.as_str())
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }


    /// Distinct movie ids that appear in the ratings table, ascending
    pub fn rated_movie_ids(&self) -> Vec<MovieId> {
        let mut ids: Vec<MovieId> = self.movie_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Union of [`Self::rated_movie_ids`] and every id of the movies table, ascending
    pub fn all_movie_ids(&self) -> Vec<MovieId> {
        let ids: BTreeSet<MovieId> = self
            .movie_ratings
            .keys()
            .chain(self.movies.keys())
            .copied()
            .collect();
        ids.into_iter().collect()
    }

    /// Users with at least one rating, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Insert a movie into the index
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Insert a rating and update both rating indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
    }

    /// (users, movies, ratings) counts for logging and validation
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.user_ratings.len(), self.movies.len(), total_ratings)
    }
}
