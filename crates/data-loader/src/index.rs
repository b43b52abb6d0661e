//! DataIndex building and validation.
//!
//! Parses both tables in parallel, fills the primary indices and checks the
//! snapshot before it is handed to the rest of the system.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Conventional file name of the ratings table
pub const RATINGS_FILE: &str = "ratings.csv";

/// Conventional file name of the movies table
pub const MOVIES_FILE: &str = "movies.csv";

impl DataIndex {
    /// Load `ratings.csv` and `movies.csv` from a directory
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        Self::load_from_files(&data_dir.join(RATINGS_FILE), &data_dir.join(MOVIES_FILE))
    }

    /// Load both tables from explicit paths
    ///
    /// Steps:
    /// 1. Parse the two files in parallel
    /// 2. Build the movie and rating indices
    /// 3. Validate the snapshot
    pub fn load_from_files(ratings_path: &Path, movies_path: &Path) -> Result<Self> {
        let start = Instant::now();
        info!(
            ratings = %ratings_path.display(),
            movies = %movies_path.display(),
            "Loading ratings and movies tables"
        );

        // Rayon's `join` runs both closures in parallel
        let (ratings, movies) = rayon::join(
            || parser::parse_ratings(ratings_path),
            || parser::parse_movies(movies_path),
        );
        let ratings = ratings?;
        let movies = movies?;

        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        for rating in ratings {
            index.insert_rating(rating);
        }

        index.validate()?;

        let (users, movies, ratings) = index.counts();
        info!(
            users,
            movies,
            ratings,
            elapsed = ?start.elapsed(),
            "DataIndex built"
        );
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Non-finite rating values are rejected. Ratings that reference a movie
    /// missing from the movies table are only reported: they stay loadable
    /// and surface per request when such a movie would be recommended.
    ///
    /// Returns the number of distinct dangling movie ids.
    pub fn validate(&self) -> Result<usize> {
        for ratings in self.user_ratings.values() {
            for rating in ratings {
                if !rating.rating.is_finite() {
                    return Err(DataLoadError::InvalidValue {
                        field: "rating".to_string(),
                        value: rating.rating.to_string(),
                    });
                }
            }
        }

        let dangling = self
            .movie_ratings
            .keys()
            .filter(|movie_id| !self.movies.contains_key(movie_id))
            .count();
        if dangling > 0 {
            warn!(
                dangling,
                "Ratings reference movie ids that are missing from the movies table"
            );
        }
        Ok(dangling)
    }
}
