//! # Data Loader Crate
//!
//! Loads the two flat tables the recommender reads: the ratings table
//! (user, movie, rating triples) and the movies table (movie id to title).
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, DataIndex)
//! - **parser**: Parse the CSV tables into Rust structs
//! - **index**: Build and validate the in-memory snapshot
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_dir(Path::new("data"))?;
//!
//! let title = index.get_title(1).unwrap();
//! let ratings = index.get_user_ratings(1);
//! println!("User 1 rated {} movies, movie 1 is {}", ratings.len(), title);
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use index::{MOVIES_FILE, RATINGS_FILE};
pub use types::{DataIndex, Movie, MovieId, Rating, UserId};
