//! Parser for the ratings and movies tables.
//!
//! Both tables are comma-delimited with a header row, in the MovieLens layout:
//! - ratings.csv: userId,movieId,rating[,timestamp]
//! - movies.csv: movieId,title[,genres]
//!
//! Columns are located by header name, so extra columns and any column order
//! are accepted. Titles containing commas must be quoted, as in MovieLens.

use crate::error::{DataLoadError, Result};
use crate::types::{Movie, MovieId, Rating, UserId};
use serde::Deserialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

const RATING_COLUMNS: [&str; 3] = ["userId", "movieId", "rating"];
const MOVIE_COLUMNS: [&str; 2] = ["movieId", "title"];

/// MovieLens marker for a movie without genres
const NO_GENRES: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f32,
    #[serde(default)]
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    #[serde(default)]
    genres: Option<String>,
}

/// Parse the ratings table at `path`
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let file = open_table(path)?;
    parse_ratings_from_reader(file, &file_label(path))
}

/// Parse the movies table at `path`
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = open_table(path)?;
    parse_movies_from_reader(file, &file_label(path))
}

/// Parse ratings from any reader. `file` is only used in error messages.
pub fn parse_ratings_from_reader<R: Read>(source: R, file: &str) -> Result<Vec<Rating>> {
    let mut reader = table_reader(source);
    require_columns(&mut reader, file, &RATING_COLUMNS)?;

    let mut ratings = Vec::new();
    for row in reader.deserialize::<RatingRow>() {
        let row = row.map_err(|e| csv_error(file, e))?;
        ratings.push(Rating {
            user_id: row.user_id,
            movie_id: row.movie_id,
            rating: row.rating,
            timestamp: row.timestamp,
        });
    }
    Ok(ratings)
}

/// Parse movies from any reader. `file` is only used in error messages.
pub fn parse_movies_from_reader<R: Read>(source: R, file: &str) -> Result<Vec<Movie>> {
    let mut reader = table_reader(source);
    require_columns(&mut reader, file, &MOVIE_COLUMNS)?;

    let mut movies = Vec::new();
    for row in reader.deserialize::<MovieRow>() {
        let row = row.map_err(|e| csv_error(file, e))?;
        movies.push(Movie {
            id: row.movie_id,
            title: row.title,
            genres: row.genres.as_deref().map(parse_genres).unwrap_or_default(),
        });
    }
    Ok(movies)
}

fn open_table(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn table_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Fail early with the missing column's name rather than a serde error per row
fn require_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    file: &str,
    columns: &[&str],
) -> Result<()> {
    let headers = reader.headers().map_err(|e| csv_error(file, e))?;
    for column in columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataLoadError::MissingColumn {
                file: file.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
    let reason = match err.kind() {
        csv::ErrorKind::Deserialize { err: de, .. } => de.to_string(),
        _ => err.to_string(),
    };
    DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason,
    }
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> ["Action", "Adventure", "Sci-Fi"]
fn parse_genres(s: &str) -> Vec<String> {
    if s.trim() == NO_GENRES {
        return Vec::new();
    }
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
