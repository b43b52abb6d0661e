//! Integration tests for the pipeline.
//!
//! These tests verify that the catalog source, the user context and the
//! filters produce the candidate set together.

use data_loader::{DataIndex, Movie, MovieId, Rating};
use pipeline::filters::AlreadyRatedFilter;
use pipeline::{build_user_context, CandidateUniverse, CatalogSource, FilterPipeline};

fn rating(user_id: u32, movie_id: MovieId, rating: f32) -> Rating {
    Rating {
        user_id,
        movie_id,
        rating,
        timestamp: None,
    }
}

fn create_test_index() -> DataIndex {
    let mut index = DataIndex::new();

    for (id, title) in [(10, "A"), (20, "B"), (30, "C"), (40, "D")] {
        index.insert_movie(Movie {
            id,
            title: title.to_string(),
            genres: vec![],
        });
    }

    // User 1 rated 10 and 20, user 2 rated 20 and 40
    index.insert_rating(rating(1, 10, 4.0));
    index.insert_rating(rating(1, 20, 3.0));
    index.insert_rating(rating(2, 20, 5.0));
    index.insert_rating(rating(2, 40, 2.0));

    index
}

fn candidate_ids(index: &DataIndex, universe: CandidateUniverse, user_id: u32) -> Vec<MovieId> {
    let catalog = CatalogSource::new(index, universe);
    let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);
    let context = build_user_context(index, user_id);

    pipeline
        .apply(catalog.get_candidates(), &context)
        .unwrap()
        .into_iter()
        .map(|c| c.movie_id)
        .collect()
}

#[test]
fn test_candidates_exclude_rated_movies() {
    let index = create_test_index();
    let candidates = candidate_ids(&index, CandidateUniverse::RatedAndCatalog, 1);

    assert_eq!(candidates, vec![30, 40]);
    for movie_id in [10, 20] {
        assert!(!candidates.contains(&movie_id));
    }
}

#[test]
fn test_rated_only_universe_skips_unrated_titles() {
    let index = create_test_index();
    let candidates = candidate_ids(&index, CandidateUniverse::RatedMovies, 1);

    // 30 appears only in the movies table
    assert_eq!(candidates, vec![40]);
}

#[test]
fn test_unknown_user_sees_whole_universe() {
    let index = create_test_index();

    assert_eq!(
        candidate_ids(&index, CandidateUniverse::RatedAndCatalog, 999),
        vec![10, 20, 30, 40]
    );
    assert_eq!(
        candidate_ids(&index, CandidateUniverse::RatedMovies, 999),
        vec![10, 20, 40]
    );
}

#[test]
fn test_candidate_set_is_deterministic() {
    let index = create_test_index();

    let first = candidate_ids(&index, CandidateUniverse::RatedAndCatalog, 2);
    let second = candidate_ids(&index, CandidateUniverse::RatedAndCatalog, 2);

    assert_eq!(first, vec![10, 30]);
    assert_eq!(first, second);
}
