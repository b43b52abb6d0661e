//! Helper to build a UserContext from the DataIndex

use crate::types::UserContext;
use data_loader::{DataIndex, UserId};
use tracing::debug;

/// Build a UserContext from DataIndex for a given user
///
/// Gathers the user's rated-movie set and average rating. A user with no row
/// in the ratings table gets an empty context rather than an error; whether
/// that is acceptable is the caller's policy.
pub fn build_user_context(data_index: &DataIndex, user_id: UserId) -> UserContext {
    let mut context = UserContext::new(user_id);
    let ratings = data_index.get_user_ratings(user_id);

    if ratings.is_empty() {
        debug!(user_id, "User has no ratings");
        return context;
    }

    let total: f32 = ratings.iter().map(|r| r.rating).sum();
    context.avg_rating = total / ratings.len() as f32;
    context.rated_movies = ratings.iter().map(|r| r.movie_id).collect();

    context
}
