pub mod database;
pub mod memory;

use async_trait::async_trait;

pub use database::DatabaseRepository;
pub use memory::MemoryRepository;

use crate::{
    domain::{Actor, Director, Genre, Movie, Review, User},
    error::{RepoResult, RepositoryError},
};

/// Storage-independent access to the catalogue, its users and their reviews.
///
/// Point lookups report a missing key as `Ok(None)`.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn add_movie(&self, movie: Movie) -> RepoResult<()>;

    async fn get_movie(&self, rank: i32) -> RepoResult<Option<Movie>>;

    /// The movies holding `rank`: a single movie, or [`RepositoryError::RankNotFound`].
    async fn get_movies_by_rank(&self, rank: i32) -> RepoResult<Vec<Movie>>;

    async fn get_first_movie(&self) -> RepoResult<Option<Movie>>;

    async fn get_last_movie(&self) -> RepoResult<Option<Movie>>;

    async fn get_rank_of_previous_movie(&self, movie: &Movie) -> RepoResult<Option<i32>>;

    async fn get_rank_of_next_movie(&self, movie: &Movie) -> RepoResult<Option<i32>>;

    async fn get_number_of_movies(&self) -> RepoResult<usize>;

    async fn add_user(&self, user: User) -> RepoResult<()>;

    async fn get_user(&self, username: &str) -> RepoResult<Option<User>>;

    /// Stores a review built with [`Review::link`]. `user` and `movie` must be
    /// the review's own user and movie, both already holding its id.
    async fn add_review(&self, review: Review, user: &User, movie: &Movie) -> RepoResult<()>;

    async fn get_reviews(&self) -> RepoResult<Vec<Review>>;

    async fn get_reviews_for_movie(&self, rank: i32) -> RepoResult<Vec<Review>>;

    async fn add_actor(&self, _actor: Actor) -> RepoResult<()> {
        Err(RepositoryError::Unsupported("actors"))
    }

    async fn get_actor(&self, _full_name: &str) -> RepoResult<Option<Actor>> {
        Err(RepositoryError::Unsupported("actors"))
    }

    async fn add_genre(&self, _genre: Genre) -> RepoResult<()> {
        Err(RepositoryError::Unsupported("genres"))
    }

    async fn get_genre(&self, _name: &str) -> RepoResult<Option<Genre>> {
        Err(RepositoryError::Unsupported("genres"))
    }

    async fn add_director(&self, _director: Director) -> RepoResult<()> {
        Err(RepositoryError::Unsupported("directors"))
    }

    async fn get_director(&self, _name: &str) -> RepoResult<Option<Director>> {
        Err(RepositoryError::Unsupported("directors"))
    }

    /// Called by the web layer at the start of every request.
    async fn reset_session(&self) -> RepoResult<()> {
        Ok(())
    }

    /// Called by the web layer at the end of every request. The repository
    /// must stay usable for the next [`Repository::reset_session`].
    async fn close_session(&self) -> RepoResult<()> {
        Ok(())
    }
}

/// Checks that `review` is reachable from both its user and its movie.
pub(crate) fn audit_linkage(review: &Review, user: &User, movie: &Movie) -> RepoResult<()> {
    if user.username() != review.username() || !user.has_review(review.id()) {
        tracing::warn!(
            review = %review.id(),
            username = %review.username(),
            "review not attached to user"
        );
        return Err(RepositoryError::ReviewNotLinkedToUser(review.username().to_string()));
    }
    if movie.rank() != review.movie_rank() || !movie.has_review(review.id()) {
        tracing::warn!(
            review = %review.id(),
            rank = review.movie_rank(),
            "review not attached to movie"
        );
        return Err(RepositoryError::ReviewNotLinkedToMovie(review.movie_rank()));
    }
    Ok(())
}
