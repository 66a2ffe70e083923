use jiff::Zoned;
use tracing::debug;

use crate::{
    domain::{Movie, Review},
    error::{RepositoryError, ServiceError, ServiceResult},
    models::{MovieView, RankedMovies, ReviewView},
    repository::Repository,
};

/// Writes a review of the movie at `rank` on behalf of `username`.
///
/// The movie is checked before the user, so a request naming neither fails
/// with [`ServiceError::UnknownMovie`].
pub async fn add_review(
    repo: &dyn Repository,
    rank: i32,
    text: &str,
    username: &str,
) -> ServiceResult<()> {
    let mut movie = repo.get_movie(rank).await?.ok_or(ServiceError::UnknownMovie(rank))?;
    let mut user = repo
        .get_user(username)
        .await?
        .ok_or_else(|| ServiceError::UnknownUser(username.to_string()))?;

    let review = Review::link(text, Zoned::now().datetime(), &mut user, &mut movie)?;
    debug!(review = %review.id(), rank, username = %username, "adding review");
    repo.add_review(review, &user, &movie).await?;
    Ok(())
}

pub async fn get_movie(repo: &dyn Repository, rank: i32) -> ServiceResult<MovieView> {
    let movie = repo.get_movie(rank).await?.ok_or(ServiceError::UnknownMovie(rank))?;
    view(repo, &movie).await
}

pub async fn get_first_movie(repo: &dyn Repository) -> ServiceResult<Option<MovieView>> {
    match repo.get_first_movie().await? {
        Some(movie) => Ok(Some(view(repo, &movie).await?)),
        None => Ok(None),
    }
}

pub async fn get_last_movie(repo: &dyn Repository) -> ServiceResult<Option<MovieView>> {
    match repo.get_last_movie().await? {
        Some(movie) => Ok(Some(view(repo, &movie).await?)),
        None => Ok(None),
    }
}

/// The movies at `rank` together with the neighbouring ranks to browse to.
pub async fn get_movies_by_rank(repo: &dyn Repository, rank: i32) -> ServiceResult<RankedMovies> {
    let movies = match repo.get_movies_by_rank(rank).await {
        Ok(movies) => movies,
        Err(RepositoryError::RankNotFound(rank)) => return Err(ServiceError::UnknownMovie(rank)),
        Err(err) => return Err(err.into()),
    };

    let (previous_rank, next_rank) = match movies.first() {
        Some(first) => (
            repo.get_rank_of_previous_movie(first).await?,
            repo.get_rank_of_next_movie(first).await?,
        ),
        None => (None, None),
    };

    let mut views = Vec::with_capacity(movies.len());
    for movie in &movies {
        views.push(view(repo, movie).await?);
    }

    Ok(RankedMovies { movies: views, previous_rank, next_rank })
}

pub async fn get_reviews_for_movie(
    repo: &dyn Repository,
    rank: i32,
) -> ServiceResult<Vec<ReviewView>> {
    if repo.get_movie(rank).await?.is_none() {
        return Err(ServiceError::UnknownMovie(rank));
    }
    let reviews = repo.get_reviews_for_movie(rank).await?;
    Ok(reviews.iter().map(ReviewView::from).collect())
}

async fn view(repo: &dyn Repository, movie: &Movie) -> ServiceResult<MovieView> {
    let reviews = repo.get_reviews_for_movie(movie.rank()).await?;
    Ok(MovieView::new(movie, &reviews))
}
