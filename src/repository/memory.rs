use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{Repository, audit_linkage};
use crate::{
    domain::{Actor, Director, Genre, Movie, Review, User},
    error::{RepoResult, RepositoryError},
    password,
    seed::{self, MovieRecord, ReviewRecord, UserRecord},
};

/// Keeps the whole data set in process memory.
///
/// Movies are kept in insertion order with a rank index next to them. Ranks
/// are expected to run densely from 1, which is what the neighbour lookups
/// rely on.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    movies: Vec<Movie>,
    ranks: HashMap<i32, usize>,
    users: Vec<User>,
    reviews: Vec<Review>,
    actors: Vec<Actor>,
    genres: Vec<Genre>,
    directors: Vec<Director>,
}

impl MemoryState {
    fn movie(&self, rank: i32) -> Option<&Movie> {
        self.ranks.get(&rank).map(|&idx| &self.movies[idx])
    }

    fn user_index(&self, username: &str) -> Option<usize> {
        self.users.iter().position(|u| u.username() == username)
    }

    fn index_people(&mut self, movie: &Movie) {
        for genre in movie.genres() {
            if !self.genres.contains(genre) {
                self.genres.push(genre.clone());
            }
        }
        if let Some(director) = movie.director() {
            if !self.directors.contains(director) {
                self.directors.push(director.clone());
            }
        }
        for actor in movie.actors() {
            let idx = match self.actors.iter().position(|a| a == actor) {
                Some(idx) => idx,
                None => {
                    self.actors.push(actor.clone());
                    self.actors.len() - 1
                }
            };
            for colleague in movie.actors() {
                self.actors[idx].add_colleague(colleague);
            }
        }
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads movies, then users, then reviews from the seed files in `data_path`.
    pub async fn populate(&self, data_path: &Path) -> RepoResult<()> {
        let movies: Vec<MovieRecord> = seed::read_records(&seed::movies_path(data_path))?;
        for record in &movies {
            self.add_movie(record.to_movie()?).await?;
        }

        let users: Vec<UserRecord> = seed::read_records(&seed::users_path(data_path))?;
        let mut usernames = HashMap::with_capacity(users.len());
        for record in &users {
            let user = User::new(&record.username, &password::hash(&record.password)?)?;
            usernames.insert(record.id, user.username().to_string());
            self.add_user(user).await?;
        }

        let reviews: Vec<ReviewRecord> = seed::read_records(&seed::reviews_path(data_path))?;
        for record in &reviews {
            let username = usernames.get(&record.user_id).ok_or_else(|| {
                RepositoryError::InvalidRow(format!(
                    "review {} refers to unknown user id {}",
                    record.id, record.user_id
                ))
            })?;
            let mut user = self
                .get_user(username)
                .await?
                .ok_or_else(|| RepositoryError::UnknownUser(username.clone()))?;
            let mut movie = self
                .get_movie(record.movie_id)
                .await?
                .ok_or(RepositoryError::UnknownMovie(record.movie_id))?;

            let review =
                Review::link(&record.text, record.parsed_timestamp()?, &mut user, &mut movie)?;
            self.add_review(review, &user, &movie).await?;
        }

        info!(
            movies = movies.len(),
            users = users.len(),
            reviews = reviews.len(),
            "populated memory repository"
        );
        Ok(())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn add_movie(&self, movie: Movie) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.ranks.contains_key(&movie.rank()) {
            return Err(RepositoryError::DuplicateKey(format!("movie rank {}", movie.rank())));
        }
        state.index_people(&movie);
        let idx = state.movies.len();
        state.ranks.insert(movie.rank(), idx);
        state.movies.push(movie);
        Ok(())
    }

    async fn get_movie(&self, rank: i32) -> RepoResult<Option<Movie>> {
        Ok(self.state.read().await.movie(rank).cloned())
    }

    async fn get_movies_by_rank(&self, rank: i32) -> RepoResult<Vec<Movie>> {
        let state = self.state.read().await;
        let movie = state.movie(rank).ok_or(RepositoryError::RankNotFound(rank))?;
        Ok(vec![movie.clone()])
    }

    async fn get_first_movie(&self) -> RepoResult<Option<Movie>> {
        Ok(self.state.read().await.movies.first().cloned())
    }

    async fn get_last_movie(&self) -> RepoResult<Option<Movie>> {
        Ok(self.state.read().await.movies.last().cloned())
    }

    async fn get_rank_of_previous_movie(&self, movie: &Movie) -> RepoResult<Option<i32>> {
        let previous = movie.rank() - 1;
        Ok((previous > 0).then_some(previous))
    }

    async fn get_rank_of_next_movie(&self, movie: &Movie) -> RepoResult<Option<i32>> {
        let count = self.state.read().await.movies.len();
        let next = movie.rank() + 1;
        Ok(usize::try_from(next).is_ok_and(|n| n <= count).then_some(next))
    }

    async fn get_number_of_movies(&self) -> RepoResult<usize> {
        Ok(self.state.read().await.movies.len())
    }

    async fn add_user(&self, user: User) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.user_index(user.username()).is_some() {
            return Err(RepositoryError::DuplicateKey(format!("username {}", user.username())));
        }
        debug!(username = %user.username(), "adding user");
        state.users.push(user);
        Ok(())
    }

    async fn get_user(&self, username: &str) -> RepoResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.user_index(username).map(|idx| state.users[idx].clone()))
    }

    async fn add_review(&self, review: Review, user: &User, movie: &Movie) -> RepoResult<()> {
        audit_linkage(&review, user, movie)?;

        let mut state = self.state.write().await;
        let user_idx = state
            .user_index(review.username())
            .ok_or_else(|| RepositoryError::UnknownUser(review.username().to_string()))?;
        let movie_idx = *state
            .ranks
            .get(&review.movie_rank())
            .ok_or(RepositoryError::UnknownMovie(review.movie_rank()))?;

        debug!(
            review = %review.id(),
            username = %review.username(),
            rank = review.movie_rank(),
            "adding review"
        );
        state.users[user_idx].add_review(review.id());
        state.movies[movie_idx].add_review(review.id());
        state.reviews.push(review);
        Ok(())
    }

    async fn get_reviews(&self) -> RepoResult<Vec<Review>> {
        Ok(self.state.read().await.reviews.clone())
    }

    async fn get_reviews_for_movie(&self, rank: i32) -> RepoResult<Vec<Review>> {
        let state = self.state.read().await;
        Ok(state.reviews.iter().filter(|r| r.movie_rank() == rank).cloned().collect())
    }

    async fn add_actor(&self, actor: Actor) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if !state.actors.contains(&actor) {
            state.actors.push(actor);
        }
        Ok(())
    }

    async fn get_actor(&self, full_name: &str) -> RepoResult<Option<Actor>> {
        let state = self.state.read().await;
        Ok(state.actors.iter().find(|a| a.full_name() == full_name).cloned())
    }

    async fn add_genre(&self, genre: Genre) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if !state.genres.contains(&genre) {
            state.genres.push(genre);
        }
        Ok(())
    }

    async fn get_genre(&self, name: &str) -> RepoResult<Option<Genre>> {
        let state = self.state.read().await;
        Ok(state.genres.iter().find(|g| g.name() == name).cloned())
    }

    async fn add_director(&self, director: Director) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if !state.directors.contains(&director) {
            state.directors.push(director);
        }
        Ok(())
    }

    async fn get_director(&self, name: &str) -> RepoResult<Option<Director>> {
        let state = self.state.read().await;
        Ok(state.directors.iter().find(|d| d.name() == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;
    use crate::{domain::ReviewId, seed::fixture_path};

    async fn repo() -> MemoryRepository {
        let repo = MemoryRepository::new();
        repo.populate(&fixture_path()).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn can_add_and_retrieve_a_user() {
        let repo = repo().await;
        repo.add_user(User::new("Dave", "123456789").unwrap()).await.unwrap();

        let user = repo.get_user("Dave").await.unwrap().unwrap();
        assert_eq!(user.password(), "123456789");
    }

    #[tokio::test]
    async fn seeded_users_have_hashed_passwords() {
        let repo = repo().await;
        let user = repo.get_user("bmarshall7688").await.unwrap().unwrap();

        assert_eq!(user, User::new("bmarshall7688", "whatever").unwrap());
        assert!(password::verify("cLQ^C#oFXloS", user.password()));
    }

    #[tokio::test]
    async fn missing_user_is_none() {
        assert!(repo().await.get_user("prince").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_user_is_rejected() {
        let repo = repo().await;
        let err = repo.add_user(User::new("kilic20", "pw").unwrap()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn counts_and_adds_movies() {
        let repo = repo().await;
        assert_eq!(repo.get_number_of_movies().await.unwrap(), 10);

        repo.add_movie(Movie::new(11, "A Movie", 2014).unwrap()).await.unwrap();
        assert_eq!(repo.get_movie(11).await.unwrap().unwrap().title(), "A Movie");
        assert_eq!(repo.get_number_of_movies().await.unwrap(), 11);

        let err = repo.add_movie(Movie::new(11, "Again", 2014).unwrap()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn retrieves_movie_with_its_reviews() {
        let repo = repo().await;
        let movie = repo.get_movie(1).await.unwrap().unwrap();

        assert_eq!(movie.title(), "Guardians of the Galaxy");
        assert_eq!(movie.number_of_reviews(), 3);

        let reviews = repo.get_reviews_for_movie(1).await.unwrap();
        let ok = reviews.iter().find(|r| r.text() == "Eh, it was ok").unwrap();
        assert_eq!(ok.username(), "kilic20");
        assert!(movie.has_review(ok.id()));
    }

    #[tokio::test]
    async fn missing_movie_is_none() {
        assert!(repo().await.get_movie(1001).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn movies_by_rank() {
        let repo = repo().await;

        let movies = repo.get_movies_by_rank(3).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title(), "Split");

        let err = repo.get_movies_by_rank(1001).await.unwrap_err();
        assert!(matches!(err, RepositoryError::RankNotFound(1001)));
    }

    #[tokio::test]
    async fn first_and_last_movies() {
        let repo = repo().await;
        let first = repo.get_first_movie().await.unwrap().unwrap();
        assert_eq!(first.title(), "Guardians of the Galaxy");
        assert_eq!(repo.get_last_movie().await.unwrap().unwrap().title(), "Passengers");

        let empty = MemoryRepository::new();
        assert!(empty.get_first_movie().await.unwrap().is_none());
        assert!(empty.get_last_movie().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn neighbour_ranks() {
        let repo = repo().await;
        let first = repo.get_movie(1).await.unwrap().unwrap();
        let third = repo.get_movie(3).await.unwrap().unwrap();
        let sixth = repo.get_movie(6).await.unwrap().unwrap();
        let last = repo.get_movie(10).await.unwrap().unwrap();

        assert_eq!(repo.get_rank_of_previous_movie(&sixth).await.unwrap(), Some(5));
        assert_eq!(repo.get_rank_of_previous_movie(&first).await.unwrap(), None);
        assert_eq!(repo.get_rank_of_next_movie(&third).await.unwrap(), Some(4));
        assert_eq!(repo.get_rank_of_next_movie(&last).await.unwrap(), None);
    }

    #[tokio::test]
    async fn can_add_a_linked_review() {
        let repo = repo().await;
        let mut user = repo.get_user("kilic20").await.unwrap().unwrap();
        let mut movie = repo.get_movie(2).await.unwrap().unwrap();

        let review = Review::link(
            "Meh, could be better",
            date(2021, 3, 4).at(12, 0, 0, 0),
            &mut user,
            &mut movie,
        )
        .unwrap();
        let id = review.id();
        repo.add_review(review, &user, &movie).await.unwrap();

        assert!(repo.get_reviews().await.unwrap().iter().any(|r| r.id() == id));
        assert!(repo.get_user("kilic20").await.unwrap().unwrap().has_review(id));
        assert!(repo.get_movie(2).await.unwrap().unwrap().has_review(id));
    }

    #[tokio::test]
    async fn rejects_review_missing_from_user() {
        let repo = repo().await;
        let user = repo.get_user("kilic20").await.unwrap().unwrap();
        let mut movie = repo.get_movie(2).await.unwrap().unwrap();
        let review = Review::new(
            ReviewId::new(),
            "kilic20",
            2,
            "Meh, could be better",
            date(2021, 3, 4).at(12, 0, 0, 0),
        )
        .unwrap();
        movie.add_review(review.id());

        let err = repo.add_review(review, &user, &movie).await.unwrap_err();

        assert!(matches!(err, RepositoryError::ReviewNotLinkedToUser(_)));
        assert_eq!(repo.get_reviews().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rejects_review_linked_to_another_movie() {
        let repo = repo().await;
        let mut user = repo.get_user("kilic20").await.unwrap().unwrap();
        let mut movie = repo.get_movie(2).await.unwrap().unwrap();
        let other = repo.get_movie(3).await.unwrap().unwrap();
        let review =
            Review::link("Wrong movie", date(2021, 3, 4).at(12, 0, 0, 0), &mut user, &mut movie)
                .unwrap();

        let err = repo.add_review(review, &user, &other).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ReviewNotLinkedToMovie(2)));
    }

    #[tokio::test]
    async fn retrieves_all_reviews() {
        assert_eq!(repo().await.get_reviews().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn indexes_people_from_movies() {
        let repo = repo().await;

        let pratt = repo.get_actor("Chris Pratt").await.unwrap().unwrap();
        let diesel = repo.get_actor("Vin Diesel").await.unwrap().unwrap();
        let lawrence = repo.get_actor("Jennifer Lawrence").await.unwrap().unwrap();
        let stone = repo.get_actor("Emma Stone").await.unwrap().unwrap();

        assert!(pratt.worked_with(&diesel));
        assert!(pratt.worked_with(&lawrence));
        assert!(!pratt.worked_with(&stone));

        assert!(repo.get_genre("Sci-Fi").await.unwrap().is_some());
        assert!(repo.get_director("Ridley Scott").await.unwrap().is_some());
        assert!(repo.get_director("Nobody").await.unwrap().is_none());
    }
}
