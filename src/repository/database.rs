use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use async_trait::async_trait;
use jiff::civil::DateTime;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement, TransactionTrait, Value,
};
use tracing::{debug, info};

use super::{Repository, audit_linkage};
use crate::{
    domain::{Actor, Director, Genre, Movie, Review, ReviewId, User},
    entities::{movie, review, user},
    error::{RepoResult, RepositoryError},
    password,
    seed::{self, MovieRecord, ReviewRecord, UserRecord},
};

const INSERT_MOVIE: &str = "INSERT INTO movies \
    (rank, title, genre, description, director, actors, year, \
    runtime, rating, votes, revenue, metascore) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const INSERT_USER: &str = "INSERT INTO users (id, username, password) VALUES (?, ?, ?)";

const INSERT_REVIEW: &str =
    "INSERT INTO reviews (id, user_id, movie_rank, review, timestamp) VALUES (?, ?, ?, ?, ?)";

/// Relational storage through sea-orm.
///
/// Every write runs in its own transaction; a transaction that is dropped
/// before `commit` rolls back, so a failed write leaves nothing behind.
#[derive(Clone)]
pub struct DatabaseRepository {
    db: DatabaseConnection,
}

impl DatabaseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Closes the connection pool shared by every clone of this repository.
    pub async fn shutdown(&self) -> RepoResult<()> {
        self.db.clone().close().await?;
        info!("database pool closed");
        Ok(())
    }

    /// Bulk loads the seed files with plain INSERT statements in a single
    /// transaction. Review rows get fresh ids.
    pub async fn populate(&self, data_path: &Path) -> RepoResult<()> {
        let movies: Vec<MovieRecord> = seed::read_records(&seed::movies_path(data_path))?;
        let users: Vec<UserRecord> = seed::read_records(&seed::users_path(data_path))?;
        let reviews: Vec<ReviewRecord> = seed::read_records(&seed::reviews_path(data_path))?;

        let backend = self.db.get_database_backend();
        let txn = self.db.begin().await?;

        for record in &movies {
            record.to_movie()?;
            let values: [Value; 12] = [
                record.rank.into(),
                record.title.clone().into(),
                record.genre.clone().into(),
                record.description.clone().into(),
                record.director.clone().into(),
                record.actors.clone().into(),
                record.year.into(),
                record.runtime.and_then(|m| i32::try_from(m).ok()).into(),
                record.rating.into(),
                record.votes.and_then(|v| i64::try_from(v).ok()).into(),
                record.revenue.into(),
                record.metascore.and_then(|m| i32::try_from(m).ok()).into(),
            ];
            txn.execute(Statement::from_sql_and_values(backend, INSERT_MOVIE, values)).await?;
        }

        for record in &users {
            let values: [Value; 3] = [
                record.id.into(),
                record.username.clone().into(),
                password::hash(&record.password)?.into(),
            ];
            txn.execute(Statement::from_sql_and_values(backend, INSERT_USER, values)).await?;
        }

        for record in &reviews {
            let values: [Value; 5] = [
                ReviewId::new().to_string().into(),
                record.user_id.into(),
                record.movie_id.into(),
                record.text.clone().into(),
                record.parsed_timestamp()?.to_string().into(),
            ];
            txn.execute(Statement::from_sql_and_values(backend, INSERT_REVIEW, values)).await?;
        }

        txn.commit().await?;

        info!(
            movies = movies.len(),
            users = users.len(),
            reviews = reviews.len(),
            "populated database repository"
        );
        Ok(())
    }

    async fn to_movie(&self, model: movie::Model) -> RepoResult<Movie> {
        let mut movie = Movie::new(model.rank, &model.title, model.year)?;
        movie.set_description(&model.description);
        if !model.director.trim().is_empty() {
            movie.set_director(Director::new(&model.director)?);
        }
        for name in seed::split_list(&model.genre) {
            movie.add_genre(Genre::new(name)?);
        }
        for name in seed::split_list(&model.actors) {
            movie.add_actor(Actor::new(name)?);
        }
        if let Some(runtime) = model.runtime {
            let minutes = u32::try_from(runtime).map_err(|_| {
                RepositoryError::InvalidRow(format!("movie {} has runtime {runtime}", model.rank))
            })?;
            movie.set_runtime_minutes(minutes)?;
        }
        movie.set_rating(model.rating);
        movie.set_votes(model.votes.and_then(|v| u64::try_from(v).ok()));
        movie.set_revenue(model.revenue);
        movie.set_metascore(model.metascore.and_then(|m| u32::try_from(m).ok()));

        for id in review_ids(&self.db, review::Column::MovieRank, model.rank).await? {
            movie.add_review(id);
        }
        Ok(movie)
    }

    async fn to_reviews(&self, rows: Vec<review::Model>) -> RepoResult<Vec<Review>> {
        let user_ids: HashSet<i32> = rows.iter().map(|r| r.user_id).collect();
        let usernames: HashMap<i32, String> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        rows.into_iter()
            .map(|row| -> RepoResult<Review> {
                let username = usernames.get(&row.user_id).ok_or_else(|| {
                    RepositoryError::InvalidRow(format!(
                        "review {} refers to missing user {}",
                        row.id, row.user_id
                    ))
                })?;
                let timestamp = row.timestamp.parse::<DateTime>().map_err(|e| {
                    RepositoryError::InvalidRow(format!("review {} timestamp: {e}", row.id))
                })?;
                Ok(Review::new(
                    parse_review_id(&row.id)?,
                    username,
                    row.movie_rank,
                    &row.review,
                    timestamp,
                )?)
            })
            .collect()
    }
}

#[async_trait]
impl Repository for DatabaseRepository {
    async fn add_movie(&self, movie: Movie) -> RepoResult<()> {
        let model = movie::ActiveModel {
            rank: Set(movie.rank()),
            title: Set(movie.title().to_string()),
            genre: Set(join_names(movie.genres().iter().map(Genre::name))),
            description: Set(movie.description().unwrap_or_default().to_string()),
            director: Set(movie.director().map(|d| d.name().to_string()).unwrap_or_default()),
            actors: Set(join_names(movie.actors().iter().map(Actor::full_name))),
            year: Set(movie.year()),
            runtime: Set(movie.runtime_minutes().and_then(|m| i32::try_from(m).ok())),
            rating: Set(movie.rating()),
            votes: Set(movie.votes().and_then(|v| i64::try_from(v).ok())),
            revenue: Set(movie.revenue()),
            metascore: Set(movie.metascore().and_then(|m| i32::try_from(m).ok())),
        };

        let txn = self.db.begin().await?;
        movie::Entity::insert(model)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| unique_violation(e, || format!("movie rank {}", movie.rank())))?;
        txn.commit().await?;

        debug!(rank = movie.rank(), "added movie");
        Ok(())
    }

    async fn get_movie(&self, rank: i32) -> RepoResult<Option<Movie>> {
        let rows = movie::Entity::find()
            .filter(movie::Column::Rank.eq(rank))
            .limit(2)
            .all(&self.db)
            .await?;
        match single(rows, || format!("movie rank {rank}"))? {
            Some(model) => Ok(Some(self.to_movie(model).await?)),
            None => Ok(None),
        }
    }

    async fn get_movies_by_rank(&self, rank: i32) -> RepoResult<Vec<Movie>> {
        let rows = movie::Entity::find().filter(movie::Column::Rank.eq(rank)).all(&self.db).await?;
        if rows.is_empty() {
            return Err(RepositoryError::RankNotFound(rank));
        }
        let mut movies = Vec::with_capacity(rows.len());
        for model in rows {
            movies.push(self.to_movie(model).await?);
        }
        Ok(movies)
    }

    async fn get_first_movie(&self) -> RepoResult<Option<Movie>> {
        match movie::Entity::find().order_by_asc(movie::Column::Rank).one(&self.db).await? {
            Some(model) => Ok(Some(self.to_movie(model).await?)),
            None => Ok(None),
        }
    }

    async fn get_last_movie(&self) -> RepoResult<Option<Movie>> {
        match movie::Entity::find().order_by_desc(movie::Column::Rank).one(&self.db).await? {
            Some(model) => Ok(Some(self.to_movie(model).await?)),
            None => Ok(None),
        }
    }

    async fn get_rank_of_previous_movie(&self, movie: &Movie) -> RepoResult<Option<i32>> {
        let previous = movie::Entity::find()
            .filter(movie::Column::Rank.lt(movie.rank()))
            .order_by_desc(movie::Column::Rank)
            .one(&self.db)
            .await?;
        Ok(previous.map(|m| m.rank))
    }

    async fn get_rank_of_next_movie(&self, movie: &Movie) -> RepoResult<Option<i32>> {
        let next = movie::Entity::find()
            .filter(movie::Column::Rank.gt(movie.rank()))
            .order_by_asc(movie::Column::Rank)
            .one(&self.db)
            .await?;
        Ok(next.map(|m| m.rank))
    }

    async fn get_number_of_movies(&self) -> RepoResult<usize> {
        let count = movie::Entity::find().count(&self.db).await?;
        usize::try_from(count)
            .map_err(|_| RepositoryError::InvalidRow(format!("movie count {count} out of range")))
    }

    async fn add_user(&self, user: User) -> RepoResult<()> {
        let model = user::ActiveModel {
            id: Default::default(),
            username: Set(user.username().to_string()),
            password: Set(user.password().to_string()),
        };

        let txn = self.db.begin().await?;
        user::Entity::insert(model)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| unique_violation(e, || format!("username {}", user.username())))?;
        txn.commit().await?;

        debug!(username = %user.username(), "added user");
        Ok(())
    }

    async fn get_user(&self, username: &str) -> RepoResult<Option<User>> {
        let rows = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .limit(2)
            .all(&self.db)
            .await?;
        let Some(model) = single(rows, || format!("username {username}"))? else {
            return Ok(None);
        };

        let mut user = User::new(&model.username, &model.password)?;
        for id in review_ids(&self.db, review::Column::UserId, model.id).await? {
            user.add_review(id);
        }
        Ok(Some(user))
    }

    async fn add_review(&self, review: Review, user: &User, movie: &Movie) -> RepoResult<()> {
        audit_linkage(&review, user, movie)?;

        let txn = self.db.begin().await?;
        let user_row = user::Entity::find()
            .filter(user::Column::Username.eq(review.username()))
            .one(&txn)
            .await?
            .ok_or_else(|| RepositoryError::UnknownUser(review.username().to_string()))?;
        if movie::Entity::find_by_id(review.movie_rank()).one(&txn).await?.is_none() {
            return Err(RepositoryError::UnknownMovie(review.movie_rank()));
        }

        let model = review::ActiveModel {
            id: Set(review.id().to_string()),
            user_id: Set(user_row.id),
            movie_rank: Set(review.movie_rank()),
            review: Set(review.text().to_string()),
            timestamp: Set(review.timestamp().to_string()),
        };
        review::Entity::insert(model).exec_without_returning(&txn).await?;
        txn.commit().await?;

        debug!(
            review = %review.id(),
            username = %review.username(),
            rank = review.movie_rank(),
            "added review"
        );
        Ok(())
    }

    async fn get_reviews(&self) -> RepoResult<Vec<Review>> {
        let rows =
            review::Entity::find().order_by_asc(review::Column::Timestamp).all(&self.db).await?;
        self.to_reviews(rows).await
    }

    async fn get_reviews_for_movie(&self, rank: i32) -> RepoResult<Vec<Review>> {
        let rows = review::Entity::find()
            .filter(review::Column::MovieRank.eq(rank))
            .order_by_asc(review::Column::Timestamp)
            .all(&self.db)
            .await?;
        self.to_reviews(rows).await
    }

    /// Checks a pooled connection out and back in. The pool replaces broken
    /// connections on checkout, so this also recovers after a dropped one.
    async fn reset_session(&self) -> RepoResult<()> {
        self.db.ping().await?;
        debug!("session reset");
        Ok(())
    }

    /// No transaction outlives a single call, so the pool stays open here.
    /// Use [`DatabaseRepository::shutdown`] to release it.
    async fn close_session(&self) -> RepoResult<()> {
        debug!("session closed");
        Ok(())
    }
}

/// More than one row for a key means the uniqueness constraint is gone.
fn single<T>(mut rows: Vec<T>, key: impl FnOnce() -> String) -> RepoResult<Option<T>> {
    if rows.len() > 1 {
        return Err(RepositoryError::DuplicateKey(key()));
    }
    Ok(rows.pop())
}

fn unique_violation(err: DbErr, key: impl FnOnce() -> String) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepositoryError::DuplicateKey(key()),
        _ => err.into(),
    }
}

/// Review ids on one movie or user, oldest review first.
async fn review_ids(
    db: &DatabaseConnection,
    column: review::Column,
    value: i32,
) -> RepoResult<Vec<ReviewId>> {
    let rows = review::Entity::find()
        .filter(column.eq(value))
        .order_by_asc(review::Column::Timestamp)
        .all(db)
        .await?;
    rows.iter().map(|row| parse_review_id(&row.id)).collect()
}

fn parse_review_id(raw: &str) -> RepoResult<ReviewId> {
    raw.parse().map_err(|e| RepositoryError::InvalidRow(format!("review id {raw:?}: {e}")))
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use tempfile::TempDir;

    use super::*;
    use crate::{db, repository::MemoryRepository, seed::fixture_path};

    async fn repo() -> (TempDir, DatabaseRepository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("movies.db").display());
        let db = db::connect_and_migrate(&url, false).await.unwrap();
        let repo = DatabaseRepository::new(db);
        repo.populate(&fixture_path()).await.unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn can_add_and_retrieve_a_user() {
        let (_dir, repo) = repo().await;
        repo.add_user(User::new("Dave", "123456789").unwrap()).await.unwrap();

        let user = repo.get_user("Dave").await.unwrap().unwrap();
        assert_eq!(user.username(), "Dave");
        assert_eq!(user.password(), "123456789");
        assert!(repo.get_user("prince").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_duplicate_key() {
        let (_dir, repo) = repo().await;
        let err = repo.add_user(User::new("kilic20", "pw").unwrap()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn seeded_movie_round_trips() {
        let (_dir, repo) = repo().await;
        let movie = repo.get_movie(8).await.unwrap().unwrap();

        assert_eq!(movie.title(), "Mindhorn");
        assert_eq!(movie.revenue(), None);
        assert_eq!(movie.metascore(), Some(71));
        assert_eq!(movie.runtime_minutes(), Some(89));
        assert_eq!(movie.genres().len(), 1);
        assert_eq!(movie.actors().len(), 4);
        assert!(repo.get_movie(1001).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn added_movie_keeps_people() {
        let (_dir, repo) = repo().await;
        let mut movie = Movie::new(11, "A Movie", 2014).unwrap();
        movie.set_director(Director::new("Someone").unwrap());
        movie.add_genre(Genre::new("Drama").unwrap());
        movie.add_actor(Actor::new("First Actor").unwrap());
        movie.add_actor(Actor::new("Second Actor").unwrap());
        movie.set_runtime_minutes(95).unwrap();
        repo.add_movie(movie).await.unwrap();

        let stored = repo.get_movie(11).await.unwrap().unwrap();
        assert_eq!(stored.director().map(Director::name), Some("Someone"));
        assert_eq!(stored.actors().len(), 2);
        assert_eq!(stored.runtime_minutes(), Some(95));
        assert_eq!(repo.get_number_of_movies().await.unwrap(), 11);
    }

    #[tokio::test]
    async fn neighbour_ranks_skip_gaps() {
        let (_dir, repo) = repo().await;
        repo.add_movie(Movie::new(20, "Far Away", 2016).unwrap()).await.unwrap();

        let last_dense = repo.get_movie(10).await.unwrap().unwrap();
        let far = repo.get_movie(20).await.unwrap().unwrap();
        let first = repo.get_movie(1).await.unwrap().unwrap();

        assert_eq!(repo.get_rank_of_next_movie(&last_dense).await.unwrap(), Some(20));
        assert_eq!(repo.get_rank_of_previous_movie(&far).await.unwrap(), Some(10));
        assert_eq!(repo.get_rank_of_next_movie(&far).await.unwrap(), None);
        assert_eq!(repo.get_rank_of_previous_movie(&first).await.unwrap(), None);
    }

    #[tokio::test]
    async fn movies_by_rank() {
        let (_dir, repo) = repo().await;
        assert_eq!(repo.get_movies_by_rank(3).await.unwrap()[0].title(), "Split");
        assert!(matches!(
            repo.get_movies_by_rank(1001).await.unwrap_err(),
            RepositoryError::RankNotFound(1001)
        ));
    }

    #[tokio::test]
    async fn seeded_reviews_are_linked() {
        let (_dir, repo) = repo().await;

        let reviews = repo.get_reviews().await.unwrap();
        assert_eq!(reviews.len(), 3);

        let movie = repo.get_movie(1).await.unwrap().unwrap();
        assert_eq!(movie.number_of_reviews(), 3);

        let kilic = repo.get_user("kilic20").await.unwrap().unwrap();
        let ok = reviews.iter().find(|r| r.text() == "Eh, it was ok").unwrap();
        assert_eq!(ok.username(), "kilic20");
        assert!(kilic.has_review(ok.id()));
        assert_eq!(ok.timestamp(), date(2020, 2, 29).at(9, 12, 3, 0));
    }

    #[tokio::test]
    async fn can_add_a_linked_review() {
        let (_dir, repo) = repo().await;
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

        assert!(repo.get_user("kilic20").await.unwrap().unwrap().has_review(id));
        assert!(repo.get_movie(2).await.unwrap().unwrap().has_review(id));
        assert_eq!(repo.get_reviews_for_movie(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unlinked_review_is_not_stored() {
        let (_dir, repo) = repo().await;
        let user = repo.get_user("kilic20").await.unwrap().unwrap();
        let movie = repo.get_movie(2).await.unwrap().unwrap();
        let review =
            Review::new(ReviewId::new(), "kilic20", 2, "Orphan", date(2021, 3, 4).at(12, 0, 0, 0))
                .unwrap();

        let err = repo.add_review(review, &user, &movie).await.unwrap_err();

        assert!(matches!(err, RepositoryError::ReviewNotLinkedToUser(_)));
        assert_eq!(repo.get_reviews().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn people_lookups_are_unsupported() {
        let (_dir, repo) = repo().await;
        assert!(matches!(
            repo.get_actor("Chris Pratt").await.unwrap_err(),
            RepositoryError::Unsupported("actors")
        ));
        assert!(matches!(
            repo.add_genre(Genre::new("Drama").unwrap()).await.unwrap_err(),
            RepositoryError::Unsupported("genres")
        ));
    }

    #[tokio::test]
    async fn matches_memory_backend() {
        let (_dir, database) = repo().await;
        let memory = MemoryRepository::new();
        memory.populate(&fixture_path()).await.unwrap();

        assert_eq!(
            database.get_number_of_movies().await.unwrap(),
            memory.get_number_of_movies().await.unwrap()
        );
        assert_eq!(
            database.get_first_movie().await.unwrap().unwrap(),
            memory.get_first_movie().await.unwrap().unwrap()
        );
        assert_eq!(
            database.get_last_movie().await.unwrap().unwrap(),
            memory.get_last_movie().await.unwrap().unwrap()
        );
        assert_eq!(database.get_reviews().await.unwrap(), memory.get_reviews().await.unwrap());
    }

    #[tokio::test]
    async fn sessions_can_be_reopened_per_request() {
        let (_dir, repo) = repo().await;

        repo.reset_session().await.unwrap();
        assert_eq!(repo.get_movie(1).await.unwrap().unwrap().title(), "Guardians of the Galaxy");
        repo.close_session().await.unwrap();

        repo.reset_session().await.unwrap();
        repo.add_user(User::new("second_request", "pw").unwrap()).await.unwrap();
        assert!(repo.get_user("second_request").await.unwrap().is_some());
        repo.close_session().await.unwrap();

        repo.reset_session().await.unwrap();
        assert_eq!(repo.get_number_of_movies().await.unwrap(), 10);
        repo.close_session().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_closes_the_pool() {
        let (_dir, repo) = repo().await;
        let other = repo.clone();

        repo.shutdown().await.unwrap();

        assert!(other.get_movie(1).await.is_err());
        assert!(other.reset_session().await.is_err());
    }
}
