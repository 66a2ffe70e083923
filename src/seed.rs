use std::path::{Path, PathBuf};

use jiff::civil::DateTime;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    domain::{Actor, Director, Genre, Movie},
    error::{DomainError, RepoResult, RepositoryError},
};

pub const MOVIES_FILE: &str = "Data1000Movies.csv";
pub const USERS_FILE: &str = "users.csv";
pub const REVIEWS_FILE: &str = "reviews.csv";

/// One row of the movie file: `rank, title, genre, description, director,
/// actors, year, runtime, rating, votes, revenue, metascore`.
#[derive(Clone, Debug, Deserialize)]
pub struct MovieRecord {
    pub rank: i32,
    pub title: String,
    pub genre: String,
    pub description: String,
    pub director: String,
    pub actors: String,
    pub year: i32,
    pub runtime: Option<u32>,
    pub rating: Option<f64>,
    pub votes: Option<u64>,
    pub revenue: Option<f64>,
    pub metascore: Option<u32>,
}

impl MovieRecord {
    pub fn to_movie(&self) -> Result<Movie, DomainError> {
        let mut movie = Movie::new(self.rank, &self.title, self.year)?;
        movie.set_description(&self.description);
        if !self.director.trim().is_empty() {
            movie.set_director(Director::new(&self.director)?);
        }
        for name in split_list(&self.genre) {
            movie.add_genre(Genre::new(name)?);
        }
        for name in split_list(&self.actors) {
            movie.add_actor(Actor::new(name)?);
        }
        if let Some(runtime) = self.runtime {
            movie.set_runtime_minutes(runtime)?;
        }
        movie.set_rating(self.rating);
        movie.set_votes(self.votes);
        movie.set_revenue(self.revenue);
        movie.set_metascore(self.metascore);
        Ok(movie)
    }
}

/// One row of the user file: `id, username, password` (plain text).
#[derive(Clone, Debug, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub password: String,
}

/// One row of the review file: `id, user_id, movie_id, text, timestamp`.
/// `user_id` refers to [`UserRecord::id`], `movie_id` to a movie rank.
#[derive(Clone, Debug, Deserialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub user_id: i32,
    pub movie_id: i32,
    pub text: String,
    pub timestamp: String,
}

impl ReviewRecord {
    pub fn parsed_timestamp(&self) -> RepoResult<DateTime> {
        self.timestamp.parse().map_err(|e| {
            RepositoryError::InvalidRow(format!(
                "review {} has timestamp {:?}: {e}",
                self.id, self.timestamp
            ))
        })
    }
}

/// Reads every data row of a seed file, skipping the header and trimming fields.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> RepoResult<Vec<T>> {
    let seed_err = |source| RepositoryError::Seed { path: path.to_path_buf(), source };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(seed_err)?;

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row.map_err(seed_err)?;
        out.push(row.deserialize(None).map_err(seed_err)?);
    }

    tracing::debug!(path = %path.display(), rows = out.len(), "read seed file");
    Ok(out)
}

pub fn movies_path(data_path: &Path) -> PathBuf {
    data_path.join(MOVIES_FILE)
}

pub fn users_path(data_path: &Path) -> PathBuf {
    data_path.join(USERS_FILE)
}

pub fn reviews_path(data_path: &Path) -> PathBuf {
    data_path.join(REVIEWS_FILE)
}

/// Splits a comma separated cell such as `"Action,Adventure, Sci-Fi"`.
pub fn split_list(cell: &str) -> impl Iterator<Item = &str> {
    cell.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}
