use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use super::{Movie, ReviewId};
use crate::error::DomainError;

/// A registered user. `password` holds a hash, never the plain text.
#[derive(Clone, Debug)]
pub struct User {
    username: String,
    password: String,
    watched_movies: Vec<i32>,
    reviews: Vec<ReviewId>,
    minutes_watched: u64,
}

impl User {
    pub fn new(username: &str, password: &str) -> Result<Self, DomainError> {
        Ok(Self {
            username: super::non_empty(username, "username")?,
            password: super::non_empty(password, "password")?,
            watched_movies: Vec::new(),
            reviews: Vec::new(),
            minutes_watched: 0,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Ranks of watched movies, in watch order.
    pub fn watched_movies(&self) -> &[i32] {
        &self.watched_movies
    }

    pub fn minutes_watched(&self) -> u64 {
        self.minutes_watched
    }

    pub fn watch_movie(&mut self, movie: &Movie) {
        if self.watched_movies.contains(&movie.rank()) {
            return;
        }
        self.watched_movies.push(movie.rank());
        self.minutes_watched += u64::from(movie.runtime_minutes().unwrap_or(0));
    }

    pub fn reviews(&self) -> &[ReviewId] {
        &self.reviews
    }

    pub fn has_review(&self, id: ReviewId) -> bool {
        self.reviews.contains(&id)
    }

    pub fn add_review(&mut self, id: ReviewId) {
        if !self.has_review(id) {
            self.reviews.push(id);
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Eq for User {}

impl PartialOrd for User {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for User {
    fn cmp(&self, other: &Self) -> Ordering {
        self.username.cmp(&other.username)
    }
}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.username.hash(state);
    }
}
