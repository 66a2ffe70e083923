use std::{fmt, str::FromStr};

use jiff::civil::DateTime;
use uuid::Uuid;

use super::{Movie, User};
use crate::error::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReviewId(Uuid);

impl ReviewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ReviewId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A user's review of one movie.
///
/// The review itself is owned by the repository; the user and movie only keep
/// its id. Use [`Review::link`] so both sides learn about it.
#[derive(Clone, Debug)]
pub struct Review {
    id: ReviewId,
    username: String,
    movie_rank: i32,
    text: String,
    timestamp: DateTime,
}

impl Review {
    /// Builds a review without registering it anywhere.
    pub fn new(
        id: ReviewId,
        username: &str,
        movie_rank: i32,
        text: &str,
        timestamp: DateTime,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id,
            username: super::non_empty(username, "username")?,
            movie_rank,
            text: super::non_empty(text, "review text")?,
            timestamp,
        })
    }

    /// Builds a review and registers its id on both `user` and `movie`.
    pub fn link(
        text: &str,
        timestamp: DateTime,
        user: &mut User,
        movie: &mut Movie,
    ) -> Result<Self, DomainError> {
        let review = Self::new(ReviewId::new(), user.username(), movie.rank(), text, timestamp)?;
        user.add_review(review.id);
        movie.add_review(review.id);
        Ok(review)
    }

    pub fn id(&self) -> ReviewId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn movie_rank(&self) -> i32 {
        self.movie_rank
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime {
        self.timestamp
    }
}

impl PartialEq for Review {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.movie_rank == other.movie_rank
            && self.text == other.text
            && self.timestamp == other.timestamp
    }
}

impl Eq for Review {}
