use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use super::{Actor, Director, Genre, ReviewId};
use crate::error::DomainError;

const EARLIEST_YEAR: i32 = 1900;

/// A catalogue entry. `rank` is the natural key and never changes after
/// construction.
#[derive(Clone, Debug)]
pub struct Movie {
    rank: i32,
    title: String,
    year: i32,
    description: Option<String>,
    director: Option<Director>,
    genres: Vec<Genre>,
    actors: Vec<Actor>,
    runtime_minutes: Option<u32>,
    rating: Option<f64>,
    votes: Option<u64>,
    revenue: Option<f64>,
    metascore: Option<u32>,
    reviews: Vec<ReviewId>,
}

impl Movie {
    pub fn new(rank: i32, title: &str, year: i32) -> Result<Self, DomainError> {
        if rank < 1 {
            return Err(DomainError::InvalidRank(rank));
        }
        if year < EARLIEST_YEAR {
            return Err(DomainError::InvalidYear(year));
        }
        Ok(Self {
            rank,
            title: super::non_empty(title, "title")?,
            year,
            description: None,
            director: None,
            genres: Vec::new(),
            actors: Vec::new(),
            runtime_minutes: None,
            rating: None,
            votes: None,
            revenue: None,
            metascore: None,
            reviews: Vec::new(),
        })
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), DomainError> {
        self.title = super::non_empty(title, "title")?;
        Ok(())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn set_year(&mut self, year: i32) -> Result<(), DomainError> {
        if year < EARLIEST_YEAR {
            return Err(DomainError::InvalidYear(year));
        }
        self.year = year;
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Blank descriptions are stored as absent.
    pub fn set_description(&mut self, description: &str) {
        let description = description.trim();
        self.description = (!description.is_empty()).then(|| description.to_string());
    }

    pub fn director(&self) -> Option<&Director> {
        self.director.as_ref()
    }

    pub fn set_director(&mut self, director: Director) {
        self.director = Some(director);
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn add_genre(&mut self, genre: Genre) {
        if !self.genres.contains(&genre) {
            self.genres.push(genre);
        }
    }

    pub fn remove_genre(&mut self, genre: &Genre) {
        self.genres.retain(|g| g != genre);
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn add_actor(&mut self, actor: Actor) {
        if !self.actors.contains(&actor) {
            self.actors.push(actor);
        }
    }

    pub fn remove_actor(&mut self, actor: &Actor) {
        self.actors.retain(|a| a != actor);
    }

    pub fn runtime_minutes(&self) -> Option<u32> {
        self.runtime_minutes
    }

    pub fn set_runtime_minutes(&mut self, minutes: u32) -> Result<(), DomainError> {
        if minutes == 0 {
            return Err(DomainError::InvalidRuntime);
        }
        self.runtime_minutes = Some(minutes);
        Ok(())
    }

    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    pub fn set_rating(&mut self, rating: Option<f64>) {
        self.rating = rating;
    }

    pub fn votes(&self) -> Option<u64> {
        self.votes
    }

    pub fn set_votes(&mut self, votes: Option<u64>) {
        self.votes = votes;
    }

    /// Box office revenue in millions.
    pub fn revenue(&self) -> Option<f64> {
        self.revenue
    }

    pub fn set_revenue(&mut self, revenue: Option<f64>) {
        self.revenue = revenue;
    }

    pub fn metascore(&self) -> Option<u32> {
        self.metascore
    }

    pub fn set_metascore(&mut self, metascore: Option<u32>) {
        self.metascore = metascore;
    }

    pub fn reviews(&self) -> &[ReviewId] {
        &self.reviews
    }

    pub fn number_of_reviews(&self) -> usize {
        self.reviews.len()
    }

    pub fn has_review(&self, id: ReviewId) -> bool {
        self.reviews.contains(&id)
    }

    /// Reviews are append-only.
    pub fn add_review(&mut self, id: ReviewId) {
        if !self.has_review(id) {
            self.reviews.push(id);
        }
    }
}

// Equality and ordering share the (rank, year) key. Stored ranks are unique,
// so within one repository this is identity by rank.
impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Movie {}

impl PartialOrd for Movie {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Movie {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank).then(self.year.cmp(&other.year))
    }
}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
    }
}
