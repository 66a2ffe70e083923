use jiff::civil::DateTime;
use serde::Serialize;

use crate::domain::{Actor, Genre, Movie, Review, User};

#[derive(Clone, Debug, Serialize)]
pub struct MovieView {
    pub rank: i32,
    pub title: String,
    pub year: i32,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub runtime: Option<u32>,
    pub rating: Option<f64>,
    pub metascore: Option<u32>,
    pub reviews: Vec<ReviewView>,
}

impl MovieView {
    pub fn new(movie: &Movie, reviews: &[Review]) -> Self {
        Self {
            rank: movie.rank(),
            title: movie.title().to_string(),
            year: movie.year(),
            description: movie.description().map(str::to_string),
            director: movie.director().map(|d| d.name().to_string()),
            genres: movie.genres().iter().map(Genre::name).map(str::to_string).collect(),
            actors: movie.actors().iter().map(Actor::full_name).map(str::to_string).collect(),
            runtime: movie.runtime_minutes(),
            rating: movie.rating(),
            metascore: movie.metascore(),
            reviews: reviews.iter().map(ReviewView::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewView {
    pub username: String,
    pub movie_rank: i32,
    pub review_text: String,
    pub timestamp: DateTime,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            username: review.username().to_string(),
            movie_rank: review.movie_rank(),
            review_text: review.text().to_string(),
            timestamp: review.timestamp(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserView {
    pub username: String,
    pub reviews: usize,
    pub minutes_watched: u64,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            username: user.username().to_string(),
            reviews: user.reviews().len(),
            minutes_watched: user.minutes_watched(),
        }
    }
}

/// One page of the rank browser.
#[derive(Clone, Debug, Serialize)]
pub struct RankedMovies {
    pub movies: Vec<MovieView>,
    pub previous_rank: Option<i32>,
    pub next_rank: Option<i32>,
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn user_view_hides_credentials() {
        let mut user = User::new("dbowie", "$argon2id$hash").unwrap();
        user.add_review(crate::domain::ReviewId::new());

        let json = serde_json::to_value(UserView::from(&user)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "username": "dbowie", "reviews": 1, "minutes_watched": 0 })
        );
    }

    #[test]
    fn movie_view_embeds_reviews_without_ids() {
        let mut movie = Movie::new(3, "Split", 2016).unwrap();
        let mut user = User::new("kilic20", "hash").unwrap();
        let timestamp = date(2020, 3, 1).at(18, 45, 10, 0);
        let review = Review::link("Tense", timestamp, &mut user, &mut movie).unwrap();

        let json = serde_json::to_value(MovieView::new(&movie, &[review])).unwrap();

        assert_eq!(json["title"], "Split");
        assert_eq!(json["reviews"][0]["username"], "kilic20");
        assert_eq!(json["reviews"][0]["review_text"], "Tense");
        assert!(json["reviews"][0].get("id").is_none());
    }
}
