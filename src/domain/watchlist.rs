use super::Movie;

/// An ordered list of distinct movies a user intends to watch.
#[derive(Clone, Debug, Default)]
pub struct WatchList {
    movies: Vec<Movie>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_movie(&mut self, movie: Movie) {
        if !self.movies.contains(&movie) {
            self.movies.push(movie);
        }
    }

    pub fn remove_movie(&mut self, movie: &Movie) {
        self.movies.retain(|m| m != movie);
    }

    pub fn select_movie_to_watch(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    pub fn first_movie(&self) -> Option<&Movie> {
        self.movies.first()
    }

    pub fn size(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Movie> {
        self.movies.iter()
    }
}

impl<'a> IntoIterator for &'a WatchList {
    type Item = &'a Movie;
    type IntoIter = std::slice::Iter<'a, Movie>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
