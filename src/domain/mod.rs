mod actor;
mod director;
mod genre;
mod movie;
mod review;
mod user;
mod watchlist;

pub use actor::Actor;
pub use director::Director;
pub use genre::Genre;
pub use movie::Movie;
pub use review::{Review, ReviewId};
pub use user::User;
pub use watchlist::WatchList;

use crate::error::DomainError;

/// Trims `value`, rejecting it when nothing is left.
pub(crate) fn non_empty(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Empty(field));
    }
    Ok(trimmed.to_string())
}
