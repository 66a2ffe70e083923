use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("rank must be positive, got {0}")]
    InvalidRank(i32),
    #[error("year {0} is before 1900")]
    InvalidYear(i32),
    #[error("runtime should be a positive number of minutes")]
    InvalidRuntime,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("review not correctly attached to user {0}")]
    ReviewNotLinkedToUser(String),
    #[error("review not correctly attached to movie {0}")]
    ReviewNotLinkedToMovie(i32),
    #[error("no movie has rank {0}")]
    RankNotFound(i32),
    #[error("unknown user {0}")]
    UnknownUser(String),
    #[error("unknown movie {0}")]
    UnknownMovie(i32),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("{0} are not supported by this repository")]
    Unsupported(&'static str),
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error("failed to read {}: {source}", path.display())]
    Seed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("username {0} is already taken")]
    NameNotUnique(String),
    #[error("unknown user {0}")]
    UnknownUser(String),
    #[error("unknown movie {0}")]
    UnknownMovie(i32),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

pub type ServiceResult<T> = Result<T, ServiceError>;
