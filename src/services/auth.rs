use tracing::{debug, warn};

use crate::{
    domain::User,
    error::{RepositoryError, ServiceError, ServiceResult},
    models::UserView,
    password,
    repository::Repository,
};

pub async fn add_user(repo: &dyn Repository, username: &str, password: &str) -> ServiceResult<()> {
    if repo.get_user(username).await?.is_some() {
        return Err(ServiceError::NameNotUnique(username.to_string()));
    }

    let user = User::new(username, &password::hash(password)?)?;
    match repo.add_user(user).await {
        Ok(()) => {}
        Err(RepositoryError::DuplicateKey(_)) => {
            return Err(ServiceError::NameNotUnique(username.to_string()));
        }
        Err(err) => return Err(err.into()),
    }
    debug!(username = %username, "registered user");
    Ok(())
}

pub async fn get_user(repo: &dyn Repository, username: &str) -> ServiceResult<UserView> {
    let user = repo
        .get_user(username)
        .await?
        .ok_or_else(|| ServiceError::UnknownUser(username.to_string()))?;
    Ok(UserView::from(&user))
}

/// Fails with [`ServiceError::AuthenticationFailed`] for unknown users and
/// wrong passwords alike.
pub async fn authenticate_user(
    repo: &dyn Repository,
    username: &str,
    password: &str,
) -> ServiceResult<()> {
    let authenticated = match repo.get_user(username).await? {
        Some(user) => password::verify(password, user.password()),
        None => false,
    };
    if !authenticated {
        warn!(username = %username, "authentication failed");
        return Err(ServiceError::AuthenticationFailed);
    }
    Ok(())
}
