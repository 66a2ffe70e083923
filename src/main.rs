use std::sync::Arc;

use movieshelf::{build_state, config::Config, services::movies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movieshelf=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        repository = ?config.repository,
        data_path = %config.data_path.display(),
        "starting"
    );

    let state = build_state(config).await?;
    let repo = state.repository.as_ref();

    let count = repo.get_number_of_movies().await?;
    let first = movies::get_first_movie(repo).await?;
    let last = movies::get_last_movie(repo).await?;
    tracing::info!(
        movies = count,
        reviews = repo.get_reviews().await?.len(),
        first = first.as_ref().map(|m| m.title.as_str()).unwrap_or("-"),
        last = last.as_ref().map(|m| m.title.as_str()).unwrap_or("-"),
        "catalogue loaded"
    );

    state.shutdown().await?;
    Ok(())
}
