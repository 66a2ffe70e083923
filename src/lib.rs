pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod models;
pub mod password;
pub mod repository;
pub mod seed;
pub mod services;

use std::sync::Arc;

use crate::{
    config::{Config, RepositoryKind},
    repository::{DatabaseRepository, MemoryRepository, Repository},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repository: Arc<dyn Repository>,
    database: Option<DatabaseRepository>,
}

impl AppState {
    /// Releases backend resources. The state must not be used afterwards.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        if let Some(database) = &self.database {
            database.shutdown().await?;
        }
        Ok(())
    }
}

/// Builds the repository selected by `config` and fills it from the seed files.
///
/// A database that already holds movies is used as is.
pub async fn build_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    let (repository, database) = match config.repository {
        RepositoryKind::Memory => {
            let repo = MemoryRepository::new();
            repo.populate(&config.data_path).await?;
            (Arc::new(repo) as Arc<dyn Repository>, None)
        }
        RepositoryKind::Database => {
            let db = db::connect_and_migrate(&config.database_url, config.database_echo).await?;
            let repo = DatabaseRepository::new(db);
            if repo.get_number_of_movies().await? == 0 {
                repo.populate(&config.data_path).await?;
            } else {
                tracing::info!(url = %config.database_url, "database already seeded");
            }
            (Arc::new(repo.clone()) as Arc<dyn Repository>, Some(repo))
        }
    };

    Ok(AppState { config, repository, database })
}
