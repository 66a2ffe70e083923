use std::{path::PathBuf, str::FromStr};

use anyhow::Context;

/// Which [`Repository`](crate::repository::Repository) backend to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepositoryKind {
    #[default]
    Memory,
    Database,
}

impl FromStr for RepositoryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "database" => Ok(Self::Database),
            other => anyhow::bail!("unknown repository kind `{other}`"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub data_path: PathBuf,
    pub repository: RepositoryKind,
    pub database_url: String,
    pub database_echo: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_path =
            std::env::var("DATA_PATH").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("data"));

        let repository = match std::env::var("REPOSITORY") {
            Ok(value) => value.parse().context("REPOSITORY")?,
            Err(_) => RepositoryKind::default(),
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movieshelf.db?mode=rwc".to_string());

        let database_echo = match std::env::var("DATABASE_ECHO") {
            Ok(value) => parse_flag(&value).context("DATABASE_ECHO")?,
            Err(_) => false,
        };

        Ok(Self { data_path, repository, database_url, database_echo })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, got `{other}`"),
    }
}
