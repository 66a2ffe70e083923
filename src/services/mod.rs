//! Orchestration over a [`Repository`](crate::repository::Repository).
//!
//! Every function takes the active repository explicitly and returns plain
//! views from [`crate::models`].

pub mod auth;
pub mod movies;
