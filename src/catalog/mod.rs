//! Mission and reward catalogs
//!
//! [`CatalogAdmin`] is the admin-only write side; [`CatalogBrowser`] is what
//! students see, annotated with their own progress.

mod admin;
mod browse;

pub use admin::CatalogAdmin;
pub use browse::{CatalogBrowser, MissionListing, RewardListing};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("only admins can manage the catalog")]
    Forbidden,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
