//! Data model for users with their favorite cities and categories.

pub mod entities;
pub mod error;
pub mod repository;
pub mod user_record;

pub use error::RepositoryError;
pub use user_record::{UserCategory, UserCity, UserRecord};
