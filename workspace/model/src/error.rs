use thiserror::Error;

/// Error types for the repository
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// `create` was called with a record that already has an id
    #[error("User {0} is already persisted")]
    AlreadyPersisted(i32),

    /// `save` was called with a record that has no id yet
    #[error("User has not been persisted yet")]
    NotPersisted,

    /// No user row with this id
    #[error("User {0} not found")]
    NotFound(i32),

    /// An association id that does not exist or belongs to another user
    #[error("{kind} {id} does not belong to user {user_id}")]
    AssociationNotFound {
        kind: &'static str,
        id: i32,
        user_id: i32,
    },
}

/// Type alias for Result with RepositoryError
pub type Result<T> = std::result::Result<T, RepositoryError>;
