//! This file serves as the root for all SeaORM entity modules.
//! The `users` table owns two association tables: favorite cities and
//! categories. Lifecycle rules for both live in `crate::repository`.

pub mod user;
pub mod user_category;
pub mod user_city;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::user::Entity as User;
    pub use super::user_category::Entity as UserCategory;
    pub use super::user_city::Entity as UserCity;
}
