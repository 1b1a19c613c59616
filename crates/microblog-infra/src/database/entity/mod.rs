//! SeaORM entities for the `users`, `posts` and `followers` tables.

pub mod follower;
pub mod post;
pub mod user;
