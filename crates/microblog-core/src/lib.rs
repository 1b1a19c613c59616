//! # Microblog Core
//!
//! The domain layer of Microblog: users, posts, the follow graph and the
//! feed computed over it. This crate contains pure business logic with zero
//! infrastructure dependencies; persistence and credentials are reached
//! through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
