//! In-memory repositories - used when no database is configured, and as the
//! store behind service-level tests.

mod store;

pub use store::InMemoryStore;
