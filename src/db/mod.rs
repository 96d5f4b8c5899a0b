//! Database layer
//!
//! MongoDB storage for projects, ratings, polls, comments and profiles,
//! behind the [`FeedbackStore`] trait.

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::InMemoryStore;
pub use mongo::{MongoClient, MongoCollection};
pub use store::{FeedbackStore, MongoStore};
