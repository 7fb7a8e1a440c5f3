//! Storage proxies bound to one annotation destination.
//!
//! # Responsibility
//! - Own the connection, table, and column layout for one destination.
//! - Keep SQL assembly details inside the persistence boundary.
//!
//! # Invariants
//! - One store per destination; the registry enforces this by memoization.
//! - A store never reaches callers before its table exists.

pub mod annotation_store;
