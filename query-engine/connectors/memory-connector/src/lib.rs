//! A reference [`Store`](query_connector::Store) keeping every entity in memory.
//!
//! Filters are evaluated the way a relational backend joins: conditions on a to-many
//! relation bind one related member at a time, and a record is returned once per
//! matching combination of members.

#![deny(unsafe_code, rust_2018_idioms)]

mod evaluate;
mod operators;
mod store;

pub use store::MemoryStore;

type Result<T> = query_connector::Result<T>;
