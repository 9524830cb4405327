// server/src/lib.rs

//! HTTP surface over the `leash` transition engine: actix-web handlers,
//! header-based caller identity, and the Postgres or in-memory state store.

pub mod config;
pub mod errors;
pub mod state;
pub mod storage;
pub mod web;
