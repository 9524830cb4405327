// server/src/web/mod.rs

pub mod extractors;
pub mod handlers;
pub mod routes;
