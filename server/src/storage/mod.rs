// server/src/storage/mod.rs

pub mod postgres;

pub use postgres::PgStateStore;
