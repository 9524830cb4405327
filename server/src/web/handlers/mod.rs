// server/src/web/handlers/mod.rs

pub mod adoption_handlers;
pub mod listing_handlers;
pub mod order_handlers;
