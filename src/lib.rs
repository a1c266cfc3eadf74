pub mod app;
pub mod barter;
pub mod core;
pub mod listings;
pub mod market;
pub mod routes;
pub mod session;

pub use app::{AppState, MarketStatus};
