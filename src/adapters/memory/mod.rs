//! In-memory adapters for tests and local development.

mod market_store;

pub use market_store::InMemoryMarketStore;
