pub mod cache;
pub mod client;
pub mod provider;
pub mod types;

pub use provider::PriceHistoryProvider;
