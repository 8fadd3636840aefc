//! Broker channels backed by real infrastructure.
//!
//! The in-memory channel lives in `catalog-events`; this module holds the
//! networked ones, gated behind their crate features.

#[cfg(feature = "redis")]
pub mod redis_exchange;

#[cfg(feature = "redis")]
pub use redis_exchange::RedisExchangeChannel;
