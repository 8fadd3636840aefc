//! Integration events and their publication mechanics.
//!
//! Transport-agnostic: the broker is reached through `BrokerChannel`. The
//! in-memory broker lives here for tests/dev; infrastructure-backed channels
//! live in `catalog-infra`.

pub mod channel;
pub mod event;
pub mod in_memory_broker;
pub mod publisher;

pub use channel::{BrokerChannel, ChannelError, ExchangeKind, ExchangeSpec};
pub use event::IntegrationEvent;
pub use in_memory_broker::{Delivery, InMemoryBroker, InMemoryChannel, Subscription};
pub use publisher::{
    DEFAULT_EXCHANGE, ExchangePublisher, MessagePublisher, PublishError, RecordingPublisher,
};
