//! Broker channel abstraction (publish side only).
//!
//! A `BrokerChannel` is the capability the publisher calls through: declare an
//! exchange, publish bytes under a routing key, close. Connection setup,
//! credentials and reconnection belong to whoever constructs the channel.
//!
//! ## Exchange semantics
//!
//! Declaring follows AMQP rules:
//! - Re-declaring an existing exchange with **identical** parameters is a no-op.
//! - Re-declaring with **different** parameters fails with `PreconditionFailed`.
//! - Publishing to an exchange that was never declared fails with `ExchangeNotFound`.
//!
//! Durable exchanges survive a broker restart, but a publisher must never assume
//! the exchange already exists; it declares before publishing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Routing behavior of an exchange.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// Deliver to queues whose binding key equals the routing key exactly.
    Direct,
    /// Deliver to every bound queue, ignoring the routing key.
    Fanout,
}

/// Exchange declaration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
}

impl ExchangeSpec {
    /// Durable direct exchange, the topology used for product notifications.
    pub fn direct_durable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExchangeKind::Direct,
            durable: true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("broker connection error: {0}")]
    Connection(String),

    #[error("exchange '{0}' not found")]
    ExchangeNotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("channel is closed")]
    Closed,
}

/// Outbound channel to a message broker.
///
/// Implementations must be `Send + Sync`; callers that need single-writer
/// discipline (see `ExchangePublisher`) serialize access themselves.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Declare (or confirm) an exchange. Idempotent for identical parameters.
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), ChannelError>;

    /// Publish `body` to `exchange` under `routing_key`. No broker confirm is awaited.
    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), ChannelError>;

    /// Release the channel. Closing an already-closed channel is a no-op.
    async fn close(&self) -> Result<(), ChannelError>;
}

#[async_trait]
impl<C> BrokerChannel for Arc<C>
where
    C: BrokerChannel + ?Sized,
{
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), ChannelError> {
        (**self).declare_exchange(spec).await
    }

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), ChannelError> {
        (**self).basic_publish(exchange, routing_key, body).await
    }

    async fn close(&self) -> Result<(), ChannelError> {
        (**self).close().await
    }
}
