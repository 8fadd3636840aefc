//! Message publication onto a broker exchange.
//!
//! `MessagePublisher` is the seam the mutation pipeline publishes through;
//! `ExchangePublisher` is the broker-backed implementation that owns the
//! outbound channel.
//!
//! ## Lifecycle
//!
//! ```text
//! Connected ──shutdown()──▶ Closed (terminal)
//! ```
//!
//! - While **Connected**, `publish` serializes the message, declares the
//!   exchange (idempotent) and publishes under the routing key.
//! - Once **Closed**, every `publish` fails with `PublishError::ChannelClosed`.
//!   `shutdown` on a closed publisher is a no-op.
//!
//! There is no reconnect-and-retry here. Whoever supervises the process decides
//! what to do with a failed publish.
//!
//! ## Concurrency
//!
//! A publisher is shared by every in-flight request. Channel use is serialized
//! behind an async mutex (single writer), held only for the declare + publish
//! round trip; serialization happens before the lock is taken.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::channel::{BrokerChannel, ChannelError, ExchangeSpec};

/// Exchange that carries product notifications.
pub const DEFAULT_EXCHANGE: &str = "products.exchange";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("failed to serialize message: {0}")]
    Serialize(String),

    #[error("broker channel error: {0}")]
    Channel(ChannelError),

    #[error("publisher channel is closed")]
    ChannelClosed,
}

impl From<ChannelError> for PublishError {
    fn from(value: ChannelError) -> Self {
        match value {
            ChannelError::Closed => PublishError::ChannelClosed,
            other => PublishError::Channel(other),
        }
    }
}

/// Publish-side contract used by the mutation pipeline.
///
/// Calls are fire-and-forget from the caller's perspective (no broker
/// acknowledgment is awaited), but connection-level failures are returned,
/// never swallowed.
#[async_trait]
pub trait MessagePublisher<M>: Send + Sync
where
    M: Send + Sync,
{
    async fn publish(&self, routing_key: &str, message: &M) -> Result<(), PublishError>;

    /// Release the outbound channel. Safe to call more than once.
    async fn shutdown(&self) -> Result<(), PublishError>;
}

#[async_trait]
impl<M, P> MessagePublisher<M> for Arc<P>
where
    M: Send + Sync,
    P: MessagePublisher<M> + ?Sized,
{
    async fn publish(&self, routing_key: &str, message: &M) -> Result<(), PublishError> {
        (**self).publish(routing_key, message).await
    }

    async fn shutdown(&self) -> Result<(), PublishError> {
        (**self).shutdown().await
    }
}

enum ChannelState<C> {
    Connected(C),
    Closed,
}

/// Publisher that owns a broker channel and publishes JSON messages to one exchange.
pub struct ExchangePublisher<C> {
    exchange: ExchangeSpec,
    state: tokio::sync::Mutex<ChannelState<C>>,
}

impl<C> core::fmt::Debug for ExchangePublisher<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ExchangePublisher")
            .field("exchange", &self.exchange)
            .finish_non_exhaustive()
    }
}

impl<C> ExchangePublisher<C>
where
    C: BrokerChannel,
{
    /// Take ownership of an open channel. The exchange is declared lazily, before
    /// every publish.
    pub fn new(channel: C, exchange: ExchangeSpec) -> Self {
        Self {
            exchange,
            state: tokio::sync::Mutex::new(ChannelState::Connected(channel)),
        }
    }

    pub async fn is_closed(&self) -> bool {
        matches!(*self.state.lock().await, ChannelState::Closed)
    }

    /// Declare the exchange without publishing.
    ///
    /// Repeating this with the same parameters is a no-op on the broker.
    pub async fn declare(&self) -> Result<(), PublishError> {
        let guard = self.state.lock().await;
        match &*guard {
            ChannelState::Connected(channel) => {
                channel.declare_exchange(&self.exchange).await?;
                Ok(())
            }
            ChannelState::Closed => Err(PublishError::ChannelClosed),
        }
    }

    /// Publish an already-encoded body.
    #[instrument(
        skip(self, body),
        fields(exchange = %self.exchange.name, bytes = body.len()),
        err
    )]
    pub async fn publish_bytes(&self, routing_key: &str, body: &[u8]) -> Result<(), PublishError> {
        let guard = self.state.lock().await;
        let channel = match &*guard {
            ChannelState::Connected(channel) => channel,
            ChannelState::Closed => return Err(PublishError::ChannelClosed),
        };

        channel.declare_exchange(&self.exchange).await?;
        channel
            .basic_publish(&self.exchange.name, routing_key, body)
            .await?;

        debug!("message published");
        Ok(())
    }
}

#[async_trait]
impl<C, M> MessagePublisher<M> for ExchangePublisher<C>
where
    C: BrokerChannel,
    M: Serialize + Send + Sync,
{
    async fn publish(&self, routing_key: &str, message: &M) -> Result<(), PublishError> {
        let body =
            serde_json::to_vec(message).map_err(|e| PublishError::Serialize(e.to_string()))?;
        self.publish_bytes(routing_key, &body).await
    }

    #[instrument(skip(self), fields(exchange = %self.exchange.name))]
    async fn shutdown(&self) -> Result<(), PublishError> {
        let mut guard = self.state.lock().await;
        match std::mem::replace(&mut *guard, ChannelState::Closed) {
            ChannelState::Connected(channel) => {
                // The state is terminal even if the broker-side close fails.
                channel.close().await.map_err(PublishError::from)?;
                debug!("publisher channel released");
            }
            ChannelState::Closed => debug!("publisher already closed"),
        }
        Ok(())
    }
}

/// Publisher that records what it was asked to publish (tests/dev).
///
/// Can be told to fail, to exercise publish-failure isolation.
#[derive(Debug)]
pub struct RecordingPublisher<M> {
    published: Mutex<Vec<(String, M)>>,
    failure: Mutex<Option<PublishError>>,
}

impl<M> Default for RecordingPublisher<M> {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }
}

impl<M: Clone> RecordingPublisher<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent publish fails with `error` (and is not recorded).
    pub fn fail_with(&self, error: PublishError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(error);
        }
    }

    pub fn published(&self) -> Vec<(String, M)> {
        self.published.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.published.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<M> MessagePublisher<M> for RecordingPublisher<M>
where
    M: Clone + Send + Sync,
{
    async fn publish(&self, routing_key: &str, message: &M) -> Result<(), PublishError> {
        if let Some(err) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        if let Ok(mut published) = self.published.lock() {
            published.push((routing_key.to_string(), message.clone()));
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), PublishError> {
        Ok(())
    }
}
