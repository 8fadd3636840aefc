//! In-memory broker for tests/dev.
//!
//! Models just enough of an AMQP broker to exercise the publish path:
//! named exchanges with declare semantics, direct/fanout routing to bound
//! queues, and channels that can be closed. A broker can be switched offline
//! to simulate a lost connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::channel::{BrokerChannel, ChannelError, ExchangeKind, ExchangeSpec};

/// A message as delivered to a bound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub exchange: String,
    pub routing_key: String,
    pub body: Vec<u8>,
}

impl Delivery {
    /// Decode the JSON body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A queue bound to an exchange.
///
/// Subscriptions are designed for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: mpsc::Receiver<M>,
}

impl<M> Subscription<M> {
    pub(crate) fn new(receiver: mpsc::Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Everything currently queued, without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

#[derive(Debug)]
struct Binding {
    exchange: String,
    routing_key: String,
    tx: mpsc::Sender<Delivery>,
}

#[derive(Debug, Default)]
struct BrokerState {
    exchanges: HashMap<String, ExchangeSpec>,
    bindings: Vec<Binding>,
    declare_calls: u64,
    offline: bool,
}

/// In-process broker shared by any number of channels.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new channel on this broker.
    pub fn open_channel(&self) -> InMemoryChannel {
        InMemoryChannel {
            state: self.state.clone(),
            closed: AtomicBool::new(false),
        }
    }

    /// Bind a fresh queue to `exchange` under `routing_key`.
    ///
    /// Unlike a real broker, the exchange does not have to exist yet; this lets
    /// tests attach consumers before the publisher's first declare.
    pub fn bind_queue(
        &self,
        exchange: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Subscription<Delivery> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages.
        if let Ok(mut state) = self.state.lock() {
            state.bindings.push(Binding {
                exchange: exchange.into(),
                routing_key: routing_key.into(),
                tx,
            });
        }

        Subscription::new(rx)
    }

    /// Declared exchange by name.
    pub fn exchange(&self, name: &str) -> Option<ExchangeSpec> {
        self.state.lock().ok()?.exchanges.get(name).cloned()
    }

    pub fn exchange_count(&self) -> usize {
        self.state.lock().map(|s| s.exchanges.len()).unwrap_or(0)
    }

    /// Number of declare requests received (including no-op redeclares).
    pub fn declare_calls(&self) -> u64 {
        self.state.lock().map(|s| s.declare_calls).unwrap_or(0)
    }

    /// Simulate losing (or regaining) the broker connection.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }
}

/// Channel handle onto an `InMemoryBroker`.
#[derive(Debug)]
pub struct InMemoryChannel {
    state: Arc<Mutex<BrokerState>>,
    closed: AtomicBool,
}

impl InMemoryChannel {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn live_state(&self) -> Result<std::sync::MutexGuard<'_, BrokerState>, ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        let state = self
            .state
            .lock()
            .map_err(|_| ChannelError::Connection("broker state poisoned".to_string()))?;
        if state.offline {
            return Err(ChannelError::Connection("broker unreachable".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn declare_exchange(&self, spec: &ExchangeSpec) -> Result<(), ChannelError> {
        let mut state = self.live_state()?;
        state.declare_calls += 1;

        match state.exchanges.get(&spec.name) {
            Some(existing) if existing == spec => Ok(()),
            Some(existing) => Err(ChannelError::PreconditionFailed(format!(
                "exchange '{}' already declared as {:?} (durable={}), requested {:?} (durable={})",
                spec.name, existing.kind, existing.durable, spec.kind, spec.durable
            ))),
            None => {
                state.exchanges.insert(spec.name.clone(), spec.clone());
                Ok(())
            }
        }
    }

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
    ) -> Result<(), ChannelError> {
        let mut state = self.live_state()?;

        let kind = state
            .exchanges
            .get(exchange)
            .map(|e| e.kind)
            .ok_or_else(|| ChannelError::ExchangeNotFound(exchange.to_string()))?;

        let delivery = Delivery {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            body: body.to_vec(),
        };

        // Unroutable messages are dropped; dead consumers are unbound.
        state.bindings.retain(|b| {
            let routed = b.exchange == exchange
                && match kind {
                    ExchangeKind::Direct => b.routing_key == routing_key,
                    ExchangeKind::Fanout => true,
                };
            !routed || b.tx.send(delivery.clone()).is_ok()
        });

        Ok(())
    }

    async fn close(&self) -> Result<(), ChannelError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
