use serde::Serialize;

/// A notification meant for consumers outside this process.
///
/// Integration events are:
/// - **immutable** (treat them as facts, constructed once after the change is committed)
/// - **routed** (the routing key is part of the compatibility surface; consumers bind to it)
/// - **serialized verbatim** (field names are the wire contract)
pub trait IntegrationEvent: Serialize + Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Routing key consumers bind their queues to (e.g. "product.delete").
    fn routing_key(&self) -> &'static str;

    /// Stable event name used in logs.
    fn event_type(&self) -> &'static str;
}
