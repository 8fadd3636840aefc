//! Notifications published after a product change is committed.
//!
//! Routing keys and field names are a compatibility surface: consumers bind
//! queues to these exact strings and read these exact fields.

use serde::{Deserialize, Serialize};

use catalog_events::IntegrationEvent;

use crate::product::{Product, ProductId};

pub const PRODUCT_DELETE_ROUTING_KEY: &str = "product.delete";
pub const PRODUCT_NAME_UPDATE_ROUTING_KEY: &str = "product.update.name";

/// A product was deleted. Carries the state captured before deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeletionMessage {
    pub id: ProductId,
    pub name: String,
}

/// A product was renamed. Carries the post-update name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductNameUpdateMessage {
    pub id: ProductId,
    pub name: String,
}

/// Every notification the product pipeline can emit.
///
/// Serialized untagged: the body on the wire is the inner message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProductMessage {
    Deleted(ProductDeletionMessage),
    NameUpdated(ProductNameUpdateMessage),
}

impl ProductMessage {
    pub fn deleted(product: &Product) -> Self {
        Self::Deleted(ProductDeletionMessage {
            id: product.product_id,
            name: product.product_name.clone(),
        })
    }

    pub fn name_updated(product: &Product) -> Self {
        Self::NameUpdated(ProductNameUpdateMessage {
            id: product.product_id,
            name: product.product_name.clone(),
        })
    }

    pub fn product_id(&self) -> ProductId {
        match self {
            Self::Deleted(m) => m.id,
            Self::NameUpdated(m) => m.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Deleted(m) => &m.name,
            Self::NameUpdated(m) => &m.name,
        }
    }
}

impl IntegrationEvent for ProductMessage {
    fn routing_key(&self) -> &'static str {
        match self {
            Self::Deleted(_) => PRODUCT_DELETE_ROUTING_KEY,
            Self::NameUpdated(_) => PRODUCT_NAME_UPDATE_ROUTING_KEY,
        }
    }

    fn event_type(&self) -> &'static str {
        match self {
            Self::Deleted(_) => "products.product.deleted",
            Self::NameUpdated(_) => "products.product.name_updated",
        }
    }
}
