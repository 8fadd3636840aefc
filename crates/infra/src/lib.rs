//! Infrastructure layer: storage, broker channels, config, and the product
//! mutation pipeline that ties them together.

pub mod config;
pub mod messaging;
pub mod products_service;
pub mod repository;


pub use config::{AppConfig, BrokerConfig, ConfigError};
pub use products_service::{ProductsService, ServiceError, ServiceResult};
pub use repository::{InMemoryProductsRepository, ProductsRepository, StorageError};
