use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use catalog_events::{ExchangePublisher, ExchangeSpec, InMemoryBroker, MessagePublisher};
use catalog_infra::{
    AppConfig, InMemoryProductsRepository, ProductsRepository, ProductsService,
    messaging::RedisExchangeChannel, repository::PostgresProductsRepository,
};
use catalog_products::ProductMessage;

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Debug)]
pub struct AppServices {
    pub products: ProductsService,
}

impl AppServices {
    /// In-memory storage, publishing onto `broker` (dev/test).
    pub fn in_memory(broker: &InMemoryBroker, exchange: impl Into<String>) -> Self {
        let publisher = ExchangePublisher::new(
            broker.open_channel(),
            ExchangeSpec::direct_durable(exchange),
        );
        Self {
            products: ProductsService::new(
                Arc::new(InMemoryProductsRepository::new()),
                Arc::new(publisher),
            ),
        }
    }
}

/// Wire storage and broker according to `config`.
///
/// `DATABASE_URL` selects Postgres, `BROKER_HOSTNAME` selects the Redis channel;
/// each falls back to its in-process counterpart when unset.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let repository: Arc<dyn ProductsRepository> = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let repository = PostgresProductsRepository::new(pool);
            repository
                .ensure_schema()
                .await
                .context("failed to prepare products schema")?;
            tracing::info!("using postgres product storage");
            Arc::new(repository)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; products are kept in memory");
            Arc::new(InMemoryProductsRepository::new())
        }
    };

    let exchange = ExchangeSpec::direct_durable(config.exchange.clone());
    let publisher: Arc<dyn MessagePublisher<ProductMessage>> = match &config.broker {
        Some(broker) => {
            let channel = RedisExchangeChannel::open(broker.redis_url())
                .with_context(|| format!("failed to connect to broker at {}", broker.hostname))?;
            tracing::info!(host = %broker.hostname, port = broker.port, "using redis broker");
            Arc::new(ExchangePublisher::new(channel, exchange))
        }
        None => {
            tracing::warn!("BROKER_HOSTNAME not set; notifications stay in process");
            Arc::new(ExchangePublisher::new(
                InMemoryBroker::new().open_channel(),
                exchange,
            ))
        }
    };

    Ok(AppServices {
        products: ProductsService::new(repository, publisher),
    })
}
