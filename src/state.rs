use std::sync::Arc;

use crate::{
    config::{AppConfig, PaymentProvider},
    db::{self, DbPool, OrmConn},
    payments::{PaymentGateway, mock::MockGateway, stripe::StripeClient},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Arc<AppConfig>, payments: Arc<dyn PaymentGateway>) -> Self {
        let orm = db::orm_from_pool(&pool);
        Self {
            pool,
            orm,
            config,
            payments,
        }
    }

    /// Connect the pool and pick the payment gateway named by the config.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
        let payments = gateway_from_config(&config)?;
        Ok(Self::new(pool, Arc::new(config), payments))
    }
}

pub fn gateway_from_config(config: &AppConfig) -> anyhow::Result<Arc<dyn PaymentGateway>> {
    let gateway: Arc<dyn PaymentGateway> = match config.payment_provider {
        PaymentProvider::Stripe => Arc::new(StripeClient::from_config(config)?),
        PaymentProvider::Mock => {
            tracing::warn!("using mock payment gateway; no real charges will be made");
            Arc::new(MockGateway::default())
        }
    };
    Ok(gateway)
}
