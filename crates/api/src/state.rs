//! Per-process state handed to every request handler.

use std::sync::Arc;

use lettre::transport::smtp::Error as SmtpError;
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::PgOrderStore;
use crate::services::email::{EmailService, LoggingNotifier, Notifier};
use crate::services::orders::OrderFlow;

/// Everything a handler needs: config, pool, notifier, purchase flow.
///
/// Cloning is cheap; the contents sit behind a single `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
    orders: OrderFlow,
}

impl AppState {
    /// Build the state for one server instance.
    ///
    /// Picks the SMTP notifier when `config.smtp` is set, otherwise the
    /// dev-mode logging notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay address is invalid.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, SmtpError> {
        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(smtp) => Arc::new(EmailService::new(smtp)?),
            None => {
                tracing::warn!("SMTP_HOST not set; outbound email will be logged, not sent");
                Arc::new(LoggingNotifier)
            }
        };

        let store = Arc::new(PgOrderStore::new(pool.clone()));
        let orders = OrderFlow::new(store, Arc::clone(&notifier));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                notifier,
                orders,
            }),
        })
    }

    /// Runtime configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Postgres connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Outbound email channel.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// Order placement and confirmation flow.
    #[must_use]
    pub fn orders(&self) -> &OrderFlow {
        &self.inner.orders
    }
}
