mod api;
mod config;
mod entities;
mod errors;
mod flyweights;
mod functions;
mod i18n;
mod store;
mod system;

use std::error::Error;
use std::sync::Arc;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::common::cache::QueryCache;
use crate::config::Settings;
use crate::flyweights::Flyweights;
use crate::functions::rpc::{FeaturedRpc, RestFeaturedRpc, StoreFeaturedRpc};
use crate::i18n::Locales;
use crate::store::memory::MemoryStore;
use crate::store::postgres::PgStore;
use crate::store::Store;

#[derive(Clone)]
pub struct InnerState {
    pub store: Arc<dyn Store>,
    pub cache: QueryCache,
    pub flyweights: Arc<Flyweights>,
    pub locales: Arc<Locales>,
    pub featured_rpc: Arc<dyn FeaturedRpc>,
    pub settings: Arc<Settings>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_videoteca=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let store: Arc<dyn Store> = match &settings.database_url {
        Some(url) => Arc::new(PgStore::connect(url, settings.db_timeout).await?),
        None => {
            tracing::warn!("DATABASE_URL is not set, falling back to the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let featured_rpc: Arc<dyn FeaturedRpc> = match &settings.supabase_url {
        Some(url) => Arc::new(RestFeaturedRpc::new(url.clone())),
        None => {
            tracing::warn!("SUPABASE_URL is not set, mark-top-featured runs against the local store");
            Arc::new(StoreFeaturedRpc::new(store.clone()))
        }
    };

    let state = InnerState {
        store,
        cache: QueryCache::new(settings.query_cache_ttl),
        flyweights: Arc::new(Flyweights::new(settings.category_preload_policy)),
        locales: Arc::new(Locales::load(&settings.locales_dir)),
        featured_rpc,
        settings: Arc::new(settings.clone()),
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = api::create_app(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
impl InnerState {
    pub fn with_featured_rpc(self, featured_rpc: Arc<dyn FeaturedRpc>) -> Self {
        Self { featured_rpc, ..self }
    }
}

#[cfg(test)]
mod test_support {
    use std::path::Path;
    use std::sync::Arc;

    use axum::Router;

    use super::*;

    pub fn test_state() -> InnerState {
        test_state_with(Arc::new(MemoryStore::new()))
    }

    pub fn test_state_with(store: Arc<MemoryStore>) -> InnerState {
        let settings = Settings::for_tests();
        let store: Arc<dyn Store> = store;
        InnerState {
            featured_rpc: Arc::new(StoreFeaturedRpc::new(store.clone())),
            store,
            cache: QueryCache::new(settings.query_cache_ttl),
            flyweights: Arc::new(Flyweights::new(settings.category_preload_policy)),
            locales: Arc::new(Locales::load(
                &Path::new(env!("CARGO_MANIFEST_DIR")).join("locales"),
            )),
            settings: Arc::new(settings),
        }
    }

    pub fn app_with(state: InnerState) -> Router {
        api::create_app(state)
    }
}
