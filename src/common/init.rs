use crate::adapters::auth_service::{AllowAllScorers, AuthService, ScorerAuthorizer};
use crate::common::redis_pool::{RedisPool, RedisPoolManager};
use crate::common::state::AppState;
use crate::repositories::match_states::RedisMatchStateStore;
use crate::rooms::RoomConfig;
use crate::settings::AppSettings;
use deadpool::Runtime;
use redis::{AsyncConnectionConfig, Commands};
use std::sync::Arc;
use tracing::warn;

pub fn initialize_logging(settings: &AppSettings) {
    tracing_subscriber::fmt()
        .with_max_level(settings.level)
        // .json()
        .with_timer(tracing_subscriber::fmt::time())
        .with_level(true)
        .compact()
        .init();
}

pub fn initialize_state(settings: &AppSettings) -> anyhow::Result<AppState> {
    let redis = initialize_redis(settings)?;
    let store = Arc::new(RedisMatchStateStore::new(redis, settings.match_state_ttl));
    let authorizer = initialize_authorizer(settings);
    Ok(AppState::new(store, authorizer, room_config(settings)))
}

pub fn room_config(settings: &AppSettings) -> RoomConfig {
    RoomConfig {
        idle_timeout: settings.room_idle_timeout,
        broadcast_capacity: settings.room_broadcast_capacity,
        outbound_capacity: settings.connection_outbound_capacity,
        ..Default::default()
    }
}

pub fn initialize_authorizer(settings: &AppSettings) -> Arc<dyn ScorerAuthorizer> {
    match &settings.auth_service_url {
        Some(base_url) => Arc::new(AuthService::new(base_url.clone())),
        None => {
            warn!("AUTH_SERVICE_URL is not set, every scorer connection will be accepted");
            Arc::new(AllowAllScorers)
        }
    }
}

/// Fails when the store is unreachable, the service cannot run without it
pub fn initialize_redis(settings: &AppSettings) -> anyhow::Result<RedisPool> {
    let redis_client = redis::Client::open(settings.redis_url.as_str())?;
    let mut conn = redis_client.get_connection_with_timeout(settings.redis_wait_timeout)?;
    let _: () = conn.ping()?;
    let redis_cfg = AsyncConnectionConfig::new()
        .set_connection_timeout(settings.redis_connection_timeout)
        .set_response_timeout(settings.redis_response_timeout);

    let redis_manager = RedisPoolManager::new(redis_client, redis_cfg);
    let redis = RedisPool::builder(redis_manager)
        .max_size(settings.redis_max_connections)
        .wait_timeout(Some(settings.redis_wait_timeout))
        .runtime(Runtime::Tokio1)
        .build()?;
    Ok(redis)
}
