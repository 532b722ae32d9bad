use crate::common::env::FromEnv;
use std::env;
use std::net::IpAddr;
use std::ops::Deref;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::Level;

const DEFAULT_ROOM_IDLE_TIMEOUT_SECS: u64 = 5 * 60;
const DEFAULT_ROOM_REAP_INTERVAL_SECS: u64 = 30;
const DEFAULT_ROOM_BROADCAST_CAPACITY: usize = 100;
const DEFAULT_CONNECTION_OUTBOUND_CAPACITY: usize = 64;

pub struct AppSettings {
    pub app_component: String,
    pub level: Level,
    pub app_host: IpAddr,
    pub app_port: u16,

    pub redis_url: String,
    pub redis_max_connections: usize,
    pub redis_connection_timeout: Duration,
    pub redis_response_timeout: Duration,
    pub redis_wait_timeout: Duration,

    /// Retention for persisted match snapshots, `None` keeps them until deleted
    pub match_state_ttl: Option<Duration>,

    pub room_idle_timeout: Duration,
    pub room_reap_interval: Duration,
    pub room_broadcast_capacity: usize,
    pub connection_outbound_capacity: usize,

    pub auth_service_url: Option<String>,
}

impl AppSettings {
    pub fn load_from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        let app_component = env::var("APP_COMPONENT")?;
        let level = Level::from_env("LOG_LEVEL")?;
        let app_host = IpAddr::from_env("APP_HOST")?;
        let app_port = u16::from_env("APP_PORT")?;

        let redis_url = env::var("REDIS_URL")?;
        let redis_max_connections = usize::from_env("REDIS_MAX_CONNECTIONS")?;
        let redis_connection_timeout_secs = u64::from_env("REDIS_CONNECTION_TIMEOUT_SECS")?;
        let redis_connection_timeout = Duration::from_secs(redis_connection_timeout_secs);
        let redis_response_timeout_secs = u64::from_env("REDIS_RESPONSE_TIMEOUT_SECS")?;
        let redis_response_timeout = Duration::from_secs(redis_response_timeout_secs);
        let redis_wait_timeout_secs = u64::from_env("REDIS_WAIT_TIMEOUT_SECS")?;
        let redis_wait_timeout = Duration::from_secs(redis_wait_timeout_secs);

        let match_state_ttl = u64::from_env_opt("MATCH_STATE_TTL_SECS")?.map(Duration::from_secs);

        let room_idle_timeout_secs = u64::from_env_opt("ROOM_IDLE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_ROOM_IDLE_TIMEOUT_SECS);
        let room_idle_timeout = Duration::from_secs(room_idle_timeout_secs);
        let room_reap_interval_secs = u64::from_env_opt("ROOM_REAP_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_ROOM_REAP_INTERVAL_SECS);
        let room_reap_interval = Duration::from_secs(room_reap_interval_secs);
        let room_broadcast_capacity = usize::from_env_opt("ROOM_BROADCAST_CAPACITY")?
            .unwrap_or(DEFAULT_ROOM_BROADCAST_CAPACITY);
        let connection_outbound_capacity = usize::from_env_opt("CONNECTION_OUTBOUND_CAPACITY")?
            .unwrap_or(DEFAULT_CONNECTION_OUTBOUND_CAPACITY);

        let auth_service_url = env::var("AUTH_SERVICE_URL").ok();

        Ok(AppSettings {
            app_component,
            level,
            app_port,
            app_host,

            redis_url,
            redis_max_connections,
            redis_connection_timeout,
            redis_response_timeout,
            redis_wait_timeout,

            match_state_ttl,

            room_idle_timeout,
            room_reap_interval,
            room_broadcast_capacity,
            connection_outbound_capacity,

            auth_service_url,
        })
    }

    pub fn get() -> &'static AppSettings {
        settings()
    }
}

pub fn settings() -> &'static AppSettings {
    static SETTINGS: LazyLock<AppSettings> =
        LazyLock::new(|| AppSettings::load_from_env().expect("Failed to load settings"));
    SETTINGS.deref()
}
