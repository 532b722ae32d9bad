use crate::adapters::auth_service::ScorerAuthorizer;
use crate::common::context::Context;
use crate::common::init;
use crate::common::state::AppState;
use crate::repositories::match_states::MatchStateStore;
use crate::rooms::registry::MatchRoomRegistry;
use crate::settings::AppSettings;
use crate::workers::crons::room_reaper;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod http;
pub mod ws;

pub struct RequestContext {
    pub store: Arc<dyn MatchStateStore>,
    pub rooms: Arc<MatchRoomRegistry>,
    pub authorizer: Arc<dyn ScorerAuthorizer>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/ws/scorer", get(ws::scorer::upgrade))
        .route("/ws/viewer", get(ws::viewer::upgrade))
        .nest("/api", http::router())
}

pub async fn index() -> &'static str {
    "Running kabaddi-live-service v0.1"
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self {
            store: state.store.clone(),
            rooms: state.rooms.clone(),
            authorizer: state.authorizer.clone(),
        })
    }
}

impl Context for RequestContext {
    fn store(&self) -> &dyn MatchStateStore {
        self.store.as_ref()
    }

    fn rooms(&self) -> &MatchRoomRegistry {
        &self.rooms
    }

    fn authorizer(&self) -> &dyn ScorerAuthorizer {
        self.authorizer.as_ref()
    }
}

/// Serves the router on `listener` and runs the room reaper next to it
pub async fn serve_with(
    state: AppState,
    listener: TcpListener,
    reap_interval: Duration,
) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let reaper = tokio::spawn(room_reaper::serve(
        state.clone(),
        reap_interval,
        shutdown.clone(),
    ));

    let app = router().with_state(state);
    let result = axum::serve(listener, app).await;
    shutdown.cancel();
    let _ = reaper.await;
    Ok(result?)
}

pub async fn serve(settings: &AppSettings) -> anyhow::Result<()> {
    let state = init::initialize_state(settings)?;
    let addr = SocketAddr::new(settings.app_host, settings.app_port);
    let listener = TcpListener::bind(addr).await?;
    info!("Serving API on {}", listener.local_addr()?);
    serve_with(state, listener, settings.room_reap_interval).await
}
