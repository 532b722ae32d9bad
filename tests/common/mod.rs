#![allow(dead_code)]

use kabaddi_live_service::adapters::auth_service::{AllowAllScorers, ScorerAuthorizer};
use kabaddi_live_service::api;
use kabaddi_live_service::common::error::ServiceResult;
use kabaddi_live_service::common::state::AppState;
use kabaddi_live_service::repositories::match_states::MemoryMatchStateStore;
use kabaddi_live_service::rooms::RoomConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryMatchStateStore>,
    pub state: AppState,
}

impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{path}", self.addr)
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(Arc::new(AllowAllScorers)).await
}

pub async fn spawn_server_with(authorizer: Arc<dyn ScorerAuthorizer>) -> TestServer {
    let store = Arc::new(MemoryMatchStateStore::new());
    let state = AppState::new(store.clone(), authorizer, RoomConfig::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(api::serve_with(
        state.clone(),
        listener,
        Duration::from_secs(30),
    ));
    TestServer { addr, store, state }
}

/// Only accepts the token "letmein"
pub struct StaticTokenAuthorizer;

#[async_trait::async_trait]
impl ScorerAuthorizer for StaticTokenAuthorizer {
    async fn authorize(&self, token: Option<&str>, _match_id: &str) -> ServiceResult<()> {
        match token {
            Some("letmein") => Ok(()),
            _ => Err(kabaddi_live_service::common::error::AppError::Unauthorized),
        }
    }
}

pub fn initial_state() -> serde_json::Value {
    serde_json::json!({
        "teamA": {"name": "Tigers", "score": 0},
        "teamB": {"name": "Lions", "score": 0},
        "playerStats": {
            "p1": {"name": "Asha", "id": "p1", "status": "in"},
            "p2": {"name": "Meera", "id": "p2", "status": "in"},
            "p3": {"name": "Kavya", "id": "p3", "status": "in"},
            "p4": {"name": "Ravi", "id": "p4", "status": "in"},
            "p5": {"name": "Kiran", "id": "p5", "status": "in"},
            "p6": {"name": "Dev", "id": "p6", "status": "in"}
        },
        "teamAPlayerIds": ["p1", "p2", "p3"],
        "teamBPlayerIds": ["p4", "p5", "p6"],
        "raidNumber": 0,
        "emptyRaidCounts": {"teamA": 0, "teamB": 0}
    })
}
