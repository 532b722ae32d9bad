use crate::adapters::auth_service::ScorerAuthorizer;
use crate::common::context::Context;
use crate::repositories::match_states::MatchStateStore;
use crate::rooms::RoomConfig;
use crate::rooms::registry::MatchRoomRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MatchStateStore>,
    pub rooms: Arc<MatchRoomRegistry>,
    pub authorizer: Arc<dyn ScorerAuthorizer>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MatchStateStore>,
        authorizer: Arc<dyn ScorerAuthorizer>,
        room_config: RoomConfig,
    ) -> Self {
        let rooms = Arc::new(MatchRoomRegistry::new(store.clone(), room_config));
        Self {
            store,
            rooms,
            authorizer,
        }
    }
}

impl Context for AppState {
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
