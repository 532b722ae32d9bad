use crate::adapters::auth_service::ScorerAuthorizer;
use crate::repositories::match_states::MatchStateStore;
use crate::rooms::registry::MatchRoomRegistry;

pub trait Context: Sync + Send {
    fn store(&self) -> &dyn MatchStateStore;
    fn rooms(&self) -> &MatchRoomRegistry;
    fn authorizer(&self) -> &dyn ScorerAuthorizer;
}
