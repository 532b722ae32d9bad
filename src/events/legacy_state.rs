use crate::entities::match_states::MatchState;
use crate::events::{EventResult, ScorerSession};
use crate::usecases::matches::{self, MatchCommand};

/// Full-state overwrite sent by older scorer clients
pub async fn handle(session: &ScorerSession, state: MatchState) -> EventResult {
    let committed = matches::submit_to(
        &session.room,
        MatchCommand::LegacyState(Box::new(state)),
        Some(session.connection_id),
    )
    .await?;
    Ok(Some(committed.payload))
}
