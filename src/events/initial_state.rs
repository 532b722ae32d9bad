use crate::entities::match_states::MatchState;
use crate::events::{EventResult, ScorerSession};
use crate::usecases::matches::{self, MatchCommand};
use tracing::info;

pub async fn handle(session: &ScorerSession, state: MatchState) -> EventResult {
    let committed = matches::submit_to(
        &session.room,
        MatchCommand::InitialState(Box::new(state)),
        Some(session.connection_id),
    )
    .await?;
    info!(
        match_id = %session.match_id,
        connection_id = %session.connection_id,
        raid_number = committed.state.raid_number,
        "Match state initialized by scorer"
    );
    Ok(Some(committed.payload))
}
