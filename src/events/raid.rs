use crate::events::{EventResult, ScorerSession};
use crate::models::raids::RaidPayload;
use crate::usecases::matches::{self, MatchCommand};

pub async fn handle(session: &ScorerSession, args: RaidPayload) -> EventResult {
    let committed = matches::submit_to(
        &session.room,
        MatchCommand::Raid(args),
        Some(session.connection_id),
    )
    .await?;
    Ok(Some(committed.payload))
}
