use crate::events::{EventResult, ScorerSession};
use crate::models::raids::LobbyTouch;
use crate::usecases::matches::{self, MatchCommand};

pub async fn handle(session: &ScorerSession, args: LobbyTouch) -> EventResult {
    let committed = matches::submit_to(
        &session.room,
        MatchCommand::LobbyTouch(args),
        Some(session.connection_id),
    )
    .await?;
    Ok(Some(committed.payload))
}
