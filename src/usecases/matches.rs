use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::match_states::MatchState;
use crate::models::raids::{LobbyTouch, RaidPayload};
use crate::rooms::{CommittedState, MatchRoom};
use crate::rooms::connections::ConnectionId;
use crate::usecases::{commentary, raids};
use tracing::info;

#[derive(Debug, Clone)]
pub enum MatchCommand {
    Raid(RaidPayload),
    LobbyTouch(LobbyTouch),
    InitialState(Box<MatchState>),
    LegacyState(Box<MatchState>),
    EndMatch,
}

impl MatchCommand {
    pub const fn name(&self) -> &'static str {
        match self {
            MatchCommand::Raid(_) => "raid",
            MatchCommand::LobbyTouch(_) => "lobbyTouch",
            MatchCommand::InitialState(_) => "initialState",
            MatchCommand::LegacyState(_) => "legacyState",
            MatchCommand::EndMatch => "endMatch",
        }
    }
}

/// Snapshots pushed by a scorer replace the state wholesale,
/// the server keeps its own commentary when the client sends none.
/// An ended match cannot be reopened this way.
fn replace_state(
    current: Option<&MatchState>,
    match_id: &str,
    submitted: MatchState,
) -> ServiceResult<MatchState> {
    if current.is_some_and(|current| current.match_ended) {
        return Err(AppError::MatchesEnded);
    }
    let mut next = submitted.normalized(match_id);
    if !next.counters_in_range() {
        return Err(AppError::MatchesCounterOutOfRange);
    }
    if next.commentary.is_empty()
        && let Some(current) = current
    {
        next.commentary = current.commentary.clone();
    }
    Ok(next)
}

/// Computes the state that follows `command`, leaving `current` untouched
pub fn resolve_command(
    current: Option<&MatchState>,
    match_id: &str,
    command: &MatchCommand,
) -> ServiceResult<MatchState> {
    match command {
        MatchCommand::InitialState(state) | MatchCommand::LegacyState(state) => {
            replace_state(current, match_id, state.as_ref().clone())
        }
        MatchCommand::Raid(raid) => {
            let current = current.ok_or(AppError::MatchesNotInitialized)?;
            Ok(raids::resolve(current, raid)?.state)
        }
        MatchCommand::LobbyTouch(touch) => {
            let current = current.ok_or(AppError::MatchesNotInitialized)?;
            Ok(raids::apply_lobby_touch(current, touch)?.state)
        }
        MatchCommand::EndMatch => {
            let current = current.ok_or(AppError::MatchesNotFound)?;
            if current.match_ended {
                return Err(AppError::MatchesEnded);
            }
            let mut next = current.clone();
            next.match_ended = true;
            let line = commentary::describe_result(&next);
            commentary::push(&mut next, line);
            Ok(next)
        }
    }
}

/// Latest state of a match, live if a room holds it, else from the store
pub async fn fetch_one<C: Context>(ctx: &C, match_id: &str) -> ServiceResult<MatchState> {
    if let Some(room) = ctx.rooms().get(match_id)
        && let Some(state) = room.snapshot().await?
    {
        return Ok(state);
    }
    match ctx.store().fetch_one(match_id).await {
        Ok(Some(state)) => Ok(state),
        Ok(None) => Err(AppError::MatchesNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn submit<C: Context>(
    ctx: &C,
    match_id: &str,
    command: MatchCommand,
    origin: Option<ConnectionId>,
) -> ServiceResult<CommittedState> {
    let room = ctx.rooms().get_or_create(match_id);
    submit_to(&room, command, origin).await
}

pub async fn submit_to(
    room: &MatchRoom,
    command: MatchCommand,
    origin: Option<ConnectionId>,
) -> ServiceResult<CommittedState> {
    room.submit(command, origin).await
}

/// Marks the match as ended, broadcasts the final state and retires its room.
/// The stored snapshot is kept.
pub async fn end<C: Context>(ctx: &C, match_id: &str) -> ServiceResult<MatchState> {
    let committed = submit(ctx, match_id, MatchCommand::EndMatch, None).await?;
    ctx.rooms().retire(match_id);
    info!(
        match_id,
        team_a = committed.state.team_a.score,
        team_b = committed.state.team_b.score,
        "Match ended"
    );
    Ok(committed.state)
}
