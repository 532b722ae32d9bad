pub mod initial_state;
pub mod legacy_state;
pub mod lobby_touch;
pub mod raid;

use crate::common::error::{AppError, ServiceResult};
use crate::models::frames::{InboundFrame, OutboundFrame};
use crate::rooms::MatchRoom;
use crate::rooms::connections::ConnectionId;
use axum::extract::ws::Utf8Bytes;
use tracing::{debug, warn};

/// A scorer connection that joined a match room
pub struct ScorerSession {
    pub connection_id: ConnectionId,
    pub match_id: String,
    pub room: MatchRoom,
}

/// Payload acknowledged back to the sending scorer, if any
pub type EventResult = ServiceResult<Option<Utf8Bytes>>;

macro_rules! event_handler {
    ($h:ident($session:expr, $args:expr)) => {
        $h::handle($session, $args).await
    };
}

pub async fn handle_event(session: &ScorerSession, frame: InboundFrame) -> EventResult {
    match frame {
        InboundFrame::Join { match_id } => {
            if match_id != session.match_id {
                warn!(
                    connection_id = %session.connection_id,
                    match_id = %session.match_id,
                    requested_match_id = %match_id,
                    "Ignoring join for another match, reconnect to switch matches"
                );
            }
            Ok(None)
        }
        InboundFrame::Raid(args) => event_handler!(raid(session, args)),
        InboundFrame::LobbyTouch(args) => event_handler!(lobby_touch(session, args)),
        InboundFrame::InitialState(args) => event_handler!(initial_state(session, *args)),
        InboundFrame::LegacyState(args) => event_handler!(legacy_state(session, *args)),
    }
}

fn error_frames(error: AppError) -> Vec<OutboundFrame> {
    match error {
        AppError::MatchesNotInitialized => vec![
            OutboundFrame::from_error(&error),
            OutboundFrame::RequestInit,
        ],
        _ => vec![OutboundFrame::from_error(&error)],
    }
}

/// Classifies and handles one text frame, returning the frames for the sender
pub async fn handle_frame(session: &ScorerSession, text: &str) -> Vec<Utf8Bytes> {
    let result = match InboundFrame::parse(text) {
        Ok(frame) => {
            debug!(
                connection_id = %session.connection_id,
                match_id = %session.match_id,
                frame = frame.name(),
                "Received scorer frame"
            );
            handle_event(session, frame).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(ack) => ack.into_iter().collect(),
        Err(e) => {
            if e.is_validation_error() {
                debug!(match_id = %session.match_id, code = e.code(), "Rejected scorer frame");
            } else {
                warn!(match_id = %session.match_id, code = e.code(), "Failed to handle scorer frame");
            }
            error_frames(e)
                .iter()
                .filter_map(|frame| frame.to_payload().ok())
                .collect()
        }
    }
}
