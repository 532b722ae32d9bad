use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

pub type ServiceResult<T> = Result<T, AppError>;
pub type ServiceResponse<T> = ServiceResult<Json<T>>;

#[track_caller]
pub fn unexpected<T, E: Into<anyhow::Error>>(e: E) -> ServiceResult<T> {
    let caller = std::panic::Location::caller();
    error!("An unexpected error has occurred at {caller}: {}", e.into());
    Err(AppError::Unexpected)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppError {
    Unexpected,
    Unauthorized,
    DecodingRequestFailed,

    MatchesNotFound,
    MatchesNotInitialized,
    MatchesEnded,
    MatchesPersistenceFailed,
    MatchesCounterOutOfRange,

    PlayersNotFound,
    PlayersNotActive,

    RaidsInvalidType,
    RaidsMissingRaider,
    RaidsRaiderNotFound,
    RaidsRaiderNotActive,
    RaidsInvalidTeam,
    RaidsWrongTurn,
    RaidsMissingDefenders,
    RaidsDefenderIsRaider,
    RaidsDuplicateDefender,
    RaidsDefenderNotFound,
    RaidsDefenderWrongTeam,
    RaidsDefenderNotActive,
    RaidsNegativeEmptyCount,

    RoomsClosed,
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    #[track_caller]
    fn from(e: E) -> Self {
        unexpected::<(), E>(e).unwrap_err()
    }
}

impl AppError {
    pub const fn as_str(&self) -> &str {
        self.code()
    }

    pub const fn code(&self) -> &'static str {
        match self {
            AppError::Unexpected => "unexpected",
            AppError::Unauthorized => "unauthorized",
            AppError::DecodingRequestFailed => "decoding_request_failed",

            AppError::MatchesNotFound => "matches.not_found",
            AppError::MatchesNotInitialized => "matches.not_initialized",
            AppError::MatchesEnded => "matches.ended",
            AppError::MatchesPersistenceFailed => "matches.persistence_failed",
            AppError::MatchesCounterOutOfRange => "matches.counter_out_of_range",

            AppError::PlayersNotFound => "players.not_found",
            AppError::PlayersNotActive => "players.not_active",

            AppError::RaidsInvalidType => "raids.invalid_type",
            AppError::RaidsMissingRaider => "raids.missing_raider",
            AppError::RaidsRaiderNotFound => "raids.raider_not_found",
            AppError::RaidsRaiderNotActive => "raids.raider_not_active",
            AppError::RaidsInvalidTeam => "raids.invalid_team",
            AppError::RaidsWrongTurn => "raids.wrong_turn",
            AppError::RaidsMissingDefenders => "raids.missing_defenders",
            AppError::RaidsDefenderIsRaider => "raids.defender_is_raider",
            AppError::RaidsDuplicateDefender => "raids.duplicate_defender",
            AppError::RaidsDefenderNotFound => "raids.defender_not_found",
            AppError::RaidsDefenderWrongTeam => "raids.defender_wrong_team",
            AppError::RaidsDefenderNotActive => "raids.defender_not_active",
            AppError::RaidsNegativeEmptyCount => "raids.negative_empty_count",

            AppError::RoomsClosed => "rooms.closed",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            AppError::Unexpected => "An unexpected error has occurred.",
            AppError::Unauthorized => "You are not authorized to perform this action.",
            AppError::DecodingRequestFailed => "Failed to decode request",

            AppError::MatchesNotFound => "The match could not be found.",
            AppError::MatchesNotInitialized => {
                "The match has no state yet. Send the initial match state first."
            }
            AppError::MatchesEnded => "The match has already ended.",
            AppError::MatchesPersistenceFailed => {
                "Failed to persist the match state. The update was not applied."
            }
            AppError::MatchesCounterOutOfRange => "A score or counter is out of range.",

            AppError::PlayersNotFound => "The player is not part of this match.",
            AppError::PlayersNotActive => "The player is already out.",

            AppError::RaidsInvalidType => "Invalid raid type (expected successful, defense or empty).",
            AppError::RaidsMissingRaider => "A raider must be selected.",
            AppError::RaidsRaiderNotFound => "The raider is not part of this match.",
            AppError::RaidsRaiderNotActive => "The raider is not active.",
            AppError::RaidsInvalidTeam => "Invalid raiding team (expected A or B).",
            AppError::RaidsWrongTurn => "It is the other team's turn to raid.",
            AppError::RaidsMissingDefenders => "At least one defender must be selected.",
            AppError::RaidsDefenderIsRaider => "The raider cannot also be a defender.",
            AppError::RaidsDuplicateDefender => "A defender was selected more than once.",
            AppError::RaidsDefenderNotFound => "A defender is not part of this match.",
            AppError::RaidsDefenderWrongTeam => "Defenders must belong to the defending team.",
            AppError::RaidsDefenderNotActive => "A defender is not active.",
            AppError::RaidsNegativeEmptyCount => "Empty raid counts must not be negative.",

            AppError::RoomsClosed => "The match room has been closed. Please reconnect.",
        }
    }

    pub const fn http_status_code(&self) -> StatusCode {
        match self {
            AppError::DecodingRequestFailed
            | AppError::MatchesNotInitialized
            | AppError::MatchesEnded
            | AppError::MatchesCounterOutOfRange
            | AppError::PlayersNotFound
            | AppError::PlayersNotActive
            | AppError::RaidsInvalidType
            | AppError::RaidsMissingRaider
            | AppError::RaidsRaiderNotFound
            | AppError::RaidsRaiderNotActive
            | AppError::RaidsInvalidTeam
            | AppError::RaidsWrongTurn
            | AppError::RaidsMissingDefenders
            | AppError::RaidsDefenderIsRaider
            | AppError::RaidsDuplicateDefender
            | AppError::RaidsDefenderNotFound
            | AppError::RaidsDefenderWrongTeam
            | AppError::RaidsDefenderNotActive
            | AppError::RaidsNegativeEmptyCount => StatusCode::BAD_REQUEST,

            AppError::Unauthorized => StatusCode::UNAUTHORIZED,

            AppError::MatchesNotFound => StatusCode::NOT_FOUND,

            AppError::RoomsClosed => StatusCode::SERVICE_UNAVAILABLE,

            AppError::Unexpected | AppError::MatchesPersistenceFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Rejections caused by the submitted raid or match data itself
    pub fn is_validation_error(&self) -> bool {
        self.http_status_code() == StatusCode::BAD_REQUEST
            && *self != AppError::DecodingRequestFailed
    }

    pub const fn response_parts(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status = self.http_status_code();
        let response = ErrorResponse {
            code: self.code(),
            message: self.message(),
        };
        (status, Json(response))
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.response_parts().into_response()
    }
}
