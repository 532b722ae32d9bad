use crate::common::error::{AppError, ServiceResult};
use crate::entities::match_states::MatchState;
use crate::models::raids::{LobbyTouch, RaidPayload};
use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every frame a client may send, classified once on arrival
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Join { match_id: String },
    Raid(RaidPayload),
    LobbyTouch(LobbyTouch),
    InitialState(Box<MatchState>),
    LegacyState(Box<MatchState>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinArgs {
    #[serde(default)]
    match_id: String,
}

/// Payload carried either at the top level or under `data`
fn payload(frame: Value) -> Value {
    match frame {
        Value::Object(mut fields) => match fields.remove("data") {
            Some(data @ Value::Object(_)) => data,
            Some(other) => {
                fields.insert("data".to_string(), other);
                Value::Object(fields)
            }
            None => Value::Object(fields),
        },
        other => other,
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> ServiceResult<T> {
    serde_json::from_value(value).map_err(|e| {
        tracing::debug!("Failed to decode frame: {e}");
        AppError::DecodingRequestFailed
    })
}

impl InboundFrame {
    pub fn parse(text: &str) -> ServiceResult<Self> {
        let frame: Value =
            serde_json::from_str(text).map_err(|_| AppError::DecodingRequestFailed)?;
        if !frame.is_object() {
            return Err(AppError::DecodingRequestFailed);
        }
        if frame.get("raidType").is_some() {
            return Ok(InboundFrame::Raid(decode(frame)?));
        }

        let kind = frame.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "join" => {
                let JoinArgs { match_id } = decode(frame)?;
                Ok(InboundFrame::Join { match_id })
            }
            "lobbyTouch" => Ok(InboundFrame::LobbyTouch(decode(payload(frame))?)),
            "initialState" => Ok(InboundFrame::InitialState(decode(payload(frame))?)),
            _ => Ok(InboundFrame::LegacyState(decode(payload(frame))?)),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            InboundFrame::Join { .. } => "join",
            InboundFrame::Raid(_) => "raid",
            InboundFrame::LobbyTouch(_) => "lobbyTouch",
            InboundFrame::InitialState(_) => "initialState",
            InboundFrame::LegacyState(_) => "legacyState",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsExtra {
    pub commentary_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    GameStats {
        data: Box<MatchState>,
        extra: StatsExtra,
    },
    RequestJoin,
    RequestInit,
    Error {
        code: String,
        error: String,
    },
}

impl OutboundFrame {
    pub fn game_stats(state: &MatchState) -> Self {
        OutboundFrame::GameStats {
            extra: StatsExtra {
                commentary_list: state.commentary.clone(),
            },
            data: Box::new(state.clone()),
        }
    }

    pub fn from_error(error: &AppError) -> Self {
        OutboundFrame::Error {
            code: error.code().to_string(),
            error: error.message().to_string(),
        }
    }

    pub fn to_payload(&self) -> ServiceResult<Utf8Bytes> {
        let payload = serde_json::to_string(self)?;
        Ok(Utf8Bytes::from(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::match_states::Team;

    const STATE_JSON: &str = r#"{
        "teamA": {"name": "Tigers", "score": 0},
        "teamB": {"name": "Lions", "score": 0},
        "playerStats": {},
        "teamAPlayerIds": ["p1"],
        "teamBPlayerIds": ["p4"]
    }"#;

    #[test]
    fn raid_type_wins_over_type_field() {
        let text = r#"{"type": "gameStats", "raidType": "successful", "raiderId": "p1",
            "defenderIds": ["p4"], "raidingTeam": "A"}"#;
        let frame = InboundFrame::parse(text).unwrap();
        let InboundFrame::Raid(raid) = frame else {
            panic!("expected a raid frame, got {frame:?}");
        };
        assert_eq!(raid.raid_type, "successful");
        assert_eq!(raid.defender_ids, vec!["p4".to_string()]);
        assert!(!raid.bonus_taken);
    }

    #[test]
    fn classifies_join() {
        let frame = InboundFrame::parse(r#"{"type": "join", "matchId": "m-7"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Join {
                match_id: "m-7".to_string()
            }
        );
    }

    #[test]
    fn lobby_touch_reads_nested_data() {
        let text = r#"{"type": "lobbyTouch",
            "data": {"touchedPlayerId": "p4", "isRaider": false, "scoringTeam": "A"}}"#;
        let InboundFrame::LobbyTouch(touch) = InboundFrame::parse(text).unwrap() else {
            panic!("expected a lobby touch");
        };
        assert_eq!(touch.touched_player_id, "p4");
        assert_eq!(touch.scoring_team, "A");
    }

    #[test]
    fn initial_state_and_legacy_state() {
        let initial = format!(r#"{{"type": "initialState", "data": {STATE_JSON}}}"#);
        assert!(matches!(
            InboundFrame::parse(&initial).unwrap(),
            InboundFrame::InitialState(_)
        ));

        let legacy = format!(r#"{{"type": "gameStats", "data": {STATE_JSON}}}"#);
        let InboundFrame::LegacyState(state) = InboundFrame::parse(&legacy).unwrap() else {
            panic!("expected a legacy state");
        };
        assert_eq!(state.roster(Team::B), ["p4".to_string()]);

        assert!(matches!(
            InboundFrame::parse(STATE_JSON).unwrap(),
            InboundFrame::LegacyState(_)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            InboundFrame::parse("not json"),
            Err(AppError::DecodingRequestFailed)
        );
        assert_eq!(
            InboundFrame::parse("[1, 2]"),
            Err(AppError::DecodingRequestFailed)
        );
        assert_eq!(
            InboundFrame::parse(r#"{"type": "whatever"}"#),
            Err(AppError::DecodingRequestFailed)
        );
    }

    #[test]
    fn control_frames_encode_as_tagged_objects() {
        let payload = OutboundFrame::RequestInit.to_payload().unwrap();
        assert_eq!(payload.as_str(), r#"{"type":"requestInit"}"#);

        let payload = OutboundFrame::from_error(&AppError::RaidsWrongTurn)
            .to_payload()
            .unwrap();
        let value: Value = serde_json::from_str(payload.as_str()).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "raids.wrong_turn");
    }

    #[test]
    fn game_stats_carries_commentary() {
        let mut state: MatchState = serde_json::from_str(STATE_JSON).unwrap();
        state.commentary = vec!["Raid SUCCESS!".to_string()];
        let payload = OutboundFrame::game_stats(&state).to_payload().unwrap();
        let value: Value = serde_json::from_str(payload.as_str()).unwrap();
        assert_eq!(value["type"], "gameStats");
        assert_eq!(value["extra"]["commentaryList"][0], "Raid SUCCESS!");
        assert_eq!(value["data"]["teamA"]["name"], "Tigers");
    }
}
