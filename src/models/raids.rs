use crate::common::error::{AppError, ServiceResult};
use crate::entities::match_states::Team;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmittedEmptyRaidCounts {
    pub team_a: i64,
    pub team_b: i64,
}

/// Raid event as scorers submit it, validated by the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RaidPayload {
    pub raid_type: String,
    pub raider_id: String,
    pub defender_ids: Vec<String>,
    pub raiding_team: String,
    pub bonus_taken: bool,
    pub empty_raid_counts: SubmittedEmptyRaidCounts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidRequest {
    pub match_id: String,
    #[serde(flatten)]
    pub raid: RaidPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidType {
    Successful,
    Defense,
    Empty,
}

impl RaidType {
    pub fn parse(value: &str) -> ServiceResult<Self> {
        match value {
            "successful" => Ok(RaidType::Successful),
            "defense" => Ok(RaidType::Defense),
            "empty" => Ok(RaidType::Empty),
            _ => Err(AppError::RaidsInvalidType),
        }
    }

    pub const fn requires_defenders(self) -> bool {
        matches!(self, RaidType::Successful | RaidType::Defense)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRaid {
    pub raid_type: RaidType,
    pub raider_id: String,
    pub defender_ids: Vec<String>,
    pub raiding_team: Team,
    pub bonus_taken: bool,
    pub empty_raid_count_a: u32,
    pub empty_raid_count_b: u32,
}

impl ValidatedRaid {
    pub const fn submitted_empty_count(&self, team: Team) -> u32 {
        match team {
            Team::A => self.empty_raid_count_a,
            Team::B => self.empty_raid_count_b,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LobbyTouch {
    pub touched_player_id: String,
    pub is_raider: bool,
    pub scoring_team: String,
}
