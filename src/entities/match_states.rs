use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound for scores, points and counters accepted from clients
pub const MAX_COUNTER: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub const fn opponent(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    /// Team A raids on even raid numbers, team B on odd ones
    pub const fn raiding_for(raid_number: u32) -> Self {
        match raid_number % 2 {
            0 => Team::A,
            _ => Team::B,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(Team::A),
            "B" => Some(Team::B),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Team::A => "A",
            Team::B => "B",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TeamScore {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    In,
    Out,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStat {
    pub name: String,
    pub id: String,
    pub raid_points: u32,
    pub defence_points: u32,
    pub total_points: u32,
    pub status: PlayerStatus,
}

impl PlayerStat {
    /// Zero-valued stat for a rostered player the client never described
    pub fn placeholder(player_id: &str) -> Self {
        Self {
            name: player_id.to_string(),
            id: player_id.to_string(),
            ..Default::default()
        }
    }

    pub const fn is_in(&self) -> bool {
        matches!(self.status, PlayerStatus::In)
    }

    pub fn add_raid_points(&mut self, points: u32) {
        self.raid_points = self.raid_points.saturating_add(points);
        self.total_points = self.total_points.saturating_add(points);
    }

    pub fn add_defence_points(&mut self, points: u32) {
        self.defence_points = self.defence_points.saturating_add(points);
        self.total_points = self.total_points.saturating_add(points);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmptyRaidCounts {
    pub team_a: u32,
    pub team_b: u32,
}

impl EmptyRaidCounts {
    pub const fn get(&self, team: Team) -> u32 {
        match team {
            Team::A => self.team_a,
            Team::B => self.team_b,
        }
    }

    pub fn set(&mut self, team: Team, count: u32) {
        match team {
            Team::A => self.team_a = count,
            Team::B => self.team_b = count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RaidDetailsKind {
    #[default]
    #[serde(rename = "")]
    None,
    RaidSuccess,
    DefenseSuccess,
    EmptyRaid,
    DoOrDieRaid,
    LobbyTouch,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RaidDetails {
    #[serde(rename = "type")]
    pub kind: RaidDetailsKind,
    pub raider: String,
    pub defenders: Vec<String>,
    pub points_gained: u32,
    pub bonus_taken: bool,
    pub super_tackle: bool,
    pub all_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_out_team: Option<Team>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    #[serde(default)]
    pub match_id: String,
    pub team_a: TeamScore,
    pub team_b: TeamScore,
    pub player_stats: BTreeMap<String, PlayerStat>,
    #[serde(rename = "teamAPlayerIds", default)]
    pub team_a_player_ids: Vec<String>,
    #[serde(rename = "teamBPlayerIds", default)]
    pub team_b_player_ids: Vec<String>,
    #[serde(default)]
    pub raid_number: u32,
    #[serde(default)]
    pub empty_raid_counts: EmptyRaidCounts,
    #[serde(default, alias = "raidDetails")]
    pub last_raid_details: RaidDetails,
    #[serde(default)]
    pub commentary: Vec<String>,
    #[serde(default)]
    pub match_ended: bool,
}

impl MatchState {
    pub fn roster(&self, team: Team) -> &[String] {
        match team {
            Team::A => &self.team_a_player_ids,
            Team::B => &self.team_b_player_ids,
        }
    }

    pub fn add_team_points(&mut self, team: Team, points: u32) {
        let score = match team {
            Team::A => &mut self.team_a.score,
            Team::B => &mut self.team_b.score,
        };
        *score = score.saturating_add(points);
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerStat> {
        self.player_stats.get(player_id)
    }

    pub fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerStat> {
        self.player_stats.get_mut(player_id)
    }

    pub fn player_name(&self, player_id: &str) -> String {
        self.player(player_id)
            .map(|player| player.name.clone())
            .unwrap_or_else(|| player_id.to_string())
    }

    pub fn team_of(&self, player_id: &str) -> Option<Team> {
        [Team::A, Team::B]
            .into_iter()
            .find(|team| self.roster(*team).iter().any(|id| id == player_id))
    }

    /// Looks up a player, creating a zero-valued stat when the id is rostered
    /// but missing from `playerStats`.
    pub fn reconcile_player(&mut self, player_id: &str) -> Option<&PlayerStat> {
        if !self.player_stats.contains_key(player_id) {
            self.team_of(player_id)?;
            tracing::info!(match_id = %self.match_id, player_id, "Initialized missing player stat");
            self.player_stats
                .insert(player_id.to_string(), PlayerStat::placeholder(player_id));
        }
        self.player_stats.get(player_id)
    }

    pub fn active_count(&self, team: Team) -> usize {
        self.roster(team)
            .iter()
            .filter(|id| self.player(id).is_some_and(PlayerStat::is_in))
            .count()
    }

    /// Whether every rostered player of the team is out, an empty roster never is
    pub fn is_all_out(&self, team: Team) -> bool {
        let roster = self.roster(team);
        !roster.is_empty()
            && roster
                .iter()
                .all(|id| self.player(id).is_some_and(|player| !player.is_in()))
    }

    /// Flips up to `count` out players of the team back in, in roster order.
    /// Returns how many players were revived.
    pub fn revive(&mut self, team: Team, count: usize) -> usize {
        let roster = match team {
            Team::A => &self.team_a_player_ids,
            Team::B => &self.team_b_player_ids,
        };
        let mut revived = 0;
        for player_id in roster {
            if revived >= count {
                break;
            }
            if let Some(player) = self.player_stats.get_mut(player_id)
                && !player.is_in()
            {
                player.status = PlayerStatus::In;
                revived += 1;
            }
        }
        revived
    }

    pub fn revive_all(&mut self, team: Team) -> usize {
        let roster_len = self.roster(team).len();
        self.revive(team, roster_len)
    }

    pub const fn expected_raiding_team(&self) -> Team {
        Team::raiding_for(self.raid_number)
    }

    /// Binds a client-submitted snapshot to the match it was sent for
    pub fn normalized(mut self, match_id: &str) -> Self {
        self.match_id = match_id.to_string();
        for (player_id, player) in self.player_stats.iter_mut() {
            if player.id.is_empty() {
                player.id = player_id.clone();
            }
            if player.name.is_empty() {
                player.name = player_id.clone();
            }
            player.total_points = player.raid_points.saturating_add(player.defence_points);
        }
        self
    }

    /// Whether every score, point total and counter is within [`MAX_COUNTER`]
    pub fn counters_in_range(&self) -> bool {
        let counters = [
            self.raid_number,
            self.team_a.score,
            self.team_b.score,
            self.empty_raid_counts.team_a,
            self.empty_raid_counts.team_b,
        ];
        counters.into_iter().all(|counter| counter <= MAX_COUNTER)
            && self
                .player_stats
                .values()
                .all(|player| player.total_points <= MAX_COUNTER)
    }
}
