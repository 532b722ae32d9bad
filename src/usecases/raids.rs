use crate::common::error::{AppError, ServiceResult};
use crate::entities::match_states::{MatchState, PlayerStatus, RaidDetails, RaidDetailsKind, Team};
use crate::models::raids::{LobbyTouch, RaidPayload, RaidType, ValidatedRaid};
use crate::usecases::commentary;
use tracing::debug;

const DO_OR_DIE_THRESHOLD: u32 = 3;
const SUPER_TACKLE_MAX_DEFENDERS: usize = 3;
const ALL_OUT_POINTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct RaidOutcome {
    pub state: MatchState,
    pub commentary: String,
}

fn validated_count(count: i64) -> ServiceResult<u32> {
    match count {
        ..0 => Err(AppError::RaidsNegativeEmptyCount),
        _ => Ok(u32::try_from(count).unwrap_or(u32::MAX)),
    }
}

/// Checks a raid against the current state, lazily creating stats for
/// rostered players that were never described.
pub fn validate(state: &mut MatchState, raid: &RaidPayload) -> ServiceResult<ValidatedRaid> {
    let raid_type = RaidType::parse(&raid.raid_type)?;

    if raid.raider_id.is_empty() {
        return Err(AppError::RaidsMissingRaider);
    }
    let raider = state
        .reconcile_player(&raid.raider_id)
        .ok_or(AppError::RaidsRaiderNotFound)?;
    if !raider.is_in() {
        return Err(AppError::RaidsRaiderNotActive);
    }

    let raiding_team = Team::parse(&raid.raiding_team).ok_or(AppError::RaidsInvalidTeam)?;
    if raiding_team != state.expected_raiding_team() {
        return Err(AppError::RaidsWrongTurn);
    }

    if raid_type.requires_defenders() {
        if raid.defender_ids.is_empty() {
            return Err(AppError::RaidsMissingDefenders);
        }
        let defending_team = raiding_team.opponent();
        for (index, defender_id) in raid.defender_ids.iter().enumerate() {
            if *defender_id == raid.raider_id {
                return Err(AppError::RaidsDefenderIsRaider);
            }
            if raid.defender_ids[..index].contains(defender_id) {
                return Err(AppError::RaidsDuplicateDefender);
            }
            state
                .reconcile_player(defender_id)
                .ok_or(AppError::RaidsDefenderNotFound)?;
            if state.team_of(defender_id) != Some(defending_team) {
                return Err(AppError::RaidsDefenderWrongTeam);
            }
            let defender = state
                .player(defender_id)
                .ok_or(AppError::RaidsDefenderNotFound)?;
            if !defender.is_in() {
                return Err(AppError::RaidsDefenderNotActive);
            }
        }
    }

    let empty_raid_count_a = validated_count(raid.empty_raid_counts.team_a)?;
    let empty_raid_count_b = validated_count(raid.empty_raid_counts.team_b)?;

    Ok(ValidatedRaid {
        raid_type,
        raider_id: raid.raider_id.clone(),
        defender_ids: raid.defender_ids.clone(),
        raiding_team,
        bonus_taken: raid.bonus_taken,
        empty_raid_count_a,
        empty_raid_count_b,
    })
}

/// Applies a raid to a copy of the state. On error the input is untouched.
pub fn resolve(state: &MatchState, raid: &RaidPayload) -> ServiceResult<RaidOutcome> {
    if state.match_ended {
        return Err(AppError::MatchesEnded);
    }

    let raid_number = state
        .raid_number
        .checked_add(1)
        .ok_or(AppError::MatchesCounterOutOfRange)?;

    let mut next = state.clone();
    let raid = validate(&mut next, raid)?;
    match raid.raid_type {
        RaidType::Successful => apply_successful_raid(&mut next, &raid),
        RaidType::Defense => apply_defense_success(&mut next, &raid),
        RaidType::Empty => apply_empty_raid(&mut next, &raid),
    }
    next.raid_number = raid_number;
    let commentary = commentary::record(&mut next);

    debug!(
        match_id = %next.match_id,
        raid_number = next.raid_number,
        raid_type = ?raid.raid_type,
        "Resolved raid"
    );
    Ok(RaidOutcome {
        state: next,
        commentary,
    })
}

fn defender_names(state: &MatchState, defender_ids: &[String]) -> Vec<String> {
    defender_ids
        .iter()
        .map(|id| state.player_name(id))
        .collect()
}

fn set_status(state: &mut MatchState, player_id: &str, status: PlayerStatus) {
    if let Some(player) = state.player_mut(player_id) {
        player.status = status;
    }
}

fn add_raid_points(state: &mut MatchState, player_id: &str, points: u32) {
    if let Some(player) = state.player_mut(player_id) {
        player.add_raid_points(points);
    }
}

fn apply_successful_raid(state: &mut MatchState, raid: &ValidatedRaid) {
    let touch_points = u32::try_from(raid.defender_ids.len()).unwrap_or(u32::MAX);
    let points = touch_points.saturating_add(u32::from(raid.bonus_taken));

    state.add_team_points(raid.raiding_team, points);
    add_raid_points(state, &raid.raider_id, points);
    for defender_id in &raid.defender_ids {
        set_status(state, defender_id, PlayerStatus::Out);
    }
    state.empty_raid_counts.set(raid.raiding_team, 0);

    // the bonus point never revives anyone
    state.revive(raid.raiding_team, raid.defender_ids.len());

    state.last_raid_details = RaidDetails {
        kind: RaidDetailsKind::RaidSuccess,
        raider: state.player_name(&raid.raider_id),
        defenders: defender_names(state, &raid.defender_ids),
        points_gained: points,
        bonus_taken: raid.bonus_taken,
        ..Default::default()
    };
    check_all_out(state);
}

fn apply_defense_success(state: &mut MatchState, raid: &ValidatedRaid) {
    let defending_team = raid.raiding_team.opponent();
    let active_defenders = state.active_count(defending_team);
    let super_tackle = active_defenders <= SUPER_TACKLE_MAX_DEFENDERS && !raid.bonus_taken;
    let tackle_points = if super_tackle { 2 } else { 1 };

    if raid.bonus_taken {
        state.add_team_points(raid.raiding_team, 1);
        add_raid_points(state, &raid.raider_id, 1);
    }
    state.add_team_points(defending_team, tackle_points);
    set_status(state, &raid.raider_id, PlayerStatus::Out);
    for defender_id in &raid.defender_ids {
        if let Some(defender) = state.player_mut(defender_id) {
            defender.add_defence_points(1);
        }
    }

    state.last_raid_details = RaidDetails {
        kind: RaidDetailsKind::DefenseSuccess,
        raider: state.player_name(&raid.raider_id),
        defenders: defender_names(state, &raid.defender_ids),
        points_gained: tackle_points + u32::from(raid.bonus_taken),
        bonus_taken: raid.bonus_taken,
        super_tackle,
        ..Default::default()
    };
    state.empty_raid_counts.set(raid.raiding_team, 0);

    check_all_out(state);
    state.revive(defending_team, 1);
}

fn apply_empty_raid(state: &mut MatchState, raid: &ValidatedRaid) {
    let raiding_team = raid.raiding_team;
    let other_team = raiding_team.opponent();

    if raid.bonus_taken {
        state.add_team_points(raiding_team, 1);
        add_raid_points(state, &raid.raider_id, 1);
    }

    // the client snapshot may count this raid or not, the server never goes backwards
    let stored = state.empty_raid_counts;
    let empty_count = raid
        .submitted_empty_count(raiding_team)
        .max(stored.get(raiding_team).saturating_add(1));
    let other_count = raid
        .submitted_empty_count(other_team)
        .max(stored.get(other_team));
    state.empty_raid_counts.set(raiding_team, empty_count);
    state.empty_raid_counts.set(other_team, other_count);

    let do_or_die = empty_count >= DO_OR_DIE_THRESHOLD;
    let raider_out = do_or_die && !raid.bonus_taken;
    if do_or_die {
        state.empty_raid_counts.set(raiding_team, 0);
    }
    if raider_out {
        set_status(state, &raid.raider_id, PlayerStatus::Out);
        state.add_team_points(other_team, 1);
        state.revive(other_team, 1);
    }

    state.last_raid_details = RaidDetails {
        kind: match do_or_die {
            true => RaidDetailsKind::DoOrDieRaid,
            false => RaidDetailsKind::EmptyRaid,
        },
        raider: state.player_name(&raid.raider_id),
        points_gained: u32::from(raid.bonus_taken),
        bonus_taken: raid.bonus_taken,
        ..Default::default()
    };
    if raider_out {
        check_all_out(state);
    }
}

/// Eliminated teams concede two points and come back in full.
/// Both teams are checked independently.
pub fn check_all_out(state: &mut MatchState) -> bool {
    let mut any_all_out = false;
    for team in [Team::A, Team::B] {
        if !state.is_all_out(team) {
            continue;
        }
        state.add_team_points(team.opponent(), ALL_OUT_POINTS);
        state.revive_all(team);
        state.last_raid_details.all_out = true;
        state.last_raid_details.all_out_team = Some(team);
        state.last_raid_details.points_gained =
            state.last_raid_details.points_gained.saturating_add(ALL_OUT_POINTS);
        any_all_out = true;
    }
    any_all_out
}

/// A player stepping into the lobby: one point to the scoring team, the player is out.
/// Turn order and defenders are not checked and the raid number does not move.
pub fn apply_lobby_touch(state: &MatchState, touch: &LobbyTouch) -> ServiceResult<RaidOutcome> {
    if state.match_ended {
        return Err(AppError::MatchesEnded);
    }
    let scoring_team = Team::parse(&touch.scoring_team).ok_or(AppError::RaidsInvalidTeam)?;

    let mut next = state.clone();
    let player = next
        .reconcile_player(&touch.touched_player_id)
        .ok_or(AppError::PlayersNotFound)?;
    if !player.is_in() {
        return Err(AppError::PlayersNotActive);
    }

    next.add_team_points(scoring_team, 1);
    set_status(&mut next, &touch.touched_player_id, PlayerStatus::Out);
    next.last_raid_details = RaidDetails {
        kind: RaidDetailsKind::LobbyTouch,
        raider: next.player_name(&touch.touched_player_id),
        points_gained: 1,
        ..Default::default()
    };
    check_all_out(&mut next);
    let commentary = commentary::record(&mut next);

    debug!(
        match_id = %next.match_id,
        player_id = %touch.touched_player_id,
        is_raider = touch.is_raider,
        "Resolved lobby touch"
    );
    Ok(RaidOutcome {
        state: next,
        commentary,
    })
}
