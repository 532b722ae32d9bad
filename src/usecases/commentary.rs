use crate::entities::match_states::{MatchState, RaidDetails, RaidDetailsKind};

pub const COMMENTARY_LIMIT: usize = 20;

fn defender_list(defenders: &[String]) -> String {
    defenders.join(", ")
}

pub fn describe(details: &RaidDetails) -> String {
    let raider = &details.raider;
    let mut line = match details.kind {
        RaidDetailsKind::RaidSuccess if details.defenders.is_empty() => {
            format!("Raid SUCCESS! {raider} scored {} points.", details.points_gained)
        }
        RaidDetailsKind::RaidSuccess => format!(
            "Raid SUCCESS! {raider} scored {} points, got out: {}.",
            details.points_gained,
            defender_list(&details.defenders),
        ),
        RaidDetailsKind::DefenseSuccess if details.defenders.is_empty() => {
            format!("Defence SUCCESS! {raider} stopped.")
        }
        RaidDetailsKind::DefenseSuccess => format!(
            "Defence SUCCESS! {raider} stopped by {}.",
            defender_list(&details.defenders),
        ),
        RaidDetailsKind::EmptyRaid => format!("Empty raid by {raider}. No points scored."),
        RaidDetailsKind::DoOrDieRaid if details.bonus_taken => {
            format!("Do-or-die raid by {raider}. Survived with the bonus.")
        }
        RaidDetailsKind::DoOrDieRaid => {
            format!("Do-or-die raid by {raider} FAILED. {raider} is out.")
        }
        RaidDetailsKind::LobbyTouch => format!("Lobby touch! {raider} is out."),
        RaidDetailsKind::None | RaidDetailsKind::Unknown => format!(
            "Action by {raider}. Points: {}.",
            details.points_gained
        ),
    };

    if details.super_tackle {
        line.push_str(" Super Tackle!");
    }
    if details.bonus_taken && details.kind != RaidDetailsKind::DoOrDieRaid {
        line.push_str(" Bonus taken!");
    }
    if let Some(team) = details.all_out_team.filter(|_| details.all_out) {
        line.push_str(&format!(" ALL OUT! Team {team} is eliminated."));
    }
    line
}

pub fn describe_result(state: &MatchState) -> String {
    let (team_a, team_b) = (&state.team_a, &state.team_b);
    let winner = match team_a.score.cmp(&team_b.score) {
        std::cmp::Ordering::Greater => format!("{} win!", team_a.name),
        std::cmp::Ordering::Less => format!("{} win!", team_b.name),
        std::cmp::Ordering::Equal => "It's a tie!".to_string(),
    };
    format!(
        "Full time: {} {} - {} {}. {winner}",
        team_a.name, team_a.score, team_b.score, team_b.name
    )
}

pub fn push(state: &mut MatchState, line: String) {
    state.commentary.insert(0, line);
    state.commentary.truncate(COMMENTARY_LIMIT);
}

/// Prepends the line for the latest raid details and keeps the newest entries
pub fn record(state: &mut MatchState) -> String {
    let line = describe(&state.last_raid_details);
    push(state, line.clone());
    line
}
