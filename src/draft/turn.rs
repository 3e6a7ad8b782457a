// Turn plan generation for snake and linear drafts.
//
// The plan is computed once when a draft is created and never mutated
// afterwards; progress through the draft is just an index into it (the
// number of accepted picks). Overall pick numbers are 1-based and
// continuous across rounds.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::draft::DraftError;

/// One slot in the precomputed draft order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based round number.
    pub round: u32,
    /// 1-based position within the round, in pick order (so in a reversed
    /// snake round, slot 1 belongs to the team listed last).
    pub slot: u32,
    /// 1-based overall pick number, continuous across rounds.
    pub overall: u32,
    pub team_id: String,
}

/// Builds the full pick order for a draft up front.
///
/// In snake mode, even-numbered rounds run through `team_order` in reverse;
/// in linear mode every round repeats the listed order. Rejects an empty
/// team list, duplicate team ids, and a zero round count.
pub fn generate_turn_plan(
    team_order: &[String],
    rounds: u32,
    snake: bool,
) -> Result<Vec<Turn>, DraftError> {
    if team_order.is_empty() {
        return Err(DraftError::InvalidSettings {
            reason: "team order is empty".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for team_id in team_order {
        if !seen.insert(team_id.as_str()) {
            return Err(DraftError::InvalidSettings {
                reason: format!("duplicate team id {team_id}"),
            });
        }
    }
    if rounds < 1 {
        return Err(DraftError::InvalidSettings {
            reason: "rounds must be at least 1".to_string(),
        });
    }

    let teams = team_order.len() as u32;
    let mut plan = Vec::with_capacity((teams * rounds) as usize);
    for round in 1..=rounds {
        let reversed = snake && round % 2 == 0;
        for slot in 1..=teams {
            let index = if reversed { teams - slot } else { slot - 1 };
            plan.push(Turn {
                round,
                slot,
                overall: (round - 1) * teams + slot,
                team_id: team_order[index as usize].clone(),
            });
        }
    }
    Ok(plan)
}

/// Seeded shuffle of a team list, used to randomize draft order at creation
/// time while keeping runs reproducible.
pub fn shuffle_team_order(teams: &[String], seed: u64) -> Vec<String> {
    let mut order = teams.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    // -- plan shape --

    #[test]
    fn snake_plan_four_teams_two_rounds() {
        let plan = generate_turn_plan(&teams(&["alpha", "bravo", "chaos", "delta"]), 2, true)
            .expect("valid plan");

        let order: Vec<(u32, &str)> = plan
            .iter()
            .map(|t| (t.overall, t.team_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (1, "alpha"),
                (2, "bravo"),
                (3, "chaos"),
                (4, "delta"),
                (5, "delta"),
                (6, "chaos"),
                (7, "bravo"),
                (8, "alpha"),
            ]
        );
    }

    #[test]
    fn overall_numbers_are_continuous_and_unique() {
        let plan =
            generate_turn_plan(&teams(&["a", "b", "c"]), 5, true).expect("valid plan");
        let overalls: Vec<u32> = plan.iter().map(|t| t.overall).collect();
        assert_eq!(overalls, (1..=15).collect::<Vec<u32>>());
    }

    #[test]
    fn slot_numbers_restart_each_round() {
        let plan =
            generate_turn_plan(&teams(&["a", "b", "c"]), 2, true).expect("valid plan");
        let slots: Vec<(u32, u32)> = plan.iter().map(|t| (t.round, t.slot)).collect();
        assert_eq!(
            slots,
            vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]
        );
    }

    #[test]
    fn snake_reverses_even_rounds_only() {
        let plan =
            generate_turn_plan(&teams(&["a", "b"]), 4, true).expect("valid plan");
        let by_round: Vec<&str> = plan.iter().map(|t| t.team_id.as_str()).collect();
        assert_eq!(by_round, vec!["a", "b", "b", "a", "a", "b", "b", "a"]);
    }

    #[test]
    fn linear_plan_repeats_listed_order() {
        let plan =
            generate_turn_plan(&teams(&["a", "b", "c"]), 3, false).expect("valid plan");
        let by_round: Vec<&str> = plan.iter().map(|t| t.team_id.as_str()).collect();
        assert_eq!(
            by_round,
            vec!["a", "b", "c", "a", "b", "c", "a", "b", "c"]
        );
    }

    #[test]
    fn each_team_picks_once_per_round() {
        let names = teams(&["alpha", "bravo", "chaos", "delta", "echo"]);
        let plan = generate_turn_plan(&names, 6, true).expect("valid plan");
        for round in 1..=6 {
            let mut in_round: Vec<&str> = plan
                .iter()
                .filter(|t| t.round == round)
                .map(|t| t.team_id.as_str())
                .collect();
            in_round.sort();
            let mut expected: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
            expected.sort();
            assert_eq!(in_round, expected, "round {round}");
        }
    }

    #[test]
    fn single_team_draft_is_valid() {
        let plan = generate_turn_plan(&teams(&["solo"]), 3, true).expect("valid plan");
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|t| t.team_id == "solo"));
        assert_eq!(plan[2].overall, 3);
    }

    // -- rejected settings --

    #[test]
    fn empty_team_list_is_rejected() {
        let err = generate_turn_plan(&[], 2, true).unwrap_err();
        assert!(matches!(err, DraftError::InvalidSettings { .. }));
    }

    #[test]
    fn duplicate_team_ids_are_rejected() {
        let err =
            generate_turn_plan(&teams(&["alpha", "bravo", "alpha"]), 2, true).unwrap_err();
        assert!(matches!(err, DraftError::InvalidSettings { .. }));
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let err = generate_turn_plan(&teams(&["alpha", "bravo"]), 0, true).unwrap_err();
        assert!(matches!(err, DraftError::InvalidSettings { .. }));
    }

    // -- order shuffle --

    #[test]
    fn shuffle_is_deterministic_for_a_seed() {
        let names = teams(&["alpha", "bravo", "chaos", "delta", "echo", "foxtrot"]);
        assert_eq!(shuffle_team_order(&names, 99), shuffle_team_order(&names, 99));
    }

    #[test]
    fn shuffle_varies_across_seeds() {
        let names = teams(&["alpha", "bravo", "chaos", "delta", "echo", "foxtrot"]);
        let orders: HashSet<Vec<String>> =
            (0..16).map(|seed| shuffle_team_order(&names, seed)).collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn shuffle_keeps_every_team() {
        let names = teams(&["alpha", "bravo", "chaos"]);
        let mut shuffled = shuffle_team_order(&names, 7);
        shuffled.sort();
        let mut expected = names.clone();
        expected.sort();
        assert_eq!(shuffled, expected);
    }
}
