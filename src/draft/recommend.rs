// Round-aware positional-need recommendation.
//
// This is the only module that interprets ADP as "value"; everywhere else
// it is an opaque sortable field. Tier boundaries, priority lists, and
// positional caps are plain policy data, not invariants, so leagues can
// tune them in config without touching the selection logic.

use std::collections::HashMap;

use crate::catalog::{DraftablePlayer, Position};
use crate::draft::state::Pick;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Tunable knobs for the recommender.
///
/// Rounds are split into three tiers, each with its own position priority
/// list. `position_caps` bounds how many players at a position the
/// recommender will voluntarily take for one team; positions without an
/// entry use `default_position_cap`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendPolicy {
    /// Last round of the early tier (inclusive).
    pub early_through_round: u32,
    /// Last round of the middle tier (inclusive); later rounds are late.
    pub middle_through_round: u32,
    pub early_priority: Vec<Position>,
    pub middle_priority: Vec<Position>,
    pub late_priority: Vec<Position>,
    pub position_caps: HashMap<Position, u32>,
    pub default_position_cap: u32,
}

impl Default for RecommendPolicy {
    fn default() -> Self {
        let mut position_caps = HashMap::new();
        position_caps.insert(Position::Quarterback, 3);
        position_caps.insert(Position::TightEnd, 2);
        position_caps.insert(Position::Kicker, 1);
        position_caps.insert(Position::Defense, 1);

        RecommendPolicy {
            early_through_round: 3,
            middle_through_round: 10,
            early_priority: vec![
                Position::RunningBack,
                Position::WideReceiver,
                Position::Quarterback,
                Position::TightEnd,
            ],
            middle_priority: vec![
                Position::WideReceiver,
                Position::RunningBack,
                Position::TightEnd,
                Position::Quarterback,
            ],
            late_priority: vec![
                Position::WideReceiver,
                Position::RunningBack,
                Position::TightEnd,
                Position::Quarterback,
                Position::Kicker,
                Position::Defense,
            ],
            position_caps,
            default_position_cap: 6,
        }
    }
}

impl RecommendPolicy {
    /// The priority list for a given 1-based round.
    pub fn priority_for_round(&self, round: u32) -> &[Position] {
        if round <= self.early_through_round {
            &self.early_priority
        } else if round <= self.middle_through_round {
            &self.middle_priority
        } else {
            &self.late_priority
        }
    }

    /// The cap for a position, falling back to the default.
    pub fn cap(&self, position: Position) -> u32 {
        self.position_caps
            .get(&position)
            .copied()
            .unwrap_or(self.default_position_cap)
    }
}

// ---------------------------------------------------------------------------
// Team profile
// ---------------------------------------------------------------------------

/// Positions a team has already filled, derived from the pick list on
/// demand and never persisted.
#[derive(Debug, Clone, Default)]
pub struct TeamDraftProfile {
    counts: HashMap<Position, u32>,
}

impl TeamDraftProfile {
    /// Tally one team's picks by position. A team with no picks (including
    /// an id that never appears) yields an empty profile.
    pub fn from_picks(picks: &[Pick], team_id: &str) -> Self {
        let mut counts: HashMap<Position, u32> = HashMap::new();
        for pick in picks.iter().filter(|p| p.team_id == team_id) {
            *counts.entry(pick.position).or_insert(0) += 1;
        }
        TeamDraftProfile { counts }
    }

    pub fn count(&self, position: Position) -> u32 {
        self.counts.get(&position).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Picks the best available player for a team.
///
/// Walks the round tier's priority list and takes the lowest-ADP undrafted
/// player at the first position the team still has room for. Positions at
/// their cap are skipped, as are positions with nobody left. If no
/// prioritized position produces a candidate, falls back to the lowest-ADP
/// player overall. Returns `None` only when nothing is available.
pub fn recommend<'a>(
    available: &'a [DraftablePlayer],
    profile: &TeamDraftProfile,
    round: u32,
    policy: &RecommendPolicy,
) -> Option<&'a DraftablePlayer> {
    let undrafted: Vec<&DraftablePlayer> = available.iter().filter(|p| !p.claimed).collect();

    for &position in policy.priority_for_round(round) {
        if profile.count(position) >= policy.cap(position) {
            continue;
        }
        let candidate = best_of(undrafted.iter().copied().filter(|p| p.position == position));
        if candidate.is_some() {
            return candidate;
        }
    }

    best_of(undrafted.into_iter())
}

/// Lowest ADP wins; ties break on player id so the result is stable.
fn best_of<'a>(players: impl Iterator<Item = &'a DraftablePlayer>) -> Option<&'a DraftablePlayer> {
    players.min_by(|a, b| {
        a.adp
            .total_cmp(&b.adp)
            .then_with(|| a.player_id.cmp(&b.player_id))
    })
}
