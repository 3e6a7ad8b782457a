// Draft aggregate: lifecycle state machine, immutable settings, the
// precomputed turn plan, and the append-only pick list.
//
// All mutation goes through `start` and `accept_pick`; everything else is
// read-only. The current turn is not stored anywhere, it is always the plan
// entry at index `picks.len()`.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{PlayerCatalog, Position};
use crate::draft::turn::{generate_turn_plan, Turn};
use crate::draft::validate::{validate_pick, ProposedPick};
use crate::draft::DraftError;

/// Lifecycle of a draft: linear, never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl DraftStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DraftStatus::NotStarted => "not_started",
            DraftStatus::InProgress => "in_progress",
            DraftStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Draft configuration, immutable once the draft is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSettings {
    /// Number of rounds; every team picks once per round.
    pub rounds: u32,
    /// Seconds a team stays on the clock before the engine picks for them.
    pub pick_time_limit_secs: u64,
    /// Whether even rounds run through the team order in reverse.
    pub snake: bool,
    /// Team order for round 1, fixed at creation (shuffle first if a random
    /// order is wanted).
    pub team_order: Vec<String>,
}

impl DraftSettings {
    pub fn pick_time_limit(&self) -> Duration {
        Duration::from_secs(self.pick_time_limit_secs)
    }
}

/// An accepted selection: one player claimed at one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Overall sequence number of the turn this pick filled.
    pub overall: u32,
    pub team_id: String,
    pub player_id: String,
    /// Position denormalized from the catalog at acceptance time.
    pub position: Position,
    pub picked_at: DateTime<Utc>,
}

/// The persisted header of a draft: everything except the picks, which live
/// in their own append-only table. The turn plan is excluded too, since it
/// is a pure function of the settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftMeta {
    pub draft_id: String,
    pub league_id: String,
    pub status: DraftStatus,
    pub settings: DraftSettings,
    pub started_at: Option<DateTime<Utc>>,
}

/// A single draft event for a league.
#[derive(Debug, Clone)]
pub struct Draft {
    pub draft_id: String,
    pub league_id: String,
    pub status: DraftStatus,
    pub settings: DraftSettings,
    pub started_at: Option<DateTime<Utc>>,
    /// Full pick order, generated once at creation and never mutated.
    plan: Vec<Turn>,
    /// Accepted picks, always a strict prefix of `plan`.
    picks: Vec<Pick>,
}

impl Draft {
    /// Creates a draft in `not_started` with its turn plan precomputed.
    pub fn create(
        draft_id: String,
        league_id: &str,
        settings: DraftSettings,
    ) -> Result<Self, DraftError> {
        if settings.pick_time_limit_secs < 1 {
            return Err(DraftError::InvalidSettings {
                reason: "pick time limit must be at least 1 second".to_string(),
            });
        }
        let plan = generate_turn_plan(&settings.team_order, settings.rounds, settings.snake)?;
        Ok(Draft {
            draft_id,
            league_id: league_id.to_string(),
            status: DraftStatus::NotStarted,
            settings,
            started_at: None,
            plan,
            picks: Vec::new(),
        })
    }

    /// Moves the draft to `in_progress`. Only valid from `not_started`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DraftError> {
        if self.status != DraftStatus::NotStarted {
            return Err(DraftError::InvalidTransition {
                operation: "start",
                status: self.status,
            });
        }
        self.status = DraftStatus::InProgress;
        self.started_at = Some(now);
        info!(
            "Draft {} started: {} teams, {} rounds, {} turns",
            self.draft_id,
            self.settings.team_order.len(),
            self.settings.rounds,
            self.plan.len()
        );
        Ok(())
    }

    /// The turn waiting on a pick, or `None` once the plan is exhausted.
    pub fn current_turn(&self) -> Option<&Turn> {
        self.plan.get(self.picks.len())
    }

    pub fn plan(&self) -> &[Turn] {
        &self.plan
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    /// Player ids claimed so far, for catalog availability queries.
    pub fn claimed_player_ids(&self) -> HashSet<&str> {
        self.picks.iter().map(|p| p.player_id.as_str()).collect()
    }

    /// Validates and appends a pick, advancing the draft by one turn.
    ///
    /// On the last turn this also flips the draft to `completed`. On any
    /// validation failure the draft is unchanged and the specific error is
    /// returned; resubmitting after a failure is always safe.
    pub fn accept_pick(
        &mut self,
        proposed: &ProposedPick,
        catalog: &PlayerCatalog,
        now: DateTime<Utc>,
    ) -> Result<Pick, DraftError> {
        validate_pick(self, proposed, catalog)?;

        // validate_pick already confirmed catalog membership.
        let position = catalog
            .get(&proposed.player_id)
            .map(|p| p.position)
            .ok_or_else(|| DraftError::UnknownPlayer {
                player_id: proposed.player_id.clone(),
            })?;

        let pick = Pick {
            overall: proposed.overall,
            team_id: proposed.team_id.clone(),
            player_id: proposed.player_id.clone(),
            position,
            picked_at: now,
        };
        self.picks.push(pick.clone());

        if self.picks.len() == self.plan.len() {
            self.status = DraftStatus::Completed;
            info!(
                "Draft {} completed after {} picks",
                self.draft_id,
                self.picks.len()
            );
        }
        Ok(pick)
    }

    /// The persistable header for this draft.
    pub fn meta(&self) -> DraftMeta {
        DraftMeta {
            draft_id: self.draft_id.clone(),
            league_id: self.league_id.clone(),
            status: self.status,
            settings: self.settings.clone(),
            started_at: self.started_at,
        }
    }

    /// Rebuilds a draft from its persisted header and pick log.
    ///
    /// The turn plan is regenerated from the settings and the stored picks
    /// are replayed against it, re-checking the append-order invariants as
    /// they go. A log that does not line up with the plan (gap, wrong team,
    /// double-claimed player) is rejected rather than patched up.
    pub fn restore(meta: DraftMeta, picks: Vec<Pick>) -> Result<Self, DraftError> {
        let plan = generate_turn_plan(
            &meta.settings.team_order,
            meta.settings.rounds,
            meta.settings.snake,
        )?;

        let mut claimed: HashSet<&str> = HashSet::new();
        for (i, pick) in picks.iter().enumerate() {
            let turn = plan.get(i).ok_or(DraftError::SequenceMismatch {
                submitted: pick.overall,
                expected: plan.len() as u32,
            })?;
            if pick.overall != turn.overall {
                return Err(DraftError::SequenceMismatch {
                    submitted: pick.overall,
                    expected: turn.overall,
                });
            }
            if pick.team_id != turn.team_id {
                return Err(DraftError::NotYourTurn {
                    team_id: pick.team_id.clone(),
                    on_clock: turn.team_id.clone(),
                });
            }
            if !claimed.insert(pick.player_id.as_str()) {
                return Err(DraftError::PlayerAlreadyDrafted {
                    player_id: pick.player_id.clone(),
                });
            }
        }

        let mut status = meta.status;
        if picks.len() == plan.len() && status == DraftStatus::InProgress {
            // The crash happened between the final pick and the status save.
            warn!(
                "Draft {} has a full pick log but was saved in_progress, marking completed",
                meta.draft_id
            );
            status = DraftStatus::Completed;
        }

        Ok(Draft {
            draft_id: meta.draft_id,
            league_id: meta.league_id,
            status,
            settings: meta.settings,
            started_at: meta.started_at,
            plan,
            picks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogPlayer;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn test_settings() -> DraftSettings {
        DraftSettings {
            rounds: 2,
            pick_time_limit_secs: 90,
            snake: true,
            team_order: teams(&["alpha", "bravo", "chaos", "delta"]),
        }
    }

    fn player(id: &str, name: &str, position: Position, adp: f64) -> CatalogPlayer {
        CatalogPlayer {
            player_id: id.to_string(),
            name: name.to_string(),
            position,
            adp,
        }
    }

    fn test_catalog() -> PlayerCatalog {
        PlayerCatalog::new(vec![
            player("p01", "Bijan Robinson", Position::RunningBack, 1.2),
            player("p02", "Ja'Marr Chase", Position::WideReceiver, 1.8),
            player("p03", "Saquon Barkley", Position::RunningBack, 3.1),
            player("p04", "Justin Jefferson", Position::WideReceiver, 4.4),
            player("p05", "Jahmyr Gibbs", Position::RunningBack, 5.0),
            player("p06", "Josh Allen", Position::Quarterback, 22.0),
            player("p07", "Brock Bowers", Position::TightEnd, 18.5),
            player("p08", "CeeDee Lamb", Position::WideReceiver, 6.7),
            player("p09", "Puka Nacua", Position::WideReceiver, 7.9),
        ])
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn proposed(team: &str, player: &str, overall: u32) -> ProposedPick {
        ProposedPick {
            team_id: team.to_string(),
            player_id: player.to_string(),
            overall,
        }
    }

    fn started_draft() -> Draft {
        let mut draft =
            Draft::create("draft_1".to_string(), "league_1", test_settings()).unwrap();
        draft.start(now()).unwrap();
        draft
    }

    fn run_to_completion(draft: &mut Draft, catalog: &PlayerCatalog) {
        let players = ["p01", "p02", "p03", "p04", "p05", "p06", "p07", "p08"];
        for (i, player_id) in players.iter().enumerate() {
            let turn_team = draft.current_turn().unwrap().team_id.clone();
            draft
                .accept_pick(
                    &proposed(&turn_team, player_id, (i + 1) as u32),
                    catalog,
                    now(),
                )
                .unwrap();
        }
    }

    // -- creation and lifecycle --

    #[test]
    fn create_builds_plan_and_starts_not_started() {
        let draft = Draft::create("draft_1".to_string(), "league_1", test_settings()).unwrap();
        assert_eq!(draft.status, DraftStatus::NotStarted);
        assert_eq!(draft.plan().len(), 8);
        assert!(draft.picks().is_empty());
        assert!(draft.started_at.is_none());
        assert_eq!(draft.current_turn().unwrap().team_id, "alpha");
    }

    #[test]
    fn create_rejects_zero_pick_time_limit() {
        let mut settings = test_settings();
        settings.pick_time_limit_secs = 0;
        let err = Draft::create("draft_1".to_string(), "league_1", settings).unwrap_err();
        assert!(matches!(err, DraftError::InvalidSettings { .. }));
    }

    #[test]
    fn create_propagates_plan_errors() {
        let mut settings = test_settings();
        settings.team_order = teams(&["alpha", "alpha"]);
        let err = Draft::create("draft_1".to_string(), "league_1", settings).unwrap_err();
        assert!(matches!(err, DraftError::InvalidSettings { .. }));
    }

    #[test]
    fn start_moves_to_in_progress_once() {
        let mut draft =
            Draft::create("draft_1".to_string(), "league_1", test_settings()).unwrap();
        draft.start(now()).unwrap();
        assert_eq!(draft.status, DraftStatus::InProgress);
        assert!(draft.started_at.is_some());

        let err = draft.start(now()).unwrap_err();
        assert_eq!(
            err,
            DraftError::InvalidTransition {
                operation: "start",
                status: DraftStatus::InProgress,
            }
        );
    }

    #[test]
    fn status_labels_match_wire_form() {
        assert_eq!(DraftStatus::NotStarted.to_string(), "not_started");
        assert_eq!(DraftStatus::InProgress.to_string(), "in_progress");
        assert_eq!(DraftStatus::Completed.to_string(), "completed");
    }

    // -- accepting picks --

    #[test]
    fn accept_pick_appends_and_advances() {
        let mut draft = started_draft();
        let catalog = test_catalog();

        let pick = draft
            .accept_pick(&proposed("alpha", "p01", 1), &catalog, now())
            .unwrap();
        assert_eq!(pick.overall, 1);
        assert_eq!(pick.team_id, "alpha");
        assert_eq!(pick.position, Position::RunningBack);
        assert_eq!(draft.picks().len(), 1);
        assert_eq!(draft.current_turn().unwrap().team_id, "bravo");
    }

    #[test]
    fn rejected_pick_leaves_state_unchanged() {
        let mut draft = started_draft();
        let catalog = test_catalog();

        let err = draft
            .accept_pick(&proposed("bravo", "p01", 1), &catalog, now())
            .unwrap_err();
        assert!(matches!(err, DraftError::NotYourTurn { .. }));
        assert!(draft.picks().is_empty());
        assert_eq!(draft.current_turn().unwrap().team_id, "alpha");
    }

    #[test]
    fn final_pick_completes_the_draft() {
        let mut draft = started_draft();
        let catalog = test_catalog();
        run_to_completion(&mut draft, &catalog);

        assert_eq!(draft.status, DraftStatus::Completed);
        assert!(draft.current_turn().is_none());
        assert_eq!(draft.picks().len(), 8);
    }

    #[test]
    fn picks_against_completed_draft_are_rejected() {
        let mut draft = started_draft();
        let catalog = test_catalog();
        run_to_completion(&mut draft, &catalog);

        let err = draft
            .accept_pick(&proposed("alpha", "p09", 9), &catalog, now())
            .unwrap_err();
        assert_eq!(
            err,
            DraftError::DraftNotActive {
                status: DraftStatus::Completed,
            }
        );
    }

    #[test]
    fn accepted_overalls_are_gapless() {
        let mut draft = started_draft();
        let catalog = test_catalog();

        for (i, player_id) in ["p01", "p02", "p03"].iter().enumerate() {
            let turn_team = draft.current_turn().unwrap().team_id.clone();
            draft
                .accept_pick(
                    &proposed(&turn_team, player_id, (i + 1) as u32),
                    &catalog,
                    now(),
                )
                .unwrap();
        }

        let overalls: Vec<u32> = draft.picks().iter().map(|p| p.overall).collect();
        assert_eq!(overalls, vec![1, 2, 3]);
    }

    #[test]
    fn claimed_ids_reflect_accepted_picks() {
        let mut draft = started_draft();
        let catalog = test_catalog();
        draft
            .accept_pick(&proposed("alpha", "p01", 1), &catalog, now())
            .unwrap();
        draft
            .accept_pick(&proposed("bravo", "p04", 2), &catalog, now())
            .unwrap();

        let claimed = draft.claimed_player_ids();
        assert!(claimed.contains("p01"));
        assert!(claimed.contains("p04"));
        assert!(!claimed.contains("p02"));
    }

    // -- restore --

    #[test]
    fn restore_replays_a_consistent_log() {
        let mut draft = started_draft();
        let catalog = test_catalog();
        draft
            .accept_pick(&proposed("alpha", "p01", 1), &catalog, now())
            .unwrap();
        draft
            .accept_pick(&proposed("bravo", "p02", 2), &catalog, now())
            .unwrap();

        let restored = Draft::restore(draft.meta(), draft.picks().to_vec()).unwrap();
        assert_eq!(restored.status, DraftStatus::InProgress);
        assert_eq!(restored.picks().len(), 2);
        assert_eq!(restored.current_turn().unwrap().team_id, "chaos");
        assert_eq!(restored.current_turn().unwrap().overall, 3);
    }

    #[test]
    fn restore_rejects_log_with_gap() {
        let draft = started_draft();
        let mut meta = draft.meta();
        meta.status = DraftStatus::InProgress;

        let picks = vec![Pick {
            overall: 2,
            team_id: "bravo".to_string(),
            player_id: "p02".to_string(),
            position: Position::WideReceiver,
            picked_at: now(),
        }];
        let err = Draft::restore(meta, picks).unwrap_err();
        assert_eq!(
            err,
            DraftError::SequenceMismatch {
                submitted: 2,
                expected: 1,
            }
        );
    }

    #[test]
    fn restore_rejects_log_with_wrong_team() {
        let draft = started_draft();
        let picks = vec![Pick {
            overall: 1,
            team_id: "delta".to_string(),
            player_id: "p01".to_string(),
            position: Position::RunningBack,
            picked_at: now(),
        }];
        let err = Draft::restore(draft.meta(), picks).unwrap_err();
        assert!(matches!(err, DraftError::NotYourTurn { .. }));
    }

    #[test]
    fn restore_rejects_double_claimed_player() {
        let draft = started_draft();
        let picks = vec![
            Pick {
                overall: 1,
                team_id: "alpha".to_string(),
                player_id: "p01".to_string(),
                position: Position::RunningBack,
                picked_at: now(),
            },
            Pick {
                overall: 2,
                team_id: "bravo".to_string(),
                player_id: "p01".to_string(),
                position: Position::RunningBack,
                picked_at: now(),
            },
        ];
        let err = Draft::restore(draft.meta(), picks).unwrap_err();
        assert_eq!(
            err,
            DraftError::PlayerAlreadyDrafted {
                player_id: "p01".to_string(),
            }
        );
    }

    #[test]
    fn restore_completes_draft_with_full_log() {
        let mut draft = started_draft();
        let catalog = test_catalog();
        run_to_completion(&mut draft, &catalog);

        // Simulate a crash after the last pick landed but before the status
        // column was updated.
        let mut meta = draft.meta();
        meta.status = DraftStatus::InProgress;
        let restored = Draft::restore(meta, draft.picks().to_vec()).unwrap();
        assert_eq!(restored.status, DraftStatus::Completed);
        assert!(restored.current_turn().is_none());
    }
}
