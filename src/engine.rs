// Draft engine: the registry of live drafts. All mutations for one draft
// run under that draft's async mutex, so concurrent submissions for the
// same turn resolve to exactly one winner; unrelated drafts never contend.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::autopick::AutopickTimer;
use crate::catalog::{DraftablePlayer, PlayerCatalog};
use crate::draft::recommend::{recommend, RecommendPolicy, TeamDraftProfile};
use crate::draft::state::{Draft, DraftMeta, DraftSettings, DraftStatus, Pick};
use crate::draft::turn::Turn;
use crate::draft::validate::ProposedPick;
use crate::draft::DraftError;
use crate::store::{generate_draft_id, DraftStore};

// ---------------------------------------------------------------------------
// Engine types
// ---------------------------------------------------------------------------

/// One live draft plus its player catalog and pick-deadline timer.
struct DraftEntry {
    draft: Draft,
    catalog: Arc<PlayerCatalog>,
    timer: AutopickTimer,
}

struct EngineInner {
    store: Arc<dyn DraftStore>,
    policy: RecommendPolicy,
    drafts: Mutex<HashMap<String, Arc<Mutex<DraftEntry>>>>,
}

/// Cloneable handle to the draft registry. Clones share the same state, so
/// timer tasks can hold one while callers hold another.
#[derive(Clone)]
pub struct DraftEngine {
    inner: Arc<EngineInner>,
}

/// Point-in-time view of a draft handed out by [`DraftEngine::snapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct DraftSnapshot {
    pub meta: DraftMeta,
    pub current_turn: Option<Turn>,
    pub picks: Vec<Pick>,
}

// ---------------------------------------------------------------------------
// Engine implementation
// ---------------------------------------------------------------------------

impl DraftEngine {
    pub fn new(store: Arc<dyn DraftStore>, policy: RecommendPolicy) -> Self {
        DraftEngine {
            inner: Arc::new(EngineInner {
                store,
                policy,
                drafts: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a draft in the `not_started` state and register it.
    pub async fn create_draft(
        &self,
        league_id: &str,
        settings: DraftSettings,
        catalog: Arc<PlayerCatalog>,
    ) -> Result<String, DraftError> {
        let draft_id = generate_draft_id();
        let draft = Draft::create(draft_id.clone(), league_id, settings)?;
        self.persist_meta(&draft);
        info!(
            "Draft {} created for league {} ({} teams, {} rounds)",
            draft_id,
            league_id,
            draft.settings.team_order.len(),
            draft.settings.rounds
        );
        let entry = DraftEntry {
            draft,
            catalog,
            timer: AutopickTimer::default(),
        };
        let mut registry = self.inner.drafts.lock().await;
        registry.insert(draft_id.clone(), Arc::new(Mutex::new(entry)));
        Ok(draft_id)
    }

    /// Move a draft to `in_progress` and put the first turn on the clock.
    pub async fn start_draft(&self, draft_id: &str) -> Result<(), DraftError> {
        let entry = self.entry(draft_id).await?;
        let mut guard = entry.lock().await;
        let entry = &mut *guard;
        entry.draft.start(Utc::now())?;
        self.persist_meta(&entry.draft);
        self.arm_for_current_turn(draft_id, entry);
        Ok(())
    }

    /// Submit a pick on behalf of a team. Validation runs under the draft's
    /// lock; losers of a race get `SequenceMismatch` or
    /// `PlayerAlreadyDrafted` and decide for themselves what to do next.
    pub async fn submit_pick(
        &self,
        draft_id: &str,
        team_id: &str,
        player_id: &str,
        overall: u32,
    ) -> Result<Pick, DraftError> {
        let entry = self.entry(draft_id).await?;
        let mut guard = entry.lock().await;
        let proposed = ProposedPick {
            team_id: team_id.to_string(),
            player_id: player_id.to_string(),
            overall,
        };
        self.apply_pick(draft_id, &mut guard, &proposed, "pick")
    }

    /// All unclaimed players for a draft, ordered by ADP ascending.
    pub async fn available_players(
        &self,
        draft_id: &str,
    ) -> Result<Vec<DraftablePlayer>, DraftError> {
        let entry = self.entry(draft_id).await?;
        let guard = entry.lock().await;
        let claimed = guard.draft.claimed_player_ids();
        Ok(guard.catalog.available(&claimed))
    }

    /// Recommend a player for `team_id` given the current round and the
    /// team's picks so far. Any team may ask, not just the one on the clock.
    /// `Ok(None)` when the draft is over or the pool is exhausted.
    pub async fn recommendation(
        &self,
        draft_id: &str,
        team_id: &str,
    ) -> Result<Option<DraftablePlayer>, DraftError> {
        let entry = self.entry(draft_id).await?;
        let guard = entry.lock().await;
        let round = match guard.draft.current_turn() {
            Some(turn) => turn.round,
            None => return Ok(None),
        };
        let claimed = guard.draft.claimed_player_ids();
        let available = guard.catalog.available(&claimed);
        let profile = TeamDraftProfile::from_picks(guard.draft.picks(), team_id);
        Ok(recommend(&available, &profile, round, &self.inner.policy).cloned())
    }

    /// Point-in-time view of a draft's header, current turn, and pick log.
    pub async fn snapshot(&self, draft_id: &str) -> Result<DraftSnapshot, DraftError> {
        let entry = self.entry(draft_id).await?;
        let guard = entry.lock().await;
        Ok(DraftSnapshot {
            meta: guard.draft.meta(),
            current_turn: guard.draft.current_turn().cloned(),
            picks: guard.draft.picks().to_vec(),
        })
    }

    /// Rebuild a draft from storage after a restart. Replays the pick log
    /// against a regenerated turn plan and re-arms the pick deadline when
    /// the draft is still live.
    pub async fn restore_draft(
        &self,
        draft_id: &str,
        catalog: Arc<PlayerCatalog>,
    ) -> Result<(), DraftError> {
        let not_found = || DraftError::DraftNotFound {
            draft_id: draft_id.to_string(),
        };
        let meta = match self.inner.store.load_draft(draft_id) {
            Ok(Some(meta)) => meta,
            Ok(None) => return Err(not_found()),
            Err(e) => {
                warn!("Failed to load draft {} from storage: {:#}", draft_id, e);
                return Err(not_found());
            }
        };
        let picks = match self.inner.store.load_picks(draft_id) {
            Ok(picks) => picks,
            Err(e) => {
                warn!("Failed to load picks for draft {}: {:#}", draft_id, e);
                return Err(not_found());
            }
        };
        let replayed = picks.len();
        let draft = Draft::restore(meta, picks)?;
        info!(
            "Draft {} restored from storage ({} picks replayed, status {})",
            draft_id, replayed, draft.status
        );
        let entry = Arc::new(Mutex::new(DraftEntry {
            draft,
            catalog,
            timer: AutopickTimer::default(),
        }));
        {
            let mut registry = self.inner.drafts.lock().await;
            registry.insert(draft_id.to_string(), entry.clone());
        }
        let mut guard = entry.lock().await;
        let entry = &mut *guard;
        if entry.draft.status == DraftStatus::InProgress {
            self.arm_for_current_turn(draft_id, entry);
        }
        Ok(())
    }

    /// Called by a fired timer. Applies the recommended pick for the turn at
    /// `overall`, unless the turn already resolved or the timer was re-armed
    /// while the task was in flight.
    pub async fn deadline_elapsed(&self, draft_id: &str, overall: u32, generation: u64) {
        let entry = match self.entry(draft_id).await {
            Ok(entry) => entry,
            Err(_) => return,
        };
        let mut guard = entry.lock().await;
        let entry = &mut *guard;

        if !entry.timer.is_current(generation) {
            return;
        }
        if entry.draft.status != DraftStatus::InProgress {
            return;
        }
        let turn = match entry.draft.current_turn() {
            Some(turn) if turn.overall == overall => turn.clone(),
            _ => return,
        };

        let claimed = entry.draft.claimed_player_ids();
        let available = entry.catalog.available(&claimed);
        let profile = TeamDraftProfile::from_picks(entry.draft.picks(), &turn.team_id);
        let player_id = match recommend(&available, &profile, turn.round, &self.inner.policy) {
            Some(player) => player.player_id.clone(),
            None => {
                warn!(
                    "No players left to autopick for {} in draft {}; pick #{} stays on the clock",
                    turn.team_id, draft_id, overall
                );
                return;
            }
        };

        info!(
            "Pick deadline lapsed for {} in draft {}; autopicking {}",
            turn.team_id, draft_id, player_id
        );
        let proposed = ProposedPick {
            team_id: turn.team_id.clone(),
            player_id,
            overall,
        };
        if let Err(e) = self.apply_pick(draft_id, entry, &proposed, "autopick") {
            warn!("Autopick for draft {} pick #{} rejected: {}", draft_id, overall, e);
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn entry(&self, draft_id: &str) -> Result<Arc<Mutex<DraftEntry>>, DraftError> {
        let registry = self.inner.drafts.lock().await;
        registry
            .get(draft_id)
            .cloned()
            .ok_or_else(|| DraftError::DraftNotFound {
                draft_id: draft_id.to_string(),
            })
    }

    /// Accept one pick, persist it, and move the deadline to the next turn.
    /// Shared by manual submissions and fired deadlines so both go through
    /// identical validation.
    fn apply_pick(
        &self,
        draft_id: &str,
        entry: &mut DraftEntry,
        proposed: &ProposedPick,
        source: &str,
    ) -> Result<Pick, DraftError> {
        let pick = entry
            .draft
            .accept_pick(proposed, &entry.catalog, Utc::now())?;
        if let Err(e) = self.inner.store.append_pick(draft_id, &pick) {
            warn!(
                "Failed to persist pick #{} for draft {}: {:#}",
                pick.overall, draft_id, e
            );
        }
        info!(
            "Draft {} {} #{}: {} takes {} ({})",
            draft_id, source, pick.overall, pick.team_id, pick.player_id, pick.position
        );
        if entry.draft.status == DraftStatus::Completed {
            entry.timer.disarm();
            self.persist_meta(&entry.draft);
        } else {
            self.arm_for_current_turn(draft_id, entry);
        }
        Ok(pick)
    }

    /// Arm the deadline for whatever turn is now on the clock, or disarm
    /// when nothing is left.
    fn arm_for_current_turn(&self, draft_id: &str, entry: &mut DraftEntry) {
        let limit = entry.draft.settings.pick_time_limit();
        match entry.draft.current_turn().map(|t| t.overall) {
            Some(overall) => {
                entry.timer.arm(self, draft_id, overall, limit);
            }
            None => entry.timer.disarm(),
        }
    }

    /// Persistence failures never fail the in-memory operation; the draft
    /// stays authoritative and the miss is logged.
    fn persist_meta(&self, draft: &Draft) {
        if let Err(e) = self.inner.store.save_draft(&draft.meta()) {
            warn!("Failed to persist draft {}: {:#}", draft.draft_id, e);
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
