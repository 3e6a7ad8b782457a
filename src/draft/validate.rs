// Pure pick validation.
//
// Checks run in a fixed order so a submission with several problems always
// surfaces the same error. Nothing here mutates the draft; `accept_pick` is
// the only caller allowed to act on an Ok result.

use serde::{Deserialize, Serialize};

use crate::catalog::PlayerCatalog;
use crate::draft::state::{Draft, DraftStatus};
use crate::draft::DraftError;

/// A pick as submitted, before validation.
///
/// `overall` is the sequence number the submitter believes is on the clock;
/// it protects against stale retries and double submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedPick {
    pub team_id: String,
    pub player_id: String,
    pub overall: u32,
}

/// Checks a proposed pick against the draft and catalog.
///
/// Order: draft active, submitting team on the clock, player known, player
/// unclaimed, sequence number current. First failure wins.
pub fn validate_pick(
    draft: &Draft,
    proposed: &ProposedPick,
    catalog: &PlayerCatalog,
) -> Result<(), DraftError> {
    if draft.status != DraftStatus::InProgress {
        return Err(DraftError::DraftNotActive {
            status: draft.status,
        });
    }
    let turn = match draft.current_turn() {
        Some(turn) => turn,
        // In progress with an exhausted plan cannot happen; refuse anyway.
        None => {
            return Err(DraftError::DraftNotActive {
                status: draft.status,
            })
        }
    };
    if proposed.team_id != turn.team_id {
        return Err(DraftError::NotYourTurn {
            team_id: proposed.team_id.clone(),
            on_clock: turn.team_id.clone(),
        });
    }
    if !catalog.contains(&proposed.player_id) {
        return Err(DraftError::UnknownPlayer {
            player_id: proposed.player_id.clone(),
        });
    }
    if draft
        .picks()
        .iter()
        .any(|p| p.player_id == proposed.player_id)
    {
        return Err(DraftError::PlayerAlreadyDrafted {
            player_id: proposed.player_id.clone(),
        });
    }
    if proposed.overall != turn.overall {
        return Err(DraftError::SequenceMismatch {
            submitted: proposed.overall,
            expected: turn.overall,
        });
    }
    Ok(())
}
