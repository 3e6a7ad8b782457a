// Draft domain: turn plan, aggregate state machine, pick validation, and
// the recommendation policy.

pub mod recommend;
pub mod state;
pub mod turn;
pub mod validate;

use thiserror::Error;

use crate::draft::state::DraftStatus;

/// Everything that can go wrong while configuring or running a draft.
///
/// All variants are local validation outcomes, returned synchronously to the
/// caller of the operation that detected them; the engine never retries on
/// its own. Resubmission after a failure is safe because stale sequence
/// numbers are rejected.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    /// Malformed draft configuration: empty team list, duplicate team ids,
    /// or a non-positive round count. The draft is not created.
    #[error("invalid draft settings: {reason}")]
    InvalidSettings { reason: String },

    /// A lifecycle operation attempted from the wrong state.
    #[error("cannot {operation} a draft that is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: DraftStatus,
    },

    /// A pick was submitted against a draft that is not in progress.
    #[error("draft is {status}, not accepting picks")]
    DraftNotActive { status: DraftStatus },

    /// A pick was submitted by a team other than the current turn's owner.
    #[error("team {team_id} is not on the clock ({on_clock} is)")]
    NotYourTurn { team_id: String, on_clock: String },

    /// The submitted overall sequence number does not match the current
    /// turn. Covers stale retries and submissions that lost a race against
    /// the autopick path.
    #[error("pick sequence mismatch: submitted {submitted}, expected {expected}")]
    SequenceMismatch { submitted: u32, expected: u32 },

    /// The targeted player has already been claimed in this draft.
    #[error("player {player_id} was already drafted")]
    PlayerAlreadyDrafted { player_id: String },

    /// The targeted player does not exist in the player catalog.
    #[error("player {player_id} is not in the player catalog")]
    UnknownPlayer { player_id: String },

    /// No draft exists under the given id.
    #[error("draft {draft_id} not found")]
    DraftNotFound { draft_id: String },
}
