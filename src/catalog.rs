// Player catalog: the read-only pool of draftable players.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Football positions used for roster-need tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
}

impl Position {
    /// All positions, in display order.
    pub const ALL: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
        Position::Defense,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Handles the common abbreviations: "QB", "RB", "WR", "TE", "K", and
    /// "DST"/"DEF"/"D/ST" for team defense.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DST" | "DEF" | "D/ST" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DST",
        }
    }

    /// Deterministic ordering index for board display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Quarterback => 0,
            Position::RunningBack => 1,
            Position::WideReceiver => 2,
            Position::TightEnd => 3,
            Position::Kicker => 4,
            Position::Defense => 5,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A single player in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPlayer {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    /// Average draft position. Lower means historically drafted earlier;
    /// outside the recommender this is treated as an opaque sortable field.
    pub adp: f64,
}

/// A player as presented to draft clients: catalog data plus the `claimed`
/// flag derived from the draft's accepted picks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftablePlayer {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    pub adp: f64,
    pub claimed: bool,
}

/// Read-only view of the draftable player pool for one draft.
///
/// The catalog holds no drafted/undrafted state of its own: claimed flags
/// are always derived from the pick list the caller passes in, so there is
/// no separate index to keep consistent. The surrounding application owns
/// loading and refreshing the pool; the engine treats it as fixed for the
/// duration of a draft.
#[derive(Debug, Clone, Default)]
pub struct PlayerCatalog {
    players: HashMap<String, CatalogPlayer>,
    /// Player ids sorted by (adp, player_id) for deterministic ordering.
    by_adp: Vec<String>,
}

impl PlayerCatalog {
    /// Build a catalog from a list of players.
    ///
    /// Duplicate player ids are skipped with a warning; the first entry wins.
    pub fn new(players: Vec<CatalogPlayer>) -> Self {
        let mut map: HashMap<String, CatalogPlayer> = HashMap::with_capacity(players.len());
        for player in players {
            if map.contains_key(&player.player_id) {
                warn!("duplicate player id in catalog, skipping: {}", player.player_id);
                continue;
            }
            map.insert(player.player_id.clone(), player);
        }

        let mut by_adp: Vec<String> = map.keys().cloned().collect();
        by_adp.sort_by(|a, b| {
            let pa = &map[a];
            let pb = &map[b];
            pa.adp
                .total_cmp(&pb.adp)
                .then_with(|| pa.player_id.cmp(&pb.player_id))
        });

        PlayerCatalog { players: map, by_adp }
    }

    /// Number of players in the pool.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Look up a player by id.
    pub fn get(&self, player_id: &str) -> Option<&CatalogPlayer> {
        self.players.get(player_id)
    }

    /// Whether a player id exists in the pool.
    pub fn contains(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    /// Undrafted players ordered by ADP ascending (ties broken by player id).
    pub fn available(&self, claimed: &HashSet<&str>) -> Vec<DraftablePlayer> {
        let mut players = self.board(claimed);
        players.retain(|p| !p.claimed);
        players
    }

    /// Every player with its claimed flag, ordered by ADP ascending.
    pub fn board(&self, claimed: &HashSet<&str>) -> Vec<DraftablePlayer> {
        self.by_adp
            .iter()
            .map(|id| self.view(&self.players[id], claimed.contains(id.as_str())))
            .collect()
    }

    fn view(&self, player: &CatalogPlayer, claimed: bool) -> DraftablePlayer {
        DraftablePlayer {
            player_id: player.player_id.clone(),
            name: player.name.clone(),
            position: player.position,
            adp: player.adp,
            claimed,
        }
    }
}

// ---------------------------------------------------------------------------
// Sample catalog generation
// ---------------------------------------------------------------------------

/// Position mix for generated pools, as (position, weight) pairs. Roughly
/// matches a real pool: RB/WR heavy, a few QB/TE, a handful of K/DST.
const SAMPLE_MIX: [(Position, usize); 6] = [
    (Position::RunningBack, 5),
    (Position::WideReceiver, 5),
    (Position::Quarterback, 2),
    (Position::TightEnd, 2),
    (Position::Kicker, 1),
    (Position::Defense, 1),
];

/// Build a deterministic sample catalog for simulations and tests.
///
/// All randomness flows from the explicit seed: identical seeds produce
/// identical pools. ADP follows the pool index with a little jitter so the
/// ordering is plausible without being perfectly flat.
pub fn sample_catalog(seed: u64, size: usize) -> PlayerCatalog {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut positions = Vec::with_capacity(size);
    'fill: loop {
        for (position, weight) in SAMPLE_MIX {
            for _ in 0..weight {
                if positions.len() == size {
                    break 'fill;
                }
                positions.push(position);
            }
        }
    }
    positions.shuffle(&mut rng);

    let players = positions
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let adp = (i + 1) as f64 + rng.gen_range(-0.4..0.4);
            CatalogPlayer {
                player_id: format!("p{:04}", i + 1),
                name: format!("Player {:04}", i + 1),
                position,
                adp,
            }
        })
        .collect();

    PlayerCatalog::new(players)
}
