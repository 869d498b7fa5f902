//! Game state: players, rounds, and the active round pointer.
//!
//! `GameState` is plain data with validated mutations. It knows nothing about
//! persistence; [`ScoreKeeper`](super::keeper::ScoreKeeper) wraps it and
//! writes changed fields to the durable store.
//!
//! # Round Navigation
//!
//! ```text
//!        retreat              retreat
//!   ┌───────────────┐    ┌───────────────┐
//!   ▼               │    ▼               │
//! ┌─────────┐  advance  ┌─────────┐  advance  ┌──────────────────┐
//! │ round 0 │──────────▶│ round 1 │──────────▶│ round n (last)   │──┐
//! └─────────┘           └─────────┘           └──────────────────┘  │
//!      │                                               ▲            │ advance:
//!      │ retreat: rejected                             └────────────┘ append empty
//!      ▼                                                              round, then move
//!   (no-op)
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::player::{next_player_id, Player, PlayerId};
use super::round::{parse_score, Round};

/// Whether higher or lower totals are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinCondition {
    #[default]
    #[serde(rename = "high")]
    HighWins,
    #[serde(rename = "low")]
    LowWins,
}

impl WinCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighWins => "high",
            Self::LowWins => "low",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::HighWins => Self::LowWins,
            Self::LowWins => Self::HighWins,
        }
    }

    /// Check if `candidate` strictly beats `best`.
    pub fn is_better(self, candidate: i64, best: i64) -> bool {
        match self {
            Self::HighWins => candidate > best,
            Self::LowWins => candidate < best,
        }
    }
}

/// Display order for the player list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortPreference {
    /// Join order
    #[default]
    #[serde(rename = "default")]
    InsertionOrder,
    #[serde(rename = "desc")]
    ScoreDescending,
    #[serde(rename = "asc")]
    ScoreAscending,
    #[serde(rename = "name")]
    NameAscending,
}

impl SortPreference {
    pub const ALL: [SortPreference; 4] = [
        Self::InsertionOrder,
        Self::ScoreDescending,
        Self::ScoreAscending,
        Self::NameAscending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsertionOrder => "default",
            Self::ScoreDescending => "desc",
            Self::ScoreAscending => "asc",
            Self::NameAscending => "name",
        }
    }
}

/// The independently persisted pieces of a `GameState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Players,
    Rounds,
    ActiveRound,
    WinCondition,
    SortPreference,
}

impl StateField {
    pub const ALL: [StateField; 5] = [
        Self::Players,
        Self::Rounds,
        Self::ActiveRound,
        Self::WinCondition,
        Self::SortPreference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Rounds => "rounds",
            Self::ActiveRound => "active_round",
            Self::WinCondition => "win_condition",
            Self::SortPreference => "sort_preference",
        }
    }
}

/// Rejected mutations. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Player name is empty")]
    EmptyName,

    #[error("Score {raw:?} is not a whole number")]
    InvalidScore { raw: String },

    #[error("Round {index} does not exist ({len} rounds)")]
    RoundOutOfRange { index: usize, len: usize },

    #[error("No current player with id {id}")]
    UnknownPlayer { id: PlayerId },

    #[error("Already at the first round")]
    AtFirstRound,
}

/// Drop players with blank names and later duplicates of an id, trimming
/// the names that remain.
fn repair_players(players: Vec<Player>) -> Vec<Player> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(players.len());

    for player in players {
        let Some(repaired) = Player::new(player.id.clone(), &player.name) else {
            log::warn!("Dropping loaded player {} with a blank name", player.id);
            continue;
        };
        if !seen.insert(repaired.id.clone()) {
            log::warn!("Dropping loaded player with duplicate id {}", repaired.id);
            continue;
        }
        kept.push(repaired);
    }

    kept
}

/// Authoritative scorekeeping data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Join order
    players: Vec<Player>,

    /// Never empty
    rounds: Vec<Round>,

    /// Always `< rounds.len()`
    active_round: usize,

    pub win_condition: WinCondition,

    pub sort_preference: SortPreference,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            rounds: vec![Round::new()],
            active_round: 0,
            win_condition: WinCondition::default(),
            sort_preference: SortPreference::default(),
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble state from separately loaded parts, repairing the player and
    /// round invariants if the parts break them.
    pub fn from_parts(
        players: Vec<Player>,
        mut rounds: Vec<Round>,
        active_round: usize,
        win_condition: WinCondition,
        sort_preference: SortPreference,
    ) -> Self {
        let players = repair_players(players);

        if rounds.is_empty() {
            log::warn!("Loaded game has no rounds, starting a fresh one");
            rounds.push(Round::new());
        }

        let last = rounds.len() - 1;
        let active_round = if active_round > last {
            log::warn!(
                "Active round {} is past the last round {}, clamping",
                active_round,
                last
            );
            last
        } else {
            active_round
        };

        Self {
            players,
            rounds,
            active_round,
            win_condition,
            sort_preference,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round(&self, index: usize) -> Option<&Round> {
        self.rounds.get(index)
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn active_round_index(&self) -> usize {
        self.active_round
    }

    /// The round currently being edited.
    pub fn active_round(&self) -> &Round {
        &self.rounds[self.active_round]
    }

    pub fn is_last_round(&self) -> bool {
        self.active_round + 1 == self.rounds.len()
    }

    /// Every id still referenced, including orphaned round keys.
    fn known_ids(&self) -> impl Iterator<Item = &str> {
        self.players
            .iter()
            .map(|p| p.id.as_str())
            .chain(self.rounds.iter().flat_map(|r| r.player_ids()))
    }

    /// Register a player. `now_millis` seeds the new id.
    pub fn add_player(&mut self, name: &str, now_millis: i64) -> Result<PlayerId, ScoreError> {
        let id = next_player_id(now_millis, self.known_ids());
        let player = Player::new(id, name).ok_or(ScoreError::EmptyName)?;

        let id = player.id.clone();
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player. Their round entries stay behind as history.
    ///
    /// Returns false if no such player existed.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != player_id);
        self.players.len() != before
    }

    /// Record or clear a score from raw input.
    pub fn set_score(
        &mut self,
        round_index: usize,
        player_id: &str,
        raw: &str,
    ) -> Result<(), ScoreError> {
        let len = self.rounds.len();
        if round_index >= len {
            return Err(ScoreError::RoundOutOfRange {
                index: round_index,
                len,
            });
        }

        if !self.has_player(player_id) {
            return Err(ScoreError::UnknownPlayer {
                id: player_id.to_string(),
            });
        }

        let value = parse_score(raw)?;
        let round = &mut self.rounds[round_index];
        match value {
            Some(score) => {
                round.set(player_id, score);
            }
            None => {
                round.clear(player_id);
            }
        }

        Ok(())
    }

    /// Move to the next round, appending an empty one if at the end.
    ///
    /// Returns true if a round was appended.
    pub fn advance_round(&mut self) -> bool {
        let appended = self.is_last_round();
        if appended {
            self.rounds.push(Round::new());
        }
        self.active_round += 1;
        appended
    }

    /// Move to the previous round.
    pub fn retreat_round(&mut self) -> Result<(), ScoreError> {
        if self.active_round == 0 {
            return Err(ScoreError::AtFirstRound);
        }
        self.active_round -= 1;
        Ok(())
    }

    /// Drop all rounds and start over. Players are kept.
    pub fn reset(&mut self) {
        self.rounds = vec![Round::new()];
        self.active_round = 0;
    }

    pub fn toggle_win_condition(&mut self) -> WinCondition {
        self.win_condition = self.win_condition.toggled();
        self.win_condition
    }

    pub fn set_sort_preference(&mut self, preference: SortPreference) {
        self.sort_preference = preference;
    }
}
