//! Per-round score entries.
//!
//! A round maps player ids to signed scores. A missing key means the player
//! has not been scored yet this round, which is not the same as a zero even
//! though both contribute nothing to a total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::game::ScoreError;
use super::player::PlayerId;

/// Score entries for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round {
    scores: BTreeMap<PlayerId, i64>,
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a player's entry, if scored.
    pub fn get(&self, player_id: &str) -> Option<i64> {
        self.scores.get(player_id).copied()
    }

    /// Check if a player has an entry.
    pub fn is_scored(&self, player_id: &str) -> bool {
        self.scores.contains_key(player_id)
    }

    /// Record a score, replacing any previous entry.
    pub fn set(&mut self, player_id: &str, score: i64) -> Option<i64> {
        self.scores.insert(player_id.to_string(), score)
    }

    /// Remove a player's entry.
    pub fn clear(&mut self, player_id: &str) -> Option<i64> {
        self.scores.remove(player_id)
    }

    /// All entries, including orphaned ones.
    pub fn entries(&self) -> impl Iterator<Item = (&str, i64)> {
        self.scores.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &str> {
        self.scores.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Parse raw score input.
///
/// Blank input means "clear the entry" and yields `Ok(None)`. Anything else
/// must be a whole signed integer.
pub fn parse_score(raw: &str) -> Result<Option<i64>, ScoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ScoreError::InvalidScore {
            raw: raw.to_string(),
        })
}
