//! Derived views: totals, leader, and display order.
//!
//! Everything here is a pure function of a `GameState` snapshot and is
//! recomputed on every read. Nothing is cached.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::game::{GameState, SortPreference, WinCondition};
use super::player::{Player, PlayerId};

/// Sum every current player's entries across all rounds.
///
/// The result has exactly one entry per current player. Orphaned entries
/// left by removed players are skipped.
pub fn compute_totals(state: &GameState) -> HashMap<PlayerId, i64> {
    let mut totals: HashMap<PlayerId, i64> = state
        .players()
        .iter()
        .map(|p| (p.id.clone(), 0))
        .collect();

    for round in state.rounds() {
        for (player_id, score) in round.entries() {
            if let Some(total) = totals.get_mut(player_id) {
                *total = total.saturating_add(score);
            }
        }
    }

    totals
}

/// Find the leading player under the active win condition.
///
/// Returns `None` with no players, or while every total is still zero.
/// Ties go to whoever joined first.
pub fn compute_leader(state: &GameState, totals: &HashMap<PlayerId, i64>) -> Option<PlayerId> {
    let total_of = |p: &Player| totals.get(&p.id).copied().unwrap_or(0);

    if state.players().iter().all(|p| total_of(p) == 0) {
        return None;
    }

    let mut best: Option<(&Player, i64)> = None;
    for player in state.players() {
        let total = total_of(player);
        let takes_lead = match best {
            Some((_, best_total)) => state.win_condition.is_better(total, best_total),
            None => true,
        };
        if takes_lead {
            best = Some((player, total));
        }
    }

    best.map(|(p, _)| p.id.clone())
}

/// Order players for display without touching the stored order.
///
/// The sort is stable, so exact ties keep join order.
pub fn compute_sorted_players(state: &GameState, totals: &HashMap<PlayerId, i64>) -> Vec<Player> {
    let total_of = |p: &Player| totals.get(&p.id).copied().unwrap_or(0);
    let mut sorted = state.players().to_vec();

    match state.sort_preference {
        SortPreference::InsertionOrder => {}
        SortPreference::ScoreDescending => sorted.sort_by_key(|p| Reverse(total_of(p))),
        SortPreference::ScoreAscending => sorted.sort_by_key(total_of),
        SortPreference::NameAscending => sorted.sort_by(|a, b| compare_names(&a.name, &b.name)),
    }

    sorted
}

/// Locale-aware name order: accents and case are ignored first, so `Émile`
/// sorts with the other `E` names. Exact ties fall back to the raw names.
fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Decompose, strip combining marks, and lowercase.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// One line of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    pub player: Player,
    pub total: i64,
    /// Entry in the active round, if scored
    pub round_score: Option<i64>,
    pub is_leader: bool,
}

impl StandingRow {
    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = self.player.to_json();
        obj["total"] = serde_json::json!(self.total);
        obj["round_score"] = serde_json::json!(self.round_score);
        obj["is_leader"] = serde_json::json!(self.is_leader);
        obj
    }
}

/// Everything a host needs to render the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// Players in display order
    pub rows: Vec<StandingRow>,
    pub leader: Option<PlayerId>,
    pub active_round: usize,
    pub round_count: usize,
    pub win_condition: WinCondition,
    pub sort_preference: SortPreference,
}

impl Standings {
    pub fn compute(state: &GameState) -> Self {
        let totals = compute_totals(state);
        let leader = compute_leader(state, &totals);
        let active = state.active_round();

        let rows = compute_sorted_players(state, &totals)
            .into_iter()
            .map(|player| {
                let total = totals.get(&player.id).copied().unwrap_or(0);
                let round_score = active.get(&player.id);
                let is_leader = leader.as_deref() == Some(player.id.as_str());
                StandingRow {
                    player,
                    total,
                    round_score,
                    is_leader,
                }
            })
            .collect();

        Self {
            rows,
            leader,
            active_round: state.active_round_index(),
            round_count: state.round_count(),
            win_condition: state.win_condition,
            sort_preference: state.sort_preference,
        }
    }

    pub fn leader_row(&self) -> Option<&StandingRow> {
        self.rows.iter().find(|r| r.is_leader)
    }

    /// Convert to JSON for a web host.
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self.rows.iter().map(|r| r.to_json()).collect();

        serde_json::json!({
            "players": rows,
            "leader": self.leader,
            "active_round": self.active_round,
            "round_number": self.active_round + 1,
            "round_count": self.round_count,
            "win_condition": self.win_condition.as_str(),
            "sort_preference": self.sort_preference.as_str()
        })
    }
}
