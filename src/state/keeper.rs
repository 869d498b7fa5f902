//! The scorekeeper: game state plus its durable store.
//!
//! Every successful mutation writes the fields it changed back to the store.
//! A failed write never rolls back the in-memory change; it is logged and
//! queued so the host can decide whether to warn the user.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::game::{GameState, ScoreError, SortPreference, StateField, WinCondition};
use super::player::{Player, PlayerId};
use super::round::Round;
use super::standings::{compute_leader, compute_sorted_players, compute_totals, Standings};
use super::storage::{load_state, save_field, KeyValueStore, StorageError, StorageKeys};

/// Mutations a host can dispatch as messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameCommand {
    AddPlayer { name: String },
    RemovePlayer { id: PlayerId },
    SetScore { round: usize, player_id: PlayerId, raw: String },
    AdvanceRound,
    RetreatRound,
    ResetGame,
    ToggleWinCondition,
    SetSortPreference { preference: SortPreference },
}

/// Owns the game state and keeps the durable store in sync with it.
#[derive(Debug)]
pub struct ScoreKeeper<S: KeyValueStore> {
    state: GameState,
    store: S,
    keys: StorageKeys,
    /// Write failures not yet collected by the host
    storage_warnings: Vec<StorageError>,
}

impl<S: KeyValueStore> ScoreKeeper<S> {
    /// Load from `store` using the default keys.
    pub fn new(store: S) -> Self {
        Self::with_keys(store, StorageKeys::default())
    }

    /// Load from `store` using custom keys.
    pub fn with_keys(store: S, keys: StorageKeys) -> Self {
        let state = load_state(&store, &keys);
        log::info!(
            "Loaded {} players, round {} of {}",
            state.players().len(),
            state.active_round_index() + 1,
            state.round_count()
        );

        Self {
            state,
            store,
            keys,
            storage_warnings: Vec::new(),
        }
    }

    // Read accessors

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn players(&self) -> &[Player] {
        self.state.players()
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.state.player(player_id)
    }

    pub fn rounds(&self) -> &[Round] {
        self.state.rounds()
    }

    pub fn round_count(&self) -> usize {
        self.state.round_count()
    }

    pub fn active_round_index(&self) -> usize {
        self.state.active_round_index()
    }

    pub fn active_round(&self) -> &Round {
        self.state.active_round()
    }

    pub fn win_condition(&self) -> WinCondition {
        self.state.win_condition
    }

    pub fn sort_preference(&self) -> SortPreference {
        self.state.sort_preference
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // Derived views

    pub fn totals(&self) -> HashMap<PlayerId, i64> {
        compute_totals(&self.state)
    }

    pub fn leader(&self) -> Option<PlayerId> {
        compute_leader(&self.state, &self.totals())
    }

    pub fn sorted_players(&self) -> Vec<Player> {
        compute_sorted_players(&self.state, &self.totals())
    }

    pub fn standings(&self) -> Standings {
        Standings::compute(&self.state)
    }

    // Mutations

    /// Register a player and return their id.
    pub fn add_player(&mut self, name: &str) -> Result<PlayerId, ScoreError> {
        let now = chrono::Utc::now().timestamp_millis();
        let id = self.state.add_player(name, now)?;
        log::debug!("Added player {}", id);
        self.persist(&[StateField::Players]);
        Ok(id)
    }

    /// Remove a player. Returns false if there was no such player.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let removed = self.state.remove_player(player_id);
        if removed {
            log::debug!("Removed player {}", player_id);
            self.persist(&[StateField::Players]);
        }
        removed
    }

    /// Record or clear a score from raw input.
    pub fn set_score(
        &mut self,
        round_index: usize,
        player_id: &str,
        raw: &str,
    ) -> Result<(), ScoreError> {
        self.state.set_score(round_index, player_id, raw)?;
        self.persist(&[StateField::Rounds]);
        Ok(())
    }

    pub fn advance_round(&mut self) {
        if self.state.advance_round() {
            self.persist(&[StateField::Rounds, StateField::ActiveRound]);
        } else {
            self.persist(&[StateField::ActiveRound]);
        }
    }

    pub fn retreat_round(&mut self) -> Result<(), ScoreError> {
        self.state.retreat_round()?;
        self.persist(&[StateField::ActiveRound]);
        Ok(())
    }

    /// Clear all rounds. The host confirms with the user before calling.
    pub fn reset_game(&mut self) {
        self.state.reset();
        log::info!("Game reset, {} players kept", self.state.players().len());
        self.persist(&[StateField::Rounds, StateField::ActiveRound]);
    }

    pub fn toggle_win_condition(&mut self) -> WinCondition {
        let condition = self.state.toggle_win_condition();
        self.persist(&[StateField::WinCondition]);
        condition
    }

    pub fn set_sort_preference(&mut self, preference: SortPreference) {
        self.state.set_sort_preference(preference);
        self.persist(&[StateField::SortPreference]);
    }

    /// Dispatch a command. Use `add_player` directly to get the new id back.
    pub fn apply(&mut self, command: GameCommand) -> Result<(), ScoreError> {
        match command {
            GameCommand::AddPlayer { name } => self.add_player(&name).map(|_| ()),
            GameCommand::RemovePlayer { id } => {
                self.remove_player(&id);
                Ok(())
            }
            GameCommand::SetScore {
                round,
                player_id,
                raw,
            } => self.set_score(round, &player_id, &raw),
            GameCommand::AdvanceRound => {
                self.advance_round();
                Ok(())
            }
            GameCommand::RetreatRound => self.retreat_round(),
            GameCommand::ResetGame => {
                self.reset_game();
                Ok(())
            }
            GameCommand::ToggleWinCondition => {
                self.toggle_win_condition();
                Ok(())
            }
            GameCommand::SetSortPreference { preference } => {
                self.set_sort_preference(preference);
                Ok(())
            }
        }
    }

    // Persistence

    /// Rewrite every field, e.g. to catch up after earlier write failures.
    ///
    /// Returns true if every write succeeded.
    pub fn persist_all(&mut self) -> bool {
        self.persist(&StateField::ALL)
    }

    /// Collect write failures since the last call.
    pub fn take_storage_warnings(&mut self) -> Vec<StorageError> {
        std::mem::take(&mut self.storage_warnings)
    }

    pub fn has_storage_warnings(&self) -> bool {
        !self.storage_warnings.is_empty()
    }

    fn persist(&mut self, fields: &[StateField]) -> bool {
        let mut ok = true;
        for &field in fields {
            if let Err(err) = save_field(&mut self.store, &self.keys, &self.state, field) {
                log::warn!("Failed to persist {}: {}", field.as_str(), err);
                self.storage_warnings.push(err);
                ok = false;
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    fn make_keeper(names: &[&str]) -> (ScoreKeeper<MemoryStore>, Vec<PlayerId>) {
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        let ids = names
            .iter()
            .map(|name| keeper.add_player(name).unwrap())
            .collect();
        (keeper, ids)
    }

    #[test]
    fn test_keeper_fresh() {
        let keeper = ScoreKeeper::new(MemoryStore::new());
        assert!(keeper.players().is_empty());
        assert_eq!(keeper.round_count(), 1);
        assert_eq!(keeper.active_round_index(), 0);
        assert_eq!(keeper.leader(), None);
        assert!(keeper.store().is_empty());
    }

    #[test]
    fn test_player_ids_unique() {
        let (keeper, ids) = make_keeper(&["A", "B", "C", "D"]);
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 4);
        assert_eq!(keeper.players().len(), 4);
    }

    #[test]
    fn test_add_player_persists() {
        let (keeper, ids) = make_keeper(&["Alice"]);
        let saved = keeper.store().get(&keeper.keys().players).unwrap();
        assert!(saved.contains(&ids[0]));
        assert!(saved.contains("Alice"));
    }

    #[test]
    fn test_blank_name_writes_nothing() {
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        assert_eq!(keeper.add_player("  "), Err(ScoreError::EmptyName));
        assert!(keeper.store().is_empty());
    }

    #[test]
    fn test_score_entry_and_clear() {
        let (mut keeper, ids) = make_keeper(&["Alice"]);

        keeper.set_score(0, &ids[0], "-7").unwrap();
        assert_eq!(keeper.totals()[&ids[0]], -7);

        keeper.set_score(0, &ids[0], "").unwrap();
        assert_eq!(keeper.totals()[&ids[0]], 0);
        assert!(!keeper.active_round().is_scored(&ids[0]));
    }

    #[test]
    fn test_invalid_score_keeps_prior_value() {
        let (mut keeper, ids) = make_keeper(&["Alice"]);
        keeper.set_score(0, &ids[0], "5").unwrap();

        assert!(keeper.set_score(0, &ids[0], "five").is_err());
        assert_eq!(keeper.active_round().get(&ids[0]), Some(5));
    }

    #[test]
    fn test_round_trip_through_store() {
        let (mut keeper, ids) = make_keeper(&["Alice", "Bob", "Carl"]);
        keeper.set_score(0, &ids[0], "4").unwrap();
        keeper.set_score(0, &ids[1], "-2").unwrap();
        keeper.advance_round();
        keeper.set_score(1, &ids[2], "11").unwrap();
        keeper.advance_round();
        keeper.retreat_round().unwrap();
        keeper.toggle_win_condition();
        keeper.set_sort_preference(SortPreference::ScoreAscending);
        keeper.remove_player(&ids[1]);

        let expected = keeper.state().clone();
        let reloaded = ScoreKeeper::new(keeper.into_store());

        assert_eq!(reloaded.players(), expected.players());
        assert_eq!(reloaded.rounds(), expected.rounds());
        assert_eq!(reloaded.active_round_index(), 1);
        assert_eq!(reloaded.win_condition(), WinCondition::LowWins);
        assert_eq!(reloaded.sort_preference(), SortPreference::ScoreAscending);
        assert_eq!(reloaded.state(), &expected);
    }

    #[test]
    fn test_custom_keys() {
        let keys = StorageKeys::with_prefix("table-2");
        let mut keeper = ScoreKeeper::with_keys(MemoryStore::new(), keys.clone());
        keeper.toggle_win_condition();

        let store = keeper.into_store();
        assert_eq!(store.get("table-2.winCondition").as_deref(), Some(r#""low""#));
        assert_eq!(store.get("scorekeeper.winCondition"), None);

        // Default keys see nothing
        let other = ScoreKeeper::new(store.clone());
        assert_eq!(other.win_condition(), WinCondition::HighWins);
        let same = ScoreKeeper::with_keys(store, keys);
        assert_eq!(same.win_condition(), WinCondition::LowWins);
    }

    #[test]
    fn test_remove_player_twice() {
        let (mut keeper, ids) = make_keeper(&["Alice", "Bob"]);

        assert!(keeper.remove_player(&ids[0]));
        let once = keeper.state().clone();
        assert!(!keeper.remove_player(&ids[0]));
        assert_eq!(keeper.state(), &once);
    }

    #[test]
    fn test_retreat_at_start_is_noop() {
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        let before = keeper.state().clone();

        assert_eq!(keeper.retreat_round(), Err(ScoreError::AtFirstRound));
        assert_eq!(keeper.state(), &before);
        assert!(keeper.store().is_empty());
    }

    #[test]
    fn test_reset_game() {
        let (mut keeper, ids) = make_keeper(&["Alice", "Bob"]);
        keeper.set_score(0, &ids[0], "9").unwrap();
        keeper.advance_round();
        keeper.advance_round();

        keeper.reset_game();

        assert_eq!(keeper.players().len(), 2);
        assert_eq!(keeper.round_count(), 1);
        assert_eq!(keeper.active_round_index(), 0);
        assert_eq!(keeper.leader(), None);

        let reloaded = ScoreKeeper::new(keeper.into_store());
        assert_eq!(reloaded.round_count(), 1);
        assert_eq!(reloaded.players().len(), 2);
    }

    #[test]
    fn test_leader_follows_win_condition() {
        let (mut keeper, ids) = make_keeper(&["A", "B", "C"]);
        keeper.set_score(0, &ids[0], "10").unwrap();
        keeper.set_score(0, &ids[1], "10").unwrap();
        keeper.set_score(0, &ids[2], "5").unwrap();

        assert_eq!(keeper.leader(), Some(ids[0].clone()));
        keeper.toggle_win_condition();
        assert_eq!(keeper.leader(), Some(ids[2].clone()));
    }

    #[test]
    fn test_sorted_players_view() {
        let (mut keeper, ids) = make_keeper(&["Alice", "Bob", "Carl"]);
        keeper.set_score(0, &ids[0], "5").unwrap();
        keeper.set_score(0, &ids[1], "9").unwrap();
        keeper.set_score(0, &ids[2], "9").unwrap();
        keeper.set_sort_preference(SortPreference::ScoreDescending);

        let names: Vec<String> = keeper.sorted_players().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Bob", "Carl", "Alice"]);

        // Stored order untouched
        assert_eq!(keeper.players()[0].name, "Alice");
        assert_eq!(keeper.standings().rows[0].player.name, "Bob");
    }

    #[test]
    fn test_write_failure_is_queued() {
        let (mut keeper, ids) = make_keeper(&["Alice"]);
        keeper.store_mut().set_fail_writes(true);

        keeper.set_score(0, &ids[0], "3").unwrap();
        keeper.advance_round();

        // In-memory state is still correct
        assert_eq!(keeper.totals()[&ids[0]], 3);
        assert_eq!(keeper.active_round_index(), 1);
        assert!(keeper.has_storage_warnings());

        let warnings = keeper.take_storage_warnings();
        let failed: Vec<&str> = warnings.iter().map(|w| w.key()).collect();
        assert_eq!(
            failed,
            vec![
                "scorekeeper.rounds",
                "scorekeeper.rounds",
                "scorekeeper.activeRound"
            ]
        );
        assert!(!keeper.has_storage_warnings());
    }

    #[test]
    fn test_persist_all_catches_up() {
        let (mut keeper, ids) = make_keeper(&["Alice"]);
        keeper.store_mut().set_fail_writes(true);
        keeper.set_score(0, &ids[0], "3").unwrap();
        assert!(!keeper.persist_all());

        keeper.store_mut().set_fail_writes(false);
        assert!(keeper.persist_all());

        let reloaded = ScoreKeeper::new(keeper.into_store());
        assert_eq!(reloaded.totals()[&ids[0]], 3);
    }

    #[test]
    fn test_apply_commands() {
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        keeper
            .apply(GameCommand::AddPlayer {
                name: "Alice".to_string(),
            })
            .unwrap();
        let id = keeper.players()[0].id.clone();

        keeper
            .apply(GameCommand::SetScore {
                round: 0,
                player_id: id.clone(),
                raw: "6".to_string(),
            })
            .unwrap();
        keeper.apply(GameCommand::AdvanceRound).unwrap();
        keeper.apply(GameCommand::ToggleWinCondition).unwrap();
        keeper
            .apply(GameCommand::SetSortPreference {
                preference: SortPreference::NameAscending,
            })
            .unwrap();

        assert_eq!(keeper.totals()[&id], 6);
        assert_eq!(keeper.active_round_index(), 1);
        assert_eq!(keeper.win_condition(), WinCondition::LowWins);
        assert_eq!(keeper.sort_preference(), SortPreference::NameAscending);

        keeper.apply(GameCommand::RetreatRound).unwrap();
        assert_eq!(
            keeper.apply(GameCommand::RetreatRound),
            Err(ScoreError::AtFirstRound)
        );

        keeper.apply(GameCommand::ResetGame).unwrap();
        keeper.apply(GameCommand::RemovePlayer { id: id.clone() }).unwrap();
        keeper.apply(GameCommand::RemovePlayer { id }).unwrap();
        assert!(keeper.players().is_empty());
    }

    #[test]
    fn test_command_json() {
        let command: GameCommand = serde_json::from_value(serde_json::json!({
            "type": "set_score",
            "round": 2,
            "player_id": "17",
            "raw": "-3"
        }))
        .unwrap();
        assert_eq!(
            command,
            GameCommand::SetScore {
                round: 2,
                player_id: "17".to_string(),
                raw: "-3".to_string()
            }
        );

        let command: GameCommand = serde_json::from_value(serde_json::json!({
            "type": "set_sort_preference",
            "preference": "desc"
        }))
        .unwrap();
        assert_eq!(
            command,
            GameCommand::SetSortPreference {
                preference: SortPreference::ScoreDescending
            }
        );
    }
}
