//! Durable storage for game state.
//!
//! Each `StateField` lives under its own key as a JSON string. Loading is
//! field by field: a missing or corrupt value falls back to that field's
//! default and is logged, never raised. Saving returns an explicit result so
//! the caller decides what to do about a failed write.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::game::{GameState, SortPreference, StateField, WinCondition};
use super::player::Player;
use super::round::Round;

/// Default namespace for storage keys.
pub const DEFAULT_KEY_PREFIX: &str = "scorekeeper";

/// A string key-value store, such as browser local storage.
pub trait KeyValueStore {
    /// Read a value. Missing keys return `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Key the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            Self::WriteFailed { key, .. } | Self::Serialize { key, .. } => key,
        }
    }
}

#[derive(Debug, Error)]
enum LoadError {
    #[error("Malformed value under {key}: {source}")]
    Parse {
        key: String,
        source: serde_json::Error,
    },
}

/// Storage key names, one per `StateField`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub players: String,
    pub rounds: String,
    pub active_round: String,
    pub win_condition: String,
    pub sort_preference: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }
}

impl StorageKeys {
    /// Build keys under a namespace. An empty prefix gives bare names.
    pub fn with_prefix(prefix: &str) -> Self {
        let key = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", prefix, name)
            }
        };

        Self {
            players: key("players"),
            rounds: key("rounds"),
            active_round: key("activeRound"),
            win_condition: key("winCondition"),
            sort_preference: key("sortPreference"),
        }
    }

    pub fn key(&self, field: StateField) -> &str {
        match field {
            StateField::Players => &self.players,
            StateField::Rounds => &self.rounds,
            StateField::ActiveRound => &self.active_round,
            StateField::WinCondition => &self.win_condition,
            StateField::SortPreference => &self.sort_preference,
        }
    }
}

/// Load a full `GameState`, falling back to defaults field by field.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S, keys: &StorageKeys) -> GameState {
    let players: Vec<Player> = load_or_default(store, &keys.players, Vec::new);
    let rounds: Vec<Round> = load_or_default(store, &keys.rounds, || vec![Round::new()]);
    let active_round: usize = load_or_default(store, &keys.active_round, || 0);
    let win_condition: WinCondition =
        load_or_default(store, &keys.win_condition, WinCondition::default);
    let sort_preference: SortPreference =
        load_or_default(store, &keys.sort_preference, SortPreference::default);

    GameState::from_parts(players, rounds, active_round, win_condition, sort_preference)
}

fn load_or_default<T, S>(store: &S, key: &str, default: impl FnOnce() -> T) -> T
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match load_field(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            log::debug!("No saved value under {}, using default", key);
            default()
        }
        Err(err) => {
            log::warn!("{}; using default", err);
            default()
        }
    }
}

fn load_field<T, S>(store: &S, key: &str) -> Result<Option<T>, LoadError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key) else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| LoadError::Parse {
            key: key.to_string(),
            source,
        })
}

/// Serialize one field and write it under its key.
pub fn save_field<S: KeyValueStore + ?Sized>(
    store: &mut S,
    keys: &StorageKeys,
    state: &GameState,
    field: StateField,
) -> Result<(), StorageError> {
    let key = keys.key(field);

    let encoded = match field {
        StateField::Players => serde_json::to_string(state.players()),
        StateField::Rounds => serde_json::to_string(state.rounds()),
        StateField::ActiveRound => serde_json::to_string(&state.active_round_index()),
        StateField::WinCondition => serde_json::to_string(&state.win_condition),
        StateField::SortPreference => serde_json::to_string(&state.sort_preference),
    }
    .map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;

    log::debug!("Writing {} bytes to {}", encoded.len(), key);
    store.set(key, encoded)
}

/// In-memory store. Can be told to fail writes, e.g. to mimic a full quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail (or succeed again).
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Write directly, bypassing failure simulation.
    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
