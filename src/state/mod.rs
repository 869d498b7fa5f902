//! State management module for the scorekeeper.
//!
//! - `player` - Player records and id allocation
//! - `round` - Per-round score entries and score input parsing
//! - `game` - `GameState` and its validated mutations
//! - `standings` - Derived views (totals, leader, display order)
//! - `storage` - Durable key-value persistence
//! - `keeper` - `ScoreKeeper`, which ties state and storage together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          ScoreKeeper<S>                              │
//! │                                                                      │
//! │  host event ──▶ ┌─────────────┐  changed fields  ┌────────────────┐  │
//! │   (method or    │  GameState  │ ───────────────▶ │  storage       │  │
//! │   GameCommand)  │             │                  │  save_field    │──┼──▶ KeyValueStore
//! │                 │ players     │ ◀─────────────── │  load_state    │◀─┼─── (once, at start)
//! │                 │ rounds      │                  └────────────────┘  │
//! │                 │ active_round│                                      │
//! │                 │ win / sort  │                                      │
//! │                 └──────┬──────┘                                      │
//! │                        │ read                                        │
//! │                        ▼                                             │
//! │                 ┌─────────────┐                                      │
//! │                 │  standings  │ totals, leader, sorted players       │
//! │                 └─────────────┘ (recomputed, never cached)           │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use scorekeeper_state::state::{GameState, standings::Standings};
//!
//! // Pure state without persistence
//! let mut state = GameState::new();
//! let id = state.add_player("Alice", 1_000)?;
//! state.set_score(0, &id, "12")?;
//! let view = Standings::compute(&state);
//! ```

pub mod game;
pub mod keeper;
#[cfg(target_family = "wasm")]
pub mod local_storage;
pub mod player;
pub mod round;
pub mod standings;
pub mod storage;

// Re-export commonly used types
pub use game::{GameState, ScoreError, SortPreference, StateField, WinCondition};
pub use keeper::{GameCommand, ScoreKeeper};
#[cfg(target_family = "wasm")]
pub use local_storage::LocalStorage;
pub use player::{Player, PlayerId};
pub use round::{parse_score, Round};
pub use standings::{
    compute_leader, compute_sorted_players, compute_totals, StandingRow, Standings,
};
pub use storage::{
    load_state, save_field, KeyValueStore, MemoryStore, StorageError, StorageKeys,
    DEFAULT_KEY_PREFIX,
};
