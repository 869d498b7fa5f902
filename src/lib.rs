//! Scorekeeper State Library
//!
//! This crate provides state management for a tabletop game scorekeeper.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Game State** - Players in join order, per-round score entries, and a
//!   round pointer that can never dangle.
//!
//! - **Standings** - Totals, the current leader under a high-wins or low-wins
//!   rule, and player order for display. Always recomputed from state.
//!
//! - **Persistence** - Each piece of state is written as JSON to a string
//!   key-value store (browser local storage, or memory) after every change,
//!   and loaded back field by field on start-up.
//!
//! # Design Principles
//!
//! 1. **Mutations validate input** - Blank names, non-numeric scores and
//!    out-of-range rounds are rejected with a `ScoreError` and leave state
//!    untouched.
//!
//! 2. **Derived data is never stored** - Totals and the leader are computed on
//!    demand, so they cannot go stale.
//!
//! 3. **Storage never blocks play** - Corrupt saved data falls back to
//!    defaults; failed writes are logged and queued for the host to inspect.
//!
//! 4. **No UI** - Hosts render `Standings` and collect raw input strings.
//!
//! # Example
//!
//! ```rust
//! use scorekeeper_state::{MemoryStore, ScoreKeeper, SortPreference, WinCondition};
//!
//! let mut keeper = ScoreKeeper::new(MemoryStore::new());
//!
//! let alice = keeper.add_player("Alice").unwrap();
//! let bob = keeper.add_player("  Bob ").unwrap();
//!
//! keeper.set_score(0, &alice, "12").unwrap();
//! keeper.set_score(0, &bob, "7").unwrap();
//! assert_eq!(keeper.leader(), Some(alice.clone()));
//!
//! // Lowest total wins now
//! keeper.toggle_win_condition();
//! assert_eq!(keeper.win_condition(), WinCondition::LowWins);
//! assert_eq!(keeper.leader(), Some(bob.clone()));
//!
//! keeper.advance_round();
//! keeper.set_score(1, &bob, "-2").unwrap();
//! keeper.set_sort_preference(SortPreference::ScoreAscending);
//! assert_eq!(keeper.sorted_players()[0].name, "Bob");
//!
//! // Everything survives a reload from the same store
//! let reloaded = ScoreKeeper::new(keeper.into_store());
//! assert_eq!(reloaded.active_round_index(), 1);
//! assert_eq!(reloaded.totals()[&bob], 5);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
