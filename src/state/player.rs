//! Player records and id allocation.
//!
//! Ids are opaque strings. Fresh ids come from the creation time in
//! milliseconds, bumped past every numeric id the game has already seen so
//! that a new player never inherits entries left behind by a removed one.

use serde::{Deserialize, Serialize};

/// Opaque player identifier.
pub type PlayerId = String;

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    /// Create a player, trimming the display name.
    ///
    /// Returns `None` if the name is blank once trimmed.
    pub fn new(id: PlayerId, name: &str) -> Option<Self> {
        let name = normalize_name(name)?;
        Some(Self {
            id,
            name: name.to_string(),
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name
        })
    }
}

/// Trim a raw display name, rejecting blank input.
pub fn normalize_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Pick an id for a new player.
///
/// `taken` should cover every id the game still references, including
/// orphaned keys in old rounds. Non-numeric ids can never collide with a
/// generated one and are skipped.
pub fn next_player_id<'a>(now_millis: i64, taken: impl IntoIterator<Item = &'a str>) -> PlayerId {
    let highest = taken
        .into_iter()
        .filter_map(|id| id.parse::<i64>().ok())
        .max();

    let id = match highest {
        Some(max) if max >= now_millis => max.saturating_add(1),
        _ => now_millis,
    };
    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_trimmed() {
        let player = Player::new("1".to_string(), "  Alice \t").unwrap();
        assert_eq!(player.name, "Alice");
        assert_eq!(player.id, "1");
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(Player::new("1".to_string(), "").is_none());
        assert!(Player::new("1".to_string(), "   ").is_none());
        assert_eq!(normalize_name(" Bob "), Some("Bob"));
    }

    #[test]
    fn test_next_id_uses_clock() {
        assert_eq!(next_player_id(1_000, []), "1000");
        assert_eq!(next_player_id(1_000, ["10", "999"]), "1000");
    }

    #[test]
    fn test_next_id_skips_taken() {
        // Same millisecond as an existing player
        assert_eq!(next_player_id(1_000, ["1000"]), "1001");
        // Clock behind an orphaned key
        assert_eq!(next_player_id(1_000, ["5000", "1000"]), "5001");
        // Non-numeric ids are ignored
        assert_eq!(next_player_id(1_000, ["p1", "alice"]), "1000");
    }

    #[test]
    fn test_player_json() {
        let player = Player::new("42".to_string(), "Carl").unwrap();
        assert_eq!(
            player.to_json(),
            serde_json::json!({"id": "42", "name": "Carl"})
        );
    }
}
