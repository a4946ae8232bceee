//! Leaf dice and their identities

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide counter backing [`DieId::generate`]
static NEXT_DIE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one live die instance.
///
/// A reroll never reuses an identity: it mints a new one, so completions
/// addressed to the old identity can be recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DieId(String);

impl DieId {
    /// Mint a fresh identity. No two calls in the process return the same value.
    pub fn generate() -> Self {
        let n = NEXT_DIE_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("die-{n:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DieId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DieId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Face count of a die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DieKind {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieKind {
    pub const ALL: [DieKind; 7] = [
        DieKind::D4,
        DieKind::D6,
        DieKind::D8,
        DieKind::D10,
        DieKind::D12,
        DieKind::D20,
        DieKind::D100,
    ];

    /// Number of faces (D100 reports percentile values)
    pub fn faces(&self) -> u32 {
        match self {
            DieKind::D4 => 4,
            DieKind::D6 => 6,
            DieKind::D8 => 8,
            DieKind::D10 => 10,
            DieKind::D12 => 12,
            DieKind::D20 => 20,
            DieKind::D100 => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DieKind::D4 => "d4",
            DieKind::D6 => "d6",
            DieKind::D8 => "d8",
            DieKind::D10 => "d10",
            DieKind::D12 => "d12",
            DieKind::D20 => "d20",
            DieKind::D100 => "d100",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "d4" => Some(DieKind::D4),
            "d6" => Some(DieKind::D6),
            "d8" => Some(DieKind::D8),
            "d10" => Some(DieKind::D10),
            "d12" => Some(DieKind::D12),
            "d20" => Some(DieKind::D20),
            "d100" | "d%" => Some(DieKind::D100),
            _ => None,
        }
    }
}

/// Cosmetic die material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiceStyle {
    #[default]
    Galaxy,
    Gemstone,
    Glass,
    Iron,
    Nebula,
    Sunrise,
    Sunset,
    Walnut,
}

/// A single physical die in a roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Die {
    pub id: DieId,
    pub kind: DieKind,
    #[serde(default)]
    pub style: DiceStyle,
    /// Fixed modifier added to this die's face value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<i32>,
}

impl Die {
    /// Create a die with a freshly minted identity
    pub fn new(kind: DieKind, style: DiceStyle) -> Self {
        Self {
            id: DieId::generate(),
            kind,
            style,
            bonus: None,
        }
    }

    pub fn with_bonus(mut self, bonus: i32) -> Self {
        self.bonus = Some(bonus);
        self
    }

    /// Swap in a fresh identity, returning the old one
    pub(crate) fn renew_id(&mut self) -> DieId {
        std::mem::replace(&mut self.id, DieId::generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<DieId> = (0..10_000).map(|_| DieId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_generated_ids_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..1000).map(|_| DieId::generate()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id generated");
            }
        }
    }

    #[test]
    fn test_renew_id() {
        let mut die = Die::new(DieKind::D20, DiceStyle::Iron);
        let before = die.id.clone();
        let old = die.renew_id();
        assert_eq!(old, before);
        assert_ne!(die.id, before);
    }

    #[test]
    fn test_kind_parsing() {
        for kind in DieKind::ALL {
            assert_eq!(DieKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(DieKind::from_str("D%"), Some(DieKind::D100));
        assert_eq!(DieKind::from_str("d7"), None);
        assert_eq!(DieKind::D100.faces(), 100);
    }

    #[test]
    fn test_die_serde_shape() {
        let die = Die {
            id: DieId::from("a"),
            kind: DieKind::D6,
            style: DiceStyle::Walnut,
            bonus: None,
        };
        let json = serde_json::to_value(&die).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["kind"], "D6");
        assert_eq!(json["style"], "WALNUT");
        assert!(json.get("bonus").is_none());
    }
}
