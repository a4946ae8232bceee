//! Finished roll history
//!
//! Keeps the most recent results so a display can keep showing the last roll
//! after the live roll is cleared.

use serde::{Deserialize, Serialize};

use crate::dice::{DieId, DieKind};
use crate::roll::RollState;

/// Maximum number of rolls to keep
pub const MAX_HISTORY: usize = 10;

/// One settled die in a recorded roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieResult {
    pub id: DieId,
    pub kind: DieKind,
    pub value: u32,
}

/// A finished roll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRecord {
    /// Combined result including bonuses
    pub total: Option<i64>,
    /// Dice in tree order
    pub dice: Vec<DieResult>,
    pub bonus: i32,
}

impl RollRecord {
    /// Capture a finished, visible roll
    pub fn from_state(state: &RollState) -> Option<Self> {
        let roll = state.roll()?;
        if roll.hidden || !state.is_finished() {
            return None;
        }
        let dice = roll
            .leaves()
            .into_iter()
            .map(|die| {
                state.value(&die.id).map(|value| DieResult {
                    id: die.id.clone(),
                    kind: die.kind,
                    value,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            total: state.final_value(),
            dice,
            bonus: roll.bonus,
        })
    }
}

/// Most recent finished rolls, newest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RollHistory {
    pub entries: Vec<RollRecord>,
}

impl RollHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record the state if it is a finished roll not already at the front.
    /// Returns true if a record was added.
    pub fn record(&mut self, state: &RollState) -> bool {
        let Some(record) = RollRecord::from_state(state) else {
            return false;
        };
        if self.entries.first() == Some(&record) {
            return false;
        }

        log::debug!("Recording roll total {:?} ({} dice)", record.total, record.dice.len());
        self.entries.insert(0, record);
        self.entries.truncate(MAX_HISTORY);
        true
    }

    pub fn latest(&self) -> Option<&RollRecord> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceRoll, DiceStyle, Die};
    use crate::roll::{DiceTransform, RollStore};
    use crate::settings::TraySettings;
    use glam::{Quat, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn finish_all(store: &mut RollStore, value: u32) {
        let live: Vec<DieId> = store.state().live_ids().cloned().collect();
        for id in live {
            store.finish_die_roll(&id, value, DiceTransform::new(Vec3::ZERO, Quat::IDENTITY));
        }
    }

    fn two_d6() -> DiceRoll {
        DiceRoll::new([
            Die::new(DieKind::D6, DiceStyle::Sunset).into(),
            Die::new(DieKind::D6, DiceStyle::Sunset).into(),
        ])
    }

    #[test]
    fn test_records_only_finished_rolls() {
        let mut store = RollStore::new(TraySettings::seeded(1));
        let mut history = RollHistory::new();

        store.start(two_d6().with_bonus(1), None);
        assert!(!history.record(store.state()));

        finish_all(&mut store, 4);
        assert!(history.record(store.state()));
        assert!(!history.record(store.state()), "same roll recorded twice");

        let latest = history.latest().unwrap();
        assert_eq!(latest.total, Some(9));
        assert_eq!(latest.dice.len(), 2);
        assert_eq!(latest.bonus, 1);
    }

    #[test]
    fn test_hidden_rolls_not_recorded() {
        let mut store = RollStore::new(TraySettings::seeded(2));
        let mut history = RollHistory::new();
        store.start(two_d6().hidden(true), None);
        finish_all(&mut store, 2);
        assert!(!history.record(store.state()));
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_bounded() {
        let mut store = RollStore::new(TraySettings::seeded(3));
        let mut history = RollHistory::new();
        for _ in 0..(MAX_HISTORY + 5) {
            store.start(two_d6(), None);
            finish_all(&mut store, 3);
            history.record(store.state());
        }
        assert_eq!(history.len(), MAX_HISTORY);
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_fed_by_subscription() {
        let mut store = RollStore::new(TraySettings::seeded(4));
        let history = Rc::new(RefCell::new(RollHistory::new()));
        let sink = Rc::clone(&history);
        store.subscribe(move |state| {
            sink.borrow_mut().record(state);
        });

        store.start(two_d6(), None);
        finish_all(&mut store, 6);
        store.reroll(None, None);
        finish_all(&mut store, 1);
        store.clear_roll();

        let history = history.borrow();
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries[0].total, Some(2));
        assert_eq!(history.entries[1].total, Some(12));
    }
}
