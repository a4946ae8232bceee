//! The aggregate root of one roll

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::die::{Die, DieId};
use super::tree::{Combination, DiceNode, combine, flatten};

/// Everything thrown in one roll: the dice tree, a flat bonus and visibility
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiceRoll {
    pub dice: Vec<DiceNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combination: Option<Combination>,
    /// Flat modifier applied to the combined result
    #[serde(default)]
    pub bonus: i32,
    /// Hidden rolls are not shown to other players
    #[serde(default)]
    pub hidden: bool,
}

impl DiceRoll {
    pub fn new(dice: impl IntoIterator<Item = DiceNode>) -> Self {
        Self {
            dice: dice.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_bonus(mut self, bonus: i32) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Leaf dice in depth-first order
    pub fn leaves(&self) -> Vec<&Die> {
        flatten(&self.dice)
    }

    pub fn leaf_ids(&self) -> impl Iterator<Item = &DieId> {
        self.leaves().into_iter().map(|die| &die.id)
    }

    /// Combined value of the settled dice plus the roll bonus
    pub fn total(&self, values: &BTreeMap<DieId, Option<u32>>) -> Option<i64> {
        combine(&self.dice, self.combination, values).map(|v| v + i64::from(self.bonus))
    }
}
