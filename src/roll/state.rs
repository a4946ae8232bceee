//! Roll state and its transitions
//!
//! [`RollState`] is the authoritative record of the live roll. Three maps are
//! keyed uniformly by die identity:
//! - `values`: rolled face value, `None` while the die is in flight
//! - `transforms`: resting pose, `None` while the die is in flight
//! - `throws`: initial conditions, present for every live die
//!
//! Their key sets always equal the leaf identities of the live roll. A die
//! whose identity leaves that set is never written again, which is what makes
//! late simulator completions harmless.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::throw::{DiceThrow, DiceTransform, Placement, ThrowGenerator};
use crate::dice::{DiceNode, DiceRoll, DieId, ensure_unique_ids, flatten};
use crate::dice::tree::for_each_die_mut;

/// Result of reporting a settled die
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishOutcome {
    /// First completion for a live die
    Settled,
    /// Live die was already settled; the new result replaced the old one
    Overwritten,
    /// Identity is not live (rerolled, cleared or never existed); nothing written
    Stale,
}

/// Snapshot of the live roll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollState {
    roll: Option<DiceRoll>,
    values: BTreeMap<DieId, Option<u32>>,
    transforms: BTreeMap<DieId, Option<DiceTransform>>,
    throws: BTreeMap<DieId, DiceThrow>,
    hovered: Option<DieId>,
}

impl RollState {
    pub fn roll(&self) -> Option<&DiceRoll> {
        self.roll.as_ref()
    }

    pub fn values(&self) -> &BTreeMap<DieId, Option<u32>> {
        &self.values
    }

    pub fn transforms(&self) -> &BTreeMap<DieId, Option<DiceTransform>> {
        &self.transforms
    }

    /// Throws for every live die (the contract handed to the simulator)
    pub fn throws(&self) -> &BTreeMap<DieId, DiceThrow> {
        &self.throws
    }

    pub fn hovered(&self) -> Option<&DieId> {
        self.hovered.as_ref()
    }

    pub fn is_live(&self, id: &DieId) -> bool {
        self.values.contains_key(id)
    }

    pub fn live_ids(&self) -> impl Iterator<Item = &DieId> {
        self.values.keys()
    }

    /// Settled value of a live die
    pub fn value(&self, id: &DieId) -> Option<u32> {
        self.values.get(id).copied().flatten()
    }

    /// Number of live dice still in flight
    pub fn pending(&self) -> usize {
        self.values.values().filter(|v| v.is_none()).count()
    }

    /// True once every live die has settled (vacuously true with no dice)
    pub fn is_finished(&self) -> bool {
        let finished = self.values.values().all(Option::is_some);
        debug_assert_eq!(
            finished,
            self.transforms.values().all(Option::is_some),
            "values and transforms disagree on settlement"
        );
        finished
    }

    /// All resting poses, available only once the roll has finished
    pub fn finished_transforms(&self) -> Option<BTreeMap<DieId, DiceTransform>> {
        self.transforms
            .iter()
            .map(|(id, t)| t.map(|t| (id.clone(), t)))
            .collect()
    }

    /// Combined result plus roll bonus, available only once finished
    pub fn final_value(&self) -> Option<i64> {
        if !self.is_finished() {
            return None;
        }
        self.roll.as_ref()?.total(&self.values)
    }

    /// Settled value of the hovered die
    pub fn hovered_value(&self) -> Option<u32> {
        self.value(self.hovered.as_ref()?)
    }

    /// Check that the maps agree with the live tree and with each other
    pub fn is_coherent(&self) -> bool {
        let leaves: BTreeSet<&DieId> =
            self.roll.iter().flat_map(|r| r.leaf_ids()).collect();
        let leaf_count = self.roll.as_ref().map_or(0, |r| r.leaves().len());

        leaves.len() == leaf_count
            && self.values.keys().eq(leaves.iter().copied())
            && self.transforms.keys().eq(self.values.keys())
            && self.throws.keys().eq(self.values.keys())
            && self
                .values
                .iter()
                .zip(self.transforms.values())
                .all(|((_, v), t)| v.is_some() == t.is_some())
    }

    // === Transitions (driven by `RollStore`) ===

    /// Replace the live roll. Caller-supplied ids found in `retired` are re-minted.
    pub(crate) fn start(
        &mut self,
        mut roll: DiceRoll,
        speed: f32,
        retired: &HashSet<DieId>,
        throws: &mut ThrowGenerator,
    ) {
        self.values.clear();
        self.transforms.clear();
        self.throws.clear();

        let renewed = ensure_unique_ids(&mut roll.dice, |id| retired.contains(id));
        if renewed > 0 {
            log::warn!("Roll contained {} duplicate die ids", renewed);
        }

        let mut occupied = Vec::new();
        for die in roll.leaves() {
            self.insert_pending(die.id.clone(), speed, &mut occupied, throws);
        }
        self.roll = Some(roll);
    }

    pub(crate) fn clear(&mut self) {
        self.roll = None;
        self.values.clear();
        self.transforms.clear();
        self.throws.clear();
        self.hovered = None;
    }

    pub(crate) fn finish_die(
        &mut self,
        id: &DieId,
        value: u32,
        transform: DiceTransform,
    ) -> FinishOutcome {
        let Some(slot) = self.values.get_mut(id) else {
            return FinishOutcome::Stale;
        };
        let outcome = if slot.is_some() {
            FinishOutcome::Overwritten
        } else {
            FinishOutcome::Settled
        };
        *slot = Some(value);
        self.transforms.insert(id.clone(), Some(transform));
        outcome
    }

    /// Replace the selected dice (all when `ids` is `None`) with fresh identities.
    ///
    /// Returns the renamed identities as `(old, new)` pairs in tree order.
    pub(crate) fn reroll(
        &mut self,
        ids: Option<&[DieId]>,
        manual_throws: Option<&BTreeMap<DieId, DiceThrow>>,
        speed: f32,
        throws: &mut ThrowGenerator,
    ) -> Vec<(DieId, DieId)> {
        let Some(roll) = self.roll.as_mut() else {
            return Vec::new();
        };
        let selected: Option<HashSet<&DieId>> = ids.map(|ids| ids.iter().collect());
        let is_selected = |id: &DieId| selected.as_ref().is_none_or(|s| s.contains(id));

        // Fresh throws keep clear of dice that stay put
        let mut occupied: Vec<Vec3> = self
            .transforms
            .iter()
            .filter(|(id, _)| !is_selected(*id))
            .filter_map(|(_, t)| t.map(|t| t.position))
            .collect();

        let mut renamed = Vec::new();
        for_each_die_mut(&mut roll.dice, &mut |die| {
            if !is_selected(&die.id) {
                return;
            }
            self.values.remove(&die.id);
            self.transforms.remove(&die.id);
            self.throws.remove(&die.id);

            let old = die.renew_id();
            let new = die.id.clone();
            self.values.insert(new.clone(), None);
            self.transforms.insert(new.clone(), None);
            let throw = match manual_throws.and_then(|m| m.get(&old)) {
                Some(throw) => *throw,
                None => throws.generate(speed, &occupied).0,
            };
            occupied.push(throw.position);
            self.throws.insert(new.clone(), throw);
            renamed.push((old, new));
        });
        renamed
    }

    /// Append dice to the live roll, leaving existing dice untouched.
    ///
    /// Incoming ids that are live or in `retired` are re-minted. Returns false
    /// when there is no live roll.
    pub(crate) fn add_dice(
        &mut self,
        mut new_dice: Vec<DiceNode>,
        speed: f32,
        bonus: i32,
        retired: &HashSet<DieId>,
        throws: &mut ThrowGenerator,
    ) -> bool {
        let Some(roll) = self.roll.as_mut() else {
            return false;
        };

        let mut occupied: Vec<Vec3> = self
            .transforms
            .values()
            .filter_map(|t| t.map(|t| t.position))
            .collect();

        let values = &self.values;
        ensure_unique_ids(&mut new_dice, |id| values.contains_key(id) || retired.contains(id));

        if bonus != 0 {
            roll.bonus = roll.bonus.saturating_add(bonus);
        }

        let new_ids: Vec<DieId> = flatten(&new_dice).iter().map(|d| d.id.clone()).collect();
        roll.dice.extend(new_dice);
        for id in new_ids {
            self.insert_pending(id, speed, &mut occupied, throws);
        }
        true
    }

    /// Returns false when the hovered die did not change
    pub(crate) fn set_hovered(&mut self, id: Option<DieId>) -> bool {
        if self.hovered == id {
            return false;
        }
        self.hovered = id;
        true
    }

    fn insert_pending(
        &mut self,
        id: DieId,
        speed: f32,
        occupied: &mut Vec<Vec3>,
        throws: &mut ThrowGenerator,
    ) {
        let (throw, placement) = throws.generate(speed, occupied);
        if placement == Placement::Fallback {
            log::debug!("Die {} spawned without clearance", id);
        }
        occupied.push(throw.position);
        self.values.insert(id.clone(), None);
        self.transforms.insert(id.clone(), None);
        self.throws.insert(id, throw);
    }
}
