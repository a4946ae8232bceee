//! Roll reconciliation store
//!
//! Single owner of the live [`RollState`]. Each operation runs to completion,
//! builds the next state copy-on-write and publishes it whole: readers holding
//! an earlier snapshot never see a half-applied edit, and subscribers are
//! notified once per operation that actually changed something.
//!
//! The simulator reports results through [`RollStore::finish_die_roll`] in any
//! order and at any time. Reports for identities that are no longer live
//! (rerolled or cleared) are dropped silently; there is no cancel message.
//! Retired identities are remembered so a caller-supplied tree can never bring
//! one back to life.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::state::{FinishOutcome, RollState};
use super::throw::{DiceThrow, DiceTransform, ThrowGenerator};
use crate::consts::REROLL_SPEED_MULTIPLIER;
use crate::dice::{DiceNode, DiceRoll, DieId, flatten};
use crate::settings::TraySettings;

/// Handle returned by [`RollStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Arc<RollState>)>;

/// Authoritative roll store
pub struct RollStore {
    state: Arc<RollState>,
    throws: ThrowGenerator,
    /// Identities that have left the live roll
    retired: HashSet<DieId>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl RollStore {
    pub fn new(settings: TraySettings) -> Self {
        Self {
            state: Arc::new(RollState::default()),
            throws: ThrowGenerator::new(settings),
            retired: HashSet::new(),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Current snapshot (cheap to clone and hold)
    pub fn snapshot(&self) -> Arc<RollState> {
        Arc::clone(&self.state)
    }

    pub fn state(&self) -> &RollState {
        &self.state
    }

    pub fn settings(&self) -> &TraySettings {
        self.throws.settings()
    }

    /// Register a listener called with every new snapshot
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&Arc<RollState>) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already released
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Replace the live roll and throw every die in it
    pub fn start(&mut self, roll: DiceRoll, speed_multiplier: Option<f32>) {
        let speed = self.throws.settings().speed_multiplier(speed_multiplier);
        self.retire_live();
        let state = Arc::make_mut(&mut self.state);
        state.start(roll, speed, &self.retired, &mut self.throws);
        log::info!("Roll started with {} dice (speed x{})", state.values().len(), speed);
        self.publish();
    }

    /// Drop the live roll and all per-die state
    pub fn clear_roll(&mut self) {
        let state = &self.state;
        if state.roll().is_none() && state.values().is_empty() && state.hovered().is_none() {
            return;
        }
        self.retire_live();
        Arc::make_mut(&mut self.state).clear();
        log::info!("Roll cleared");
        self.publish();
    }

    /// Record the simulator's result for one die
    pub fn finish_die_roll(
        &mut self,
        id: &DieId,
        value: u32,
        transform: DiceTransform,
    ) -> FinishOutcome {
        if !self.state.is_live(id) {
            log::debug!("Ignoring result for stale die {}", id);
            return FinishOutcome::Stale;
        }

        let state = Arc::make_mut(&mut self.state);
        let outcome = state.finish_die(id, value, transform);
        if outcome == FinishOutcome::Overwritten {
            log::debug!("Die {} reported twice, keeping latest value {}", id, value);
        }
        if state.is_finished() {
            log::info!("Roll finished: {:?}", state.final_value());
        }
        self.publish();
        outcome
    }

    /// Reroll the given dice, or every die when `ids` is `None`.
    ///
    /// A die listed in `manual_throws` (keyed by its current id) is thrown with
    /// that throw instead of a random one; the rest are thrown at
    /// [`REROLL_SPEED_MULTIPLIER`]. Returns `(old, new)` id pairs.
    pub fn reroll(
        &mut self,
        ids: Option<&[DieId]>,
        manual_throws: Option<&BTreeMap<DieId, DiceThrow>>,
    ) -> Vec<(DieId, DieId)> {
        if self.state.roll().is_none() {
            log::debug!("Reroll ignored: no live roll");
            return Vec::new();
        }
        if let Some(ids) = ids {
            if !ids.iter().any(|id| self.state.is_live(id)) {
                log::debug!("Reroll ignored: none of {} ids are live", ids.len());
                return Vec::new();
            }
        }

        let state = Arc::make_mut(&mut self.state);
        let renamed = state.reroll(ids, manual_throws, REROLL_SPEED_MULTIPLIER, &mut self.throws);
        if renamed.is_empty() {
            return renamed;
        }
        self.retired.extend(renamed.iter().map(|(old, _)| old.clone()));
        log::info!("Rerolled {} dice", renamed.len());
        self.publish();
        renamed
    }

    /// Append dice to the live roll without disturbing dice already in it.
    ///
    /// Returns false (and changes nothing) when there is no live roll.
    pub fn add_dice_to_roll(
        &mut self,
        new_dice: Vec<DiceNode>,
        speed_multiplier: Option<f32>,
        bonus: i32,
    ) -> bool {
        if self.state.roll().is_none() {
            log::debug!("Add dice ignored: no live roll");
            return false;
        }
        if bonus == 0 && flatten(&new_dice).is_empty() {
            return true;
        }

        let speed = self.throws.settings().speed_multiplier(speed_multiplier);
        let before = self.state.values().len();
        let state = Arc::make_mut(&mut self.state);
        state.add_dice(new_dice, speed, bonus, &self.retired, &mut self.throws);
        let added = state.values().len() - before;
        log::info!("Added {} dice to roll (bonus {:+})", added, bonus);
        self.publish();
        true
    }

    /// Highlight a die for display (auxiliary UI state)
    pub fn set_hovered_die(&mut self, id: Option<DieId>) {
        if self.state.hovered() == id.as_ref() {
            return;
        }
        Arc::make_mut(&mut self.state).set_hovered(id);
        self.publish();
    }

    fn retire_live(&mut self) {
        self.retired.extend(self.state.live_ids().cloned());
    }

    fn publish(&mut self) {
        debug_assert!(self.state.is_coherent(), "roll state maps out of sync with dice tree");
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }
}

impl Default for RollStore {
    fn default() -> Self {
        Self::new(TraySettings::default())
    }
}
