//! Dice Tray entry point
//!
//! Runs a roll against a stand-in simulator that settles dice in shuffled
//! order, rerolling and adding dice while others are still in flight.
//!
//! Usage: `dice-tray [settings.json]`

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;

use glam::{Quat, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use dice_tray::{
    Combination, Dice, DiceRoll, DiceStyle, DiceTransform, Die, DieId, DieKind, FinishOutcome,
    RollHistory, RollState, RollStore, TraySettings,
};

/// Stand-in for the physics layer: picks up new throws and reports a random
/// face for each die whenever it is asked to step.
struct Simulator {
    rng: Pcg32,
    in_flight: Vec<(DieId, DieKind, DiceTransform)>,
    seen: HashSet<DieId>,
}

impl Simulator {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            in_flight: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Start simulating any throws not seen before
    fn pick_up(&mut self, state: &RollState) {
        let Some(roll) = state.roll() else {
            return;
        };
        for die in roll.leaves() {
            if self.seen.insert(die.id.clone()) {
                let throw = state.throws()[&die.id];
                let rest = Vec3::new(throw.position.x, 0.0, throw.position.z);
                let yaw = Quat::from_rotation_y(self.rng.random_range(0.0..std::f32::consts::TAU));
                self.in_flight.push((die.id.clone(), die.kind, DiceTransform::new(rest, yaw)));
            }
        }
        self.in_flight.shuffle(&mut self.rng);
    }

    /// Report one die, in whatever order the shuffle left them
    fn step(&mut self, store: &mut RollStore) -> Option<(DieId, FinishOutcome)> {
        let (id, kind, transform) = self.in_flight.pop()?;
        let value = self.rng.random_range(1..=kind.faces());
        let outcome = store.finish_die_roll(&id, value, transform);
        println!("  {:<14} {:>4} -> {:>3}  {:?}", id, kind.as_str(), value, outcome);
        Some((id, outcome))
    }
}

fn print_state(state: &RollState) {
    let Some(roll) = state.roll() else {
        println!("  (no roll)");
        return;
    };
    let values: Vec<String> = roll
        .leaves()
        .iter()
        .map(|die| match state.value(&die.id) {
            Some(v) => format!("{}={}", die.kind.as_str(), v),
            None => format!("{}=?", die.kind.as_str()),
        })
        .collect();
    println!(
        "  dice [{}] bonus {:+} pending {} total {:?}",
        values.join(", "),
        roll.bonus,
        state.pending(),
        state.final_value()
    );
}

fn main() {
    env_logger::init();
    log::info!("Dice Tray starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => TraySettings::load(Path::new(&path)),
        None => TraySettings::default(),
    };
    let sim_seed = settings.seed.unwrap_or(7);

    let mut store = RollStore::new(settings);
    let history = Rc::new(RefCell::new(RollHistory::new()));
    let sink = Rc::clone(&history);
    store.subscribe(move |state| {
        if sink.borrow_mut().record(state) {
            log::info!("Roll recorded: {:?}", state.final_value());
        }
    });

    let mut sim = Simulator::new(sim_seed);

    // 1d20 plus the best of 2d6, +2
    let d20 = Die::new(DieKind::D20, DiceStyle::Nebula);
    let advantage = Dice::new([
        Die::new(DieKind::D6, DiceStyle::Iron).into(),
        Die::new(DieKind::D6, DiceStyle::Iron).into(),
    ])
    .with_combination(Combination::Highest);
    let d20_id = d20.id.clone();

    println!("Starting roll");
    store.start(DiceRoll::new([d20.into(), advantage.into()]).with_bonus(2), None);
    sim.pick_up(store.state());
    sim.step(&mut store);

    println!("Rerolling the d20 while it may still be in flight");
    let renamed = store.reroll(Some(std::slice::from_ref(&d20_id)), None);
    for (old, new) in &renamed {
        println!("  {} -> {}", old, new);
    }
    sim.pick_up(store.state());

    println!("Adding a d4 (+1) mid-roll");
    store.add_dice_to_roll(vec![Die::new(DieKind::D4, DiceStyle::Walnut).into()], None, 1);
    sim.pick_up(store.state());
    print_state(store.state());

    println!("Settling");
    while sim.step(&mut store).is_some() {}
    print_state(store.state());

    println!("Rerolling everything");
    store.reroll(None, None);
    sim.pick_up(store.state());
    while sim.step(&mut store).is_some() {}
    print_state(store.state());

    store.clear_roll();

    println!("History");
    match serde_json::to_string_pretty(&*history.borrow()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize history: {}", e),
    }
}
