//! Dice tree model
//!
//! What was rolled: leaf dice with unique identities, nested in groups.

pub mod die;
pub mod roll;
pub mod tree;

pub use die::{DiceStyle, Die, DieId, DieKind};
pub use roll::DiceRoll;
pub use tree::{Combination, Dice, DiceNode, combine, ensure_unique_ids, flatten};
