//! Roll reconciliation
//!
//! The live roll is owned by a [`RollStore`]. Its rules:
//! - Every live die has exactly one throw, value slot and transform slot
//! - Identities are never reused; superseded ones silently ignore late results
//! - "Finished" is derived from the value slots, never stored

pub mod state;
pub mod store;
pub mod throw;

pub use state::{FinishOutcome, RollState};
pub use store::{RollStore, SubscriptionId};
pub use throw::{DiceThrow, DiceTransform, Placement, ThrowGenerator};
