//! Recursive dice trees
//!
//! A roll is an ordered tree of dice and nested groups. Reconciliation only
//! cares about the leaves, which are addressed purely by identity; the group
//! structure drives display and how settled values combine into a result.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::die::{Die, DieId};

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

fn generate_group_id() -> String {
    let n = NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed);
    format!("group-{n:08x}")
}

/// How a group's child values combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combination {
    /// Keep the highest child value (advantage)
    Highest,
    /// Keep the lowest child value (disadvantage)
    Lowest,
    #[default]
    Sum,
    /// Group contributes no value
    None,
}

/// A node in a dice tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiceNode {
    Die(Die),
    Group(Dice),
}

impl DiceNode {
    #[inline]
    pub fn is_die(&self) -> bool {
        matches!(self, DiceNode::Die(_))
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self, DiceNode::Group(_))
    }

    pub fn as_die(&self) -> Option<&Die> {
        match self {
            DiceNode::Die(die) => Some(die),
            DiceNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Dice> {
        match self {
            DiceNode::Group(group) => Some(group),
            DiceNode::Die(_) => None,
        }
    }
}

impl From<Die> for DiceNode {
    fn from(die: Die) -> Self {
        DiceNode::Die(die)
    }
}

impl From<Dice> for DiceNode {
    fn from(group: Dice) -> Self {
        DiceNode::Group(group)
    }
}

/// An ordered group of dice and nested groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dice {
    /// Display identity of the group; never used for reconciliation
    #[serde(default = "generate_group_id")]
    pub id: String,
    pub dice: Vec<DiceNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combination: Option<Combination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<i32>,
}

impl Dice {
    /// Build a group with a freshly minted group id
    pub fn new(dice: impl IntoIterator<Item = DiceNode>) -> Self {
        Self {
            id: generate_group_id(),
            dice: dice.into_iter().collect(),
            combination: None,
            bonus: None,
        }
    }

    pub fn with_combination(mut self, combination: Combination) -> Self {
        self.combination = Some(combination);
        self
    }

    pub fn with_bonus(mut self, bonus: i32) -> Self {
        self.bonus = Some(bonus);
        self
    }

    /// Leaf dice in depth-first order
    pub fn flatten(&self) -> Vec<&Die> {
        flatten(&self.dice)
    }

    /// Combined value of the settled dice in this group (see [`combine`])
    pub fn combined_value(&self, values: &BTreeMap<DieId, Option<u32>>) -> Option<i64> {
        combine(&self.dice, self.combination, values)
            .map(|v| v + i64::from(self.bonus.unwrap_or(0)))
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::new([])
    }
}

/// Depth-first, order-preserving flattening of a tree to its leaf dice
pub fn flatten(nodes: &[DiceNode]) -> Vec<&Die> {
    let mut out = Vec::new();
    flatten_into(nodes, &mut out);
    out
}

fn flatten_into<'a>(nodes: &'a [DiceNode], out: &mut Vec<&'a Die>) {
    for node in nodes {
        match node {
            DiceNode::Die(die) => out.push(die),
            DiceNode::Group(group) => flatten_into(&group.dice, out),
        }
    }
}

/// Visit every leaf die mutably, depth-first
pub(crate) fn for_each_die_mut(nodes: &mut [DiceNode], f: &mut impl FnMut(&mut Die)) {
    for node in nodes {
        match node {
            DiceNode::Die(die) => f(die),
            DiceNode::Group(group) => for_each_die_mut(&mut group.dice, f),
        }
    }
}

/// Re-mint identities for which `in_use` holds or that repeat within `nodes`.
///
/// Returns how many dice received a new identity.
pub fn ensure_unique_ids(nodes: &mut [DiceNode], in_use: impl Fn(&DieId) -> bool) -> usize {
    let mut seen = HashSet::new();
    let mut renewed = 0;
    for_each_die_mut(nodes, &mut |die| {
        if in_use(&die.id) || seen.contains(&die.id) {
            let old = die.renew_id();
            while in_use(&die.id) || seen.contains(&die.id) {
                die.renew_id();
            }
            log::warn!("Die id {} already in use, reassigned to {}", old, die.id);
            renewed += 1;
        }
        seen.insert(die.id.clone());
    });
    renewed
}

/// Combine settled values of `nodes` according to `combination`.
///
/// Each die contributes its face value plus its own bonus; nested groups
/// contribute their combined value. Unsettled dice and valueless groups are
/// skipped. An empty `Sum` is zero; an empty `Highest`/`Lowest` has no value.
pub fn combine(
    nodes: &[DiceNode],
    combination: Option<Combination>,
    values: &BTreeMap<DieId, Option<u32>>,
) -> Option<i64> {
    let parts = nodes.iter().filter_map(|node| match node {
        DiceNode::Die(die) => values
            .get(&die.id)
            .copied()
            .flatten()
            .map(|v| i64::from(v) + i64::from(die.bonus.unwrap_or(0))),
        DiceNode::Group(group) => group.combined_value(values),
    });

    match combination.unwrap_or_default() {
        Combination::Highest => parts.max(),
        Combination::Lowest => parts.min(),
        Combination::Sum => Some(parts.sum()),
        Combination::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceStyle, DieKind};

    fn die(id: &str, kind: DieKind) -> Die {
        Die {
            id: DieId::from(id),
            kind,
            style: DiceStyle::Glass,
            bonus: None,
        }
    }

    fn sample_tree() -> Vec<DiceNode> {
        vec![
            die("a", DieKind::D20).into(),
            Dice::new([
                die("b", DieKind::D6).into(),
                Dice::new([die("c", DieKind::D4).into()]).into(),
            ])
            .into(),
            die("d", DieKind::D8).into(),
        ]
    }

    #[test]
    fn test_flatten_depth_first_order() {
        let tree = sample_tree();
        let ids: Vec<&str> = flatten(&tree).iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        // Restartable
        assert_eq!(flatten(&tree).len(), 4);
    }

    #[test]
    fn test_flatten_empty_groups() {
        let tree: Vec<DiceNode> =
            vec![Dice::default().into(), Dice::new([Dice::default().into()]).into()];
        assert!(flatten(&tree).is_empty());
    }

    #[test]
    fn test_discriminant() {
        let tree = sample_tree();
        assert!(tree[0].is_die() && !tree[0].is_group());
        assert!(tree[1].is_group() && tree[1].as_die().is_none());
        assert_eq!(tree[1].as_group().map(|g| g.dice.len()), Some(2));
    }

    #[test]
    fn test_node_tag_round_trip() {
        let tree = sample_tree();
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains(r#""type":"group""#));
        let back: Vec<DiceNode> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_ensure_unique_ids() {
        let mut tree: Vec<DiceNode> = vec![
            die("a", DieKind::D6).into(),
            die("a", DieKind::D6).into(),
            Dice::new([die("live", DieKind::D6).into()]).into(),
        ];
        let taken: HashSet<DieId> = [DieId::from("live")].into_iter().collect();
        let renewed = ensure_unique_ids(&mut tree, |id| taken.contains(id));
        assert_eq!(renewed, 2);

        let ids: HashSet<&DieId> = flatten(&tree).iter().map(|d| &d.id).collect();
        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(&DieId::from("live")));
        // First occurrence of a repeated id keeps it
        assert_eq!(flatten(&tree)[0].id, DieId::from("a"));
    }

    #[test]
    fn test_groups_get_fresh_ids() {
        let a = Dice::new([die("a", DieKind::D6).into()]);
        let b = Dice::default();
        assert!(a.id.starts_with("group-"));
        assert_ne!(a.id, b.id);

        // Trees saved without group ids still load, each group with its own id
        let json = r#"[{"type":"group","dice":[]},{"type":"group","dice":[]}]"#;
        let nodes: Vec<DiceNode> = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = nodes
            .iter()
            .filter_map(DiceNode::as_group)
            .map(|g| g.id.as_str())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_combine_modes() {
        let values: BTreeMap<DieId, Option<u32>> = [
            (DieId::from("a"), Some(17)),
            (DieId::from("b"), Some(4)),
            (DieId::from("c"), Some(2)),
            (DieId::from("d"), None),
        ]
        .into_iter()
        .collect();

        let tree = sample_tree();
        // 17 + (4 + 2) + unsettled
        assert_eq!(combine(&tree, None, &values), Some(23));
        assert_eq!(combine(&tree, Some(Combination::Highest), &values), Some(17));
        assert_eq!(combine(&tree, Some(Combination::Lowest), &values), Some(6));
        assert_eq!(combine(&tree, Some(Combination::None), &values), None);
    }

    #[test]
    fn test_combine_bonuses() {
        let values: BTreeMap<DieId, Option<u32>> =
            [(DieId::from("a"), Some(3)), (DieId::from("b"), Some(5))].into_iter().collect();
        let group = Dice::new([
            die("a", DieKind::D6).with_bonus(1).into(),
            die("b", DieKind::D6).into(),
        ])
        .with_combination(Combination::Highest)
        .with_bonus(-2);
        // max(3 + 1, 5) - 2
        assert_eq!(group.combined_value(&values), Some(3));
    }

    #[test]
    fn test_combine_empty() {
        let values = BTreeMap::new();
        assert_eq!(combine(&[], None, &values), Some(0));
        assert_eq!(combine(&[], Some(Combination::Highest), &values), None);
    }
}
