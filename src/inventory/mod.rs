//! Stackable item ledger. Items are grouped by id; each stack holds at most
//! `stack_limit` items.

use crate::core::constants::DEFAULT_STACK_LIMIT;
use crate::gacha::Rarity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub rarity: Rarity,
    pub count: u32,
    pub stack_limit: u32,
}

impl InventoryItem {
    pub fn new(id: impl Into<String>, rarity: Rarity, count: u32) -> Self {
        Self::with_stack_limit(id, rarity, count, DEFAULT_STACK_LIMIT)
    }

    pub fn with_stack_limit(id: impl Into<String>, rarity: Rarity, count: u32, stack_limit: u32) -> Self {
        Self {
            id: id.into(),
            rarity,
            count,
            stack_limit: stack_limit.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryAddResult {
    /// `stacks` is the number of stacks now held for the item id.
    Added { stacks: usize, new_stacks: usize },
    NothingToAdd,
}

impl fmt::Display for InventoryAddResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryAddResult::Added { stacks, new_stacks } => {
                write!(f, "added stacks={stacks} new={new_stacks}")
            }
            InventoryAddResult::NothingToAdd => write!(f, "nothing-to-add"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    stacks: BTreeMap<String, Vec<InventoryItem>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds from saved stacks, re-adding each one so limits hold.
    pub fn restore(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        let mut inventory = Self::new();
        for item in items {
            inventory.add(item);
        }
        inventory
    }

    /// Every stack, ordered by item id.
    pub fn snapshot(&self) -> Vec<InventoryItem> {
        self.stacks.values().flatten().cloned().collect()
    }

    pub fn count_of(&self, id: &str) -> u32 {
        self.stacks
            .get(id)
            .map(|stacks| stacks.iter().map(|s| s.count).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Tops up partial stacks first, then opens new ones.
    pub fn add(&mut self, item: InventoryItem) -> InventoryAddResult {
        if item.count == 0 {
            return InventoryAddResult::NothingToAdd;
        }

        let stacks = self.stacks.entry(item.id.clone()).or_default();
        let mut remaining = item.count;

        for stack in stacks.iter_mut() {
            if remaining == 0 {
                break;
            }
            let room = stack.stack_limit.saturating_sub(stack.count);
            let filled = room.min(remaining);
            stack.count += filled;
            remaining -= filled;
        }

        // Saves and struct literals can carry a zero limit.
        let limit = item.stack_limit.max(1);
        let mut new_stacks = 0;
        while remaining > 0 {
            let placed = limit.min(remaining);
            stacks.push(InventoryItem {
                count: placed,
                stack_limit: limit,
                ..item.clone()
            });
            remaining -= placed;
            new_stacks += 1;
        }

        InventoryAddResult::Added {
            stacks: stacks.len(),
            new_stacks,
        }
    }

    /// Takes up to `count` items, newest stacks first. Returns how many
    /// were removed.
    pub fn remove(&mut self, id: &str, count: u32) -> u32 {
        let Some(stacks) = self.stacks.get_mut(id) else {
            return 0;
        };

        let mut remaining = count;
        for stack in stacks.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            let taken = stack.count.min(remaining);
            stack.count -= taken;
            remaining -= taken;
        }
        stacks.retain(|s| s.count > 0);
        if stacks.is_empty() {
            self.stacks.remove(id);
        }
        count - remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_splits_into_stacks() {
        let mut inventory = Inventory::new();
        let result = inventory.add(InventoryItem::with_stack_limit("elixir", Rarity::Rare, 25, 10));
        assert_eq!(result, InventoryAddResult::Added { stacks: 3, new_stacks: 3 });

        let counts: Vec<u32> = inventory.snapshot().iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![10, 10, 5]);
    }

    #[test]
    fn test_partial_stack_filled_first() {
        let mut inventory = Inventory::new();
        inventory.add(InventoryItem::with_stack_limit("elixir", Rarity::Rare, 5, 10));
        let result = inventory.add(InventoryItem::with_stack_limit("elixir", Rarity::Rare, 7, 10));
        assert_eq!(result, InventoryAddResult::Added { stacks: 2, new_stacks: 1 });
        assert_eq!(inventory.count_of("elixir"), 12);
        assert!(inventory.snapshot().iter().all(|s| s.count <= s.stack_limit));
    }

    #[test]
    fn test_zero_count_is_nothing() {
        let mut inventory = Inventory::new();
        assert_eq!(
            inventory.add(InventoryItem::new("charm", Rarity::Common, 0)),
            InventoryAddResult::NothingToAdd
        );
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_stack_limit_floor() {
        let item = InventoryItem::with_stack_limit("charm", Rarity::Common, 3, 0);
        assert_eq!(item.stack_limit, 1);
        let mut inventory = Inventory::new();
        inventory.add(item);
        assert_eq!(inventory.snapshot().len(), 3);
    }

    #[test]
    fn test_zero_limit_literal_still_terminates() {
        let mut inventory = Inventory::new();
        let result = inventory.add(InventoryItem {
            id: "charm".to_string(),
            rarity: Rarity::Common,
            count: 2,
            stack_limit: 0,
        });
        assert_eq!(result, InventoryAddResult::Added { stacks: 2, new_stacks: 2 });
        assert_eq!(inventory.count_of("charm"), 2);
    }

    #[test]
    fn test_remove_drains_and_drops_empty() {
        let mut inventory = Inventory::new();
        inventory.add(InventoryItem::with_stack_limit("talisman", Rarity::Epic, 15, 10));
        assert_eq!(inventory.remove("talisman", 7), 7);
        assert_eq!(inventory.count_of("talisman"), 8);
        assert_eq!(inventory.remove("talisman", 100), 8);
        assert!(inventory.is_empty());
        assert_eq!(inventory.remove("missing", 1), 0);
    }

    #[test]
    fn test_restore_matches_snapshot() {
        let mut inventory = Inventory::new();
        inventory.add(InventoryItem::with_stack_limit("a", Rarity::Common, 12, 5));
        inventory.add(InventoryItem::new("b", Rarity::Legendary, 1));
        let restored = Inventory::restore(inventory.snapshot());
        assert_eq!(restored, inventory);
    }
}
