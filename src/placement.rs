//! Which item sits in which slot.

use crate::sequence::Item;
use std::ops::Range;

/// Slot contents for the whole puzzle, indexed by global slot.
///
/// A filled slot always holds the canonical item for its index; writes that
/// would break that are caller bugs and panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementState {
    canonical: &'static [Item],
    slots: Vec<Option<Item>>,
}

impl PlacementState {
    pub fn new(canonical: &'static [Item]) -> Self {
        Self {
            canonical,
            slots: vec![None; canonical.len()],
        }
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<Item> {
        assert!(slot < self.slots.len(), "slot {slot} out of range");
        self.slots[slot]
    }

    /// Fill an empty slot. The slot must be empty and `item` must be its canonical step.
    pub fn set(&mut self, slot: usize, item: Item) {
        assert!(
            self.get(slot).is_none(),
            "slot {slot} already holds {:?}",
            self.slots[slot]
        );
        assert_eq!(
            self.canonical[slot], item,
            "item {item:?} does not belong in slot {slot}"
        );
        self.slots[slot] = Some(item);
    }

    pub fn clear_range(&mut self, range: Range<usize>) {
        for slot in &mut self.slots[range] {
            *slot = None;
        }
    }

    /// True iff every slot in `base..base + len` holds its canonical item.
    pub fn is_part_complete(&self, base: usize, len: usize) -> bool {
        (base..base + len).all(|i| self.get(i) == Some(self.canonical[i]))
    }

    pub fn contains(&self, item: Item) -> bool {
        self.slots.contains(&Some(item))
    }

    pub fn reset(&mut self) {
        self.slots.fill(None);
    }

    pub fn as_slice(&self) -> &[Option<Item>] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABCD: [Item; 4] = ["A", "B", "C", "D"];

    #[test]
    fn test_new_is_empty() {
        let p = PlacementState::new(&ABCD);
        assert_eq!(p.as_slice().len(), 4);
        assert!((0..4).all(|i| p.get(i).is_none()));
    }

    #[test]
    fn test_set_and_complete() {
        let mut p = PlacementState::new(&ABCD);
        p.set(0, "A");
        p.set(1, "B");
        assert!(p.is_part_complete(0, 2));
        assert!(!p.is_part_complete(0, 3));
        assert!(!p.is_part_complete(2, 2));
        assert!(p.contains("B"));
        assert!(!p.contains("C"));
    }

    #[test]
    #[should_panic(expected = "already holds")]
    fn test_set_occupied_panics() {
        let mut p = PlacementState::new(&ABCD);
        p.set(0, "A");
        p.set(0, "A");
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn test_set_wrong_item_panics() {
        let mut p = PlacementState::new(&ABCD);
        p.set(1, "C");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range_panics() {
        PlacementState::new(&ABCD).get(4);
    }

    #[test]
    fn test_clear_range_and_reset() {
        let mut p = PlacementState::new(&ABCD);
        p.set(0, "A");
        p.set(1, "B");
        p.set(2, "C");
        p.clear_range(1..3);
        assert_eq!(p.as_slice(), &[Some("A"), None, None, None]);
        p.reset();
        assert!(p.as_slice().iter().all(Option::is_none));
    }
}
