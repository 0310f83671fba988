//! Drop verdicts.

use crate::placement::PlacementState;
use crate::sequence::Item;

/// Outcome of one drop attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Target slot already filled.
    IgnoredOccupied,
    /// Slot above the target (same part) is not filled yet.
    IgnoredOutOfOrder,
    /// Wrong item for a legal, empty, in-order slot. Costs a life.
    Rejected,
}

impl Verdict {
    /// Silent verdicts leave state untouched and play nothing.
    pub fn is_ignored(self) -> bool {
        matches!(self, Self::IgnoredOccupied | Self::IgnoredOutOfOrder)
    }
}

/// Classify dropping `item` onto global slot `target` of the part starting at `part_base`.
///
/// Rules apply in order: occupied, out of order, correct, wrong.
pub fn validate(
    item: Item,
    target: usize,
    part_base: usize,
    placement: &PlacementState,
    canonical: &[Item],
) -> Verdict {
    if placement.get(target).is_some() {
        return Verdict::IgnoredOccupied;
    }
    if target > part_base && placement.get(target - 1) != Some(canonical[target - 1]) {
        return Verdict::IgnoredOutOfOrder;
    }
    if item == canonical[target] {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQ: [Item; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

    #[test]
    fn test_first_slot_correct_and_wrong() {
        let p = PlacementState::new(&SEQ);
        assert_eq!(validate("A", 0, 0, &p, &SEQ), Verdict::Accepted);
        assert_eq!(validate("B", 0, 0, &p, &SEQ), Verdict::Rejected);
    }

    #[test]
    fn test_occupied_wins_over_everything() {
        let mut p = PlacementState::new(&SEQ);
        p.set(0, "A");
        assert_eq!(validate("A", 0, 0, &p, &SEQ), Verdict::IgnoredOccupied);
        assert_eq!(validate("C", 0, 0, &p, &SEQ), Verdict::IgnoredOccupied);
    }

    #[test]
    fn test_skip_ahead_is_out_of_order_even_if_correct() {
        let p = PlacementState::new(&SEQ);
        assert_eq!(validate("C", 2, 0, &p, &SEQ), Verdict::IgnoredOutOfOrder);
        assert_eq!(validate("A", 2, 0, &p, &SEQ), Verdict::IgnoredOutOfOrder);
    }

    #[test]
    fn test_part_base_has_no_predecessor() {
        // Slot 4 opens part two; slot 3 being empty must not block it.
        let p = PlacementState::new(&SEQ);
        assert_eq!(validate("E", 4, 4, &p, &SEQ), Verdict::Accepted);
        assert_eq!(validate("F", 4, 4, &p, &SEQ), Verdict::Rejected);
        assert_eq!(validate("F", 5, 4, &p, &SEQ), Verdict::IgnoredOutOfOrder);
    }

    #[test]
    fn test_ignored_flag() {
        assert!(Verdict::IgnoredOccupied.is_ignored());
        assert!(Verdict::IgnoredOutOfOrder.is_ignored());
        assert!(!Verdict::Accepted.is_ignored());
        assert!(!Verdict::Rejected.is_ignored());
    }
}
