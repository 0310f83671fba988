//! Puzzle state machine: drops, lives, parts, win/loss, and the cue lock.

use crate::WrongDropPolicy;
use crate::feedback::{Cue, CuePlayer, FeedbackGate, Release};
use crate::placement::PlacementState;
use crate::sequence::{Item, Partitioning, SequenceShuffler, Tile};
use crate::validator::{Verdict, validate};
use std::ops::Range;
use std::time::{Duration, Instant};

pub const INITIAL_LIVES: u8 = 3;

/// How long a rejected slot shakes.
pub const SHAKE_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing(usize),
    Won,
    Lost,
}

/// Everything the puzzle remembers between drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub placement: PlacementState,
    pub lives: u8,
    /// 1-indexed.
    pub current_part: usize,
    pub won: bool,
    pub lost: bool,
}

impl GameState {
    fn new(canonical: &'static [Item]) -> Self {
        Self {
            placement: PlacementState::new(canonical),
            lives: INITIAL_LIVES,
            current_part: 1,
            won: false,
            lost: false,
        }
    }

    /// Full lives, first part, empty slots.
    fn reset(&mut self) {
        self.placement.reset();
        self.lives = INITIAL_LIVES;
        self.current_part = 1;
        self.won = false;
        self.lost = false;
    }

    pub fn phase(&self) -> Phase {
        if self.won {
            Phase::Won
        } else if self.lost {
            Phase::Lost
        } else {
            Phase::Playing(self.current_part)
        }
    }
}

/// Transient "shake this slot" signal emitted with a rejected drop. `slot` is part-local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShakeSignal {
    pub slot: usize,
    pub started: Instant,
}

impl ShakeSignal {
    pub fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) < SHAKE_DURATION
    }
}

/// What a drop did. `verdict` is `None` when the drop was discarded outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DropOutcome {
    pub verdict: Option<Verdict>,
    pub cue: Option<Cue>,
    pub shake: Option<ShakeSignal>,
    /// Set when the drop finished a part and the next one became active.
    pub advanced_to: Option<usize>,
}

/// Where the app should route after a controller request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Home,
}

/// Read-only view handed to the renderer each frame.
#[derive(Debug)]
pub struct Snapshot<'a> {
    pub lives: u8,
    pub current_part: usize,
    pub part_count: usize,
    pub placement: &'a [Option<Item>],
    /// Global slots of the current part.
    pub part_range: Range<usize>,
    pub won: bool,
    pub lost: bool,
    pub input_locked: bool,
    pub visible_tiles: Vec<Tile>,
}

impl Snapshot<'_> {
    pub fn part_slots(&self) -> &[Option<Item>] {
        &self.placement[self.part_range.clone()]
    }
}

pub struct PuzzleController<P> {
    canonical: &'static [Item],
    partitioning: Partitioning,
    wrong_drop: WrongDropPolicy,
    state: GameState,
    gate: FeedbackGate<P>,
    shuffler: SequenceShuffler,
    /// Shuffled tiles of the active part; fixed until the part is left.
    presentation: Vec<Tile>,
}

impl<P: CuePlayer> PuzzleController<P> {
    pub fn new(
        canonical: &'static [Item],
        partitioning: Partitioning,
        wrong_drop: WrongDropPolicy,
        gate: FeedbackGate<P>,
        mut shuffler: SequenceShuffler,
    ) -> Self {
        assert_eq!(
            canonical.len(),
            partitioning.total(),
            "partitioning does not cover the sequence"
        );
        let presentation = shuffler.present(&canonical[partitioning.range(1)]);
        Self {
            canonical,
            partitioning,
            wrong_drop,
            state: GameState::new(canonical),
            gate,
            shuffler,
            presentation,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn input_locked(&self) -> bool {
        self.gate.is_locked()
    }

    pub fn part_len(&self) -> usize {
        self.partitioning.len(self.state.current_part)
    }

    /// Tiles of the active part that are not placed yet, in presentation order.
    pub fn visible_tiles(&self) -> Vec<Tile> {
        self.presentation
            .iter()
            .filter(|t| !self.state.placement.contains(t.item))
            .copied()
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            lives: self.state.lives,
            current_part: self.state.current_part,
            part_count: self.partitioning.part_count(),
            placement: self.state.placement.as_slice(),
            part_range: self.partitioning.range(self.state.current_part),
            won: self.state.won,
            lost: self.state.lost,
            input_locked: self.gate.is_locked(),
            visible_tiles: self.visible_tiles(),
        }
    }

    /// Advance the cue lock. Call once per frame.
    pub fn tick(&mut self, now: Instant) -> Option<Release> {
        self.gate.poll(now)
    }

    /// Resolve dropping `item` on part-local `slot`.
    ///
    /// A placed item dropped on an open slot is discarded without penalty.
    /// Panics on a slot outside the current part or an item not in the sequence.
    pub fn on_drop(&mut self, item: Item, slot: usize, now: Instant) -> DropOutcome {
        if self.gate.is_locked() {
            tracing::trace!(item, slot, "drop discarded: input locked");
            return DropOutcome::default();
        }
        if self.state.won || self.state.lost {
            return DropOutcome::default();
        }

        let part = self.state.current_part;
        let part_len = self.partitioning.len(part);
        assert!(slot < part_len, "slot {slot} outside part {part} ({part_len} slots)");
        assert!(self.canonical.contains(&item), "unknown item {item:?}");

        let base = self.partitioning.base(part);
        let target = base + slot;
        let verdict = validate(item, target, base, &self.state.placement, self.canonical);
        // A stale pointer drag can still name a tile that has since been placed.
        if !verdict.is_ignored() && self.state.placement.contains(item) {
            tracing::trace!(item, slot = target, "drop discarded: item already placed");
            return DropOutcome::default();
        }
        tracing::debug!(item, slot = target, part, ?verdict, "drop");

        let mut outcome = DropOutcome {
            verdict: Some(verdict),
            ..DropOutcome::default()
        };
        match verdict {
            Verdict::IgnoredOccupied | Verdict::IgnoredOutOfOrder => return outcome,
            Verdict::Accepted => {
                self.state.placement.set(target, item);
                let cue = self.after_accept(base, part_len, &mut outcome);
                outcome.cue = Some(cue);
            }
            Verdict::Rejected => {
                outcome.shake = Some(ShakeSignal { slot, started: now });
                outcome.cue = Some(Cue::Wrong);
                self.penalize();
            }
        }
        if let Some(cue) = outcome.cue {
            self.gate.play(cue, now);
        }
        outcome
    }

    fn after_accept(&mut self, base: usize, part_len: usize, outcome: &mut DropOutcome) -> Cue {
        if !self.state.placement.is_part_complete(base, part_len) {
            return Cue::Correct;
        }
        let part = self.state.current_part;
        if part < self.partitioning.part_count() {
            let next = part + 1;
            self.state.current_part = next;
            self.presentation = self
                .shuffler
                .present(&self.canonical[self.partitioning.range(next)]);
            outcome.advanced_to = Some(next);
            tracing::info!(part, next, lives = self.state.lives, "part complete");
            Cue::PartComplete
        } else {
            self.state.won = true;
            tracing::info!(lives = self.state.lives, "puzzle solved");
            Cue::Celebrate
        }
    }

    fn penalize(&mut self) {
        if self.state.lives > 1 {
            self.state.lives -= 1;
            if self.wrong_drop == WrongDropPolicy::ClearPart {
                let range = self.partitioning.range(self.state.current_part);
                self.state.placement.clear_range(range);
            }
            tracing::debug!(lives = self.state.lives, "life lost");
        } else {
            self.state.lives = 0;
            self.state.lost = true;
            tracing::info!(part = self.state.current_part, "out of lives");
        }
    }

    /// Back to the first part with full lives and empty slots. An in-flight cue keeps its lock.
    pub fn reset(&mut self) -> Navigation {
        tracing::info!(from = ?self.state.phase(), "reset");
        self.state.reset();
        self.presentation = self
            .shuffler
            .present(&self.canonical[self.partitioning.range(1)]);
        Navigation::Home
    }

    #[cfg(test)]
    fn player_mut(&mut self) -> &mut P {
        self.gate.player_mut()
    }
}
