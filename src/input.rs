//! Key bindings, active sensor tracking, and mouse drag-and-drop.

use crate::sequence::Item;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PrevTile,
    NextTile,
    PrevSlot,
    NextSlot,
    Confirm,
    Restart,
    Quit,
    None,
}

/// Map key event to action. Arrows and hjkl both work.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => Action::PrevTile,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => Action::NextTile,
        KeyCode::Up | KeyCode::Char('k') => Action::PrevSlot,
        KeyCode::Down | KeyCode::Char('j') => Action::NextSlot,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Confirm,
        _ => Action::None,
    }
}

/// Physical input class that produced the latest event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sensor {
    #[default]
    Pointer,
    Keyboard,
}

/// Follows the last input modality so the UI only shows keyboard cursors when they are in use.
#[derive(Debug, Default)]
pub struct InputSensorSelector {
    active: Sensor,
}

impl InputSensorSelector {
    pub fn observe(&mut self, event: &Event) {
        let sensor = match event {
            Event::Mouse(_) => Sensor::Pointer,
            Event::Key(_) => Sensor::Keyboard,
            _ => return,
        };
        if sensor != self.active {
            tracing::debug!(?sensor, "input sensor changed");
            self.active = sensor;
        }
    }

    pub fn active(&self) -> Sensor {
        self.active
    }
}

/// Screen regions from the last frame, used to resolve pointer positions.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    /// Part-local slot index -> area.
    pub slots: Vec<Rect>,
    pub tiles: Vec<(Item, Rect)>,
    /// Home / end-screen button.
    pub button: Option<Rect>,
}

impl HitMap {
    pub fn slot_at(&self, pos: Position) -> Option<usize> {
        self.slots.iter().position(|r| r.contains(pos))
    }

    /// Topmost tile under `pos` (later tiles draw over earlier ones).
    pub fn tile_at(&self, pos: Position) -> Option<Item> {
        self.tiles
            .iter()
            .rev()
            .find(|(_, r)| r.contains(pos))
            .map(|(item, _)| *item)
    }

    pub fn button_at(&self, pos: Position) -> bool {
        self.button.is_some_and(|r| r.contains(pos))
    }
}

/// A tile being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drag {
    pub item: Item,
    pub pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Dropped { item: Item, slot: usize },
    /// Released away from any slot; the tile goes back to the pool.
    Returned(Item),
}

#[derive(Debug, Default)]
pub struct DragTracker {
    active: Option<Drag>,
}

impl DragTracker {
    pub fn active(&self) -> Option<Drag> {
        self.active
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Feed one mouse event. Pick-up is refused while `locked`.
    pub fn handle(&mut self, mouse: MouseEvent, hits: &HitMap, locked: bool) -> Option<DragEvent> {
        let pos = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !locked {
                    self.active = hits.tile_at(pos).map(|item| Drag { item, pos });
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(drag) = self.active.as_mut() {
                    drag.pos = pos;
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let drag = self.active.take()?;
                Some(match hits.slot_at(pos) {
                    Some(slot) => DragEvent::Dropped {
                        item: drag.item,
                        slot,
                    },
                    None => DragEvent::Returned(drag.item),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn hits() -> HitMap {
        HitMap {
            slots: vec![Rect::new(0, 0, 20, 3), Rect::new(0, 4, 20, 3)],
            tiles: vec![("A", Rect::new(30, 0, 10, 3)), ("B", Rect::new(35, 1, 10, 3))],
            button: None,
        }
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(key_to_action(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::PrevTile);
        assert_eq!(key_to_action(key(KeyCode::Right)), Action::NextTile);
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::NextSlot);
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::Confirm);
        assert_eq!(key_to_action(key(KeyCode::Char('R'))), Action::Restart);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::ALT)),
            Action::None
        );
    }

    #[test]
    fn test_sensor_follows_last_event() {
        let mut s = InputSensorSelector::default();
        assert_eq!(s.active(), Sensor::Pointer);
        s.observe(&Event::Key(KeyEvent::new_with_kind(
            KeyCode::Left,
            KeyModifiers::NONE,
            KeyEventKind::Press,
        )));
        assert_eq!(s.active(), Sensor::Keyboard);
        s.observe(&Event::Resize(80, 24));
        assert_eq!(s.active(), Sensor::Keyboard);
        s.observe(&Event::Mouse(mouse(MouseEventKind::Moved, 1, 1)));
        assert_eq!(s.active(), Sensor::Pointer);
    }

    #[test]
    fn test_drag_onto_slot() {
        let mut d = DragTracker::default();
        let h = hits();
        assert_eq!(d.handle(mouse(MouseEventKind::Down(MouseButton::Left), 31, 0), &h, false), None);
        assert_eq!(d.active().map(|a| a.item), Some("A"));
        d.handle(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 5), &h, false);
        assert_eq!(d.active().map(|a| a.pos), Some(Position::new(5, 5)));
        assert_eq!(
            d.handle(mouse(MouseEventKind::Up(MouseButton::Left), 5, 5), &h, false),
            Some(DragEvent::Dropped { item: "A", slot: 1 })
        );
        assert_eq!(d.active(), None);
    }

    #[test]
    fn test_overlapping_tiles_pick_topmost() {
        let mut d = DragTracker::default();
        d.handle(mouse(MouseEventKind::Down(MouseButton::Left), 36, 1), &hits(), false);
        assert_eq!(d.active().map(|a| a.item), Some("B"));
    }

    #[test]
    fn test_release_off_slot_returns_tile() {
        let mut d = DragTracker::default();
        let h = hits();
        d.handle(mouse(MouseEventKind::Down(MouseButton::Left), 31, 0), &h, false);
        assert_eq!(
            d.handle(mouse(MouseEventKind::Up(MouseButton::Left), 60, 20), &h, false),
            Some(DragEvent::Returned("A"))
        );
    }

    #[test]
    fn test_no_pickup_while_locked() {
        let mut d = DragTracker::default();
        let h = hits();
        d.handle(mouse(MouseEventKind::Down(MouseButton::Left), 31, 0), &h, true);
        assert_eq!(d.active(), None);
        assert_eq!(d.handle(mouse(MouseEventKind::Up(MouseButton::Left), 5, 1), &h, true), None);
    }
}
