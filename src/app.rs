//! App: terminal init, main loop, mouse drag and key handling.

use crate::feedback::{FeedbackGate, Release, TerminalCuePlayer};
use crate::game::{Navigation, Phase, PuzzleController, ShakeSignal};
use crate::input::{
    Action, DragEvent, DragTracker, HitMap, InputSensorSelector, key_to_action,
};
use crate::sequence::{CANONICAL_SEQUENCE, Item, SequenceShuffler};
use crate::theme::Theme;
use crate::ui::BoardView;
use crate::validator::Verdict;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Position;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// ~60 FPS; the shake and overlay fade need a steady frame clock.
const FRAME_DURATION: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Playing,
    /// Win or loss overlay.
    End,
}

/// Keyboard selection: index into the visible tiles and part-local slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCursor {
    pub tile: usize,
    pub slot: usize,
}

pub struct App {
    args: Args,
    theme: Theme,
    controller: PuzzleController<TerminalCuePlayer>,
    screen: Screen,
    sensor: InputSensorSelector,
    drag: DragTracker,
    cursor: KeyCursor,
    shake: Option<ShakeSignal>,
    /// Regions from the last drawn frame.
    hits: HitMap,
    /// TachyonFX fade for the end overlay (created on first end-screen frame).
    end_effect: Option<Effect>,
    end_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Self {
        let canonical = &CANONICAL_SEQUENCE[..config.partitioning.total()];
        let gate = FeedbackGate::new(TerminalCuePlayer::new(config.mute), config.cue_timeout);
        let controller = PuzzleController::new(
            canonical,
            config.partitioning,
            config.wrong_drop,
            gate,
            SequenceShuffler::new(config.seed),
        );
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Home
        };
        Self {
            args,
            theme,
            controller,
            screen,
            sensor: InputSensorSelector::default(),
            drag: DragTracker::default(),
            cursor: KeyCursor::default(),
            shake: None,
            hits: HitMap::default(),
            end_effect: None,
            end_effect_process_time: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::EnableMouseCapture,
            execute,
            terminal::{EnterAlternateScreen, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
            let _ = restore_terminal();
            return Err(err.into());
        }

        // Leave the terminal usable if anything below panics.
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore_terminal();
            hook(info);
        }));

        let mut terminal =
            match ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout)) {
                Ok(t) => t,
                Err(err) => {
                    let _ = restore_terminal();
                    return Err(err.into());
                }
            };
        let result = self.run_loop(&mut terminal);

        restore_terminal()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.tick(now);

            let snapshot = self.controller.snapshot();
            let board = BoardView {
                snapshot: &snapshot,
                drag: self.drag.active(),
                shake: self.shake,
                sensor: self.sensor.active(),
                cursor: self.cursor,
            };
            let mut hits = HitMap::default();
            terminal.draw(|f| {
                hits = crate::ui::draw(
                    f,
                    self.screen,
                    &self.theme,
                    &board,
                    &mut self.end_effect,
                    &mut self.end_effect_process_time,
                    self.args.no_animation,
                    now,
                );
            })?;
            self.hits = hits;

            let timeout = FRAME_DURATION.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let ev = event::read()?;
                    self.sensor.observe(&ev);
                    let quit = match ev {
                        Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse);
                            false
                        }
                        _ => false,
                    };
                    if quit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Per-frame housekeeping: release the cue lock, expire the shake, follow game end.
    fn tick(&mut self, now: Instant) {
        if let Some(Release::TimedOut) = self.controller.tick(now) {
            tracing::debug!("cue lock released by timeout");
        }
        if self.shake.is_some_and(|s| !s.is_live(now)) {
            self.shake = None;
        }
        self.sync_screen();
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let action = key_to_action(key);
        if action == Action::Quit {
            return true;
        }
        match self.screen {
            Screen::Home => {
                if action == Action::Confirm {
                    self.start();
                }
            }
            Screen::Playing => {
                let tiles = self.controller.visible_tiles().len();
                let slots = self.controller.part_len();
                match action {
                    Action::PrevTile => self.cursor.tile = step(self.cursor.tile, tiles, false),
                    Action::NextTile => self.cursor.tile = step(self.cursor.tile, tiles, true),
                    Action::PrevSlot => self.cursor.slot = step(self.cursor.slot, slots, false),
                    Action::NextSlot => self.cursor.slot = step(self.cursor.slot, slots, true),
                    Action::Confirm => {
                        let tile = self.controller.visible_tiles().get(self.cursor.tile).copied();
                        if let Some(tile) = tile {
                            self.drop_item(tile.item, self.cursor.slot);
                        }
                    }
                    _ => {}
                }
            }
            Screen::End => {
                if matches!(action, Action::Confirm | Action::Restart) {
                    self.reset();
                }
            }
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match self.screen {
            Screen::Home | Screen::End => {
                let pos = Position::new(mouse.column, mouse.row);
                if mouse.kind == MouseEventKind::Up(MouseButton::Left) && self.hits.button_at(pos) {
                    if self.screen == Screen::Home {
                        self.start();
                    } else {
                        self.reset();
                    }
                }
            }
            Screen::Playing => {
                let locked = self.controller.input_locked();
                match self.drag.handle(mouse, &self.hits, locked) {
                    Some(DragEvent::Dropped { item, slot }) => self.drop_item(item, slot),
                    Some(DragEvent::Returned(item)) => tracing::trace!(item, "tile returned"),
                    None => {}
                }
            }
        }
    }

    fn drop_item(&mut self, item: Item, slot: usize) {
        let outcome = self.controller.on_drop(item, slot, Instant::now());
        if outcome.verdict.is_some_and(Verdict::is_ignored) {
            tracing::trace!(item, slot, "drop ignored");
        }
        if let Some(shake) = outcome.shake {
            self.shake = Some(shake);
        }
        if outcome.advanced_to.is_some() {
            self.cursor = KeyCursor::default();
            self.shake = None;
        } else if outcome.verdict == Some(Verdict::Accepted) {
            let snapshot = self.controller.snapshot();
            self.cursor.slot = snapshot
                .part_slots()
                .iter()
                .position(Option::is_none)
                .unwrap_or(0);
        }
        let tiles = self.controller.visible_tiles();
        if self
            .drag
            .active()
            .is_some_and(|d| !tiles.iter().any(|t| t.item == d.item))
        {
            self.drag.cancel();
        }
        self.cursor.tile = self.cursor.tile.min(tiles.len().saturating_sub(1));
        self.sync_screen();
    }

    fn sync_screen(&mut self) {
        let over = matches!(self.controller.phase(), Phase::Won | Phase::Lost);
        if self.screen == Screen::Playing && over {
            self.screen = Screen::End;
            self.drag.cancel();
            self.end_effect = None;
            self.end_effect_process_time = None;
        }
    }

    fn start(&mut self) {
        tracing::debug!("start");
        self.screen = Screen::Playing;
    }

    fn reset(&mut self) {
        match self.controller.reset() {
            Navigation::Home => self.screen = Screen::Home,
        }
        self.cursor = KeyCursor::default();
        self.shake = None;
        self.drag.cancel();
        self.end_effect = None;
        self.end_effect_process_time = None;
    }
}

/// Move an index one step with wrap-around; 0 when `len` is 0.
fn step(i: usize, len: usize, forward: bool) -> usize {
    match (len, forward) {
        (0, _) => 0,
        (_, true) => (i + 1) % len,
        (_, false) => (i + len - 1) % len,
    }
}

fn restore_terminal() -> std::io::Result<()> {
    use crossterm::{
        event::DisableMouseCapture,
        execute,
        terminal::{LeaveAlternateScreen, disable_raw_mode},
    };
    execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()
}
