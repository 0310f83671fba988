//! Layout and drawing: home screen, puzzle board (slots, tiles, lives), end overlay.

use crate::app::{KeyCursor, Screen};
use crate::game::{INITIAL_LIVES, SHAKE_DURATION, ShakeSignal, Snapshot};
use crate::input::{Drag, HitMap, Sensor};
use crate::sequence::{Item, Tile};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const HEADER_HEIGHT: u16 = 3;
/// Border + two wrapped text lines.
const SLOT_HEIGHT: u16 = 4;
const ARROW_HEIGHT: u16 = 1;
const TILE_HEIGHT: u16 = 4;
const TILE_COLUMNS: u16 = 2;
/// Vertical room per tile row: the tile, its max margin, and a gap.
const TILE_ROW_HEIGHT: u16 = TILE_HEIGHT + 3;
/// Horizontal room kept free for tilt jitter on each side of a tile.
const TILT_ROOM: u16 = 3;
const GHOST_WIDTH: u16 = 30;
const BUTTON_WIDTH: u16 = 20;
const BUTTON_HEIGHT: u16 = 3;

/// End overlay fade-in (TachyonFX).
const OVERLAY_FADE_MS: u32 = 800;
/// Peak horizontal shake in cells.
const SHAKE_AMPLITUDE: f32 = 2.0;

/// Everything the board needs besides the theme.
#[derive(Debug)]
pub struct BoardView<'a> {
    pub snapshot: &'a Snapshot<'a>,
    pub drag: Option<Drag>,
    pub shake: Option<ShakeSignal>,
    pub sensor: Sensor,
    pub cursor: KeyCursor,
}

/// Draw the current screen and return where slots, tiles and buttons ended up.
/// On the end screen (unless `no_animation`) the overlay fades in through `end_effect`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    theme: &Theme,
    board: &BoardView,
    end_effect: &mut Option<Effect>,
    end_effect_time: &mut Option<Instant>,
    no_animation: bool,
    now: Instant,
) -> HitMap {
    let area = frame.area();
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());
    let mut hits = HitMap::default();
    match screen {
        Screen::Home => draw_home(frame, theme, area, &mut hits),
        Screen::Playing => draw_board(frame, theme, board, area, no_animation, now, &mut hits),
        Screen::End => {
            let popup = draw_end(frame, theme, board.snapshot, area, &mut hits);
            if !no_animation {
                apply_end_effect(frame, theme, popup, end_effect, end_effect_time, now);
            }
        }
    }
    hits
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_button(frame: &mut Frame, theme: &Theme, area: Rect, label: &str, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    Paragraph::new(Line::from(Span::styled(
        label,
        Style::default()
            .fg(theme.bg)
            .bg(color)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(block)
    .render(area, frame.buffer_mut());
}

fn draw_home(frame: &mut Frame, theme: &Theme, area: Rect, hits: &mut HitMap) {
    let popup = centered(area, 52, 13);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));
    let inner = block.inner(popup);
    block.render(popup, frame.buffer_mut());

    let fg = Style::default().fg(theme.main_fg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Performance Cycle ",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Drag each step into its slot,", fg)),
        Line::from(Span::styled("top to bottom.", fg)),
        Line::from(Span::styled(
            format!("{INITIAL_LIVES} wrong drops and it's over."),
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(inner, frame.buffer_mut());

    let button = Rect {
        x: inner.x + inner.width.saturating_sub(BUTTON_WIDTH) / 2,
        y: (inner.y + inner.height).saturating_sub(BUTTON_HEIGHT + 1),
        width: BUTTON_WIDTH.min(inner.width),
        height: BUTTON_HEIGHT,
    };
    draw_button(frame, theme, button, "Get Started", theme.accent);
    hits.button = Some(button);
}

fn draw_board(
    frame: &mut Frame,
    theme: &Theme,
    board: &BoardView,
    area: Rect,
    no_animation: bool,
    now: Instant,
    hits: &mut HitMap,
) {
    let snap = board.snapshot;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);
    draw_header(frame, theme, snap, rows[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let keyboard = board.sensor == Sensor::Keyboard;
    let slot_rects = slot_layout(body[0], snap.part_range.len());
    for (i, rect) in slot_rects.iter().enumerate() {
        let offset = match board.shake {
            Some(s) if s.slot == i && s.is_live(now) && !no_animation => shake_offset(s, now),
            _ => 0,
        };
        let shown = shift_x(*rect, offset, body[0]);
        let selected = keyboard && board.cursor.slot == i;
        draw_slot(frame, theme, shown, snap.part_range.start + i + 1, snap.part_slots()[i], selected);
        if i + 1 < slot_rects.len() {
            draw_arrows(frame, theme, *rect);
        }
    }
    hits.slots = slot_rects;

    let tile_rects = tile_layout(body[1], &snap.visible_tiles);
    let dragged = board.drag.map(|d| d.item);
    for (i, (tile, rect)) in snap.visible_tiles.iter().zip(&tile_rects).enumerate() {
        if dragged == Some(tile.item) {
            continue;
        }
        let selected = keyboard && board.cursor.tile == i;
        draw_tile(frame, theme, *rect, tile.item, snap.input_locked, selected);
    }
    hits.tiles = snap
        .visible_tiles
        .iter()
        .map(|t| t.item)
        .zip(tile_rects)
        .collect();

    if let Some(drag) = board.drag {
        let ghost = Rect {
            x: drag.pos.x.saturating_sub(GHOST_WIDTH / 2),
            y: drag.pos.y.saturating_sub(TILE_HEIGHT / 2),
            width: GHOST_WIDTH,
            height: TILE_HEIGHT,
        }
        .intersection(area);
        draw_tile(frame, theme, ghost, drag.item, false, true);
    }

    let hint = if keyboard {
        " ←/→ step   ↑/↓ slot   Enter drop   Q quit "
    } else {
        " Drag a step onto its slot   Q quit "
    };
    Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(theme.inactive_fg),
    )))
    .alignment(Alignment::Center)
    .render(rows[2], frame.buffer_mut());
}

fn draw_header(frame: &mut Frame, theme: &Theme, snap: &Snapshot, area: Rect) {
    let title = if snap.part_count > 1 {
        format!(" Part {} of {} ", snap.current_part, snap.part_count)
    } else {
        " Put the steps in order ".to_string()
    };
    Paragraph::new(Line::from(Span::styled(
        title,
        Style::default()
            .fg(theme.title)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme.border)),
    )
    .render(area, frame.buffer_mut());

    let mut spans = vec![Span::styled(
        "Lives Left ",
        Style::default()
            .fg(theme.main_fg)
            .add_modifier(Modifier::BOLD),
    )];
    for i in 0..INITIAL_LIVES {
        let color = if i < snap.lives {
            theme.danger
        } else {
            theme.inactive_fg
        };
        spans.push(Span::styled("♥ ", Style::default().fg(color)));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Right)
        .render(
            Rect {
                height: 1,
                ..area
            },
            frame.buffer_mut(),
        );
}

/// Slot rects for one part, stacked and centred in `column`.
fn slot_layout(column: Rect, count: usize) -> Vec<Rect> {
    let count = count as u16;
    let total = count * SLOT_HEIGHT + count.saturating_sub(1) * ARROW_HEIGHT;
    let top = column.y + column.height.saturating_sub(total) / 2;
    (0..count)
        .map(|i| {
            Rect {
                x: column.x + 2,
                y: top + i * (SLOT_HEIGHT + ARROW_HEIGHT),
                width: column.width.saturating_sub(4),
                height: SLOT_HEIGHT,
            }
            .intersection(column)
        })
        .collect()
}

/// Tile rects in a two-column grid, nudged by each tile's tilt and margin.
fn tile_layout(area: Rect, tiles: &[Tile]) -> Vec<Rect> {
    let cell_w = area.width / TILE_COLUMNS;
    tiles
        .iter()
        .enumerate()
        .map(|(i, tile)| {
            let col = i as u16 % TILE_COLUMNS;
            let row = i as u16 / TILE_COLUMNS;
            let jitter = (tile.tilt / 5.0).round() as i32;
            let base_x = area.x + col * cell_w + TILT_ROOM;
            Rect {
                x: (base_x as i32 + jitter).max(area.x as i32) as u16,
                y: area.y + 1 + row * TILE_ROW_HEIGHT + tile.margin,
                width: cell_w.saturating_sub(2 * TILT_ROOM),
                height: TILE_HEIGHT,
            }
            .intersection(area)
        })
        .collect()
}

fn shake_offset(shake: ShakeSignal, now: Instant) -> i32 {
    let t = now.saturating_duration_since(shake.started).as_secs_f32();
    let decay = 1.0 - (t / SHAKE_DURATION.as_secs_f32()).min(1.0);
    ((t * 40.0).sin() * SHAKE_AMPLITUDE * decay).round() as i32
}

fn shift_x(rect: Rect, offset: i32, bounds: Rect) -> Rect {
    let max_x = bounds.right().saturating_sub(rect.width);
    let x = (rect.x as i32 + offset).clamp(bounds.x as i32, max_x.max(bounds.x) as i32);
    Rect { x: x as u16, ..rect }
}

fn draw_slot(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    number: usize,
    item: Option<Item>,
    selected: bool,
) {
    let border = if selected { theme.accent } else { theme.border };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if selected {
            BorderType::Thick
        } else {
            BorderType::Plain
        })
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {number} "),
            Style::default().fg(theme.title),
        ));
    let (text, style) = match item {
        Some(item) => (
            item,
            Style::default()
                .fg(theme.bg)
                .bg(theme.filled)
                .add_modifier(Modifier::BOLD),
        ),
        None => ("Drop here", Style::default().fg(theme.inactive_fg)),
    };
    Paragraph::new(Line::from(Span::styled(text, style)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block)
        .render(area, frame.buffer_mut());
}

/// Two down arrows in the gap under a slot.
fn draw_arrows(frame: &mut Frame, theme: &Theme, slot: Rect) {
    let y = slot.bottom();
    if slot.is_empty() || y >= frame.area().bottom() {
        return;
    }
    let style = Style::default().fg(theme.accent);
    let left = slot.x + slot.width / 10;
    let right = (slot.x + slot.width * 9 / 10).saturating_sub(1);
    frame.buffer_mut().set_string(left, y, "↓", style);
    frame.buffer_mut().set_string(right, y, "↓", style);
}

fn draw_tile(frame: &mut Frame, theme: &Theme, area: Rect, item: Item, locked: bool, selected: bool) {
    let (border, fg) = if locked {
        (theme.inactive_fg, theme.inactive_fg)
    } else if selected {
        (theme.accent, theme.main_fg)
    } else {
        (theme.tile, theme.main_fg)
    };
    Clear.render(area, frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled(item, Style::default().fg(fg))))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(theme.bg)),
        )
        .render(area, frame.buffer_mut());
}

/// Win or loss overlay. Returns the popup area.
fn draw_end(frame: &mut Frame, theme: &Theme, snap: &Snapshot, area: Rect, hits: &mut HitMap) -> Rect {
    let won = snap.won;
    debug_assert!(won != snap.lost, "end screen needs exactly one of won/lost");
    let color = if won { theme.filled } else { theme.danger };
    let popup = centered(area, 64, 12);
    Clear.render(popup, frame.buffer_mut());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme.bg));
    let inner = block.inner(popup);
    block.render(popup, frame.buffer_mut());

    let (title, message, button) = if won {
        (
            " ★ Congratulations! You Won! ★ ",
            "You have successfully completed the puzzle! Great job!",
            "Play Again",
        )
    } else {
        (
            " Game Over! Try Again. ",
            "You've run out of lives, but don't give up! Try again to succeed!",
            "Try Again",
        )
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default()
                .fg(theme.bg)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(theme.main_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(inner, frame.buffer_mut());

    let button_rect = Rect {
        x: inner.x + inner.width.saturating_sub(BUTTON_WIDTH) / 2,
        y: (inner.y + inner.height).saturating_sub(BUTTON_HEIGHT + 1),
        width: BUTTON_WIDTH.min(inner.width),
        height: BUTTON_HEIGHT,
    };
    draw_button(frame, theme, button_rect, button, color);
    hits.button = Some(button_rect);
    popup
}

/// Create the overlay fade on first use, then advance it by the time since the last frame.
fn apply_end_effect(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    end_effect: &mut Option<Effect>,
    end_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = end_effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *end_effect_time = Some(now);

    let effect = end_effect.get_or_insert_with(|| {
        fx::fade_from(theme.bg, theme.bg, (OVERLAY_FADE_MS, Interpolation::QuadOut)).with_area(area)
    });
    if !effect.done() {
        frame.render_effect(effect, area, TfxDuration::from_millis(delta_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout_stacks_with_gaps() {
        let rects = slot_layout(Rect::new(0, 0, 40, 40), 4);
        assert_eq!(rects.len(), 4);
        for pair in rects.windows(2) {
            assert_eq!(pair[1].y - pair[0].y, SLOT_HEIGHT + ARROW_HEIGHT);
        }
        assert!(rects.iter().all(|r| r.width == 36 && r.height == SLOT_HEIGHT));
    }

    #[test]
    fn test_slot_layout_clipped_to_column() {
        let column = Rect::new(0, 0, 40, 10);
        for r in slot_layout(column, 4) {
            assert!(r.is_empty() || r.bottom() <= column.bottom());
        }
    }

    #[test]
    fn test_tile_layout_stays_in_area() {
        let area = Rect::new(40, 3, 40, 20);
        let tiles = [
            Tile { item: "A", tilt: -14.9, margin: 2 },
            Tile { item: "B", tilt: 14.9, margin: 0 },
            Tile { item: "C", tilt: 0.0, margin: 1 },
        ];
        let rects = tile_layout(area, &tiles);
        assert_eq!(rects.len(), 3);
        for r in &rects {
            assert!(r.x >= area.x && r.right() <= area.right());
        }
        assert!(rects[2].y > rects[0].y);
    }

    #[test]
    fn test_shake_settles() {
        let t0 = Instant::now();
        let shake = ShakeSignal { slot: 0, started: t0 };
        assert_eq!(shake_offset(shake, t0 + SHAKE_DURATION), 0);
        let peak = (0..50)
            .map(|ms| shake_offset(shake, t0 + std::time::Duration::from_millis(ms)).abs())
            .max();
        assert!(peak.is_some_and(|p| p > 0 && p <= SHAKE_AMPLITUDE as i32));
    }

    #[test]
    fn test_shift_x_clamps() {
        let bounds = Rect::new(0, 0, 20, 10);
        let r = Rect::new(2, 0, 16, 4);
        assert_eq!(shift_x(r, -5, bounds).x, 0);
        assert_eq!(shift_x(r, 5, bounds).x, 4);
        assert_eq!(shift_x(r, 1, bounds).x, 3);
    }
}
