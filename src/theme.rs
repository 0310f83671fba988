//! Theme loading: btop-style `theme[key]="value"` mapped onto slot, tile and overlay colours.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours used by the puzzle screens.
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    /// Slot borders and dividers.
    pub border: Color,
    pub main_fg: Color,
    pub title: Color,
    /// "Drop here" hints, dimmed tiles while input is locked.
    pub inactive_fg: Color,
    /// Filled slot.
    pub filled: Color,
    /// Tile border.
    pub tile: Color,
    /// Hearts and the loss overlay.
    pub danger: Color,
    /// Arrows between slots, keyboard cursor.
    pub accent: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark()
    }
}

/// (btop keys tried in order, One Dark fallback) for each colour role.
const BG: (&[&str], Color) = (&["meter_bg"], Color::Rgb(0x31, 0x35, 0x3F));
const BORDER: (&[&str], Color) = (&["div_line"], Color::Rgb(0x3F, 0x44, 0x4F));
const MAIN_FG: (&[&str], Color) = (&["main_fg"], Color::Rgb(0xAB, 0xB2, 0xBF));
const TITLE: (&[&str], Color) = (&["title"], Color::Rgb(0xE5, 0xC0, 0x7B));
const INACTIVE: (&[&str], Color) = (&["inactive_fg"], Color::Rgb(0x5C, 0x63, 0x70));
const FILLED: (&[&str], Color) = (&["mem_box", "cpu_start"], Color::Rgb(0x98, 0xC3, 0x79));
const TILE: (&[&str], Color) = (&["hi_fg", "proc_misc"], Color::Rgb(0x56, 0xB6, 0xC2));
const DANGER: (&[&str], Color) = (&["cpu_end", "temp_end"], Color::Rgb(0xE0, 0x6C, 0x75));
const ACCENT: (&[&str], Color) = (&["cpu_box"], Color::Rgb(0x61, 0xAF, 0xEF));

impl Theme {
    /// One Dark, as in onedark.theme.
    pub fn onedark() -> Self {
        Self::from_map(&HashMap::new())
    }

    /// Load from a theme file; no path or a missing file gives One Dark. `palette` is applied last.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let map = parse_theme_file(&std::fs::read_to_string(p)?)?;
                Self::from_map(&map)
            }
            _ => Self::onedark(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Swap the accent roles for high-contrast or colorblind-safe colours.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.filled = Color::Rgb(0x00, 0xFF, 0x00);
                self.tile = Color::Rgb(0xFF, 0xFF, 0xFF);
                self.danger = Color::Rgb(0xFF, 0x00, 0x00);
                self.accent = Color::Rgb(0x00, 0x88, 0xFF);
                self.main_fg = Color::Rgb(0xFF, 0xFF, 0xFF);
            }
            crate::Palette::Colorblind => {
                // Blue/orange axis instead of red/green.
                self.filled = Color::Rgb(0x00, 0x77, 0xBB);
                self.tile = Color::Rgb(0xBB, 0xBB, 0x00);
                self.danger = Color::Rgb(0xEE, 0x77, 0x33);
                self.accent = Color::Rgb(0x00, 0x99, 0x88);
            }
        }
    }

    fn from_map(map: &HashMap<String, Color>) -> Self {
        let pick = |(keys, fallback): (&[&str], Color)| {
            keys.iter()
                .find_map(|k| map.get(*k).copied())
                .unwrap_or(fallback)
        };
        Self {
            bg: pick(BG),
            border: pick(BORDER),
            main_fg: pick(MAIN_FG),
            title: pick(TITLE),
            inactive_fg: pick(INACTIVE),
            filled: pick(FILLED),
            tile: pick(TILE),
            danger: pick(DANGER),
            accent: pick(ACCENT),
        }
    }
}

/// Parse `theme[key]="#hex"` lines. Comments, blanks and non-hex values (btop also stores
/// numbers and names) are skipped; a value that looks like hex but is malformed is an error.
fn parse_theme_file(s: &str) -> Result<HashMap<String, Color>, ThemeError> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line
            .strip_prefix("theme[")
            .and_then(|rest| rest.split_once(']'))
            .and_then(|(key, rest)| Some((key.trim(), rest.trim().strip_prefix('=')?)))
        else {
            continue;
        };
        let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        if value.starts_with('#') {
            map.insert(key.to_string(), parse_hex(value)?);
        }
    }
    Ok(map)
}

/// Parse "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let digits = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |i: usize, width: usize| {
        digits
            .get(i * width..(i + 1) * width)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map(|v| if width == 1 { v * 17 } else { v })
    };
    let width = match digits.len() {
        6 => 2,
        3 => 1,
        _ => return Err(bad()),
    };
    match (channel(0, width), channel(1, width), channel(2, width)) {
        (Some(r), Some(g), Some(b)) => Ok(Color::Rgb(r, g, b)),
        _ => Err(bad()),
    }
}
