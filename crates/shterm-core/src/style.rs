//! Style resolver: SGR parameters to a cumulative [`Style`].
//!
//! Colors are either one of the 16 semantic palette entries (plus the
//! terminal default) or an absolute RGB value. 256-color indices resolve
//! through constant formulas: 0–15 map onto the semantic palette, 16–231 onto
//! the 6×6×6 cube and 232–255 onto the grayscale ramp.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// SGR text attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StyleFlags: u16 {
        const BOLD             = 1 << 0;
        const DIM              = 1 << 1;
        const ITALIC           = 1 << 2;
        const UNDERLINE        = 1 << 3;
        const DOUBLE_UNDERLINE = 1 << 4;
        const OVERLINE         = 1 << 5;
        const BLINK            = 1 << 6;
        const INVERSE          = 1 << 7;
        const HIDDEN           = 1 << 8;
        const STRIKETHROUGH    = 1 << 9;
    }
}

/// Semantic palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    /// Host default foreground/background.
    Default,
}

impl NamedColor {
    /// Palette entries in ANSI index order (0–15).
    pub const PALETTE: [NamedColor; 16] = [
        Self::Black,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
        Self::White,
        Self::Gray,
        Self::BrightRed,
        Self::BrightGreen,
        Self::BrightYellow,
        Self::BrightBlue,
        Self::BrightMagenta,
        Self::BrightCyan,
        Self::BrightWhite,
    ];

    /// Palette entry for an ANSI index, `None` above 15.
    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::PALETTE.get(usize::from(index)).copied()
    }

    /// Semantic tag, e.g. `_red` or `_brightBlue`.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Black => "_black",
            Self::Red => "_red",
            Self::Green => "_green",
            Self::Yellow => "_yellow",
            Self::Blue => "_blue",
            Self::Magenta => "_magenta",
            Self::Cyan => "_cyan",
            Self::White => "_white",
            Self::Gray => "_gray",
            Self::BrightRed => "_brightRed",
            Self::BrightGreen => "_brightGreen",
            Self::BrightYellow => "_brightYellow",
            Self::BrightBlue => "_brightBlue",
            Self::BrightMagenta => "_brightMagenta",
            Self::BrightCyan => "_brightCyan",
            Self::BrightWhite => "_brightWhite",
            Self::Default => "_default",
        }
    }
}

/// A resolved color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl Color {
    pub const DEFAULT: Color = Color::Named(NamedColor::Default);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(named) => f.write_str(named.tag()),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Running text style.
///
/// `None` colors mean "never set since the last full reset"; hosts render
/// them like [`NamedColor::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub flags: StyleFlags,
}

impl Style {
    /// Style with the given foreground and nothing else.
    #[must_use]
    pub fn with_fg(fg: Color) -> Self {
        Self {
            fg: Some(fg),
            ..Self::default()
        }
    }

    /// Foreground as rendered (`_default` when unset).
    #[must_use]
    pub fn resolved_fg(&self) -> Color {
        self.fg.unwrap_or(Color::DEFAULT)
    }

    /// Background as rendered (`_default` when unset).
    #[must_use]
    pub fn resolved_bg(&self) -> Color {
        self.bg.unwrap_or(Color::DEFAULT)
    }

    /// Reset every field (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolve a 256-color palette index.
///
/// ```
/// use shterm_core::{color_256, Color, NamedColor};
///
/// assert_eq!(color_256(1), Color::Named(NamedColor::Red));
/// assert_eq!(color_256(208).to_string(), "#ff6600");
/// assert_eq!(color_256(232).to_string(), "#090909");
/// ```
#[must_use]
pub fn color_256(index: u8) -> Color {
    if let Some(named) = NamedColor::from_index(index) {
        return Color::Named(named);
    }
    if index < 232 {
        let v = index - 16;
        let level = |c: u8| c * 51;
        Color::Rgb(level(v / 36), level((v / 6) % 6), level(v % 6))
    } else {
        let x = u16::from(index - 232) * 10 + 8;
        // round(x * 255 / 238) in integer arithmetic
        let level = ((x * 255 + 119) / 238) as u8;
        Color::Rgb(level, level, level)
    }
}

fn named(index: u16) -> Color {
    // Callers pass 0..=15 only.
    Color::Named(NamedColor::PALETTE[usize::from(index) & 0x0f])
}

fn saturate_u8(value: u16) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// Parse an extended color (`5;n` or `2;r;g;b`) following a 38/48 code.
///
/// Returns the color (if well formed) and how many parameters it consumed.
fn extended_color(rest: &[u16]) -> (Option<Color>, usize) {
    match rest.first() {
        Some(5) => match rest.get(1) {
            Some(&n) => (Some(color_256(saturate_u8(n))), 2),
            None => (None, 1),
        },
        Some(2) => {
            let component = |i: usize| saturate_u8(rest.get(i).copied().unwrap_or(0));
            let consumed = rest.len().min(4);
            (
                Some(Color::Rgb(component(1), component(2), component(3))),
                consumed,
            )
        }
        _ => (None, 0),
    }
}

/// Apply SGR parameters to `style`. An empty list means full reset.
pub fn apply_sgr(style: &mut Style, params: &[u16]) {
    if params.is_empty() {
        style.reset();
        return;
    }
    let mut i = 0;
    while i < params.len() {
        let p = params[i];
        i += 1;
        match p {
            0 => style.reset(),
            1 => style.flags.insert(StyleFlags::BOLD),
            2 => style.flags.insert(StyleFlags::DIM),
            3 => style.flags.insert(StyleFlags::ITALIC),
            4 => style.flags.insert(StyleFlags::UNDERLINE),
            5 => style.flags.insert(StyleFlags::BLINK),
            7 => style.flags.insert(StyleFlags::INVERSE),
            8 => style.flags.insert(StyleFlags::HIDDEN),
            9 => style.flags.insert(StyleFlags::STRIKETHROUGH),
            21 => style.flags.insert(StyleFlags::DOUBLE_UNDERLINE),
            22 => style.flags.remove(StyleFlags::BOLD | StyleFlags::DIM),
            23 => style.flags.remove(StyleFlags::ITALIC),
            24 => style
                .flags
                .remove(StyleFlags::UNDERLINE | StyleFlags::DOUBLE_UNDERLINE),
            25 => style.flags.remove(StyleFlags::BLINK),
            27 => style.flags.remove(StyleFlags::INVERSE),
            28 => style.flags.remove(StyleFlags::HIDDEN),
            29 => style.flags.remove(StyleFlags::STRIKETHROUGH),
            53 => style.flags.insert(StyleFlags::OVERLINE),
            55 => style.flags.remove(StyleFlags::OVERLINE),
            30..=37 => style.fg = Some(named(p - 30)),
            90..=97 => style.fg = Some(named(p - 90 + 8)),
            40..=47 => style.bg = Some(named(p - 40)),
            100..=107 => style.bg = Some(named(p - 100 + 8)),
            39 => style.fg = Some(Color::DEFAULT),
            49 => style.bg = Some(Color::DEFAULT),
            38 | 48 => {
                let (color, consumed) = extended_color(&params[i..]);
                i += consumed;
                if let Some(color) = color {
                    if p == 38 {
                        style.fg = Some(color);
                    } else {
                        style.bg = Some(color);
                    }
                }
            }
            _ => {}
        }
    }
}
