//! Cells and lines: the storage unit of the screen.
//!
//! A cell holds one grapheme cluster and its style. A wide (2-column) glyph
//! occupies its leading cell plus a continuation placeholder immediately to
//! the right; the placeholder carries no glyph of its own.

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::style::Style;

bitflags! {
    /// Cell-level flags that are orthogonal to style.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CellFlags: u8 {
        /// Leading (left) cell of a wide character.
        const WIDE_CHAR = 1 << 0;
        /// Trailing placeholder of a wide character.
        const WIDE_CONTINUATION = 1 << 1;
    }
}

/// A single cell of a line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Grapheme cluster. A space for blank cells, empty for placeholders.
    content: String,
    /// Display width in columns: 1, 2 for wide leads, 0 for placeholders.
    width: u8,
    pub flags: CellFlags,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self::blank()
    }
}

impl Cell {
    /// A blank space with default style.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            content: " ".to_owned(),
            width: 1,
            flags: CellFlags::empty(),
            style: Style::default(),
        }
    }

    /// Single-width cell.
    #[must_use]
    pub fn narrow(grapheme: &str, style: Style) -> Self {
        Self {
            content: grapheme.to_owned(),
            width: 1,
            flags: CellFlags::empty(),
            style,
        }
    }

    /// Create a wide (2-column) glyph.
    ///
    /// Returns `(leading, continuation)`.
    #[must_use]
    pub fn wide(grapheme: &str, style: Style) -> (Self, Self) {
        let leading = Self {
            content: grapheme.to_owned(),
            width: 2,
            flags: CellFlags::WIDE_CHAR,
            style,
        };
        let continuation = Self {
            content: String::new(),
            width: 0,
            flags: CellFlags::WIDE_CONTINUATION,
            style,
        };
        (leading, continuation)
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    #[must_use]
    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CHAR)
    }

    #[must_use]
    pub fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content == " " && self.flags.is_empty() && self.style.is_default()
    }

    /// Append a zero-width cluster (combining mark, variation selector).
    pub fn push_zero_width(&mut self, grapheme: &str) {
        self.content.push_str(grapheme);
    }

    /// Reset to a blank space with default style.
    pub fn clear(&mut self) {
        *self = Self::blank();
    }
}

/// Display width of a grapheme cluster: 0, 1 or 2 columns.
///
/// Control clusters and lone zero-width marks measure 0. Everything that
/// renders is clamped to 1..=2.
#[must_use]
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    match (chars.next(), chars.next()) {
        (None, _) => 0,
        (Some(c), None) if c.is_ascii() => usize::from(!c.is_ascii_control()),
        (Some(c), _) if c.is_control() => 0,
        _ => {
            let width = UnicodeWidthStr::width(grapheme);
            if width == 0 && is_zero_width(grapheme) {
                0
            } else {
                width.clamp(1, 2)
            }
        }
    }
}

/// Whether every code point of the cluster is zero-width (combining, joiner,
/// selector) so that it should attach to the preceding glyph.
#[must_use]
pub fn is_zero_width(grapheme: &str) -> bool {
    grapheme.chars().all(|c| {
        matches!(
            c,
            '\u{0300}'..='\u{036F}'
                | '\u{1AB0}'..='\u{1AFF}'
                | '\u{1DC0}'..='\u{1DFF}'
                | '\u{20D0}'..='\u{20FF}'
                | '\u{FE20}'..='\u{FE2F}'
                | '\u{200B}'..='\u{200F}'
                | '\u{FE00}'..='\u{FE0F}'
                | '\u{E0100}'..='\u{E01EF}'
        ) || unicode_width::UnicodeWidthChar::width(c) == Some(0)
    })
}

/// Iterate grapheme clusters with their display width.
pub fn graphemes_with_width(text: &str) -> impl Iterator<Item = (&str, usize)> {
    text.graphemes(true).map(|g| (g, grapheme_width(g)))
}

/// One line of the screen. Cells past `len()` are implicitly blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    cells: Vec<Cell>,
}

impl Line {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub(crate) fn cell_mut(&mut self, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(col)
    }

    /// Materialize blank cells up to and including `col`.
    pub(crate) fn extend_to(&mut self, col: usize) {
        if self.cells.len() <= col {
            self.cells.resize_with(col + 1, Cell::blank);
        }
    }

    /// Store `cell` at `col`, filling any gap with blanks.
    pub(crate) fn put(&mut self, col: usize, cell: Cell) {
        self.extend_to(col);
        self.cells[col] = cell;
    }

    /// Blank the cell at `col`, if materialized.
    pub(crate) fn blank(&mut self, col: usize) {
        if let Some(cell) = self.cells.get_mut(col) {
            cell.clear();
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.clear();
    }

    /// Visible text: glyphs in order, placeholders skipped, trailing blanks trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for cell in &self.cells {
            if !cell.is_wide_continuation() {
                out.push_str(cell.content());
            }
        }
        out.truncate(out.trim_end_matches(' ').len());
        out
    }

    /// Columns occupied by materialized non-blank cells, placeholders included.
    #[must_use]
    pub fn occupied_columns(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_blank()).count()
    }

    /// Check the placeholder invariant: every continuation directly follows a
    /// wide lead and every wide lead is followed by its continuation.
    #[must_use]
    pub fn wide_pairs_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(i, cell)| {
            if cell.is_wide_continuation() {
                i > 0 && self.cells[i - 1].is_wide()
            } else if cell.is_wide() {
                self.cells
                    .get(i + 1)
                    .is_some_and(Cell::is_wide_continuation)
            } else {
                true
            }
        })
    }
}
