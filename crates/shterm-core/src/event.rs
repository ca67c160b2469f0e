//! Structured terminal events produced by the interpreter.

use crate::scanner::SequenceFamily;
use crate::style::Style;

/// One axis of a cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Coord {
    /// Absolute, 0-based viewport coordinate.
    Abs(u16),
    /// Delta from the current position.
    Rel(i32),
}

/// Edit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditKind {
    /// Line feed: next logical row, column unchanged.
    Newline,
    /// Blank from the cursor to the end of the line (`CSI K`).
    EraseLineRight,
    /// Blank from the line start through the cursor (`CSI 1 K`).
    EraseLineLeft,
    /// Empty the cursor's line (`CSI 2 K`).
    EraseLineAll,
    /// Remove every line below the cursor's line.
    EraseLineBelowAll,
    /// Empty every viewport line (`CSI 2 J`).
    EraseAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModeAction {
    Set,
    Reset,
}

/// Interpreter output, consumed by [`Screen::write`](crate::Screen::write).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminalEvent {
    /// Styled run of grapheme clusters.
    Text { text: String, style: Style },
    /// Cursor move; a `None` axis stays where it is.
    Cursor {
        row: Option<Coord>,
        col: Option<Coord>,
    },
    Edit(EditKind),
    /// Mode change. DEC-private ids carry a leading `?`.
    Mode { action: ModeAction, id: String },
    CursorSave,
    CursorRestore,
    /// Understood syntactically but left to the host (device attributes).
    Raw {
        family: SequenceFamily,
        introducer: String,
        terminator: String,
        params: Vec<String>,
    },
    /// Anything else, verbatim.
    Other { content: String },
}

impl TerminalEvent {
    #[must_use]
    pub fn cursor_row(row: Coord) -> Self {
        Self::Cursor {
            row: Some(row),
            col: None,
        }
    }

    #[must_use]
    pub fn cursor_col(col: Coord) -> Self {
        Self::Cursor {
            row: None,
            col: Some(col),
        }
    }

    #[must_use]
    pub fn other(content: impl Into<String>) -> Self {
        Self::Other {
            content: content.into(),
        }
    }

    /// Whether the screen ignores this event (hosts may still react).
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Raw { .. } | Self::Other { .. })
    }
}
