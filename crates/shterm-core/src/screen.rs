//! Screen state machine.
//!
//! A [`Screen`] owns a growing sequence of [`Line`]s, a viewport of
//! `rows × cols` anchored at logical line `top`, the cursor (viewport
//! relative), a saved-cursor stack, the active mode ids and, while a program
//! uses it, a nested alternate screen.
//!
//! Scrolling never shifts lines physically: a line feed at the bottom row
//! appends a line and moves the viewport anchor down, so scrollback grows
//! until an optional limit evicts the oldest lines.

use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::cell::{Cell, Line, grapheme_width, graphemes_with_width, is_zero_width};
use crate::config::TerminalConfig;
use crate::event::{Coord, EditKind, ModeAction, TerminalEvent};
use crate::sink::{OutputSink, ScreenChange};
use crate::style::Style;

/// Mode ids that switch to the alternate screen.
pub const ALT_SCREEN_MODES: [&str; 3] = ["?47", "?1047", "?1049"];

/// Whether `id` is one of the alternate-screen modes.
#[must_use]
pub fn is_alt_screen_mode(id: &str) -> bool {
    ALT_SCREEN_MODES.contains(&id)
}

/// Cursor position in viewport coordinates (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cursor {
    pub row: u16,
    pub col: u16,
}

impl Cursor {
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

/// Where the most recent text run ended, with the line as it was just
/// before its final glyph was stored. A following run whose first cluster
/// continues that glyph (skin tone, VS16, ZWJ, second flag half) rewinds to
/// this point and prints the joined cluster instead.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LastGlyph {
    index: usize,
    row: u16,
    col: u16,
    style: Style,
    line: Line,
}

/// Which buffer receives writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenMode {
    Primary,
    Alt(Box<Screen>),
}

/// Terminal screen: lines, cursor, modes and alternate buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    rows: u16,
    cols: u16,
    lines: Vec<Line>,
    /// Logical index of the first viewport row.
    top: usize,
    cursor: Cursor,
    /// Set after writing the last column; the next glyph wraps first.
    pending_wrap: bool,
    saved: Vec<Cursor>,
    modes: BTreeSet<String>,
    mode: ScreenMode,
    /// This screen is itself an alternate buffer.
    is_alt: bool,
    scrollback_limit: Option<usize>,
    last_glyph: Option<LastGlyph>,
}

impl Screen {
    /// Create a primary screen with unlimited scrollback.
    ///
    /// Dimensions are clamped to at least 1×1.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        Self::build(rows, cols, None, false)
    }

    /// Create a primary screen from a config.
    #[must_use]
    pub fn from_config(config: &TerminalConfig) -> Self {
        Self::build(config.rows, config.cols, config.scrollback_limit, false)
    }

    fn alternate(rows: u16, cols: u16) -> Self {
        // The alternate buffer keeps no scrollback.
        Self::build(rows, cols, Some(0), true)
    }

    fn build(rows: u16, cols: u16, scrollback_limit: Option<usize>, is_alt: bool) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            lines: vec![Line::new()],
            top: 0,
            cursor: Cursor::default(),
            pending_wrap: false,
            saved: Vec::new(),
            modes: BTreeSet::new(),
            mode: ScreenMode::Primary,
            is_alt,
            scrollback_limit,
            last_glyph: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn rows(&self) -> u16 {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> u16 {
        self.cols
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn pending_wrap(&self) -> bool {
        self.pending_wrap
    }

    /// Total number of lines, scrollback included.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Logical index of the first viewport row.
    #[must_use]
    pub fn viewport_top(&self) -> usize {
        self.top
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Line by logical index.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Line shown at viewport `row`, if materialized.
    #[must_use]
    pub fn viewport_line(&self, row: u16) -> Option<&Line> {
        if row >= self.rows {
            return None;
        }
        self.lines.get(self.top + usize::from(row))
    }

    /// Cell at a viewport coordinate, if materialized.
    #[must_use]
    pub fn cell(&self, row: u16, col: u16) -> Option<&Cell> {
        self.viewport_line(row)?.cell(usize::from(col))
    }

    /// Visible text of each viewport row.
    #[must_use]
    pub fn viewport_lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| self.viewport_line(row).map(Line::text).unwrap_or_default())
            .collect()
    }

    /// Viewport rows joined with `\n`, trailing empty rows dropped.
    #[must_use]
    pub fn viewport_text(&self) -> String {
        let mut rows = self.viewport_lines();
        while rows.last().is_some_and(String::is_empty) {
            rows.pop();
        }
        rows.join("\n")
    }

    /// Whether an alternate screen is currently receiving writes.
    #[must_use]
    pub fn is_alt_active(&self) -> bool {
        matches!(self.mode, ScreenMode::Alt(_))
    }

    /// Whether this screen is itself an alternate buffer.
    #[must_use]
    pub fn is_alt_screen(&self) -> bool {
        self.is_alt
    }

    /// The active alternate screen, if any.
    #[must_use]
    pub fn alt(&self) -> Option<&Screen> {
        match &self.mode {
            ScreenMode::Primary => None,
            ScreenMode::Alt(alt) => Some(&**alt),
        }
    }

    /// The screen currently receiving writes (this one or its alt buffer).
    #[must_use]
    pub fn active(&self) -> &Screen {
        self.alt().unwrap_or(self)
    }

    #[must_use]
    pub fn mode(&self) -> &ScreenMode {
        &self.mode
    }

    /// Active mode ids, sorted.
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_mode_set(&self, id: &str) -> bool {
        self.modes.contains(id)
    }

    /// Depth of the saved-cursor stack.
    #[must_use]
    pub fn saved_cursor_depth(&self) -> usize {
        self.saved.len()
    }

    // ── Event application ───────────────────────────────────────────

    /// Apply events left to right.
    ///
    /// While an alternate screen is active the remaining events go to it; an
    /// alternate-screen mode set routes the rest of this batch there too.
    pub fn write<S: OutputSink + ?Sized>(&mut self, events: &[TerminalEvent], sink: &mut S) {
        let _ = self.write_batch(events, sink);
    }

    /// Returns `Some(consumed)` when this alternate screen saw the mode reset
    /// that ends it, after consuming that many events.
    fn write_batch<S: OutputSink + ?Sized>(
        &mut self,
        events: &[TerminalEvent],
        sink: &mut S,
    ) -> Option<usize> {
        let mut i = 0;
        while i < events.len() {
            if let ScreenMode::Alt(alt) = &mut self.mode {
                let consumed = alt.write_batch(&events[i..], sink)?;
                i += consumed;
                self.mode = ScreenMode::Primary;
                crate::debug!("alternate screen discarded");
                sink.notify(ScreenChange::AltScreen { active: false });
                continue;
            }

            let event = &events[i];
            i += 1;
            if let TerminalEvent::Mode { action, id } = event
                && is_alt_screen_mode(id)
            {
                match action {
                    ModeAction::Set if !self.is_alt => {
                        self.last_glyph = None;
                        crate::debug!(mode = %id, rows = self.rows, cols = self.cols, "alternate screen activated");
                        self.mode = ScreenMode::Alt(Box::new(Screen::alternate(self.rows, self.cols)));
                        sink.notify(ScreenChange::AltScreen { active: true });
                    }
                    ModeAction::Reset if self.is_alt => return Some(i),
                    _ => {}
                }
                continue;
            }
            self.apply(event, sink);
        }
        None
    }

    fn apply<S: OutputSink + ?Sized>(&mut self, event: &TerminalEvent, sink: &mut S) {
        if !matches!(
            event,
            TerminalEvent::Text { .. } | TerminalEvent::Raw { .. } | TerminalEvent::Other { .. }
        ) {
            self.last_glyph = None;
        }
        match event {
            TerminalEvent::Text { text, style } => self.print_text(text, *style, sink),
            TerminalEvent::Cursor { row, col } => self.move_cursor(*row, *col),
            TerminalEvent::Edit(kind) => self.edit(*kind, sink),
            TerminalEvent::Mode { action, id } => match action {
                ModeAction::Set => {
                    self.modes.insert(id.clone());
                }
                ModeAction::Reset => {
                    self.modes.remove(id);
                }
            },
            TerminalEvent::CursorSave => self.saved.push(self.cursor),
            TerminalEvent::CursorRestore => {
                if let Some(saved) = self.saved.pop() {
                    self.cursor = Cursor {
                        row: saved.row.min(self.rows - 1),
                        col: saved.col.min(self.cols - 1),
                    };
                    self.pending_wrap = false;
                }
            }
            TerminalEvent::Raw { .. } | TerminalEvent::Other { .. } => {}
        }
    }

    // ── Printing ────────────────────────────────────────────────────

    fn print_text<S: OutputSink + ?Sized>(&mut self, text: &str, style: Style, sink: &mut S) {
        let Some((joined, head_len)) = self.join_with_last_glyph(text) else {
            self.print_clusters(text, style, sink);
            return;
        };
        let Some(last) = self.last_glyph.take() else {
            self.print_clusters(text, style, sink);
            return;
        };
        // Rewind to just before the previous glyph was stored.
        if let Some(line) = self.lines.get_mut(last.index) {
            *line = last.line;
        }
        self.cursor = Cursor::new(last.row, last.col);
        self.pending_wrap = false;

        let (head, tail) = joined.split_at(head_len);
        let width = grapheme_width(head).max(1);
        self.print(head, width, last.style, tail.is_empty(), sink);
        self.print_clusters(tail, style, sink);
    }

    /// `prev + text` and the byte length of its first cluster, when that
    /// cluster reaches into `text`.
    fn join_with_last_glyph(&self, text: &str) -> Option<(String, usize)> {
        let last = self.last_glyph.as_ref()?;
        let prev = self.lines.get(last.index)?.cell(usize::from(last.col))?.content();
        let joined = format!("{prev}{text}");
        let head_len = joined.graphemes(true).next().map_or(0, str::len);
        (head_len > prev.len()).then_some((joined, head_len))
    }

    fn print_clusters<S: OutputSink + ?Sized>(&mut self, text: &str, style: Style, sink: &mut S) {
        let mut clusters = graphemes_with_width(text).peekable();
        while let Some((grapheme, width)) = clusters.next() {
            let last = clusters.peek().is_none();
            self.print(grapheme, width, style, last, sink);
        }
    }

    /// Store one cluster at the cursor. With `remember`, the placement is
    /// kept so the next run can extend this glyph.
    fn print<S: OutputSink + ?Sized>(
        &mut self,
        grapheme: &str,
        width: usize,
        style: Style,
        remember: bool,
        sink: &mut S,
    ) {
        self.last_glyph = None;
        if width == 0 {
            if is_zero_width(grapheme) && !grapheme.chars().any(char::is_control) {
                self.attach_zero_width(grapheme, sink);
            }
            return;
        }
        let cols = usize::from(self.cols);
        // A single-column screen shows wide glyphs in one column.
        let width = width.min(cols);
        if self.pending_wrap {
            self.wrap(sink);
        }
        if width == 2 && usize::from(self.cursor.col) + 1 >= cols {
            self.wrap(sink);
        }

        let row = self.cursor.row;
        let col = usize::from(self.cursor.col);
        let index = self.cursor_index();
        self.ensure_line(index, sink);
        if remember && let Some(line) = self.lines.get(index) {
            self.last_glyph = Some(LastGlyph {
                index,
                row,
                col: col as u16,
                style,
                line: line.clone(),
            });
        }

        self.split_wide_at(index, col, sink);
        if width == 2 {
            self.split_wide_at(index, col + 1, sink);
        }

        if width == 2 {
            let (lead, cont) = Cell::wide(grapheme, style);
            self.store(index, row, col, lead, sink);
            self.store(index, row, col + 1, cont, sink);
        } else {
            self.store(index, row, col, Cell::narrow(grapheme, style), sink);
        }

        let next = col + width;
        if next >= cols {
            self.cursor.col = self.cols - 1;
            self.pending_wrap = true;
        } else {
            self.cursor.col = next as u16;
        }
    }

    /// Before overwriting `col`, blank the other half of any wide glyph that
    /// covers it.
    fn split_wide_at<S: OutputSink + ?Sized>(&mut self, index: usize, col: usize, sink: &mut S) {
        let row = self.cursor.row;
        let Some(cell) = self.lines.get(index).and_then(|line| line.cell(col)) else {
            return;
        };
        let partner = if cell.is_wide_continuation() && col > 0 {
            col - 1
        } else if cell.is_wide() {
            col + 1
        } else {
            return;
        };
        if let Some(line) = self.lines.get_mut(index)
            && line.cell(partner).is_some()
        {
            line.blank(partner);
            sink.notify(ScreenChange::CellWritten {
                row,
                col: partner as u16,
                cell: Cell::blank(),
            });
        }
    }

    fn store<S: OutputSink + ?Sized>(
        &mut self,
        index: usize,
        row: u16,
        col: usize,
        cell: Cell,
        sink: &mut S,
    ) {
        if let Some(line) = self.lines.get_mut(index) {
            line.put(col, cell.clone());
            sink.notify(ScreenChange::CellWritten {
                row,
                col: col as u16,
                cell,
            });
        }
    }

    /// Attach a combining mark or selector to the glyph left of the cursor.
    fn attach_zero_width<S: OutputSink + ?Sized>(&mut self, grapheme: &str, sink: &mut S) {
        let mut col = usize::from(self.cursor.col);
        if !self.pending_wrap {
            if col == 0 {
                return;
            }
            col -= 1;
        }
        let row = self.cursor.row;
        let index = self.cursor_index();
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        if col > 0 && line.cell(col).is_some_and(Cell::is_wide_continuation) {
            col -= 1;
        }
        if let Some(cell) = line.cell_mut(col) {
            cell.push_zero_width(grapheme);
            sink.notify(ScreenChange::CellWritten {
                row,
                col: col as u16,
                cell: cell.clone(),
            });
        }
    }

    // ── Cursor and line feed ────────────────────────────────────────

    fn cursor_index(&self) -> usize {
        self.top + usize::from(self.cursor.row)
    }

    fn move_cursor(&mut self, row: Option<Coord>, col: Option<Coord>) {
        fn resolve(coord: Coord, current: u16, limit: u16) -> u16 {
            let target = match coord {
                Coord::Abs(v) => i64::from(v),
                Coord::Rel(delta) => i64::from(current) + i64::from(delta),
            };
            target.clamp(0, i64::from(limit) - 1) as u16
        }
        if let Some(row) = row {
            self.cursor.row = resolve(row, self.cursor.row, self.rows);
        }
        if let Some(col) = col {
            self.cursor.col = resolve(col, self.cursor.col, self.cols);
        }
        self.pending_wrap = false;
    }

    /// Automatic newline on overflow: column back to 0.
    fn wrap<S: OutputSink + ?Sized>(&mut self, sink: &mut S) {
        self.pending_wrap = false;
        self.cursor.col = 0;
        self.line_feed(sink);
    }

    fn line_feed<S: OutputSink + ?Sized>(&mut self, sink: &mut S) {
        if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        } else {
            self.top += 1;
            sink.notify(ScreenChange::ViewportScrolled { top: self.top });
        }
        let index = self.cursor_index();
        self.ensure_line(index, sink);
        self.evict_scrollback(sink);
    }

    fn ensure_line<S: OutputSink + ?Sized>(&mut self, index: usize, sink: &mut S) {
        while self.lines.len() <= index {
            self.lines.push(Line::new());
            sink.notify(ScreenChange::LineAppended {
                index: self.lines.len() - 1,
            });
        }
    }

    fn evict_scrollback<S: OutputSink + ?Sized>(&mut self, sink: &mut S) {
        let Some(limit) = self.scrollback_limit else {
            return;
        };
        if self.top <= limit {
            return;
        }
        let count = (self.top - limit).min(self.lines.len());
        self.lines.drain(..count);
        self.top -= count;
        crate::trace!(count, "scrollback lines evicted");
        sink.notify(ScreenChange::LinesEvicted { count });
    }

    // ── Erase ───────────────────────────────────────────────────────

    fn edit<S: OutputSink + ?Sized>(&mut self, kind: EditKind, sink: &mut S) {
        let row = self.cursor.row;
        let index = self.cursor_index();
        let col = usize::from(self.cursor.col);
        match kind {
            EditKind::Newline => {
                self.pending_wrap = false;
                self.line_feed(sink);
            }
            EditKind::EraseLineRight => {
                let Some(line) = self.lines.get_mut(index) else {
                    return;
                };
                if col >= line.len() {
                    return;
                }
                if col > 0 && line.cell(col).is_some_and(Cell::is_wide_continuation) {
                    line.blank(col - 1);
                    sink.notify(ScreenChange::CellWritten {
                        row,
                        col: (col - 1) as u16,
                        cell: Cell::blank(),
                    });
                }
                for c in col..line.len() {
                    line.blank(c);
                }
                sink.notify(ScreenChange::LineCleared {
                    row,
                    start: col as u16,
                    end: None,
                });
            }
            EditKind::EraseLineLeft => {
                let Some(line) = self.lines.get_mut(index) else {
                    return;
                };
                if line.is_empty() {
                    return;
                }
                let last = col.min(line.len() - 1);
                for c in 0..=last {
                    line.blank(c);
                }
                if line.cell(last + 1).is_some_and(Cell::is_wide_continuation) {
                    line.blank(last + 1);
                    sink.notify(ScreenChange::CellWritten {
                        row,
                        col: (last + 1) as u16,
                        cell: Cell::blank(),
                    });
                }
                sink.notify(ScreenChange::LineCleared {
                    row,
                    start: 0,
                    end: Some(col as u16 + 1),
                });
            }
            EditKind::EraseLineAll => {
                if let Some(line) = self.lines.get_mut(index)
                    && !line.is_empty()
                {
                    line.clear();
                    sink.notify(ScreenChange::LineCleared {
                        row,
                        start: 0,
                        end: None,
                    });
                }
            }
            EditKind::EraseLineBelowAll => {
                let keep = index + 1;
                if self.lines.len() > keep {
                    self.lines.truncate(keep);
                    sink.notify(ScreenChange::LinesRemoved { from: keep });
                }
            }
            EditKind::EraseAll => {
                for r in 0..self.rows {
                    if let Some(line) = self.lines.get_mut(self.top + usize::from(r))
                        && !line.is_empty()
                    {
                        line.clear();
                        sink.notify(ScreenChange::LineCleared {
                            row: r,
                            start: 0,
                            end: None,
                        });
                    }
                }
            }
        }
    }

    // ── Resize ──────────────────────────────────────────────────────

    /// Change the viewport size. Existing lines are not re-wrapped.
    ///
    /// When the viewport gets shorter than the cursor row, the viewport
    /// anchor moves down so the cursor line stays visible. An active
    /// alternate screen is resized as well.
    pub fn resize<S: OutputSink + ?Sized>(&mut self, rows: u16, cols: u16, sink: &mut S) {
        let rows = rows.max(1);
        let cols = cols.max(1);
        if rows == self.rows && cols == self.cols {
            return;
        }
        crate::debug!(
            from_rows = self.rows,
            from_cols = self.cols,
            rows,
            cols,
            "screen resized"
        );
        self.last_glyph = None;
        if self.cursor.row >= rows {
            let shift = usize::from(self.cursor.row - (rows - 1));
            self.top += shift;
            self.cursor.row = rows - 1;
            sink.notify(ScreenChange::ViewportScrolled { top: self.top });
            self.ensure_line(self.cursor_index(), sink);
            self.evict_scrollback(sink);
        }
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.pending_wrap = false;
        self.rows = rows;
        self.cols = cols;
        sink.notify(ScreenChange::Resized { rows, cols });
        if let ScreenMode::Alt(alt) = &mut self.mode {
            alt.resize(rows, cols, sink);
        }
    }
}
