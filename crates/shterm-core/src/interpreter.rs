//! Token interpreter.
//!
//! Turns scanned tokens into [`TerminalEvent`]s while owning the running
//! SGR style. Sequences outside the supported subset become
//! [`TerminalEvent::Other`]; nothing here can fail.

use crate::event::{Coord, EditKind, ModeAction, TerminalEvent};
use crate::scanner::{SequenceFamily, Token, split_csi};
use crate::style::{Style, apply_sgr};

/// Upper bound on the repeat count of `CSI Ps I`.
pub const MAX_TAB_REPEAT: u16 = 256;

/// Interpret one token against `style`.
///
/// SGR sequences mutate `style` and emit nothing; text is emitted with a
/// snapshot of the style in effect.
#[must_use]
pub fn interpret(token: &Token, style: &mut Style, tab_width: u16) -> Vec<TerminalEvent> {
    if token.is_text() {
        return interpret_text(&token.content, style, tab_width);
    }
    let content = token.content.as_str();
    match content {
        "\n" => return vec![TerminalEvent::Edit(EditKind::Newline)],
        "\r" => return vec![TerminalEvent::cursor_col(Coord::Abs(0))],
        "\u{8}" => return vec![TerminalEvent::cursor_col(Coord::Rel(-1))],
        _ => {}
    }
    match SequenceFamily::of(content) {
        Some(SequenceFamily::Csi) => interpret_csi(content, style, tab_width),
        Some(SequenceFamily::Esc) => match content {
            "\u{1b}7" => vec![TerminalEvent::CursorSave],
            "\u{1b}8" => vec![TerminalEvent::CursorRestore],
            _ => unsupported(content),
        },
        _ => unsupported(content),
    }
}

/// Stateful wrapper holding the running style.
#[derive(Debug, Clone)]
pub struct Interpreter {
    style: Style,
    tab_width: u16,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TAB_WIDTH)
    }
}

impl Interpreter {
    #[must_use]
    pub fn new(tab_width: u16) -> Self {
        Self {
            style: Style::default(),
            tab_width: tab_width.max(1),
        }
    }

    pub fn interpret(&mut self, token: &Token) -> Vec<TerminalEvent> {
        interpret(token, &mut self.style, self.tab_width)
    }

    /// Interpret a batch of tokens in order.
    pub fn interpret_all(&mut self, tokens: &[Token]) -> Vec<TerminalEvent> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            out.extend(self.interpret(token));
        }
        out
    }

    /// Current running style.
    #[must_use]
    pub fn style(&self) -> &Style {
        &self.style
    }

    #[must_use]
    pub fn tab_width(&self) -> u16 {
        self.tab_width
    }

    /// Back to the default style.
    pub fn reset(&mut self) {
        self.style.reset();
    }
}

fn interpret_text(content: &str, style: &Style, tab_width: u16) -> Vec<TerminalEvent> {
    if content.is_empty() {
        return Vec::new();
    }
    let text = if content.contains('\t') {
        content.replace('\t', &" ".repeat(usize::from(tab_width)))
    } else {
        content.to_owned()
    };
    vec![TerminalEvent::Text {
        text,
        style: *style,
    }]
}

fn unsupported(content: &str) -> Vec<TerminalEvent> {
    crate::debug!(content = ?content, "unsupported sequence passed through");
    vec![TerminalEvent::other(content)]
}

fn interpret_csi(content: &str, style: &mut Style, tab_width: u16) -> Vec<TerminalEvent> {
    let Some(parts) = split_csi(content) else {
        return unsupported(content);
    };

    // Device attributes: hand the raw parameters to the host, prefixes included.
    if parts.terminator == "c" {
        let params = if parts.params.is_empty() {
            Vec::new()
        } else {
            parts.params.split(';').map(str::to_owned).collect()
        };
        return vec![TerminalEvent::Raw {
            family: SequenceFamily::Csi,
            introducer: parts.introducer.to_owned(),
            terminator: parts.terminator.to_owned(),
            params,
        }];
    }

    let (private, raw_params) = match parts.params.strip_prefix('?') {
        Some(rest) => (true, rest),
        None => (false, parts.params),
    };
    let Some(params) = parse_params(raw_params) else {
        return unsupported(content);
    };

    if private {
        return match parts.terminator {
            "h" => modes(ModeAction::Set, &params, "?"),
            "l" => modes(ModeAction::Reset, &params, "?"),
            _ => unsupported(content),
        };
    }

    let first = params.first().copied();
    let count = i32::from(count_or_one(first));
    match parts.terminator {
        "m" => {
            apply_sgr(style, &params);
            Vec::new()
        }
        "A" => vec![TerminalEvent::cursor_row(Coord::Rel(-count))],
        "B" => vec![TerminalEvent::cursor_row(Coord::Rel(count))],
        "C" => vec![TerminalEvent::cursor_col(Coord::Rel(count))],
        "D" => vec![TerminalEvent::cursor_col(Coord::Rel(-count))],
        "E" => vec![TerminalEvent::Cursor {
            row: Some(Coord::Rel(count)),
            col: Some(Coord::Abs(0)),
        }],
        "F" => vec![TerminalEvent::Cursor {
            row: Some(Coord::Rel(-count)),
            col: Some(Coord::Abs(0)),
        }],
        "G" | "`" => vec![TerminalEvent::cursor_col(Coord::Abs(
            count_or_one(first) - 1,
        ))],
        "H" => {
            let row = count_or_one(first) - 1;
            let col = count_or_one(params.get(1).copied()) - 1;
            vec![TerminalEvent::Cursor {
                row: Some(Coord::Abs(row)),
                col: Some(Coord::Abs(col)),
            }]
        }
        "I" => {
            let repeat = count_or_one(first).min(MAX_TAB_REPEAT);
            vec![TerminalEvent::Text {
                text: " ".repeat(usize::from(repeat) * usize::from(tab_width)),
                style: *style,
            }]
        }
        "J" => match first.unwrap_or(0) {
            0 => vec![
                TerminalEvent::Edit(EditKind::EraseLineRight),
                TerminalEvent::Edit(EditKind::EraseLineBelowAll),
            ],
            2 => vec![TerminalEvent::Edit(EditKind::EraseAll)],
            // 1 (erase above) and 3 (erase scrollback) pass through.
            _ => unsupported(content),
        },
        "K" => match first.unwrap_or(0) {
            0 => vec![TerminalEvent::Edit(EditKind::EraseLineRight)],
            1 => vec![TerminalEvent::Edit(EditKind::EraseLineLeft)],
            2 => vec![TerminalEvent::Edit(EditKind::EraseLineAll)],
            _ => unsupported(content),
        },
        "h" => modes(ModeAction::Set, &params, ""),
        "l" => modes(ModeAction::Reset, &params, ""),
        _ => unsupported(content),
    }
}

fn modes(action: ModeAction, params: &[u16], prefix: &str) -> Vec<TerminalEvent> {
    params
        .iter()
        .map(|p| TerminalEvent::Mode {
            action,
            id: format!("{prefix}{p}"),
        })
        .collect()
}

/// Parse `;`-separated numeric parameters. Empty fields read as 0 and values
/// saturate at `u16::MAX`; any other byte rejects the whole list.
fn parse_params(params: &str) -> Option<Vec<u16>> {
    if params.is_empty() {
        return Some(Vec::new());
    }
    let mut out = Vec::new();
    for part in params.split(';') {
        if part.is_empty() {
            out.push(0);
            continue;
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value = part.parse::<u32>().unwrap_or(u32::MAX);
        out.push(value.min(u32::from(u16::MAX)) as u16);
    }
    Some(out)
}

fn count_or_one(value: Option<u16>) -> u16 {
    value.unwrap_or(1).max(1)
}
