//! Chunk scanner.
//!
//! Splits terminal output into text runs and control sequences without
//! interpreting them. Input arrives in arbitrary chunks, so a sequence whose
//! terminator has not arrived yet is held back as *residue* and re-scanned
//! together with the next chunk.
//!
//! Recognized families:
//!
//! - CSI: `ESC [` or `U+009B`, ends at the first final byte (`0x40..=0x7E`)
//! - OSC: `ESC ]` or `U+009D`, ends at BEL, `ESC \` or `U+009C`
//! - DCS: `ESC P` or `U+0090`, ends at `ESC \` or `U+009C`
//! - ESC: `ESC` plus one to three characters (charset selection and friends)
//! - `\n`, `\r` and backspace, each as its own one-character sequence

/// Escape character.
pub const ESC: char = '\u{1b}';
/// Single-character CSI introducer (C1).
pub const C1_CSI: char = '\u{9b}';
/// Single-character OSC introducer (C1).
pub const C1_OSC: char = '\u{9d}';
/// Single-character DCS introducer (C1).
pub const C1_DCS: char = '\u{90}';
/// Single-character string terminator (C1).
pub const C1_ST: char = '\u{9c}';

const BEL: char = '\u{7}';
const BACKSPACE: char = '\u{8}';

/// CSI terminators longer than the final byte, longest first.
///
/// A CSI body ending in one of these uses the whole entry as its terminator;
/// otherwise the final byte alone terminates it.
pub const CSI_COMPOSITE_TERMINATORS: &[&str] = &[
    " A", "?W", "!p", "$p", "#p", "+p", "\"p", "#q", "\"q", " q", " d", " @",
];

/// Kind of a scanned token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// Printable run (tabs included).
    Text,
    /// Control sequence or bare control character.
    Sequence,
}

/// A scanned piece of the stream, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    /// Source text, introducer and terminator included for sequences.
    pub content: String,
}

impl Token {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Text,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn sequence(content: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Sequence,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }
}

/// Result of scanning one buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub tokens: Vec<Token>,
    /// Unterminated trailing sequence, starting at its introducer.
    pub residue: String,
}

/// Sequence family, derived from the introducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceFamily {
    Esc,
    Csi,
    Osc,
    Dcs,
}

impl SequenceFamily {
    /// Family of a sequence starting with `content`, if it starts with an introducer.
    #[must_use]
    pub fn of(content: &str) -> Option<Self> {
        let mut chars = content.chars();
        match chars.next()? {
            ESC => Some(match chars.next() {
                Some('[') => Self::Csi,
                Some(']') => Self::Osc,
                Some('P') => Self::Dcs,
                _ => Self::Esc,
            }),
            C1_CSI => Some(Self::Csi),
            C1_OSC => Some(Self::Osc),
            C1_DCS => Some(Self::Dcs),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Esc => "esc",
            Self::Csi => "csi",
            Self::Osc => "osc",
            Self::Dcs => "dcs",
        }
    }
}

/// A CSI token split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsiParts<'a> {
    /// `ESC [` or the C1 introducer.
    pub introducer: &'a str,
    /// Everything between introducer and terminator.
    pub params: &'a str,
    /// Final byte, possibly with its intermediate (see [`CSI_COMPOSITE_TERMINATORS`]).
    pub terminator: &'a str,
}

/// Split a complete CSI token. Returns `None` for non-CSI content or a CSI
/// body cut short by another introducer.
#[must_use]
pub fn split_csi(content: &str) -> Option<CsiParts<'_>> {
    let intro_len = if content.starts_with("\u{1b}[") {
        2
    } else if content.starts_with(C1_CSI) {
        C1_CSI.len_utf8()
    } else {
        return None;
    };
    let (introducer, body) = content.split_at(intro_len);
    let last = body.chars().next_back()?;
    if !is_csi_final(last) {
        return None;
    }
    let term_len = CSI_COMPOSITE_TERMINATORS
        .iter()
        .find(|term| body.ends_with(**term))
        .map_or(last.len_utf8(), |term| term.len());
    let (params, terminator) = body.split_at(body.len() - term_len);
    Some(CsiParts {
        introducer,
        params,
        terminator,
    })
}

/// Scan a complete buffer (previous residue already prefixed).
#[must_use]
pub fn scan(input: &str) -> Scan {
    let mut out = Scan::default();
    let mut pos = 0;
    while pos < input.len() {
        let rest = &input[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        match ch {
            '\n' | '\r' | BACKSPACE => {
                out.tokens.push(Token::sequence(ch));
                pos += 1;
            }
            ESC | C1_CSI | C1_OSC | C1_DCS => match sequence_len(rest) {
                Some(len) => {
                    out.tokens.push(Token::sequence(&rest[..len]));
                    pos += len;
                }
                None => {
                    out.residue.push_str(rest);
                    break;
                }
            },
            _ => {
                let len = rest.find(ends_text_run).unwrap_or(rest.len());
                out.tokens.push(Token::text(&rest[..len]));
                pos += len;
            }
        }
    }
    out
}

/// Incremental scanner carrying residue between chunks.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    residue: String,
}

impl Scanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `chunk` after any residue left by the previous call.
    pub fn feed(&mut self, chunk: &str) -> Vec<Token> {
        let scanned = if self.residue.is_empty() {
            scan(chunk)
        } else {
            let mut buf = std::mem::take(&mut self.residue);
            buf.push_str(chunk);
            scan(&buf)
        };
        if !scanned.residue.is_empty() {
            crate::trace!(len = scanned.residue.len(), "carrying incomplete sequence");
        }
        self.residue = scanned.residue;
        scanned.tokens
    }

    /// Pending incomplete sequence, empty if none.
    #[must_use]
    pub fn residue(&self) -> &str {
        &self.residue
    }

    /// Drop any pending residue.
    pub fn reset(&mut self) {
        self.residue.clear();
    }
}

fn ends_text_run(c: char) -> bool {
    matches!(
        c,
        ESC | C1_CSI | C1_OSC | C1_DCS | '\n' | '\r' | BACKSPACE
    )
}

fn is_csi_final(c: char) -> bool {
    ('\u{40}'..='\u{7e}').contains(&c)
}

fn is_introducer(c: char) -> bool {
    matches!(c, ESC | C1_CSI | C1_OSC | C1_DCS)
}

/// Byte length of the complete sequence at the start of `s`, or `None` when
/// its terminator has not arrived yet.
fn sequence_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    let (_, first) = chars.next()?;
    match first {
        C1_CSI => csi_len(s, first.len_utf8()),
        C1_OSC => string_len(s, first.len_utf8(), true),
        C1_DCS => string_len(s, first.len_utf8(), false),
        _ => {
            let (i, second) = chars.next()?;
            let after = |(j, c): (usize, char)| j + c.len_utf8();
            match second {
                '[' => csi_len(s, i + 1),
                ']' => string_len(s, i + 1, true),
                'P' => string_len(s, i + 1, false),
                ' ' | '#' | '%' | '-' | '.' | '/' => chars.next().map(after),
                '(' | ')' | '*' | '+' => {
                    let (j, c) = chars.next()?;
                    if c == '%' || c == '"' {
                        chars.next().map(after)
                    } else {
                        Some(after((j, c)))
                    }
                }
                other => Some(i + other.len_utf8()),
            }
        }
    }
}

fn csi_len(s: &str, body_start: usize) -> Option<usize> {
    for (i, c) in s[body_start..].char_indices() {
        if is_csi_final(c) {
            return Some(body_start + i + c.len_utf8());
        }
        if is_introducer(c) {
            // Malformed: cut the body here and rescan from the new introducer.
            return Some(body_start + i);
        }
    }
    None
}

fn string_len(s: &str, body_start: usize, bel_terminates: bool) -> Option<usize> {
    let body = &s[body_start..];
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            BEL if bel_terminates => return Some(body_start + i + 1),
            C1_ST => return Some(body_start + i + c.len_utf8()),
            ESC => {
                if let Some(&(j, '\\')) = chars.peek() {
                    return Some(body_start + j + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.content.as_str()).collect()
    }

    // ── Text and bare controls ─────────────────────────────────────

    #[test]
    fn plain_text_is_one_token() {
        let scan = scan("hello world");
        assert_eq!(scan.tokens, vec![Token::text("hello world")]);
        assert!(scan.residue.is_empty());
    }

    #[test]
    fn bare_controls_are_sequences() {
        let scan = scan("a\r\nb\u{8}");
        assert_eq!(
            scan.tokens,
            vec![
                Token::text("a"),
                Token::sequence("\r"),
                Token::sequence("\n"),
                Token::text("b"),
                Token::sequence("\u{8}"),
            ]
        );
    }

    #[test]
    fn tab_stays_in_text_run() {
        let scan = scan("a\tb");
        assert_eq!(scan.tokens, vec![Token::text("a\tb")]);
    }

    // ── CSI ────────────────────────────────────────────────────────

    #[test]
    fn csi_sgr_splits_text() {
        let scan = scan("\x1b[31mRed\x1b[0m");
        assert_eq!(contents(&scan.tokens), vec!["\x1b[31m", "Red", "\x1b[0m"]);
        assert!(!scan.tokens[0].is_text());
        assert!(scan.tokens[1].is_text());
    }

    #[test]
    fn csi_composite_terminator_kept_whole() {
        let scan = scan("\x1b[2 qX\x1b[?1$p");
        assert_eq!(contents(&scan.tokens), vec!["\x1b[2 q", "X", "\x1b[?1$p"]);
        let parts = split_csi(&scan.tokens[0].content).unwrap();
        assert_eq!(parts.params, "2");
        assert_eq!(parts.terminator, " q");
        let parts = split_csi(&scan.tokens[2].content).unwrap();
        assert_eq!(parts.params, "?1");
        assert_eq!(parts.terminator, "$p");
    }

    #[test]
    fn csi_tilde_final_ends_sequence() {
        let scan = scan("\x1b[3~abc");
        assert_eq!(contents(&scan.tokens), vec!["\x1b[3~", "abc"]);
    }

    #[test]
    fn c1_csi_introducer() {
        let scan = scan("\u{9b}1;2Hx");
        assert_eq!(contents(&scan.tokens), vec!["\u{9b}1;2H", "x"]);
        let parts = split_csi(&scan.tokens[0].content).unwrap();
        assert_eq!(parts.introducer, "\u{9b}");
        assert_eq!(parts.params, "1;2");
        assert_eq!(parts.terminator, "H");
    }

    #[test]
    fn csi_interrupted_by_escape_is_cut() {
        let scan = scan("\x1b[12\x1b[31m");
        assert_eq!(contents(&scan.tokens), vec!["\x1b[12", "\x1b[31m"]);
        assert!(split_csi("\x1b[12").is_none());
    }

    // ── OSC / DCS ──────────────────────────────────────────────────

    #[test]
    fn osc_bel_and_st_terminators() {
        let scan = scan("\x1b]0;title\x07a\x1b]2;t\x1b\\b\u{9d}1;x\u{9c}c");
        assert_eq!(
            contents(&scan.tokens),
            vec![
                "\x1b]0;title\x07",
                "a",
                "\x1b]2;t\x1b\\",
                "b",
                "\u{9d}1;x\u{9c}",
                "c"
            ]
        );
    }

    #[test]
    fn osc_embedded_escape_without_backslash_continues() {
        let scan = scan("\x1b]0;a\x1bb\x07z");
        assert_eq!(contents(&scan.tokens), vec!["\x1b]0;a\x1bb\x07", "z"]);
    }

    #[test]
    fn dcs_ignores_bel() {
        let scan = scan("\x1bPq\x07data\x1b\\x");
        assert_eq!(contents(&scan.tokens), vec!["\x1bPq\x07data\x1b\\", "x"]);
    }

    // ── ESC forms ──────────────────────────────────────────────────

    #[test]
    fn esc_single_char_forms() {
        let scan = scan("\x1b7\x1b8\x1b=\x1bM");
        assert_eq!(contents(&scan.tokens), vec!["\x1b7", "\x1b8", "\x1b=", "\x1bM"]);
    }

    #[test]
    fn esc_charset_forms() {
        let scan = scan("\x1b(B\x1b)0\x1b(%5\x1b%G\x1b#8\x1b F\x1b-A!");
        assert_eq!(
            contents(&scan.tokens),
            vec![
                "\x1b(B", "\x1b)0", "\x1b(%5", "\x1b%G", "\x1b#8", "\x1b F", "\x1b-A", "!"
            ]
        );
    }

    // ── Residue ────────────────────────────────────────────────────

    #[test]
    fn incomplete_sequences_become_residue() {
        for input in [
            "\x1b",
            "\x1b[",
            "\x1b[38;5",
            "\x1b]0;title",
            "\x1bPdata\x1b",
            "\x1b(",
            "\x1b(%",
            "\x1b ",
            "\u{9b}",
        ] {
            let scan = scan(&format!("ab{input}"));
            assert_eq!(scan.tokens, vec![Token::text("ab")], "input {input:?}");
            assert_eq!(scan.residue, input, "input {input:?}");
        }
    }

    #[test]
    fn residue_stops_scanning() {
        let scan = scan("x\x1b]0;never terminated\nmore text");
        assert_eq!(scan.tokens, vec![Token::text("x")]);
        assert_eq!(scan.residue, "\x1b]0;never terminated\nmore text");
    }

    #[test]
    fn scanner_carries_residue_between_chunks() {
        let mut scanner = Scanner::new();
        assert_eq!(scanner.feed("a\x1b[3"), vec![Token::text("a")]);
        assert_eq!(scanner.residue(), "\x1b[3");
        assert_eq!(
            scanner.feed("1mX"),
            vec![Token::sequence("\x1b[31m"), Token::text("X")]
        );
        assert_eq!(scanner.residue(), "");
    }

    #[test]
    fn scanner_reset_drops_residue() {
        let mut scanner = Scanner::new();
        let _ = scanner.feed("\x1b]0;t");
        scanner.reset();
        assert_eq!(scanner.feed("ok"), vec![Token::text("ok")]);
    }

    #[test]
    fn family_from_introducer() {
        assert_eq!(SequenceFamily::of("\x1b[m"), Some(SequenceFamily::Csi));
        assert_eq!(SequenceFamily::of("\x1b]0;x\x07"), Some(SequenceFamily::Osc));
        assert_eq!(SequenceFamily::of("\x1bPq\x1b\\"), Some(SequenceFamily::Dcs));
        assert_eq!(SequenceFamily::of("\x1b7"), Some(SequenceFamily::Esc));
        assert_eq!(SequenceFamily::of("\u{90}x\u{9c}"), Some(SequenceFamily::Dcs));
        assert_eq!(SequenceFamily::of("\n"), None);
    }
}
