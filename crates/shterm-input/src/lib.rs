#![forbid(unsafe_code)]

//! Key events to the byte sequences a terminal program expects on its input.
//!
//! Only the legacy (VT/xterm) encoding is produced:
//!
//! | Key | Bytes |
//! |-----|-------|
//! | printable character | its UTF-8 encoding |
//! | Enter / Backspace / Tab / Escape | `CR` / `DEL` / `HT` / `ESC` |
//! | arrows | `ESC [ A/B/C/D`, or `ESC [ 1 ; m A/B/C/D` with modifiers |
//! | Ctrl + letter | C0 control (`letter - 64`) |
//! | Alt + anything | `ESC` prefix |
//!
//! ```
//! use shterm_input::{KeyCode, KeyInput, Modifiers, encode_key};
//!
//! assert_eq!(encode_key(&KeyInput::new(KeyCode::Char('c'), Modifiers::CTRL)), vec![0x03]);
//! assert_eq!(encode_key(&KeyInput::plain(KeyCode::Up)), b"\x1b[A".to_vec());
//! ```

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyCode {
    /// A printable character, already shifted by the host keyboard layout.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyInput {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyInput {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Key without modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }
}

impl From<KeyCode> for KeyInput {
    fn from(code: KeyCode) -> Self {
        Self::plain(code)
    }
}

/// Encode a key press. Returns an empty vector for combinations with no
/// legacy encoding (Ctrl with a character outside the C0 table).
#[must_use]
pub fn encode_key(key: &KeyInput) -> Vec<u8> {
    let mods = key.modifiers;
    match key.code {
        KeyCode::Char(ch) => encode_char(ch, mods),
        KeyCode::Enter => alt_prefixed(mods, b"\r"),
        KeyCode::Escape => alt_prefixed(mods, b"\x1b"),
        KeyCode::Backspace => alt_prefixed(mods, &[0x7f]),
        KeyCode::Tab => alt_prefixed(mods, b"\t"),
        KeyCode::Up => cursor_key('A', mods),
        KeyCode::Down => cursor_key('B', mods),
        KeyCode::Right => cursor_key('C', mods),
        KeyCode::Left => cursor_key('D', mods),
    }
}

fn encode_char(ch: char, mods: Modifiers) -> Vec<u8> {
    if mods.contains(Modifiers::CTRL) {
        let Some(ctrl) = ctrl_byte(ch) else {
            return Vec::new();
        };
        return alt_prefixed(mods, &[ctrl]);
    }
    let mut buf = [0u8; 4];
    alt_prefixed(mods, ch.encode_utf8(&mut buf).as_bytes())
}

fn alt_prefixed(mods: Modifiers, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    if mods.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    out.extend_from_slice(bytes);
    out
}

fn cursor_key(final_byte: char, mods: Modifiers) -> Vec<u8> {
    if mods.is_empty() {
        format!("\x1b[{final_byte}").into_bytes()
    } else {
        // xterm modifier parameter: 1 + bits, bits in the Modifiers layout.
        format!("\x1b[1;{}{final_byte}", 1 + mods.bits()).into_bytes()
    }
}

/// C0 control for Ctrl + `ch`.
fn ctrl_byte(ch: char) -> Option<u8> {
    match ch {
        '@' | ' ' => Some(0x00),
        'a'..='z' => Some(ch as u8 - b'a' + 1),
        'A'..='Z' => Some(ch as u8 - b'A' + 1),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' => Some(0x1f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(code: KeyCode, modifiers: Modifiers) -> Vec<u8> {
        encode_key(&KeyInput::new(code, modifiers))
    }

    #[test]
    fn printable_characters_pass_through() {
        assert_eq!(key(KeyCode::Char('x'), Modifiers::empty()), b"x".to_vec());
        assert_eq!(key(KeyCode::Char('X'), Modifiers::SHIFT), b"X".to_vec());
        assert_eq!(
            key(KeyCode::Char('你'), Modifiers::empty()),
            "你".as_bytes().to_vec()
        );
    }

    #[test]
    fn editing_keys() {
        assert_eq!(encode_key(&KeyCode::Enter.into()), b"\r".to_vec());
        assert_eq!(encode_key(&KeyCode::Backspace.into()), vec![0x7f]);
        assert_eq!(encode_key(&KeyCode::Tab.into()), b"\t".to_vec());
        assert_eq!(encode_key(&KeyCode::Escape.into()), b"\x1b".to_vec());
    }

    #[test]
    fn arrows() {
        assert_eq!(encode_key(&KeyCode::Up.into()), b"\x1b[A".to_vec());
        assert_eq!(encode_key(&KeyCode::Down.into()), b"\x1b[B".to_vec());
        assert_eq!(encode_key(&KeyCode::Right.into()), b"\x1b[C".to_vec());
        assert_eq!(encode_key(&KeyCode::Left.into()), b"\x1b[D".to_vec());
    }

    #[test]
    fn arrows_with_modifiers_use_xterm_parameter() {
        assert_eq!(key(KeyCode::Up, Modifiers::CTRL), b"\x1b[1;5A".to_vec());
        assert_eq!(key(KeyCode::Left, Modifiers::SHIFT), b"\x1b[1;2D".to_vec());
        assert_eq!(
            key(KeyCode::Right, Modifiers::ALT | Modifiers::SHIFT),
            b"\x1b[1;4C".to_vec()
        );
    }

    #[test]
    fn ctrl_letters_map_to_c0() {
        assert_eq!(key(KeyCode::Char('c'), Modifiers::CTRL), vec![0x03]);
        assert_eq!(key(KeyCode::Char('C'), Modifiers::CTRL), vec![0x03]);
        assert_eq!(key(KeyCode::Char('a'), Modifiers::CTRL), vec![0x01]);
        assert_eq!(key(KeyCode::Char('z'), Modifiers::CTRL), vec![0x1a]);
    }

    #[test]
    fn ctrl_punctuation_table() {
        for (ch, byte) in [
            (' ', 0x00),
            ('@', 0x00),
            ('[', 0x1b),
            ('\\', 0x1c),
            (']', 0x1d),
            ('^', 0x1e),
            ('_', 0x1f),
        ] {
            assert_eq!(key(KeyCode::Char(ch), Modifiers::CTRL), vec![byte], "ctrl+{ch:?}");
        }
    }

    #[test]
    fn unmapped_ctrl_encodes_nothing() {
        assert!(key(KeyCode::Char('1'), Modifiers::CTRL).is_empty());
        assert!(key(KeyCode::Char('é'), Modifiers::CTRL).is_empty());
    }

    #[test]
    fn alt_prefixes_escape() {
        assert_eq!(key(KeyCode::Char('b'), Modifiers::ALT), b"\x1bb".to_vec());
        assert_eq!(
            key(KeyCode::Char('c'), Modifiers::ALT | Modifiers::CTRL),
            vec![0x1b, 0x03]
        );
        assert_eq!(key(KeyCode::Enter, Modifiers::ALT), b"\x1b\r".to_vec());
    }

    proptest! {
        #[test]
        fn ctrl_ascii_letter_is_single_c0_byte(letter in prop::char::range('a', 'z'), upper in any::<bool>()) {
            let ch = if upper { letter.to_ascii_uppercase() } else { letter };
            let bytes = key(KeyCode::Char(ch), Modifiers::CTRL);
            prop_assert_eq!(bytes.len(), 1);
            prop_assert_eq!(bytes[0], ch.to_ascii_uppercase() as u8 - 64);
        }

        #[test]
        fn unmodified_char_is_its_utf8(ch in any::<char>()) {
            let bytes = key(KeyCode::Char(ch), Modifiers::empty());
            prop_assert_eq!(bytes, ch.to_string().into_bytes());
        }
    }
}
