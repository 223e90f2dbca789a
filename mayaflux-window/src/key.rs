//! Integer-backed key codes: literal ASCII ranges for printable keys, then
//! fixed ranges for navigation, function, keypad and modifier keys.
//!
//! Grounded on `examples/original_source/src/MayaFlux/IO/Keys.hpp`: the
//! original is a plain `enum class Keys : int16_t` with gaps between
//! ranges; this mirrors the exact boundary values (`A..Z = 65..90`,
//! `0..9 = 48..57`, navigation at 256, function keys at 290, keypad at 320,
//! modifiers at 340-348) rather than renumbering them into a dense Rust
//! enum.

/// A key code. Stored as the same literal integer the original assigns,
/// so a backend's raw scancode-adjacent value round-trips through
/// [`Key::from_code`]/[`Key::code`] without a translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub i16);

impl Key {
    pub const UNKNOWN: Key = Key(-1);
    pub const SPACE: Key = Key(32);
    pub const ESCAPE: Key = Key(256);
    pub const ENTER: Key = Key(257);
    pub const TAB: Key = Key(258);
    pub const BACKSPACE: Key = Key(259);
    pub const F1: Key = Key(290);
    pub const F25: Key = Key(314);
    pub const KP_0: Key = Key(320);
    pub const KP_EQUAL: Key = Key(336);
    pub const LEFT_SHIFT: Key = Key(340);
    pub const MENU: Key = Key(348);

    pub fn code(self) -> i16 {
        self.0
    }

    pub fn from_code(code: i16) -> Key {
        Key(code)
    }

    /// `0-9`/`A-Z`/space and the rest of printable ASCII: `32..=96`.
    pub fn is_printable(self) -> bool {
        (32..=96).contains(&self.0)
    }

    pub fn is_digit(self) -> bool {
        (48..=57).contains(&self.0)
    }

    pub fn is_letter(self) -> bool {
        (65..=90).contains(&self.0)
    }

    pub fn is_navigation(self) -> bool {
        (256..290).contains(&self.0)
    }

    pub fn is_function_key(self) -> bool {
        (290..320).contains(&self.0)
    }

    pub fn is_keypad_key(self) -> bool {
        (320..340).contains(&self.0)
    }

    pub fn is_modifier(self) -> bool {
        (340..=348).contains(&self.0)
    }

    /// A code is valid if it falls in one of the named literal ranges;
    /// `-1` (`UNKNOWN`) and anything outside every range is not.
    pub fn is_valid(self) -> bool {
        self.is_printable() || self.is_navigation() || self.is_function_key() || self.is_keypad_key() || self.is_modifier()
    }

    /// `'A'..'Z'`/`'0'..'9'`/space map directly onto their ASCII code; any
    /// other character has no key mapping.
    pub fn from_char(c: char) -> Option<Key> {
        let c = c.to_ascii_uppercase();
        if c.is_ascii_graphic() || c == ' ' {
            Some(Key(c as i16))
        } else {
            None
        }
    }
}
