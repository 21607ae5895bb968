// Key-combination parsing
//
// Accepted syntax: `ctrl+shift+s`, `alt+tab`, and comma separated series
// such as `ctrl+a, ctrl+c`. Names are case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single key that can be pressed or released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Control,
    Shift,
    Alt,
    Meta,
    Enter,
    Tab,
    Escape,
    Space,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    CapsLock,
    /// Function key F1..F20
    F(u8),
    Char(char),
}

impl Key {
    /// Highest function key number accepted by the parser
    pub const MAX_FUNCTION_KEY: u8 = 20;

    /// Resolve a key name (already trimmed) to a key
    pub fn from_name(name: &str) -> Option<Key> {
        let lower = name.to_lowercase();
        // "page   up" and "page up" are the same key
        let normalized = lower.split_whitespace().collect::<Vec<_>>().join(" ");

        let key = match normalized.as_str() {
            "ctrl" | "control" => Key::Control,
            "shift" => Key::Shift,
            "alt" | "option" => Key::Alt,
            "meta" | "cmd" | "command" | "win" | "windows" | "super" => Key::Meta,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "esc" | "escape" => Key::Escape,
            "space" | "spacebar" => Key::Space,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "home" => Key::Home,
            "end" => Key::End,
            "page up" | "pageup" | "pgup" => Key::PageUp,
            "page down" | "pagedown" | "pgdn" => Key::PageDown,
            "up" | "up arrow" => Key::Up,
            "down" | "down arrow" => Key::Down,
            "left" | "left arrow" => Key::Left,
            "right" | "right arrow" => Key::Right,
            "caps lock" | "capslock" => Key::CapsLock,
            "plus" => Key::Char('+'),
            "comma" => Key::Char(','),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    (Some('f'), Some(_)) => {
                        let n: u8 = other[1..].parse().ok()?;
                        if n == 0 || n > Self::MAX_FUNCTION_KEY {
                            return None;
                        }
                        Key::F(n)
                    }
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Key::Control => "ctrl",
            Key::Shift => "shift",
            Key::Alt => "alt",
            Key::Meta => "meta",
            Key::Enter => "enter",
            Key::Tab => "tab",
            Key::Escape => "esc",
            Key::Space | Key::Char(' ') => "space",
            Key::Backspace => "backspace",
            Key::Delete => "delete",
            Key::Home => "home",
            Key::End => "end",
            Key::PageUp => "page up",
            Key::PageDown => "page down",
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
            Key::CapsLock => "caps lock",
            Key::Char('+') => "plus",
            Key::Char(',') => "comma",
            Key::F(n) => return write!(f, "f{}", n),
            Key::Char(c) => return write!(f, "{}", c),
        };
        f.write_str(name)
    }
}

/// Keys held down together, pressed in order and released in reverse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    keys: Vec<Key>,
}

impl KeyChord {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// One or more chords sent one after another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeySequence {
    chords: Vec<KeyChord>,
}

impl KeySequence {
    /// Parse a sequence like `ctrl+a, ctrl+c`
    pub fn parse(input: &str) -> Result<Self, ChordParseError> {
        if input.trim().is_empty() {
            return Err(ChordParseError::Empty);
        }

        let mut chords = Vec::new();
        for (step, part) in input.split(',').enumerate() {
            if part.trim().is_empty() {
                return Err(ChordParseError::EmptyStep { step: step + 1 });
            }

            let mut keys = Vec::new();
            for token in part.split('+') {
                let token = token.trim();
                if token.is_empty() {
                    return Err(ChordParseError::EmptyKey { step: step + 1 });
                }
                let key = Key::from_name(token)
                    .ok_or_else(|| ChordParseError::UnknownKey(token.to_string()))?;
                keys.push(key);
            }
            chords.push(KeyChord::new(keys));
        }

        Ok(Self { chords })
    }

    pub fn chords(&self) -> &[KeyChord] {
        &self.chords
    }
}

impl FromStr for KeySequence {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeySequence {
    type Error = ChordParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeySequence> for String {
    fn from(sequence: KeySequence) -> Self {
        sequence.to_string()
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", chord)?;
        }
        Ok(())
    }
}

/// Errors produced while parsing a key sequence
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("key sequence is empty")]
    Empty,

    #[error("step {step} of the key sequence is empty")]
    EmptyStep { step: usize },

    #[error("step {step} contains an empty key name (use `plus` for the + key)")]
    EmptyKey { step: usize },

    #[error("unknown key name `{0}`")]
    UnknownKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_chord() {
        let seq: KeySequence = "ctrl+shift+s".parse().unwrap();
        assert_eq!(seq.chords().len(), 1);
        assert_eq!(
            seq.chords()[0].keys(),
            &[Key::Control, Key::Shift, Key::Char('s')]
        );
    }

    #[test]
    fn test_parse_series_and_aliases() {
        let seq = KeySequence::parse("Control+A, cmd + Return,page  down").unwrap();
        assert_eq!(seq.chords().len(), 3);
        assert_eq!(seq.chords()[0].keys(), &[Key::Control, Key::Char('a')]);
        assert_eq!(seq.chords()[1].keys(), &[Key::Meta, Key::Enter]);
        assert_eq!(seq.chords()[2].keys(), &[Key::PageDown]);
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(Key::from_name("F5"), Some(Key::F(5)));
        assert_eq!(Key::from_name("f20"), Some(Key::F(20)));
        assert_eq!(Key::from_name("f21"), None);
        assert_eq!(Key::from_name("f0"), None);
        // a lone "f" is the letter
        assert_eq!(Key::from_name("f"), Some(Key::Char('f')));
    }

    #[test]
    fn test_plus_and_comma_keys() {
        let seq = KeySequence::parse("ctrl+plus, shift+comma").unwrap();
        assert_eq!(seq.chords()[0].keys(), &[Key::Control, Key::Char('+')]);
        assert_eq!(seq.chords()[1].keys(), &[Key::Shift, Key::Char(',')]);
        assert_eq!(seq.to_string(), "ctrl+plus, shift+comma");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(KeySequence::parse("  "), Err(ChordParseError::Empty));
        assert_eq!(
            KeySequence::parse("ctrl+c,,ctrl+v"),
            Err(ChordParseError::EmptyStep { step: 2 })
        );
        assert_eq!(
            KeySequence::parse("ctrl++"),
            Err(ChordParseError::EmptyKey { step: 1 })
        );
        assert_eq!(
            KeySequence::parse("ctrl+hyper"),
            Err(ChordParseError::UnknownKey("hyper".to_string()))
        );
    }

    #[test]
    fn test_display_is_canonical() {
        let seq = KeySequence::parse("CONTROL+Escape, Win+Up Arrow").unwrap();
        assert_eq!(seq.to_string(), "ctrl+esc, meta+up");
    }

    #[test]
    fn test_serde_as_string() {
        let seq = KeySequence::parse("alt+tab").unwrap();
        let json = serde_json::to_string(&seq).unwrap();
        assert_eq!(json, "\"alt+tab\"");

        let back: KeySequence = serde_json::from_str("\"Alt + Tab\"").unwrap();
        assert_eq!(back, seq);
        assert!(serde_json::from_str::<KeySequence>("\"alt+nope\"").is_err());
    }
}
