// Production key sink backed by enigo
//
// enigo picks the platform API: SendInput on Windows, CGEvent on macOS,
// x11rb on Linux (X11). On Wayland, synthetic input needs the X11 compat
// layer.

use crate::{InjectError, Key, KeySink};
use enigo::{Direction, Enigo, Keyboard, Settings};
use log::{debug, info};

pub struct Injector {
    enigo: Enigo,
}

impl Injector {
    /// Connect to the platform input system
    pub fn new() -> Result<Self, InjectError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InjectError::Connection(e.to_string()))?;
        info!("⌨️  Keyboard injector ready");
        Ok(Self { enigo })
    }

    fn key(&mut self, key: Key, direction: Direction) -> Result<(), InjectError> {
        let native = to_enigo(key)?;
        self.enigo
            .key(native, direction)
            .map_err(|e| InjectError::Input(e.to_string()))
    }
}

impl KeySink for Injector {
    fn type_text(&mut self, text: &str) -> Result<(), InjectError> {
        if text.is_empty() {
            return Ok(());
        }
        debug!("⌨️  Typing {} chars", text.chars().count());
        self.enigo
            .text(text)
            .map_err(|e| InjectError::Input(e.to_string()))
    }

    fn press(&mut self, key: Key) -> Result<(), InjectError> {
        self.key(key, Direction::Press)
    }

    fn release(&mut self, key: Key) -> Result<(), InjectError> {
        self.key(key, Direction::Release)
    }
}

fn to_enigo(key: Key) -> Result<enigo::Key, InjectError> {
    use enigo::Key as K;

    let native = match key {
        Key::Control => K::Control,
        Key::Shift => K::Shift,
        Key::Alt => K::Alt,
        Key::Meta => K::Meta,
        Key::Enter => K::Return,
        Key::Tab => K::Tab,
        Key::Escape => K::Escape,
        Key::Space => K::Space,
        Key::Backspace => K::Backspace,
        Key::Delete => K::Delete,
        Key::Home => K::Home,
        Key::End => K::End,
        Key::PageUp => K::PageUp,
        Key::PageDown => K::PageDown,
        Key::Up => K::UpArrow,
        Key::Down => K::DownArrow,
        Key::Left => K::LeftArrow,
        Key::Right => K::RightArrow,
        Key::CapsLock => K::CapsLock,
        Key::F(n) => match n {
            1 => K::F1,
            2 => K::F2,
            3 => K::F3,
            4 => K::F4,
            5 => K::F5,
            6 => K::F6,
            7 => K::F7,
            8 => K::F8,
            9 => K::F9,
            10 => K::F10,
            11 => K::F11,
            12 => K::F12,
            13 => K::F13,
            14 => K::F14,
            15 => K::F15,
            16 => K::F16,
            17 => K::F17,
            18 => K::F18,
            19 => K::F19,
            20 => K::F20,
            _ => return Err(InjectError::Unsupported(key)),
        },
        Key::Char(c) => K::Unicode(c),
    };
    Ok(native)
}
