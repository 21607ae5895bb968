// Cross-platform keyboard injection library
//!
//! # key-inject
//!
//! Synthetic keyboard input for macro playback:
//! - typing literal (Unicode) text into the focused application
//! - sending key combinations such as `ctrl+shift+s` or `ctrl+a, ctrl+c`
//!
//! Parsing of key-combination strings is pure and platform independent.
//! Actual input goes through [`Injector`], backed by `enigo`
//! (SendInput on Windows, CGEvent on macOS, X11 on Linux).
//!
//! ## Example
//! ```no_run
//! use key_inject::{Injector, KeySequence, KeySink};
//!
//! let mut injector = Injector::new()?;
//! injector.type_text("System.out.println();")?;
//!
//! let save_all: KeySequence = "ctrl+shift+s".parse()?;
//! injector.send(&save_all)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chord;
mod injector;
mod sink;

pub use chord::{ChordParseError, Key, KeyChord, KeySequence};
pub use injector::Injector;
pub use sink::KeySink;

/// Errors raised while talking to the OS input layer
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("failed to connect to the input system: {0}")]
    Connection(String),

    #[error("failed to simulate input: {0}")]
    Input(String),

    #[error("key `{0}` is not supported on this platform")]
    Unsupported(Key),
}
