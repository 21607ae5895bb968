use crate::{InjectError, Key, KeySequence};
use log::{debug, warn};

/// Destination for synthetic keyboard input
///
/// Implementors only provide the primitives; chord playback is shared.
pub trait KeySink {
    /// Type literal text into the focused application
    fn type_text(&mut self, text: &str) -> Result<(), InjectError>;

    fn press(&mut self, key: Key) -> Result<(), InjectError>;

    fn release(&mut self, key: Key) -> Result<(), InjectError>;

    /// Send every chord of the sequence in turn.
    ///
    /// Keys of a chord are pressed in order and released in reverse order.
    /// Keys already pressed are released even if a later press fails, so a
    /// failed chord never leaves a modifier stuck down.
    fn send(&mut self, sequence: &KeySequence) -> Result<(), InjectError> {
        for chord in sequence.chords() {
            debug!("⌨️  Sending chord: {}", chord);

            let mut held: Vec<Key> = Vec::with_capacity(chord.keys().len());
            let mut press_error = None;
            for &key in chord.keys() {
                match self.press(key) {
                    Ok(()) => held.push(key),
                    Err(e) => {
                        press_error = Some(e);
                        break;
                    }
                }
            }

            let mut release_error = None;
            for &key in held.iter().rev() {
                if let Err(e) = self.release(key) {
                    warn!("⚠️  Failed to release {}: {}", key, e);
                    release_error.get_or_insert(e);
                }
            }

            if let Some(e) = press_error.or(release_error) {
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Event {
        Text(String),
        Down(Key),
        Up(Key),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        fail_on: Option<Key>,
    }

    impl KeySink for Recorder {
        fn type_text(&mut self, text: &str) -> Result<(), InjectError> {
            self.events.push(Event::Text(text.to_string()));
            Ok(())
        }

        fn press(&mut self, key: Key) -> Result<(), InjectError> {
            if self.fail_on == Some(key) {
                return Err(InjectError::Input(format!("cannot press {}", key)));
            }
            self.events.push(Event::Down(key));
            Ok(())
        }

        fn release(&mut self, key: Key) -> Result<(), InjectError> {
            self.events.push(Event::Up(key));
            Ok(())
        }
    }

    #[test]
    fn test_chord_press_then_reverse_release() {
        let mut sink = Recorder::default();
        let seq = KeySequence::parse("ctrl+shift+s").unwrap();
        sink.send(&seq).unwrap();

        assert_eq!(
            sink.events,
            vec![
                Event::Down(Key::Control),
                Event::Down(Key::Shift),
                Event::Down(Key::Char('s')),
                Event::Up(Key::Char('s')),
                Event::Up(Key::Shift),
                Event::Up(Key::Control),
            ]
        );
    }

    #[test]
    fn test_series_is_sent_in_order() {
        let mut sink = Recorder::default();
        sink.type_text("x").unwrap();
        sink.send(&KeySequence::parse("ctrl+a, ctrl+c").unwrap()).unwrap();

        assert_eq!(sink.events.len(), 9);
        assert_eq!(sink.events[0], Event::Text("x".to_string()));
        assert_eq!(sink.events[2], Event::Down(Key::Char('a')));
        assert_eq!(sink.events[6], Event::Down(Key::Char('c')));
    }

    #[test]
    fn test_failed_press_releases_held_keys() {
        let mut sink = Recorder {
            fail_on: Some(Key::Char('s')),
            ..Default::default()
        };
        let result = sink.send(&KeySequence::parse("ctrl+shift+s, ctrl+v").unwrap());

        assert!(matches!(result, Err(InjectError::Input(_))));
        // modifiers released, second chord never started
        assert_eq!(
            sink.events,
            vec![
                Event::Down(Key::Control),
                Event::Down(Key::Shift),
                Event::Up(Key::Shift),
                Event::Up(Key::Control),
            ]
        );
    }
}
