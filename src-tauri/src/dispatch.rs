// Macro dispatcher
//
// Hotkey callbacks only enqueue the pressed key. A single worker thread owns
// the keyboard injector and performs the actions in press order.

use crate::events::{self, MacroErrorEvent, MacroTriggeredEvent};
use crate::hotkey::FunctionKey;
use crate::macros::{ActionKind, MacroAction};
use crate::state::AppState;
use key_inject::{ChordParseError, InjectError, Injector, Key, KeySequence, KeySink};
use log::{debug, error, info, warn};
use std::fmt;
use std::process::{Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};
use tauri::{AppHandle, Manager};

/// Starts shell commands without waiting for them
pub trait Launcher {
    /// Spawn `command` through the platform shell, returning the child pid
    fn launch(&self, command: &str) -> std::io::Result<u32>;
}

/// `sh -c` on Unix, `cmd /C` on Windows
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, command: &str) -> std::io::Result<u32> {
        #[cfg(target_os = "windows")]
        let mut shell = {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };

        #[cfg(not(target_os = "windows"))]
        let mut shell = {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };

        let mut child = shell.stdin(Stdio::null()).spawn()?;
        let pid = child.id();

        // Reap the child so finished commands do not linger as zombies
        std::thread::spawn(move || match child.wait() {
            Ok(status) => debug!("Command (pid {}) exited with {}", pid, status),
            Err(e) => warn!("⚠️  Failed to wait for command (pid {}): {}", pid, e),
        });

        Ok(pid)
    }
}

/// What a trigger ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOutcome {
    Unbound,
    Typed { chars: usize },
    SentKeys(KeySequence),
    Launched { pid: u32 },
}

impl fmt::Display for MacroOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroOutcome::Unbound => f.write_str("unbound"),
            MacroOutcome::Typed { chars } => write!(f, "typed {} chars", chars),
            MacroOutcome::SentKeys(sequence) => write!(f, "sent {}", sequence),
            MacroOutcome::Launched { pid } => write!(f, "launched pid {}", pid),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown action type for {key}: {kind}")]
    UnknownActionType { key: FunctionKey, kind: String },

    #[error("invalid key sequence for {key}: {source}")]
    InvalidKeys {
        key: FunctionKey,
        #[source]
        source: ChordParseError,
    },

    #[error("empty command for {0}")]
    EmptyCommand(FunctionKey),

    #[error("failed to launch command '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Inject(#[from] InjectError),
}

/// Perform the action bound to `key`, if any
pub fn perform(
    key: FunctionKey,
    action: Option<&MacroAction>,
    sink: &mut dyn KeySink,
    launcher: &dyn Launcher,
) -> Result<MacroOutcome, DispatchError> {
    let Some(action) = action else {
        info!("No macro defined for {}", key);
        return Ok(MacroOutcome::Unbound);
    };

    debug!("Macro triggered: {} -> {} : {}", key, action.kind, action.value);

    match &action.kind {
        ActionKind::Text => {
            sink.type_text(&action.value)?;
            Ok(MacroOutcome::Typed {
                chars: action.value.chars().count(),
            })
        }
        ActionKind::Keys => {
            let sequence = KeySequence::parse(&action.value)
                .map_err(|source| DispatchError::InvalidKeys { key, source })?;
            sink.send(&sequence)?;
            Ok(MacroOutcome::SentKeys(sequence))
        }
        ActionKind::Command => {
            let command = action.value.trim();
            if command.is_empty() {
                return Err(DispatchError::EmptyCommand(key));
            }
            let pid = launcher
                .launch(command)
                .map_err(|source| DispatchError::Launch {
                    command: command.to_string(),
                    source,
                })?;
            info!("🚀 Launched '{}' (pid {})", command, pid);
            Ok(MacroOutcome::Launched { pid })
        }
        ActionKind::Unknown(kind) => Err(DispatchError::UnknownActionType {
            key,
            kind: kind.clone(),
        }),
    }
}

/// Drain triggers until every sender is gone
///
/// `lookup` fetches the action bound to a key at trigger time, so context
/// switches apply to the very next press.
pub fn run_worker<L, R>(
    rx: Receiver<FunctionKey>,
    sink: &mut dyn KeySink,
    launcher: &dyn Launcher,
    lookup: L,
    mut report: R,
) where
    L: Fn(FunctionKey) -> Option<MacroAction>,
    R: FnMut(FunctionKey, Option<&MacroAction>, &Result<MacroOutcome, DispatchError>),
{
    while let Ok(key) = rx.recv() {
        let action = lookup(key);
        let result = perform(key, action.as_ref(), sink, launcher);
        match &result {
            Ok(outcome) => debug!("{}: {}", key, outcome),
            Err(e) => error!("❌ {}", e),
        }
        report(key, action.as_ref(), &result);
    }
    debug!("Dispatcher queue closed");
}

/// Stand-in sink used when the input system could not be opened
struct UnavailableSink {
    reason: String,
}

impl KeySink for UnavailableSink {
    fn type_text(&mut self, _text: &str) -> Result<(), InjectError> {
        Err(InjectError::Connection(self.reason.clone()))
    }

    fn press(&mut self, _key: Key) -> Result<(), InjectError> {
        Err(InjectError::Connection(self.reason.clone()))
    }

    fn release(&mut self, _key: Key) -> Result<(), InjectError> {
        Ok(())
    }
}

/// Handle feeding the dispatcher worker
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<FunctionKey>,
}

impl Dispatcher {
    /// Spawn the worker thread for the running app
    pub fn spawn(app: AppHandle) -> Self {
        let (tx, rx) = channel();

        let spawned = std::thread::Builder::new()
            .name("macro-dispatcher".to_string())
            .spawn(move || {
                // The injector is created on the worker: it never crosses threads
                let mut injector: Box<dyn KeySink> = match Injector::new() {
                    Ok(injector) => Box::new(injector),
                    Err(e) => {
                        error!("❌ Keyboard injection unavailable: {}", e);
                        Box::new(UnavailableSink {
                            reason: e.to_string(),
                        })
                    }
                };

                let lookup_app = app.clone();
                let lookup = move |key: FunctionKey| {
                    let state = lookup_app.state::<AppState>();
                    state.action_for(key)
                };

                let report = |key: FunctionKey,
                              action: Option<&MacroAction>,
                              result: &Result<MacroOutcome, DispatchError>| {
                    report_outcome(&app, key, action, result)
                };

                run_worker(rx, &mut *injector, &ShellLauncher, lookup, report);
            });

        match spawned {
            Ok(_) => info!("✅ Macro dispatcher started"),
            Err(e) => error!("❌ Failed to start dispatcher thread: {}", e),
        }
        Self { tx }
    }

    /// Queue a key press; never blocks
    pub fn trigger(&self, key: FunctionKey) {
        if self.tx.send(key).is_err() {
            warn!("⚠️  Dispatcher stopped, ignoring {}", key);
        }
    }
}

fn report_outcome(
    app: &AppHandle,
    key: FunctionKey,
    action: Option<&MacroAction>,
    result: &Result<MacroOutcome, DispatchError>,
) {
    let emitted = match (action, result) {
        (_, Ok(MacroOutcome::Unbound)) | (None, _) => return,
        (Some(action), Ok(_)) => events::emit_macro_triggered(
            app,
            MacroTriggeredEvent {
                key: key.to_string(),
                kind: action.kind.to_string(),
                value: action.value.clone(),
            },
        ),
        (Some(_), Err(e)) => events::emit_macro_error(
            app,
            MacroErrorEvent {
                key: key.to_string(),
                message: e.to_string(),
            },
        ),
    };
    if let Err(e) = emitted {
        debug!("{}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::MacroTable;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        typed: Vec<String>,
        pressed: Vec<Key>,
    }

    impl KeySink for RecordingSink {
        fn type_text(&mut self, text: &str) -> Result<(), InjectError> {
            self.typed.push(text.to_string());
            Ok(())
        }

        fn press(&mut self, key: Key) -> Result<(), InjectError> {
            self.pressed.push(key);
            Ok(())
        }

        fn release(&mut self, _key: Key) -> Result<(), InjectError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launched: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Launcher for FakeLauncher {
        fn launch(&self, command: &str) -> std::io::Result<u32> {
            if self.fail {
                return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"));
            }
            self.launched.borrow_mut().push(command.to_string());
            Ok(4242)
        }
    }

    fn table() -> MacroTable {
        MacroTable::from_json(
            r#"{
                "f1": { "type": "text", "value": "\\begin{itemize}" },
                "f2": { "type": "keys", "value": "ctrl+shift+s" },
                "f3": { "type": "command", "value": "  code .  " },
                "f4": { "type": "macro", "value": "x" },
                "f5": { "type": "keys", "value": "ctrl+" },
                "f6": { "type": "command" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_text_action() {
        let (mut sink, launcher, table) = (RecordingSink::default(), FakeLauncher::default(), table());
        let outcome = perform(FunctionKey::F1, table.action_for(FunctionKey::F1), &mut sink, &launcher).unwrap();
        assert_eq!(outcome, MacroOutcome::Typed { chars: 15 });
        assert_eq!(sink.typed, vec!["\\begin{itemize}".to_string()]);
    }

    #[test]
    fn test_keys_action() {
        let (mut sink, launcher, table) = (RecordingSink::default(), FakeLauncher::default(), table());
        let outcome = perform(FunctionKey::F2, table.action_for(FunctionKey::F2), &mut sink, &launcher).unwrap();
        assert!(matches!(outcome, MacroOutcome::SentKeys(_)));
        assert_eq!(sink.pressed, vec![Key::Control, Key::Shift, Key::Char('s')]);
    }

    #[test]
    fn test_command_action() {
        let (mut sink, launcher, table) = (RecordingSink::default(), FakeLauncher::default(), table());
        let outcome = perform(FunctionKey::F3, table.action_for(FunctionKey::F3), &mut sink, &launcher).unwrap();
        assert_eq!(outcome, MacroOutcome::Launched { pid: 4242 });
        assert_eq!(*launcher.launched.borrow(), vec!["code .".to_string()]);
        assert!(sink.typed.is_empty());
    }

    #[test]
    fn test_failures() {
        let (mut sink, launcher, table) = (RecordingSink::default(), FakeLauncher::default(), table());

        let unknown = perform(FunctionKey::F4, table.action_for(FunctionKey::F4), &mut sink, &launcher);
        assert!(matches!(unknown, Err(DispatchError::UnknownActionType { ref kind, .. }) if kind == "macro"));

        let bad_keys = perform(FunctionKey::F5, table.action_for(FunctionKey::F5), &mut sink, &launcher);
        assert!(matches!(bad_keys, Err(DispatchError::InvalidKeys { .. })));

        let empty = perform(FunctionKey::F6, table.action_for(FunctionKey::F6), &mut sink, &launcher);
        assert!(matches!(empty, Err(DispatchError::EmptyCommand(FunctionKey::F6))));

        let failing = FakeLauncher { fail: true, ..Default::default() };
        let launch = perform(FunctionKey::F3, table.action_for(FunctionKey::F3), &mut sink, &failing);
        assert!(matches!(launch, Err(DispatchError::Launch { .. })));

        // nothing reached the keyboard
        assert!(sink.typed.is_empty() && sink.pressed.is_empty());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(MacroOutcome::Typed { chars: 15 }.to_string(), "typed 15 chars");
        assert_eq!(MacroOutcome::Launched { pid: 4242 }.to_string(), "launched pid 4242");
        let sequence = KeySequence::parse("ctrl+shift+s").unwrap();
        assert_eq!(MacroOutcome::SentKeys(sequence).to_string(), "sent ctrl+shift+s");
        assert_eq!(MacroOutcome::Unbound.to_string(), "unbound");
    }

    #[test]
    fn test_unbound_key_does_nothing() {
        let (mut sink, launcher) = (RecordingSink::default(), FakeLauncher::default());
        let outcome = perform(FunctionKey::F12, None, &mut sink, &launcher).unwrap();
        assert_eq!(outcome, MacroOutcome::Unbound);
        assert!(sink.typed.is_empty());
    }

    #[test]
    fn test_unavailable_sink_reports_connection_error() {
        let mut sink = UnavailableSink { reason: "no display".to_string() };
        let result = perform(FunctionKey::F1, table().action_for(FunctionKey::F1), &mut sink, &FakeLauncher::default());
        assert!(matches!(result, Err(DispatchError::Inject(InjectError::Connection(_)))));
    }

    #[test]
    fn test_worker_processes_queue_in_order() {
        let (tx, rx) = channel();
        for key in [FunctionKey::F1, FunctionKey::F9, FunctionKey::F2, FunctionKey::F4] {
            tx.send(key).unwrap();
        }
        drop(tx);

        let table = table();
        let mut sink = RecordingSink::default();
        let launcher = FakeLauncher::default();
        let mut reports = Vec::new();

        run_worker(
            rx,
            &mut sink,
            &launcher,
            |key| table.action_for(key).cloned(),
            |key, _action, result| reports.push((key, result.is_ok())),
        );

        assert_eq!(
            reports,
            vec![
                (FunctionKey::F1, true),
                (FunctionKey::F9, true),
                (FunctionKey::F2, true),
                (FunctionKey::F4, false),
            ]
        );
        assert_eq!(sink.typed.len(), 1);
        assert_eq!(sink.pressed.len(), 3);
    }
}
