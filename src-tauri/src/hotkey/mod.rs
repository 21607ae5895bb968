// Hotkey module - global hotkey registration and handling

pub mod tauri_backend;

use crate::settings::Hotkeys;
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// One of the twelve macro keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FunctionKey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl FunctionKey {
    pub const ALL: [FunctionKey; 12] = [
        FunctionKey::F1,
        FunctionKey::F2,
        FunctionKey::F3,
        FunctionKey::F4,
        FunctionKey::F5,
        FunctionKey::F6,
        FunctionKey::F7,
        FunctionKey::F8,
        FunctionKey::F9,
        FunctionKey::F10,
        FunctionKey::F11,
        FunctionKey::F12,
    ];

    /// Lower-case name used as the key in macro files
    pub fn name(&self) -> &'static str {
        match self {
            FunctionKey::F1 => "f1",
            FunctionKey::F2 => "f2",
            FunctionKey::F3 => "f3",
            FunctionKey::F4 => "f4",
            FunctionKey::F5 => "f5",
            FunctionKey::F6 => "f6",
            FunctionKey::F7 => "f7",
            FunctionKey::F8 => "f8",
            FunctionKey::F9 => "f9",
            FunctionKey::F10 => "f10",
            FunctionKey::F11 => "f11",
            FunctionKey::F12 => "f12",
        }
    }

    /// Accelerator string understood by the global shortcut plugin
    pub fn accelerator(&self) -> String {
        self.name().to_uppercase()
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.accelerator())
    }
}

impl FromStr for FunctionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        FunctionKey::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| format!("`{}` is not a function key (f1..f12)", s))
    }
}

/// What a registered hotkey does when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Macro(FunctionKey),
    SelectContext,
    ShowHelp,
    Quit,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyAction::Macro(key) => write!(f, "macro {}", key),
            HotkeyAction::SelectContext => f.write_str("context selector"),
            HotkeyAction::ShowHelp => f.write_str("help"),
            HotkeyAction::Quit => f.write_str("quit"),
        }
    }
}

pub type HotkeyCallback = Box<dyn Fn() + Send + Sync + 'static>;

pub type HotkeyHandler = Arc<dyn Fn(HotkeyAction) + Send + Sync>;

/// Seam over the OS global-hotkey library
///
/// Callbacks fire on key press only; releases are ignored.
pub trait ShortcutBackend {
    fn register(&self, accelerator: &str, callback: HotkeyCallback) -> Result<(), String>;
    fn unregister(&self, accelerator: &str) -> Result<(), String>;
    fn unregister_all(&self) -> Result<(), String>;
}

/// Outcome of a registration pass
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub registered: Vec<(String, HotkeyAction)>,
    pub failed: Vec<(String, String)>,
}

/// Collapse whitespace around `+` so "Ctrl + F1" and "Ctrl+F1" compare equal
pub fn normalize_accelerator(accelerator: &str) -> String {
    accelerator
        .split('+')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("+")
}

/// The configured chords that stay registered for the app's lifetime
pub fn bindings(hotkeys: &Hotkeys) -> Vec<(String, HotkeyAction)> {
    vec![
        (hotkeys.context_hotkey.clone(), HotkeyAction::SelectContext),
        (hotkeys.help_hotkey.clone(), HotkeyAction::ShowHelp),
        (hotkeys.quit_hotkey.clone(), HotkeyAction::Quit),
    ]
}

/// Register the context, help and quit chords, routing presses to `handler`
///
/// A hotkey that fails to register (bad accelerator, grabbed by another
/// application, duplicate) is reported and skipped; the rest still work.
pub fn register_hotkeys(
    backend: &dyn ShortcutBackend,
    hotkeys: &Hotkeys,
    handler: HotkeyHandler,
) -> RegistrationReport {
    let mut report = RegistrationReport::default();
    let mut taken: HashMap<String, HotkeyAction> = HashMap::new();

    for (accelerator, action) in bindings(hotkeys) {
        let accelerator = normalize_accelerator(&accelerator);
        if accelerator.is_empty() {
            warn!("⚠️  No hotkey configured for {}", action);
            report.failed.push((accelerator, format!("no hotkey configured for {}", action)));
            continue;
        }

        let dedup_key = accelerator.to_lowercase();
        if let Some(existing) = taken.get(&dedup_key) {
            let reason = format!("already bound to {}", existing);
            warn!("⚠️  Skipping {} for {}: {}", accelerator, action, reason);
            report.failed.push((accelerator, reason));
            continue;
        }

        let handler = Arc::clone(&handler);
        match backend.register(&accelerator, Box::new(move || handler(action))) {
            Ok(()) => {
                taken.insert(dedup_key, action);
                report.registered.push((accelerator, action));
            }
            Err(e) => {
                warn!("⚠️  Failed to register {} for {}: {}", accelerator, action, e);
                report.failed.push((accelerator, e));
            }
        }
    }

    info!(
        "✅ Registered {} global hotkeys ({} failed)",
        report.registered.len(),
        report.failed.len()
    );
    report
}

/// The F-keys currently grabbed for macros
///
/// Only keys bound in the active table are registered, so unbound function
/// keys keep reaching the focused application. Call [`sync`](Self::sync)
/// whenever the active table changes.
pub struct MacroKeys {
    backend: Arc<dyn ShortcutBackend + Send + Sync>,
    handler: HotkeyHandler,
    /// Accelerators already used by the fixed chords (lower-case)
    reserved: HashSet<String>,
    registered: BTreeSet<FunctionKey>,
}

impl MacroKeys {
    pub fn new(
        backend: Arc<dyn ShortcutBackend + Send + Sync>,
        handler: HotkeyHandler,
        chords: &RegistrationReport,
    ) -> Self {
        let reserved = chords
            .registered
            .iter()
            .map(|(accelerator, _)| accelerator.to_lowercase())
            .collect();
        Self {
            backend,
            handler,
            reserved,
            registered: BTreeSet::new(),
        }
    }

    /// Grab exactly the keys in `bound`, releasing the others
    pub fn sync(&mut self, bound: &[FunctionKey]) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        let wanted: BTreeSet<FunctionKey> = bound.iter().copied().collect();

        let stale: Vec<FunctionKey> = self.registered.difference(&wanted).copied().collect();
        for key in stale {
            match self.backend.unregister(&key.accelerator()) {
                Ok(()) => {
                    self.registered.remove(&key);
                }
                Err(e) => warn!("⚠️  Failed to release {}: {}", key, e),
            }
        }

        for key in wanted {
            let accelerator = key.accelerator();
            let action = HotkeyAction::Macro(key);
            if self.registered.contains(&key) {
                report.registered.push((accelerator, action));
                continue;
            }
            if self.reserved.contains(&accelerator.to_lowercase()) {
                warn!("⚠️  Skipping {}: already used by another hotkey", accelerator);
                report.failed.push((accelerator, "already bound to another hotkey".to_string()));
                continue;
            }

            let handler = Arc::clone(&self.handler);
            match self.backend.register(&accelerator, Box::new(move || handler(action))) {
                Ok(()) => {
                    self.registered.insert(key);
                    report.registered.push((accelerator, action));
                }
                Err(e) => {
                    warn!("⚠️  Failed to register {} for {}: {}", accelerator, action, e);
                    report.failed.push((accelerator, e));
                }
            }
        }

        debug!("Macro keys grabbed: {:?}", self.registered);
        report
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// In-memory backend; `press` fires a registered callback
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub registered: Mutex<Vec<(String, HotkeyCallback)>>,
        pub reject: Vec<String>,
    }

    impl FakeBackend {
        pub fn press(&self, accelerator: &str) {
            let registered = self.registered.lock().unwrap();
            let (_, callback) = registered
                .iter()
                .find(|(a, _)| a == accelerator)
                .expect("hotkey not registered");
            callback();
        }

        pub fn accelerators(&self) -> Vec<String> {
            let registered = self.registered.lock().unwrap();
            registered.iter().map(|(a, _)| a.clone()).collect()
        }
    }

    impl ShortcutBackend for FakeBackend {
        fn register(&self, accelerator: &str, callback: HotkeyCallback) -> Result<(), String> {
            if self.reject.iter().any(|r| r == accelerator) {
                return Err("HotKey already registered".to_string());
            }
            self.registered
                .lock()
                .unwrap()
                .push((accelerator.to_string(), callback));
            Ok(())
        }

        fn unregister(&self, accelerator: &str) -> Result<(), String> {
            self.registered.lock().unwrap().retain(|(a, _)| a != accelerator);
            Ok(())
        }

        fn unregister_all(&self) -> Result<(), String> {
            self.registered.lock().unwrap().clear();
            Ok(())
        }
    }
}
