// Macro file loading
//
// A macro file is a JSON object mapping key names to action records:
// { "f1": { "type": "text", "value": "System.out.println();" } }

use crate::hotkey::FunctionKey;
use key_inject::KeySequence;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// What a bound key does when pressed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ActionKind {
    /// Type the value as literal text
    Text,
    /// Send the value as a key sequence (`ctrl+shift+s`)
    Keys,
    /// Launch the value through the platform shell
    Command,
    /// Anything else; reported when the key is pressed
    Unknown(String),
}

impl From<String> for ActionKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "text" => ActionKind::Text,
            "keys" => ActionKind::Keys,
            "command" => ActionKind::Command,
            _ => ActionKind::Unknown(kind),
        }
    }
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActionKind::Text => "text",
            ActionKind::Keys => "keys",
            ActionKind::Command => "command",
            ActionKind::Unknown(kind) => kind,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single `{type, value}` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default)]
    pub value: String,
}

/// Macro bindings of one context, keyed by lower-case key name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroTable {
    actions: BTreeMap<String, MacroAction>,
    /// Entries dropped or merged while loading
    notes: Vec<String>,
}

impl MacroTable {
    /// Parse a macro file's JSON content
    ///
    /// Only invalid JSON or a top level that is not an object fails. A
    /// malformed entry is skipped and listed in [`problems`](Self::problems).
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut table = Self::default();
        for (name, value) in raw {
            let key = name.trim().to_lowercase();
            let action = match serde_json::from_value::<MacroAction>(value) {
                Ok(action) => action,
                Err(e) => {
                    table.notes.push(format!("`{}`: skipped, not a macro record ({})", name, e));
                    continue;
                }
            };
            if table.actions.insert(key.clone(), action).is_some() {
                table
                    .notes
                    .push(format!("{}: defined more than once, keeping `{}`", key, name));
            }
        }
        Ok(table)
    }

    /// Look up the action bound to a key name (case-insensitive)
    pub fn get(&self, key_name: &str) -> Option<&MacroAction> {
        self.actions.get(&key_name.to_lowercase())
    }

    pub fn action_for(&self, key: FunctionKey) -> Option<&MacroAction> {
        self.get(key.name())
    }

    /// Function keys that have an action in this table
    pub fn bound_keys(&self) -> Vec<FunctionKey> {
        FunctionKey::ALL
            .into_iter()
            .filter(|key| self.action_for(*key).is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Load-time warnings worth showing the user
    pub fn problems(&self) -> Vec<String> {
        let mut problems = self.notes.clone();
        for (key, action) in &self.actions {
            if key.parse::<FunctionKey>().is_err() {
                problems.push(format!("`{}` is not one of f1..f12 and will never trigger", key));
            }
            match &action.kind {
                ActionKind::Unknown(kind) => {
                    problems.push(format!("{}: unknown action type `{}`", key, kind));
                }
                ActionKind::Keys => {
                    if let Err(e) = KeySequence::parse(&action.value) {
                        problems.push(format!("{}: invalid key sequence `{}` ({})", key, action.value, e));
                    }
                }
                ActionKind::Command if action.value.trim().is_empty() => {
                    problems.push(format!("{}: empty command", key));
                }
                ActionKind::Text if action.value.is_empty() => {
                    problems.push(format!("{}: empty text", key));
                }
                _ => {}
            }
        }
        problems
    }
}

/// A loaded macro file together with its content digest
#[derive(Debug, Clone)]
pub struct MacroFile {
    pub path: PathBuf,
    pub table: MacroTable,
    /// Hex SHA-256 of the file content
    pub digest: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown context `{0}`")]
    UnknownContext(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {} (line {line}, column {column}): {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
}

/// Hex SHA-256 of a byte slice
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Read and parse a macro file
pub fn load_macro_file(path: &Path) -> Result<MacroFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let table = MacroTable::from_json(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })?;

    Ok(MacroFile {
        path: path.to_path_buf(),
        table,
        digest: digest(content.as_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "F1": { "type": "text", "value": "System.out.println();" },
        "f2": { "type": "keys", "value": "ctrl+shift+f" },
        "f3": { "type": "command", "value": "code ." },
        "f4": { "type": "paste" },
        "f5": { "type": "text" }
    }"#;

    #[test]
    fn test_parse_and_normalize_keys() {
        let table = MacroTable::from_json(SAMPLE).unwrap();
        assert_eq!(table.len(), 5);

        let f1 = table.action_for(FunctionKey::F1).unwrap();
        assert_eq!(f1.kind, ActionKind::Text);
        assert_eq!(f1.value, "System.out.println();");

        assert_eq!(table.get("F2").unwrap().kind, ActionKind::Keys);
        assert_eq!(table.get("f3").unwrap().kind, ActionKind::Command);
        assert!(table.action_for(FunctionKey::F12).is_none());
        assert_eq!(
            table.bound_keys(),
            vec![FunctionKey::F1, FunctionKey::F2, FunctionKey::F3, FunctionKey::F4, FunctionKey::F5]
        );
    }

    #[test]
    fn test_unknown_kind_and_missing_value() {
        let table = MacroTable::from_json(SAMPLE).unwrap();

        let f4 = table.get("f4").unwrap();
        assert_eq!(f4.kind, ActionKind::Unknown("paste".to_string()));
        assert_eq!(f4.kind.to_string(), "paste");
        assert_eq!(f4.value, "");

        assert_eq!(table.get("f5").unwrap().value, "");
    }

    #[test]
    fn test_problems_are_reported() {
        let table = MacroTable::from_json(
            r#"{
                "f1": { "type": "keys", "value": "ctrl+nope" },
                "f2": { "type": "shout", "value": "x" },
                "home": { "type": "text", "value": "x" },
                "f3": { "type": "command", "value": "  " },
                "f4": { "type": "text", "value": "ok" }
            }"#,
        )
        .unwrap();

        let problems = table.problems();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("ctrl+nope")));
        assert!(problems.iter().any(|p| p.contains("unknown action type `shout`")));
        assert!(problems.iter().any(|p| p.starts_with("`home`")));
        assert!(problems.iter().any(|p| p.contains("empty command")));
    }

    #[test]
    fn test_not_an_object_is_rejected() {
        assert!(MacroTable::from_json("[]").is_err());
        assert!(MacroTable::from_json(r#""f1""#).is_err());
        assert!(MacroTable::from_json("{ broken").is_err());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let table = MacroTable::from_json(
            r#"{
                "_comment": "java macros",
                "f1": { "type": "text", "value": "ok" },
                "f2": { "value": "no type" },
                "f3": { "type": "text", "value": 42 }
            }"#,
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.action_for(FunctionKey::F1).unwrap().value, "ok");
        assert!(table.action_for(FunctionKey::F2).is_none());
        assert!(table.action_for(FunctionKey::F3).is_none());

        let problems = table.problems();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.starts_with("`_comment`: skipped")));
        assert!(problems.iter().any(|p| p.starts_with("`f2`: skipped")));
        assert!(problems.iter().any(|p| p.starts_with("`f3`: skipped")));
    }

    #[test]
    fn test_case_collision_is_reported() {
        let table = MacroTable::from_json(
            r#"{
                "F1": { "type": "text", "value": "upper" },
                "f1": { "type": "text", "value": "lower" }
            }"#,
        )
        .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.action_for(FunctionKey::F1).unwrap().value, "lower");
        assert_eq!(table.problems(), vec!["f1: defined more than once, keeping `f1`".to_string()]);
    }

    #[test]
    fn test_load_macro_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loaded = load_macro_file(file.path()).unwrap();
        assert_eq!(loaded.table.len(), 5);
        assert_eq!(loaded.digest, digest(SAMPLE.as_bytes()));
        assert_eq!(loaded.digest.len(), 64);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("macros_java.json");
        assert!(matches!(
            load_macro_file(&missing),
            Err(ConfigError::NotFound(p)) if p == missing
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\n  \"f1\": { \"type\": \"text\", }\n}").unwrap();
        match load_macro_file(&broken) {
            Err(ConfigError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_bundled_contexts_load_cleanly() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../contexts");
        for context in crate::settings::default_contexts() {
            let loaded = load_macro_file(&dir.join(&context.file)).unwrap();
            assert!(!loaded.table.is_empty(), "{} has no bindings", context.name);
            assert!(
                loaded.table.problems().is_empty(),
                "{}: {:?}",
                context.name,
                loaded.table.problems()
            );
        }
    }
}
