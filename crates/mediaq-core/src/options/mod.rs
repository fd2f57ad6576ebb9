//! Engine option sets and the user-supplied overlay.
//!
//! Users pass extra engine flags as one CLI-style string. It is parsed up
//! front into an [`OptionOverlay`] and merged onto the per-type defaults
//! ([`EngineOptions`]) before anything is handed to the engine. Overlay keys
//! win on conflict; the repeated header flag accumulates instead.

mod defaults;
mod parse;

use std::collections::BTreeMap;

pub use defaults::default_options;
pub use parse::{parse_overlay, OptionParseError};

/// Flag that may be given several times and accumulates into a list.
pub const REPEATED_FLAG: &str = "add_header";

/// Value of one engine option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Boolean switch; `false` is not rendered at all.
    Switch(bool),
    Value(String),
    List(Vec<String>),
}

/// One parsed overlay token group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEntry {
    /// `--flag` with no value.
    Flag(String),
    /// `--key value` or `--key=value`.
    Valued(String, String),
    /// A value for [`REPEATED_FLAG`].
    Repeated(String, String),
}

/// Parsed user overlay, in the order the flags were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionOverlay {
    entries: Vec<OverlayEntry>,
}

impl OptionOverlay {
    pub fn new(entries: Vec<OverlayEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Full option set for one engine invocation, keyed by underscore-folded flag name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: OptionValue) -> &mut Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn switch(&mut self, key: impl Into<String>, on: bool) -> &mut Self {
        self.set(key, OptionValue::Switch(on))
    }

    pub fn value(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set(key, OptionValue::Value(value.into()))
    }

    /// Append to a list option, promoting a single value to a list.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        let slot = self
            .entries
            .entry(key.into())
            .or_insert_with(|| OptionValue::List(Vec::new()));
        match slot {
            OptionValue::List(items) => items.push(value),
            OptionValue::Value(existing) => {
                *slot = OptionValue::List(vec![std::mem::take(existing), value]);
            }
            OptionValue::Switch(_) => *slot = OptionValue::List(vec![value]),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Apply `overlay` on top of these options. Overlay keys replace existing
    /// values; repeated-flag values are appended.
    pub fn merge(&mut self, overlay: &OptionOverlay) {
        for entry in overlay.entries() {
            match entry {
                OverlayEntry::Flag(key) => {
                    self.switch(key.clone(), true);
                }
                OverlayEntry::Valued(key, value) => {
                    self.value(key.clone(), value.clone());
                }
                OverlayEntry::Repeated(key, value) => {
                    self.push(key.clone(), value.clone());
                }
            }
        }
    }

    /// Same as [`merge`](Self::merge) but consumes and returns `self`.
    pub fn merged(mut self, overlay: &OptionOverlay) -> Self {
        self.merge(overlay);
        self
    }

    /// Render as engine command-line arguments (`output_template` -> `--output-template`).
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (key, value) in &self.entries {
            let flag = format!("--{}", key.replace('_', "-"));
            match value {
                OptionValue::Switch(true) => args.push(flag),
                OptionValue::Switch(false) => {}
                OptionValue::Value(v) => {
                    args.push(flag);
                    args.push(v.clone());
                }
                OptionValue::List(items) => {
                    for v in items {
                        args.push(flag.clone());
                        args.push(v.clone());
                    }
                }
            }
        }
        args
    }
}
