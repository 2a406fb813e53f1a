//! TeX macro configuration loaded once at service start.
//!
//! The service always knows the built-in macros `\bm` and `\tag`. An optional
//! JSON file of the form `{ "name": ["template", argCount] }` adds macros or
//! replaces built-ins. The merged table is fixed for the service's lifetime
//! and is emitted as a `\def` prelude ahead of every typeset fragment.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest argument count TeX accepts for a `\def`.
pub const MAX_MACRO_ARGUMENTS: u8 = 9;

/// Expansion template and arity of a single macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, u8)", into = "(String, u8)")]
pub struct MacroDefinition {
    /// TeX replacement text; `#1`..`#9` refer to arguments.
    pub template: String,
    /// Number of arguments the macro consumes.
    pub arguments: u8,
}

impl MacroDefinition {
    /// Builds a definition from its template and arity.
    pub fn new(template: impl Into<String>, arguments: u8) -> Self {
        Self {
            template: template.into(),
            arguments,
        }
    }
}

impl From<(String, u8)> for MacroDefinition {
    fn from((template, arguments): (String, u8)) -> Self {
        Self {
            template,
            arguments,
        }
    }
}

impl From<MacroDefinition> for (String, u8) {
    fn from(definition: MacroDefinition) -> Self {
        (definition.template, definition.arguments)
    }
}

/// Errors raised while loading the macro file.
#[derive(Debug, Error)]
pub enum MacroError {
    /// The macro file could not be read.
    #[error("failed to read macro file '{path}': {source}")]
    Read {
        /// Macro file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The macro file was not a JSON object of `[template, count]` pairs.
    #[error("failed to parse macro file '{path}': {source}")]
    Parse {
        /// Macro file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A macro name contained characters other than ASCII letters.
    #[error("invalid macro name '{name}': names must be ASCII letters")]
    InvalidName {
        /// Offending name.
        name: String,
    },
    /// A macro declared more arguments than TeX allows.
    #[error("macro '{name}' declares {count} arguments; at most {MAX_MACRO_ARGUMENTS} are allowed")]
    TooManyArguments {
        /// Macro name.
        name: String,
        /// Declared argument count.
        count: u8,
    },
}

/// Merged set of macros known to the typesetting engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroTable {
    entries: BTreeMap<String, MacroDefinition>,
}

impl Default for MacroTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MacroTable {
    /// Macros available without any configuration.
    pub fn builtin() -> Self {
        let entries = BTreeMap::from([
            (
                "bm".to_owned(),
                MacroDefinition::new("\\boldsymbol{#1}", 1),
            ),
            (
                "tag".to_owned(),
                MacroDefinition::new("\\qquad\\text{(#1)}", 1),
            ),
        ]);
        Self { entries }
    }

    /// Loads the built-ins merged with the optional macro file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not valid JSON, or declares an
    /// invalid macro.
    pub fn load(path: Option<&Path>) -> Result<Self, MacroError> {
        let mut table = Self::builtin();
        if let Some(path) = path {
            let content = fs::read_to_string(path).map_err(|source| MacroError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let overrides: BTreeMap<String, MacroDefinition> = serde_json::from_str(&content)
                .map_err(|source| MacroError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            table.merge(overrides)?;
        }
        Ok(table)
    }

    /// Adds or replaces macros after validating them.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid name or arity; the table is left unchanged.
    pub fn merge(&mut self, overrides: BTreeMap<String, MacroDefinition>) -> Result<(), MacroError> {
        for (name, definition) in &overrides {
            validate(name, definition)?;
        }
        self.entries.extend(overrides);
        Ok(())
    }

    /// Looks up a macro by name.
    pub fn get(&self, name: &str) -> Option<&MacroDefinition> {
        self.entries.get(name)
    }

    /// Number of known macros.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the table as TeX `\def` statements.
    pub fn prelude(&self) -> String {
        let mut prelude = String::new();
        for (name, definition) in &self.entries {
            prelude.push_str("\\def\\");
            prelude.push_str(name);
            for index in 1..=definition.arguments {
                prelude.push('#');
                prelude.push_str(&index.to_string());
            }
            prelude.push('{');
            prelude.push_str(&definition.template);
            prelude.push('}');
        }
        prelude
    }
}

fn validate(name: &str, definition: &MacroDefinition) -> Result<(), MacroError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(MacroError::InvalidName {
            name: name.to_owned(),
        });
    }
    if definition.arguments > MAX_MACRO_ARGUMENTS {
        return Err(MacroError::TooManyArguments {
            name: name.to_owned(),
            count: definition.arguments,
        });
    }
    Ok(())
}
