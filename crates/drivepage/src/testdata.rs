// Test data - Strongly-typed inputs loaded from a JSON file
//
// The file is parsed with unknown fields rejected and then validated, so a
// malformed record fails at load time with a message naming the problem
// instead of surfacing later as a confusing assertion failure.

use crate::error::{Error, Result};
use crate::pages::ViewMode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete test data record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestData {
    pub folder_naming: FolderNaming,
    pub invalid_urls: Vec<String>,
    pub search_terms: SearchTerms,
    pub timeouts: OperationTimeouts,
    pub view_modes: ViewLabels,
}

/// Folder naming rules enforced by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderNaming {
    /// Names the application must accept
    pub valid_names: Vec<String>,
    /// Every character the application rejects in a folder name
    pub forbidden_characters: String,
    pub max_length: u32,
    /// Regex the name of a duplicate folder must match, e.g. `^.+ \(1\)$`
    pub duplicate_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchTerms {
    pub existing: Vec<String>,
    pub missing: Vec<String>,
}

/// Per-operation timeout overrides in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationTimeouts {
    pub upload_ms: u64,
    pub folder_ms: u64,
    pub search_ms: u64,
}

/// Accessible labels of the view-mode toggle buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewLabels {
    pub grid: String,
    pub list: String,
    pub card: String,
}

impl Default for ViewLabels {
    fn default() -> Self {
        Self {
            grid: "Grid view".to_string(),
            list: "List view".to_string(),
            card: "Card view".to_string(),
        }
    }
}

impl ViewLabels {
    /// Label for `mode`; None for [`ViewMode::Unknown`].
    pub fn label(&self, mode: ViewMode) -> Option<&str> {
        match mode {
            ViewMode::Grid => Some(&self.grid),
            ViewMode::List => Some(&self.list),
            ViewMode::Card => Some(&self.card),
            ViewMode::Unknown => None,
        }
    }
}

/// Source name reported for records parsed from a string.
pub const INLINE_SOURCE: &str = "<inline>";

impl TestData {
    /// Loads and validates the record at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::TestData {
            path: shown.clone(),
            message: format!("cannot read file: {e}"),
        })?;
        let data = Self::parse_record(&raw).map_err(|message| Error::TestData {
            path: shown.clone(),
            message,
        })?;
        tracing::debug!(path = %shown, "loaded test data");
        Ok(data)
    }

    /// Parses and validates a JSON record held in memory.
    ///
    /// Errors are [`Error::TestData`] with the path [`INLINE_SOURCE`].
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_record(raw).map_err(|message| Error::TestData {
            path: INLINE_SOURCE.to_string(),
            message,
        })
    }

    /// Describes the first problem found, if any.
    fn parse_record(raw: &str) -> std::result::Result<Self, String> {
        let data: TestData = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let naming = &self.folder_naming;
        if naming.forbidden_characters.is_empty() {
            return Err("folder_naming.forbidden_characters must not be empty".to_string());
        }
        if naming.valid_names.is_empty() {
            return Err("folder_naming.valid_names must list at least one name".to_string());
        }
        for name in &naming.valid_names {
            if self.contains_forbidden(name) {
                return Err(format!(
                    "folder_naming.valid_names entry '{name}' contains a forbidden character"
                ));
            }
            if name.chars().count() > naming.max_length as usize {
                return Err(format!(
                    "folder_naming.valid_names entry '{name}' exceeds max_length {}",
                    naming.max_length
                ));
            }
        }
        Regex::new(&naming.duplicate_pattern)
            .map_err(|e| format!("folder_naming.duplicate_pattern is not a valid regex: {e}"))?;

        let labels = [
            &self.view_modes.grid,
            &self.view_modes.list,
            &self.view_modes.card,
        ];
        if labels.iter().any(|label| label.trim().is_empty()) {
            return Err("view_modes labels must not be empty".to_string());
        }
        if labels[0] == labels[1] || labels[1] == labels[2] || labels[0] == labels[2] {
            return Err("view_modes labels must be distinct".to_string());
        }
        Ok(())
    }

    /// True if `name` contains at least one forbidden character.
    pub fn contains_forbidden(&self, name: &str) -> bool {
        name.chars()
            .any(|c| self.folder_naming.forbidden_characters.contains(c))
    }

    /// Accessible label of the toggle for `mode`.
    pub fn view_label(&self, mode: ViewMode) -> Option<&str> {
        self.view_modes.label(mode)
    }

    /// Compiled `duplicate_pattern` (validated at load time).
    pub fn duplicate_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.folder_naming.duplicate_pattern)?)
    }

    /// One sample name per forbidden character, each built from `base`.
    pub fn invalid_folder_names(&self, base: &str) -> Vec<String> {
        self.folder_naming
            .forbidden_characters
            .chars()
            .map(|c| format!("{base}{c}"))
            .collect()
    }
}

#[cfg(test)]
pub(crate) const SAMPLE: &str = r#"{
  "folder_naming": {
    "valid_names": ["Reports", "Q3 budget", "notes_2024"],
    "forbidden_characters": "/\\:*?\"<>|",
    "max_length": 255,
    "duplicate_pattern": "^.+ \\(1\\)$"
  },
  "invalid_urls": ["/does-not-exist", "/folders/000000"],
  "search_terms": { "existing": ["Reports"], "missing": ["zz-no-such-item"] },
  "timeouts": { "upload_ms": 30000, "folder_ms": 10000, "search_ms": 10000 },
  "view_modes": { "grid": "Grid view", "list": "List view", "card": "Card view" }
}"#;
