use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::EditError;

/// Editor session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Undo entries kept before the oldest is dropped.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { history_limit: 256 }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EditError> {
        serde_json::from_str(json)
            .map_err(|e| EditError::new("E2003", format!("invalid editor config json: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|e| {
            EditError::new("E2001", format!("failed to read editor config: {e}"))
                .with_file(path.display().to_string())
        })?;
        Self::from_json_str(&src).map_err(|e| e.with_file(path.display().to_string()))
    }
}
