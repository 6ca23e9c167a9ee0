//! Reusable note patterns saved as clipboard data, one JSON file per preset.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use chart_model::{Id, Score};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clipboard::{selection_min_tick, selection_to_data, ClipboardData};
use crate::{EditError, ScoreContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data: ClipboardData,
}

impl NotesPreset {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let path = path.as_ref();
        let file = path.display().to_string();
        let src = fs::read_to_string(path).map_err(|e| {
            EditError::new("E2001", format!("failed to read preset: {e}")).with_file(file.clone())
        })?;
        serde_json::from_str(&src).map_err(|e| {
            EditError::new("E2003", format!("invalid preset json: {e}")).with_file(file)
        })
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), EditError> {
        let path = path.as_ref();
        let write_err = |e: String| {
            EditError::new("E2002", format!("failed to write preset: {e}"))
                .with_file(path.display().to_string())
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, json).map_err(|e| write_err(e.to_string()))
    }
}

/// Preset store shared between threads; every method takes `&self`.
#[derive(Debug, Default)]
pub struct PresetManager {
    next_id: AtomicU64,
    presets: Mutex<BTreeMap<u64, NotesPreset>>,
    removed: Mutex<Vec<String>>,
}

/// Replaces characters that are not allowed in file names with `_`.
pub fn fix_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

impl PresetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.presets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<u64> {
        self.presets.lock().keys().copied().collect()
    }

    pub fn get(&self, id: u64) -> Option<NotesPreset> {
        self.presets.lock().get(&id).cloned()
    }

    fn insert(&self, preset: NotesPreset) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.presets.lock().insert(id, preset);
        id
    }

    /// Stores the selection as a new preset. `None` when nothing is selected.
    pub fn create_preset(
        &self,
        score: &Score,
        selected_notes: &BTreeSet<Id>,
        selected_hi_speeds: &BTreeSet<Id>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Option<u64> {
        let base_tick = selection_min_tick(score, selected_notes, selected_hi_speeds)?;
        let data = selection_to_data(score, selected_notes, selected_hi_speeds, base_tick);
        Some(self.insert(NotesPreset {
            name: name.into(),
            description: description.into(),
            data,
        }))
    }

    pub fn remove_preset(&self, id: u64) -> Result<NotesPreset, EditError> {
        let preset = self
            .presets
            .lock()
            .remove(&id)
            .ok_or_else(|| EditError::new("E4001", format!("unknown preset {id}")))?;
        self.removed.lock().push(fix_filename(&preset.name));
        Ok(preset)
    }

    /// Stages the preset as a paste on `context`; confirming it is up to the caller.
    pub fn apply_preset(&self, id: u64, context: &mut ScoreContext) -> Result<(), EditError> {
        let preset = self
            .get(id)
            .ok_or_else(|| EditError::new("E4001", format!("unknown preset {id}")))?;
        context.stage_paste(&preset.data, false);
        info!(
            preset = %preset.name,
            staged = context.paste_data().len(),
            "applied preset"
        );
        Ok(())
    }

    /// Loads every `*.json` preset in `dir`. Unreadable files are skipped.
    /// Returns how many presets were loaded.
    pub fn load_presets(&self, dir: impl AsRef<Path>) -> Result<usize, EditError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            EditError::new("E2001", format!("failed to list presets: {e}"))
                .with_file(dir.display().to_string())
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match NotesPreset::read(&path) {
                Ok(preset) => {
                    self.insert(preset);
                    loaded += 1;
                }
                Err(e) => warn!("skipping preset: {e}"),
            }
        }
        Ok(loaded)
    }

    /// Writes every preset to `dir` and deletes files of presets removed since the last save.
    pub fn save_presets(&self, dir: impl AsRef<Path>) -> Result<(), EditError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            EditError::new("E2002", format!("failed to create preset directory: {e}"))
                .with_file(dir.display().to_string())
        })?;

        let removed: Vec<String> = self.removed.lock().drain(..).collect();
        for name in removed {
            let path = dir.join(format!("{name}.json"));
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    EditError::new("E2002", format!("failed to delete preset: {e}"))
                        .with_file(path.display().to_string())
                })?;
            }
        }

        let presets = self.presets.lock();
        for preset in presets.values() {
            preset.write(dir.join(format!("{}.json", fix_filename(&preset.name))))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorConfig;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("chart_presets_{}_{tag}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn context_with_tap() -> ScoreContext {
        let mut context = ScoreContext::new(EditorConfig::default());
        let id = context.insert_tap(960, 4.0, 3.0, true, false);
        context.select_notes([id]);
        context
    }

    #[test]
    fn fix_filename_replaces_illegal_characters() {
        assert_eq!(fix_filename("a/b:c*?\"<>|d"), "a_b_c______d");
        assert_eq!(fix_filename("stairs L"), "stairs L");
    }

    #[test]
    fn create_and_apply_stages_a_paste() {
        let mut context = context_with_tap();
        let presets = PresetManager::new();
        let id = presets
            .create_preset(
                context.score(),
                context.selected_notes(),
                context.selected_hi_speed_changes(),
                "one tap",
                "",
            )
            .unwrap();

        assert_eq!(presets.get(id).unwrap().data.notes[0].tick, 0);
        presets.apply_preset(id, &mut context).unwrap();
        assert!(context.paste_data().pasting);
        assert_eq!(context.paste_data().notes.len(), 1);
    }

    #[test]
    fn concurrent_creation_hands_out_distinct_ids() {
        let context = context_with_tap();
        let presets = PresetManager::new();
        let (score, notes, hi_speeds) = (
            context.score(),
            context.selected_notes(),
            context.selected_hi_speed_changes(),
        );
        let presets = &presets;
        let create = move |name: String| {
            presets
                .create_preset(score, notes, hi_speeds, name, "")
                .unwrap()
        };

        let mut ids: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    scope.spawn(move || {
                        (0..8)
                            .map(|i| create(format!("{t}-{i}")))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(presets.len(), 32);

        presets.remove_preset(ids[0]).unwrap();
        assert_eq!(create("again".to_string()), 32);
    }

    #[test]
    fn empty_selection_creates_nothing() {
        let context = ScoreContext::default();
        let presets = PresetManager::new();
        let id = presets.create_preset(
            context.score(),
            context.selected_notes(),
            context.selected_hi_speed_changes(),
            "none",
            "",
        );
        assert_eq!(id, None);
    }

    #[test]
    fn unknown_preset_is_e4001() {
        let presets = PresetManager::new();
        let mut context = ScoreContext::default();
        assert_eq!(presets.apply_preset(7, &mut context).unwrap_err().code, "E4001");
        assert_eq!(presets.remove_preset(7).unwrap_err().code, "E4001");
    }

    #[test]
    fn save_load_and_remove_files() {
        let dir = temp_dir("roundtrip");
        let context = context_with_tap();
        let presets = PresetManager::new();
        let id = presets
            .create_preset(
                context.score(),
                context.selected_notes(),
                context.selected_hi_speed_changes(),
                "left/right",
                "mirrored",
            )
            .unwrap();
        presets.save_presets(&dir).unwrap();
        assert!(dir.join("left_right.json").exists());

        let reloaded = PresetManager::new();
        assert_eq!(reloaded.load_presets(&dir).unwrap(), 1);
        let preset = reloaded.get(reloaded.ids()[0]).unwrap();
        assert_eq!(preset.description, "mirrored");
        assert_eq!(preset.data, presets.get(id).unwrap().data);

        presets.remove_preset(id).unwrap();
        presets.save_presets(&dir).unwrap();
        assert!(!dir.join("left_right.json").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn broken_files_are_skipped() {
        let dir = temp_dir("broken");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bad.json"), "{").unwrap();
        let presets = PresetManager::new();
        assert_eq!(presets.load_presets(&dir).unwrap(), 0);
        let _ = fs::remove_dir_all(&dir);
    }
}
