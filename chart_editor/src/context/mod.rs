//! The edit engine. Every mutation of the live score goes through [`ScoreContext`] and
//! ends with at most one history entry.

mod authoring;
mod convert;
mod paste;
mod properties;
mod structure;

pub use authoring::Placement;

use std::collections::BTreeSet;

use chart_model::{Cycle, HoldNote, Id, IdAllocator, Note, NoteType, Score};

use crate::clipboard::{Clipboard, MemoryClipboard, PasteData};
use crate::{EditorConfig, HistoryManager, ScoreStats};

/// A property setter argument: an explicit value, or "advance to the next value".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyEdit<T> {
    Set(T),
    Cycle,
}

impl<T: Cycle + PartialEq> PropertyEdit<T> {
    /// Writes the new value into `slot`; true when it changed.
    pub(crate) fn apply_to(self, slot: &mut T) -> bool {
        match self {
            PropertyEdit::Set(value) => {
                let changed = *slot != value;
                *slot = value;
                changed
            }
            PropertyEdit::Cycle => {
                *slot = slot.next();
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub struct ScoreContext {
    score: Score,
    stats: ScoreStats,
    history: HistoryManager,
    paste_data: PasteData,
    selected_notes: BTreeSet<Id>,
    selected_hi_speed_changes: BTreeSet<Id>,
    selected_layer: usize,
    up_to_date: bool,
    ids: IdAllocator,
    clipboard: Box<dyn Clipboard>,
    config: EditorConfig,
}

impl Default for ScoreContext {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl ScoreContext {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_clipboard(config, Box::new(MemoryClipboard::default()))
    }

    pub fn with_clipboard(config: EditorConfig, clipboard: Box<dyn Clipboard>) -> Self {
        let score = Score::default();
        Self {
            stats: ScoreStats::from_score(&score),
            history: HistoryManager::new(config.history_limit),
            ids: IdAllocator::seeded_from(&score),
            score,
            paste_data: PasteData::default(),
            selected_notes: BTreeSet::new(),
            selected_hi_speed_changes: BTreeSet::new(),
            selected_layer: 0,
            up_to_date: true,
            clipboard,
            config,
        }
    }

    pub fn from_score(score: Score, config: EditorConfig) -> Self {
        let mut context = Self::new(config);
        context.load_score(score);
        context
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn stats(&self) -> &ScoreStats {
        &self.stats
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn paste_data(&self) -> &PasteData {
        &self.paste_data
    }

    pub fn selected_notes(&self) -> &BTreeSet<Id> {
        &self.selected_notes
    }

    pub fn selected_hi_speed_changes(&self) -> &BTreeSet<Id> {
        &self.selected_hi_speed_changes
    }

    pub fn selected_layer(&self) -> usize {
        self.selected_layer
    }

    pub fn set_selected_layer(&mut self, layer: usize) {
        self.selected_layer = layer.min(self.score.layers.len().saturating_sub(1));
    }

    pub fn is_up_to_date(&self) -> bool {
        self.up_to_date
    }

    pub fn mark_saved(&mut self) {
        self.up_to_date = true;
    }

    pub fn clipboard(&self) -> &dyn Clipboard {
        self.clipboard.as_ref()
    }

    /// Replaces the live score with an empty chart and forgets history.
    pub fn new_score(&mut self) {
        self.load_score(Score::default());
    }

    /// Replaces the live score wholesale, e.g. after a codec produced it.
    pub fn load_score(&mut self, score: Score) {
        self.ids.reserve_past(&score);
        self.score = score;
        self.history.clear();
        self.paste_data = PasteData::default();
        self.clear_selection();
        self.selected_hi_speed_changes.clear();
        self.selected_layer = 0;
        self.stats.calculate_stats(&self.score);
        self.up_to_date = true;
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_notes.is_empty() || !self.selected_hi_speed_changes.is_empty()
    }

    pub fn has_hold_in_selection(&self) -> bool {
        self.selected_notes
            .iter()
            .any(|id| self.score.notes[id].is_hold_part())
    }

    /// Start ids of every hold touched by the note selection.
    pub fn holds_from_selection(&self) -> BTreeSet<Id> {
        self.selected_notes
            .iter()
            .filter_map(|id| self.score.notes[id].hold_id())
            .collect()
    }

    pub fn is_note_selected(&self, note: &Note) -> bool {
        self.selected_notes.contains(&note.id)
    }

    pub fn select_all(&mut self) {
        self.selected_notes = self.score.notes.keys().copied().collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected_notes.clear();
    }

    /// Replaces the note selection; unknown ids are dropped.
    pub fn select_notes(&mut self, ids: impl IntoIterator<Item = Id>) {
        self.selected_notes = ids
            .into_iter()
            .filter(|id| self.score.notes.contains_key(id))
            .collect();
    }

    pub fn select_hi_speed_changes(&mut self, ids: impl IntoIterator<Item = Id>) {
        self.selected_hi_speed_changes = ids
            .into_iter()
            .filter(|id| self.score.hi_speed_changes.contains_key(id))
            .collect();
    }

    pub fn undo(&mut self) -> bool {
        let current = self.score.clone();
        let Some(score) = self.history.undo(current) else {
            return false;
        };
        self.replace_from_history(score);
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = self.score.clone();
        let Some(score) = self.history.redo(current) else {
            return false;
        };
        self.replace_from_history(score);
        true
    }

    fn replace_from_history(&mut self, score: Score) {
        self.score = score;
        self.clear_selection();
        self.selected_hi_speed_changes.clear();
        self.up_to_date = false;
        self.stats.calculate_stats(&self.score);
    }

    /// Records `prev` as the state before the edit just applied to the live score.
    pub(crate) fn push_history(&mut self, description: &str, prev: Score) {
        if self.history.push_history(description, prev, &self.score) {
            self.up_to_date = false;
        }
        self.stats.calculate_stats(&self.score);
    }

    pub(crate) fn hold_id_of(&self, id: Id) -> Option<Id> {
        self.score.notes.get(&id).and_then(Note::hold_id)
    }

    fn hold_of(&self, note: &Note) -> Option<&HoldNote> {
        note.hold_id().and_then(|id| self.score.hold_notes.get(&id))
    }

    pub fn selection_has_ease(&self) -> bool {
        self.selected_notes
            .iter()
            .any(|id| self.score.notes[id].has_ease())
    }

    pub fn selection_has_hold(&self) -> bool {
        self.selected_notes
            .iter()
            .any(|id| self.score.notes[id].note_type == NoteType::Hold)
    }

    pub fn selection_has_step(&self) -> bool {
        self.selected_notes
            .iter()
            .any(|id| self.score.notes[id].note_type == NoteType::HoldMid)
    }

    pub fn selection_has_flickable(&self) -> bool {
        self.selected_notes
            .iter()
            .any(|id| self.score.notes[id].can_flick())
    }

    /// Exactly a hold end and a hold start of another chain, the end not later than the start.
    pub fn selection_can_connect(&self) -> bool {
        self.connect_pair().is_some()
    }

    pub(crate) fn connect_pair(&self) -> Option<(Id, Id)> {
        if self.selected_notes.len() != 2 {
            return None;
        }
        let mut it = self.selected_notes.iter();
        let a = &self.score.notes[it.next()?];
        let b = &self.score.notes[it.next()?];

        let (end, start) = match (a.note_type, b.note_type) {
            (NoteType::HoldEnd, NoteType::Hold) => (a, b),
            (NoteType::Hold, NoteType::HoldEnd) => (b, a),
            _ => return None,
        };
        if end.tick > start.tick || end.parent_id == Some(start.id) {
            return None;
        }
        Some((end.id, start.id))
    }

    pub fn selection_can_change_hold_type(&self) -> bool {
        self.selected_notes.iter().any(|id| {
            let note = &self.score.notes[id];
            matches!(note.note_type, NoteType::Hold | NoteType::HoldEnd)
                && self.hold_of(note).is_some_and(|h| !h.is_guide())
        })
    }

    pub fn selection_can_change_fade_type(&self) -> bool {
        self.selected_notes.iter().any(|id| {
            let note = &self.score.notes[id];
            matches!(note.note_type, NoteType::Hold | NoteType::HoldEnd)
                && self.hold_of(note).is_some_and(HoldNote::is_guide)
        })
    }
}
