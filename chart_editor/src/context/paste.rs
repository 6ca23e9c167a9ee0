use std::collections::BTreeMap;

use chart_model::{sort_hold_steps, Id};
use tracing::{debug, info};

use super::ScoreContext;
use crate::clipboard::{
    decode_clipboard, encode_clipboard, selection_min_tick, selection_to_data, ClipboardData,
    PasteData,
};
use crate::EditError;

impl ScoreContext {
    /// The selection as clipboard data with ticks relative to its earliest item.
    pub fn selection_data(&self) -> Option<ClipboardData> {
        let base_tick = selection_min_tick(
            &self.score,
            &self.selected_notes,
            &self.selected_hi_speed_changes,
        )?;
        Some(selection_to_data(
            &self.score,
            &self.selected_notes,
            &self.selected_hi_speed_changes,
            base_tick,
        ))
    }

    /// Writes the selection to the clipboard. Nothing happens without a selection.
    pub fn copy_selection(&mut self) -> Result<(), EditError> {
        let Some(data) = self.selection_data() else {
            return Ok(());
        };
        let text = encode_clipboard(&data)?;
        self.clipboard.set_text(text);
        debug!(
            notes = data.notes.len(),
            holds = data.holds.len(),
            "copied selection"
        );
        Ok(())
    }

    pub fn cut_selection(&mut self) -> Result<(), EditError> {
        if !self.has_selection() {
            return Ok(());
        }
        self.copy_selection()?;
        self.delete_selection();
        Ok(())
    }

    /// Stages the clipboard contents for pasting. Text without the clipboard signature
    /// is ignored.
    pub fn paste(&mut self, flip: bool) -> Result<(), EditError> {
        let Some(text) = self.clipboard.text() else {
            return Ok(());
        };
        let Some(data) = decode_clipboard(&text)? else {
            return Ok(());
        };
        self.stage_paste(&data, flip);
        Ok(())
    }

    pub fn stage_paste(&mut self, data: &ClipboardData, flip: bool) {
        self.paste_data = PasteData::stage(
            data,
            flip,
            self.selected_layer,
            self.score.metadata.lane_extension,
        );
    }

    /// Moves the staged notes; the lane offset is kept inside the staged envelope.
    pub fn set_paste_offset(&mut self, ticks: i32, lane: f32) {
        let paste = &mut self.paste_data;
        paste.offset_ticks = ticks;
        paste.offset_lane = lane.min(paste.max_lane_offset).max(paste.min_lane_offset);
    }

    pub fn cancel_paste(&mut self) {
        self.paste_data = PasteData::default();
    }

    /// Commits the staged paste: every item gets a fresh id, is shifted by the paste
    /// offsets and lands on the current layer. The pasted items become the selection.
    pub fn confirm_paste(&mut self) {
        if !self.paste_data.pasting {
            return;
        }

        let prev = self.score.clone();
        let paste = std::mem::take(&mut self.paste_data);
        let layer = self.selected_layer;
        let mut id_map: BTreeMap<Id, Id> = BTreeMap::new();
        let mut remap = |old: Id| *id_map.entry(old).or_insert_with(|| self.ids.next_note());

        let mut pasted = Vec::with_capacity(paste.notes.len() + paste.damages.len());
        for mut note in paste.notes.into_values().chain(paste.damages.into_values()) {
            note.id = remap(note.id);
            note.parent_id = note.parent_id.map(&mut remap);
            note.tick += paste.offset_ticks;
            note.lane += paste.offset_lane;
            note.layer = layer;
            pasted.push(note.id);
            self.score.notes.insert(note.id, note);
        }

        for mut hold in paste.holds.into_values() {
            hold.start.id = remap(hold.start.id);
            hold.end = remap(hold.end);
            for step in &mut hold.steps {
                step.id = remap(step.id);
            }
            sort_hold_steps(&self.score.notes, &mut hold);
            self.score.hold_notes.insert(hold.start.id, hold);
        }

        let mut pasted_hi_speeds = Vec::with_capacity(paste.hi_speed_changes.len());
        for mut hs in paste.hi_speed_changes.into_values() {
            hs.id = self.ids.next_hi_speed();
            hs.tick += paste.offset_ticks;
            hs.layer = layer;
            pasted_hi_speeds.push(hs.id);
            self.score.hi_speed_changes.insert(hs.id, hs);
        }

        info!(
            notes = pasted.len(),
            hi_speeds = pasted_hi_speeds.len(),
            "pasted"
        );
        self.selected_notes = pasted.into_iter().collect();
        self.selected_hi_speed_changes = pasted_hi_speeds.into_iter().collect();
        self.push_history("Paste notes", prev);
    }

    /// Copies the selection and stages it straight back as a paste.
    pub fn duplicate_selection(&mut self, flip: bool) -> Result<(), EditError> {
        let Some(data) = self.selection_data() else {
            return Ok(());
        };
        self.copy_selection()?;
        self.stage_paste(&data, flip);
        Ok(())
    }
}
