use std::collections::BTreeSet;

use chart_model::{
    EaseType, FadeType, FlickType, GuideColor, HoldNote, HoldNoteType, HoldStepType, Id, NoteType,
    Score,
};

use super::{PropertyEdit, ScoreContext};

impl ScoreContext {
    pub fn set_step(&mut self, step: PropertyEdit<HoldStepType>) {
        if self.selected_notes.is_empty() {
            return;
        }

        let prev = self.score.clone();
        let mut edit = false;
        for id in self.selected_notes.clone() {
            let note = &self.score.notes[&id];
            if note.note_type != NoteType::HoldMid {
                continue;
            }
            let Some(parent) = note.parent_id else {
                continue;
            };
            let Some(hold) = self.score.hold_notes.get_mut(&parent) else {
                continue;
            };
            if hold.is_guide() {
                continue;
            }
            if let Some(pos) = hold.step_index(id) {
                edit |= step.apply_to(&mut hold.steps[pos].step_type);
            }
        }

        if edit {
            self.push_history("Change step type", prev);
        }
    }

    pub fn set_flick(&mut self, flick: PropertyEdit<FlickType>) {
        if self.selected_notes.is_empty() {
            return;
        }

        let prev = self.score.clone();
        let mut edit = false;
        for id in self.selected_notes.clone() {
            let note = &self.score.notes[&id];
            let can_flick = match note.note_type {
                NoteType::HoldEnd => self
                    .hold_of(note)
                    .is_some_and(|h| h.end_type == HoldNoteType::Normal),
                _ => note.can_flick(),
            };
            if !can_flick {
                continue;
            }
            let start_critical = note
                .parent_id
                .is_some_and(|p| self.score.notes[&p].critical);
            let note = self.score.notes.get_mut(&id).expect("selected note");
            edit |= flick.apply_to(&mut note.flick);
            // a plain end follows the start's criticality
            if note.note_type == NoteType::HoldEnd && !note.is_flick() && !note.friction {
                note.critical = start_critical;
            }
        }

        if edit {
            self.push_history("Change flick", prev);
        }
    }

    pub fn set_ease(&mut self, ease: PropertyEdit<EaseType>) {
        if self.selected_notes.is_empty() {
            return;
        }

        let prev = self.score.clone();
        let mut edit = false;
        for id in self.selected_notes.clone() {
            let note = &self.score.notes[&id];
            let note_type = note.note_type;
            let Some(hold_id) = note.hold_id() else {
                continue;
            };
            let hold = self
                .score
                .hold_notes
                .get_mut(&hold_id)
                .expect("hold part without hold");
            match note_type {
                NoteType::Hold => edit |= ease.apply_to(&mut hold.start.ease),
                NoteType::HoldMid => {
                    if let Some(pos) = hold.step_index(id) {
                        edit |= ease.apply_to(&mut hold.steps[pos].ease);
                    }
                }
                _ => {}
            }
        }

        if edit {
            self.push_history("Change ease", prev);
        }
    }

    /// Changes start/end visibility of normal holds. Guides are left alone and
    /// `Guide` is never assigned here.
    pub fn set_hold_type(&mut self, hold_type: PropertyEdit<HoldNoteType>) {
        if self.selected_notes.is_empty() || hold_type == PropertyEdit::Set(HoldNoteType::Guide) {
            return;
        }

        let prev = self.score.clone();
        let mut edit = false;
        for id in self.selected_notes.clone() {
            let note_type = self.score.notes[&id].note_type;
            if !matches!(note_type, NoteType::Hold | NoteType::HoldEnd) {
                continue;
            }
            let Some(hold_id) = self.hold_id_of(id) else {
                continue;
            };
            let hold = self
                .score
                .hold_notes
                .get_mut(&hold_id)
                .expect("hold part without hold");
            if hold.is_guide() {
                continue;
            }

            let (slot, changed) = if note_type == NoteType::Hold {
                let changed = hold_type.apply_to(&mut hold.start_type);
                (hold.start_type, changed)
            } else {
                let changed = hold_type.apply_to(&mut hold.end_type);
                (hold.end_type, changed)
            };
            edit |= changed;

            // hidden points cannot flick or trace
            if slot != HoldNoteType::Normal {
                let start_critical = self.score.notes[&hold_id].critical;
                let note = self.score.notes.get_mut(&id).expect("selected note");
                note.friction = false;
                if note_type == NoteType::HoldEnd {
                    note.flick = FlickType::None;
                    note.critical = start_critical;
                }
            }
        }

        if edit {
            self.push_history("Change hold", prev);
        }
    }

    pub fn set_fade_type(&mut self, fade: PropertyEdit<FadeType>) {
        let edit = self.edit_selected_guides(|hold| fade.apply_to(&mut hold.fade_type));
        if let Some(prev) = edit {
            self.push_history("Change fade", prev);
        }
    }

    pub fn set_guide_color(&mut self, color: PropertyEdit<GuideColor>) {
        let edit = self.edit_selected_guides(|hold| color.apply_to(&mut hold.guide_color));
        if let Some(prev) = edit {
            self.push_history("Change guide", prev);
        }
    }

    /// Applies `f` once per guide touched through a selected start or end.
    /// Returns the pre-edit score when anything changed.
    fn edit_selected_guides(
        &mut self,
        mut f: impl FnMut(&mut HoldNote) -> bool,
    ) -> Option<Score> {
        if self.selected_notes.is_empty() {
            return None;
        }

        let prev = self.score.clone();
        let mut edit = false;
        let mut seen = BTreeSet::new();
        for id in &self.selected_notes {
            let note = &self.score.notes[id];
            if !matches!(note.note_type, NoteType::Hold | NoteType::HoldEnd) {
                continue;
            }
            let Some(hold_id) = note.hold_id() else {
                continue;
            };
            if !seen.insert(hold_id) {
                continue;
            }
            let Some(hold) = self.score.hold_notes.get_mut(&hold_id) else {
                continue;
            };
            if hold.is_guide() {
                edit |= f(hold);
            }
        }

        edit.then_some(prev)
    }

    pub fn set_layer(&mut self, layer: PropertyEdit<usize>) {
        if self.selected_notes.is_empty() {
            return;
        }

        let layer_count = self.score.layers.len().max(1);
        let prev = self.score.clone();
        let mut edit = false;
        for id in &self.selected_notes {
            let note = self.score.notes.get_mut(id).expect("selected note");
            let target = match layer {
                PropertyEdit::Set(l) => l,
                PropertyEdit::Cycle => (note.layer + 1) % layer_count,
            };
            if note.layer != target {
                note.layer = target;
                edit = true;
            }
        }

        if edit {
            self.push_history("Change layer", prev);
        }
    }

    pub fn toggle_criticals(&mut self) {
        if self.selected_notes.is_empty() {
            return;
        }

        let prev = self.score.clone();
        let mut crit_holds: BTreeSet<Id> = BTreeSet::new();
        for id in self.selected_notes.clone() {
            let note = &self.score.notes[&id];
            match note.note_type {
                NoteType::Damage => {}
                NoteType::Tap => {
                    let note = self.score.notes.get_mut(&id).expect("selected note");
                    note.critical = !note.critical;
                }
                NoteType::HoldEnd if note.is_flick() || note.friction => {
                    // a critical start keeps the whole chain critical
                    let start_critical = note
                        .parent_id
                        .is_some_and(|p| self.score.notes[&p].critical);
                    let note = self.score.notes.get_mut(&id).expect("selected note");
                    note.critical = start_critical || !note.critical;
                }
                _ => {
                    if let Some(hold_id) = note.hold_id() {
                        crit_holds.insert(hold_id);
                    }
                }
            }
        }

        for hold_id in crit_holds {
            let hold = self
                .score
                .hold_notes
                .get_mut(&hold_id)
                .expect("hold part without hold");
            if hold.is_guide() {
                hold.guide_color = if hold.guide_color == GuideColor::Yellow {
                    GuideColor::Green
                } else {
                    GuideColor::Yellow
                };
                continue;
            }

            let critical = !self.score.notes[&hold.start.id].critical;
            for id in hold.note_ids() {
                self.score.notes.get_mut(&id).expect("chain note").critical = critical;
            }
        }

        self.push_history("Change critical note", prev);
    }

    pub fn toggle_friction(&mut self) {
        if self.selected_notes.is_empty() {
            return;
        }

        let prev = self.score.clone();
        let mut edit = false;
        for id in self.selected_notes.clone() {
            let note = &self.score.notes[&id];
            let note_type = note.note_type;
            if note_type == NoteType::HoldMid {
                continue;
            }

            if matches!(note_type, NoteType::Hold | NoteType::HoldEnd) {
                let Some(hold_id) = note.hold_id() else {
                    continue;
                };
                let hold = self
                    .score
                    .hold_notes
                    .get_mut(&hold_id)
                    .expect("hold part without hold");
                if hold.is_guide() {
                    continue;
                }

                if note_type == NoteType::Hold {
                    hold.start_type = HoldNoteType::Normal;
                } else {
                    hold.end_type = HoldNoteType::Normal;
                    let start_critical = self.score.notes[&hold_id].critical;
                    let note = self.score.notes.get_mut(&id).expect("selected note");
                    // a plain end follows the start's criticality
                    if !note.is_flick() && !start_critical {
                        note.critical = false;
                    }
                }
            }

            let note = self.score.notes.get_mut(&id).expect("selected note");
            note.friction = !note.friction;
            edit = true;
        }

        if edit {
            self.push_history("Change trace notes", prev);
        }
    }
}
