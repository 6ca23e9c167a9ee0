use std::collections::{BTreeMap, BTreeSet};

use chart_model::timing::hi_speed_at;
use chart_model::{
    sort_hold_steps, EaseType, HiSpeedChange, HoldNote, HoldStep, HoldStepType, Id, IdAllocator,
    Note, NoteType, MAX_LANE,
};

use super::{Direction, ScoreContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selected {
    Note(Id),
    HiSpeed(Id),
}

fn step_ease(hold: &HoldNote, pos: Option<usize>) -> EaseType {
    pos.map_or(hold.start.ease, |p| hold.steps[p].ease)
}

impl ScoreContext {
    fn selected_items(&self) -> Vec<Selected> {
        self.selected_notes
            .iter()
            .map(|id| Selected::Note(*id))
            .chain(
                self.selected_hi_speed_changes
                    .iter()
                    .map(|id| Selected::HiSpeed(*id)),
            )
            .collect()
    }

    fn item_tick(&self, item: Selected) -> i32 {
        match item {
            Selected::Note(id) => self.score.notes[&id].tick,
            Selected::HiSpeed(id) => self.score.hi_speed_changes[&id].tick,
        }
    }

    fn set_item_tick(&mut self, item: Selected, tick: i32) {
        match item {
            Selected::Note(id) => {
                if let Some(note) = self.score.notes.get_mut(&id) {
                    note.tick = tick;
                }
            }
            Selected::HiSpeed(id) => {
                if let Some(hs) = self.score.hi_speed_changes.get_mut(&id) {
                    hs.tick = tick;
                }
            }
        }
    }

    pub(crate) fn sort_steps_of(&mut self, holds: impl IntoIterator<Item = Id>) {
        for id in holds {
            if let Some(hold) = self.score.hold_notes.get_mut(&id) {
                sort_hold_steps(&self.score.notes, hold);
            }
        }
    }

    /// Deletes the selection. Any selected part of a hold other than a step takes the
    /// whole chain with it.
    pub fn delete_selection(&mut self) {
        if !self.has_selection() {
            return;
        }

        let prev = self.score.clone();
        for id in std::mem::take(&mut self.selected_notes) {
            let Some(note) = self.score.notes.get(&id) else {
                continue;
            };
            let (note_type, hold_id) = (note.note_type, note.hold_id());

            match note_type {
                NoteType::Hold | NoteType::HoldEnd => {
                    if let Some(hold_id) = hold_id {
                        self.score.remove_hold(hold_id);
                    }
                }
                NoteType::HoldMid => {
                    if let Some(hold) = hold_id.and_then(|h| self.score.hold_notes.get_mut(&h)) {
                        hold.steps.retain(|s| s.id != id);
                    }
                    self.score.notes.remove(&id);
                }
                NoteType::Tap | NoteType::Damage => {
                    self.score.notes.remove(&id);
                }
            }
        }

        for id in std::mem::take(&mut self.selected_hi_speed_changes) {
            self.score.hi_speed_changes.remove(&id);
        }

        self.push_history("Delete notes", prev);
    }

    pub fn flip_selection(&mut self) {
        if self.selected_notes.is_empty() {
            return;
        }

        let prev = self.score.clone();
        for id in &self.selected_notes {
            let note = self.score.notes.get_mut(id).expect("selected note");
            note.lane = MAX_LANE as f32 - note.lane - note.width + 1.0;
            note.flick = note.flick.mirrored();
        }

        self.push_history("Flip notes", prev);
    }

    /// Packs the selection into consecutive ticks anchored at its earliest item
    /// (or its latest for [`Direction::Up`]).
    pub fn shrink_selection(&mut self, direction: Direction) {
        if self.selected_notes.len() + self.selected_hi_speed_changes.len() < 2 {
            return;
        }

        let prev = self.score.clone();
        let mut items = self.selected_items();
        items.sort_by_key(|item| self.item_tick(*item));

        let factor = match direction {
            Direction::Up => {
                items.reverse();
                -1
            }
            Direction::Down => 1,
        };

        let first_tick = self.item_tick(items[0]);
        for (i, item) in items.into_iter().enumerate() {
            self.set_item_tick(item, first_tick + i as i32 * factor);
        }

        let holds = self.holds_from_selection();
        self.sort_steps_of(holds);
        self.push_history("Shrink notes", prev);
    }

    /// Collapses each distinct selected tick onto consecutive ticks and adds one hi-speed
    /// change per tick so playback spacing stays as it was.
    pub fn compress_selection(&mut self) {
        let mut buckets: BTreeMap<i32, Vec<Selected>> = BTreeMap::new();
        for item in self.selected_items() {
            buckets.entry(self.item_tick(item)).or_default().push(item);
        }
        if buckets.len() < 2 {
            return;
        }

        let prev = self.score.clone();
        let layer = match self.selected_items()[0] {
            Selected::Note(id) => self.score.notes[&id].layer,
            Selected::HiSpeed(id) => self.score.hi_speed_changes[&id].layer,
        };
        let ticks: Vec<i32> = buckets.keys().copied().collect();
        let first_tick = ticks[0];
        let hi_speed_at_start = hi_speed_at(first_tick, &self.score.hi_speed_changes, layer);
        let mut current_hi_speed = hi_speed_at_start;

        for (i, items) in buckets.values().enumerate() {
            let new_tick = first_tick + i as i32;
            let bucket_layer = match items[0] {
                Selected::Note(id) => self.score.notes[&id].layer,
                Selected::HiSpeed(id) => self.score.hi_speed_changes[&id].layer,
            };

            for item in items {
                match *item {
                    Selected::Note(id) => {
                        self.score.notes.get_mut(&id).expect("selected note").tick = new_tick;
                    }
                    Selected::HiSpeed(id) => {
                        // replaced by the synthesized change below
                        if let Some(hs) = self.score.hi_speed_changes.remove(&id) {
                            current_hi_speed = hs.speed;
                        }
                        self.selected_hi_speed_changes.remove(&id);
                    }
                }
            }

            let speed = match ticks.get(i + 1) {
                Some(next_tick) => (next_tick - ticks[i]) as f32 * current_hi_speed,
                None => hi_speed_at_start,
            };
            let id = self.ids.next_hi_speed();
            self.score.hi_speed_changes.insert(
                id,
                HiSpeedChange {
                    id,
                    tick: new_tick,
                    speed,
                    layer: bucket_layer,
                },
            );
            self.selected_hi_speed_changes.insert(id);
        }

        let holds = self.holds_from_selection();
        self.sort_steps_of(holds);
        self.push_history("Compress notes", prev);
    }

    /// Joins a hold end with the start of a later hold; the later chain is folded into
    /// the earlier one and the meeting points become two steps.
    pub fn connect_holds_in_selection(&mut self) {
        let Some((end_id, start_id)) = self.connect_pair() else {
            return;
        };

        let prev = self.score.clone();
        let earlier_note = self.score.notes[&end_id].clone();
        let later_note = self.score.notes[&start_id].clone();
        let Some(earlier_id) = earlier_note.parent_id else {
            return;
        };
        let later_hold = self
            .score
            .hold_notes
            .remove(&start_id)
            .expect("hold start without hold");

        let earlier_start = self.score.notes[&earlier_id].clone();
        let critical = earlier_start.critical;
        let earlier_is_guide = self.score.hold_notes[&earlier_id].is_guide();

        let later_end = self
            .score
            .notes
            .get_mut(&later_hold.end)
            .expect("hold end note");
        later_end.critical =
            critical || ((later_end.is_flick() || later_end.friction) && later_end.critical);
        later_end.parent_id = Some(earlier_id);

        let mut steps = Vec::with_capacity(later_hold.steps.len() + 2);
        for step in &later_hold.steps {
            let mut step = *step;
            if earlier_is_guide {
                step.step_type = HoldStepType::Hidden;
            }
            let note = self.score.notes.get_mut(&step.id).expect("step note");
            note.critical = critical;
            note.parent_id = Some(earlier_id);
            steps.push(step);
        }

        let as_mid = |from: &Note, ids: &mut IdAllocator| {
            let mut mid = Note::new(NoteType::HoldMid, from.tick, from.lane, from.width);
            mid.id = ids.next_note();
            mid.critical = critical;
            mid.parent_id = Some(earlier_id);
            mid.layer = earlier_start.layer;
            mid
        };
        let earlier_mid = as_mid(&earlier_note, &mut self.ids);
        let later_mid = as_mid(&later_note, &mut self.ids);

        let (earlier_type, later_type) = if earlier_is_guide {
            (HoldStepType::Hidden, HoldStepType::Hidden)
        } else {
            (HoldStepType::Normal, later_hold.start.step_type)
        };
        steps.push(HoldStep::new(earlier_mid.id, earlier_type, EaseType::Linear));
        steps.push(HoldStep::new(later_mid.id, later_type, later_hold.start.ease));

        let new_selection = [earlier_mid.id, later_mid.id];
        self.score.notes.insert(earlier_mid.id, earlier_mid);
        self.score.notes.insert(later_mid.id, later_mid);
        self.score.notes.remove(&end_id);
        self.score.notes.remove(&start_id);

        let hold = self
            .score
            .hold_notes
            .get_mut(&earlier_id)
            .expect("earlier hold");
        hold.end = later_hold.end;
        hold.steps.extend(steps);
        sort_hold_steps(&self.score.notes, hold);

        self.selected_notes = new_selection.into_iter().collect();
        self.selected_hi_speed_changes.clear();
        self.push_history("Connect holds", prev);
    }

    /// Cuts a hold at the selected step into two chains meeting at that point.
    pub fn split_hold_in_selection(&mut self) {
        if self.selected_notes.len() != 1 {
            return;
        }

        let Some(&id) = self.selected_notes.first() else {
            return;
        };
        let note = self.score.notes[&id].clone();
        if note.note_type != NoteType::HoldMid {
            return;
        }
        let Some(hold_id) = note.parent_id else {
            return;
        };
        let Some(pos) = self.score.hold_notes[&hold_id].step_index(id) else {
            return;
        };

        let prev = self.score.clone();
        let hold_start = self.score.notes[&hold_id].clone();

        let mut new_end = Note::new(NoteType::HoldEnd, note.tick, note.lane, note.width);
        new_end.id = self.ids.next_note();
        new_end.parent_id = Some(hold_id);
        new_end.critical = note.critical;
        new_end.layer = hold_start.layer;

        let mut new_start = Note::new(NoteType::Hold, note.tick, note.lane, note.width);
        new_start.id = self.ids.next_note();
        new_start.critical = hold_start.critical;
        new_start.layer = hold_start.layer;

        let hold = self
            .score
            .hold_notes
            .get_mut(&hold_id)
            .expect("hold of split step");
        let mut new_hold = HoldNote::new(new_start.id, hold.end);
        new_hold.start.ease = hold.steps[pos].ease;
        new_hold.start_type = hold.start_type;
        new_hold.end_type = hold.end_type;
        new_hold.fade_type = hold.fade_type;
        new_hold.guide_color = hold.guide_color;
        new_hold.steps = hold.steps.split_off(pos + 1);
        hold.steps.truncate(pos);
        hold.end = new_end.id;

        for reparented in new_hold.note_ids().skip(1) {
            if let Some(n) = self.score.notes.get_mut(&reparented) {
                n.parent_id = Some(new_start.id);
            }
        }

        let new_selection = [new_start.id, new_end.id];
        self.score.notes.remove(&id);
        self.score.notes.insert(new_end.id, new_end);
        self.score.notes.insert(new_start.id, new_start);
        self.score.hold_notes.insert(new_hold.start.id, new_hold);
        self.sort_steps_of(new_selection.iter().copied().chain([hold_id]));

        self.selected_notes = new_selection.into_iter().collect();
        self.selected_hi_speed_changes.clear();
        self.push_history("Split hold", prev);
    }

    /// Tiles the selected run of eased points along the rest of their hold. The last
    /// replica of the last point moves the hold end. Lanes running past the edge are
    /// clamped.
    pub fn repeat_mids_in_selection(&mut self) {
        let mut pattern: Vec<Id> = self
            .selected_notes
            .iter()
            .copied()
            .filter(|id| self.score.notes[id].has_ease())
            .collect();
        if pattern.len() < 3 {
            return;
        }

        let hold_ids: BTreeSet<Id> = pattern.iter().filter_map(|id| self.hold_id_of(*id)).collect();
        let Some(&hold_id) = hold_ids.first() else {
            return;
        };
        if hold_ids.len() != 1 {
            return;
        }

        pattern.sort_by_key(|id| self.score.notes[id].tick);
        let pattern_start = self.score.notes[&pattern[0]].clone();
        let pattern_end = self.score.notes[&pattern[pattern.len() - 1]].clone();
        let pattern_height = pattern_end.tick - pattern_start.tick;
        if pattern_height <= 0 {
            return;
        }

        let prev = self.score.clone();
        let mut hold = self.score.hold_notes[&hold_id].clone();
        let chain_start = self.score.notes[&hold_id].clone();
        let end_tick = self.score.notes[&hold.end].tick;
        let iterations = (end_tick - chain_start.tick) / pattern_height;

        let start_pos = hold.step_index(pattern_start.id);
        if let Some(end_pos) = hold.step_index(pattern_end.id) {
            hold.steps[end_pos].ease = step_ease(&hold, start_pos);
        }

        let (min_lane, max_lane) = self.score.lane_bounds();
        let max_lane = max_lane + 1.0;
        let lane_delta = pattern_end.lane - pattern_start.lane;
        let last = pattern.len() - 1;

        let mut new_steps = Vec::new();
        for (j, rep_id) in pattern.iter().enumerate().skip(1) {
            let rep = self.score.notes[rep_id].clone();
            let j_pos = hold.step_index(rep.id);

            for i in 1..iterations {
                let lane = (rep.lane + i as f32 * lane_delta)
                    .min(max_lane - rep.width)
                    .max(min_lane);
                let tick = rep.tick + pattern_height * i;

                if j == last && i == iterations - 1 {
                    let end = self.score.notes.get_mut(&hold.end).expect("hold end note");
                    end.tick = tick;
                    end.lane = lane;
                    end.width = rep.width;
                    continue;
                }

                let mut mid = Note::new(NoteType::HoldMid, tick, lane, rep.width);
                mid.id = self.ids.next_note();
                mid.critical = chain_start.critical;
                mid.parent_id = Some(hold_id);
                mid.layer = rep.layer;

                let step_type = match j_pos {
                    Some(p) => hold.steps[p].step_type,
                    None => hold.steps.first().map_or(HoldStepType::Normal, |s| s.step_type),
                };
                new_steps.push(HoldStep::new(mid.id, step_type, step_ease(&hold, j_pos)));
                self.score.notes.insert(mid.id, mid);
            }
        }

        hold.steps.extend(new_steps);
        sort_hold_steps(&self.score.notes, &mut hold);
        self.score.hold_notes.insert(hold_id, hold);
        self.push_history("Repeat hold mids", prev);
    }
}
