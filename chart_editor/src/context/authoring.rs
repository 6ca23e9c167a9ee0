use chart_model::{
    sort_hold_steps, EaseType, HiSpeedChange, HoldNote, HoldStep, HoldStepType, Id, Layer, Note,
    NoteType, Tempo, TimeSignature, Waypoint,
};

use super::ScoreContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub tick: i32,
    pub lane: f32,
    pub width: f32,
}

impl Placement {
    pub fn new(tick: i32, lane: f32, width: f32) -> Self {
        Self { tick, lane, width }
    }
}

impl ScoreContext {
    fn place(&mut self, note_type: NoteType, at: Placement) -> Note {
        let (min_lane, max_lane) = self.score.lane_bounds();
        let width = at.width.max(1.0);
        let lane = at.lane.min(max_lane - width + 1.0).max(min_lane);

        let mut note = Note::new(note_type, at.tick.max(0), lane, width);
        note.id = self.ids.next_note();
        note.layer = self.selected_layer;
        note
    }

    /// Adds a tap, or a damage note when `damage` is set. Returns the new id.
    pub fn insert_tap(
        &mut self,
        tick: i32,
        lane: f32,
        width: f32,
        critical: bool,
        damage: bool,
    ) -> Id {
        let prev = self.score.clone();
        let note_type = if damage { NoteType::Damage } else { NoteType::Tap };
        let mut note = self.place(note_type, Placement::new(tick, lane, width));
        note.critical = critical && !damage;

        let id = note.id;
        self.score.notes.insert(id, note);
        self.push_history("Insert notes", prev);
        id
    }

    /// Adds a two-point hold. The earlier placement becomes the start.
    pub fn insert_hold(&mut self, start: Placement, end: Placement) -> Id {
        let (start, end) = if end.tick < start.tick {
            (end, start)
        } else {
            (start, end)
        };

        let prev = self.score.clone();
        let start = self.place(NoteType::Hold, start);
        let mut end = self.place(NoteType::HoldEnd, end);
        end.parent_id = Some(start.id);

        let id = start.id;
        self.score.hold_notes.insert(id, HoldNote::new(id, end.id));
        self.score.notes.insert(id, start);
        self.score.notes.insert(end.id, end);
        self.push_history("Insert hold", prev);
        id
    }

    /// Adds a step to an existing hold. `None` when `hold_id` is not a hold.
    pub fn insert_hold_mid(&mut self, hold_id: Id, tick: i32, lane: f32, width: f32) -> Option<Id> {
        let start = self.score.notes.get(&hold_id)?;
        if !self.score.hold_notes.contains_key(&hold_id) {
            return None;
        }
        let (critical, layer) = (start.critical, start.layer);

        let prev = self.score.clone();
        let mut mid = self.place(NoteType::HoldMid, Placement::new(tick, lane, width));
        mid.critical = critical;
        mid.layer = layer;
        mid.parent_id = Some(hold_id);

        let id = mid.id;
        let step_type = if self.score.hold_notes[&hold_id].is_guide() {
            HoldStepType::Hidden
        } else {
            HoldStepType::Normal
        };
        self.score.notes.insert(id, mid);
        let hold = self.score.hold_notes.get_mut(&hold_id)?;
        hold.steps.push(HoldStep::new(id, step_type, EaseType::Linear));
        sort_hold_steps(&self.score.notes, hold);

        self.push_history("Insert hold step", prev);
        Some(id)
    }

    pub fn insert_hi_speed_change(&mut self, tick: i32, speed: f32) -> Id {
        let prev = self.score.clone();
        let id = self.ids.next_hi_speed();
        self.score.hi_speed_changes.insert(
            id,
            HiSpeedChange {
                id,
                tick: tick.max(0),
                speed,
                layer: self.selected_layer,
            },
        );
        self.push_history("Insert hi-speed", prev);
        id
    }

    /// Sets the tempo from `tick` on, replacing a change already at that tick.
    pub fn set_tempo(&mut self, tick: i32, bpm: f32) {
        if bpm <= 0.0 {
            return;
        }

        let prev = self.score.clone();
        let tempos = &mut self.score.tempo_changes;
        match tempos.iter_mut().find(|t| t.tick == tick) {
            Some(tempo) => tempo.bpm = bpm,
            None => {
                tempos.push(Tempo { tick, bpm });
                tempos.sort_by_key(|t| t.tick);
            }
        }
        self.push_history("Change tempo", prev);
    }

    pub fn set_time_signature(&mut self, measure: i32, numerator: i32, denominator: i32) {
        if measure < 0 || numerator <= 0 || denominator <= 0 {
            return;
        }

        let prev = self.score.clone();
        self.score.time_signatures.insert(
            measure,
            TimeSignature {
                measure,
                numerator,
                denominator,
            },
        );
        self.push_history("Change time signature", prev);
    }

    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        let prev = self.score.clone();
        self.score.layers.push(Layer::named(name));
        self.selected_layer = self.score.layers.len() - 1;
        self.push_history("Add layer", prev);
        self.selected_layer
    }

    pub fn toggle_layer_hidden(&mut self, layer: usize) {
        if layer >= self.score.layers.len() {
            return;
        }

        let prev = self.score.clone();
        let layer = &mut self.score.layers[layer];
        layer.hidden = !layer.hidden;
        self.push_history("Toggle layer", prev);
    }

    pub fn add_waypoint(&mut self, name: impl Into<String>, tick: i32) {
        let prev = self.score.clone();
        self.score.waypoints.push(Waypoint {
            name: name.into(),
            tick,
        });
        self.score.waypoints.sort_by_key(|w| w.tick);
        self.push_history("Add waypoint", prev);
    }
}
