//! Clipboard interchange: `"MikuMikuWorld clipboard\n"` followed by a JSON object with
//! `notes`, `damages`, `holds` and `hiSpeedChanges`, all ticks relative to the earliest
//! selected item.

use std::collections::{BTreeMap, BTreeSet};

use chart_model::{
    sort_hold_steps, EaseType, FadeType, FlickType, GuideColor, HiSpeedChange, HoldNote,
    HoldNoteType, HoldStep, HoldStepType, Id, Note, NoteType, Score, MAX_LANE, MIN_LANE,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::EditError;

pub const CLIPBOARD_SIGNATURE: &str = "MikuMikuWorld clipboard\n";

/// Text clipboard the editor copies to and pastes from.
pub trait Clipboard {
    fn text(&self) -> Option<String>;
    fn set_text(&mut self, text: String);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn text(&self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub tick: i32,
    pub lane: f32,
    pub width: f32,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub friction: bool,
    #[serde(default)]
    pub flick: FlickType,
}

impl NoteEntry {
    fn from_note(note: &Note, base_tick: i32) -> Self {
        Self {
            tick: note.tick - base_tick,
            lane: note.lane,
            width: note.width,
            critical: note.critical,
            friction: note.friction,
            flick: note.flick,
        }
    }

    fn to_note(&self, note_type: NoteType) -> Note {
        let mut note = Note::new(note_type, self.tick, self.lane, self.width);
        note.critical = self.critical;
        note.friction = self.friction;
        note.flick = self.flick;
        note
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldPointEntry {
    #[serde(flatten)]
    pub note: NoteEntry,
    #[serde(rename = "type", default)]
    pub point_type: HoldNoteType,
    #[serde(default)]
    pub ease: EaseType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    #[serde(flatten)]
    pub note: NoteEntry,
    #[serde(rename = "type", default)]
    pub step_type: HoldStepType,
    #[serde(default)]
    pub ease: EaseType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldEntry {
    pub start: HoldPointEntry,
    pub end: HoldPointEntry,
    #[serde(default)]
    pub steps: Vec<StepEntry>,
    #[serde(default)]
    pub fade: FadeType,
    #[serde(default)]
    pub guide: GuideColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiSpeedEntry {
    pub tick: i32,
    pub speed: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardData {
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
    #[serde(default)]
    pub damages: Vec<NoteEntry>,
    #[serde(default)]
    pub holds: Vec<HoldEntry>,
    #[serde(default)]
    pub hi_speed_changes: Vec<HiSpeedEntry>,
}

impl ClipboardData {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
            && self.damages.is_empty()
            && self.holds.is_empty()
            && self.hi_speed_changes.is_empty()
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, EditError> {
        serde_json::from_value(value)
            .map_err(|e| EditError::new("E1002", format!("invalid clipboard entry: {e}")))
    }
}

/// Earliest tick among the selected notes and hi-speed changes.
pub fn selection_min_tick(
    score: &Score,
    notes: &BTreeSet<Id>,
    hi_speeds: &BTreeSet<Id>,
) -> Option<i32> {
    let note_ticks = notes.iter().map(|id| score.notes[id].tick);
    let hs_ticks = hi_speeds.iter().map(|id| score.hi_speed_changes[id].tick);
    note_ticks.chain(hs_ticks).min()
}

/// Serializes a selection; a selected part of a hold copies the whole chain.
pub fn selection_to_data(
    score: &Score,
    notes: &BTreeSet<Id>,
    hi_speeds: &BTreeSet<Id>,
    base_tick: i32,
) -> ClipboardData {
    let mut data = ClipboardData::default();
    let mut copied_holds = BTreeSet::new();

    for id in notes {
        let note = &score.notes[id];
        match note.note_type {
            NoteType::Tap => data.notes.push(NoteEntry::from_note(note, base_tick)),
            NoteType::Damage => data.damages.push(NoteEntry::from_note(note, base_tick)),
            NoteType::Hold | NoteType::HoldMid | NoteType::HoldEnd => {
                let Some(hold_id) = note.hold_id() else {
                    continue;
                };
                if copied_holds.insert(hold_id) {
                    let hold = &score.hold_notes[&hold_id];
                    data.holds.push(hold_to_entry(score, hold, base_tick));
                }
            }
        }
    }

    for id in hi_speeds {
        let hs = &score.hi_speed_changes[id];
        data.hi_speed_changes.push(HiSpeedEntry {
            tick: hs.tick - base_tick,
            speed: hs.speed,
        });
    }

    data
}

fn hold_to_entry(score: &Score, hold: &HoldNote, base_tick: i32) -> HoldEntry {
    let start = &score.notes[&hold.start.id];
    let end = &score.notes[&hold.end];
    HoldEntry {
        start: HoldPointEntry {
            note: NoteEntry::from_note(start, base_tick),
            point_type: hold.start_type,
            ease: hold.start.ease,
        },
        end: HoldPointEntry {
            note: NoteEntry::from_note(end, base_tick),
            point_type: hold.end_type,
            ease: EaseType::Linear,
        },
        steps: hold
            .steps
            .iter()
            .map(|step| StepEntry {
                note: NoteEntry::from_note(&score.notes[&step.id], base_tick),
                step_type: step.step_type,
                ease: step.ease,
            })
            .collect(),
        fade: hold.fade_type,
        guide: hold.guide_color,
    }
}

pub fn encode_clipboard(data: &ClipboardData) -> Result<String, EditError> {
    let json = serde_json::to_string(data)
        .map_err(|e| EditError::new("E1001", format!("failed to serialize clipboard: {e}")))?;
    Ok(format!("{CLIPBOARD_SIGNATURE}{json}"))
}

/// `Ok(None)` when the text is not ours (no signature).
pub fn decode_clipboard(text: &str) -> Result<Option<ClipboardData>, EditError> {
    let Some(body) = text.strip_prefix(CLIPBOARD_SIGNATURE) else {
        return Ok(None);
    };
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        warn!("rejected clipboard payload: {e}");
        EditError::new("E1001", format!("invalid clipboard json: {e}"))
    })?;
    ClipboardData::from_json_value(value).map(Some)
}

/// Notes staged for pasting, numbered with local ids until the paste is confirmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteData {
    pub notes: BTreeMap<Id, Note>,
    pub holds: BTreeMap<Id, HoldNote>,
    pub damages: BTreeMap<Id, Note>,
    pub hi_speed_changes: BTreeMap<Id, HiSpeedChange>,
    pub pasting: bool,
    pub offset_ticks: i32,
    pub offset_lane: f32,
    pub mid_lane: f32,
    pub min_lane_offset: f32,
    pub max_lane_offset: f32,
}

fn mirror(note: &mut Note) {
    note.lane = MAX_LANE as f32 - note.lane - note.width + 1.0;
    note.flick = note.flick.mirrored();
}

impl PasteData {
    /// Builds the staging area from clipboard data. Every staged item goes on `layer`.
    pub fn stage(data: &ClipboardData, flip: bool, layer: usize, lane_extension: i32) -> Self {
        let mut paste = PasteData::default();
        let mut base_id: Id = 0;
        let mut next_id = || {
            let id = base_id;
            base_id += 1;
            id
        };

        for entry in &data.notes {
            let mut note = entry.to_note(NoteType::Tap);
            note.id = next_id();
            note.layer = layer;
            paste.notes.insert(note.id, note);
        }

        for entry in &data.damages {
            let mut note = entry.to_note(NoteType::Damage);
            note.id = next_id();
            note.layer = layer;
            paste.damages.insert(note.id, note);
        }

        for entry in &data.holds {
            let mut start = entry.start.note.to_note(NoteType::Hold);
            start.id = next_id();
            start.layer = layer;

            let mut end = entry.end.note.to_note(NoteType::HoldEnd);
            end.id = next_id();
            end.parent_id = Some(start.id);
            end.layer = layer;

            let mut hold = HoldNote::new(start.id, end.id);
            hold.start.ease = entry.start.ease;
            hold.fade_type = entry.fade;
            hold.guide_color = entry.guide;

            for step in &entry.steps {
                let mut mid = step.note.to_note(NoteType::HoldMid);
                mid.id = next_id();
                mid.critical = start.critical;
                mid.parent_id = Some(start.id);
                mid.layer = layer;
                hold.steps.push(HoldStep::new(mid.id, step.step_type, step.ease));
                paste.notes.insert(mid.id, mid);
            }

            if entry.start.point_type == HoldNoteType::Guide
                || entry.end.point_type == HoldNoteType::Guide
            {
                hold.start_type = HoldNoteType::Guide;
                hold.end_type = HoldNoteType::Guide;
                start.friction = false;
                end.friction = false;
                end.flick = FlickType::None;
            } else {
                if entry.start.point_type == HoldNoteType::Hidden {
                    hold.start_type = HoldNoteType::Hidden;
                    start.friction = false;
                }
                if entry.end.point_type == HoldNoteType::Hidden {
                    hold.end_type = HoldNoteType::Hidden;
                    end.friction = false;
                    end.flick = FlickType::None;
                }
            }
            end.critical = start.critical || ((end.is_flick() || end.friction) && end.critical);

            sort_hold_steps(&paste.notes, &mut hold);
            paste.holds.insert(start.id, hold);
            paste.notes.insert(start.id, start);
            paste.notes.insert(end.id, end);
        }

        for (hs_id, entry) in (0..).zip(&data.hi_speed_changes) {
            paste.hi_speed_changes.insert(
                hs_id,
                HiSpeedChange {
                    id: hs_id,
                    tick: entry.tick,
                    speed: entry.speed,
                    layer,
                },
            );
        }

        if flip {
            paste.notes.values_mut().for_each(mirror);
            paste.damages.values_mut().for_each(mirror);
        }

        paste.pasting = !data.is_empty();
        if paste.pasting {
            paste.compute_lane_envelope(lane_extension);
        }
        paste
    }

    /// Offsets limiting how far the staged notes may be dragged sideways, and the lane
    /// at the middle of the staged notes.
    fn compute_lane_envelope(&mut self, lane_extension: i32) {
        let min_lane = (MIN_LANE - lane_extension) as f32;
        let max_lane = (MAX_LANE + lane_extension) as f32;

        let mut left = max_lane;
        let mut right = min_lane;
        let mut leftmost = max_lane;
        let mut rightmost = min_lane;
        for note in self.notes.values().chain(self.damages.values()) {
            leftmost = leftmost.min(note.lane);
            rightmost = rightmost.max(note.right_lane());
            left = left.min(note.lane + note.width);
            right = right.max(note.lane);
        }

        self.min_lane_offset = min_lane - leftmost;
        self.max_lane_offset = max_lane - rightmost;
        self.mid_lane = (left + right) / 2.0;
    }

    pub fn len(&self) -> usize {
        self.notes.len() + self.damages.len() + self.hi_speed_changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
