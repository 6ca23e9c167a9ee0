use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::note::{HoldNote, Note};
use crate::Id;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    pub tick: i32,
    pub bpm: f32,
}

impl Default for Tempo {
    fn default() -> Self {
        Self { tick: 0, bpm: 160.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub measure: i32,
    pub numerator: i32,
    pub denominator: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HiSpeedChange {
    pub id: Id,
    pub tick: i32,
    pub speed: f32,
    #[serde(default)]
    pub layer: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTrigger {
    pub id: Id,
    pub tick: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fever {
    pub start_tick: i32,
    pub end_tick: i32,
}

impl Default for Fever {
    fn default() -> Self {
        Self {
            start_tick: -1,
            end_tick: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
}

impl Layer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub tick: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreMetadata {
    pub title: String,
    pub artist: String,
    pub author: String,
    pub music_file: String,
    pub jacket_file: String,
    pub music_offset: f32,
    pub lane_extension: i32,
}

/// The whole chart. Cloning deep-copies every map; history snapshots rely on that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub metadata: ScoreMetadata,
    #[serde(default)]
    pub notes: BTreeMap<Id, Note>,
    #[serde(default)]
    pub hold_notes: BTreeMap<Id, HoldNote>,
    pub tempo_changes: Vec<Tempo>,
    pub time_signatures: BTreeMap<i32, TimeSignature>,
    #[serde(default)]
    pub hi_speed_changes: BTreeMap<Id, HiSpeedChange>,
    #[serde(default)]
    pub skills: BTreeMap<Id, SkillTrigger>,
    #[serde(default)]
    pub fever: Fever,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl Default for Score {
    fn default() -> Self {
        let mut time_signatures = BTreeMap::new();
        time_signatures.insert(
            0,
            TimeSignature {
                measure: 0,
                numerator: 4,
                denominator: 4,
            },
        );

        Self {
            metadata: ScoreMetadata::default(),
            notes: BTreeMap::new(),
            hold_notes: BTreeMap::new(),
            tempo_changes: vec![Tempo::default()],
            time_signatures,
            hi_speed_changes: BTreeMap::new(),
            skills: BTreeMap::new(),
            fever: Fever::default(),
            layers: vec![Layer::named("default")],
            waypoints: Vec::new(),
        }
    }
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lane bounds including the metadata's lane extension.
    pub fn lane_bounds(&self) -> (f32, f32) {
        let ext = self.metadata.lane_extension as f32;
        (crate::MIN_LANE as f32 - ext, crate::MAX_LANE as f32 + ext)
    }

    pub fn hold_of(&self, note_id: Id) -> Option<&HoldNote> {
        let hold_id = self.notes.get(&note_id)?.hold_id()?;
        self.hold_notes.get(&hold_id)
    }

    pub fn remove_hold(&mut self, hold_id: Id) -> Option<HoldNote> {
        let hold = self.hold_notes.remove(&hold_id)?;
        for id in hold.note_ids() {
            self.notes.remove(&id);
        }
        Some(hold)
    }
}

/// Re-sorts `hold.steps` by the tick of the note each step references.
pub fn sort_hold_steps(notes: &BTreeMap<Id, Note>, hold: &mut HoldNote) {
    hold.steps.sort_by_key(|step| notes[&step.id].tick);
}
