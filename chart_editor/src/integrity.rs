//! Structural checks on hold chains. Every edit operation is expected to leave a score
//! that passes [`check_integrity`].

use chart_model::{HoldNote, Id, NoteType, Score};

use crate::EditError;

/// Every chain violation in `score`, in id order. Empty when the score is consistent.
pub fn check_integrity(score: &Score) -> Vec<EditError> {
    let mut errors = Vec::new();

    for (id, note) in &score.notes {
        if !matches!(note.note_type, NoteType::HoldMid | NoteType::HoldEnd) {
            continue;
        }
        let Some(parent) = note.parent_id else {
            errors.push(
                EditError::new("E3001", format!("{:?} note {id} has no parent", note.note_type))
                    .with_note(*id),
            );
            continue;
        };
        match score.hold_notes.get(&parent) {
            None => errors.push(
                EditError::new("E3001", format!("note {id} points at missing hold {parent}"))
                    .with_note(*id)
                    .with_hold(parent),
            ),
            Some(hold) if !hold.references(*id) => errors.push(
                EditError::new("E3002", format!("hold {parent} does not reference note {id}"))
                    .with_note(*id)
                    .with_hold(parent),
            ),
            Some(_) => {}
        }
    }

    for (hold_id, hold) in &score.hold_notes {
        check_hold(score, *hold_id, hold, &mut errors);
    }

    errors
}

fn check_hold(score: &Score, hold_id: Id, hold: &HoldNote, errors: &mut Vec<EditError>) {
    let err = |code, message: String| EditError::new(code, message).with_hold(hold_id);

    let expected = std::iter::once((hold.start.id, NoteType::Hold))
        .chain(hold.steps.iter().map(|s| (s.id, NoteType::HoldMid)))
        .chain(std::iter::once((hold.end, NoteType::HoldEnd)));

    let mut missing = false;
    for (id, note_type) in expected {
        let Some(note) = score.notes.get(&id) else {
            errors.push(
                err("E3004", format!("hold {hold_id} references missing note {id}")).with_note(id),
            );
            missing = true;
            continue;
        };
        if note.note_type != note_type {
            errors.push(
                err(
                    "E3005",
                    format!(
                        "note {id} of hold {hold_id} is {:?}, expected {note_type:?}",
                        note.note_type
                    ),
                )
                .with_note(id),
            );
        }
        if note_type != NoteType::Hold && note.parent_id != Some(hold_id) {
            errors.push(
                err("E3002", format!("note {id} is not parented to hold {hold_id}")).with_note(id),
            );
        }
    }
    if hold.start.id != hold_id {
        errors.push(err(
            "E3005",
            format!("hold {hold_id} is keyed by another start {}", hold.start.id),
        ));
    }
    if missing {
        return;
    }

    if hold
        .steps
        .windows(2)
        .any(|w| score.notes[&w[0].id].tick > score.notes[&w[1].id].tick)
    {
        errors.push(err("E3003", format!("steps of hold {hold_id} are out of tick order")));
    }

    if hold.is_guide() {
        return;
    }

    let critical = score.notes[&hold.start.id].critical;
    for step in &hold.steps {
        if score.notes[&step.id].critical != critical {
            errors.push(
                err("E3006", format!("step {} disagrees with hold {hold_id} criticality", step.id))
                    .with_note(step.id),
            );
        }
    }

    let end = &score.notes[&hold.end];
    let independent = !critical && (end.is_flick() || end.friction);
    if end.critical != critical && !independent {
        errors.push(
            err("E3006", format!("end {} disagrees with hold {hold_id} criticality", end.id))
                .with_note(end.id),
        );
    }
}
