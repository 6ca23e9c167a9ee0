use super::*;
use chart_model::{
    EaseType, FlickType, GuideColor, HoldNoteType, HoldStepType, Id, Note, NoteType, Score,
};

fn assert_consistent(context: &ScoreContext) {
    let errors = check_integrity(context.score());
    assert!(errors.is_empty(), "integrity violations: {errors:?}");
}

fn note(context: &ScoreContext, id: Id) -> &Note {
    &context.score().notes[&id]
}

/// A hold from `start_tick` to `end_tick` with a step at each of `mids`. Returns the start id
/// and the step ids.
fn hold_with_mids(
    context: &mut ScoreContext,
    start_tick: i32,
    end_tick: i32,
    mids: &[(i32, f32)],
) -> (Id, Vec<Id>) {
    let start = context.insert_hold(
        Placement::new(start_tick, 2.0, 3.0),
        Placement::new(end_tick, 2.0, 3.0),
    );
    let steps = mids
        .iter()
        .map(|&(tick, lane)| context.insert_hold_mid(start, tick, lane, 3.0).unwrap())
        .collect();
    (start, steps)
}

fn end_of(context: &ScoreContext, hold: Id) -> Id {
    context.score().hold_notes[&hold].end
}

#[test]
fn toggle_critical_on_start_marks_whole_chain() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 20, &[(10, 2.0)]);
    let end = end_of(&context, start);

    context.select_notes([start]);
    context.toggle_criticals();

    assert!(note(&context, start).critical);
    assert!(note(&context, mids[0]).critical);
    assert!(note(&context, end).critical);
    assert_consistent(&context);

    context.toggle_criticals();
    assert!(!note(&context, end).critical);
    assert_consistent(&context);
}

#[test]
fn toggle_critical_cycles_guide_color() {
    let mut context = ScoreContext::default();
    let (start, _) = hold_with_mids(&mut context, 0, 480, &[]);
    context.select_notes([start]);
    context.convert_hold_to_guide(GuideColor::Green);

    context.select_notes([start]);
    context.toggle_criticals();
    let hold = &context.score().hold_notes[&start];
    assert_eq!(hold.guide_color, GuideColor::Yellow);
    assert!(!note(&context, start).critical);
}

#[test]
fn critical_flick_end_flips_on_its_own() {
    let mut context = ScoreContext::default();
    let (start, _) = hold_with_mids(&mut context, 0, 480, &[]);
    let end = end_of(&context, start);
    context.select_notes([end]);
    context.set_flick(PropertyEdit::Set(FlickType::Left));

    context.toggle_criticals();
    assert!(note(&context, end).critical);
    assert!(!note(&context, start).critical);
    assert_consistent(&context);

    // dropping the flick makes the end follow the start again
    context.set_flick(PropertyEdit::Set(FlickType::None));
    assert!(!note(&context, end).critical);
    assert_consistent(&context);
}

#[test]
fn compress_three_notes_into_two_ticks() {
    let mut context = ScoreContext::default();
    let ids = [
        context.insert_tap(0, 0.0, 2.0, false, false),
        context.insert_tap(5, 3.0, 2.0, false, false),
        context.insert_tap(5, 6.0, 2.0, false, false),
    ];
    context.select_notes(ids);
    context.compress_selection();

    let ticks: Vec<i32> = ids.iter().map(|id| note(&context, *id).tick).collect();
    assert_eq!(ticks, vec![0, 1, 1]);

    let mut hi_speeds: Vec<_> = context.score().hi_speed_changes.values().collect();
    hi_speeds.sort_by_key(|hs| hs.tick);
    assert_eq!(hi_speeds.len(), 2);
    assert_eq!((hi_speeds[0].tick, hi_speeds[0].speed), (0, 5.0));
    assert_eq!((hi_speeds[1].tick, hi_speeds[1].speed), (1, 1.0));
    assert_eq!(context.selected_hi_speed_changes().len(), 2);
    assert_eq!(context.history().undo_description(), Some("Compress notes"));
}

#[test]
fn compress_needs_two_distinct_ticks() {
    let mut context = ScoreContext::default();
    let ids = [
        context.insert_tap(5, 0.0, 2.0, false, false),
        context.insert_tap(5, 3.0, 2.0, false, false),
    ];
    let before = context.history().undo_len();
    context.select_notes(ids);
    context.compress_selection();
    assert_eq!(context.history().undo_len(), before);
    assert!(context.score().hi_speed_changes.is_empty());
}

#[test]
fn flipped_paste_mirrors_lane() {
    let mut clipboard = MemoryClipboard::default();
    clipboard.set_text(format!(
        "{CLIPBOARD_SIGNATURE}{}",
        r#"{"notes":[{"tick":0,"lane":5,"width":3,"critical":false,"friction":false,"flick":"left"}]}"#
    ));
    let mut context = ScoreContext::with_clipboard(EditorConfig::default(), Box::new(clipboard));

    context.paste(true).unwrap();
    let staged = context.paste_data().notes.values().next().unwrap();
    assert_eq!(staged.lane, 4.0);
    assert_eq!(staged.flick, FlickType::Right);

    context.confirm_paste();
    let pasted = context.score().notes.values().next().unwrap();
    assert_eq!(pasted.lane, 4.0);
    assert_eq!(pasted.tick, 0);
    assert!(!context.paste_data().pasting);
    assert_eq!(context.history().undo_description(), Some("Paste notes"));
}

#[test]
fn paste_without_signature_does_nothing() {
    let mut clipboard = MemoryClipboard::default();
    clipboard.set_text("just some text".to_string());
    let mut context = ScoreContext::with_clipboard(EditorConfig::default(), Box::new(clipboard));
    context.paste(false).unwrap();
    assert!(!context.paste_data().pasting);
}

#[test]
fn malformed_clipboard_is_reported() {
    let mut clipboard = MemoryClipboard::default();
    clipboard.set_text(format!("{CLIPBOARD_SIGNATURE}{{"));
    let mut context = ScoreContext::with_clipboard(EditorConfig::default(), Box::new(clipboard));
    let err = context.paste(false).unwrap_err();
    assert_eq!(err.kind, EditErrorKind::Clipboard);
}

#[test]
fn paste_remaps_every_reference() {
    let mut context = ScoreContext::default();
    hold_with_mids(&mut context, 0, 960, &[(240, 3.0), (480, 4.0)]);
    context.insert_tap(120, 7.0, 2.0, true, false);
    context.insert_tap(360, 8.0, 2.0, false, true);
    let original: Vec<Id> = context.score().notes.keys().copied().collect();

    context.select_all();
    context.copy_selection().unwrap();
    context.paste(false).unwrap();
    context.set_paste_offset(1920, 1.0);
    context.confirm_paste();

    assert_consistent(&context);
    assert_eq!(context.score().notes.len(), original.len() * 2);
    assert_eq!(context.score().hold_notes.len(), 2);
    for note in context.score().notes.values() {
        if let Some(parent) = note.parent_id {
            assert!(context.score().notes.contains_key(&parent));
        }
    }

    let selected = context.selected_notes();
    assert_eq!(selected.len(), original.len());
    assert!(original.iter().all(|id| !selected.contains(id)));
    assert!(selected
        .iter()
        .all(|id| note(&context, *id).tick >= 1920 && note(&context, *id).lane >= 3.0));
    let damages = context
        .score()
        .notes
        .values()
        .filter(|n| n.note_type == NoteType::Damage)
        .count();
    assert_eq!(damages, 2);
}

#[test]
fn cancel_paste_leaves_score_alone() {
    let mut context = ScoreContext::default();
    let id = context.insert_tap(0, 0.0, 3.0, false, false);
    let before = context.score().clone();

    context.select_notes([id]);
    context.duplicate_selection(false).unwrap();
    assert!(context.paste_data().pasting);
    context.cancel_paste();

    assert!(!context.paste_data().pasting);
    assert_eq!(context.score(), &before);
}

fn context_with_clipboard(body: &str) -> ScoreContext {
    let mut clipboard = MemoryClipboard::default();
    clipboard.set_text(format!("{CLIPBOARD_SIGNATURE}{body}"));
    ScoreContext::with_clipboard(EditorConfig::default(), Box::new(clipboard))
}

#[test]
fn pasted_steps_are_sorted_by_tick() {
    let mut context = context_with_clipboard(
        r#"{"holds":[{"start":{"tick":0,"lane":2,"width":3},"end":{"tick":960,"lane":2,"width":3},"steps":[{"tick":720,"lane":4,"width":3},{"tick":240,"lane":3,"width":3}]}]}"#,
    );
    context.paste(false).unwrap();
    context.set_paste_offset(480, 0.0);
    context.confirm_paste();

    assert_consistent(&context);
    let hold = context.score().hold_notes.values().next().unwrap();
    let ticks: Vec<i32> = hold
        .steps
        .iter()
        .map(|step| note(&context, step.id).tick)
        .collect();
    assert_eq!(ticks, vec![720, 1200]);
}

#[test]
fn pasted_hidden_end_follows_start_criticality() {
    let mut context = context_with_clipboard(
        r#"{"holds":[{"start":{"tick":0,"lane":2,"width":3},"end":{"tick":480,"lane":2,"width":3,"critical":true,"flick":"left","type":"hidden"}}]}"#,
    );
    context.paste(false).unwrap();
    context.confirm_paste();

    assert_consistent(&context);
    let (&start, hold) = context.score().hold_notes.iter().next().unwrap();
    let end = note(&context, hold.end);
    assert_eq!(hold.end_type, HoldNoteType::Hidden);
    assert_eq!(end.flick, FlickType::None);
    assert!(!end.critical);
    assert!(!note(&context, start).critical);
}

#[test]
fn cut_then_paste_restores_notes() {
    let mut context = ScoreContext::default();
    let id = context.insert_tap(480, 3.0, 3.0, true, false);
    context.select_notes([id]);
    context.cut_selection().unwrap();
    assert!(context.score().notes.is_empty());
    assert!(!context.has_selection());

    context.paste(false).unwrap();
    context.set_paste_offset(480, 0.0);
    context.confirm_paste();
    let restored = context.score().notes.values().next().unwrap();
    assert_eq!((restored.tick, restored.lane, restored.critical), (480, 3.0, true));
}

#[test]
fn undo_then_redo_round_trips() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 960, &[(240, 3.0), (480, 5.0)]);
    let tap = context.insert_tap(100, 8.0, 2.0, false, false);
    let base = context.score().clone();
    let base_depth = context.history().undo_len();

    context.select_notes([start, tap]);
    context.toggle_criticals();
    context.select_all();
    context.flip_selection();
    context.select_notes([mids[1]]);
    context.split_hold_in_selection();
    context.select_notes([tap]);
    context.delete_selection();
    let after = context.score().clone();
    assert_ne!(after, base);

    while context.history().undo_len() > base_depth {
        assert!(context.undo());
    }
    assert_eq!(context.score(), &base);
    assert!(!context.has_selection());

    while context.redo() {}
    assert_eq!(context.score(), &after);
    assert!(!context.is_up_to_date());
}

#[test]
fn undo_on_empty_history_is_noop() {
    let mut context = ScoreContext::default();
    assert!(!context.undo());
    assert!(!context.redo());
    assert!(context.is_up_to_date());
}

#[test]
fn history_is_bounded_by_config() {
    let mut context = ScoreContext::new(EditorConfig { history_limit: 2 });
    for tick in [0, 480, 960] {
        context.insert_tap(tick, 0.0, 3.0, false, false);
    }
    assert_eq!(context.history().undo_len(), 2);
}

#[test]
fn noop_setter_pushes_no_history() {
    let mut context = ScoreContext::default();
    let id = context.insert_tap(0, 0.0, 3.0, false, false);
    let depth = context.history().undo_len();

    context.select_notes([id]);
    context.set_flick(PropertyEdit::Set(FlickType::None));
    context.set_ease(PropertyEdit::Set(EaseType::EaseIn));
    assert_eq!(context.history().undo_len(), depth);

    context.set_flick(PropertyEdit::Cycle);
    assert_eq!(note(&context, id).flick, FlickType::Default);
    assert_eq!(context.history().undo_len(), depth + 1);
}

#[test]
fn deleting_start_or_end_removes_whole_chain() {
    for pick_end in [false, true] {
        let mut context = ScoreContext::default();
        let (start, _) = hold_with_mids(&mut context, 0, 960, &[(240, 3.0), (480, 4.0)]);
        let keep = context.insert_tap(0, 9.0, 2.0, false, false);
        let target = if pick_end { end_of(&context, start) } else { start };

        context.select_notes([target]);
        context.delete_selection();

        assert!(context.score().hold_notes.is_empty());
        assert_eq!(context.score().notes.keys().copied().collect::<Vec<_>>(), vec![keep]);
        assert!(!context.has_selection());
        assert_consistent(&context);
    }
}

#[test]
fn deleting_a_step_keeps_the_chain() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 960, &[(240, 3.0), (480, 4.0)]);
    context.select_notes([mids[0]]);
    context.delete_selection();

    let hold = &context.score().hold_notes[&start];
    assert_eq!(hold.steps.len(), 1);
    assert_eq!(hold.steps[0].id, mids[1]);
    assert_eq!(context.score().notes.len(), 3);
    assert_consistent(&context);
}

#[test]
fn flip_twice_is_identity() {
    let mut context = ScoreContext::default();
    hold_with_mids(&mut context, 0, 480, &[(240, 5.5)]);
    let tap = context.insert_tap(0, 1.0, 2.0, false, false);
    context.select_notes([tap]);
    context.set_flick(PropertyEdit::Set(FlickType::Left));
    let before = context.score().clone();

    context.select_all();
    context.flip_selection();
    assert_eq!(note(&context, tap).lane, 9.0);
    assert_eq!(note(&context, tap).flick, FlickType::Right);
    context.flip_selection();
    assert_eq!(context.score(), &before);
}

#[test]
fn shrink_packs_selection_in_both_directions() {
    let mut context = ScoreContext::default();
    let ids = [
        context.insert_tap(0, 0.0, 2.0, false, false),
        context.insert_tap(100, 2.0, 2.0, false, false),
        context.insert_tap(200, 4.0, 2.0, false, false),
    ];
    let ticks = |context: &ScoreContext| {
        ids.iter()
            .map(|id| note(context, *id).tick)
            .collect::<Vec<_>>()
    };

    context.select_notes(ids);
    context.shrink_selection(Direction::Down);
    assert_eq!(ticks(&context), vec![0, 1, 2]);

    context.undo();
    context.select_notes(ids);
    context.shrink_selection(Direction::Up);
    assert_eq!(ticks(&context), vec![198, 199, 200]);
}

#[test]
fn split_then_connect_restores_span() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 960, &[(240, 3.0), (480, 4.0), (720, 5.0)]);
    let end = end_of(&context, start);
    context.select_notes([start]);
    context.toggle_criticals();

    context.select_notes([mids[1]]);
    context.split_hold_in_selection();
    assert_consistent(&context);
    assert_eq!(context.score().hold_notes.len(), 2);
    assert_eq!(context.score().hold_notes[&start].steps.len(), 1);
    assert!(!context.score().notes.contains_key(&mids[1]));
    assert_eq!(note(&context, end).parent_id.map(|p| note(&context, p).tick), Some(480));
    assert_eq!(context.selected_notes().len(), 2);
    assert!(context.selected_notes().iter().all(|id| note(&context, *id).critical));

    assert!(context.selection_can_connect());
    context.connect_holds_in_selection();
    assert_consistent(&context);

    assert_eq!(context.score().hold_notes.len(), 1);
    let hold = &context.score().hold_notes[&start];
    assert_eq!(note(&context, hold.end).tick, 960);
    assert_eq!(note(&context, start).tick, 0);
    // two untouched steps plus the two connectors
    assert_eq!(hold.steps.len(), 4);
    assert!(hold.note_ids().all(|id| note(&context, id).critical));
    assert_eq!(context.history().undo_description(), Some("Connect holds"));
}

#[test]
fn connect_rejects_same_chain_and_reversed_order() {
    let mut context = ScoreContext::default();
    let (first, _) = hold_with_mids(&mut context, 0, 480, &[]);
    let (second, _) = hold_with_mids(&mut context, 960, 1440, &[]);

    context.select_notes([first, end_of(&context, first)]);
    assert!(!context.selection_can_connect());

    context.select_notes([first, end_of(&context, second)]);
    assert!(!context.selection_can_connect());

    context.select_notes([end_of(&context, first), second]);
    assert!(context.selection_can_connect());
}

#[test]
fn connect_into_guide_hides_steps() {
    let mut context = ScoreContext::default();
    let (first, _) = hold_with_mids(&mut context, 0, 480, &[]);
    let (second, later_mids) = hold_with_mids(&mut context, 960, 1920, &[(1440, 4.0)]);
    context.select_notes([first]);
    context.convert_hold_to_guide(GuideColor::Blue);

    context.select_notes([end_of(&context, first), second]);
    context.connect_holds_in_selection();
    assert_consistent(&context);

    let hold = &context.score().hold_notes[&first];
    assert!(hold.is_guide());
    assert_eq!(hold.steps.len(), 3);
    assert!(hold.steps.iter().all(|s| s.step_type == HoldStepType::Hidden));
    assert_eq!(note(&context, later_mids[0]).parent_id, Some(first));
}

#[test]
fn repeat_mids_tiles_pattern_to_hold_end() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 1920, &[(240, 4.0), (480, 2.0)]);
    context.select_notes([mids[0]]);
    context.set_ease(PropertyEdit::Set(EaseType::EaseOut));

    context.select_notes([start, mids[0], mids[1]]);
    context.repeat_mids_in_selection();
    assert_consistent(&context);

    let hold = &context.score().hold_notes[&start];
    let ticks: Vec<i32> = hold.steps.iter().map(|s| note(&context, s.id).tick).collect();
    assert_eq!(ticks, vec![240, 480, 720, 960, 1200, 1440, 1680]);
    let end = note(&context, hold.end);
    assert_eq!((end.tick, end.lane), (1920, 2.0));

    let at_720 = hold.steps[2];
    assert_eq!(note(&context, at_720.id).lane, 4.0);
    assert_eq!(at_720.ease, EaseType::EaseOut);
}

#[test]
fn repeat_mids_needs_three_eased_notes_of_one_hold() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 1920, &[(240, 4.0)]);
    let before = context.score().clone();
    context.select_notes([start, mids[0]]);
    context.repeat_mids_in_selection();
    assert_eq!(context.score(), &before);
}

#[test]
fn traces_follow_hold_path() {
    let mut context = ScoreContext::default();
    let start = context.insert_hold(Placement::new(0, 2.0, 3.0), Placement::new(480, 6.0, 3.0));
    context.select_notes([start]);
    context.convert_hold_to_traces(8, false);

    let traces: Vec<&Note> = context.score().notes.values().filter(|n| n.friction).collect();
    assert_eq!(traces.len(), 1);
    assert_eq!((traces[0].tick, traces[0].lane, traces[0].width), (240, 4.0, 3.0));
    assert_eq!(context.score().hold_notes.len(), 1);
    assert!(!context.has_selection());
}

#[test]
fn traces_can_replace_the_hold() {
    let mut context = ScoreContext::default();
    let start = context.insert_hold(Placement::new(0, 2.0, 3.0), Placement::new(480, 6.0, 3.0));
    context.select_notes([start]);
    context.toggle_criticals();
    context.select_notes([start]);
    context.convert_hold_to_traces(8, true);

    assert!(context.score().hold_notes.is_empty());
    let ticks: Vec<i32> = context.score().notes.values().map(|n| n.tick).collect();
    assert_eq!(ticks, vec![0, 240, 480]);
    assert!(context.score().notes.values().all(|n| n.critical && n.friction));
    assert_consistent(&context);
}

#[test]
fn traces_skip_skip_steps_and_follow_eases() {
    let mut context = ScoreContext::default();
    let start = context.insert_hold(Placement::new(0, 2.0, 3.0), Placement::new(960, 3.0, 3.0));
    let skipped = context.insert_hold_mid(start, 240, 9.0, 3.0).unwrap();
    let eased = context.insert_hold_mid(start, 480, 6.0, 3.0).unwrap();

    context.select_notes([skipped]);
    context.set_step(PropertyEdit::Set(HoldStepType::Skip));
    context.select_notes([eased]);
    context.set_ease(PropertyEdit::Set(EaseType::EaseIn));
    context.select_notes([start]);
    context.set_ease(PropertyEdit::Set(EaseType::EaseOut));

    context.select_notes([start]);
    context.convert_hold_to_traces(8, false);

    let mut traces: Vec<(i32, f32, f32)> = context
        .score()
        .notes
        .values()
        .filter(|n| n.friction)
        .map(|n| (n.tick, n.lane, n.width))
        .collect();
    traces.sort_by_key(|(tick, _, _)| *tick);
    assert_eq!(
        traces,
        vec![(240, 5.0, 3.0), (480, 6.0, 3.0), (720, 5.25, 3.0)]
    );
}

#[test]
fn lerp_fills_grid_between_hi_speeds() {
    let mut context = ScoreContext::default();
    let a = context.insert_hi_speed_change(0, 1.0);
    let b = context.insert_hi_speed_change(1920, 2.0);
    context.select_hi_speed_changes([a, b]);
    context.lerp_hi_speeds(4);

    let mut speeds: Vec<(i32, f32)> = context
        .score()
        .hi_speed_changes
        .values()
        .map(|hs| (hs.tick, hs.speed))
        .collect();
    speeds.sort_by_key(|(tick, _)| *tick);
    assert_eq!(
        speeds,
        vec![(0, 1.0), (480, 1.25), (960, 1.5), (1440, 1.75), (1920, 2.0)]
    );
}

#[test]
fn guide_conversion_round_trip_normalizes_ends() {
    let mut context = ScoreContext::default();
    let (start, _) = hold_with_mids(&mut context, 0, 480, &[]);
    let end = end_of(&context, start);
    context.select_notes([end]);
    context.set_hold_type(PropertyEdit::Set(HoldNoteType::Hidden));
    context.select_notes([start]);
    context.toggle_friction();

    context.select_notes([start]);
    context.convert_hold_to_guide(GuideColor::Purple);
    let hold = &context.score().hold_notes[&start];
    assert!(hold.is_guide());
    assert_eq!(hold.guide_color, GuideColor::Purple);
    assert!(!note(&context, start).friction);
    assert_eq!(context.stats().guides(), 1);
    assert!(context.selection_can_change_fade_type());
    assert!(!context.selection_can_change_hold_type());

    context.set_hold_type(PropertyEdit::Cycle);
    assert!(context.score().hold_notes[&start].is_guide());

    context.convert_guide_to_hold();
    let hold = &context.score().hold_notes[&start];
    assert_eq!(hold.start_type, HoldNoteType::Normal);
    assert_eq!(hold.end_type, HoldNoteType::Normal);
    assert_consistent(&context);
}

#[test]
fn hidden_end_drops_flick_and_trace() {
    let mut context = ScoreContext::default();
    let (start, _) = hold_with_mids(&mut context, 0, 480, &[]);
    let end = end_of(&context, start);
    context.select_notes([end]);
    context.set_flick(PropertyEdit::Set(FlickType::Default));
    context.toggle_friction();
    assert!(note(&context, end).friction);

    context.set_hold_type(PropertyEdit::Cycle);
    assert_eq!(context.score().hold_notes[&start].end_type, HoldNoteType::Hidden);
    assert_eq!(note(&context, end).flick, FlickType::None);
    assert!(!note(&context, end).friction);
    assert_consistent(&context);
}

#[test]
fn fade_and_guide_color_only_touch_guides() {
    let mut context = ScoreContext::default();
    let (plain, _) = hold_with_mids(&mut context, 0, 480, &[]);
    let (guide, _) = hold_with_mids(&mut context, 960, 1440, &[]);
    context.select_notes([guide]);
    context.convert_hold_to_guide(GuideColor::Green);

    context.select_notes([plain, guide]);
    context.set_fade_type(PropertyEdit::Cycle);
    context.set_guide_color(PropertyEdit::Set(GuideColor::Red));

    let holds = &context.score().hold_notes;
    assert_eq!(holds[&guide].guide_color, GuideColor::Red);
    assert_ne!(holds[&guide].fade_type, holds[&plain].fade_type);
    assert_eq!(holds[&plain].guide_color, GuideColor::Green);
}

#[test]
fn step_type_cycles_on_selected_mids() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 960, &[(480, 2.0)]);
    context.select_notes([mids[0]]);
    context.set_step(PropertyEdit::Cycle);
    assert_eq!(context.score().hold_notes[&start].steps[0].step_type, HoldStepType::Hidden);
    // 3 notes - 1 hidden step + (960 - 240) / 240 hold ticks
    assert_eq!(context.stats().combo(), 5);

    context.set_step(PropertyEdit::Set(HoldStepType::Skip));
    assert_eq!(context.score().hold_notes[&start].steps[0].step_type, HoldStepType::Skip);
}

#[test]
fn layers_and_selection_layer() {
    let mut context = ScoreContext::default();
    let id = context.insert_tap(0, 0.0, 3.0, false, false);
    assert_eq!(context.add_layer("upper"), 1);
    let upper = context.insert_tap(480, 0.0, 3.0, false, false);
    assert_eq!(note(&context, upper).layer, 1);

    context.select_notes([id]);
    context.set_layer(PropertyEdit::Cycle);
    assert_eq!(note(&context, id).layer, 1);

    context.toggle_layer_hidden(1);
    assert!(context.score().layers[1].hidden);
    context.set_selected_layer(9);
    assert_eq!(context.selected_layer(), 1);
}

#[test]
fn tempo_and_signature_edits() {
    let mut context = ScoreContext::default();
    context.set_tempo(1920, 120.0);
    context.set_tempo(0, 180.0);
    let tempos = &context.score().tempo_changes;
    assert_eq!(tempos.len(), 2);
    assert_eq!(tempos[0].bpm, 180.0);

    context.set_time_signature(4, 3, 4);
    assert_eq!(context.score().time_signatures[&4].numerator, 3);

    let depth = context.history().undo_len();
    context.set_tempo(0, -1.0);
    context.set_time_signature(2, 0, 4);
    assert_eq!(context.history().undo_len(), depth);

    context.add_waypoint("chorus", 3840);
    assert_eq!(context.score().waypoints[0].name, "chorus");
}

#[test]
fn load_score_reseeds_ids_and_clears_state() {
    let mut score = Score::default();
    let mut existing = Note::new(NoteType::Tap, 0, 0.0, 3.0);
    existing.id = 10;
    score.notes.insert(10, existing);

    let mut context = ScoreContext::default();
    context.insert_tap(0, 0.0, 3.0, false, false);
    context.load_score(score);
    assert!(!context.history().has_undo());
    assert!(context.is_up_to_date());
    assert_eq!(context.stats().total(), 1);

    let id = context.insert_tap(480, 0.0, 3.0, false, false);
    assert!(id > 10);
    assert!(!context.is_up_to_date());
    context.mark_saved();
    assert!(context.is_up_to_date());
}

#[test]
fn stats_follow_every_edit() {
    let mut context = ScoreContext::default();
    let tap = context.insert_tap(0, 0.0, 3.0, false, false);
    hold_with_mids(&mut context, 0, 960, &[(480, 2.0)]);
    assert_eq!(context.stats().taps(), 1);
    assert_eq!(context.stats().holds(), 1);
    assert_eq!(context.stats().steps(), 1);
    // 4 notes + (960 - 240) / 240 hold ticks
    assert_eq!(context.stats().combo(), 7);

    context.select_notes([tap]);
    context.toggle_friction();
    assert_eq!(context.stats().traces(), 1);
    assert_eq!(context.stats().taps(), 0);

    context.undo();
    assert_eq!(context.stats().taps(), 1);
}

#[test]
fn selection_predicates() {
    let mut context = ScoreContext::default();
    let (start, mids) = hold_with_mids(&mut context, 0, 960, &[(480, 2.0)]);
    let tap = context.insert_tap(0, 8.0, 2.0, false, false);

    context.select_notes([tap]);
    assert!(context.selection_has_flickable());
    assert!(!context.selection_has_ease());
    assert!(!context.has_hold_in_selection());

    context.select_notes([mids[0]]);
    assert!(context.selection_has_step());
    assert!(context.selection_has_ease());
    assert!(!context.selection_has_hold());
    assert_eq!(context.holds_from_selection().into_iter().collect::<Vec<_>>(), vec![start]);

    context.select_notes([start, 999]);
    assert_eq!(context.selected_notes().len(), 1);
    assert!(context.selection_has_hold());
    assert!(context.selection_can_change_hold_type());
}
