use std::collections::BTreeMap;

use crate::note::EaseType;
use crate::score::{HiSpeedChange, Tempo, TimeSignature};
use crate::{Id, TICKS_PER_BEAT};

/// Ticks between two grid lines for a division (4 = quarter notes, 8 = eighths, ...).
pub fn division_ticks(division: i32) -> Option<i32> {
    if division <= 0 {
        return None;
    }
    let ticks = TICKS_PER_BEAT * 4 / division;
    (ticks > 0).then_some(ticks)
}

/// Rounds `tick` to the nearest grid line of `division`.
pub fn snap_tick(tick: i32, division: i32) -> i32 {
    let Some(sub) = division_ticks(division) else {
        return tick;
    };
    let remainder = tick.rem_euclid(sub);
    if remainder * 2 < sub {
        tick - remainder
    } else {
        tick - remainder + sub
    }
}

pub fn beats_per_measure(ts: &TimeSignature) -> f32 {
    ts.numerator as f32 / ts.denominator as f32 * 4.0
}

pub fn ticks_to_sec(ticks: i32, beat_ticks: i32, bpm: f32) -> f32 {
    ticks as f32 * 60.0 / (bpm * beat_ticks as f32)
}

pub fn secs_to_ticks(secs: f32, beat_ticks: i32, bpm: f32) -> i32 {
    (secs * bpm * beat_ticks as f32 / 60.0).round() as i32
}

/// Seconds from tick 0 to `tick` through every tempo change on the way.
pub fn accumulate_duration(tick: i32, beat_ticks: i32, tempos: &[Tempo]) -> f32 {
    let Some(first) = tempos.first() else {
        return 0.0;
    };

    let mut total = 0.0;
    let mut current = *first;
    for next in &tempos[1..] {
        if next.tick >= tick {
            break;
        }
        total += ticks_to_sec(next.tick - current.tick, beat_ticks, current.bpm);
        current = *next;
    }
    total + ticks_to_sec(tick - current.tick, beat_ticks, current.bpm)
}

/// Inverse of [`accumulate_duration`].
pub fn accumulate_ticks(sec: f32, beat_ticks: i32, tempos: &[Tempo]) -> i32 {
    let Some(first) = tempos.first() else {
        return 0;
    };

    let mut elapsed = 0.0;
    let mut current = *first;
    for next in &tempos[1..] {
        let segment = ticks_to_sec(next.tick - current.tick, beat_ticks, current.bpm);
        if elapsed + segment > sec {
            break;
        }
        elapsed += segment;
        current = *next;
    }
    current.tick + secs_to_ticks(sec - elapsed, beat_ticks, current.bpm)
}

fn ticks_per_measure(ts: &TimeSignature, beat_ticks: i32) -> i32 {
    (beats_per_measure(ts) * beat_ticks as f32) as i32
}

pub fn accumulate_measures(tick: i32, beat_ticks: i32, ts: &BTreeMap<i32, TimeSignature>) -> i32 {
    let signatures: Vec<&TimeSignature> = ts.values().collect();
    let Some(mut current) = signatures.first().copied() else {
        return 0;
    };

    let mut acc_ticks = 0;
    for next in &signatures[1..] {
        let segment = (next.measure - current.measure) * ticks_per_measure(current, beat_ticks);
        if acc_ticks + segment > tick {
            break;
        }
        acc_ticks += segment;
        current = next;
    }

    let per_measure = ticks_per_measure(current, beat_ticks).max(1);
    current.measure + (tick - acc_ticks) / per_measure
}

pub fn measure_to_ticks(measure: i32, beat_ticks: i32, ts: &BTreeMap<i32, TimeSignature>) -> i32 {
    let mut acc_ticks = 0;
    let mut current: Option<&TimeSignature> = None;
    for sig in ts.values() {
        if sig.measure > measure {
            break;
        }
        if let Some(prev) = current {
            acc_ticks += (sig.measure - prev.measure) * ticks_per_measure(prev, beat_ticks);
        }
        current = Some(sig);
    }

    match current {
        Some(sig) => acc_ticks + (measure - sig.measure) * ticks_per_measure(sig, beat_ticks),
        None => 0,
    }
}

/// Tempo in effect at `tick`. `tempos` must be sorted and non-empty.
pub fn tempo_at(tick: i32, tempos: &[Tempo]) -> &Tempo {
    tempos
        .iter()
        .rev()
        .find(|t| t.tick <= tick)
        .unwrap_or(&tempos[0])
}

/// Key of the time signature in effect at `measure`.
pub fn find_time_signature(measure: i32, ts: &BTreeMap<i32, TimeSignature>) -> Option<i32> {
    ts.range(..=measure).next_back().map(|(k, _)| *k)
}

/// Latest hi-speed change on `layer` at or before `tick`.
pub fn find_hi_speed_change(
    tick: i32,
    hi_speeds: &BTreeMap<Id, HiSpeedChange>,
    layer: usize,
) -> Option<Id> {
    hi_speeds
        .values()
        .filter(|h| h.layer == layer && h.tick <= tick)
        .max_by_key(|h| h.tick)
        .map(|h| h.id)
}

/// Scroll multiplier in effect at `tick` on `layer`; 1.0 before any change.
pub fn hi_speed_at(tick: i32, hi_speeds: &BTreeMap<Id, HiSpeedChange>, layer: usize) -> f32 {
    find_hi_speed_change(tick, hi_speeds, layer)
        .map(|id| hi_speeds[&id].speed)
        .unwrap_or(1.0)
}

pub fn ease(kind: EaseType, start: f32, end: f32, t: f32) -> f32 {
    let t = match kind {
        EaseType::Linear => t,
        EaseType::EaseIn => t * t,
        EaseType::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
    };
    start + (end - start) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigs(list: &[(i32, i32, i32)]) -> BTreeMap<i32, TimeSignature> {
        list.iter()
            .map(|&(measure, numerator, denominator)| {
                (
                    measure,
                    TimeSignature {
                        measure,
                        numerator,
                        denominator,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn snap_rounds_to_nearest_line() {
        assert_eq!(snap_tick(100, 8), 0);
        assert_eq!(snap_tick(130, 8), 240);
        assert_eq!(snap_tick(480, 4), 480);
        assert_eq!(snap_tick(77, 0), 77);
    }

    #[test]
    fn duration_crosses_tempo_changes() {
        let tempos = [Tempo { tick: 0, bpm: 120.0 }, Tempo { tick: 960, bpm: 60.0 }];
        // two beats at 120 = 1s, then one beat at 60 = 1s
        let secs = accumulate_duration(1440, TICKS_PER_BEAT, &tempos);
        assert!((secs - 2.0).abs() < 1e-4);
        assert_eq!(accumulate_ticks(2.0, TICKS_PER_BEAT, &tempos), 1440);
    }

    #[test]
    fn measures_follow_signature_changes() {
        let ts = sigs(&[(0, 4, 4), (2, 3, 4)]);
        assert_eq!(measure_to_ticks(2, TICKS_PER_BEAT, &ts), 3840);
        assert_eq!(measure_to_ticks(3, TICKS_PER_BEAT, &ts), 3840 + 1440);
        assert_eq!(accumulate_measures(3840 + 1440, TICKS_PER_BEAT, &ts), 3);
        assert_eq!(accumulate_measures(1000, TICKS_PER_BEAT, &ts), 0);
        assert_eq!(find_time_signature(5, &ts), Some(2));
    }

    #[test]
    fn hi_speed_lookup_is_per_layer() {
        let mut hs = BTreeMap::new();
        hs.insert(0, HiSpeedChange { id: 0, tick: 0, speed: 2.0, layer: 0 });
        hs.insert(1, HiSpeedChange { id: 1, tick: 100, speed: 3.0, layer: 1 });
        assert_eq!(hi_speed_at(200, &hs, 0), 2.0);
        assert_eq!(hi_speed_at(200, &hs, 1), 3.0);
        assert_eq!(hi_speed_at(50, &hs, 1), 1.0);
    }

    #[test]
    fn ease_endpoints() {
        for kind in [EaseType::Linear, EaseType::EaseIn, EaseType::EaseOut] {
            assert_eq!(ease(kind, 2.0, 6.0, 0.0), 2.0);
            assert_eq!(ease(kind, 2.0, 6.0, 1.0), 6.0);
        }
        assert_eq!(ease(EaseType::EaseIn, 0.0, 4.0, 0.5), 1.0);
        assert_eq!(ease(EaseType::EaseOut, 0.0, 4.0, 0.5), 3.0);
    }
}
