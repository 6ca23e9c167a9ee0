use std::path::PathBuf;

use chart_model::timing::accumulate_duration;
use chart_model::{NoteType, TICKS_PER_BEAT};
use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
    /// Also print note counts per layer
    #[arg(long)]
    layers: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let score = chart_loader::load_score_json_from_path(args.path)?;

    let guides = score.hold_notes.values().filter(|h| h.is_guide()).count();
    let last_tick = score.notes.values().map(|n| n.tick).max().unwrap_or(0);
    let length = accumulate_duration(last_tick, TICKS_PER_BEAT, &score.tempo_changes);

    println!("{} / {}", score.metadata.title, score.metadata.artist);
    println!(
        "holds={} guides={} hi_speeds={} tempos={}",
        score.hold_notes.len() - guides,
        guides,
        score.hi_speed_changes.len(),
        score.tempo_changes.len()
    );
    println!("last_tick={last_tick} length={length:.2}s");

    if args.layers {
        for (index, layer) in score.layers.iter().enumerate() {
            let taps = score
                .notes
                .values()
                .filter(|n| n.layer == index && n.note_type == NoteType::Tap)
                .count();
            let hidden = if layer.hidden { " (hidden)" } else { "" };
            println!("layer {index} {}{hidden}: taps={taps}", layer.name);
        }
    }
    Ok(())
}
