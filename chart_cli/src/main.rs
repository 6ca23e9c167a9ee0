use std::path::{Path, PathBuf};

use anyhow::Context;
use chart_editor::{check_integrity, EditorConfig, ScoreContext, ScoreStats};
use chart_model::Score;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "chartedit")]
#[command(about = "Chart editing CLI", long_about = None)]
struct Cli {
    /// Editor config JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print note counts and combo
    Stats { input: PathBuf },
    /// Verify hold chain structure
    Check { input: PathBuf },
    /// Mirror every note across the lane axis
    Flip {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an empty score
    New {
        output: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = match &cli.config {
        Some(path) => EditorConfig::from_path(path)
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => EditorConfig::default(),
    };
    debug!(history_limit = config.history_limit, "editor config");

    match cli.command {
        Command::Stats { input } => {
            let score = chart_loader::load_score_json_from_path(&input)?;
            print_stats(&ScoreStats::from_score(&score));
        }
        Command::Check { input } => {
            let score = chart_loader::load_score_json_from_path(&input)?;
            let errors = check_integrity(&score);
            if !errors.is_empty() {
                for err in &errors {
                    eprintln!("{err}");
                }
                anyhow::bail!(
                    "{} integrity violation(s) in {}",
                    errors.len(),
                    input.display()
                );
            }
            println!("ok");
        }
        Command::Flip { input, output } => {
            let score = chart_loader::load_score_json_from_path(&input)?;
            let mut context = ScoreContext::from_score(score, config);
            context.select_all();
            context.flip_selection();

            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            chart_loader::save_score_json(&out_path, context.score())?;
            info!(notes = context.score().notes.len(), path = %out_path.display(), "flipped");
        }
        Command::New {
            output,
            title,
            artist,
        } => {
            let mut score = Score::default();
            score.metadata.title = title.unwrap_or_default();
            score.metadata.artist = artist.unwrap_or_default();
            chart_loader::save_score_json(&output, &score)?;
        }
    }

    Ok(())
}

fn print_stats(stats: &ScoreStats) {
    println!("taps={}", stats.taps());
    println!("flicks={}", stats.flicks());
    println!("holds={}", stats.holds());
    println!("steps={}", stats.steps());
    println!("guides={}", stats.guides());
    println!("traces={}", stats.traces());
    println!("hispeeds={}", stats.hi_speeds());
    println!("total={}", stats.total());
    println!("combo={}", stats.combo());
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "score".to_string());
    input.with_file_name(format!("{stem}.flipped.json"))
}
