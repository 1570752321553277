//! Authoring helper for tracing levels: validate level JSON files, inspect
//! their geometry, and dump the built-in levels as editable templates.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use game::geometry::Vec2;
use game::level::Level;
use game::levels::builtin_levels;

#[derive(Parser)]
#[command(name = "leveltool", about = "Tracing level authoring helper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one or more level JSON files.
    Validate { paths: Vec<PathBuf> },
    /// Print geometry stats for a level JSON file.
    Inspect { path: PathBuf },
    /// Write the built-in levels as JSON templates into a directory.
    Seed { dir: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Validate { paths } => validate(paths),
        Command::Inspect { path } => inspect(path),
        Command::Seed { dir } => seed(dir),
    }
}

fn load(path: &PathBuf) -> Result<Level> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Level::from_json(&json)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid level {}", path.display()))
}

fn validate(paths: Vec<PathBuf>) -> Result<()> {
    if paths.is_empty() {
        bail!("no level files given");
    }

    let mut failures = 0usize;
    for path in &paths {
        match load(path) {
            Ok(level) => println!(
                "ok: {} ({} strokes)",
                path.display(),
                level.stroke_count()
            ),
            Err(err) => {
                eprintln!("error: {err:#}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} level files failed validation", paths.len());
    }
    Ok(())
}

fn polyline_length(points: &[Vec2]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(pair[1]))
        .sum()
}

fn inspect(path: PathBuf) -> Result<()> {
    let level = load(&path)?;
    println!("name: {}", level.name);
    println!("strokes: {}", level.stroke_count());
    if let Some(cue) = &level.audio_cue {
        println!("audio cue: {cue}");
    }

    for (i, stroke) in level.strokes.iter().enumerate() {
        println!(
            "  stroke {i}: {} waypoints, trace length {:.1}",
            stroke.waypoints.len(),
            polyline_length(&stroke.waypoints)
        );
    }
    println!(
        "full curve: {} points, length {:.1}",
        level.full_curve.len(),
        polyline_length(&level.full_curve)
    );
    Ok(())
}

fn seed(dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    for level in builtin_levels() {
        let file = dir.join(format!("{}.json", level.name.to_ascii_lowercase()));
        let json = serde_json::to_string_pretty(&level)?;
        fs::write(&file, json)
            .with_context(|| format!("failed to write {}", file.display()))?;
        println!("wrote {}", file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_levels_survive_a_seed_round_trip() {
        for level in builtin_levels() {
            let json = serde_json::to_string_pretty(&level).unwrap();
            let parsed = Level::from_json(&json).unwrap();
            assert_eq!(parsed, level);
        }
    }

    #[test]
    fn polyline_length_sums_segments() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 4.0),
            Vec2::new(3.0, 10.0),
        ];
        assert!((polyline_length(&points) - 11.0).abs() < 1e-4);
    }
}
