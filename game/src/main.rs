use game::levels::builtin_level;
use game::playtest::TraceHarness;
use game::trace_core::TraceEffect;

fn main() {
    let name = std::env::args().nth(1).unwrap_or_else(|| "V".to_string());
    let Some(level) = builtin_level(&name) else {
        eprintln!("warning: unknown level {name:?}, available: L V T 1");
        std::process::exit(2);
    };

    let stroke_count = level.stroke_count();
    let mut harness = TraceHarness::new(level).expect("built-in level is valid");

    // Practice run, then the scored test run.
    for _ in 0..2 {
        for stroke in 0..stroke_count {
            harness.trace_stroke_perfectly(stroke);
        }
    }

    let grade = harness.effects().iter().find_map(|effect| match effect {
        TraceEffect::LevelWon { grade } => Some(*grade),
        _ => None,
    });

    match grade {
        Some(grade) => println!(
            "level {} complete: stars {} score {} mistakes {}",
            name, grade.stars, grade.score, grade.mistakes
        ),
        None => println!("level {name} not completed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_demo_wins_every_builtin_level() {
        for name in ["L", "V", "T", "1"] {
            let level = builtin_level(name).unwrap();
            let strokes = level.stroke_count();
            let mut harness = TraceHarness::new(level).unwrap();
            for _ in 0..2 {
                for stroke in 0..strokes {
                    harness.trace_stroke_perfectly(stroke);
                }
            }
            assert!(harness.snapshot().won, "level {name} did not complete");
        }
    }
}
