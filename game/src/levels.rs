//! Built-in seed levels on a 480x640 canvas.
//!
//! Waypoint coordinates double as the renderable curve for these simple
//! shapes; authored levels can supply a denser `curve` polyline per stroke.

use crate::geometry::Vec2;
use crate::level::{Level, StrokeSpec};

fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

fn full_curve_of(strokes: &[StrokeSpec]) -> Vec<Vec2> {
    strokes
        .iter()
        .flat_map(|s| s.reference_curve().iter().copied())
        .collect()
}

fn level(name: &str, cue: &str, strokes: Vec<StrokeSpec>) -> Level {
    let full_curve = full_curve_of(&strokes);
    Level::new(name, strokes)
        .expect("built-in level data is well formed")
        .with_full_curve(full_curve)
        .with_audio_cue(cue)
}

pub fn letter_l() -> Level {
    level(
        "L",
        "letter_l",
        vec![StrokeSpec::new(vec![
            v(180.0, 160.0),
            v(180.0, 320.0),
            v(180.0, 480.0),
            v(300.0, 480.0),
        ])],
    )
}

pub fn letter_v() -> Level {
    level(
        "V",
        "letter_v",
        vec![
            StrokeSpec::new(vec![v(160.0, 160.0), v(200.0, 320.0), v(240.0, 480.0)]),
            StrokeSpec::new(vec![v(240.0, 480.0), v(280.0, 320.0), v(320.0, 160.0)]),
        ],
    )
}

pub fn letter_t() -> Level {
    level(
        "T",
        "letter_t",
        vec![
            StrokeSpec::new(vec![v(160.0, 160.0), v(240.0, 160.0), v(320.0, 160.0)]),
            StrokeSpec::new(vec![v(240.0, 160.0), v(240.0, 320.0), v(240.0, 480.0)]),
        ],
    )
}

pub fn digit_one() -> Level {
    level(
        "1",
        "digit_one",
        vec![StrokeSpec::new(vec![
            v(200.0, 220.0),
            v(250.0, 170.0),
            v(250.0, 480.0),
        ])],
    )
}

pub fn builtin_levels() -> Vec<Level> {
    vec![letter_l(), letter_v(), letter_t(), digit_one()]
}

pub fn builtin_level(name: &str) -> Option<Level> {
    builtin_levels()
        .into_iter()
        .find(|level| level.name.eq_ignore_ascii_case(name))
}
