use std::cell::RefCell;
use std::rc::Rc;

use game::audio::NullAudio;
use game::geometry::Vec2;
use game::level::{Level, StrokeSpec};
use game::playtest::TraceHarness;
use game::presenter::{Presenter, WIN_CALLBACK_DELAY};
use game::recording::{GestureRecording, PointerSample};
use game::scoring::Grade;
use game::theme::{Mode, Theme};
use game::trace_core::{TraceEffect, TracePhase};

fn two_stroke_level() -> Level {
    Level::new(
        "V",
        vec![
            StrokeSpec::new(vec![
                Vec2::new(160.0, 160.0),
                Vec2::new(200.0, 320.0),
                Vec2::new(240.0, 480.0),
            ]),
            StrokeSpec::new(vec![
                Vec2::new(240.0, 480.0),
                Vec2::new(280.0, 320.0),
                Vec2::new(320.0, 160.0),
            ]),
        ],
    )
    .unwrap()
}

fn presenter_with_grades() -> (Presenter, Rc<RefCell<Vec<Grade>>>) {
    let grades: Rc<RefCell<Vec<Grade>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = grades.clone();
    let presenter = Presenter::new(Theme::Default, Mode::Standard, Box::new(NullAudio))
        .with_on_complete(move |grade| sink.borrow_mut().push(grade));
    (presenter, grades)
}

fn make_test_mistake(harness: &mut TraceHarness) {
    // Touch the current stroke's start zone, then lift before reaching any
    // waypoint. Stroke 0 starts at (160,160), stroke 1 at (240,480).
    let start = if harness.snapshot().stroke_index == 0 {
        Vec2::new(160.0, 160.0)
    } else {
        Vec2::new(240.0, 480.0)
    };
    harness.pen_down(start);
    harness.pen_up();
}

#[test]
fn scenario_a_perfect_runs_grade_three_stars() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    let (mut presenter, grades) = presenter_with_grades();

    for _ in 0..2 {
        harness.trace_stroke_perfectly(0);
        harness.trace_stroke_perfectly(1);
    }
    presenter.handle_effects(&harness.take_effects());
    presenter.tick(WIN_CALLBACK_DELAY);

    assert_eq!(
        grades.borrow().as_slice(),
        [Grade {
            stars: 3,
            score: 100,
            mistakes: 0
        }]
    );
}

#[test]
fn scenario_a_transitions_to_test_automatically() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    harness.trace_stroke_perfectly(0);
    assert_eq!(harness.snapshot().phase, TracePhase::Practice);

    harness.trace_stroke_perfectly(1);
    let snap = harness.snapshot();
    assert_eq!(snap.phase, TracePhase::Test);
    assert_eq!(snap.stroke_index, 0);
    assert_eq!(snap.waypoint_target, 1);
    assert_eq!(snap.mistakes, 0);
}

#[test]
fn scenario_b_three_test_mistakes_grade_two_stars() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    let (mut presenter, grades) = presenter_with_grades();

    // Practice, with a mistake that must not count toward the score.
    make_test_mistake(&mut harness);
    harness.trace_stroke_perfectly(0);
    harness.trace_stroke_perfectly(1);
    assert_eq!(harness.snapshot().phase, TracePhase::Test);

    for _ in 0..3 {
        make_test_mistake(&mut harness);
    }
    harness.trace_stroke_perfectly(0);
    harness.trace_stroke_perfectly(1);

    presenter.handle_effects(&harness.take_effects());
    presenter.tick(WIN_CALLBACK_DELAY);

    assert_eq!(
        grades.borrow().as_slice(),
        [Grade {
            stars: 2,
            score: 70,
            mistakes: 3
        }]
    );
}

#[test]
fn scenario_c_far_start_touch_changes_nothing() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    let before = harness.snapshot();

    // 200 units from the first waypoint, tolerance is 60.
    harness.pen_down(Vec2::new(360.0, 160.0));
    harness.pen_move(Vec2::new(400.0, 200.0));
    harness.pen_up();

    let after = harness.snapshot();
    assert_eq!(after, before);
    assert!(harness.effects().is_empty());
}

#[test]
fn scenario_d_fast_swipe_cannot_tunnel_past_a_waypoint() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();

    harness.pen_down(Vec2::new(160.0, 160.0));
    // One sample on each side of the middle waypoint (200,320): both are
    // farther than tolerance from it, but the segment passes through it.
    harness.pen_move(Vec2::new(180.0, 240.0));
    harness.pen_move(Vec2::new(220.0, 400.0));

    assert_eq!(harness.snapshot().waypoint_target, 2);
    assert!(harness
        .effects()
        .iter()
        .any(|e| matches!(e, TraceEffect::WaypointAdvanced { target: 2, .. })));
}

#[test]
fn lifting_mid_stroke_counts_one_mistake_and_resets_target() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    harness.trace_stroke_perfectly(0);
    assert_eq!(harness.snapshot().stroke_index, 1);

    harness.pen_down(Vec2::new(240.0, 480.0));
    harness.pen_move(Vec2::new(280.0, 320.0)); // reaches waypoint 1
    assert_eq!(harness.snapshot().waypoint_target, 2);

    harness.pen_up();
    let snap = harness.snapshot();
    assert_eq!(snap.mistakes, 1);
    assert_eq!(snap.waypoint_target, 1);
    assert_eq!(snap.stroke_index, 1);
}

#[test]
fn duplicate_samples_while_locked_yield_one_completion() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    let (mut presenter, grades) = presenter_with_grades();

    harness.trace_stroke_perfectly(0);
    harness.trace_stroke_perfectly(1); // -> Test
    harness.trace_stroke_perfectly(0);

    // Final stroke of the test phase, with the qualifying sample replayed
    // while the transition lock is held.
    harness.pen_down(Vec2::new(240.0, 480.0));
    harness.pen_move(Vec2::new(280.0, 320.0));
    harness.sampler().pen_move(Vec2::new(320.0, 160.0));
    harness.sampler().pen_move(Vec2::new(320.0, 160.0));
    harness.sampler().pen_move(Vec2::new(320.0, 160.0));
    harness.pump();
    harness.pen_up();

    let wins = harness
        .effects()
        .iter()
        .filter(|e| matches!(e, TraceEffect::LevelWon { .. }))
        .count();
    assert_eq!(wins, 1);

    presenter.handle_effects(&harness.take_effects());
    presenter.tick(WIN_CALLBACK_DELAY);
    presenter.tick(WIN_CALLBACK_DELAY);
    assert_eq!(grades.borrow().len(), 1);
}

#[test]
fn recorded_session_replays_to_the_same_outcome() {
    let mut recording = GestureRecording::new("V");
    for _ in 0..2 {
        for (start, mid, end) in [
            ((160.0, 160.0), (200.0, 320.0), (240.0, 480.0)),
            ((240.0, 480.0), (280.0, 320.0), (320.0, 160.0)),
        ] {
            recording.push(PointerSample::Down {
                x: start.0,
                y: start.1,
            });
            recording.push(PointerSample::Move { x: mid.0, y: mid.1 });
            recording.push(PointerSample::Move { x: end.0, y: end.1 });
            recording.push(PointerSample::Up);
        }
    }

    let parsed = GestureRecording::from_json(&recording.to_json().unwrap()).unwrap();

    let mut live = TraceHarness::new(two_stroke_level()).unwrap();
    live.replay(&recording);
    let mut replayed = TraceHarness::new(two_stroke_level()).unwrap();
    replayed.replay(&parsed);

    assert!(live.snapshot().won);
    assert_eq!(live.snapshot(), replayed.snapshot());
    assert_eq!(live.effects(), replayed.effects());
}

#[test]
fn replaying_one_stroke_advances_to_the_next() {
    let mut harness = TraceHarness::new(two_stroke_level()).unwrap();
    let mut stroke1 = GestureRecording::new("V");
    stroke1.push(PointerSample::Down { x: 160.0, y: 160.0 });
    stroke1.push(PointerSample::Move { x: 200.0, y: 320.0 });
    stroke1.push(PointerSample::Move { x: 240.0, y: 480.0 });
    stroke1.push(PointerSample::Up);

    harness.replay(&stroke1);
    assert_eq!(harness.snapshot().stroke_index, 1);
    assert_eq!(harness.snapshot().mistakes, 0);
}
