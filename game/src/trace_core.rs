use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::level::{Level, LevelError, StrokeSpec};
use crate::scoring::Grade;

/// Waypoint index 0 is a stroke's contact origin, validated only at gesture
/// start; the first *target* is always index 1.
pub const FIRST_WAYPOINT_TARGET: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TracePhase {
    /// Guided repetition: targets visible, mistakes do not count toward score.
    Practice,
    /// Unaided repetition of the same level, scored.
    Test,
}

/// Effects reported by the state machine's transition operations.
///
/// The core mutates itself and describes what happened; audio, banners and
/// callbacks stay in the presentation layer so the machine is deterministic
/// and easy to test.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEffect {
    WaypointAdvanced {
        stroke: usize,
        target: usize,
    },
    /// A mid-level stroke finished; its reference curve joined committed ink.
    StrokeCommitted {
        stroke: usize,
        next_stroke: usize,
    },
    /// Last practice stroke finished; the level restarts unaided.
    PhaseChanged {
        phase: TracePhase,
    },
    LevelWon {
        grade: Grade,
    },
    MistakeRegistered {
        mistakes: u32,
    },
}

/// Read-only view of progression state for rendering and UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSnapshot {
    pub level_name: String,
    pub phase: TracePhase,
    pub won: bool,
    pub stroke_index: usize,
    pub waypoint_target: usize,
    pub mistakes: u32,
    pub committed_ink: Vec<Vec<Vec2>>,
}

/// The progression state machine for one tracing level.
///
/// Owns phase, stroke/waypoint position, the mistake counter, the win flag
/// and committed ink. State is mutated exclusively through the transition
/// operations below, by a single serialized consumer; callers guarantee that
/// `advance_waypoint` and `complete_stroke` follow qualifying contacts.
#[derive(Debug, Clone)]
pub struct TraceCore {
    level: Level,
    phase: TracePhase,
    stroke_index: usize,
    waypoint_target: usize,
    mistakes: u32,
    won: bool,
    committed_ink: Vec<Vec<Vec2>>,
}

impl TraceCore {
    /// Fails on malformed level data rather than starting in an
    /// inconsistent state.
    pub fn new(level: Level) -> Result<Self, LevelError> {
        level.validate()?;
        Ok(Self {
            level,
            phase: TracePhase::Practice,
            stroke_index: 0,
            waypoint_target: FIRST_WAYPOINT_TARGET,
            mistakes: 0,
            won: false,
            committed_ink: Vec::new(),
        })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn phase(&self) -> TracePhase {
        self.phase
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn stroke_index(&self) -> usize {
        self.stroke_index
    }

    pub fn waypoint_target(&self) -> usize {
        self.waypoint_target
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn current_stroke(&self) -> &StrokeSpec {
        &self.level.strokes[self.stroke_index]
    }

    pub fn committed_ink(&self) -> &[Vec<Vec2>] {
        &self.committed_ink
    }

    pub fn snapshot(&self) -> TraceSnapshot {
        TraceSnapshot {
            level_name: self.level.name.clone(),
            phase: self.phase,
            won: self.won,
            stroke_index: self.stroke_index,
            waypoint_target: self.waypoint_target,
            mistakes: self.mistakes,
            committed_ink: self.committed_ink.clone(),
        }
    }

    /// Moves the target to the next waypoint of the current stroke.
    ///
    /// No range validation happens here: the caller invokes this only after
    /// a qualifying contact with a non-final waypoint, so the new target is
    /// always in bounds.
    pub fn advance_waypoint(&mut self) -> Option<TraceEffect> {
        if self.won {
            return None;
        }
        self.waypoint_target += 1;
        Some(TraceEffect::WaypointAdvanced {
            stroke: self.stroke_index,
            target: self.waypoint_target,
        })
    }

    /// Ends the current stroke after a qualifying final-waypoint contact.
    pub fn complete_stroke(&mut self) -> Option<TraceEffect> {
        if self.won {
            return None;
        }

        if self.stroke_index == self.level.last_stroke_index() {
            return Some(self.complete_last_stroke());
        }

        let finished = self.stroke_index;
        self.committed_ink
            .push(self.level.strokes[finished].reference_curve().to_vec());
        self.stroke_index += 1;
        self.waypoint_target = FIRST_WAYPOINT_TARGET;
        Some(TraceEffect::StrokeCommitted {
            stroke: finished,
            next_stroke: self.stroke_index,
        })
    }

    fn complete_last_stroke(&mut self) -> TraceEffect {
        match self.phase {
            TracePhase::Practice => {
                // Practice is a warm-up: its mistakes never count toward the
                // score, and its ink is wiped for the unaided run.
                self.phase = TracePhase::Test;
                self.stroke_index = 0;
                self.waypoint_target = FIRST_WAYPOINT_TARGET;
                self.mistakes = 0;
                self.committed_ink.clear();
                TraceEffect::PhaseChanged {
                    phase: TracePhase::Test,
                }
            }
            TracePhase::Test => {
                let finished = self.stroke_index;
                self.committed_ink
                    .push(self.level.strokes[finished].reference_curve().to_vec());
                self.won = true;
                TraceEffect::LevelWon {
                    grade: Grade::from_mistakes(self.mistakes),
                }
            }
        }
    }

    /// Records a failed trace attempt: the current stroke restarts from its
    /// origin. The stroke index never regresses.
    pub fn register_mistake(&mut self) -> Option<TraceEffect> {
        if self.won {
            return None;
        }
        self.mistakes = self.mistakes.saturating_add(1);
        self.waypoint_target = FIRST_WAYPOINT_TARGET;
        Some(TraceEffect::MistakeRegistered {
            mistakes: self.mistakes,
        })
    }

    /// Reinitializes all counters and ink, e.g. for "try again" flows.
    ///
    /// The phase is preserved unless the caller restarts at an explicit
    /// phase; a won level restarts at practice when no phase is given.
    pub fn reset(&mut self, to_phase: Option<TracePhase>) {
        self.phase = match to_phase {
            Some(phase) => phase,
            None if self.won => TracePhase::Practice,
            None => self.phase,
        };
        self.stroke_index = 0;
        self.waypoint_target = FIRST_WAYPOINT_TARGET;
        self.mistakes = 0;
        self.won = false;
        self.committed_ink.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stroke_level() -> Level {
        Level::new(
            "V",
            vec![
                StrokeSpec::new(vec![
                    Vec2::new(0.0, 0.0),
                    Vec2::new(50.0, 100.0),
                ]),
                StrokeSpec::new(vec![
                    Vec2::new(50.0, 100.0),
                    Vec2::new(100.0, 0.0),
                ]),
            ],
        )
        .unwrap()
    }

    fn finish_stroke(core: &mut TraceCore) -> TraceEffect {
        core.complete_stroke().expect("not won yet")
    }

    #[test]
    fn starts_at_first_stroke_first_target() {
        let core = TraceCore::new(two_stroke_level()).unwrap();
        assert_eq!(core.phase(), TracePhase::Practice);
        assert_eq!(core.stroke_index(), 0);
        assert_eq!(core.waypoint_target(), FIRST_WAYPOINT_TARGET);
        assert!(!core.is_won());
    }

    #[test]
    fn mid_level_stroke_completion_advances_and_commits_curve() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        let effect = finish_stroke(&mut core);
        assert_eq!(
            effect,
            TraceEffect::StrokeCommitted {
                stroke: 0,
                next_stroke: 1
            }
        );
        assert_eq!(core.stroke_index(), 1);
        assert_eq!(core.waypoint_target(), FIRST_WAYPOINT_TARGET);
        assert_eq!(core.committed_ink().len(), 1);
    }

    #[test]
    fn last_practice_stroke_transitions_to_test_and_clears_state() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        core.register_mistake();
        core.register_mistake();
        finish_stroke(&mut core);
        let effect = finish_stroke(&mut core);

        assert_eq!(
            effect,
            TraceEffect::PhaseChanged {
                phase: TracePhase::Test
            }
        );
        assert_eq!(core.phase(), TracePhase::Test);
        assert_eq!(core.stroke_index(), 0);
        assert_eq!(core.waypoint_target(), FIRST_WAYPOINT_TARGET);
        // Practice mistakes do not carry into the scored phase.
        assert_eq!(core.mistakes(), 0);
        assert!(core.committed_ink().is_empty());
    }

    #[test]
    fn last_test_stroke_wins_with_grade() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        finish_stroke(&mut core);
        finish_stroke(&mut core); // -> Test
        core.register_mistake();
        finish_stroke(&mut core);
        let effect = finish_stroke(&mut core);

        assert_eq!(
            effect,
            TraceEffect::LevelWon {
                grade: Grade {
                    stars: 3,
                    score: 90,
                    mistakes: 1
                }
            }
        );
        assert!(core.is_won());
    }

    #[test]
    fn won_is_terminal_for_all_operations() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        for _ in 0..4 {
            finish_stroke(&mut core);
        }
        assert!(core.is_won());

        assert_eq!(core.advance_waypoint(), None);
        assert_eq!(core.complete_stroke(), None);
        assert_eq!(core.register_mistake(), None);
        assert_eq!(core.mistakes(), 0);
    }

    #[test]
    fn mistake_resets_target_but_not_stroke() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        finish_stroke(&mut core);
        core.advance_waypoint();
        let effect = core.register_mistake().unwrap();

        assert_eq!(effect, TraceEffect::MistakeRegistered { mistakes: 1 });
        assert_eq!(core.stroke_index(), 1);
        assert_eq!(core.waypoint_target(), FIRST_WAYPOINT_TARGET);
    }

    #[test]
    fn reset_preserves_phase_by_default() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        finish_stroke(&mut core);
        finish_stroke(&mut core); // -> Test
        core.register_mistake();

        core.reset(None);
        assert_eq!(core.phase(), TracePhase::Test);
        assert_eq!(core.stroke_index(), 0);
        assert_eq!(core.mistakes(), 0);
    }

    #[test]
    fn reset_to_practice_restarts_the_curriculum() {
        let mut core = TraceCore::new(two_stroke_level()).unwrap();
        for _ in 0..4 {
            finish_stroke(&mut core);
        }
        assert!(core.is_won());

        core.reset(Some(TracePhase::Practice));
        assert!(!core.is_won());
        assert_eq!(core.phase(), TracePhase::Practice);
        assert_eq!(core.waypoint_target(), FIRST_WAYPOINT_TARGET);
    }

    #[test]
    fn rejects_malformed_levels() {
        let level = Level {
            name: "bad".to_string(),
            strokes: vec![StrokeSpec::new(vec![Vec2::ZERO])],
            full_curve: Vec::new(),
            audio_cue: None,
        };
        assert!(TraceCore::new(level).is_err());
    }
}
