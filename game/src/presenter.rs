use std::time::Duration;

use engine::graphics::{Renderer2d, text_width};
use engine::ui::{Anchor, Rect, Size};

use crate::audio::AudioService;
use crate::geometry::Vec2;
use crate::level::Level;
use crate::scoring::Grade;
use crate::sfx::{CUE_MISTAKE, CUE_PHASE_TEST, CUE_STROKE_DONE, CUE_WAYPOINT, CUE_WIN};
use crate::theme::{Mode, Theme};
use crate::trace_core::{TraceEffect, TracePhase, TraceSnapshot};

/// How long the "TEST" banner stays emphasized after the phase flips.
pub const PHASE_BANNER_DELAY: Duration = Duration::from_millis(1200);
/// Pause between win detection and the completion callback, so the player
/// sees the finished shape before the screen moves on.
pub const WIN_CALLBACK_DELAY: Duration = Duration::from_millis(1500);

const INK_WIDTH: f32 = 7.0;
const GUIDE_WIDTH: f32 = 3.0;
const MARKER_RADIUS: f32 = 14.0;

/// A scheduled, cancellable delayed action, advanced by the frame tick.
///
/// Timers live here in the presentation layer, never in the state machine;
/// tearing the screen down cancels them all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelayTimer {
    remaining: Option<Duration>,
}

impl DelayTimer {
    pub const fn idle() -> Self {
        Self { remaining: None }
    }

    pub fn start(&mut self, delay: Duration) {
        self.remaining = Some(delay);
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_running(&self) -> bool {
        self.remaining.is_some()
    }

    /// Advances the timer; returns `true` on the tick where it elapses.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(left) = self.remaining else {
            return false;
        };
        if dt >= left {
            self.remaining = None;
            true
        } else {
            self.remaining = Some(left - dt);
            false
        }
    }
}

/// Presentation adapter: draws ink, guide markers and the mode banner, and
/// routes transition effects to the audio collaborator and the level
/// callbacks. Holds no progression state of its own beyond the two delay
/// timers and the pending grade.
pub struct Presenter {
    theme: Theme,
    mode: Mode,
    audio: Box<dyn AudioService>,
    banner_timer: DelayTimer,
    win_timer: DelayTimer,
    pending_grade: Option<Grade>,
    completion_fired: bool,
    exit_fired: bool,
    on_complete: Option<Box<dyn FnMut(Grade)>>,
    on_exit: Option<Box<dyn FnMut()>>,
}

impl Presenter {
    pub fn new(theme: Theme, mode: Mode, mut audio: Box<dyn AudioService>) -> Self {
        audio.load();
        Self {
            theme,
            mode,
            audio,
            banner_timer: DelayTimer::idle(),
            win_timer: DelayTimer::idle(),
            pending_grade: None,
            completion_fired: false,
            exit_fired: false,
            on_complete: None,
            on_exit: None,
        }
    }

    /// Called exactly once per level, after the win delay elapses.
    pub fn with_on_complete(mut self, f: impl FnMut(Grade) + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called when the player abandons the level; carries no payload.
    pub fn with_on_exit(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_exit = Some(Box::new(f));
        self
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Plays an arbitrary cue through the collaborator (e.g. a level's
    /// intro sound named by `Level::audio_cue`).
    pub fn play_cue(&self, cue: &str) {
        self.audio.play(cue);
    }

    /// Routes state-machine effects to audio and the delay timers.
    pub fn handle_effects(&mut self, effects: &[TraceEffect]) {
        for effect in effects {
            match effect {
                TraceEffect::WaypointAdvanced { .. } => {
                    self.audio.play(CUE_WAYPOINT);
                }
                TraceEffect::StrokeCommitted { .. } => {
                    self.audio.play(CUE_STROKE_DONE);
                }
                TraceEffect::MistakeRegistered { .. } => {
                    self.audio.play(CUE_MISTAKE);
                }
                TraceEffect::PhaseChanged { .. } => {
                    self.audio.play(CUE_PHASE_TEST);
                    self.banner_timer.start(PHASE_BANNER_DELAY);
                }
                TraceEffect::LevelWon { grade } => {
                    self.audio.play(CUE_WIN);
                    self.pending_grade = Some(*grade);
                    self.win_timer.start(WIN_CALLBACK_DELAY);
                }
            }
        }
    }

    /// Advances the delay timers; fires the completion callback on the tick
    /// where the win delay elapses.
    pub fn tick(&mut self, dt: Duration) {
        self.banner_timer.tick(dt);
        if self.win_timer.tick(dt) && !self.completion_fired {
            self.completion_fired = true;
            if let (Some(callback), Some(grade)) = (self.on_complete.as_mut(), self.pending_grade)
            {
                callback(grade);
            }
        }
    }

    /// Tears the presentation down: cancels pending timers and, if the level
    /// was not completed, reports the abandonment.
    pub fn abandon(&mut self) {
        self.banner_timer.cancel();
        self.win_timer.cancel();
        if self.completion_fired || self.exit_fired {
            return;
        }
        self.exit_fired = true;
        if let Some(callback) = self.on_exit.as_mut() {
            callback();
        }
    }

    pub fn completion_fired(&self) -> bool {
        self.completion_fired
    }

    /// Draws one frame: reference curve, committed and active ink, guide
    /// markers (practice only) and the banner line.
    pub fn render(
        &self,
        gfx: &mut dyn Renderer2d,
        level: &Level,
        snapshot: &TraceSnapshot,
        active_ink: &[Vec2],
    ) {
        let palette = self.theme.palette();
        gfx.clear(palette.background);

        let practice = snapshot.phase == TracePhase::Practice && !snapshot.won;

        // Faint reference shape, revealed fully only while guided.
        if practice && self.mode.shows_reference_curve() && !level.full_curve.is_empty() {
            gfx.stroke_polyline(&points_of(&level.full_curve), GUIDE_WIDTH, palette.guide);
        }

        for stroke in &snapshot.committed_ink {
            gfx.stroke_polyline(&points_of(stroke), INK_WIDTH, palette.committed_ink);
        }
        if !active_ink.is_empty() {
            gfx.stroke_polyline(&points_of(active_ink), INK_WIDTH, palette.ink);
        }

        if practice {
            self.draw_guide_markers(gfx, level, snapshot, palette.marker);
        }

        self.draw_banner(gfx, snapshot, palette.banner_text);
    }

    fn draw_guide_markers(
        &self,
        gfx: &mut dyn Renderer2d,
        level: &Level,
        snapshot: &TraceSnapshot,
        color: engine::graphics::Color,
    ) {
        let Some(stroke) = level.strokes.get(snapshot.stroke_index) else {
            return;
        };
        let start = stroke.waypoints[0];
        gfx.ring([start.x, start.y], MARKER_RADIUS, 3.0, color);

        if let Some(target) = stroke.waypoints.get(snapshot.waypoint_target) {
            gfx.fill_circle([target.x, target.y], MARKER_RADIUS * 0.5, color);
        }
    }

    fn draw_banner(
        &self,
        gfx: &mut dyn Renderer2d,
        snapshot: &TraceSnapshot,
        color: engine::graphics::Color,
    ) {
        let text = if snapshot.won {
            let grade = self
                .pending_grade
                .unwrap_or_else(|| Grade::from_mistakes(snapshot.mistakes));
            format!(
                "{} DONE! STARS {} SCORE {}",
                snapshot.level_name, grade.stars, grade.score
            )
        } else {
            let phase = match snapshot.phase {
                TracePhase::Practice => "PRACTICE",
                TracePhase::Test => "TEST",
            };
            let mode_label = self.mode.banner_label();
            if mode_label.is_empty() {
                format!("{} - {}", snapshot.level_name, phase)
            } else {
                format!("{} - {} {}", snapshot.level_name, mode_label, phase)
            }
        };

        // The banner grows while the phase-change emphasis timer runs.
        let scale = if self.banner_timer.is_running() { 4 } else { 2 };
        let size = gfx.size();
        let width = text_width(&text, scale);
        let rect = Rect::from_size(size.width, size.height)
            .place(Size::new(width, 16 * scale), Anchor::TopCenter);
        gfx.draw_text_scaled(rect.x, rect.y.saturating_add(8), &text, color, scale);
    }
}

fn points_of(points: &[Vec2]) -> Vec<[f32; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::RecordingAudio;
    use crate::scoring::Grade;
    use crate::trace_core::TracePhase;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn presenter_with_audio() -> (Presenter, Rc<RefCell<Vec<String>>>) {
        let (audio, cues) = RecordingAudio::new();
        (
            Presenter::new(Theme::Default, Mode::Standard, Box::new(audio)),
            cues,
        )
    }

    #[test]
    fn timer_fires_once_after_its_delay() {
        let mut timer = DelayTimer::idle();
        timer.start(Duration::from_millis(100));
        assert!(!timer.tick(Duration::from_millis(40)));
        assert!(!timer.tick(Duration::from_millis(40)));
        assert!(timer.tick(Duration::from_millis(40)));
        assert!(!timer.tick(Duration::from_millis(40)));
    }

    #[test]
    fn cancel_stops_a_running_timer() {
        let mut timer = DelayTimer::idle();
        timer.start(Duration::from_millis(50));
        timer.cancel();
        assert!(!timer.tick(Duration::from_secs(10)));
    }

    #[test]
    fn effects_map_to_audio_cues() {
        let (mut presenter, cues) = presenter_with_audio();
        presenter.handle_effects(&[
            TraceEffect::WaypointAdvanced {
                stroke: 0,
                target: 2,
            },
            TraceEffect::MistakeRegistered { mistakes: 1 },
            TraceEffect::PhaseChanged {
                phase: TracePhase::Test,
            },
        ]);
        assert_eq!(
            cues.borrow().as_slice(),
            ["waypoint", "mistake", "phase_test"]
        );
        assert!(presenter.banner_timer.is_running());
    }

    #[test]
    fn completion_callback_fires_exactly_once_after_win_delay() {
        let (presenter, _cues) = presenter_with_audio();
        let grades: Rc<RefCell<Vec<Grade>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = grades.clone();
        let mut presenter = presenter.with_on_complete(move |g| sink.borrow_mut().push(g));

        let grade = Grade::from_mistakes(0);
        presenter.handle_effects(&[TraceEffect::LevelWon { grade }]);
        assert!(grades.borrow().is_empty());

        presenter.tick(WIN_CALLBACK_DELAY);
        // A duplicate win effect or extra ticks must not re-fire.
        presenter.handle_effects(&[TraceEffect::LevelWon { grade }]);
        presenter.tick(WIN_CALLBACK_DELAY);
        presenter.tick(WIN_CALLBACK_DELAY);

        assert_eq!(grades.borrow().as_slice(), [grade]);
    }

    #[test]
    fn abandon_cancels_the_win_delay_and_reports_exit() {
        let (presenter, _cues) = presenter_with_audio();
        let completed = Rc::new(RefCell::new(0u32));
        let exited = Rc::new(RefCell::new(0u32));
        let c = completed.clone();
        let e = exited.clone();
        let mut presenter = presenter
            .with_on_complete(move |_| *c.borrow_mut() += 1)
            .with_on_exit(move || *e.borrow_mut() += 1);

        presenter.handle_effects(&[TraceEffect::LevelWon {
            grade: Grade::from_mistakes(2),
        }]);
        presenter.abandon();
        presenter.tick(WIN_CALLBACK_DELAY);

        assert_eq!(*completed.borrow(), 0);
        assert_eq!(*exited.borrow(), 1);

        // Abandoning twice stays a single exit report.
        presenter.abandon();
        assert_eq!(*exited.borrow(), 1);
    }
}
