use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::geometry::{Vec2, distance_to_segment};
use crate::trace_core::FIRST_WAYPOINT_TARGET;

/// Maximum distance, in canvas units, between the traced path and a
/// waypoint or start zone for it to count as reached.
pub const TOUCH_TOLERANCE: f32 = 60.0;

/// Events sent from the high-frequency input context to the logic context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    WaypointReached { stroke: usize, target: usize },
    StrokeCompleted { stroke: usize },
    /// Pointer lifted mid-stroke.
    Mistake { stroke: usize },
}

/// The stroke data the fast context is allowed to trace against.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledStroke {
    pub stroke_index: usize,
    pub waypoints: Vec<Vec2>,
}

#[derive(Debug)]
struct SharedInner {
    stroke: Mutex<Option<InstalledStroke>>,
    locked: AtomicBool,
}

/// The single synchronization primitive between the two contexts: a
/// mutex-guarded installed-stroke cell plus the transition lock.
///
/// The lock is set by the fast context in the same step that detects a
/// qualifying final-waypoint contact, and cleared only by `install`, i.e.
/// only once the logic context has published the next stroke's waypoints.
/// While locked, the sampler treats every pointer sample as an inert no-op,
/// which is what makes "exactly one stroke completion per contact" hold
/// across the asynchronous handoff.
#[derive(Debug, Clone)]
pub struct SharedStroke {
    inner: Arc<SharedInner>,
}

impl SharedStroke {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SharedInner {
                stroke: Mutex::new(None),
                // Locked until the first stroke is installed.
                locked: AtomicBool::new(true),
            }),
        }
    }

    /// Publishes the next stroke's data and releases the transition lock.
    pub fn install(&self, stroke: InstalledStroke) {
        *self.inner.stroke.lock().expect("shared stroke poisoned") = Some(stroke);
        self.inner.locked.store(false, Ordering::Release);
    }

    /// Removes the installed stroke and leaves the lock set; used when the
    /// level is won or torn down, so stray samples stay inert.
    pub fn retire(&self) {
        self.inner.locked.store(true, Ordering::Release);
        *self.inner.stroke.lock().expect("shared stroke poisoned") = None;
    }

    /// Attempts to set the transition lock. Returns `true` only for the
    /// caller that actually flipped it, so a qualifying contact is reported
    /// at most once even if samples race.
    pub fn lock_transition(&self) -> bool {
        !self.inner.locked.swap(true, Ordering::AcqRel)
    }

    pub fn is_locked(&self) -> bool {
        self.inner.locked.load(Ordering::Acquire)
    }

    pub fn installed(&self) -> Option<InstalledStroke> {
        self.inner
            .stroke
            .lock()
            .expect("shared stroke poisoned")
            .clone()
    }
}

impl Default for SharedStroke {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct ActiveGesture {
    stroke_index: usize,
    waypoints: Vec<Vec2>,
    /// Gesture-local target index; always starts at 1 because index 0 is the
    /// contact origin, validated only at pen-down.
    target: usize,
    ink: Vec<Vec2>,
}

/// Pointer-stream consumer running on the input/render loop.
///
/// Owns the active ink exclusively; everyone else sees read-only snapshots.
/// Progression decisions are made here against the installed stroke and
/// reported to the logic context over the event channel.
#[derive(Debug)]
pub struct GestureSampler {
    shared: SharedStroke,
    events: Sender<GestureEvent>,
    gesture: Option<ActiveGesture>,
}

impl GestureSampler {
    pub fn new(shared: SharedStroke, events: Sender<GestureEvent>) -> Self {
        Self {
            shared,
            events,
            gesture: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.gesture.is_some()
    }

    /// The in-progress trace, for rendering only.
    pub fn active_ink(&self) -> &[Vec2] {
        self.gesture.as_ref().map_or(&[], |g| g.ink.as_slice())
    }

    /// Arms drawing only when the touch lands inside the start zone of the
    /// installed stroke. Touches elsewhere are ignored entirely; starting
    /// in the wrong place is not a mistake.
    pub fn pen_down(&mut self, point: Vec2) {
        if self.shared.is_locked() {
            return;
        }
        let Some(installed) = self.shared.installed() else {
            return;
        };
        if point.distance_to(installed.waypoints[0]) >= TOUCH_TOLERANCE {
            return;
        }

        self.gesture = Some(ActiveGesture {
            stroke_index: installed.stroke_index,
            waypoints: installed.waypoints,
            target: FIRST_WAYPOINT_TARGET,
            ink: vec![point],
        });
    }

    /// Extends the active ink and checks the drawn segment against the
    /// current target. The segment check (not a point check) is what keeps a
    /// fast swipe from tunneling past a waypoint between two samples.
    pub fn pen_move(&mut self, point: Vec2) {
        if self.shared.is_locked() {
            return;
        }
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };

        let prev = *gesture.ink.last().expect("active ink starts non-empty");
        gesture.ink.push(point);

        let target_point = gesture.waypoints[gesture.target];
        if distance_to_segment(target_point, prev, point) >= TOUCH_TOLERANCE {
            return;
        }

        if gesture.target == gesture.waypoints.len() - 1 {
            // Qualifying contact with the final waypoint: lock first, in the
            // same step, then report. The lock stays set until the logic
            // context installs the next stroke, so repeated samples cannot
            // complete the stroke twice.
            let stroke = gesture.stroke_index;
            self.gesture = None;
            if self.shared.lock_transition() {
                let _ = self.events.send(GestureEvent::StrokeCompleted { stroke });
            }
        } else {
            // The new target takes effect before the next sample is
            // processed; there is no stale-target window.
            gesture.target += 1;
            let _ = self.events.send(GestureEvent::WaypointReached {
                stroke: gesture.stroke_index,
                target: gesture.target,
            });
        }
    }

    /// Lifting mid-stroke is an incomplete trace and counts as a mistake;
    /// lifting while not armed (or during a transition) is a no-op.
    pub fn pen_up(&mut self) {
        let Some(gesture) = self.gesture.take() else {
            return;
        };
        if self.shared.is_locked() {
            return;
        }
        let _ = self.events.send(GestureEvent::Mistake {
            stroke: gesture.stroke_index,
        });
    }

    /// Drops any in-progress gesture without reporting a mistake; used on
    /// teardown and on externally driven resets.
    pub fn cancel(&mut self) {
        self.gesture = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn sampler_with_stroke(waypoints: Vec<Vec2>) -> (GestureSampler, mpsc::Receiver<GestureEvent>) {
        let shared = SharedStroke::new();
        shared.install(InstalledStroke {
            stroke_index: 0,
            waypoints,
        });
        let (tx, rx) = mpsc::channel();
        (GestureSampler::new(shared, tx), rx)
    }

    fn drain(rx: &mpsc::Receiver<GestureEvent>) -> Vec<GestureEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn pen_down_outside_start_zone_is_silently_ignored() {
        let (mut sampler, rx) = sampler_with_stroke(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(200.0, 0.0),
        ]);

        sampler.pen_down(Vec2::new(200.0, 0.0));
        assert!(!sampler.is_armed());
        sampler.pen_up();
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn pen_down_inside_start_zone_arms_and_starts_ink() {
        let (mut sampler, _rx) = sampler_with_stroke(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(200.0, 0.0),
        ]);

        sampler.pen_down(Vec2::new(30.0, 20.0));
        assert!(sampler.is_armed());
        assert_eq!(sampler.active_ink(), &[Vec2::new(30.0, 20.0)]);
    }

    #[test]
    fn lifting_mid_stroke_reports_a_mistake() {
        let (mut sampler, rx) = sampler_with_stroke(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(500.0, 0.0),
        ]);

        sampler.pen_down(Vec2::new(0.0, 0.0));
        sampler.pen_move(Vec2::new(50.0, 0.0));
        sampler.pen_up();

        assert_eq!(drain(&rx), vec![GestureEvent::Mistake { stroke: 0 }]);
        assert!(!sampler.is_armed());
    }

    #[test]
    fn fast_swipe_over_intermediate_waypoint_is_detected() {
        // Two consecutive samples straddle the waypoint; each sample alone is
        // out of tolerance but the connecting segment passes through it.
        let (mut sampler, rx) = sampler_with_stroke(vec![
            Vec2::new(0.0, 100.0),
            Vec2::new(200.0, 100.0),
            Vec2::new(400.0, 100.0),
        ]);

        sampler.pen_down(Vec2::new(0.0, 100.0));
        sampler.pen_move(Vec2::new(100.0, 100.0));
        assert_eq!(
            drain(&rx),
            vec![GestureEvent::WaypointReached {
                stroke: 0,
                target: 2
            }]
        );
    }

    #[test]
    fn final_waypoint_contact_locks_and_reports_once() {
        let (mut sampler, rx) = sampler_with_stroke(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(150.0, 0.0),
        ]);

        sampler.pen_down(Vec2::new(0.0, 0.0));
        sampler.pen_move(Vec2::new(150.0, 0.0));
        // Further samples while locked are inert, even a replay of the same
        // qualifying sample.
        sampler.pen_move(Vec2::new(150.0, 0.0));
        sampler.pen_up();

        assert_eq!(drain(&rx), vec![GestureEvent::StrokeCompleted { stroke: 0 }]);
        assert!(!sampler.is_armed());
    }

    #[test]
    fn pen_down_while_locked_is_ignored() {
        let (mut sampler, rx) = sampler_with_stroke(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(150.0, 0.0),
        ]);

        sampler.pen_down(Vec2::new(0.0, 0.0));
        sampler.pen_move(Vec2::new(150.0, 0.0));
        drain(&rx);

        sampler.pen_down(Vec2::new(0.0, 0.0));
        assert!(!sampler.is_armed());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn install_clears_the_lock_and_reenables_arming() {
        let shared = SharedStroke::new();
        let (tx, rx) = mpsc::channel();
        let mut sampler = GestureSampler::new(shared.clone(), tx);

        shared.install(InstalledStroke {
            stroke_index: 0,
            waypoints: vec![Vec2::new(0.0, 0.0), Vec2::new(150.0, 0.0)],
        });
        sampler.pen_down(Vec2::new(0.0, 0.0));
        sampler.pen_move(Vec2::new(150.0, 0.0));
        assert!(shared.is_locked());

        shared.install(InstalledStroke {
            stroke_index: 1,
            waypoints: vec![Vec2::new(150.0, 0.0), Vec2::new(150.0, 300.0)],
        });
        assert!(!shared.is_locked());

        sampler.pen_down(Vec2::new(150.0, 0.0));
        assert!(sampler.is_armed());
        drop(rx);
    }

    #[test]
    fn lock_transition_reports_only_the_flipping_caller() {
        let shared = SharedStroke::new();
        shared.install(InstalledStroke {
            stroke_index: 0,
            waypoints: vec![Vec2::ZERO, Vec2::new(1.0, 0.0)],
        });
        assert!(shared.lock_transition());
        assert!(!shared.lock_transition());
    }
}
