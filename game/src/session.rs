use std::sync::mpsc::{Receiver, channel};

use crate::gesture::{GestureEvent, GestureSampler, InstalledStroke, SharedStroke};
use crate::level::{Level, LevelError};
use crate::trace_core::{TraceCore, TraceEffect, TracePhase, TraceSnapshot};

/// The application-logic side of the split: owns the progression state
/// machine, consumes gesture events from the channel, and publishes each
/// next stroke back into the shared cell (which is what releases the
/// transition lock).
///
/// `pump()` is non-blocking so tests and single-threaded hosts can drive it
/// inline; `pump_blocking()` parks on the channel for a dedicated logic
/// thread.
#[derive(Debug)]
pub struct TraceSession {
    core: TraceCore,
    events: Receiver<GestureEvent>,
    shared: SharedStroke,
}

impl TraceSession {
    /// Builds the session plus the sampler wired to it. The sampler is
    /// handed to the input context; the session stays with the logic
    /// context.
    pub fn new(level: Level) -> Result<(Self, GestureSampler), LevelError> {
        let core = TraceCore::new(level)?;
        let shared = SharedStroke::new();
        let (tx, rx) = channel();
        let sampler = GestureSampler::new(shared.clone(), tx);
        let session = Self {
            core,
            events: rx,
            shared,
        };
        session.install_current_stroke();
        Ok((session, sampler))
    }

    pub fn snapshot(&self) -> TraceSnapshot {
        self.core.snapshot()
    }

    pub fn core(&self) -> &TraceCore {
        &self.core
    }

    pub fn shared(&self) -> &SharedStroke {
        &self.shared
    }

    /// Drains all pending gesture events and returns the effects they
    /// produced, in order.
    pub fn pump(&mut self) -> Vec<TraceEffect> {
        let mut effects = Vec::new();
        loop {
            let Ok(event) = self.events.try_recv() else {
                break;
            };
            if let Some(effect) = self.apply(event) {
                effects.push(effect);
            }
        }
        effects
    }

    /// Blocks until at least one gesture event arrives, then drains the
    /// rest. Returns `None` once the sampler side has hung up.
    pub fn pump_blocking(&mut self) -> Option<Vec<TraceEffect>> {
        let first = self.events.recv().ok()?;
        let mut effects = Vec::new();
        if let Some(effect) = self.apply(first) {
            effects.push(effect);
        }
        effects.extend(self.pump());
        Some(effects)
    }

    /// Restarts the level, clearing counters and re-publishing stroke 0.
    pub fn reset(&mut self, to_phase: Option<TracePhase>) {
        self.core.reset(to_phase);
        // Drop gesture events that raced the reset.
        while self.events.try_recv().is_ok() {}
        self.install_current_stroke();
    }

    /// Stops consuming input permanently; stray samples become inert.
    pub fn retire(&self) {
        self.shared.retire();
    }

    fn apply(&mut self, event: GestureEvent) -> Option<TraceEffect> {
        match event {
            GestureEvent::WaypointReached { .. } => self.core.advance_waypoint(),
            GestureEvent::StrokeCompleted { .. } => {
                let effect = self.core.complete_stroke()?;
                match effect {
                    TraceEffect::StrokeCommitted { .. } | TraceEffect::PhaseChanged { .. } => {
                        // Publishing the next stroke is what clears the
                        // transition lock.
                        self.install_current_stroke();
                    }
                    TraceEffect::LevelWon { .. } => {
                        // Terminal: the lock stays set, no further input.
                        self.shared.retire();
                    }
                    _ => {}
                }
                Some(effect)
            }
            GestureEvent::Mistake { .. } => self.core.register_mistake(),
        }
    }

    fn install_current_stroke(&self) {
        let stroke = self.core.current_stroke();
        self.shared.install(InstalledStroke {
            stroke_index: self.core.stroke_index(),
            waypoints: stroke.waypoints.clone(),
        });
    }
}
