//! Scripted driver for the full sampler + session stack.
//!
//! Tests and the headless demo feed synthetic pointer streams through the
//! same channel-and-lock plumbing the headful app uses; only the thread
//! boundary is collapsed (the session is pumped inline).

use crate::geometry::Vec2;
use crate::gesture::GestureSampler;
use crate::level::{Level, LevelError};
use crate::recording::{GestureRecording, PointerSample};
use crate::session::TraceSession;
use crate::trace_core::{TraceEffect, TracePhase, TraceSnapshot};

pub struct TraceHarness {
    session: TraceSession,
    sampler: GestureSampler,
    effects: Vec<TraceEffect>,
}

impl TraceHarness {
    pub fn new(level: Level) -> Result<Self, LevelError> {
        let (session, sampler) = TraceSession::new(level)?;
        Ok(Self {
            session,
            sampler,
            effects: Vec::new(),
        })
    }

    pub fn sampler(&mut self) -> &mut GestureSampler {
        &mut self.sampler
    }

    pub fn snapshot(&self) -> TraceSnapshot {
        self.session.snapshot()
    }

    /// Drains the channel into the accumulated effect log and returns what
    /// arrived on this pump.
    pub fn pump(&mut self) -> Vec<TraceEffect> {
        let effects = self.session.pump();
        self.effects.extend(effects.iter().cloned());
        effects
    }

    pub fn effects(&self) -> &[TraceEffect] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<TraceEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn reset(&mut self, to_phase: Option<TracePhase>) {
        self.sampler.cancel();
        self.session.reset(to_phase);
    }

    pub fn pen_down(&mut self, point: Vec2) {
        self.sampler.pen_down(point);
        self.pump();
    }

    pub fn pen_move(&mut self, point: Vec2) {
        self.sampler.pen_move(point);
        self.pump();
    }

    pub fn pen_up(&mut self) {
        self.sampler.pen_up();
        self.pump();
    }

    /// One perfect gesture over stroke `index`: pen down on the origin,
    /// a sample through every waypoint, pen up.
    pub fn trace_stroke_perfectly(&mut self, index: usize) {
        let waypoints: Vec<Vec2> = self.session.core().level().strokes[index]
            .waypoints
            .clone();
        self.pen_down(waypoints[0]);
        for point in waypoints.iter().skip(1) {
            self.pen_move(*point);
        }
        self.pen_up();
    }

    /// Replays a captured session, pumping the session between samples the
    /// way the interleaved logic loop would. Feeding the raw stream without
    /// pumping would leave the transition lock set across stroke boundaries
    /// and drop the following gesture.
    pub fn replay(&mut self, recording: &GestureRecording) {
        for sample in &recording.samples {
            match *sample {
                PointerSample::Down { x, y } => self.pen_down(Vec2::new(x, y)),
                PointerSample::Move { x, y } => self.pen_move(Vec2::new(x, y)),
                PointerSample::Up => self.pen_up(),
            }
        }
    }
}
