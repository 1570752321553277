use std::cell::Cell;
use std::collections::VecDeque;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use engine::app::{AppConfig, AppContext, AppHandler, run_app};
use engine::pixels_renderer::env_bool;
use engine::surface::SurfaceSize;
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};
use winit::event_loop::ControlFlow;

use game::audio::{AudioService, NullAudio};
use game::geometry::Vec2;
use game::gesture::GestureSampler;
use game::level::Level;
use game::levels::builtin_level;
use game::presenter::Presenter;
use game::recording::{GestureRecording, PointerSample};
use game::session::TraceSession;
use game::sfx::{
    CUE_MISTAKE, CUE_PHASE_TEST, CUE_STROKE_DONE, CUE_WAYPOINT, CUE_WIN, MISTAKE_SFX_VOLUME,
    STROKE_SFX_VOLUME, WAYPOINT_SFX_VOLUME, WIN_SFX_VOLUME,
};
use game::theme::{Mode, Theme};
use game::trace_core::{TraceEffect, TracePhase, TraceSnapshot};

/// Poll cadence of the application-logic thread. Gesture events wake the
/// pump immediately through the channel; this only bounds command latency.
const LOGIC_POLL: Duration = Duration::from_millis(5);

enum LogicCmd {
    Reset(Option<TracePhase>),
}

type LogicUpdate = (Vec<TraceEffect>, TraceSnapshot);

/// The lower-frequency application-logic context: owns the session, drains
/// gesture events, and reports effects + snapshots back to the UI thread.
fn spawn_logic_thread(
    mut session: TraceSession,
    commands: Receiver<LogicCmd>,
    updates: Sender<LogicUpdate>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match commands.recv_timeout(LOGIC_POLL) {
                Ok(LogicCmd::Reset(phase)) => {
                    session.reset(phase);
                    let _ = updates.send((Vec::new(), session.snapshot()));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let effects = session.pump();
            if !effects.is_empty() {
                let _ = updates.send((effects, session.snapshot()));
            }
        }
    })
}

struct HeadfulApp {
    level: Level,
    sampler: GestureSampler,
    presenter: Presenter,
    snapshot: TraceSnapshot,
    updates: Receiver<LogicUpdate>,
    commands: Sender<LogicCmd>,
    logic: Option<JoinHandle<()>>,
    finished: Rc<Cell<bool>>,
    mouse_pos: Vec2,
    pointer_down: bool,
    last_tick: Instant,
    recording: Option<GestureRecording>,
    record_path: Option<PathBuf>,
    replay_queue: VecDeque<PointerSample>,
}

impl HeadfulApp {
    fn record(&mut self, sample: PointerSample) {
        if let Some(recording) = self.recording.as_mut() {
            recording.push(sample);
        }
    }

    fn drain_updates(&mut self) {
        while let Ok((effects, snapshot)) = self.updates.try_recv() {
            self.presenter.handle_effects(&effects);
            self.snapshot = snapshot;
        }
    }

    fn handle_key(&mut self, key: VirtualKeyCode, control_flow: &mut ControlFlow) {
        match key {
            VirtualKeyCode::Escape => self.quit(control_flow),
            VirtualKeyCode::R => {
                self.sampler.cancel();
                let _ = self.commands.send(LogicCmd::Reset(None));
            }
            VirtualKeyCode::P => {
                self.sampler.cancel();
                let _ = self
                    .commands
                    .send(LogicCmd::Reset(Some(TracePhase::Practice)));
            }
            _ => {}
        }
    }

    fn quit(&mut self, control_flow: &mut ControlFlow) {
        self.presenter.abandon();
        if let (Some(recording), Some(path)) = (self.recording.take(), self.record_path.take()) {
            if recording.is_empty() {
                println!("no pointer samples captured, skipping {}", path.display());
            } else {
                match recording.save(&path) {
                    Ok(()) => println!("saved pointer recording to {}", path.display()),
                    Err(err) => eprintln!("warning: failed to save recording: {err}"),
                }
            }
        }
        *control_flow = ControlFlow::Exit;
    }
}

impl Drop for HeadfulApp {
    fn drop(&mut self) {
        // Dropping `commands` hangs up the logic thread; join it so the
        // session is fully torn down before the process exits.
        let (tx, _rx) = mpsc::channel();
        let _ = std::mem::replace(&mut self.commands, tx);
        if let Some(logic) = self.logic.take() {
            let _ = logic.join();
        }
    }
}

impl AppHandler for HeadfulApp {
    fn init(&mut self, _ctx: &mut AppContext) -> Result<(), Box<dyn Error>> {
        if let Ok(path) = std::env::var("TRACE_REPLAY_PATH") {
            match GestureRecording::load(&path) {
                Ok(recording) => {
                    println!(
                        "replaying {} samples from {path}",
                        recording.samples.len()
                    );
                    self.replay_queue = recording.samples.into();
                }
                Err(err) => eprintln!("warning: failed to load replay {path}: {err}"),
            }
        }
        if let Some(cue) = self.level.audio_cue.clone() {
            self.presenter.play_cue(&cue);
        }
        Ok(())
    }

    fn handle_event(
        &mut self,
        event: Event<()>,
        control_flow: &mut ControlFlow,
        ctx: &mut AppContext,
    ) {
        if !matches!(*control_flow, ControlFlow::Exit) {
            *control_flow = ControlFlow::Poll;
        }

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => self.quit(control_flow),
                WindowEvent::Resized(size) => {
                    ctx.surface_size = SurfaceSize::new(size.width.max(1), size.height.max(1));
                    if let Err(err) = ctx.renderer.resize(ctx.surface_size) {
                        eprintln!("warning: resize failed: {err}");
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => self.handle_key(key, control_flow),
                WindowEvent::CursorMoved { position, .. } => {
                    self.mouse_pos = Vec2::new(position.x as f32, position.y as f32);
                    if self.pointer_down {
                        self.record(PointerSample::Move {
                            x: self.mouse_pos.x,
                            y: self.mouse_pos.y,
                        });
                        self.sampler.pen_move(self.mouse_pos);
                    }
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed => {
                        self.pointer_down = true;
                        self.record(PointerSample::Down {
                            x: self.mouse_pos.x,
                            y: self.mouse_pos.y,
                        });
                        self.sampler.pen_down(self.mouse_pos);
                    }
                    ElementState::Released => {
                        self.pointer_down = false;
                        self.record(PointerSample::Up);
                        self.sampler.pen_up();
                    }
                },
                _ => {}
            },
            Event::MainEventsCleared => {
                // One replay sample per frame, so stroke transitions get the
                // same logic-thread interleaving live input would.
                if let Some(sample) = self.replay_queue.pop_front() {
                    match sample {
                        PointerSample::Down { x, y } => self.sampler.pen_down(Vec2::new(x, y)),
                        PointerSample::Move { x, y } => self.sampler.pen_move(Vec2::new(x, y)),
                        PointerSample::Up => self.sampler.pen_up(),
                    }
                }

                self.drain_updates();

                let now = Instant::now();
                let dt = now.duration_since(self.last_tick);
                self.last_tick = now;
                self.presenter.tick(dt);

                if self.finished.get() {
                    self.quit(control_flow);
                    return;
                }

                ctx.window.request_redraw();
            }
            Event::RedrawRequested(_) => {
                let draw = ctx.renderer.draw_frame(|gfx| {
                    self.presenter.render(
                        gfx,
                        &self.level,
                        &self.snapshot,
                        self.sampler.active_ink(),
                    );
                });
                if let Err(err) = draw.and_then(|_| ctx.renderer.present()) {
                    eprintln!("warning: render failed: {err}");
                }
            }
            _ => {}
        }
    }
}

fn env_theme() -> Theme {
    match std::env::var("TRACE_THEME").ok().as_deref() {
        Some("jungle") => Theme::Jungle,
        Some("sky") => Theme::Sky,
        Some("cave") => Theme::Cave,
        Some("market") => Theme::Market,
        Some("default") | None => Theme::Default,
        Some(other) => {
            eprintln!("warning: unknown theme {other:?}, using default");
            Theme::Default
        }
    }
}

fn env_mode() -> Mode {
    match std::env::var("TRACE_MODE").ok().as_deref() {
        Some("subtraction") => Mode::Subtraction,
        Some("mystery") => Mode::Mystery,
        Some("fruit") => Mode::Fruit,
        Some("standard") | None => Mode::Standard,
        Some(other) => {
            eprintln!("warning: unknown mode {other:?}, using standard");
            Mode::Standard
        }
    }
}

/// Rodio-backed audio collaborator. Cues are short synthesized tones, so
/// the binary ships no asset files; every failure path is log-and-continue.
struct Sfx {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl Sfx {
    fn new() -> Result<Self, Box<dyn Error>> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl AudioService for Sfx {
    fn load(&mut self) {}

    fn play(&self, cue: &str) {
        let Some((freq, millis, volume)) = cue_tone(cue) else {
            eprintln!("warning: unknown audio cue {cue:?}");
            return;
        };
        let Ok(sink) = Sink::try_new(&self.handle) else {
            return;
        };
        sink.set_volume(volume);
        sink.append(SineWave::new(freq).take_duration(Duration::from_millis(millis)));
        sink.detach();
    }
}

fn cue_tone(cue: &str) -> Option<(f32, u64, f32)> {
    match cue {
        CUE_WAYPOINT => Some((660.0, 70, WAYPOINT_SFX_VOLUME)),
        CUE_STROKE_DONE => Some((880.0, 160, STROKE_SFX_VOLUME)),
        CUE_MISTAKE => Some((220.0, 200, MISTAKE_SFX_VOLUME)),
        CUE_PHASE_TEST => Some((540.0, 260, STROKE_SFX_VOLUME)),
        CUE_WIN => Some((990.0, 500, WIN_SFX_VOLUME)),
        // Level intro cues ("letter_l", ...) share one soft chime.
        cue if cue.starts_with("letter_") || cue.starts_with("digit_") => {
            Some((770.0, 240, WAYPOINT_SFX_VOLUME))
        }
        _ => None,
    }
}

fn load_level(arg: &str) -> Result<Level, Box<dyn Error>> {
    if arg.ends_with(".json") {
        return Level::from_json(&fs::read_to_string(arg)?);
    }
    builtin_level(arg)
        .ok_or_else(|| format!("unknown level {arg:?}, available: L V T 1").into())
}

fn main() -> Result<(), Box<dyn Error>> {
    let arg = std::env::args().nth(1).unwrap_or_else(|| "V".to_string());
    let level = load_level(&arg)?;
    let title = format!("Trace {}", level.name);

    let (session, sampler) = TraceSession::new(level.clone())?;
    let snapshot = session.snapshot();

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (out_tx, out_rx) = mpsc::channel();
    let logic = spawn_logic_thread(session, cmd_rx, out_tx);

    let audio: Box<dyn AudioService> = match Sfx::new() {
        Ok(sfx) => Box::new(sfx),
        Err(err) => {
            eprintln!("warning: audio unavailable: {err}");
            Box::new(NullAudio)
        }
    };

    let finished = Rc::new(Cell::new(false));
    let finished_flag = finished.clone();
    let presenter = Presenter::new(env_theme(), env_mode(), audio)
        .with_on_complete(move |grade| {
            println!(
                "level complete: stars {} score {} mistakes {}",
                grade.stars, grade.score, grade.mistakes
            );
            finished_flag.set(true);
        })
        .with_on_exit(|| println!("level abandoned"));

    let record_path = std::env::var("TRACE_RECORD_PATH").ok().map(PathBuf::from);
    let recording = record_path
        .as_ref()
        .map(|_| GestureRecording::new(level.name.clone()));

    let app = HeadfulApp {
        level,
        sampler,
        presenter,
        snapshot,
        updates: out_rx,
        commands: cmd_tx,
        logic: Some(logic),
        finished,
        mouse_pos: Vec2::ZERO,
        pointer_down: false,
        last_tick: Instant::now(),
        recording,
        record_path,
        replay_queue: VecDeque::new(),
    };

    let config = AppConfig {
        title,
        desired_size: PhysicalSize::new(480, 640),
        clamp_to_monitor: true,
        vsync: env_bool("TRACE_HEADFUL_VSYNC"),
    };
    run_app(config, app)
}
