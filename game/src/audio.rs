/// Narrow interface to the sound collaborator.
///
/// Implementations must treat every failure as non-fatal: a missing device
/// or unknown cue is logged and swallowed, never surfaced to gameplay.
pub trait AudioService {
    /// Prepares the backend. Idempotent; calling it again after a
    /// successful load is a no-op.
    fn load(&mut self);

    /// Fire-and-forget playback of a named cue.
    fn play(&self, cue: &str);
}

/// Silent backend for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioService for NullAudio {
    fn load(&mut self) {}

    fn play(&self, _cue: &str) {}
}
