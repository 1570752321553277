/// Shared SFX volume constants (0.0..=1.0).
///
/// These are used by headful clients and validated by tests.
pub const WAYPOINT_SFX_VOLUME: f32 = 0.2;
pub const STROKE_SFX_VOLUME: f32 = 0.35;
pub const MISTAKE_SFX_VOLUME: f32 = 0.3;
pub const WIN_SFX_VOLUME: f32 = 0.45;

/// Cue names understood by the audio collaborator. A backend that does not
/// know a cue logs and plays nothing; gameplay never depends on a cue
/// actually sounding.
pub const CUE_WAYPOINT: &str = "waypoint";
pub const CUE_STROKE_DONE: &str = "stroke_done";
pub const CUE_MISTAKE: &str = "mistake";
pub const CUE_PHASE_TEST: &str = "phase_test";
pub const CUE_WIN: &str = "win";
