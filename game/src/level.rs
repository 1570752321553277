use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// One pen-down-to-pen-up stroke of a traceable shape.
///
/// `waypoints` are the ordered checkpoints (first = start marker, last = end
/// marker); `curve` is the renderable polyline revealed once the stroke is
/// committed. Level data is immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeSpec {
    pub waypoints: Vec<Vec2>,
    #[serde(default)]
    pub curve: Vec<Vec2>,
}

impl StrokeSpec {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self {
            curve: waypoints.clone(),
            waypoints,
        }
    }

    pub fn with_curve(mut self, curve: Vec<Vec2>) -> Self {
        self.curve = curve;
        self
    }

    pub fn start(&self) -> Vec2 {
        self.waypoints[0]
    }

    pub fn last_waypoint_index(&self) -> usize {
        self.waypoints.len() - 1
    }

    /// The curve to reveal for a committed stroke; falls back to the
    /// waypoint polyline when the level author supplied no curve.
    pub fn reference_curve(&self) -> &[Vec2] {
        if self.curve.is_empty() {
            &self.waypoints
        } else {
            &self.curve
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub name: String,
    pub strokes: Vec<StrokeSpec>,
    #[serde(default)]
    pub full_curve: Vec<Vec2>,
    #[serde(default)]
    pub audio_cue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    NoStrokes,
    StrokeTooShort { stroke: usize, waypoints: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NoStrokes => write!(f, "level has no strokes"),
            LevelError::StrokeTooShort { stroke, waypoints } => write!(
                f,
                "stroke {stroke} has {waypoints} waypoints, need at least 2"
            ),
        }
    }
}

impl std::error::Error for LevelError {}

impl Level {
    /// Validates and wraps level data. Malformed data is fatal at load time:
    /// the tracing core refuses to start on a level that could leave it
    /// without a reachable target.
    pub fn new(
        name: impl Into<String>,
        strokes: Vec<StrokeSpec>,
    ) -> Result<Self, LevelError> {
        let level = Self {
            name: name.into(),
            strokes,
            full_curve: Vec::new(),
            audio_cue: None,
        };
        level.validate()?;
        Ok(level)
    }

    pub fn with_full_curve(mut self, full_curve: Vec<Vec2>) -> Self {
        self.full_curve = full_curve;
        self
    }

    pub fn with_audio_cue(mut self, cue: impl Into<String>) -> Self {
        self.audio_cue = Some(cue.into());
        self
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.strokes.is_empty() {
            return Err(LevelError::NoStrokes);
        }
        for (i, stroke) in self.strokes.iter().enumerate() {
            if stroke.waypoints.len() < 2 {
                return Err(LevelError::StrokeTooShort {
                    stroke: i,
                    waypoints: stroke.waypoints.len(),
                });
            }
        }
        Ok(())
    }

    /// Parses a level from its JSON wire form and validates it.
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let level: Level = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn last_stroke_index(&self) -> usize {
        self.strokes.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point_stroke() -> StrokeSpec {
        StrokeSpec::new(vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0)])
    }

    #[test]
    fn empty_stroke_list_is_rejected() {
        assert_eq!(Level::new("x", vec![]), Err(LevelError::NoStrokes));
    }

    #[test]
    fn single_waypoint_stroke_is_rejected() {
        let bad = StrokeSpec::new(vec![Vec2::new(0.0, 0.0)]);
        assert_eq!(
            Level::new("x", vec![two_point_stroke(), bad]),
            Err(LevelError::StrokeTooShort {
                stroke: 1,
                waypoints: 1
            })
        );
    }

    #[test]
    fn reference_curve_falls_back_to_waypoints() {
        let mut stroke = two_point_stroke();
        stroke.curve.clear();
        assert_eq!(stroke.reference_curve(), stroke.waypoints.as_slice());
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = r#"{
            "name": "L",
            "strokes": [
                { "waypoints": [{"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 200.0}] }
            ],
            "fullCurve": [{"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 200.0}],
            "audioCue": "letter_l"
        }"#;
        let level = Level::from_json(json).unwrap();
        assert_eq!(level.name, "L");
        assert_eq!(level.full_curve.len(), 2);
        assert_eq!(level.audio_cue.as_deref(), Some("letter_l"));
    }

    #[test]
    fn wire_format_rejects_malformed_levels() {
        let json = r#"{ "name": "bad", "strokes": [] }"#;
        assert!(Level::from_json(json).is_err());
    }
}
