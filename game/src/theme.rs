use engine::graphics::Color;
use serde::{Deserialize, Serialize};

/// Visual theme axis. A closed enumeration, matched exhaustively; theme
/// data is never looked up by string key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    Jungle,
    Sky,
    Cave,
    Market,
    #[default]
    Default,
}

/// Palette for one theme. Colors are RGBA to match the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub guide: Color,
    pub ink: Color,
    pub committed_ink: Color,
    pub marker: Color,
    pub banner_text: Color,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Jungle,
        Theme::Sky,
        Theme::Cave,
        Theme::Market,
        Theme::Default,
    ];

    pub fn palette(self) -> Palette {
        match self {
            Theme::Jungle => Palette {
                background: [16, 38, 24, 255],
                guide: [60, 110, 70, 255],
                ink: [250, 240, 120, 255],
                committed_ink: [150, 220, 120, 255],
                marker: [255, 200, 60, 255],
                banner_text: [235, 255, 235, 255],
            },
            Theme::Sky => Palette {
                background: [24, 40, 72, 255],
                guide: [70, 100, 150, 255],
                ink: [255, 255, 255, 255],
                committed_ink: [140, 200, 255, 255],
                marker: [255, 230, 100, 255],
                banner_text: [235, 245, 255, 255],
            },
            Theme::Cave => Palette {
                background: [20, 16, 26, 255],
                guide: [70, 60, 90, 255],
                ink: [240, 170, 80, 255],
                committed_ink: [200, 140, 220, 255],
                marker: [255, 160, 60, 255],
                banner_text: [240, 230, 245, 255],
            },
            Theme::Market => Palette {
                background: [46, 30, 20, 255],
                guide: [120, 90, 60, 255],
                ink: [255, 220, 150, 255],
                committed_ink: [255, 170, 90, 255],
                marker: [120, 230, 120, 255],
                banner_text: [255, 245, 230, 255],
            },
            Theme::Default => Palette {
                background: [10, 10, 14, 255],
                guide: [70, 70, 86, 255],
                ink: [0, 229, 255, 255],
                committed_ink: [120, 255, 180, 255],
                marker: [255, 215, 0, 255],
                banner_text: [235, 235, 240, 255],
            },
        }
    }
}

/// Game mode axis, also closed and matched exhaustively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Standard,
    Subtraction,
    Mystery,
    Fruit,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Standard,
        Mode::Subtraction,
        Mode::Mystery,
        Mode::Fruit,
    ];

    /// Whether the faint reference curve is drawn under the practice trace.
    /// Mystery rounds hide it and rely on markers alone.
    pub fn shows_reference_curve(self) -> bool {
        match self {
            Mode::Standard | Mode::Subtraction | Mode::Fruit => true,
            Mode::Mystery => false,
        }
    }

    pub fn banner_label(self) -> &'static str {
        match self {
            Mode::Standard => "",
            Mode::Subtraction => "MINUS",
            Mode::Mystery => "MYSTERY",
            Mode::Fruit => "FRUIT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_has_a_distinct_background() {
        let mut seen = Vec::new();
        for theme in Theme::ALL {
            let bg = theme.palette().background;
            assert!(!seen.contains(&bg), "{theme:?} reuses a background");
            seen.push(bg);
        }
    }

    #[test]
    fn only_mystery_hides_the_reference_curve() {
        for mode in Mode::ALL {
            assert_eq!(
                mode.shows_reference_curve(),
                mode != Mode::Mystery,
                "{mode:?}"
            );
        }
    }
}
