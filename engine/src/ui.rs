//! Minimal layout primitives: a `Rect` plus anchored placement helpers used
//! for banner and HUD positioning.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_size(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.w)
            && py >= self.y
            && py < self.y.saturating_add(self.h)
    }

    /// Places a child of `size` inside this rect at the requested `anchor`,
    /// clamping the child to fit.
    pub fn place(&self, size: Size, anchor: Anchor) -> Self {
        let w = size.w.min(self.w);
        let h = size.h.min(self.h);

        let x = match anchor {
            Anchor::TopLeft | Anchor::BottomLeft => self.x,
            Anchor::TopCenter | Anchor::Center | Anchor::BottomCenter => {
                self.x.saturating_add(self.w.saturating_sub(w) / 2)
            }
            Anchor::TopRight | Anchor::BottomRight => {
                self.x.saturating_add(self.w.saturating_sub(w))
            }
        };

        let y = match anchor {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => self.y,
            Anchor::Center => self.y.saturating_add(self.h.saturating_sub(h) / 2),
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => {
                self.y.saturating_add(self.h.saturating_sub(h))
            }
        };

        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    Center,
    BottomLeft,
    BottomCenter,
    BottomRight,
}
