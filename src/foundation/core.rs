use crate::foundation::error::{VcrtcError, VcrtcResult};

/// Absolute refresh counter value a checksum is reported against.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Integer pixel rectangle with exclusive `x2`/`y2` edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x1: i32,
    /// Top edge (inclusive).
    pub y1: i32,
    /// Right edge (exclusive).
    pub x2: i32,
    /// Bottom edge (exclusive).
    pub y2: i32,
}

impl Rect {
    /// Build a rectangle from an origin and a size.
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x.saturating_add(width as i32),
            y2: y.saturating_add(height as i32),
        }
    }

    /// Width in pixels; inverted rectangles have width 0.
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1).max(0) as u32
    }

    /// Height in pixels; inverted rectangles have height 0.
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1).max(0) as u32
    }

    /// Return `true` when row `y` lies in `[y1, y2)`.
    pub fn contains_row(&self, y: i32) -> bool {
        self.y1 <= y && y < self.y2
    }
}

/// Source rectangle in 16.16 fixed point, as handed over by the plane state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FixedRect {
    /// Left edge, 16.16.
    pub x1: i32,
    /// Top edge, 16.16.
    pub y1: i32,
    /// Right edge, 16.16.
    pub x2: i32,
    /// Bottom edge, 16.16.
    pub y2: i32,
}

impl FixedRect {
    /// Fixed-point rectangle covering whole pixels.
    pub fn from_xywh(x: u32, y: u32, width: u32, height: u32) -> VcrtcResult<Self> {
        let to_fixed = |v: u32| -> VcrtcResult<i32> {
            i32::try_from(v)
                .ok()
                .and_then(|v| v.checked_mul(1 << 16))
                .ok_or_else(|| {
                    VcrtcError::configuration(format!("source coordinate {v} overflows 16.16"))
                })
        };
        Ok(Self {
            x1: to_fixed(x)?,
            y1: to_fixed(y)?,
            x2: to_fixed(x.saturating_add(width))?,
            y2: to_fixed(y.saturating_add(height))?,
        })
    }

    /// Integer part of the left edge.
    pub fn x1_int(&self) -> i32 {
        self.x1 >> 16
    }

    /// Integer part of the top edge.
    pub fn y1_int(&self) -> i32 {
        self.y1 >> 16
    }

    /// Integer part of the right edge.
    pub fn x2_int(&self) -> i32 {
        self.x2 >> 16
    }

    /// Integer part of the bottom edge.
    pub fn y2_int(&self) -> i32 {
        self.y2 >> 16
    }
}
