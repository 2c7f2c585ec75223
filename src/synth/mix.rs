//! Stereo frames, sidechain ducking and the output stage

use std::ops::{Add, AddAssign, Mul};

use crate::{lerp, soft_clip};

/// One stereo output frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const SILENT: Frame = Frame {
        left: 0.0,
        right: 0.0,
    };

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same sample on both channels
    pub const fn mono(value: f32) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Mid/side to left/right, each channel soft-clipped with `drive`
    #[inline]
    pub fn from_mid_side(mid: f64, side: f64, drive: f64) -> Self {
        Self {
            left: soft_clip(mid + side, drive) as f32,
            right: soft_clip(mid - side, drive) as f32,
        }
    }

    /// Soft-clip both channels
    #[inline]
    pub fn clipped(self, drive: f64) -> Self {
        Self {
            left: soft_clip(self.left as f64, drive) as f32,
            right: soft_clip(self.right as f64, drive) as f32,
        }
    }

    pub fn peak(&self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

impl Add for Frame {
    type Output = Frame;

    fn add(self, rhs: Frame) -> Frame {
        Frame::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Frame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    fn mul(self, gain: f32) -> Frame {
        Frame::new(self.left * gain, self.right * gain)
    }
}

/// Flatten frames to `[l0, r0, l1, r1, ...]`
pub fn interleave(frames: &[Frame]) -> Vec<f32> {
    frames.iter().flat_map(|f| [f.left, f.right]).collect()
}

/// Sidechain gain from the kick signal: `clamp(1 − kick·amount, floor, 1)`
#[inline]
pub fn duck(kick: f64, amount: f64, floor: f64) -> f64 {
    let floor = floor.min(1.0);
    (1.0 - kick * amount).clamp(floor, 1.0)
}

/// Apply only `weight` of a duck gain (0 = untouched, 1 = fully ducked)
#[inline]
pub fn duck_partial(duck: f64, weight: f64) -> f64 {
    lerp(1.0, duck, weight)
}
