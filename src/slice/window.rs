//! Hounsfield-unit windowing.
//!
//! A window maps the sample range `[center - width/2, center + width/2]`
//! linearly onto display intensities `0..=255`. Samples outside the range
//! saturate.

use serde::Serialize;

use crate::error::VolumeError;

/// Default window center (soft tissue).
pub const DEFAULT_WINDOW_CENTER: f64 = 40.0;

/// Default window width (soft tissue).
pub const DEFAULT_WINDOW_WIDTH: f64 = 400.0;

/// Widths at or below this are treated as a threshold at `lo`.
pub const EPSILON: f64 = 1e-6;

/// Window center / width pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Window {
    pub center: f64,
    pub width: f64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            center: DEFAULT_WINDOW_CENTER,
            width: DEFAULT_WINDOW_WIDTH,
        }
    }
}

impl Window {
    /// Build a window, rejecting non-finite parameters.
    pub fn new(center: f64, width: f64) -> Result<Self, VolumeError> {
        if !center.is_finite() || !width.is_finite() {
            return Err(VolumeError::validation(format!(
                "Window parameters must be finite (wc={}, ww={})",
                center, width
            )));
        }
        Ok(Self { center, width })
    }

    /// Build a window from optional parameters, defaulting each to 40 / 400.
    pub fn from_params(center: Option<f64>, width: Option<f64>) -> Result<Self, VolumeError> {
        Self::new(
            center.unwrap_or(DEFAULT_WINDOW_CENTER),
            width.unwrap_or(DEFAULT_WINDOW_WIDTH),
        )
    }

    pub fn lo(&self) -> f64 {
        self.center - self.width / 2.0
    }

    pub fn hi(&self) -> f64 {
        self.center + self.width / 2.0
    }

    /// True when the window has no usable width.
    pub fn is_degenerate(&self) -> bool {
        self.width <= EPSILON
    }

    /// Precompute the per-sample mapping.
    pub fn mapper(&self) -> WindowMapper {
        let lo = self.lo();
        let span = self.hi() - lo;
        WindowMapper {
            lo,
            hi: self.hi(),
            scale: if self.is_degenerate() {
                None
            } else {
                Some(255.0 / span.max(EPSILON))
            },
        }
    }

    /// Map one sample to a display intensity.
    pub fn apply(&self, value: f64) -> u8 {
        self.mapper().map(value)
    }
}

/// Window with its bounds and scale precomputed for a whole plane.
#[derive(Debug, Clone, Copy)]
pub struct WindowMapper {
    lo: f64,
    hi: f64,
    scale: Option<f64>,
}

impl WindowMapper {
    #[inline]
    pub fn map(&self, value: f64) -> u8 {
        if value.is_nan() {
            return 0;
        }
        match self.scale {
            None => {
                if value <= self.lo {
                    0
                } else {
                    255
                }
            }
            Some(scale) => {
                let clamped = value.clamp(self.lo, self.hi);
                ((clamped - self.lo) * scale).round().clamp(0.0, 255.0) as u8
            }
        }
    }
}
