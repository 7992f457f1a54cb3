// SPDX-License-Identifier: PMPL-1.0-or-later
//! Contrast estimation for theme checks.
//!
//! The estimate is an approximation: it compares the declared text color with
//! the nearest declared background and ignores images, gradients, opacity and
//! text size. Substitute a certified implementation through
//! [`ContrastEstimator`] when certification matters.

use crate::style::Rgb;

/// Estimates the contrast ratio between a text color and its background
pub trait ContrastEstimator {
    fn name(&self) -> &str;

    /// Contrast ratio, 1.0 (none) to 21.0 (black on white)
    fn estimate(&self, foreground: Rgb, background: Rgb) -> f64;
}

/// WCAG 2.x relative-luminance contrast
#[derive(Debug, Clone, Copy, Default)]
pub struct WcagContrast;

impl ContrastEstimator for WcagContrast {
    fn name(&self) -> &str {
        "wcag-luminance"
    }

    fn estimate(&self, foreground: Rgb, background: Rgb) -> f64 {
        foreground.contrast_with(&background)
    }
}

/// Reports the same ratio for every pair
#[derive(Debug, Clone, Copy)]
pub struct FixedContrast(pub f64);

impl ContrastEstimator for FixedContrast {
    fn name(&self) -> &str {
        "fixed"
    }

    fn estimate(&self, _foreground: Rgb, _background: Rgb) -> f64 {
        self.0
    }
}

/// Round to two decimals for reporting (`3.0` prints as `3`)
pub fn round_ratio(ratio: f64) -> f64 {
    (ratio * 100.0).round() / 100.0
}
