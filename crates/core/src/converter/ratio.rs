//! Aspect-ratio arithmetic shared by the transcoder and the orchestrator.
//!
//! Everything here is pure: the same inputs always produce the same
//! dimensions, and every produced dimension is an even number so that
//! yuv420p encoders accept it.

use super::error::ConverterError;
use super::types::{CropWindow, Dimensions};

/// Parses a "W:H" ratio string into `W / H`.
///
/// Components may be decimal, so "1.91:1" is accepted.
pub fn parse_ratio(ratio: &str) -> Result<f64, ConverterError> {
    let invalid = || ConverterError::InvalidRatio {
        ratio: ratio.to_string(),
    };

    let (w, h) = ratio.trim().split_once(':').ok_or_else(invalid)?;
    let w: f64 = w.trim().parse().map_err(|_| invalid())?;
    let h: f64 = h.trim().parse().map_err(|_| invalid())?;

    if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
        return Err(invalid());
    }

    Ok(w / h)
}

fn floor_even(value: f64) -> u32 {
    let v = value.max(0.0).floor() as u32;
    v - (v % 2)
}

fn nearest_even(value: f64) -> u32 {
    ((value.max(0.0) / 2.0).round() as u32) * 2
}

/// `|w/h - r| < 1/min(w, h)`: the pair is as close to `r` as integer
/// pixels allow.
pub fn within_ratio_tolerance(width: u32, height: u32, r: f64) -> bool {
    if width == 0 || height == 0 {
        return false;
    }
    let error = (width as f64 / height as f64 - r).abs();
    error < 1.0 / width.min(height) as f64
}

/// Picks an even `(width, height)` near the exact `(width, height)` frame
/// at ratio `r`, never exceeding the bounds.
///
/// The shorter side is settled first (nearest even, then the even values
/// below it) and the longer side is derived from it. The first pair within
/// [`within_ratio_tolerance`] wins; otherwise the pair with the smallest
/// ratio error.
fn even_pair(exact: (f64, f64), bounds: (u32, u32), r: f64) -> Option<(u32, u32)> {
    let width_is_short = r < 1.0;
    let (short_exact, short_bound, long_bound) = if width_is_short {
        (exact.0, bounds.0, bounds.1)
    } else {
        (exact.1, bounds.1, bounds.0)
    };
    let long_cap = floor_even(long_bound as f64);

    let floor = floor_even(short_exact);
    let mut candidates = vec![nearest_even(short_exact), floor, floor.saturating_sub(2)];
    candidates.dedup();

    let mut best: Option<((u32, u32), f64)> = None;
    for short in candidates {
        if short == 0 || short > short_bound {
            continue;
        }
        let long_exact = if width_is_short {
            short as f64 / r
        } else {
            short as f64 * r
        };
        let long = nearest_even(long_exact).min(long_cap);
        if long == 0 {
            continue;
        }

        let pair = if width_is_short {
            (short, long)
        } else {
            (long, short)
        };
        if within_ratio_tolerance(pair.0, pair.1, r) {
            return Some(pair);
        }
        let error = (pair.0 as f64 / pair.1 as f64 - r).abs();
        if best.is_none_or(|(_, e)| error < e) {
            best = Some((pair, error));
        }
    }

    best.map(|(pair, _)| pair)
}

/// Fits the source frame to `ratio` without upscaling, then caps the width.
///
/// The wider side of the source is trimmed so the frame matches the ratio
/// and the result is scaled down proportionally if it exceeds `max_width`.
/// The final pair is even on both sides and within one pixel's worth of
/// ratio error whenever integer pixels allow it.
pub fn target_dimensions(
    source_width: u32,
    source_height: u32,
    ratio: &str,
    max_width: u32,
) -> Result<Dimensions, ConverterError> {
    if source_width == 0 || source_height == 0 {
        return Err(ConverterError::invalid_dimensions(format!(
            "source is {}x{}",
            source_width, source_height
        )));
    }
    if max_width < 2 {
        return Err(ConverterError::invalid_dimensions(format!(
            "max width {} is too small",
            max_width
        )));
    }

    let r = parse_ratio(ratio)?;
    let (mut width, mut height) = fit_to_ratio(source_width, source_height, r);

    if width > max_width as f64 {
        height *= max_width as f64 / width;
        width = max_width as f64;
    }

    let bounds = (source_width.min(max_width), source_height);
    match even_pair((width, height), bounds, r) {
        Some((w, h)) => Ok(Dimensions::new(w, h)),
        None => Err(ConverterError::invalid_dimensions(format!(
            "{}x{} at ratio {} collapses below 2x2",
            source_width, source_height, ratio
        ))),
    }
}

/// Largest centered window of `ratio` that fits inside the source frame.
pub fn crop_window(
    source_width: u32,
    source_height: u32,
    ratio: &str,
) -> Result<CropWindow, ConverterError> {
    if source_width == 0 || source_height == 0 {
        return Err(ConverterError::invalid_dimensions(format!(
            "source is {}x{}",
            source_width, source_height
        )));
    }

    let r = parse_ratio(ratio)?;
    let exact = fit_to_ratio(source_width, source_height, r);
    let Some((width, height)) = even_pair(exact, (source_width, source_height), r) else {
        return Err(ConverterError::invalid_dimensions(format!(
            "crop of {}x{} at ratio {} is empty",
            source_width, source_height, ratio
        )));
    };

    Ok(CropWindow {
        width,
        height,
        x: (source_width - width) / 2,
        y: (source_height - height) / 2,
    })
}

fn fit_to_ratio(source_width: u32, source_height: u32, r: f64) -> (f64, f64) {
    let source_ratio = source_width as f64 / source_height as f64;
    if source_ratio > r {
        let height = source_height as f64;
        (height * r, height)
    } else {
        let width = source_width as f64;
        (width, width / r)
    }
}
