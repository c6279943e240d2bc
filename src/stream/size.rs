// SPDX-License-Identifier: GPL-3.0-only

//! Output size negotiation
//!
//! Picks one size from the list a device supports for an output kind, given
//! the size of the surface that will display it.

use crate::backends::camera::Resolution;
use crate::errors::{CoreError, CoreResult};
use tracing::debug;

/// Choose an output size from `candidates`
///
/// Preference order:
/// 1. the smallest candidate that is at least `min_width` x `min_height` and
///    has the same aspect ratio as the bound;
/// 2. the smallest candidate that is at least as large as the bound;
/// 3. the first candidate, whatever its size.
///
/// Equal areas resolve to the candidate listed first.
///
/// # Errors
/// `InvalidArgument` when `candidates` is empty or a bound is zero.
pub fn choose(candidates: &[Resolution], min_width: u32, min_height: u32) -> CoreResult<Resolution> {
    let first = *candidates
        .first()
        .ok_or_else(|| CoreError::InvalidArgument("no candidate sizes to choose from".into()))?;
    if min_width == 0 || min_height == 0 {
        return Err(CoreError::InvalidArgument(format!(
            "minimum size must be non-zero, got {}x{}",
            min_width, min_height
        )));
    }

    let target_aspect = min_height as f64 / min_width as f64;

    let big_enough: Vec<Resolution> = candidates
        .iter()
        .copied()
        .filter(|c| c.width >= min_width && c.height >= min_height)
        .collect();
    let aspect_matched: Vec<Resolution> = big_enough
        .iter()
        .copied()
        .filter(|c| c.height as f64 == (c.width as f64 * target_aspect).round())
        .collect();

    let chosen = smallest(&aspect_matched)
        .or_else(|| smallest(&big_enough))
        .unwrap_or(first);

    debug!(
        candidates = candidates.len(),
        big_enough = big_enough.len(),
        aspect_matched = aspect_matched.len(),
        bound = %format!("{}x{}", min_width, min_height),
        chosen = %chosen,
        "Negotiated output size"
    );

    Ok(chosen)
}

/// Smallest by area, keeping the earliest on ties
fn smallest(sizes: &[Resolution]) -> Option<Resolution> {
    sizes.iter().copied().reduce(|best, candidate| {
        if candidate.area() < best.area() {
            candidate
        } else {
            best
        }
    })
}
