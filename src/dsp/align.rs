//! Circular alignment of a live buffer against a reference cycle.
//!
//! The oscillator feeding the scope and the frames that sample it are not
//! synchronized, so each captured window starts at an arbitrary phase. Drawing
//! it as-is makes the trace crawl. Rotating the window by the offset that best
//! matches the reference cycle holds the picture still.

/// Offset in `[0, min(search_limit, captured.len()))` maximizing
/// `Σ reference[i] · captured[(i + offset) mod captured.len()]`.
///
/// Cost is O(search_limit × reference.len()), so callers cap `search_limit`.
/// Ties keep the smallest offset. Returns 0 for empty inputs.
pub fn find_alignment(reference: &[f32], captured: &[f32], search_limit: usize) -> usize {
    let len = captured.len();
    if len == 0 || reference.is_empty() {
        return 0;
    }

    let window = search_limit.min(len);
    let mut best_offset = 0;
    let mut best_score = f64::NEG_INFINITY;

    for offset in 0..window {
        let score: f64 = reference
            .iter()
            .enumerate()
            .map(|(i, &r)| r as f64 * captured[(i + offset) % len] as f64)
            .sum();
        if score > best_score {
            best_score = score;
            best_offset = offset;
        }
    }

    best_offset
}

/// Copy `out.len()` samples of `captured` starting at `offset`, wrapping.
pub fn rotate_into(captured: &[f32], offset: usize, out: &mut [f32]) {
    let len = captured.len();
    if len == 0 {
        out.fill(0.0);
        return;
    }
    for (i, o) in out.iter_mut().enumerate() {
        *o = captured[(offset + i) % len];
    }
}

/// Align `captured` to `reference` and copy one period (`reference.len()`
/// samples) of the aligned signal into `out`. Returns the offset used.
pub fn aligned_period(reference: &[f32], captured: &[f32], search_limit: usize, out: &mut Vec<f32>) -> usize {
    let offset = find_alignment(reference, captured, search_limit);
    out.resize(reference.len(), 0.0);
    rotate_into(captured, offset, out);
    offset
}

/// First rising zero crossing (`x[i-1] < 0 && x[i] >= 0`), or 0.
///
/// Trigger used when there is no reference to correlate against.
pub fn zero_crossing_offset(captured: &[f32]) -> usize {
    captured
        .windows(2)
        .position(|w| w[0] < 0.0 && w[1] >= 0.0)
        .map_or(0, |i| i + 1)
}
