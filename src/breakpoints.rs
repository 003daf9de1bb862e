//! Adaptive topic-shift detection over sentence-embedding similarity.
//!
//! Consecutive sentence embeddings are compared with cosine similarity; the
//! resulting distance distribution is thresholded at a configured percentile,
//! computed by explicit sort-and-interpolate rank arithmetic.  Lower
//! percentiles yield more, smaller chunks.

/// Cosine distances between each pair of adjacent embeddings.
///
/// `distances[i] = 1 - cos(embeddings[i], embeddings[i + 1])`.  Zero-norm or
/// empty vectors compare as maximally distant.
pub fn cosine_distances(embeddings: &[Vec<f32>]) -> Vec<f32> {
    let mut distances = Vec::with_capacity(embeddings.len().saturating_sub(1));
    for window in embeddings.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        let distance = if a.is_empty() || b.is_empty() {
            1.0
        } else {
            let mut dot = 0.0f32;
            let mut norm_a = 0.0f32;
            let mut norm_b = 0.0f32;
            for (lhs, rhs) in a.iter().zip(b.iter()) {
                dot += lhs * rhs;
                norm_a += lhs * lhs;
                norm_b += rhs * rhs;
            }
            if norm_a == 0.0 || norm_b == 0.0 {
                1.0
            } else {
                1.0 - (dot / (norm_a.sqrt() * norm_b.sqrt()))
            }
        };
        distances.push(distance);
    }
    distances
}

/// The `percentile`-th value of `values` under linear interpolation between
/// closest ranks.
///
/// # Panics
///
/// Panics if `values` is empty; callers guard the degenerate case.
pub fn percentile_threshold(values: &[f32], percentile: u8) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = f32::from(percentile) / 100.0 * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (rank - lower as f32) * (sorted[upper] - sorted[lower])
    }
}

/// Turn adjacent-sentence distances into sorted cut positions.
///
/// A cut at position `k` separates sentence `k - 1` from sentence `k`.  A cut
/// is declared wherever the distance reaches the configured percentile of the
/// whole distribution.  Zero or one sentence yields no cuts, and so does a
/// zero-variance distribution (identical embeddings must not fragment the
/// document).
pub fn detect_breakpoints(distances: &[f32], percentile: u8) -> Vec<usize> {
    if distances.is_empty() {
        return Vec::new();
    }

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &d in distances {
        min = min.min(d);
        max = max.max(d);
    }
    if !(max - min).is_finite() || max - min <= f32::EPSILON {
        return Vec::new();
    }

    let cutoff = percentile_threshold(distances, percentile);
    distances
        .iter()
        .enumerate()
        .filter_map(|(idx, d)| (*d >= cutoff).then_some(idx + 1))
        .collect()
}
